//! WAV (RIFF WAVE) 写入器.
//!
//! 把若干路平面 f64 缓冲区交错写成 16 位 PCM.
//!
//! 写入流程:
//! 1. `new()` - 写入 RIFF 和 fmt 块, 预留大小字段
//! 2. `write_planar()` - 追加 PCM 数据, 可多次调用
//! 3. `finish()` - 回填 RIFF 大小和 data 块大小

use log::debug;
use sqdec_core::{SqError, SqResult};

use crate::io::IoContext;
use crate::{PCM_SCALE, WAV_FORMAT_PCM};

/// 输出位深
const BITS_PER_SAMPLE: u16 = 16;

/// RIFF 大小字段的文件偏移
const RIFF_SIZE_OFFSET: u64 = 4;

/// data 块大小字段的文件偏移: 12 (RIFF) + 24 (fmt) + 4 (data tag)
const DATA_SIZE_OFFSET: u64 = 40;

/// RIFF 大小 = 36 + data 大小
const RIFF_HEADER_OVERHEAD: u64 = 36;

/// 浮点采样转 16 位整数: 乘以 32767 后向零截断, 超出范围时饱和
#[inline]
pub fn sample_to_i16(sample: f64) -> i16 {
    (sample * PCM_SCALE) as i16
}

/// 计算 fmt 块的 block_align 与 byte_rate, 任一字段超出范围时报错
fn header_rates(sample_rate: u32, channels: u16) -> SqResult<(u16, u32)> {
    if channels == 0 {
        return Err(SqError::InvalidArgument("WAV 声道数不能为 0".into()));
    }
    if sample_rate == 0 {
        return Err(SqError::InvalidArgument("WAV 采样率不能为 0".into()));
    }
    let block_align = channels
        .checked_mul(BITS_PER_SAMPLE / 8)
        .ok_or_else(|| SqError::Unsupported(format!("WAV 声道数过多: {channels}")))?;
    let byte_rate = sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(|| {
            SqError::Unsupported(format!(
                "WAV 字节率超出 32 位: {sample_rate} Hz x {channels} 声道"
            ))
        })?;
    Ok((block_align, byte_rate))
}

/// WAV 写入器
#[derive(Debug)]
pub struct WavWriter {
    io: IoContext,
    channels: u16,
    sample_rate: u32,
    /// 已写入的数据字节数
    data_written: u64,
}

impl WavWriter {
    /// 创建文件并写入头部
    pub fn create(path: &str, sample_rate: u32, channels: u16) -> SqResult<Self> {
        let io = IoContext::open_write(path)?;
        Self::new(io, sample_rate, channels)
    }

    /// 在 I/O 上下文上写入头部 (大小字段先填 0)
    pub fn new(mut io: IoContext, sample_rate: u32, channels: u16) -> SqResult<Self> {
        let (block_align, byte_rate) = header_rates(sample_rate, channels)?;

        // RIFF header
        io.write_tag(b"RIFF")?;
        io.write_u32_le(0)?; // 占位, finish 中回填
        io.write_tag(b"WAVE")?;

        // fmt chunk
        io.write_tag(b"fmt ")?;
        io.write_u32_le(16)?; // 标准 PCM fmt 块大小
        io.write_u16_le(WAV_FORMAT_PCM)?;
        io.write_u16_le(channels)?;
        io.write_u32_le(sample_rate)?;
        io.write_u32_le(byte_rate)?;
        io.write_u16_le(block_align)?;
        io.write_u16_le(BITS_PER_SAMPLE)?;

        // data chunk header
        io.write_tag(b"data")?;
        io.write_u32_le(0)?; // 占位, finish 中回填

        debug!(
            "WAV 写入头部: {} Hz, {} 声道, {} 位",
            sample_rate, channels, BITS_PER_SAMPLE,
        );

        Ok(Self {
            io,
            channels,
            sample_rate,
            data_written: 0,
        })
    }

    /// 声道数
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// 采样率
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// 交错写入一组平面缓冲区
    ///
    /// 缓冲区数必须等于声道数, 且长度一致; 校验失败时不写入任何字节.
    pub fn write_planar(&mut self, planes: &[&[f64]]) -> SqResult<()> {
        if planes.len() != usize::from(self.channels) {
            return Err(SqError::InvalidArgument(format!(
                "声道数不符: 写入器 {} 声道, 提供 {} 路缓冲区",
                self.channels,
                planes.len()
            )));
        }
        let frames = planes.first().map_or(0, |p| p.len());
        if let Some(bad) = planes.iter().find(|p| p.len() != frames) {
            return Err(SqError::LengthMismatch {
                expected: frames,
                actual: bad.len(),
            });
        }

        let bytes = frames as u64 * u64::from(self.channels) * u64::from(BITS_PER_SAMPLE / 8);
        if RIFF_HEADER_OVERHEAD + self.data_written + bytes > u64::from(u32::MAX) {
            return Err(SqError::Unsupported(
                "数据超过 WAV 4 GiB 上限".into(),
            ));
        }

        let mut interleaved = Vec::with_capacity(bytes as usize);
        for i in 0..frames {
            for plane in planes {
                interleaved.extend_from_slice(&sample_to_i16(plane[i]).to_le_bytes());
            }
        }
        self.io.write_all(&interleaved)?;
        self.data_written += bytes;
        Ok(())
    }

    /// 回填大小字段并刷新, 返回 data 块字节数
    pub fn finish(mut self) -> SqResult<u64> {
        let data_size = self.data_written;
        let riff_size = RIFF_HEADER_OVERHEAD + data_size;

        self.io.seek(std::io::SeekFrom::Start(RIFF_SIZE_OFFSET))?;
        self.io.write_u32_le(riff_size as u32)?;
        self.io.seek(std::io::SeekFrom::Start(DATA_SIZE_OFFSET))?;
        self.io.write_u32_le(data_size as u32)?;
        self.io.flush()?;

        debug!(
            "WAV 写入尾部: riff_size={}, data_size={}",
            riff_size, data_size,
        );
        Ok(data_size)
    }
}

/// 一次性写出多声道 16 位 PCM WAV 文件
pub fn write_wav(path: &str, sample_rate: u32, planes: &[&[f64]]) -> SqResult<u64> {
    let channels = u16::try_from(planes.len())
        .map_err(|_| SqError::InvalidArgument(format!("声道数过多: {}", planes.len())))?;
    // 先校验头部字段和长度, 避免留下空文件或只有头部的文件
    header_rates(sample_rate, channels)?;
    let frames = planes.first().map_or(0, |p| p.len());
    if let Some(bad) = planes.iter().find(|p| p.len() != frames) {
        return Err(SqError::LengthMismatch {
            expected: frames,
            actual: bad.len(),
        });
    }
    let mut writer = WavWriter::create(path, sample_rate, channels)?;
    writer.write_planar(planes)?;
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryBackend;
    use crate::reader::WavReader;

    fn u16_at(data: &[u8], off: usize) -> u16 {
        u16::from_le_bytes([data[off], data[off + 1]])
    }

    fn u32_at(data: &[u8], off: usize) -> u32 {
        u32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
    }

    #[test]
    fn test_采样转换_截断与饱和() {
        assert_eq!(sample_to_i16(1.0), 32767);
        assert_eq!(sample_to_i16(-1.0), -32767);
        assert_eq!(sample_to_i16(0.99999), 32766);
        assert_eq!(sample_to_i16(-0.00001), 0);
        assert_eq!(sample_to_i16(2.0), i16::MAX);
        assert_eq!(sample_to_i16(-2.0), i16::MIN);
        assert_eq!(sample_to_i16(f64::NAN), 0);
    }

    #[test]
    fn test_写入_六声道头部字段() {
        let backend = MemoryBackend::new();
        let io = IoContext::new(Box::new(backend.clone()));
        let mut writer = WavWriter::new(io, 48000, 6).unwrap();
        let plane = vec![0.5f64; 10];
        let planes: Vec<&[f64]> = (0..6).map(|_| plane.as_slice()).collect();
        writer.write_planar(&planes).unwrap();
        assert_eq!(writer.finish().unwrap(), 120);

        let data = backend.snapshot();
        assert_eq!(data.len(), 44 + 120);
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(u32_at(&data, 4), 36 + 120);
        assert_eq!(&data[8..12], b"WAVE");
        assert_eq!(u32_at(&data, 16), 16);
        assert_eq!(u16_at(&data, 20), 1);
        assert_eq!(u16_at(&data, 22), 6);
        assert_eq!(u32_at(&data, 24), 48000);
        assert_eq!(u32_at(&data, 28), 48000 * 12);
        assert_eq!(u16_at(&data, 32), 12);
        assert_eq!(u16_at(&data, 34), 16);
        assert_eq!(&data[36..40], b"data");
        assert_eq!(u32_at(&data, 40), 120);
    }

    #[test]
    fn test_写入_交错顺序() {
        let backend = MemoryBackend::new();
        let io = IoContext::new(Box::new(backend.clone()));
        let mut writer = WavWriter::new(io, 44100, 4).unwrap();
        let fl = [1.0, 0.0];
        let fr = [0.5, 0.0];
        let bl = [-0.5, 0.0];
        let br = [-1.0, 1.0];
        writer.write_planar(&[&fl, &fr, &bl, &br]).unwrap();
        writer.finish().unwrap();

        let data = backend.snapshot();
        let samples: Vec<i16> = data[44..]
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(samples, vec![32767, 16383, -16383, -32767, 0, 0, 0, 32767]);
    }

    #[test]
    fn test_写入_长度不一致不写数据() {
        let backend = MemoryBackend::new();
        let io = IoContext::new(Box::new(backend.clone()));
        let mut writer = WavWriter::new(io, 44100, 2).unwrap();
        let err = writer.write_planar(&[&[0.0; 3], &[0.0; 2]]).unwrap_err();
        assert!(matches!(err, SqError::LengthMismatch { .. }));
        let err = writer.write_planar(&[&[0.0; 3]]).unwrap_err();
        assert!(matches!(err, SqError::InvalidArgument(_)));
        assert_eq!(writer.finish().unwrap(), 0);
        assert_eq!(backend.snapshot().len(), 44);
    }

    #[test]
    fn test_写入_立体声可被读取器读回() {
        let backend = MemoryBackend::new();
        let io = IoContext::new(Box::new(backend.clone()));
        let mut writer = WavWriter::new(io, 22050, 2).unwrap();
        let left = [0.25, -0.75, 1.0];
        let right = [0.0, 0.5, -1.0];
        writer.write_planar(&[&left, &right]).unwrap();
        writer.finish().unwrap();

        let read_io = IoContext::new(Box::new(MemoryBackend::from_data(backend.snapshot())));
        let samples = WavReader::new(read_io).unwrap().read_stereo().unwrap();
        assert_eq!(samples.sample_rate, 22050);
        for (a, b) in left.iter().zip(&samples.left) {
            assert!((a - b).abs() < 1.0 / 32767.0);
        }
        for (a, b) in right.iter().zip(&samples.right) {
            assert!((a - b).abs() < 1.0 / 32767.0);
        }
    }

    #[test]
    fn test_一次性写出_长度不一致不建文件() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.wav");
        let path_str = path.to_str().unwrap();
        let err = write_wav(path_str, 44100, &[&[0.0; 4], &[0.0; 5]]).unwrap_err();
        assert!(matches!(err, SqError::LengthMismatch { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_参数校验_字节率溢出() {
        let backend = MemoryBackend::new();
        let io = IoContext::new(Box::new(backend.clone()));
        let err = WavWriter::new(io, 2_000_000_000, 6).unwrap_err();
        assert!(matches!(err, SqError::Unsupported(_)));
        assert!(backend.snapshot().is_empty());

        let io = IoContext::new(Box::new(MemoryBackend::new()));
        assert!(matches!(
            WavWriter::new(io, 44100, u16::MAX).unwrap_err(),
            SqError::Unsupported(_)
        ));

        // 恰好不溢出的上限仍可写出
        let backend = MemoryBackend::new();
        let io = IoContext::new(Box::new(backend.clone()));
        WavWriter::new(io, u32::MAX / 12, 6).unwrap().finish().unwrap();
        let data = backend.snapshot();
        let byte_rate = u32::from_le_bytes([data[28], data[29], data[30], data[31]]);
        assert_eq!(byte_rate, (u32::MAX / 12) * 12);
    }

    #[test]
    fn test_一次性写出_字节率溢出不建文件() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fast.wav");
        let plane = [0.0f64; 4];
        let planes: Vec<&[f64]> = (0..6).map(|_| plane.as_slice()).collect();
        let err = write_wav(path.to_str().unwrap(), 400_000_000, &planes).unwrap_err();
        assert!(matches!(err, SqError::Unsupported(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_参数校验() {
        let io = IoContext::new(Box::new(MemoryBackend::new()));
        assert!(WavWriter::new(io, 44100, 0).is_err());
        let io = IoContext::new(Box::new(MemoryBackend::new()));
        assert!(WavWriter::new(io, 0, 2).is_err());
    }
}
