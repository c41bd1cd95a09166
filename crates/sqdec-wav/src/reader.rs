//! WAV (RIFF WAVE) 读取器.
//!
//! 只接受矩阵编码母带的常见形式: PCM 整数, 16 位, 双声道, 小端交错.
//!
//! WAV 文件结构:
//! ```text
//! RIFF header:  "RIFF" + file_size-8 + "WAVE"
//! fmt  chunk:   "fmt " + chunk_size + audio_format + channels + sample_rate
//!              + byte_rate + block_align + bits_per_sample
//! data chunk:   "data" + data_size + PCM samples...
//! ```

use log::{debug, warn};
use sqdec_core::{SqError, SqResult};

use crate::io::IoContext;
use crate::{PCM_SCALE, WAV_FORMAT_PCM};

/// 每次从 data 块读取的帧数
const READ_CHUNK_FRAMES: usize = 4096;

/// fmt 块中与解码相关的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    /// 格式码 (1 = PCM)
    pub audio_format: u16,
    /// 声道数
    pub channels: u16,
    /// 采样率
    pub sample_rate: u32,
    /// 块对齐 (每帧字节数)
    pub block_align: u16,
    /// 位深
    pub bits_per_sample: u16,
    /// data 块声明的大小 (字节)
    pub data_size: u64,
}

impl WavInfo {
    /// data 块声明的帧数
    pub fn frames(&self) -> u64 {
        if self.block_align == 0 {
            0
        } else {
            self.data_size / u64::from(self.block_align)
        }
    }

    /// 时长 (秒)
    pub fn duration(&self) -> Option<f64> {
        if self.sample_rate == 0 {
            None
        } else {
            Some(self.frames() as f64 / f64::from(self.sample_rate))
        }
    }
}

/// 解交错后的立体声采样, 已换算到约 [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct StereoSamples {
    /// 采样率
    pub sample_rate: u32,
    /// 左总声道 (LT)
    pub left: Vec<f64>,
    /// 右总声道 (RT)
    pub right: Vec<f64>,
}

impl StereoSamples {
    /// 每声道采样数
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// WAV 读取器
#[derive(Debug)]
pub struct WavReader {
    io: IoContext,
    info: WavInfo,
}

impl WavReader {
    /// 打开文件并解析头部
    pub fn open(path: &str) -> SqResult<Self> {
        let io = IoContext::open_read(path)?;
        Self::new(io)
    }

    /// 从 I/O 上下文解析头部, 读取位置停在 data 块开头
    pub fn new(mut io: IoContext) -> SqResult<Self> {
        let riff_tag = io.read_tag()?;
        if &riff_tag != b"RIFF" {
            return Err(SqError::InvalidData("不是有效的 RIFF 文件".into()));
        }
        let _file_size = io.read_u32_le()?;
        let wave_tag = io.read_tag()?;
        if &wave_tag != b"WAVE" {
            return Err(SqError::InvalidData("不是有效的 WAVE 文件".into()));
        }

        let mut fmt: Option<WavInfo> = None;
        loop {
            let chunk_id = match io.read_tag() {
                Ok(tag) => tag,
                Err(SqError::Eof) => break,
                Err(e) => return Err(e),
            };
            let chunk_size = u64::from(io.read_u32_le()?);

            match &chunk_id {
                b"fmt " => {
                    if chunk_size < 16 {
                        return Err(SqError::InvalidData("fmt 块大小不足 16 字节".into()));
                    }
                    let audio_format = io.read_u16_le()?;
                    let channels = io.read_u16_le()?;
                    let sample_rate = io.read_u32_le()?;
                    let _byte_rate = io.read_u32_le()?;
                    let block_align = io.read_u16_le()?;
                    let bits_per_sample = io.read_u16_le()?;
                    debug!(
                        "fmt: format={}, channels={}, rate={}, block_align={}, bits={}",
                        audio_format, channels, sample_rate, block_align, bits_per_sample,
                    );
                    if chunk_size > 16 {
                        io.skip((chunk_size - 16) as usize)?;
                    }
                    fmt = Some(WavInfo {
                        audio_format,
                        channels,
                        sample_rate,
                        block_align,
                        bits_per_sample,
                        data_size: 0,
                    });
                }
                b"data" => {
                    let Some(mut info) = fmt else {
                        return Err(SqError::InvalidData("data 块出现在 fmt 块之前".into()));
                    };
                    info.data_size = chunk_size;
                    Self::validate(&info)?;
                    debug!(
                        "WAV 打开完成: {} Hz, {} 声道, {} 位, 帧数={}",
                        info.sample_rate,
                        info.channels,
                        info.bits_per_sample,
                        info.frames(),
                    );
                    return Ok(Self { io, info });
                }
                _ => {
                    warn!(
                        "跳过未知块: '{}', 大小={}",
                        String::from_utf8_lossy(&chunk_id),
                        chunk_size
                    );
                    io.skip(chunk_size as usize)?;
                }
            }

            // RIFF 块按偶数对齐, 奇数大小后有 1 字节填充
            if chunk_size % 2 != 0 {
                io.skip(1)?;
            }
        }

        if fmt.is_none() {
            return Err(SqError::InvalidData("未找到 fmt 块".into()));
        }
        Err(SqError::InvalidData("未找到 data 块".into()))
    }

    /// 只接受 16 位双声道 PCM
    fn validate(info: &WavInfo) -> SqResult<()> {
        if info.audio_format != WAV_FORMAT_PCM {
            return Err(SqError::Unsupported(format!(
                "不支持的 WAV 格式码: 0x{:04X}, 仅支持 PCM",
                info.audio_format
            )));
        }
        if info.bits_per_sample != 16 {
            return Err(SqError::Unsupported(format!(
                "不支持的 PCM 位深: {}, 仅支持 16 位",
                info.bits_per_sample
            )));
        }
        if info.channels != 2 {
            return Err(SqError::Unsupported(format!(
                "矩阵解码需要双声道输入, 实际 {} 声道",
                info.channels
            )));
        }
        if info.block_align != 4 {
            return Err(SqError::InvalidData(format!(
                "块对齐与 16 位双声道不符: {}",
                info.block_align
            )));
        }
        if info.sample_rate == 0 {
            return Err(SqError::InvalidData("采样率为 0".into()));
        }
        Ok(())
    }

    /// 头部信息
    pub fn info(&self) -> &WavInfo {
        &self.info
    }

    /// 读取全部采样并解交错, 每个 16 位整数除以 32767
    ///
    /// data 块实际长度短于声明时, 以实际读到的完整帧为准.
    pub fn read_stereo(mut self) -> SqResult<StereoSamples> {
        let declared_frames = self.info.frames() as usize;
        let mut left = Vec::with_capacity(declared_frames);
        let mut right = Vec::with_capacity(declared_frames);

        let mut remaining = self.info.data_size as usize;
        let mut chunk = vec![0u8; READ_CHUNK_FRAMES * 4];
        while remaining >= 4 {
            let want = remaining.min(chunk.len()) / 4 * 4;
            let got = self.io.read_fill(&mut chunk[..want])?;
            for frame in chunk[..got / 4 * 4].chunks_exact(4) {
                let l = i16::from_le_bytes([frame[0], frame[1]]);
                let r = i16::from_le_bytes([frame[2], frame[3]]);
                left.push(f64::from(l) / PCM_SCALE);
                right.push(f64::from(r) / PCM_SCALE);
            }
            if got < want {
                warn!(
                    "data 块被截断: 声明 {} 帧, 实际 {} 帧",
                    declared_frames,
                    left.len()
                );
                break;
            }
            remaining -= got;
        }

        debug!(
            "读取立体声采样: 每声道 {} 个, 输入 {} 字节",
            left.len(),
            left.len() * 4
        );

        Ok(StereoSamples {
            sample_rate: self.info.sample_rate,
            left,
            right,
        })
    }
}

/// 读取双声道 16 位 PCM WAV 文件
pub fn read_stereo_wav(path: &str) -> SqResult<StereoSamples> {
    WavReader::open(path)?.read_stereo()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryBackend;

    /// 构建最简单的 WAV 文件数据
    fn make_wav(channels: u16, bits: u16, extra_chunk: bool, pcm_data: &[u8]) -> Vec<u8> {
        let sample_rate: u32 = 44100;
        let block_align = channels * (bits / 8);
        let byte_rate = sample_rate * u32::from(block_align);

        let mut buf = Vec::new();
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&sample_rate.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());
        if extra_chunk {
            // 奇数大小的 LIST 块, 后跟 1 字节填充
            buf.extend_from_slice(b"LIST");
            buf.extend_from_slice(&3u32.to_le_bytes());
            buf.extend_from_slice(&[b'a', b'b', b'c', 0]);
        }
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&(pcm_data.len() as u32).to_le_bytes());
        buf.extend_from_slice(pcm_data);
        buf
    }

    fn stereo_pcm(frames: &[(i16, i16)]) -> Vec<u8> {
        let mut data = Vec::new();
        for &(l, r) in frames {
            data.extend_from_slice(&l.to_le_bytes());
            data.extend_from_slice(&r.to_le_bytes());
        }
        data
    }

    fn reader_for(data: Vec<u8>) -> SqResult<WavReader> {
        WavReader::new(IoContext::new(Box::new(MemoryBackend::from_data(data))))
    }

    #[test]
    fn test_读取_解交错与换算() {
        let pcm = stereo_pcm(&[(32767, -32767), (0, 16384), (-32768, 1)]);
        let reader = reader_for(make_wav(2, 16, false, &pcm)).unwrap();
        assert_eq!(reader.info().frames(), 3);
        let samples = reader.read_stereo().unwrap();
        assert_eq!(samples.sample_rate, 44100);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples.left[0], 1.0);
        assert_eq!(samples.right[0], -1.0);
        assert!((samples.right[1] - 16384.0 / 32767.0).abs() < 1e-15);
        // -32768 / 32767 略超 -1
        assert!(samples.left[2] < -1.0);
    }

    #[test]
    fn test_读取_跳过未知块() {
        let pcm = stereo_pcm(&[(100, 200)]);
        let samples = reader_for(make_wav(2, 16, true, &pcm))
            .unwrap()
            .read_stereo()
            .unwrap();
        assert_eq!(samples.left, vec![100.0 / 32767.0]);
        assert_eq!(samples.right, vec![200.0 / 32767.0]);
    }

    #[test]
    fn test_读取_截断的数据块() {
        let pcm = stereo_pcm(&[(1, 2), (3, 4), (5, 6)]);
        let mut wav = make_wav(2, 16, false, &pcm);
        // 去掉最后一帧半
        wav.truncate(wav.len() - 6);
        let samples = reader_for(wav).unwrap().read_stereo().unwrap();
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_读取_空数据块() {
        let samples = reader_for(make_wav(2, 16, false, &[]))
            .unwrap()
            .read_stereo()
            .unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn test_拒绝_单声道() {
        let err = reader_for(make_wav(1, 16, false, &[0; 4])).err().unwrap();
        assert!(matches!(err, SqError::Unsupported(_)));
    }

    #[test]
    fn test_拒绝_24位() {
        let err = reader_for(make_wav(2, 24, false, &[0; 6])).err().unwrap();
        assert!(matches!(err, SqError::Unsupported(_)));
    }

    #[test]
    fn test_拒绝_非_riff() {
        let err = reader_for(b"NOT_RIFF_DATA_HERE".to_vec()).err().unwrap();
        assert!(matches!(err, SqError::InvalidData(_)));
    }

    #[test]
    fn test_拒绝_缺少_data_块() {
        let mut wav = make_wav(2, 16, false, &[]);
        wav.truncate(36);
        let err = reader_for(wav).err().unwrap();
        assert!(matches!(err, SqError::InvalidData(_)));
    }
}
