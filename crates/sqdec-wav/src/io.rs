//! I/O 抽象层.
//!
//! 为 WAV 读写提供统一的带缓冲读写接口, 支持文件和内存缓冲区两种后端.

use std::io::{self, Read, Seek, Write};

use sqdec_core::{SqError, SqResult};

/// I/O 上下文
///
/// 封装底层 I/O 操作, 为 WAV 读取器/写入器提供统一的数据读写接口.
pub struct IoContext {
    /// 内部 I/O 实现
    inner: Box<dyn IoBackend>,
    /// 读缓冲区
    buffer: Vec<u8>,
    /// 缓冲区中的有效数据长度
    buf_len: usize,
    /// 缓冲区当前读取位置
    buf_pos: usize,
}

impl std::fmt::Debug for IoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoContext")
            .field("buf_len", &self.buf_len)
            .field("buf_pos", &self.buf_pos)
            .finish_non_exhaustive()
    }
}

/// I/O 后端 trait
pub trait IoBackend: Send {
    /// 读取数据到缓冲区
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// 全部写入
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
    /// 刷新写入
    fn flush(&mut self) -> io::Result<()>;
    /// 定位 (seek)
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64>;
}

/// 默认缓冲区大小 (32 KB)
const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

impl IoContext {
    /// 从 I/O 后端创建上下文
    pub fn new(backend: Box<dyn IoBackend>) -> Self {
        Self {
            inner: backend,
            buffer: vec![0u8; DEFAULT_BUFFER_SIZE],
            buf_len: 0,
            buf_pos: 0,
        }
    }

    /// 从文件路径打开 (只读)
    pub fn open_read(path: &str) -> SqResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self::new(Box::new(FileBackend::new(file))))
    }

    /// 从文件路径打开 (写入, 已存在则截断)
    pub fn open_write(path: &str) -> SqResult<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(FileBackend::new(file))))
    }

    // ========================
    // 读取方法
    // ========================

    /// 读取指定字节数, 数据不足时返回 [`SqError::Eof`]
    pub fn read_exact(&mut self, buf: &mut [u8]) -> SqResult<()> {
        if self.read_fill(buf)? < buf.len() {
            return Err(SqError::Eof);
        }
        Ok(())
    }

    /// 尽量填满 `buf`, 遇到流末尾时提前返回
    ///
    /// 返回实际读取的字节数, 0 表示已无数据.
    pub fn read_fill(&mut self, buf: &mut [u8]) -> SqResult<usize> {
        let mut total_read = 0;
        while total_read < buf.len() {
            let buffered = self.buf_len - self.buf_pos;
            if buffered > 0 {
                let to_copy = buffered.min(buf.len() - total_read);
                buf[total_read..total_read + to_copy]
                    .copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + to_copy]);
                self.buf_pos += to_copy;
                total_read += to_copy;
            } else {
                self.buf_pos = 0;
                self.buf_len = self.inner.read(&mut self.buffer)?;
                if self.buf_len == 0 {
                    break;
                }
            }
        }
        Ok(total_read)
    }

    /// 读取 u16 小端
    pub fn read_u16_le(&mut self) -> SqResult<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// 读取 u32 小端
    pub fn read_u32_le(&mut self) -> SqResult<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// 读取 4 字节标签 (FourCC)
    pub fn read_tag(&mut self) -> SqResult<[u8; 4]> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// 跳过指定字节数
    pub fn skip(&mut self, count: usize) -> SqResult<()> {
        // 先尝试消耗缓冲区中的数据
        let buffered = self.buf_len - self.buf_pos;
        if count <= buffered {
            self.buf_pos += count;
            return Ok(());
        }

        let remaining = i64::try_from(count - buffered)
            .map_err(|_| SqError::InvalidData(format!("跳过字节数过大: {count}")))?;
        self.buf_pos = 0;
        self.buf_len = 0;
        self.inner.seek(io::SeekFrom::Current(remaining))?;
        Ok(())
    }

    // ========================
    // 写入方法
    // ========================

    /// 写入全部数据
    pub fn write_all(&mut self, buf: &[u8]) -> SqResult<()> {
        self.inner.write_all(buf)?;
        Ok(())
    }

    /// 写入 u16 小端
    pub fn write_u16_le(&mut self, v: u16) -> SqResult<()> {
        self.write_all(&v.to_le_bytes())
    }

    /// 写入 u32 小端
    pub fn write_u32_le(&mut self, v: u32) -> SqResult<()> {
        self.write_all(&v.to_le_bytes())
    }

    /// 写入 4 字节标签 (FourCC)
    pub fn write_tag(&mut self, tag: &[u8; 4]) -> SqResult<()> {
        self.write_all(tag)
    }

    /// 刷新底层写入
    pub fn flush(&mut self) -> SqResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    // ========================
    // 定位方法
    // ========================

    /// 定位 (seek)
    ///
    /// 注意: seek 会清空读缓冲区.
    pub fn seek(&mut self, pos: io::SeekFrom) -> SqResult<u64> {
        self.buf_pos = 0;
        self.buf_len = 0;
        Ok(self.inner.seek(pos)?)
    }
}

/// 文件 I/O 后端
///
/// 写入经过 `BufWriter`, 读写切换时先刷新.
struct FileBackend {
    file: io::BufWriter<std::fs::File>,
}

impl FileBackend {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: io::BufWriter::new(file),
        }
    }
}

impl IoBackend for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.flush()?;
        self.file.get_mut().read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

/// 内存缓冲区 I/O 后端
///
/// 用于测试和内存中处理. 内部数据通过共享句柄暴露, 写入完成后可取回.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    /// 数据缓冲区
    data: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
    /// 当前位置
    pos: usize,
}

impl MemoryBackend {
    /// 从已有数据创建 (用于读取)
    pub fn from_data(data: Vec<u8>) -> Self {
        Self {
            data: std::sync::Arc::new(std::sync::Mutex::new(data)),
            pos: 0,
        }
    }

    /// 创建空缓冲区 (用于写入)
    pub fn new() -> Self {
        Self::default()
    }

    /// 复制出当前全部数据
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.lock().map(|d| d.clone()).unwrap_or_default()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, Vec<u8>>> {
        self.data
            .lock()
            .map_err(|_| io::Error::other("内存缓冲区锁已中毒"))
    }
}

impl IoBackend for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.lock()?;
        let available = data.len().saturating_sub(self.pos);
        let to_read = buf.len().min(available);
        if to_read == 0 {
            return Ok(0);
        }
        buf[..to_read].copy_from_slice(&data[self.pos..self.pos + to_read]);
        drop(data);
        self.pos += to_read;
        Ok(to_read)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut data = self.lock()?;
        if self.pos > data.len() {
            data.resize(self.pos, 0);
        }
        // 覆盖已有数据, 超出部分追加
        let overlap = (data.len() - self.pos).min(buf.len());
        data[self.pos..self.pos + overlap].copy_from_slice(&buf[..overlap]);
        if buf.len() > overlap {
            data.extend_from_slice(&buf[overlap..]);
        }
        drop(data);
        self.pos += buf.len();
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let len = self.lock()?.len() as i64;
        let new_pos = match pos {
            io::SeekFrom::Start(offset) => offset as i64,
            io::SeekFrom::End(offset) => len + offset,
            io::SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek 位置不能为负",
            ));
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_内存后端_写入回读() {
        let backend = MemoryBackend::new();
        let mut io = IoContext::new(Box::new(backend.clone()));
        io.write_tag(b"RIFF").unwrap();
        io.write_u32_le(0x1234_5678).unwrap();
        io.write_u16_le(0xABCD).unwrap();

        io.seek(io::SeekFrom::Start(0)).unwrap();
        assert_eq!(&io.read_tag().unwrap(), b"RIFF");
        assert_eq!(io.read_u32_le().unwrap(), 0x1234_5678);
        assert_eq!(io.read_u16_le().unwrap(), 0xABCD);
        assert!(matches!(io.read_u16_le().unwrap_err(), SqError::Eof));
        assert_eq!(backend.snapshot().len(), 10);
    }

    #[test]
    fn test_尽量读取_遇末尾提前返回() {
        let mut io = IoContext::new(Box::new(MemoryBackend::from_data(vec![1, 2, 3])));
        let mut buf = [0u8; 8];
        assert_eq!(io.read_fill(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(io.read_fill(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_内存后端_覆盖回填() {
        let backend = MemoryBackend::new();
        let mut io = IoContext::new(Box::new(backend.clone()));
        io.write_u32_le(0).unwrap();
        io.write_u32_le(7).unwrap();
        io.seek(io::SeekFrom::Start(0)).unwrap();
        io.write_u32_le(99).unwrap();
        assert_eq!(backend.snapshot(), vec![99, 0, 0, 0, 7, 0, 0, 0]);
    }

    #[test]
    fn test_跳过_缓冲区内外() {
        let mut io = IoContext::new(Box::new(MemoryBackend::from_data((0u8..20).collect())));
        io.skip(3).unwrap();
        let mut buf = [0u8; 2];
        io.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [3, 4]);
        io.skip(10).unwrap();
        let mut one = [0u8; 1];
        io.read_exact(&mut one).unwrap();
        assert_eq!(one, [15]);
        let mut rest = [0u8; 10];
        assert!(matches!(io.read_exact(&mut rest).unwrap_err(), SqError::Eof));
    }

    #[test]
    fn test_跳过_超出缓冲区后继续读取() {
        let data: Vec<u8> = (0..DEFAULT_BUFFER_SIZE + 64).map(|i| (i % 251) as u8).collect();
        let mut io = IoContext::new(Box::new(MemoryBackend::from_data(data.clone())));
        let mut first = [0u8; 4];
        io.read_exact(&mut first).unwrap();
        // 读缓冲区已填满, 跳过量超过剩余缓冲
        io.skip(DEFAULT_BUFFER_SIZE + 10).unwrap();
        let mut buf = [0u8; 4];
        io.read_exact(&mut buf).unwrap();
        let at = 4 + DEFAULT_BUFFER_SIZE + 10;
        assert_eq!(&buf, &data[at..at + 4]);
    }

    #[test]
    fn test_文件后端_读写() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("io.bin");
        let path = path.to_str().unwrap();
        {
            let mut io = IoContext::open_write(path).unwrap();
            io.write_tag(b"data").unwrap();
            io.write_u32_le(42).unwrap();
            io.flush().unwrap();
        }
        let mut io = IoContext::open_read(path).unwrap();
        assert_eq!(&io.read_tag().unwrap(), b"data");
        assert_eq!(io.read_u32_le().unwrap(), 42);
    }

    #[test]
    fn test_打开不存在文件报错() {
        let err = IoContext::open_read("/nonexistent/sqdec/input.wav").err().unwrap();
        assert!(matches!(err, SqError::Io(_)));
    }
}
