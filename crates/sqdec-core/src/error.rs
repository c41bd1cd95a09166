//! 统一错误类型定义.
//!
//! 所有 sqdec crate 共用的错误类型, 支持跨模块传播.

use thiserror::Error;

/// sqdec 统一错误类型
#[derive(Debug, Error)]
pub enum SqError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 参与同一次解码/写入的缓冲区长度不一致
    #[error("缓冲区长度不一致: 期望 {expected}, 实际 {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// 不支持的操作或输入格式
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 无效数据 (损坏的 WAV 文件等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 频域变换失败
    #[error("频域变换错误: {0}")]
    Transform(String),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// sqdec 统一 Result 类型
pub type SqResult<T> = Result<T, SqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_错误_长度不一致消息() {
        let err = SqError::LengthMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(err.to_string(), "缓冲区长度不一致: 期望 4, 实际 3");
    }

    #[test]
    fn test_错误_io_自动转换() {
        fn open() -> SqResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))?;
            Ok(())
        }
        let err = open().unwrap_err();
        assert!(matches!(err, SqError::Io(_)));
    }
}
