//! # sqdec-core
//!
//! sqdec 矩阵环绕声解码器的核心库, 提供基础类型定义与错误处理.
//!
//! 其余 crate (矩阵解码核心、WAV 读写、命令行) 都依赖本 crate 的类型.

pub mod channel_layout;
pub mod error;
pub mod format;

// 重导出常用类型
pub use channel_layout::{Channel, ChannelLayout, ChannelMask};
pub use error::{SqError, SqResult};
pub use format::{MatrixFormat, OutputLayout};
