//! # sqdec
//!
//! 纯 Rust 实现的 SQ/QS 矩阵环绕声解码器.
//!
//! 70 年代的 SQ (CBS) 与 QS (Sansui) 四声道唱片把四路声道以固定相位/幅度矩阵
//! 编码进普通立体声. sqdec 在频域用固定复系数把 LT/RT 还原为四声道或 5.1.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use sqdec::{DecodeConfig, MatrixFormat, OutputLayout};
//!
//! let config = DecodeConfig::default()
//!     .with_matrix_format(MatrixFormat::Qs)
//!     .with_output_layout(OutputLayout::Surround51);
//! let decoded = sqdec::decode_file("album.wav", config).unwrap();
//! println!("{} 声道, {} 帧", decoded.layout().channels, decoded.len());
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `sqdec-core` | 错误类型, 声道布局, 矩阵/输出格式枚举 |
//! | `sqdec-matrix` | 频域变换, 矩阵重组, LFE 整形, 归一化, 解码流水线 |
//! | `sqdec-wav` | WAV 读写 |

/// 核心类型
pub use sqdec_core as core;

/// 矩阵解码
pub use sqdec_matrix as matrix;

/// WAV 读写
pub use sqdec_wav as wav;

pub use sqdec_core::{Channel, ChannelLayout, MatrixFormat, OutputLayout, SqError, SqResult};
pub use sqdec_matrix::{DecodeConfig, DecodedChannels, LfeShaping, MatrixDecoder};

/// 获取 sqdec 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 读取立体声 WAV 文件并按配置解码
pub fn decode_file(path: &str, config: DecodeConfig) -> SqResult<DecodedChannels> {
    let samples = sqdec_wav::read_stereo_wav(path)?;
    log::debug!("解码文件 {}: {} 帧", path, samples.len());
    MatrixDecoder::new(config).decode(&samples.left, &samples.right, samples.sample_rate)
}
