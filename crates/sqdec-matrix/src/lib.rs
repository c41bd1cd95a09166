//! # sqdec-matrix
//!
//! SQ/QS 矩阵环绕声解码核心.
//!
//! 对整段立体声做一次实数 FFT, 在频域用固定复系数把 LT/RT 重组为
//! 四声道或 5.1 声道, 对 LFE 声道做低通整形, 逆变换回时域后做峰值归一化.
//!
//! ## 使用示例
//!
//! ```rust
//! use sqdec_matrix::{DecodeConfig, MatrixDecoder};
//! use sqdec_core::{Channel, MatrixFormat, OutputLayout};
//!
//! let config = DecodeConfig::default()
//!     .with_matrix_format(MatrixFormat::Sq)
//!     .with_output_layout(OutputLayout::Surround51);
//! let decoder = MatrixDecoder::new(config);
//!
//! let lt = vec![0.0f64; 1024];
//! let rt = vec![0.0f64; 1024];
//! let out = decoder.decode(&lt, &rt, 44100).unwrap();
//! assert_eq!(out.channel(Channel::LowFrequency).unwrap().len(), 1024);
//! ```

pub mod decoder;
pub mod lfe;
pub mod matrix;
pub mod normalize;
pub mod observer;
pub mod transform;

pub use decoder::{DecodeConfig, DecodedChannels, MatrixDecoder};
pub use lfe::{DEFAULT_LFE_CUTOFF_HZ, LfeFilter, LfeShaping};
pub use matrix::{ChannelSpectra, MatrixCoefficients, MixCoefficients, recombine};
pub use normalize::{NormalizeGroup, normalize_pair, normalize_single, peak};
pub use observer::{DecodeObserver, DecodeStage, LogObserver, NullObserver, RecordingObserver};
pub use transform::{SpectralTransform, Spectrum};
