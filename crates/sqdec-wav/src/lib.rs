//! # sqdec-wav
//!
//! sqdec 的 WAV 读写.
//!
//! - 读取: 双声道 16 位小端交错 PCM -> 两路 f64 (除以 32767)
//! - 写入: 任意声道数的平面 f64 -> 16 位 PCM, 头部大小字段按实际数据回填

pub mod io;
pub mod reader;
pub mod writer;

pub use io::{IoBackend, IoContext, MemoryBackend};
pub use reader::{StereoSamples, WavInfo, WavReader, read_stereo_wav};
pub use writer::{WavWriter, sample_to_i16, write_wav};

/// WAV 音频格式码: PCM 整数
pub(crate) const WAV_FORMAT_PCM: u16 = 0x0001;

/// 16 位 PCM 与浮点之间的换算系数 (i16::MAX)
pub const PCM_SCALE: f64 = i16::MAX as f64;
