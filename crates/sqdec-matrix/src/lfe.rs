//! LFE 整形滤波器.
//!
//! LFE 声道由前后声道求和推导而来, 本身是全频带信号,
//! 合成前需要把截止频率 (默认 150 Hz) 以上的频点压下去.
//!
//! 两种策略:
//! - 指数滚降 (默认): `f > fc` 的频点乘以 `exp(-(f - fc) / τ)`, τ = 0.7·fc
//! - 矩形截止 (旧版): 索引 `>= floor(fc / Δf) + 1` 的频点直接置零, 时域会有振铃

use log::{debug, warn};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use sqdec_core::{SqError, SqResult};
use std::fmt;

/// 默认 LFE 截止频率 (Hz)
pub const DEFAULT_LFE_CUTOFF_HZ: f64 = 150.0;

/// 指数滚降时间常数与截止频率之比
const ROLLOFF_TAU_RATIO: f64 = 0.7;

/// LFE 整形策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LfeShaping {
    /// 连续指数滚降
    #[default]
    Exponential,
    /// 矩形硬截止 (旧版行为, 保留用于对比)
    Rectangular,
}

impl LfeShaping {
    /// 严格解析策略名
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "exp" | "exponential" | "continuous" => Some(Self::Exponential),
            "rect" | "rectangular" | "legacy" => Some(Self::Rectangular),
            _ => None,
        }
    }

    /// 宽松解析: 无法识别时回退到指数滚降
    pub fn from_name_lossy(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            warn!("未知 LFE 滤波策略 '{}', 使用默认指数滚降", name);
            Self::default()
        })
    }

    /// 策略名
    pub fn name(self) -> &'static str {
        match self {
            Self::Exponential => "exp",
            Self::Rectangular => "rect",
        }
    }
}

impl fmt::Display for LfeShaping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 指数滚降在频率 `freq` 处的增益
///
/// 截止频率及以下恒为 1.0, 以上严格递减并趋于 0.
pub fn exponential_gain(freq: f64, cutoff_hz: f64) -> f64 {
    if freq <= cutoff_hz {
        1.0
    } else {
        (-(freq - cutoff_hz) / (ROLLOFF_TAU_RATIO * cutoff_hz)).exp()
    }
}

/// 绑定到具体信号参数的 LFE 滤波器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfeFilter {
    shaping: LfeShaping,
    cutoff_hz: f64,
    /// 频率分辨率 Δf = sample_rate / N
    freq_resolution: f64,
}

impl LfeFilter {
    /// 创建滤波器
    ///
    /// - `sample_rate`: 信号采样率 (Hz)
    /// - `signal_len`: 时域信号长度 N (不是频谱长度)
    pub fn new(
        shaping: LfeShaping,
        cutoff_hz: f64,
        sample_rate: u32,
        signal_len: usize,
    ) -> SqResult<Self> {
        if sample_rate == 0 {
            return Err(SqError::InvalidArgument("采样率不能为 0".into()));
        }
        if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 {
            return Err(SqError::InvalidArgument(format!(
                "LFE 截止频率无效: {cutoff_hz}"
            )));
        }
        let freq_resolution = if signal_len == 0 {
            0.0
        } else {
            f64::from(sample_rate) / signal_len as f64
        };
        Ok(Self {
            shaping,
            cutoff_hz,
            freq_resolution,
        })
    }

    /// 频点 `bin` 的中心频率
    pub fn bin_frequency(&self, bin: usize) -> f64 {
        bin as f64 * self.freq_resolution
    }

    /// 矩形截止的首个置零频点索引
    ///
    /// 截止频率极大时饱和到 `usize::MAX`, 即不置零任何频点.
    pub fn cutoff_bin(&self) -> usize {
        if self.freq_resolution == 0.0 {
            return usize::MAX;
        }
        ((self.cutoff_hz / self.freq_resolution).floor() as usize).saturating_add(1)
    }

    /// 频点 `bin` 上的增益
    pub fn gain_at(&self, bin: usize) -> f64 {
        match self.shaping {
            LfeShaping::Exponential => exponential_gain(self.bin_frequency(bin), self.cutoff_hz),
            LfeShaping::Rectangular => {
                if bin >= self.cutoff_bin() {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    /// 就地整形 LFE 频谱, 截止频率以下的频点保持不变
    pub fn apply(&self, spectrum: &mut [Complex64]) {
        let mut attenuated = 0usize;
        for (bin, value) in spectrum.iter_mut().enumerate() {
            let gain = self.gain_at(bin);
            if gain < 1.0 {
                *value *= gain;
                attenuated += 1;
            }
        }
        debug!(
            "LFE 整形 ({}): 截止 {} Hz, 衰减频点 {}/{}",
            self.shaping,
            self.cutoff_hz,
            attenuated,
            spectrum.len(),
        );
    }
}
