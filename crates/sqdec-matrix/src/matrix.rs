//! 矩阵解码系数表与频域重组.
//!
//! 每个输出声道都是两路输入频谱的复线性组合:
//! `out[i] = a · LT[i] + b · RT[i]`, 系数 (a, b) 只取决于矩阵格式.
//!
//! | 格式 | 声道 | 公式 |
//! |------|------|------|
//! | SQ | FL / FR | LT / RT |
//! | SQ | BL | -α·(RT - j·LT), α = 1/√2 |
//! | SQ | BR | α·(LT - j·RT) |
//! | QS | FL | α·LT + β·RT, α = 0.924, β = 0.383 |
//! | QS | FR | β·RT + α·RT |
//! | QS | BL | j·(β·RT - α·LT) |
//! | QS | BR | j·(β·LT - α·RT) |
//!
//! 5.1 额外推导: C = (1/√2)·(LT + RT), LFE = γ·(LT + RT + BL + BR), γ = 10^(-0.5).

use std::f64::consts::FRAC_1_SQRT_2;

use log::debug;
use num_complex::Complex64;
use sqdec_core::{Channel, ChannelLayout, MatrixFormat, SqError, SqResult};

use crate::transform::Spectrum;

/// SQ 后方声道系数 α = 1/√2
pub const SQ_ALPHA: f64 = FRAC_1_SQRT_2;

/// QS 主系数 α (cos 22.5°)
pub const QS_ALPHA: f64 = 0.924;

/// QS 副系数 β (sin 22.5°)
pub const QS_BETA: f64 = 0.383;

/// 中置声道系数, SQ 与 QS 共用
pub const CENTER_GAIN: f64 = FRAC_1_SQRT_2;

/// LFE 声道系数 γ = 10^(-0.5) (约 -10 dB)
pub const LFE_GAIN: f64 = 0.316_227_766_016_837_94;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const J: Complex64 = Complex64::new(0.0, 1.0);

/// 单个输出声道的重组系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixCoefficients {
    /// LT 的复系数
    pub lt: Complex64,
    /// RT 的复系数
    pub rt: Complex64,
}

impl MixCoefficients {
    const fn new(lt: Complex64, rt: Complex64) -> Self {
        Self { lt, rt }
    }

    /// 计算一个频点的输出
    #[inline]
    pub fn apply(&self, lt: Complex64, rt: Complex64) -> Complex64 {
        self.lt * lt + self.rt * rt
    }
}

/// 一种矩阵格式的四声道系数表
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixCoefficients {
    pub front_left: MixCoefficients,
    pub front_right: MixCoefficients,
    pub back_left: MixCoefficients,
    pub back_right: MixCoefficients,
}

impl MatrixCoefficients {
    /// SQ 系数表
    pub fn sq() -> Self {
        let a = Complex64::new(SQ_ALPHA, 0.0);
        Self {
            front_left: MixCoefficients::new(Complex64::new(1.0, 0.0), ZERO),
            front_right: MixCoefficients::new(ZERO, Complex64::new(1.0, 0.0)),
            // -α·(RT - j·LT) = jα·LT - α·RT
            back_left: MixCoefficients::new(J * a, -a),
            // α·(LT - j·RT) = α·LT - jα·RT
            back_right: MixCoefficients::new(a, -J * a),
        }
    }

    /// QS 系数表
    pub fn qs() -> Self {
        let a = Complex64::new(QS_ALPHA, 0.0);
        let b = Complex64::new(QS_BETA, 0.0);
        Self {
            front_left: MixCoefficients::new(a, b),
            // 两项都取 RT, 不含 LT
            front_right: MixCoefficients::new(ZERO, b + a),
            // j·(β·RT - α·LT)
            back_left: MixCoefficients::new(-J * a, J * b),
            // j·(β·LT - α·RT)
            back_right: MixCoefficients::new(J * b, -J * a),
        }
    }

    /// 按格式查表
    pub fn for_format(format: MatrixFormat) -> Self {
        match format {
            MatrixFormat::Sq => Self::sq(),
            MatrixFormat::Qs => Self::qs(),
        }
    }

    /// 中置声道系数 (与格式无关)
    pub fn center(&self) -> MixCoefficients {
        let c = Complex64::new(CENTER_GAIN, 0.0);
        MixCoefficients::new(c, c)
    }

    /// 计算一个频点上指定声道的输出
    pub fn mix(&self, channel: Channel, lt: Complex64, rt: Complex64) -> Complex64 {
        match channel {
            Channel::FrontLeft => self.front_left.apply(lt, rt),
            Channel::FrontRight => self.front_right.apply(lt, rt),
            Channel::BackLeft => self.back_left.apply(lt, rt),
            Channel::BackRight => self.back_right.apply(lt, rt),
            Channel::Center => self.center().apply(lt, rt),
            Channel::LowFrequency => {
                let bl = self.back_left.apply(lt, rt);
                let br = self.back_right.apply(lt, rt);
                (lt + rt + bl + br) * LFE_GAIN
            }
        }
    }
}

/// 按布局规范顺序排列的输出频谱
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpectra {
    /// 输出布局
    pub layout: ChannelLayout,
    /// 各声道频谱, 顺序与 `layout.order()` 一致
    pub spectra: Vec<Spectrum>,
}

impl ChannelSpectra {
    /// 获取指定声道的频谱
    pub fn get(&self, channel: Channel) -> Option<&Spectrum> {
        self.layout
            .index_of(channel)
            .and_then(|idx| self.spectra.get(idx))
    }

    /// 获取指定声道的可变频谱
    pub fn get_mut(&mut self, channel: Channel) -> Option<&mut Spectrum> {
        let idx = self.layout.index_of(channel)?;
        self.spectra.get_mut(idx)
    }
}

/// 将 LT/RT 两路频谱重组为布局内的全部声道频谱
///
/// 两路频谱长度必须一致, 否则整个调用失败且不产生任何输出.
pub fn recombine(
    lt: &[Complex64],
    rt: &[Complex64],
    format: MatrixFormat,
    layout: ChannelLayout,
) -> SqResult<ChannelSpectra> {
    if lt.len() != rt.len() {
        return Err(SqError::LengthMismatch {
            expected: lt.len(),
            actual: rt.len(),
        });
    }

    let order = layout.order();
    if order.is_empty() {
        return Err(SqError::InvalidArgument(format!("不支持的输出布局: {layout}")));
    }

    let coeffs = MatrixCoefficients::for_format(format);
    let spectra: Vec<Spectrum> = order
        .iter()
        .map(|&ch| {
            lt.iter()
                .zip(rt)
                .map(|(&l, &r)| coeffs.mix(ch, l, r))
                .collect()
        })
        .collect();

    debug!(
        "{} 矩阵重组: 输入频点={}, 输出 {} 声道 x {} 频点",
        format,
        lt.len(),
        spectra.len(),
        spectra.first().map_or(0, Vec::len),
    );

    Ok(ChannelSpectra { layout, spectra })
}
