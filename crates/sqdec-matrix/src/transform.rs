//! 频域变换.
//!
//! 对整段信号做一次长度为 N 的实数 FFT (不分帧, 不加窗).
//! 正变换输出 N/2+1 个复数系数 (含直流与奈奎斯特),
//! 逆变换带 1/N 缩放, 与正变换构成精确互逆对.

use std::sync::Arc;

use log::trace;
use num_complex::Complex64;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use sqdec_core::{SqError, SqResult};

/// 实信号 DFT 的非冗余一半 (长度 N/2+1)
pub type Spectrum = Vec<Complex64>;

/// 固定长度的正/逆实数 FFT 对
///
/// 计划 (plan) 在构造时生成一次, 之后可在多个线程间共享调用.
pub struct SpectralTransform {
    /// 时域信号长度 N
    len: usize,
    /// 正变换计划 (N = 0 时为空)
    forward: Option<Arc<dyn RealToComplex<f64>>>,
    /// 逆变换计划 (N = 0 时为空)
    inverse: Option<Arc<dyn ComplexToReal<f64>>>,
}

impl SpectralTransform {
    /// 为长度为 `len` 的信号创建变换对
    pub fn new(len: usize) -> Self {
        if len == 0 {
            return Self {
                len,
                forward: None,
                inverse: None,
            };
        }

        let mut planner = RealFftPlanner::<f64>::new();
        Self {
            len,
            forward: Some(planner.plan_fft_forward(len)),
            inverse: Some(planner.plan_fft_inverse(len)),
        }
    }

    /// 时域长度 N
    pub fn len(&self) -> usize {
        self.len
    }

    /// 是否为零长度变换
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 频谱长度 M = N/2 + 1 (零长度信号对应空频谱)
    pub fn spectrum_len(&self) -> usize {
        if self.len == 0 { 0 } else { self.len / 2 + 1 }
    }

    /// 正变换: N 个实数采样 -> M 个复数系数 (不缩放)
    pub fn forward(&self, samples: &[f64]) -> SqResult<Spectrum> {
        if samples.len() != self.len {
            return Err(SqError::LengthMismatch {
                expected: self.len,
                actual: samples.len(),
            });
        }
        let Some(plan) = &self.forward else {
            return Ok(Vec::new());
        };

        // realfft 会把输入当作临时空间改写, 先复制一份
        let mut input = samples.to_vec();
        let mut output = plan.make_output_vec();
        plan.process(&mut input, &mut output)
            .map_err(|e| SqError::Transform(e.to_string()))?;

        trace!("正变换: N={}, M={}", self.len, output.len());
        Ok(output)
    }

    /// 逆变换: M 个复数系数 -> N 个实数采样 (乘以 1/N)
    ///
    /// 实信号的直流分量 (偶数 N 时还有奈奎斯特分量) 必为实数,
    /// 其虚部在变换前被置零.
    pub fn inverse(&self, spectrum: &[Complex64]) -> SqResult<Vec<f64>> {
        if spectrum.len() != self.spectrum_len() {
            return Err(SqError::LengthMismatch {
                expected: self.spectrum_len(),
                actual: spectrum.len(),
            });
        }
        let Some(plan) = &self.inverse else {
            return Ok(Vec::new());
        };

        let mut input = spectrum.to_vec();
        input[0].im = 0.0;
        if self.len % 2 == 0 {
            if let Some(nyquist) = input.last_mut() {
                nyquist.im = 0.0;
            }
        }

        let mut output = plan.make_output_vec();
        plan.process(&mut input, &mut output)
            .map_err(|e| SqError::Transform(e.to_string()))?;

        let scale = 1.0 / self.len as f64;
        for s in output.iter_mut() {
            *s *= scale;
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_变换_频谱长度() {
        assert_eq!(SpectralTransform::new(8).spectrum_len(), 5);
        assert_eq!(SpectralTransform::new(7).spectrum_len(), 4);
        assert_eq!(SpectralTransform::new(1).spectrum_len(), 1);
        assert_eq!(SpectralTransform::new(0).spectrum_len(), 0);
    }

    #[test]
    fn test_变换_往返恢复原信号() {
        for len in [2usize, 7, 16, 441] {
            let signal: Vec<f64> = (0..len)
                .map(|i| (i as f64 * 0.37).sin() * 0.8 - 0.1)
                .collect();
            let t = SpectralTransform::new(len);
            let spec = t.forward(&signal).unwrap();
            let back = t.inverse(&spec).unwrap();
            assert_eq!(back.len(), len);
            for (a, b) in signal.iter().zip(&back) {
                assert!((a - b).abs() < 1e-12, "len={len}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_变换_直流分量() {
        let t = SpectralTransform::new(4);
        let spec = t.forward(&[0.5, 0.5, 0.5, 0.5]).unwrap();
        assert!((spec[0].re - 2.0).abs() < 1e-12);
        assert!(spec[1].norm() < 1e-12);
        assert!(spec[2].norm() < 1e-12);
    }

    #[test]
    fn test_变换_逆变换忽略直流虚部() {
        let t = SpectralTransform::new(4);
        let mut spec = t.forward(&[1.0, 0.0, -1.0, 0.0]).unwrap();
        spec[0].im = 3.0;
        spec[2].im = -2.0;
        let back = t.inverse(&spec).unwrap();
        let expected = [1.0, 0.0, -1.0, 0.0];
        for (a, b) in expected.iter().zip(&back) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_变换_零长度() {
        let t = SpectralTransform::new(0);
        assert!(t.is_empty());
        assert!(t.forward(&[]).unwrap().is_empty());
        assert!(t.inverse(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_变换_长度不符报错() {
        let t = SpectralTransform::new(8);
        let err = t.forward(&[0.0; 7]).unwrap_err();
        assert!(matches!(
            err,
            SqError::LengthMismatch {
                expected: 8,
                actual: 7
            }
        ));
        assert!(t.inverse(&vec![Complex64::new(0.0, 0.0); 4]).is_err());
    }
}
