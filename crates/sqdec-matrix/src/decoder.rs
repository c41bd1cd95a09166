//! 矩阵解码管线.
//!
//! 正变换 -> 矩阵重组 -> (LFE 整形, 仅 5.1) -> 逆变换 -> 归一化.
//!
//! 两路正变换相互独立, 各声道逆变换也相互独立, 开启 `parallel` 时
//! 交给 rayon 线程池并行计算; 每个输出缓冲区只由一个任务写入,
//! 归一化在全部逆变换完成之后进行.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sqdec_core::{Channel, ChannelLayout, MatrixFormat, OutputLayout, SqError, SqResult};

use crate::lfe::{DEFAULT_LFE_CUTOFF_HZ, LfeFilter, LfeShaping};
use crate::matrix::recombine;
use crate::normalize::{NormalizeGroup, groups_for, normalize_pair, normalize_single};
use crate::observer::{DecodeObserver, DecodeStage, LogObserver};
use crate::transform::{SpectralTransform, Spectrum};

/// 解码配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// 矩阵编码格式
    pub matrix_format: MatrixFormat,
    /// 输出布局
    pub output_layout: OutputLayout,
    /// LFE 整形策略 (仅 5.1 使用)
    pub lfe_shaping: LfeShaping,
    /// LFE 截止频率 (Hz)
    pub lfe_cutoff_hz: f64,
    /// 是否并行计算各路变换
    pub parallel: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            matrix_format: MatrixFormat::default(),
            output_layout: OutputLayout::default(),
            lfe_shaping: LfeShaping::default(),
            lfe_cutoff_hz: DEFAULT_LFE_CUTOFF_HZ,
            parallel: true,
        }
    }
}

impl DecodeConfig {
    pub fn with_matrix_format(mut self, format: MatrixFormat) -> Self {
        self.matrix_format = format;
        self
    }

    pub fn with_output_layout(mut self, layout: OutputLayout) -> Self {
        self.output_layout = layout;
        self
    }

    pub fn with_lfe_shaping(mut self, shaping: LfeShaping) -> Self {
        self.lfe_shaping = shaping;
        self
    }

    pub fn with_lfe_cutoff(mut self, cutoff_hz: f64) -> Self {
        self.lfe_cutoff_hz = cutoff_hz;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// 解码结果: 按布局规范顺序排列的时域缓冲区
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChannels {
    layout: ChannelLayout,
    sample_rate: u32,
    buffers: Vec<Vec<f64>>,
}

impl DecodedChannels {
    /// 输出布局
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// 采样率 (与输入相同)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// 每声道采样数
    pub fn len(&self) -> usize {
        self.buffers.first().map_or(0, Vec::len)
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 全部缓冲区 (规范顺序)
    pub fn buffers(&self) -> &[Vec<f64>] {
        &self.buffers
    }

    /// 获取指定声道
    pub fn channel(&self, channel: Channel) -> Option<&[f64]> {
        let idx = self.layout.index_of(channel)?;
        self.buffers.get(idx).map(Vec::as_slice)
    }

    /// 前置声道对 (FL, FR)
    pub fn front_pair(&self) -> Option<(&[f64], &[f64])> {
        Some((
            self.channel(Channel::FrontLeft)?,
            self.channel(Channel::FrontRight)?,
        ))
    }

    /// 后置声道对 (BL, BR)
    pub fn back_pair(&self) -> Option<(&[f64], &[f64])> {
        Some((
            self.channel(Channel::BackLeft)?,
            self.channel(Channel::BackRight)?,
        ))
    }

    fn index(&self, channel: Channel) -> SqResult<usize> {
        self.layout
            .index_of(channel)
            .filter(|&idx| idx < self.buffers.len())
            .ok_or_else(|| SqError::Internal(format!("布局 {} 中没有声道 {}", self.layout, channel)))
    }

    /// 对一个分组做归一化, 返回使用的除数
    fn normalize_group(&mut self, group: NormalizeGroup) -> SqResult<f64> {
        match group {
            NormalizeGroup::Pair(a, b) => {
                let (ia, ib) = (self.index(a)?, self.index(b)?);
                let (first, second) = pair_mut(&mut self.buffers, ia, ib)
                    .ok_or_else(|| SqError::Internal(format!("声道对 {a}/{b} 索引冲突")))?;
                Ok(normalize_pair(first, second))
            }
            NormalizeGroup::Single(c) => {
                let idx = self.index(c)?;
                Ok(normalize_single(&mut self.buffers[idx]))
            }
        }
    }
}

/// 同时可变借用切片中的两个不同元素
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> Option<(&mut T, &mut T)> {
    if a == b || a >= items.len() || b >= items.len() {
        return None;
    }
    if a < b {
        let (lo, hi) = items.split_at_mut(b);
        Some((&mut lo[a], &mut hi[0]))
    } else {
        let (lo, hi) = items.split_at_mut(a);
        Some((&mut hi[0], &mut lo[b]))
    }
}

/// 矩阵解码器
///
/// 无内部可变状态, 同一实例可以反复调用 [`MatrixDecoder::decode`].
pub struct MatrixDecoder {
    config: DecodeConfig,
    observer: Arc<dyn DecodeObserver>,
}

impl MatrixDecoder {
    /// 使用默认的日志观察者创建解码器
    pub fn new(config: DecodeConfig) -> Self {
        Self {
            config,
            observer: Arc::new(LogObserver),
        }
    }

    /// 替换观察者
    pub fn with_observer(mut self, observer: Arc<dyn DecodeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// 当前配置
    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// 解码一段矩阵编码立体声
    ///
    /// - `lt`/`rt`: 左总/右总声道, 长度必须相同
    /// - `sample_rate`: 采样率 (Hz), 用于 LFE 截止频率换算
    ///
    /// 任何前置条件不满足时整个调用失败, 不返回部分结果.
    pub fn decode(&self, lt: &[f64], rt: &[f64], sample_rate: u32) -> SqResult<DecodedChannels> {
        if lt.len() != rt.len() {
            return Err(SqError::LengthMismatch {
                expected: lt.len(),
                actual: rt.len(),
            });
        }
        if sample_rate == 0 {
            return Err(SqError::InvalidArgument("采样率不能为 0".into()));
        }

        let cfg = &self.config;
        let n = lt.len();
        let layout = cfg.output_layout.channel_layout();
        self.observer.on_stage(DecodeStage::ReceivedInput, 2, n);

        let transform = SpectralTransform::new(n);
        let (lt_spec, rt_spec) = if cfg.parallel {
            rayon::join(|| transform.forward(lt), || transform.forward(rt))
        } else {
            (transform.forward(lt), transform.forward(rt))
        };
        let (lt_spec, rt_spec) = (lt_spec?, rt_spec?);
        let m = lt_spec.len();
        self.observer.on_stage(DecodeStage::Transformed, 2, m);

        let mut spectra = recombine(&lt_spec, &rt_spec, cfg.matrix_format, layout)?;
        self.observer
            .on_stage(DecodeStage::Recombined, spectra.spectra.len(), m);

        if cfg.output_layout.has_lfe() {
            let filter = LfeFilter::new(cfg.lfe_shaping, cfg.lfe_cutoff_hz, sample_rate, n)?;
            let lfe = spectra
                .get_mut(Channel::LowFrequency)
                .ok_or_else(|| SqError::Internal("5.1 布局缺少 LFE 频谱".into()))?;
            filter.apply(lfe);
            self.observer.on_stage(DecodeStage::Shaped, 1, m);
        }

        let buffers = self.synthesize(&transform, &spectra.spectra)?;
        self.observer
            .on_stage(DecodeStage::Synthesized, buffers.len(), n);

        let mut decoded = DecodedChannels {
            layout,
            sample_rate,
            buffers,
        };
        for group in groups_for(layout) {
            let divisor = decoded.normalize_group(group)?;
            self.observer.on_normalized(group, divisor);
        }
        self.observer
            .on_stage(DecodeStage::Normalized, decoded.buffers.len(), n);

        self.observer
            .on_stage(DecodeStage::Done, decoded.buffers.len(), n);
        Ok(decoded)
    }

    /// 逐声道逆变换, 每个任务独占自己的输出缓冲区
    fn synthesize(
        &self,
        transform: &SpectralTransform,
        spectra: &[Spectrum],
    ) -> SqResult<Vec<Vec<f64>>> {
        if self.config.parallel {
            spectra.par_iter().map(|s| transform.inverse(s)).collect()
        } else {
            spectra.iter().map(|s| transform.inverse(s)).collect()
        }
    }
}
