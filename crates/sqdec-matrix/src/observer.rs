//! 解码过程观察者.
//!
//! 管线不直接依赖全局日志器, 而是把状态迁移通知给注入的观察者.
//! 默认的 [`LogObserver`] 转发到 `log` 门面.

use log::{debug, info};
use std::fmt;
use std::sync::Mutex;

use crate::normalize::NormalizeGroup;

/// 管线状态
///
/// `ReceivedInput -> Transformed -> Recombined -> (Shaped, 仅 5.1) -> Synthesized
/// -> Normalized -> Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeStage {
    ReceivedInput,
    Transformed,
    Recombined,
    Shaped,
    Synthesized,
    Normalized,
    Done,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReceivedInput => "received-input",
            Self::Transformed => "transformed",
            Self::Recombined => "recombined",
            Self::Shaped => "shaped",
            Self::Synthesized => "synthesized",
            Self::Normalized => "normalized",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// 解码观察者
pub trait DecodeObserver: Send + Sync {
    /// 进入新状态. `channels` 为当前阶段的声道数, `len` 为每声道长度.
    fn on_stage(&self, stage: DecodeStage, channels: usize, len: usize);

    /// 一个归一化分组完成, `divisor` 为实际使用的除数 (1.0 表示未缩放)
    fn on_normalized(&self, _group: NormalizeGroup, _divisor: f64) {}
}

/// 转发到 `log` 的观察者
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl DecodeObserver for LogObserver {
    fn on_stage(&self, stage: DecodeStage, channels: usize, len: usize) {
        match stage {
            DecodeStage::ReceivedInput | DecodeStage::Done => {
                info!("解码 {}: {} 声道 x {} 采样", stage, channels, len)
            }
            _ => debug!("解码 {}: {} 声道 x {}", stage, channels, len),
        }
    }

    fn on_normalized(&self, group: NormalizeGroup, divisor: f64) {
        if divisor > 1.0 {
            debug!("归一化 {}: 除以峰值 {:.6}", group, divisor);
        }
    }
}

/// 丢弃所有通知
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl DecodeObserver for NullObserver {
    fn on_stage(&self, _stage: DecodeStage, _channels: usize, _len: usize) {}
}

/// 记录所有通知 (测试与诊断用)
#[derive(Debug, Default)]
pub struct RecordingObserver {
    stages: Mutex<Vec<(DecodeStage, usize, usize)>>,
    normalized: Mutex<Vec<(NormalizeGroup, f64)>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录的状态序列
    pub fn stages(&self) -> Vec<DecodeStage> {
        self.stages
            .lock()
            .map(|s| s.iter().map(|(stage, _, _)| *stage).collect())
            .unwrap_or_default()
    }

    /// 已记录的状态及声道数/长度
    pub fn stage_details(&self) -> Vec<(DecodeStage, usize, usize)> {
        self.stages.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// 已记录的归一化结果
    pub fn normalized(&self) -> Vec<(NormalizeGroup, f64)> {
        self.normalized.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl DecodeObserver for RecordingObserver {
    fn on_stage(&self, stage: DecodeStage, channels: usize, len: usize) {
        if let Ok(mut stages) = self.stages.lock() {
            stages.push((stage, channels, len));
        }
    }

    fn on_normalized(&self, group: NormalizeGroup, divisor: f64) {
        if let Ok(mut normalized) = self.normalized.lock() {
            normalized.push((group, divisor));
        }
    }
}
