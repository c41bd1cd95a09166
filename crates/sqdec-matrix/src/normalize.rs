//! 合成后的峰值归一化.
//!
//! 矩阵重组的系数会同相叠加, 合成后的采样可能超出 [-1, 1].
//! 前/后声道按对归一化 (同一个缩放因子, 保持声像平衡),
//! 中置与 LFE 各自单独归一化. 峰值不超过 1.0 的缓冲区保持原样.

use std::fmt;

use sqdec_core::{Channel, ChannelLayout};

/// 一个归一化分组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeGroup {
    /// 声道对, 共用一个缩放因子
    Pair(Channel, Channel),
    /// 单个声道
    Single(Channel),
}

impl NormalizeGroup {
    /// 分组包含的声道
    pub fn channels(&self) -> Vec<Channel> {
        match *self {
            Self::Pair(a, b) => vec![a, b],
            Self::Single(c) => vec![c],
        }
    }
}

impl fmt::Display for NormalizeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.channels().iter().map(|c| c.short_name()).collect();
        f.write_str(&names.join("/"))
    }
}

/// 布局对应的归一化分组: 前置对, 后置对, 以及 (5.1 时) 中置与 LFE
pub fn groups_for(layout: ChannelLayout) -> Vec<NormalizeGroup> {
    let mut groups = Vec::with_capacity(4);
    if layout.contains(Channel::FrontLeft) && layout.contains(Channel::FrontRight) {
        groups.push(NormalizeGroup::Pair(Channel::FrontLeft, Channel::FrontRight));
    }
    if layout.contains(Channel::BackLeft) && layout.contains(Channel::BackRight) {
        groups.push(NormalizeGroup::Pair(Channel::BackLeft, Channel::BackRight));
    }
    for single in [Channel::Center, Channel::LowFrequency] {
        if layout.contains(single) {
            groups.push(NormalizeGroup::Single(single));
        }
    }
    groups
}

/// 最大绝对值
pub fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0, |max, &s| max.max(s.abs()))
}

/// 对两路缓冲区做联合峰值归一化
///
/// 返回实际使用的除数 (未缩放时为 1.0).
pub fn normalize_pair(left: &mut [f64], right: &mut [f64]) -> f64 {
    let max = peak(left).max(peak(right));
    if max > 1.0 {
        for s in left.iter_mut().chain(right.iter_mut()) {
            *s /= max;
        }
        max
    } else {
        1.0
    }
}

/// 对单路缓冲区做峰值归一化
///
/// 返回实际使用的除数 (未缩放时为 1.0).
pub fn normalize_single(samples: &mut [f64]) -> f64 {
    let max = peak(samples);
    if max > 1.0 {
        for s in samples.iter_mut() {
            *s /= max;
        }
        max
    } else {
        1.0
    }
}
