//! 音频声道布局定义.
//!
//! 描述解码输出的声道集合与规范顺序. 5.1 采用 SMPTE 顺序: L, R, C, LFE, Ls, Rs.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// 声道位掩码, 每个位代表一个扬声器位置
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelMask: u32 {
        /// 前方左声道
        const FRONT_LEFT    = 1 << 0;
        /// 前方右声道
        const FRONT_RIGHT   = 1 << 1;
        /// 前方中央声道
        const FRONT_CENTER  = 1 << 2;
        /// 低频效果 (LFE / 重低音)
        const LOW_FREQUENCY = 1 << 3;
        /// 后方左声道
        const BACK_LEFT     = 1 << 4;
        /// 后方右声道
        const BACK_RIGHT    = 1 << 5;
    }
}

/// 单个输出声道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    FrontLeft,
    FrontRight,
    Center,
    LowFrequency,
    BackLeft,
    BackRight,
}

impl Channel {
    /// 按位掩码顺序排列的全部声道
    const ALL: [Channel; 6] = [
        Channel::FrontLeft,
        Channel::FrontRight,
        Channel::Center,
        Channel::LowFrequency,
        Channel::BackLeft,
        Channel::BackRight,
    ];

    /// 声道对应的掩码位
    pub fn mask(self) -> ChannelMask {
        match self {
            Self::FrontLeft => ChannelMask::FRONT_LEFT,
            Self::FrontRight => ChannelMask::FRONT_RIGHT,
            Self::Center => ChannelMask::FRONT_CENTER,
            Self::LowFrequency => ChannelMask::LOW_FREQUENCY,
            Self::BackLeft => ChannelMask::BACK_LEFT,
            Self::BackRight => ChannelMask::BACK_RIGHT,
        }
    }

    /// 简称 (用于日志)
    pub fn short_name(self) -> &'static str {
        match self {
            Self::FrontLeft => "FL",
            Self::FrontRight => "FR",
            Self::Center => "C",
            Self::LowFrequency => "LFE",
            Self::BackLeft => "BL",
            Self::BackRight => "BR",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// 声道布局
///
/// 声道数量和排列方式. 规范顺序即写入 WAV 时的交错顺序.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelLayout {
    /// 声道数量
    pub channels: u32,
    /// 声道位掩码
    pub mask: ChannelMask,
}

impl ChannelLayout {
    /// 立体声 (左右), 也用于前/后声道对的分离输出
    pub const STEREO: Self = Self {
        channels: 2,
        mask: ChannelMask::FRONT_LEFT.union(ChannelMask::FRONT_RIGHT),
    };

    /// 四声道: FL, FR, BL, BR
    pub const QUAD: Self = Self {
        channels: 4,
        mask: ChannelMask::FRONT_LEFT
            .union(ChannelMask::FRONT_RIGHT)
            .union(ChannelMask::BACK_LEFT)
            .union(ChannelMask::BACK_RIGHT),
    };

    /// 5.1 环绕声: L, R, C, LFE, Ls, Rs
    pub const SURROUND_5_1: Self = Self {
        channels: 6,
        mask: ChannelMask::FRONT_LEFT
            .union(ChannelMask::FRONT_RIGHT)
            .union(ChannelMask::FRONT_CENTER)
            .union(ChannelMask::LOW_FREQUENCY)
            .union(ChannelMask::BACK_LEFT)
            .union(ChannelMask::BACK_RIGHT),
    };

    /// 规范声道顺序
    ///
    /// 掩码位的定义顺序恰好就是 SMPTE 顺序, 按位过滤即可.
    pub fn order(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|ch| self.mask.contains(ch.mask()))
            .collect()
    }

    /// 声道在规范顺序中的位置
    pub fn index_of(&self, channel: Channel) -> Option<usize> {
        self.order().iter().position(|&c| c == channel)
    }

    /// 是否包含指定声道
    pub fn contains(&self, channel: Channel) -> bool {
        self.mask.contains(channel.mask())
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::STEREO => write!(f, "stereo"),
            Self::QUAD => write!(f, "quad"),
            Self::SURROUND_5_1 => write!(f, "5.1"),
            _ => write!(f, "{}ch", self.channels),
        }
    }
}
