//! 矩阵编码格式与输出布局.
//!
//! 名称解析是宽松的: 无法识别的字符串回退到默认值 (SQ / 四声道),
//! 并记录一条警告, 而不是报错.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::channel_layout::ChannelLayout;

/// 矩阵编码格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixFormat {
    /// CBS SQ (Stereo Quadraphonic)
    #[default]
    Sq,
    /// Sansui QS (Regular Matrix)
    Qs,
}

impl MatrixFormat {
    /// 严格解析格式名 (不区分大小写)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "SQ" => Some(Self::Sq),
            "QS" => Some(Self::Qs),
            _ => None,
        }
    }

    /// 宽松解析: 无法识别时回退到 SQ
    pub fn from_name_lossy(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            warn!("未知矩阵格式 '{}', 使用默认 SQ", name);
            Self::default()
        })
    }

    /// 格式名
    pub fn name(self) -> &'static str {
        match self {
            Self::Sq => "SQ",
            Self::Qs => "QS",
        }
    }
}

impl fmt::Display for MatrixFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 解码输出布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLayout {
    /// 四声道: FL, FR, BL, BR
    #[default]
    Quad,
    /// 5.1: FL, FR, C, LFE, BL, BR
    Surround51,
}

impl OutputLayout {
    /// 严格解析布局名
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "4.0" | "quad" | "4" => Some(Self::Quad),
            "5.1" | "surround51" | "6" => Some(Self::Surround51),
            _ => None,
        }
    }

    /// 宽松解析: 无法识别时回退到四声道
    pub fn from_name_lossy(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            warn!("未知输出布局 '{}', 使用默认四声道", name);
            Self::default()
        })
    }

    /// 对应的声道布局
    pub fn channel_layout(self) -> ChannelLayout {
        match self {
            Self::Quad => ChannelLayout::QUAD,
            Self::Surround51 => ChannelLayout::SURROUND_5_1,
        }
    }

    /// 是否需要推导中置与 LFE 声道
    pub fn has_lfe(self) -> bool {
        matches!(self, Self::Surround51)
    }
}

impl fmt::Display for OutputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quad => write!(f, "4.0"),
            Self::Surround51 => write!(f, "5.1"),
        }
    }
}
