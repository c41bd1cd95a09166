//! 输出文件规划与写出.
//!
//! 三种输出模式:
//! - `SplitQuad`: 两个立体声文件 `output_front_<名>.wav` 和 `output_back_<名>.wav`
//! - `Quad`: 单个四声道文件 `output_quad_<名>.wav`, 顺序 FL FR BL BR
//! - `Surround51`: 单个六声道文件 `output_51_<名>.wav`, 顺序 FL FR C LFE BL BR

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use log::{info, warn};
use sqdec_core::{Channel, OutputLayout};
use sqdec_matrix::DecodedChannels;

/// 输出模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// 前后声道各写一个立体声文件
    #[default]
    SplitQuad,
    /// 单个 4.0 文件
    Quad,
    /// 单个 5.1 文件
    Surround51,
}

impl OutputMode {
    /// 由 `--audioformat` 的值确定输出模式
    ///
    /// 未指定或无法识别时为 `SplitQuad`, 后者额外告警.
    pub fn from_arg(arg: Option<&str>) -> Self {
        let Some(name) = arg else {
            return Self::SplitQuad;
        };
        match OutputLayout::from_name(name) {
            Some(OutputLayout::Quad) => Self::Quad,
            Some(OutputLayout::Surround51) => Self::Surround51,
            None => {
                warn!("未知输出格式 '{name}', 使用默认的前/后分文件四声道输出");
                Self::SplitQuad
            }
        }
    }

    /// 解码器需要产出的布局
    pub fn layout(self) -> OutputLayout {
        match self {
            Self::SplitQuad | Self::Quad => OutputLayout::Quad,
            Self::Surround51 => OutputLayout::Surround51,
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SplitQuad => write!(f, "4.0 (前/后分文件)"),
            Self::Quad => write!(f, "4.0"),
            Self::Surround51 => write!(f, "5.1"),
        }
    }
}

/// 一个待写出的文件
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub channels: Vec<Channel>,
}

/// 取输入路径的文件名并去掉扩展名
pub fn file_stem(input: &str) -> String {
    Path::new(input)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// 规划输出文件
pub fn plan(mode: OutputMode, input: &str, output_dir: &Path) -> Vec<OutputFile> {
    let stem = file_stem(input);
    let file = |prefix: &str, channels: Vec<Channel>| OutputFile {
        path: output_dir.join(format!("output_{prefix}_{stem}.wav")),
        channels,
    };
    match mode {
        // 后声道先写, 与历史输出顺序一致
        OutputMode::SplitQuad => vec![
            file("back", vec![Channel::BackLeft, Channel::BackRight]),
            file("front", vec![Channel::FrontLeft, Channel::FrontRight]),
        ],
        OutputMode::Quad => vec![file("quad", OutputLayout::Quad.channel_layout().order())],
        OutputMode::Surround51 => vec![file(
            "51",
            OutputLayout::Surround51.channel_layout().order(),
        )],
    }
}

/// 按规划写出所有文件, 返回写出的路径
pub fn write_all(decoded: &DecodedChannels, files: &[OutputFile]) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let mut planes = Vec::with_capacity(file.channels.len());
        for &channel in &file.channels {
            match decoded.channel(channel) {
                Some(buf) => planes.push(buf),
                None => bail!("解码结果中缺少声道 {channel}"),
            }
        }

        let path_str = file.path.to_string_lossy();
        info!("写出 {} 声道文件: {}", planes.len(), path_str);
        sqdec_wav::write_wav(&path_str, decoded.sample_rate(), &planes)
            .with_context(|| format!("写出 {path_str} 失败"))?;
        written.push(file.path.clone());
    }
    Ok(written)
}
