//! 媒体类型定义.

use std::fmt;

/// 媒体流类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// 视频流
    Video,
    /// 音频流
    Audio,
    /// 字幕流
    Subtitle,
    /// 数据流
    Data,
}

impl MediaType {
    /// 英文短名称 (用于 JSON 输出)
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Video => "视频",
            Self::Audio => "音频",
            Self::Subtitle => "字幕",
            Self::Data => "数据",
        };
        write!(f, "{name}")
    }
}
