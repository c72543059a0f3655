//! 编解码器标识符.
//!
//! 解封装只负责切帧, 不解释负载; 这里的标识仅用于描述流与输出格式的默认编码.

use std::fmt;

use crate::media_type::MediaType;

/// 编解码器标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    /// 未知 / 不适用
    None,
    /// AAC
    Aac,
    /// MPEG-1/2 Audio Layer III
    Mp3,
    /// FLAC
    Flac,
    /// PCM 有符号 16 位小端
    PcmS16le,
    /// H.264 / AVC
    H264,
    /// PNG 图片
    Png,
    /// JPEG 图片
    Mjpeg,
}

impl CodecId {
    /// 编解码器短名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Aac => "aac",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::PcmS16le => "pcm_s16le",
            Self::H264 => "h264",
            Self::Png => "png",
            Self::Mjpeg => "mjpeg",
        }
    }

    /// 编解码器所属的媒体类型
    pub const fn media_type(&self) -> Option<MediaType> {
        match self {
            Self::None => None,
            Self::Aac | Self::Mp3 | Self::Flac | Self::PcmS16le => Some(MediaType::Audio),
            Self::H264 | Self::Png | Self::Mjpeg => Some(MediaType::Video),
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
