//! 按元数据猜测输出格式.
//!
//! 不读取任何数据, 只根据短名称、文件名与 MIME 类型给注册的输出格式打分.

use tance_core::{CodecId, MediaType};

use crate::format::{OutputFormat, match_ext, match_name};
use crate::registry::FormatRegistry;

/// 短名称匹配得分
const NAME_SCORE: u32 = 100;
/// MIME 类型完全一致得分
const MIME_SCORE: u32 = 10;
/// 扩展名匹配得分
const EXTENSION_SCORE: u32 = 5;

/// 图片扩展名到编码的映射
const IMAGE_CODECS: &[(&str, CodecId)] = &[
    ("png", CodecId::Png),
    ("jpeg", CodecId::Mjpeg),
    ("jpg", CodecId::Mjpeg),
];

/// 猜测输出格式
///
/// 名称匹配 +100, MIME 完全一致 +10, 扩展名匹配 +5, 严格更高者胜出 (并列时先注册者胜出).
/// 未给出短名称且文件名是带帧号模板的图片路径 (如 `img%03d.png`) 时返回 `image2`.
pub fn guess_output_format(
    registry: &FormatRegistry,
    short_name: Option<&str>,
    filename: Option<&str>,
    mime_type: Option<&str>,
) -> Option<&'static OutputFormat> {
    let image_sequence = short_name.is_none()
        && filename.is_some_and(|f| {
            has_frame_number_pattern(f) && guess_image_codec(f) != CodecId::None
        });
    if image_sequence {
        return registry.find_output("image2");
    }

    let mut best = None;
    let mut score_max = 0;
    for fmt in registry.outputs() {
        let mut score = 0;
        if short_name.is_some_and(|name| match_name(name, fmt.name)) {
            score += NAME_SCORE;
        }
        if mime_type.is_some() && mime_type == fmt.mime_type {
            score += MIME_SCORE;
        }
        if let (Some(filename), Some(exts)) = (filename, fmt.extensions) {
            if match_ext(filename, exts) {
                score += EXTENSION_SCORE;
            }
        }
        if score > score_max {
            score_max = score;
            best = Some(fmt);
        }
    }
    best
}

/// 输出格式对某种媒体类型的默认编码
///
/// `image2` 的视频编码按文件名扩展名决定.
pub fn guess_codec(fmt: &OutputFormat, filename: Option<&str>, media_type: MediaType) -> CodecId {
    match media_type {
        MediaType::Video => {
            let codec = if fmt.name == "image2" {
                filename.map_or(CodecId::None, guess_image_codec)
            } else {
                CodecId::None
            };
            if codec == CodecId::None {
                fmt.video_codec
            } else {
                codec
            }
        }
        MediaType::Audio => fmt.audio_codec,
        _ => CodecId::None,
    }
}

/// 根据图片扩展名猜测编码
pub fn guess_image_codec(filename: &str) -> CodecId {
    IMAGE_CODECS
        .iter()
        .find(|(ext, _)| match_ext(filename, ext))
        .map_or(CodecId::None, |(_, codec)| *codec)
}

/// 文件名是否恰好包含一个帧号模板 (`%d` 或 `%0Nd`), `%%` 视为普通字符
pub fn has_frame_number_pattern(filename: &str) -> bool {
    let mut found = 0;
    let mut chars = filename.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        while chars.next_if(char::is_ascii_digit).is_some() {}
        match chars.next() {
            Some('%') => {}
            Some('d') => found += 1,
            _ => return false,
        }
    }
    found == 1
}
