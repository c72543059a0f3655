//! 内置输出格式描述符.
//!
//! 只包含名称、扩展名、MIME 类型与默认编码, 供 [`guess_output_format`](crate::guess::guess_output_format)
//! 按名称/文件名猜测使用; 不提供封装实现.

use tance_core::CodecId;

use crate::format::{FormatFlags, OutputFormat};
use crate::registry::FormatRegistry;

/// ADTS AAC 裸流
pub static ADTS_MUXER: OutputFormat = OutputFormat {
    name: "adts",
    long_name: "ADTS AAC (Advanced Audio Coding)",
    extensions: Some("aac,adts"),
    mime_type: Some("audio/aac"),
    flags: FormatFlags::empty(),
    audio_codec: CodecId::Aac,
    video_codec: CodecId::None,
};

/// MPEG 音频 Layer III
pub static MP3_MUXER: OutputFormat = OutputFormat {
    name: "mp3",
    long_name: "MP3 (MPEG audio layer 3)",
    extensions: Some("mp3"),
    mime_type: Some("audio/mpeg"),
    flags: FormatFlags::empty(),
    audio_codec: CodecId::Mp3,
    video_codec: CodecId::None,
};

/// WAV (RIFF PCM)
pub static WAV_MUXER: OutputFormat = OutputFormat {
    name: "wav",
    long_name: "WAV / WAVE (Waveform Audio)",
    extensions: Some("wav"),
    mime_type: Some("audio/x-wav"),
    flags: FormatFlags::empty(),
    audio_codec: CodecId::PcmS16le,
    video_codec: CodecId::None,
};

/// FLAC 无损音频
pub static FLAC_MUXER: OutputFormat = OutputFormat {
    name: "flac",
    long_name: "raw FLAC",
    extensions: Some("flac"),
    mime_type: Some("audio/x-flac"),
    flags: FormatFlags::empty(),
    audio_codec: CodecId::Flac,
    video_codec: CodecId::None,
};

/// MP4 (ISO BMFF)
pub static MP4_MUXER: OutputFormat = OutputFormat {
    name: "mp4",
    long_name: "MP4 (MPEG-4 Part 14)",
    extensions: Some("mp4"),
    mime_type: Some("video/mp4"),
    flags: FormatFlags::empty(),
    audio_codec: CodecId::Aac,
    video_codec: CodecId::H264,
};

/// 图片序列
pub static IMAGE2_MUXER: OutputFormat = OutputFormat {
    name: "image2",
    long_name: "image2 sequence",
    extensions: Some("png,jpeg,jpg"),
    mime_type: None,
    flags: FormatFlags::NO_FILE,
    audio_codec: CodecId::None,
    video_codec: CodecId::Mjpeg,
};

/// 注册所有内置输出格式
pub fn register_all_outputs(registry: &FormatRegistry) {
    for fmt in [
        &ADTS_MUXER,
        &MP3_MUXER,
        &WAV_MUXER,
        &FLAC_MUXER,
        &MP4_MUXER,
        &IMAGE2_MUXER,
    ] {
        registry.register_output(fmt);
    }
}
