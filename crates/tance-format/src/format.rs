//! 格式描述符.
//!
//! 对标 FFmpeg 的 `AVInputFormat` / `AVOutputFormat` 静态部分: 名称、扩展名、
//! MIME 类型、能力标志以及探测函数. 描述符以 `'static` 形式注册, 注册后不可变.

use std::fmt;

use bitflags::bitflags;
use tance_core::{CodecId, TanceResult};

use crate::config::FormatOptions;
use crate::demuxer::Demuxer;
use crate::probe::{ProbeData, ProbeScore};

bitflags! {
    /// 格式能力标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FormatFlags: u32 {
        /// 不需要文件句柄 (如图片序列), 不参与已打开流的探测
        const NO_FILE = 1 << 0;
        /// 无论是否已打开文件都参与探测 (图片序列类兜底格式)
        const PROBE_ALWAYS = 1 << 1;
        /// 使用通用索引进行定位
        const GENERIC_INDEX = 1 << 2;
    }
}

/// 内容探测函数
pub type ReadProbeFn = fn(&ProbeData<'_>) -> ProbeScore;

/// 解封装器工厂函数
pub type DemuxerFactory = fn(&FormatOptions) -> TanceResult<Box<dyn Demuxer>>;

/// 输入格式描述符
pub struct InputFormat {
    /// 短名称, 可用逗号分隔多个别名
    pub name: &'static str,
    /// 描述性名称
    pub long_name: &'static str,
    /// 逗号分隔的扩展名列表 (不含 `.`)
    pub extensions: Option<&'static str>,
    /// 逗号分隔的 MIME 类型列表
    pub mime_type: Option<&'static str>,
    /// 能力标志
    pub flags: FormatFlags,
    /// 内容探测函数, `None` 表示只能靠扩展名识别
    pub read_probe: Option<ReadProbeFn>,
    /// 解封装器工厂
    pub create_demuxer: DemuxerFactory,
}

impl InputFormat {
    /// 名称是否匹配 (大小写不敏感, 支持别名列表)
    pub fn matches_name(&self, name: &str) -> bool {
        match_name(name, self.name)
    }

    /// 文件名扩展名是否匹配
    pub fn matches_extension(&self, filename: Option<&str>) -> bool {
        match (filename, self.extensions) {
            (Some(filename), Some(extensions)) => match_ext(filename, extensions),
            _ => false,
        }
    }

    /// MIME 类型是否匹配
    pub fn matches_mime(&self, mime_type: Option<&str>) -> bool {
        match (mime_type, self.mime_type) {
            (Some(mime), Some(list)) => match_name(mime, list),
            _ => false,
        }
    }
}

impl fmt::Debug for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFormat")
            .field("name", &self.name)
            .field("extensions", &self.extensions)
            .field("mime_type", &self.mime_type)
            .field("flags", &self.flags)
            .field("has_probe", &self.read_probe.is_some())
            .finish()
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 输出格式描述符
///
/// 只用于按名称/文件名/MIME 猜测输出格式及其默认编码, 不包含封装实现.
#[derive(Debug)]
pub struct OutputFormat {
    /// 短名称
    pub name: &'static str,
    /// 描述性名称
    pub long_name: &'static str,
    /// 逗号分隔的扩展名列表
    pub extensions: Option<&'static str>,
    /// MIME 类型
    pub mime_type: Option<&'static str>,
    /// 能力标志
    pub flags: FormatFlags,
    /// 默认音频编码
    pub audio_codec: CodecId,
    /// 默认视频编码
    pub video_codec: CodecId,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 判断 `name` 是否出现在逗号分隔的 `names` 列表中 (大小写不敏感)
pub fn match_name(name: &str, names: &str) -> bool {
    !name.is_empty()
        && names
            .split(',')
            .any(|candidate| candidate.trim().eq_ignore_ascii_case(name))
}

/// 判断文件名的扩展名 (最后一个 `.` 之后) 是否在 `extensions` 列表中
pub fn match_ext(filename: &str, extensions: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| match_name(ext, extensions))
}
