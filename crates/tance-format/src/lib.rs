//! # tance-format
//!
//! tance 容器格式库: 格式描述符注册表、内容打分与自适应探测, 以及解封装框架.
//!
//! 本 crate 对标 FFmpeg libavformat 中的格式探测部分, 附带 ADTS AAC 裸流解封装器.

pub mod config;
pub mod demuxer;
pub mod demuxers;
pub mod format;
pub mod guess;
pub mod io;
pub mod outputs;
pub mod probe;
pub mod registry;
pub mod stream;
pub mod tag;

// 重导出常用类型
pub use config::FormatOptions;
pub use demuxer::Demuxer;
pub use format::{FormatFlags, InputFormat, OutputFormat};
pub use io::IoContext;
pub use probe::{ProbeData, ProbeResult, ProbeScore};
pub use registry::FormatRegistry;
pub use stream::Stream;

/// 注册所有内置容器格式
pub fn register_all(registry: &FormatRegistry) {
    demuxers::register_all_demuxers(registry);
    outputs::register_all_outputs(registry);
}
