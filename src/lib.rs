//! # tance (探测)
//!
//! 纯 Rust 实现的容器格式探测与基本流解封装库, 对标 FFmpeg libavformat 的探测部分.
//!
//! - **格式注册表**: 进程级、只追加、无锁遍历的格式描述符目录
//! - **探测**: 对有限长度的前缀打分, 自适应扩大读取窗口, 读过的字节完整归还
//! - **解封装**: ADTS AAC 裸流, 逐帧输出数据包
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use tance::format::{FormatOptions, IoContext};
//!
//! let registry = tance::default_format_registry();
//! let mut io = IoContext::open_read("music.aac").unwrap();
//! let (result, mut demuxer) = registry
//!     .open_input(&mut io, Some("music.aac"), &FormatOptions::default())
//!     .unwrap();
//! println!("格式: {} (置信度 {})", result.format.name, result.score);
//! while let Ok(pkt) = demuxer.read_packet(&mut io) {
//!     println!("pts={} size={}", pkt.pts, pkt.size());
//! }
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `tance-core` | 错误类型、时间基、数据包等基础定义 |
//! | `tance-format` | 注册表、探测与解封装 |

/// 核心类型与工具
pub use tance_core as core;

/// 容器格式探测与解封装
pub use tance_format as format;

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置容器格式的注册表
///
/// 与进程级注册表 [`tance_format::registry::global`] 互相独立.
pub fn default_format_registry() -> tance_format::FormatRegistry {
    tance_format::FormatRegistry::with_builtin()
}
