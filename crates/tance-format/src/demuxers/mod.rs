//! 解封装器实现模块.

pub mod aac;

use crate::registry::FormatRegistry;

/// 注册所有内置解封装器
pub fn register_all_demuxers(registry: &FormatRegistry) {
    registry.register_input(&aac::AAC_DEMUXER);
}
