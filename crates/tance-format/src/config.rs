//! 探测与解封装配置.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tance_core::{TanceError, TanceResult};

use crate::probe::{PROBE_BUF_MAX, PROBE_BUF_MIN};

/// 解封装器同步字搜索的默认预算 (字节)
pub const DEFAULT_PROBE_SIZE: u64 = 5_000_000;

/// 格式探测与打开选项
///
/// 可从 JSON 加载, 缺省字段使用默认值.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// 自适应探测读取的最大字节数, 0 表示默认值 (1 MiB)
    pub max_probe_size: u32,
    /// 容器数据在探测缓冲中的起始偏移
    pub probe_offset: u32,
    /// 打开流时搜索首个同步字的字节预算
    pub probe_size: u64,
    /// MIME 类型提示 (传输层未提供时使用)
    pub mime_type: Option<String>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_probe_size: 0,
            probe_offset: 0,
            probe_size: DEFAULT_PROBE_SIZE,
            mime_type: None,
        }
    }
}

impl FormatOptions {
    /// 从 JSON 字符串解析
    pub fn from_json_str(text: &str) -> TanceResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| TanceError::InvalidConfiguration(format!("配置解析失败: {e}")))
    }

    /// 从 JSON 文件加载
    pub fn from_json_file(path: impl AsRef<Path>) -> TanceResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// 校验配置并返回实际生效的最大探测大小
    pub fn validate(&self) -> TanceResult<u32> {
        let max_probe_size = effective_max_probe_size(self.max_probe_size)?;
        check_probe_offset(self.probe_offset, max_probe_size)?;
        if self.probe_size == 0 {
            return Err(TanceError::InvalidConfiguration(
                "probe_size 不能为 0".into(),
            ));
        }
        Ok(max_probe_size)
    }
}

/// 0 取默认值, 低于下限报错
pub(crate) fn effective_max_probe_size(max_probe_size: u32) -> TanceResult<u32> {
    if max_probe_size == 0 {
        return Ok(PROBE_BUF_MAX);
    }
    if max_probe_size < PROBE_BUF_MIN {
        return Err(TanceError::InvalidConfiguration(format!(
            "探测大小 {max_probe_size} 不能小于 {PROBE_BUF_MIN}"
        )));
    }
    Ok(max_probe_size)
}

/// 偏移必须严格小于最大探测大小
pub(crate) fn check_probe_offset(offset: u32, max_probe_size: u32) -> TanceResult<()> {
    if offset >= max_probe_size {
        return Err(TanceError::InvalidConfiguration(format!(
            "探测偏移 {offset} 必须小于最大探测大小 {max_probe_size}"
        )));
    }
    Ok(())
}
