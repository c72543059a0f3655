//! 统一错误类型定义.
//!
//! 所有 tance crate 共用的错误类型, 按"配置错误 / 无法识别 / 数据损坏 / 数据截断 / I/O"分类.

use thiserror::Error;

/// tance 统一错误类型
#[derive(Debug, Error)]
pub enum TanceError {
    /// 无效配置 (如探测大小低于下限, 偏移超出探测范围), 未发生任何 I/O
    #[error("无效配置: {0}")]
    InvalidConfiguration(String),

    /// 探测预算耗尽后仍无法确定容器格式
    #[error("无法识别格式: {0}")]
    IndeterminateFormat(String),

    /// 无效数据 (头部字段越界、帧长度小于头部长度等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 数据在帧头或帧体中途结束
    #[error("输入被截断: {0}")]
    TruncatedInput(String),

    /// I/O 错误 (干净的流末尾除外)
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 未找到指定的容器格式
    #[error("未找到容器格式: {0}")]
    FormatNotFound(String),
}

/// tance 统一 Result 类型
pub type TanceResult<T> = Result<T, TanceError>;
