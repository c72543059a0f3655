//! # tance-core
//!
//! tance 核心库, 提供错误类型、有理数时间基、时间戳换算以及数据包等基础定义.
//!
//! 格式探测与解封装 (`tance-format`) 均构建在本 crate 之上.

pub mod codec_id;
pub mod error;
pub mod media_type;
pub mod packet;
pub mod rational;
pub mod timestamp;

// 重导出常用类型
pub use codec_id::CodecId;
pub use error::{TanceError, TanceResult};
pub use media_type::MediaType;
pub use packet::Packet;
pub use rational::Rational;
