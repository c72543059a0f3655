//! 数据包 (Packet).
//!
//! 解封装器每次 `read_packet` 产出的一个完整帧, 负载保持容器中的原始字节.

use bytes::Bytes;

use crate::rational::Rational;
use crate::timestamp::NOPTS_VALUE;

/// 数据包
///
/// 对于 ADTS 这类基本流, 一个 Packet 就是一个完整的 ADTS 帧 (含帧头).
#[derive(Debug, Clone)]
pub struct Packet {
    /// 帧数据
    pub data: Bytes,
    /// 显示时间戳 (PTS)
    pub pts: i64,
    /// 解码时间戳 (DTS)
    pub dts: i64,
    /// 数据包时长 (以 time_base 为单位)
    pub duration: i64,
    /// 时间基
    pub time_base: Rational,
    /// 所属流的索引
    pub stream_index: usize,
    /// 是否可独立解码
    pub is_keyframe: bool,
    /// 帧在输入中的字节偏移量 (-1 表示未知)
    pub pos: i64,
}

impl Packet {
    /// 从数据创建数据包, 其余字段为"未知"
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pts: NOPTS_VALUE,
            dts: NOPTS_VALUE,
            duration: 0,
            time_base: Rational::UNDEFINED,
            stream_index: 0,
            is_keyframe: false,
            pos: -1,
        }
    }

    /// 数据大小 (字节)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 是否为空包
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_from_data() {
        let pkt = Packet::from_data(vec![0xFF, 0xF1, 0x50]);
        assert_eq!(pkt.size(), 3);
        assert!(!pkt.is_empty());
        assert_eq!(pkt.pts, NOPTS_VALUE);
        assert_eq!(pkt.pos, -1);
        assert!(!pkt.time_base.is_valid());
    }
}
