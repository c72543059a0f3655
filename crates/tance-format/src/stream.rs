//! 流信息定义.
//!
//! 描述容器中的一条基本流.

use tance_core::{CodecId, MediaType, Rational, timestamp};

/// 流信息
#[derive(Debug, Clone)]
pub struct Stream {
    /// 流索引 (从 0 开始)
    pub index: usize,
    /// 媒体类型
    pub media_type: MediaType,
    /// 编解码器标识
    pub codec_id: CodecId,
    /// 时间基
    pub time_base: Rational,
    /// 流时长 (以 time_base 为单位, -1 表示未知)
    pub duration: i64,
    /// 起始时间 (以 time_base 为单位)
    pub start_time: i64,
    /// 总帧数 (0 表示未知)
    pub nb_frames: u64,
    /// 编解码器私有数据
    pub extra_data: Vec<u8>,
    /// 流特定参数
    pub params: StreamParams,
}

impl Stream {
    /// 时长 (秒), 未知时返回 None
    pub fn duration_seconds(&self) -> Option<f64> {
        if self.duration < 0 {
            return None;
        }
        timestamp::to_seconds(self.duration, self.time_base)
    }
}

/// 流特定参数
#[derive(Debug, Clone)]
pub enum StreamParams {
    /// 音频流参数
    Audio(AudioStreamParams),
    /// 其他
    Other,
}

/// 音频流参数
#[derive(Debug, Clone)]
pub struct AudioStreamParams {
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 声道数
    pub channels: u32,
    /// AAC profile (object type - 1)
    pub profile: u8,
    /// 每帧采样数 (AAC 为 1024)
    pub frame_size: u32,
    /// 码率 (bps, 0 表示未知)
    pub bit_rate: u64,
}
