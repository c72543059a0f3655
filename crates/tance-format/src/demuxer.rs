//! 解封装器 (Demuxer) trait 定义.
//!
//! 打开已探测的输入, 解析头部后逐个读取数据包.

use tance_core::{Packet, TanceResult};

use crate::io::IoContext;
use crate::stream::Stream;

/// 解封装器 trait
///
/// 使用流程:
/// 1. 调用 `open()` 解析头部
/// 2. 调用 `streams()` 获取流信息
/// 3. 循环调用 `read_packet()` 直到返回 [`TanceError::Eof`](tance_core::TanceError::Eof)
pub trait Demuxer: Send {
    /// 获取格式名称 (与 [`InputFormat::name`](crate::InputFormat::name) 一致)
    fn name(&self) -> &str;

    /// 打开容器并解析头部信息
    fn open(&mut self, io: &mut IoContext) -> TanceResult<()>;

    /// 获取所有流信息
    fn streams(&self) -> &[Stream];

    /// 读取下一个数据包
    ///
    /// # 返回
    /// - `Ok(packet)`: 成功读取一个数据包
    /// - `Err(TanceError::Eof)`: 已到达数据末尾
    fn read_packet(&mut self, io: &mut IoContext) -> TanceResult<Packet>;

    /// 获取容器时长 (秒), None 表示未知
    fn duration(&self) -> Option<f64>;
}
