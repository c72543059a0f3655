//! 容器格式注册表.
//!
//! 管理所有已注册的输入/输出格式描述符, 支持按名称查找、内容探测以及打开输入.
//!
//! 描述符保存在只追加的单向链表中: 每个节点的 `next` 是一次性写入的
//! [`OnceLock`], 追加即对尾部链接做一次 compare-and-set. 读者无锁遍历,
//! 只会看到已完整初始化的节点; 描述符注册后不会被移除或修改.

use std::ptr;
use std::sync::{LazyLock, OnceLock};

use log::debug;
use tance_core::TanceResult;

use crate::config::FormatOptions;
use crate::demuxer::Demuxer;
use crate::format::{InputFormat, OutputFormat};
use crate::guess;
use crate::io::IoContext;
use crate::probe::{self, ProbeData, ProbeResult, ProbeScore};

struct Node<T: 'static> {
    item: &'static T,
    next: OnceLock<Box<Node<T>>>,
}

/// 只追加的无锁描述符链表
pub struct FormatList<T: 'static> {
    head: OnceLock<Box<Node<T>>>,
}

impl<T: 'static> FormatList<T> {
    /// 创建空链表
    pub const fn new() -> Self {
        Self {
            head: OnceLock::new(),
        }
    }

    /// 追加到尾部, 同一描述符 (按地址判断) 已在链表中时不做任何事并返回 false
    ///
    /// 多个线程同时追加同一描述符时, 恰好一个线程返回 true.
    pub fn push(&self, item: &'static T) -> bool {
        let mut pending = Box::new(Node {
            item,
            next: OnceLock::new(),
        });
        let mut link = &self.head;
        loop {
            if let Some(node) = link.get() {
                if ptr::eq(node.item, item) {
                    return false;
                }
                link = &node.next;
                continue;
            }
            match link.set(pending) {
                Ok(()) => return true,
                // 另一个线程抢先链接了节点, 从它继续向后找
                Err(lost) => pending = lost,
            }
        }
    }

    /// 按注册顺序遍历
    pub fn iter(&self) -> FormatIter<'_, T> {
        FormatIter {
            next: self.head.get().map(|node| &**node),
        }
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.head.get().is_none()
    }
}

impl<T: 'static> Default for FormatList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// 描述符迭代器
///
/// 惰性遍历, 可在其他线程注册的同时使用; 已结束的迭代器不会看到之后追加的节点.
pub struct FormatIter<'a, T: 'static> {
    next: Option<&'a Node<T>>,
}

impl<T: 'static> Clone for FormatIter<'_, T> {
    fn clone(&self) -> Self {
        Self { next: self.next }
    }
}

impl<T: 'static> Iterator for FormatIter<'_, T> {
    type Item = &'static T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next.get().map(|next| &**next);
        Some(node.item)
    }
}

/// 容器格式注册表
pub struct FormatRegistry {
    /// 输入格式 (解封装)
    inputs: FormatList<InputFormat>,
    /// 输出格式 (仅用于猜测)
    outputs: FormatList<OutputFormat>,
}

impl FormatRegistry {
    /// 创建空的注册表
    pub const fn new() -> Self {
        Self {
            inputs: FormatList::new(),
            outputs: FormatList::new(),
        }
    }

    /// 创建并注册所有内置格式
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        crate::register_all(&registry);
        registry
    }

    /// 注册一个输入格式, 重复注册返回 false
    pub fn register_input(&self, fmt: &'static InputFormat) -> bool {
        let added = self.inputs.push(fmt);
        if added {
            debug!("注册输入格式: {}", fmt.name);
        }
        added
    }

    /// 注册一个输出格式, 重复注册返回 false
    pub fn register_output(&self, fmt: &'static OutputFormat) -> bool {
        let added = self.outputs.push(fmt);
        if added {
            debug!("注册输出格式: {}", fmt.name);
        }
        added
    }

    /// 按注册顺序遍历输入格式
    pub fn inputs(&self) -> FormatIter<'_, InputFormat> {
        self.inputs.iter()
    }

    /// 按注册顺序遍历输出格式
    pub fn outputs(&self) -> FormatIter<'_, OutputFormat> {
        self.outputs.iter()
    }

    /// 按短名称查找输入格式 (大小写不敏感)
    pub fn find_input(&self, name: &str) -> Option<&'static InputFormat> {
        self.inputs().find(|fmt| fmt.matches_name(name))
    }

    /// 按短名称查找输出格式
    pub fn find_output(&self, name: &str) -> Option<&'static OutputFormat> {
        self.outputs()
            .find(|fmt| crate::format::match_name(name, fmt.name))
    }

    /// 创建指定格式的解封装器实例
    pub fn create_demuxer(
        &self,
        fmt: &InputFormat,
        options: &FormatOptions,
    ) -> TanceResult<Box<dyn Demuxer>> {
        (fmt.create_demuxer)(options)
    }

    /// 对一段内存数据打分, 返回唯一最高分格式和分数
    pub fn probe(
        &self,
        data: &[u8],
        filename: Option<&str>,
    ) -> (Option<&'static InputFormat>, ProbeScore) {
        let pd = ProbeData::new(data).with_filename(filename);
        probe::probe_input_format3(self, &pd, true)
    }

    /// 自适应探测输入格式 (不打开解封装器)
    ///
    /// 探测结束后 `io` 的读取位置与探测前一致.
    pub fn probe_input(
        &self,
        io: &mut IoContext,
        filename: Option<&str>,
        options: &FormatOptions,
    ) -> TanceResult<ProbeResult> {
        if io.mime_type().is_none() && options.mime_type.is_some() {
            io.set_mime_type(options.mime_type.clone());
        }
        probe::probe_input_buffer(
            self,
            io,
            filename,
            options.probe_offset,
            options.max_probe_size,
        )
    }

    /// 自动探测格式, 创建对应的解封装器并解析头部
    pub fn open_input(
        &self,
        io: &mut IoContext,
        filename: Option<&str>,
        options: &FormatOptions,
    ) -> TanceResult<(ProbeResult, Box<dyn Demuxer>)> {
        let result = self.probe_input(io, filename, options)?;
        let demuxer = self.open_input_as(result.format, io, options)?;
        Ok((result, demuxer))
    }

    /// 以指定格式打开输入, 跳过探测
    pub fn open_input_as(
        &self,
        fmt: &InputFormat,
        io: &mut IoContext,
        options: &FormatOptions,
    ) -> TanceResult<Box<dyn Demuxer>> {
        let mut demuxer = self.create_demuxer(fmt, options)?;
        demuxer.open(io)?;
        Ok(demuxer)
    }

    /// 按短名称、文件名与 MIME 类型猜测输出格式
    pub fn guess_output_format(
        &self,
        short_name: Option<&str>,
        filename: Option<&str>,
        mime_type: Option<&str>,
    ) -> Option<&'static OutputFormat> {
        guess::guess_output_format(self, short_name, filename, mime_type)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_REGISTRY: LazyLock<FormatRegistry> = LazyLock::new(FormatRegistry::with_builtin);

/// 进程级注册表 (首次访问时注册所有内置格式)
pub fn global() -> &'static FormatRegistry {
    &GLOBAL_REGISTRY
}

/// 向进程级注册表注册输入格式
pub fn register_input_format(fmt: &'static InputFormat) -> bool {
    global().register_input(fmt)
}

/// 向进程级注册表注册输出格式
pub fn register_output_format(fmt: &'static OutputFormat) -> bool {
    global().register_output(fmt)
}

/// 遍历进程级注册表中的输入格式
pub fn iterate_input_formats() -> FormatIter<'static, InputFormat> {
    global().inputs()
}

/// 遍历进程级注册表中的输出格式
pub fn iterate_output_formats() -> FormatIter<'static, OutputFormat> {
    global().outputs()
}

/// 在进程级注册表中按名称查找输入格式
pub fn find_input_format_by_name(name: &str) -> Option<&'static InputFormat> {
    global().find_input(name)
}
