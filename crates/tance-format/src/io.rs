//! I/O 抽象层.
//!
//! 为探测器和解封装器提供统一的字节读取接口, 底层可以是文件、内存或任意
//! 不可 seek 的字节流 (管道、标准输入).
//!
//! 探测过程会预读一段前缀; 读完后通过 [`IoContext::rewind_with_probe_data`]
//! 把这些字节"还"给上下文, 保证后续顺序读取看到的字节序列与探测前完全一致.

use std::io::{self, Read, Seek};

use log::trace;
use tance_core::{TanceError, TanceResult};

/// I/O 后端 trait
///
/// 实现此 trait 以支持不同的字节来源.
pub trait IoBackend: Send {
    /// 读取数据到缓冲区, 返回 0 表示流结束
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// 定位 (seek)
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64>;
    /// 获取当前位置
    fn position(&mut self) -> io::Result<u64>;
    /// 获取总大小 (如果可知)
    fn size(&self) -> Option<u64>;
    /// 是否支持 seek
    fn is_seekable(&self) -> bool;
}

/// 默认缓冲区大小 (32 KB)
const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// I/O 上下文
///
/// 封装底层后端, 维护一个读缓冲区. 缓冲区中尚未消费的字节总是
/// 紧跟在调用方已读取位置之后.
pub struct IoContext {
    /// 内部 I/O 实现
    inner: Box<dyn IoBackend>,
    /// 读缓冲区
    buffer: Vec<u8>,
    /// 缓冲区中的有效数据长度
    buf_len: usize,
    /// 缓冲区当前读取位置
    buf_pos: usize,
    /// 传输层提供的 MIME 类型提示
    mime_type: Option<String>,
}

impl IoContext {
    /// 从 I/O 后端创建上下文
    pub fn new(backend: Box<dyn IoBackend>) -> Self {
        Self {
            inner: backend,
            buffer: vec![0u8; DEFAULT_BUFFER_SIZE],
            buf_len: 0,
            buf_pos: 0,
            mime_type: None,
        }
    }

    /// 从文件路径打开 (只读)
    pub fn open_read(path: &str) -> TanceResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self::new(Box::new(FileBackend::new(file))))
    }

    /// 从任意 `Read` 创建不可 seek 的上下文 (如标准输入)
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::new(Box::new(StreamBackend::new(reader)))
    }

    /// 附加 MIME 类型提示 (如 HTTP Content-Type)
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// 设置或清除 MIME 类型提示
    pub fn set_mime_type(&mut self, mime_type: Option<String>) {
        self.mime_type = mime_type;
    }

    /// MIME 类型提示
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    // ========================
    // 读取方法
    // ========================

    /// 尽量读满 `buf`, 返回实际读取的字节数
    ///
    /// 只有遇到流末尾时返回值才会小于 `buf.len()`, 返回 0 表示已无数据.
    pub fn read_partial(&mut self, buf: &mut [u8]) -> TanceResult<usize> {
        let mut filled = 0;
        self.read_into(buf, &mut filled)?;
        Ok(filled)
    }

    /// 从 `buf[*filled..]` 开始尽量读满 `buf`
    ///
    /// 每复制一段数据就推进 `*filled`; 返回错误时 `*filled` 仍准确反映
    /// 已写入 `buf` 的字节, 这些字节已从上下文中消费.
    pub fn read_into(&mut self, buf: &mut [u8], filled: &mut usize) -> TanceResult<()> {
        while *filled < buf.len() {
            let buffered = self.buf_len - self.buf_pos;
            if buffered > 0 {
                let to_copy = buffered.min(buf.len() - *filled);
                buf[*filled..*filled + to_copy]
                    .copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + to_copy]);
                self.buf_pos += to_copy;
                *filled += to_copy;
            } else if !self.fill_buffer()? {
                break;
            }
        }
        Ok(())
    }

    /// 读取指定字节数, 数据不足时返回 `Eof`
    pub fn read_exact(&mut self, buf: &mut [u8]) -> TanceResult<()> {
        if self.read_partial(buf)? < buf.len() {
            return Err(TanceError::Eof);
        }
        Ok(())
    }

    /// 读取 1 个字节
    pub fn read_u8(&mut self) -> TanceResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// 读取指定数量的字节
    pub fn read_bytes(&mut self, count: usize) -> TanceResult<Vec<u8>> {
        let mut buf = vec![0u8; count];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// 跳过指定字节数
    pub fn skip(&mut self, count: usize) -> TanceResult<()> {
        // 先尝试消耗缓冲区中的数据
        let buffered = self.buf_len - self.buf_pos;
        if count <= buffered {
            self.buf_pos += count;
            return Ok(());
        }

        let remaining = count - buffered;
        self.buf_pos = self.buf_len;

        if self.inner.is_seekable() {
            self.inner.seek(io::SeekFrom::Current(remaining as i64))?;
            return Ok(());
        }

        // 不可 seek: 逐块丢弃
        if self.buffer.len() < DEFAULT_BUFFER_SIZE {
            self.buffer.resize(DEFAULT_BUFFER_SIZE, 0);
        }
        let mut left = remaining;
        while left > 0 {
            let to_read = left.min(self.buffer.len());
            let read = self.inner.read(&mut self.buffer[..to_read])?;
            if read == 0 {
                self.buf_pos = 0;
                self.buf_len = 0;
                return Err(TanceError::Eof);
            }
            left -= read;
        }
        self.buf_pos = 0;
        self.buf_len = 0;
        Ok(())
    }

    /// 把刚刚读出的字节放回读缓冲区头部
    ///
    /// `data` 必须恰好是当前位置之前刚读出的那些字节, 之后的读取会先返回它们.
    /// 适用于任何后端, 包括不可 seek 的流.
    pub fn unread(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        if data.len() <= self.buf_pos {
            // 原位回退: 缓冲区中对应位置的字节就是刚读出的字节
            let start = self.buf_pos - data.len();
            self.buffer[start..self.buf_pos].copy_from_slice(data);
            self.buf_pos = start;
            return;
        }
        let mut merged = Vec::with_capacity(data.len() + self.buf_len - self.buf_pos);
        merged.extend_from_slice(data);
        merged.extend_from_slice(&self.buffer[self.buf_pos..self.buf_len]);
        self.buf_len = merged.len();
        self.buf_pos = 0;
        self.buffer = merged;
    }

    /// 探测结束后归还预读的数据
    ///
    /// 可 seek 的输入直接回到探测前位置 `start`; 不可 seek 的输入把 `probe_data`
    /// 放回缓冲区, 由后续读取透明重放.
    pub fn rewind_with_probe_data(&mut self, start: u64, probe_data: &[u8]) -> TanceResult<()> {
        if self.inner.is_seekable() {
            trace!("探测数据回退: seek 回 {start}");
            self.seek(io::SeekFrom::Start(start))?;
        } else {
            trace!("探测数据回退: 重放 {} 字节", probe_data.len());
            self.unread(probe_data);
        }
        Ok(())
    }

    /// 从后端重新填充缓冲区, 返回是否读到了数据
    fn fill_buffer(&mut self) -> TanceResult<bool> {
        if self.buffer.len() != DEFAULT_BUFFER_SIZE {
            self.buffer.resize(DEFAULT_BUFFER_SIZE, 0);
            self.buffer.shrink_to(DEFAULT_BUFFER_SIZE);
        }
        // 读取失败时缓冲区保持为空, 已消费的字节不会再次出现
        self.buf_pos = 0;
        self.buf_len = 0;
        let read = self.inner.read(&mut self.buffer)?;
        self.buf_len = read;
        Ok(read > 0)
    }

    // ========================
    // 定位方法
    // ========================

    /// 定位 (seek)
    ///
    /// 注意: seek 会清空读缓冲区 (包括通过 `unread` 放回的数据).
    pub fn seek(&mut self, pos: io::SeekFrom) -> TanceResult<u64> {
        let pos = match pos {
            // 相对定位需扣除缓冲区中尚未消费的字节
            io::SeekFrom::Current(offset) => {
                let buffered = (self.buf_len - self.buf_pos) as i64;
                io::SeekFrom::Current(offset - buffered)
            }
            other => other,
        };
        self.buf_pos = 0;
        self.buf_len = 0;
        Ok(self.inner.seek(pos)?)
    }

    /// 获取当前位置
    ///
    /// 考虑读缓冲区中尚未消耗的数据量.
    pub fn position(&mut self) -> TanceResult<u64> {
        let raw_pos = self.inner.position()?;
        let buffered = (self.buf_len - self.buf_pos) as u64;
        Ok(raw_pos.saturating_sub(buffered))
    }

    /// 是否支持随机访问
    pub fn is_seekable(&self) -> bool {
        self.inner.is_seekable()
    }

    /// 获取总大小
    pub fn size(&self) -> Option<u64> {
        self.inner.size()
    }
}

/// 文件 I/O 后端
struct FileBackend {
    file: std::fs::File,
    size: Option<u64>,
}

impl FileBackend {
    fn new(file: std::fs::File) -> Self {
        let size = file.metadata().ok().map(|m| m.len());
        Self { file, size }
    }
}

impl IoBackend for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    fn position(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    fn size(&self) -> Option<u64> {
        self.size
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

/// 内存缓冲区 I/O 后端
///
/// 用于测试和内存中处理, 支持 seek.
pub struct MemoryBackend {
    /// 数据缓冲区
    data: Vec<u8>,
    /// 当前位置
    pos: usize,
}

impl MemoryBackend {
    /// 从已有数据创建
    pub fn from_data(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// 获取内部数据的引用
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl IoBackend for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.data.len().saturating_sub(self.pos);
        let to_read = buf.len().min(available);
        if to_read == 0 {
            return Ok(0);
        }
        buf[..to_read].copy_from_slice(&self.data[self.pos..self.pos + to_read]);
        self.pos += to_read;
        Ok(to_read)
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            io::SeekFrom::Start(offset) => offset as i64,
            io::SeekFrom::End(offset) => self.data.len() as i64 + offset,
            io::SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek 位置不能为负",
            ));
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.pos as u64)
    }

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

/// 顺序流 I/O 后端
///
/// 包装任意 `Read`, 不支持 seek, 大小未知. 位置等于已读出的字节总数.
pub struct StreamBackend<R> {
    reader: R,
    pos: u64,
}

impl<R: Read + Send> StreamBackend<R> {
    /// 包装一个读取器
    pub fn new(reader: R) -> Self {
        Self { reader, pos: 0 }
    }
}

impl<R: Read + Send> IoBackend for StreamBackend<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.reader.read(buf) {
                Ok(n) => {
                    self.pos += n as u64;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn seek(&mut self, _pos: io::SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "顺序流不支持 seek",
        ))
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.pos)
    }

    fn size(&self) -> Option<u64> {
        None
    }

    fn is_seekable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_data(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    /// 每次最多返回 `chunk` 字节的读取器, 模拟管道
    struct ChunkedReader {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.chunk).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// 第 `fail_on` 次读取返回一次 `TimedOut` 的读取器
    struct FlakyReader {
        data: Vec<u8>,
        pos: usize,
        calls: usize,
        fail_on: usize,
    }

    impl Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls == self.fail_on {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "读取超时"));
            }
            let n = buf.len().min(1000).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_read_error_keeps_consumed_bytes_consumed() {
        let data = sample_data(5000);
        let mut io = IoContext::from_reader(FlakyReader {
            data: data.clone(),
            pos: 0,
            calls: 0,
            fail_on: 2,
        });
        assert_eq!(io.read_bytes(600).unwrap(), &data[..600]);

        let mut buf = vec![0u8; 1000];
        let mut filled = 0;
        let err = io.read_into(&mut buf, &mut filled).unwrap_err();
        assert!(matches!(err, TanceError::Io(ref e) if e.kind() == io::ErrorKind::TimedOut));
        // 出错前已复制的 400 字节计入 filled
        assert_eq!(filled, 400);
        assert_eq!(&buf[..400], &data[600..1000]);

        let mut rest = vec![0u8; 5000];
        let n = io.read_partial(&mut rest).unwrap();
        assert_eq!(n, 4000);
        assert_eq!(&rest[..n], &data[1000..]);
    }

    #[test]
    fn test_read_partial_short_at_eof() {
        let mut io = IoContext::new(Box::new(MemoryBackend::from_data(sample_data(10))));
        let mut buf = [0u8; 16];
        assert_eq!(io.read_partial(&mut buf).unwrap(), 10);
        assert_eq!(io.read_partial(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_partial_collects_chunks() {
        let data = sample_data(1000);
        let reader = ChunkedReader {
            data: data.clone(),
            pos: 0,
            chunk: 7,
        };
        let mut io = IoContext::from_reader(reader);
        let mut buf = vec![0u8; 1000];
        assert_eq!(io.read_partial(&mut buf).unwrap(), 1000);
        assert_eq!(buf, data);
    }

    #[test]
    fn test_read_exact_eof() {
        let mut io = IoContext::new(Box::new(MemoryBackend::from_data(vec![1, 2, 3])));
        let mut buf = [0u8; 4];
        assert!(matches!(io.read_exact(&mut buf), Err(TanceError::Eof)));
    }

    #[test]
    fn test_unread_in_place_and_merged() {
        let data = sample_data(100);
        let mut io = IoContext::from_reader(std::io::Cursor::new(data.clone()));

        let head = io.read_bytes(10).unwrap();
        io.unread(&head);
        assert_eq!(io.position().unwrap(), 0);

        // 大于已消费量的回退会与剩余缓冲合并
        let all = io.read_bytes(100).unwrap();
        io.unread(&all);
        let again = io.read_bytes(100).unwrap();
        assert_eq!(again, data);
    }

    #[test]
    fn test_rewind_with_probe_data_non_seekable() {
        let data = sample_data(5000);
        let reader = ChunkedReader {
            data: data.clone(),
            pos: 0,
            chunk: 333,
        };
        let mut io = IoContext::from_reader(reader);
        let start = io.position().unwrap();
        let probe = io.read_bytes(4096).unwrap();
        io.rewind_with_probe_data(start, &probe).unwrap();

        assert_eq!(io.position().unwrap(), 0);
        let mut out = vec![0u8; 6000];
        let n = io.read_partial(&mut out).unwrap();
        assert_eq!(n, 5000);
        assert_eq!(&out[..n], &data[..]);
    }

    #[test]
    fn test_rewind_with_probe_data_seekable() {
        let data = sample_data(3000);
        let mut io = IoContext::new(Box::new(MemoryBackend::from_data(data.clone())));
        io.skip(100).unwrap();
        let start = io.position().unwrap();
        let probe = io.read_bytes(2048).unwrap();
        io.rewind_with_probe_data(start, &probe).unwrap();
        assert_eq!(io.position().unwrap(), 100);
        assert_eq!(io.read_bytes(10).unwrap(), &data[100..110]);
    }

    #[test]
    fn test_skip_non_seekable() {
        let data = sample_data(100_000);
        let mut io = IoContext::from_reader(std::io::Cursor::new(data.clone()));
        io.skip(70_000).unwrap();
        assert_eq!(io.position().unwrap(), 70_000);
        assert_eq!(io.read_u8().unwrap(), data[70_000]);
        assert!(matches!(io.skip(50_000), Err(TanceError::Eof)));
    }

    #[test]
    fn test_seek_current_accounts_for_buffer() {
        let data = sample_data(200);
        let mut io = IoContext::new(Box::new(MemoryBackend::from_data(data.clone())));
        io.read_bytes(10).unwrap();
        io.seek(io::SeekFrom::Current(-2)).unwrap();
        assert_eq!(io.read_u8().unwrap(), data[8]);
    }

    #[test]
    fn test_stream_backend_not_seekable() {
        let mut io = IoContext::from_reader(std::io::Cursor::new(vec![0u8; 4]));
        assert!(!io.is_seekable());
        assert!(io.size().is_none());
        assert!(matches!(
            io.seek(io::SeekFrom::Start(0)),
            Err(TanceError::Io(_))
        ));
    }

    #[test]
    fn test_file_backend() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let data = sample_data(4096);
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        let path = file.path().to_string_lossy().to_string();
        let mut io = IoContext::open_read(&path).unwrap();
        assert!(io.is_seekable());
        assert_eq!(io.size(), Some(4096));
        io.skip(4000).unwrap();
        assert_eq!(io.read_bytes(96).unwrap(), &data[4000..]);
    }

    #[test]
    fn test_mime_type_hint() {
        let io = IoContext::new(Box::new(MemoryBackend::from_data(Vec::new())))
            .with_mime_type("audio/aac; charset=binary");
        assert_eq!(io.mime_type(), Some("audio/aac; charset=binary"));
    }
}
