//! 元数据标签长度识别.
//!
//! 只识别 ID3v2 (文件头)、APEv2 与 ID3v1 (文件尾) 标签的位置和字节长度,
//! 以便探测和时长扫描跳过它们; 不解析标签内容.

use std::io::SeekFrom;

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use tance_core::TanceResult;

use crate::io::IoContext;

/// ID3v2 头部大小
pub const ID3V2_HEADER_SIZE: usize = 10;

/// ID3v2 默认标识
pub const ID3V2_DEFAULT_MAGIC: &[u8; 3] = b"ID3";

/// ID3v1 标签固定大小 (位于文件末尾)
pub const ID3V1_TAG_SIZE: u64 = 128;

/// APEv2 头部/尾部大小
pub const APE_TAG_FOOTER_SIZE: u64 = 32;

/// APEv2 标识
const APE_TAG_PREAMBLE: &[u8; 8] = b"APETAGEX";

/// APEv2 flags: 标签带有头部
const APE_TAG_FLAG_CONTAINS_HEADER: u32 = 1 << 31;

/// 判断 `buf` 是否以合法的 ID3v2 头部开始
///
/// 版本与修订号不能为 0xFF, 四个 syncsafe 长度字节的最高位必须为 0.
pub fn id3v2_match(buf: &[u8]) -> bool {
    buf.len() >= ID3V2_HEADER_SIZE
        && &buf[..3] == ID3V2_DEFAULT_MAGIC
        && buf[3] != 0xFF
        && buf[4] != 0xFF
        && buf[6..10].iter().all(|b| b & 0x80 == 0)
}

/// ID3v2 标签总长度 (含 10 字节头部, 以及可选的 10 字节尾部)
///
/// 调用方需先用 [`id3v2_match`] 确认.
pub fn id3v2_tag_len(buf: &[u8]) -> usize {
    let size = (usize::from(buf[6] & 0x7F) << 21)
        | (usize::from(buf[7] & 0x7F) << 14)
        | (usize::from(buf[8] & 0x7F) << 7)
        | usize::from(buf[9] & 0x7F);
    let mut len = size + ID3V2_HEADER_SIZE;
    // footer present
    if buf[5] & 0x10 != 0 {
        len += ID3V2_HEADER_SIZE;
    }
    len
}

/// 判断 128 字节块是否为 ID3v1 标签
pub fn id3v1_match(buf: &[u8]) -> bool {
    buf.len() as u64 >= ID3V1_TAG_SIZE && &buf[..3] == b"TAG"
}

/// 从 32 字节 APEv2 尾部计算标签总长度 (含尾部, 以及可选的头部)
pub fn ape_tag_len(footer: &[u8]) -> Option<u64> {
    if (footer.len() as u64) < APE_TAG_FOOTER_SIZE || &footer[..8] != APE_TAG_PREAMBLE {
        return None;
    }
    let size = u64::from(LittleEndian::read_u32(&footer[12..16]));
    let flags = LittleEndian::read_u32(&footer[20..24]);
    if size < APE_TAG_FOOTER_SIZE {
        return None;
    }
    let header = if flags & APE_TAG_FLAG_CONTAINS_HEADER != 0 {
        APE_TAG_FOOTER_SIZE
    } else {
        0
    };
    Some(size + header)
}

/// 计算去掉文件尾部标签 (APEv2, ID3v1) 后的音频数据结束位置
///
/// 需要可 seek 且大小已知的输入, 否则返回 `None`. 调用结束后读取位置恢复原状.
pub fn audio_data_end(io: &mut IoContext) -> TanceResult<Option<u64>> {
    let Some(size) = io.size() else {
        return Ok(None);
    };
    if !io.is_seekable() {
        return Ok(None);
    }
    let saved = io.position()?;
    let mut end = size;

    if end >= ID3V1_TAG_SIZE {
        io.seek(SeekFrom::Start(end - ID3V1_TAG_SIZE))?;
        let mut tail = [0u8; ID3V1_TAG_SIZE as usize];
        io.read_exact(&mut tail)?;
        if id3v1_match(&tail) {
            debug!("发现 ID3v1 标签, 位于 {}", end - ID3V1_TAG_SIZE);
            end -= ID3V1_TAG_SIZE;
        }
    }

    if end >= APE_TAG_FOOTER_SIZE {
        io.seek(SeekFrom::Start(end - APE_TAG_FOOTER_SIZE))?;
        let mut footer = [0u8; APE_TAG_FOOTER_SIZE as usize];
        io.read_exact(&mut footer)?;
        if let Some(len) = ape_tag_len(&footer) {
            if len <= end {
                debug!("发现 APEv2 标签, 长度 {len} 字节");
                end -= len;
            }
        }
    }

    io.seek(SeekFrom::Start(saved))?;
    Ok(Some(end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryBackend;

    fn id3v2_header(size: u32, flags: u8) -> Vec<u8> {
        let mut h = b"ID3".to_vec();
        h.extend_from_slice(&[4, 0, flags]);
        h.push(((size >> 21) & 0x7F) as u8);
        h.push(((size >> 14) & 0x7F) as u8);
        h.push(((size >> 7) & 0x7F) as u8);
        h.push((size & 0x7F) as u8);
        h
    }

    fn ape_footer(size: u32, with_header: bool) -> Vec<u8> {
        let mut f = APE_TAG_PREAMBLE.to_vec();
        f.extend_from_slice(&2000u32.to_le_bytes());
        f.extend_from_slice(&size.to_le_bytes());
        f.extend_from_slice(&1u32.to_le_bytes());
        let flags = if with_header {
            APE_TAG_FLAG_CONTAINS_HEADER
        } else {
            0
        };
        f.extend_from_slice(&flags.to_le_bytes());
        f.extend_from_slice(&[0u8; 8]);
        f
    }

    #[test]
    fn test_id3v2_tag_len() {
        let h = id3v2_header(128, 0);
        assert!(id3v2_match(&h));
        assert_eq!(id3v2_tag_len(&h), 138);

        let with_footer = id3v2_header(128, 0x10);
        assert_eq!(id3v2_tag_len(&with_footer), 148);
    }

    #[test]
    fn test_id3v2_reject_invalid_syncsafe() {
        let mut h = id3v2_header(0, 0);
        h[7] = 0x80;
        assert!(!id3v2_match(&h));
        assert!(!id3v2_match(b"ID3"));
        assert!(!id3v2_match(b"OggS\0\0\0\0\0\0"));
    }

    #[test]
    fn test_ape_tag_len() {
        assert_eq!(ape_tag_len(&ape_footer(100, false)), Some(100));
        assert_eq!(ape_tag_len(&ape_footer(100, true)), Some(132));
        assert_eq!(ape_tag_len(&[0u8; 32]), None);
    }

    #[test]
    fn test_audio_data_end_strips_trailing_tags() {
        let mut data = vec![0x55u8; 1000];
        // APE: 32 字节头部 + 68 字节条目 + 32 字节尾部, size 字段 = 100
        data.extend_from_slice(&[0u8; 32 + 68]);
        data.extend_from_slice(&ape_footer(100, true));
        let mut id3v1 = b"TAG".to_vec();
        id3v1.resize(128, 0);
        data.extend_from_slice(&id3v1);

        let mut io = IoContext::new(Box::new(MemoryBackend::from_data(data)));
        io.skip(10).unwrap();
        assert_eq!(audio_data_end(&mut io).unwrap(), Some(1000));
        assert_eq!(io.position().unwrap(), 10);
    }

    #[test]
    fn test_audio_data_end_without_tags() {
        let mut io = IoContext::new(Box::new(MemoryBackend::from_data(vec![0u8; 300])));
        assert_eq!(audio_data_end(&mut io).unwrap(), Some(300));
    }

    #[test]
    fn test_audio_data_end_unknown_size() {
        let mut io = IoContext::from_reader(std::io::Cursor::new(vec![0u8; 300]));
        assert_eq!(audio_data_end(&mut io).unwrap(), None);
    }
}
