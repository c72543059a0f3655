//! AAC ADTS 裸流解封装器.
//!
//! ADTS (Audio Data Transport Stream) 是 AAC 音频最常见的裸流封装格式.
//! 每个 ADTS 帧由头部 + AAC 帧数据组成, 帧与帧首尾相连.
//!
//! # ADTS 帧头结构 (7 或 9 字节)
//! ```text
//!   sync word (12 bits = 0xFFF)
//!   ID (1 bit): 0=MPEG-4, 1=MPEG-2
//!   layer (2 bits): 必须为 0
//!   protection_absent (1 bit): 1=无 CRC, 0=有 CRC
//!   profile (2 bits): 0=Main, 1=LC, 2=SSR, 3=LTP
//!   sampling_frequency_index (4 bits)
//!   private_bit (1 bit)
//!   channel_configuration (3 bits)
//!   original/copy, home, copyright id bit/start (4 bits)
//!   frame_length (13 bits): 含头部的完整帧大小
//!   adts_buffer_fullness (11 bits)
//!   number_of_raw_data_blocks (2 bits)
//!   [CRC (16 bits)] 仅当 protection_absent=0
//! ```

use std::io::SeekFrom;

use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use log::{debug, warn};
use tance_core::{
    CodecId, MediaType, Packet, Rational, TanceError, TanceResult, timestamp,
};

use crate::config::FormatOptions;
use crate::demuxer::Demuxer;
use crate::format::{FormatFlags, InputFormat};
use crate::io::IoContext;
use crate::probe::{ProbeData, ProbeScore, SCORE_EXTENSION};
use crate::stream::{AudioStreamParams, Stream, StreamParams};
use crate::tag;

/// 不含 CRC 的 ADTS 头部大小
pub const ADTS_HEADER_SIZE: usize = 7;

/// 含 CRC 的 ADTS 头部大小
const ADTS_CRC_HEADER_SIZE: usize = 9;

/// 每个 ADTS 帧的采样数
pub const SAMPLES_PER_FRAME: u32 = 1024;

/// AAC 采样率索引表 (ISO 14496-3)
const AAC_SAMPLE_RATES: [u32; 12] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000,
];

/// 帧同步字 + layer 掩码
const SYNC_MASK: u16 = 0xFFF6;
const SYNC_WORD: u16 = 0xFFF0;

/// raw ADTS AAC 输入格式
pub static AAC_DEMUXER: InputFormat = InputFormat {
    name: "aac",
    long_name: "raw ADTS AAC (Advanced Audio Coding)",
    extensions: Some("aac"),
    mime_type: Some("audio/aac,audio/aacp,audio/x-aac"),
    flags: FormatFlags::GENERIC_INDEX,
    read_probe: Some(adts_aac_probe),
    create_demuxer: AacDemuxer::create,
};

/// 帧长度信息 (只依赖同步字与长度字段)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameSize {
    /// 帧总大小 (含头部)
    frame_length: usize,
    /// 头部大小 (7 或 9 字节)
    header_size: usize,
}

impl FrameSize {
    /// 从至少 7 字节的数据中读取, 同步字或 layer 不符时返回 None
    fn read(data: &[u8]) -> Option<Self> {
        if data.len() < ADTS_HEADER_SIZE || BigEndian::read_u16(data) & SYNC_MASK != SYNC_WORD {
            return None;
        }
        let header_size = if data[1] & 0x01 != 0 {
            ADTS_HEADER_SIZE
        } else {
            ADTS_CRC_HEADER_SIZE
        };
        let frame_length = (usize::from(data[3] & 0x03) << 11)
            | (usize::from(data[4]) << 3)
            | (usize::from(data[5]) >> 5);
        Some(Self {
            frame_length,
            header_size,
        })
    }

    fn validate(self, pos: u64) -> TanceResult<Self> {
        if self.frame_length < self.header_size {
            return Err(TanceError::InvalidData(format!(
                "AAC: 偏移 {pos} 处帧长度 {} 小于头部长度 {}",
                self.frame_length, self.header_size
            )));
        }
        Ok(self)
    }
}

/// ADTS 帧头部信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdtsHeader {
    /// MPEG 版本 (0=MPEG-4, 1=MPEG-2)
    pub mpeg_id: u8,
    /// AAC Profile (0=Main, 1=LC, 2=SSR, 3=LTP)
    pub profile: u8,
    /// 采样率索引
    pub sampling_index: u8,
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 声道配置
    pub channel_config: u8,
    /// 声道数 (配置 7 对应 8 声道)
    pub channels: u32,
    /// 是否有 CRC 校验
    pub has_crc: bool,
    /// 帧总大小 (含头部)
    pub frame_length: usize,
    /// 头部大小 (7 或 9 字节)
    pub header_size: usize,
}

impl AdtsHeader {
    /// 构造 2 字节 AudioSpecificConfig (ISO 14496-3)
    ///
    /// audioObjectType (5 bits) + samplingFrequencyIndex (4 bits)
    /// + channelConfiguration (4 bits) + padding (3 bits)
    pub fn audio_specific_config(&self) -> [u8; 2] {
        let aot = self.profile + 1;
        let sfi = self.sampling_index;
        let cc = self.channel_config;
        [(aot << 3) | (sfi >> 1), ((sfi & 1) << 7) | (cc << 3)]
    }
}

/// 解析 ADTS 帧头部
pub fn parse_adts_header(data: &[u8]) -> TanceResult<AdtsHeader> {
    if data.len() < ADTS_HEADER_SIZE {
        return Err(TanceError::TruncatedInput(format!(
            "AAC: ADTS 头部需要 {ADTS_HEADER_SIZE} 字节, 实际 {}",
            data.len()
        )));
    }
    let size = FrameSize::read(data)
        .ok_or_else(|| TanceError::InvalidData("AAC: 无效的 ADTS 同步字".into()))?
        .validate(0)?;

    let sampling_index = (data[2] >> 2) & 0x0F;
    let sample_rate = *AAC_SAMPLE_RATES
        .get(usize::from(sampling_index))
        .ok_or_else(|| {
            TanceError::InvalidData(format!("AAC: 不支持的采样率索引 {sampling_index}"))
        })?;

    let channel_config = ((data[2] & 0x01) << 2) | (data[3] >> 6);
    let channels = match channel_config {
        0 => {
            return Err(TanceError::InvalidData(
                "AAC: 声道配置为 0 (PCE) 不受支持".into(),
            ));
        }
        7 => 8,
        n => u32::from(n),
    };

    Ok(AdtsHeader {
        mpeg_id: (data[1] >> 3) & 0x01,
        profile: (data[2] >> 6) & 0x03,
        sampling_index,
        sample_rate,
        channel_config,
        channels,
        has_crc: size.header_size == ADTS_CRC_HEADER_SIZE,
        frame_length: size.frame_length,
        header_size: size.header_size,
    })
}

/// ADTS 内容探测
///
/// 统计首尾相连的 ADTS 帧数: 从样本开头起连续的帧数, 以及任意位置起最长的连续帧数.
/// 不从开头起、且以非帧头结束的连续帧视为误判, 计数作废.
pub fn adts_aac_probe(pd: &ProbeData<'_>) -> ProbeScore {
    let buf = pd.buf;
    if buf.len() <= ADTS_HEADER_SIZE {
        return 0;
    }
    let end = buf.len() - ADTS_HEADER_SIZE;

    let mut max_frames = 0u32;
    let mut first_frames = 0u32;
    let mut start = 0usize;
    while start < end {
        let mut pos = start;
        let mut frames = 0u32;
        while pos < end {
            if BigEndian::read_u16(&buf[pos..]) & SYNC_MASK != SYNC_WORD {
                if start != 0 {
                    frames = 0;
                }
                break;
            }
            let fsize = ((BigEndian::read_u32(&buf[pos + 3..]) >> 13) & 0x1FFF) as usize;
            if fsize < ADTS_HEADER_SIZE {
                break;
            }
            pos += fsize.min(end - pos);
            frames += 1;
        }
        max_frames = max_frames.max(frames);
        if start == 0 {
            first_frames = frames;
        }
        start = pos + 1;
    }

    if first_frames >= 3 {
        SCORE_EXTENSION + 1
    } else if max_frames > 100 {
        SCORE_EXTENSION
    } else if max_frames >= 3 {
        SCORE_EXTENSION / 2
    } else if first_frames >= 1 {
        1
    } else {
        0
    }
}

/// AAC ADTS 解封装器
pub struct AacDemuxer {
    /// 解封装选项
    options: FormatOptions,
    /// 流信息
    streams: Vec<Stream>,
    /// 下一帧的 PTS (采样数)
    next_pts: i64,
    /// 采样率
    sample_rate: u32,
    /// 音频数据末尾 (不含尾部标签), 仅可 seek 的输入已知
    data_end: Option<u64>,
}

impl AacDemuxer {
    /// 创建 AAC ADTS 解封装器实例 (工厂函数)
    pub fn create(options: &FormatOptions) -> TanceResult<Box<dyn Demuxer>> {
        Ok(Box::new(Self {
            options: options.clone(),
            streams: Vec::new(),
            next_pts: 0,
            sample_rate: 0,
            data_end: None,
        }))
    }

    /// 跳过开头的 ID3v2 标签 (只按长度跳过)
    fn skip_id3v2(&self, io: &mut IoContext) -> TanceResult<()> {
        let mut header = [0u8; tag::ID3V2_HEADER_SIZE];
        let n = io.read_partial(&mut header)?;
        if !tag::id3v2_match(&header[..n]) {
            io.unread(&header[..n]);
            return Ok(());
        }
        let len = tag::id3v2_tag_len(&header);
        debug!("AAC: 跳过 ID3v2 标签, 长度 {len} 字节");
        io.skip(len - tag::ID3V2_HEADER_SIZE).map_err(|e| match e {
            TanceError::Eof => TanceError::TruncatedInput("AAC: ID3v2 标签之后没有数据".into()),
            e => e,
        })
    }

    /// 查找第一个 ADTS 同步字, 返回其位置, 读取位置停在同步字上
    fn find_first_frame(&self, io: &mut IoContext) -> TanceResult<u64> {
        let budget = self.options.probe_size;
        let mut state = 0u16;
        let mut scanned = 0u64;
        let mut eof = false;

        while scanned < budget {
            let byte = match io.read_u8() {
                Ok(b) => b,
                Err(TanceError::Eof) => {
                    eof = true;
                    break;
                }
                Err(e) => return Err(e),
            };
            scanned += 1;
            state = (state << 8) | u16::from(byte);
            if scanned >= 2 && state >> 4 == 0xFFF {
                io.unread(&state.to_be_bytes());
                let pos = io.position()?;
                debug!("AAC: 第一个 ADTS 帧位于 {pos}");
                return Ok(pos);
            }
        }

        if eof && scanned < ADTS_HEADER_SIZE as u64 {
            return Err(TanceError::TruncatedInput(format!(
                "AAC: 输入只有 {scanned} 字节, 不足一个 ADTS 头部"
            )));
        }
        Err(TanceError::InvalidData(format!(
            "AAC: {scanned} 字节内未找到 ADTS 同步字"
        )))
    }

    /// 从第一帧线性扫描到音频数据末尾, 返回 (帧数, 音频数据末尾)
    ///
    /// 需要可 seek 且大小已知的输入. 结束后读取位置回到 `first_frame`.
    fn count_frames(io: &mut IoContext, first_frame: u64) -> TanceResult<Option<(u64, u64)>> {
        let Some(end) = tag::audio_data_end(io)? else {
            return Ok(None);
        };
        io.seek(SeekFrom::Start(first_frame))?;

        let mut offset = first_frame;
        let mut frames = 0u64;
        let mut header = [0u8; ADTS_HEADER_SIZE];
        while offset < end {
            if end - offset < ADTS_HEADER_SIZE as u64 {
                warn!("AAC: 偏移 {offset} 处帧头被截断, 时长按 {frames} 帧计算");
                break;
            }
            io.read_exact(&mut header)?;
            let Some(size) = FrameSize::read(&header) else {
                warn!("AAC: 偏移 {offset} 处失去同步, 时长按 {frames} 帧计算");
                break;
            };
            let size = size.validate(offset)?;
            frames += 1;
            offset += size.frame_length as u64;
            if offset < end {
                io.skip(size.frame_length - ADTS_HEADER_SIZE)?;
            }
        }

        io.seek(SeekFrom::Start(first_frame))?;
        Ok(Some((frames, end)))
    }
}

impl Demuxer for AacDemuxer {
    fn name(&self) -> &str {
        "aac"
    }

    fn open(&mut self, io: &mut IoContext) -> TanceResult<()> {
        self.skip_id3v2(io)?;
        let first_frame = self.find_first_frame(io)?;

        let mut buf = [0u8; ADTS_HEADER_SIZE];
        let n = io.read_partial(&mut buf)?;
        io.unread(&buf[..n]);
        let header = parse_adts_header(&buf[..n])?;

        let sample_rate = header.sample_rate;
        let time_base = Rational::new(1, sample_rate as i32);
        debug!(
            "AAC: profile={} sr={} ch={} crc={}",
            header.profile, sample_rate, header.channels, header.has_crc
        );

        self.data_end = None;
        let (duration, nb_frames) = if io.is_seekable() {
            match Self::count_frames(io, first_frame)? {
                Some((frames, end)) => {
                    self.data_end = Some(end);
                    let frame_us = (u64::from(SAMPLES_PER_FRAME) * 1_000_000)
                        .div_ceil(u64::from(sample_rate));
                    let duration_us = (frames * frame_us) as i64;
                    let duration = timestamp::rescale_q(duration_us, Rational::MICRO, time_base);
                    debug!("AAC: {frames} 帧, 时长 {duration_us} us");
                    (duration, frames)
                }
                None => (-1, 0),
            }
        } else {
            (-1, 0)
        };

        self.sample_rate = sample_rate;
        self.next_pts = 0;
        self.streams = vec![Stream {
            index: 0,
            media_type: MediaType::Audio,
            codec_id: CodecId::Aac,
            time_base,
            duration,
            start_time: 0,
            nb_frames,
            extra_data: header.audio_specific_config().to_vec(),
            params: StreamParams::Audio(AudioStreamParams {
                sample_rate,
                channels: header.channels,
                profile: header.profile,
                frame_size: SAMPLES_PER_FRAME,
                bit_rate: 0,
            }),
        }];
        Ok(())
    }

    fn streams(&self) -> &[Stream] {
        &self.streams
    }

    fn read_packet(&mut self, io: &mut IoContext) -> TanceResult<Packet> {
        let pos = io.position()?;
        // 尾部的 ID3v1/APE 标签不是帧数据
        if self.data_end.is_some_and(|end| pos >= end) {
            return Err(TanceError::Eof);
        }
        let mut header = [0u8; ADTS_HEADER_SIZE];
        let n = io.read_partial(&mut header)?;
        if n == 0 {
            return Err(TanceError::Eof);
        }
        if n < ADTS_HEADER_SIZE {
            return Err(TanceError::TruncatedInput(format!(
                "AAC: 偏移 {pos} 处只剩 {n} 字节, 不足一个 ADTS 头部"
            )));
        }

        let size = FrameSize::read(&header)
            .ok_or_else(|| {
                TanceError::InvalidData(format!("AAC: 偏移 {pos} 处不是 ADTS 帧头"))
            })?
            .validate(pos)?;

        let mut data = vec![0u8; size.frame_length];
        data[..ADTS_HEADER_SIZE].copy_from_slice(&header);
        let wanted = size.frame_length - ADTS_HEADER_SIZE;
        let got = io.read_partial(&mut data[ADTS_HEADER_SIZE..])?;
        if got < wanted {
            return Err(TanceError::TruncatedInput(format!(
                "AAC: 偏移 {pos} 处的帧需要 {} 字节, 只剩 {}",
                size.frame_length,
                ADTS_HEADER_SIZE + got
            )));
        }

        let pts = self.next_pts;
        self.next_pts += i64::from(SAMPLES_PER_FRAME);

        let mut pkt = Packet::from_data(Bytes::from(data));
        pkt.stream_index = 0;
        pkt.pts = pts;
        pkt.dts = pts;
        pkt.duration = i64::from(SAMPLES_PER_FRAME);
        pkt.time_base = Rational::new(1, self.sample_rate as i32);
        pkt.is_keyframe = true;
        pkt.pos = pos as i64;
        Ok(pkt)
    }

    fn duration(&self) -> Option<f64> {
        self.streams.first().and_then(Stream::duration_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryBackend;

    /// 构造一个 ADTS 帧: profile=LC, 无 CRC
    fn build_adts_frame(sr_index: u8, channels: u8, payload: &[u8]) -> Vec<u8> {
        let frame_length = (ADTS_HEADER_SIZE + payload.len()) as u16;
        let mut frame = vec![0u8; ADTS_HEADER_SIZE];
        frame[0] = 0xFF;
        frame[1] = 0xF1;
        frame[2] = (1 << 6) | (sr_index << 2) | (channels >> 2);
        frame[3] = ((channels & 0x03) << 6) | ((frame_length >> 11) as u8 & 0x03);
        frame[4] = (frame_length >> 3) as u8;
        frame[5] = (((frame_length & 0x07) as u8) << 5) | 0x1F;
        frame[6] = 0xFC;
        frame.extend_from_slice(payload);
        frame
    }

    fn frames(count: usize, payload_len: usize) -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..count {
            data.extend_from_slice(&build_adts_frame(3, 2, &vec![i as u8; payload_len]));
        }
        data
    }

    fn open(data: Vec<u8>) -> TanceResult<(Box<dyn Demuxer>, IoContext)> {
        let mut io = IoContext::new(Box::new(MemoryBackend::from_data(data)));
        let mut demuxer = AacDemuxer::create(&FormatOptions::default())?;
        demuxer.open(&mut io)?;
        Ok((demuxer, io))
    }

    #[test]
    fn test_adts_header_parse() {
        let frame = build_adts_frame(3, 2, &[0xAA; 10]);
        let header = parse_adts_header(&frame).unwrap();
        assert_eq!(header.profile, 1);
        assert_eq!(header.sample_rate, 48000);
        assert_eq!(header.channels, 2);
        assert_eq!(header.frame_length, 17);
        assert!(!header.has_crc);
        assert_eq!(header.header_size, 7);
    }

    #[test]
    fn test_adts_header_crc_and_71() {
        let mut frame = build_adts_frame(4, 7, &[0u8; 20]);
        frame[1] = 0xF0;
        let header = parse_adts_header(&frame).unwrap();
        assert!(header.has_crc);
        assert_eq!(header.header_size, 9);
        assert_eq!(header.channels, 8);
    }

    #[test]
    fn test_adts_header_errors() {
        assert!(matches!(
            parse_adts_header(&[0xFF, 0xF1, 0x50]),
            Err(TanceError::TruncatedInput(_))
        ));
        assert!(matches!(
            parse_adts_header(&[0u8; 7]),
            Err(TanceError::InvalidData(_))
        ));
        let frame = build_adts_frame(12, 2, &[0u8; 4]);
        assert!(matches!(
            parse_adts_header(&frame),
            Err(TanceError::InvalidData(_))
        ));
        let frame = build_adts_frame(3, 0, &[0u8; 4]);
        assert!(matches!(
            parse_adts_header(&frame),
            Err(TanceError::InvalidData(_))
        ));
        // layer != 0
        let mut frame = build_adts_frame(3, 2, &[0u8; 4]);
        frame[1] = 0xF3;
        assert!(matches!(
            parse_adts_header(&frame),
            Err(TanceError::InvalidData(_))
        ));
    }

    #[test]
    fn test_probe_scores() {
        let data = frames(3, 40);
        assert_eq!(adts_aac_probe(&ProbeData::new(&data)), SCORE_EXTENSION + 1);

        let data = frames(1, 40);
        assert_eq!(adts_aac_probe(&ProbeData::new(&data)), 1);

        assert_eq!(adts_aac_probe(&ProbeData::new(&[0u8; 512])), 0);
        assert_eq!(adts_aac_probe(&ProbeData::new(&[0xFF, 0xF1])), 0);
    }

    #[test]
    fn test_probe_frames_not_at_start() {
        // 中间位置的连续帧只有 3 帧且以同步字丢失结束, 不计分
        let mut data = vec![0x11u8; 5];
        data.extend_from_slice(&frames(3, 40));
        data.extend_from_slice(&[0x22; 64]);
        assert_eq!(adts_aac_probe(&ProbeData::new(&data)), 0);

        // 连续帧一直到样本末尾时保留计数
        let mut data = vec![0x11u8; 5];
        data.extend_from_slice(&frames(4, 40));
        assert_eq!(adts_aac_probe(&ProbeData::new(&data)), SCORE_EXTENSION / 2);
    }

    #[test]
    fn test_open_stream_info() {
        let (demuxer, _io) = open(frames(5, 50)).unwrap();
        let streams = demuxer.streams();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].codec_id, CodecId::Aac);
        assert_eq!(streams[0].media_type, MediaType::Audio);
        assert_eq!(streams[0].time_base, Rational::new(1, 48000));
        assert_eq!(streams[0].nb_frames, 5);
        assert_eq!(streams[0].duration, 5 * 1024);

        let StreamParams::Audio(ref a) = streams[0].params else {
            panic!("应该是音频参数");
        };
        assert_eq!(a.sample_rate, 48000);
        assert_eq!(a.channels, 2);
        assert_eq!(a.frame_size, 1024);
    }

    #[test]
    fn test_duration_rounds_frame_length_up() {
        // 44100 Hz: 每帧 ceil(1024e6 / 44100) = 23220 us
        let mut data = Vec::new();
        for _ in 0..10 {
            data.extend_from_slice(&build_adts_frame(4, 2, &[0u8; 30]));
        }
        let (demuxer, _io) = open(data).unwrap();
        let expected = timestamp::rescale_q(232_200, Rational::MICRO, Rational::new(1, 44100));
        assert_eq!(demuxer.streams()[0].duration, expected);
        let secs = demuxer.duration().unwrap();
        assert!((secs - 0.2322).abs() < 1e-4);
    }

    #[test]
    fn test_read_packets() {
        let (mut demuxer, mut io) = open(frames(3, 50)).unwrap();
        for i in 0..3i64 {
            let pkt = demuxer.read_packet(&mut io).unwrap();
            assert_eq!(pkt.pts, i * 1024);
            assert_eq!(pkt.size(), 57);
            assert_eq!(pkt.pos, i * 57);
            assert_eq!(&pkt.data[..2], &[0xFF, 0xF1]);
            assert!(pkt.is_keyframe);
            assert_eq!(pkt.duration, 1024);
        }
        assert!(matches!(
            demuxer.read_packet(&mut io),
            Err(TanceError::Eof)
        ));
    }

    #[test]
    fn test_read_packets_stop_before_trailing_id3v1() {
        let mut data = frames(5, 93);
        let mut id3v1 = b"TAG".to_vec();
        id3v1.resize(tag::ID3V1_TAG_SIZE as usize, b' ');
        data.extend_from_slice(&id3v1);

        let (mut demuxer, mut io) = open(data).unwrap();
        assert_eq!(demuxer.streams()[0].nb_frames, 5);
        for _ in 0..5 {
            assert_eq!(demuxer.read_packet(&mut io).unwrap().size(), 100);
        }
        assert!(matches!(
            demuxer.read_packet(&mut io),
            Err(TanceError::Eof)
        ));
    }

    #[test]
    fn test_read_packet_truncated_payload() {
        let mut data = frames(2, 50);
        data.truncate(57 + 20);
        let (mut demuxer, mut io) = open(data).unwrap();
        // 第二帧的头部完整, 预扫描仍计入
        assert_eq!(demuxer.streams()[0].nb_frames, 2);
        demuxer.read_packet(&mut io).unwrap();
        assert!(matches!(
            demuxer.read_packet(&mut io),
            Err(TanceError::TruncatedInput(_))
        ));
    }

    #[test]
    fn test_read_packet_lost_sync() {
        let mut data = frames(1, 50);
        data.extend_from_slice(&[0x00; 30]);
        let (mut demuxer, mut io) = open(data).unwrap();
        demuxer.read_packet(&mut io).unwrap();
        assert!(matches!(
            demuxer.read_packet(&mut io),
            Err(TanceError::InvalidData(_))
        ));
    }

    #[test]
    fn test_open_short_input() {
        assert!(matches!(
            open(vec![0xFF, 0xF1, 0x4C]),
            Err(TanceError::TruncatedInput(_))
        ));
        assert!(matches!(open(Vec::new()), Err(TanceError::TruncatedInput(_))));
    }

    #[test]
    fn test_open_no_sync() {
        assert!(matches!(
            open(vec![0x12; 4096]),
            Err(TanceError::InvalidData(_))
        ));
    }

    #[test]
    fn test_open_bad_frame_length_in_prescan() {
        let mut data = frames(1, 50);
        let mut bad = build_adts_frame(3, 2, &[]);
        // frame_length = 3 < 7
        bad[3] &= !0x03;
        bad[4] = 0;
        bad[5] = (3 << 5) | 0x1F;
        data.extend_from_slice(&bad);
        assert!(matches!(open(data), Err(TanceError::InvalidData(_))));
    }

    #[test]
    fn test_id3v2_skip() {
        let mut data = b"ID3\x04\x00\x00".to_vec();
        data.extend_from_slice(&[0x00, 0x00, 0x01, 0x00]);
        data.extend_from_slice(&[0u8; 128]);
        data.extend_from_slice(&frames(3, 40));

        let (mut demuxer, mut io) = open(data).unwrap();
        assert_eq!(demuxer.streams()[0].nb_frames, 3);
        let pkt = demuxer.read_packet(&mut io).unwrap();
        assert_eq!(pkt.size(), 47);
        assert_eq!(pkt.pos, 138);
    }

    #[test]
    fn test_extra_data_audio_specific_config() {
        let (demuxer, _io) = open(frames(2, 20)).unwrap();
        // AOT=2(LC), sr_index=3(48kHz), ch=2
        assert_eq!(demuxer.streams()[0].extra_data, vec![0x11, 0x90]);
    }

    #[test]
    fn test_non_seekable_duration_unknown() {
        let mut io = IoContext::from_reader(std::io::Cursor::new(frames(4, 30)));
        let mut demuxer = AacDemuxer::create(&FormatOptions::default()).unwrap();
        demuxer.open(&mut io).unwrap();
        assert_eq!(demuxer.streams()[0].duration, -1);
        assert!(demuxer.duration().is_none());
        for _ in 0..4 {
            assert_eq!(demuxer.read_packet(&mut io).unwrap().size(), 37);
        }
        assert!(matches!(
            demuxer.read_packet(&mut io),
            Err(TanceError::Eof)
        ));
    }
}
