//! 格式探测.
//!
//! 两层结构:
//! - 打分器 ([`probe_input_format3`]): 对一段前缀, 让注册表中的每个输入格式打分,
//!   选出唯一的最高分格式. 并列最高分视为无法判定.
//! - 自适应探测器 ([`probe_input_buffer`]): 从 2 KiB 开始逐轮加倍读取窗口,
//!   直到得到足够可信的结果或耗尽探测预算. 读过的字节最终全部归还给输入.

use log::{debug, trace, warn};
use tance_core::{TanceError, TanceResult};

use crate::config::{check_probe_offset, effective_max_probe_size};
use crate::format::InputFormat;
use crate::io::IoContext;
use crate::registry::FormatRegistry;
use crate::tag;

/// 探测置信度
///
/// 数值越高, 表示对格式判断越有信心.
pub type ProbeScore = u32;

/// 值得重试的分数: 非最后一轮必须严格高于此值才会被接受
pub const SCORE_RETRY: ProbeScore = SCORE_MAX / 4;

/// 流式格式的重试分数
pub const SCORE_STREAM_RETRY: ProbeScore = SCORE_MAX / 4 - 1;

/// 扩展名匹配分数
pub const SCORE_EXTENSION: ProbeScore = 50;

/// MIME 类型匹配分数
pub const SCORE_MIME: ProbeScore = 75;

/// 最高探测分数 (内容完全匹配)
pub const SCORE_MAX: ProbeScore = 100;

/// 前导 ID3v2 标签超出样本时的分数上限
pub const SCORE_ID3_CEILING: ProbeScore = SCORE_EXTENSION / 2 - 1;

/// 最小探测窗口
pub const PROBE_BUF_MIN: u32 = 2048;

/// 默认最大探测窗口 (1 MiB)
pub const PROBE_BUF_MAX: u32 = 1 << 20;

/// 探测缓冲区末尾额外补零的字节数
pub const PROBE_PADDING_SIZE: usize = 32;

/// 探测样本
///
/// 一轮探测中交给各格式打分的前缀数据及其附带信息.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeData<'a> {
    /// 有效数据 (不含补零区)
    pub buf: &'a [u8],
    /// 文件名 (用于扩展名匹配)
    pub filename: Option<&'a str>,
    /// MIME 类型 (已去掉 `;` 之后的参数)
    pub mime_type: Option<&'a str>,
}

impl<'a> ProbeData<'a> {
    /// 仅包含数据的样本
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            ..Self::default()
        }
    }

    /// 附加文件名
    pub fn with_filename(mut self, filename: Option<&'a str>) -> Self {
        self.filename = filename;
        self
    }

    /// 附加 MIME 类型
    pub fn with_mime_type(mut self, mime_type: Option<&'a str>) -> Self {
        self.mime_type = mime_type;
        self
    }
}

/// 探测结果
#[derive(Debug, Clone, Copy)]
pub struct ProbeResult {
    /// 识别出的格式
    pub format: &'static InputFormat,
    /// 置信度分数
    pub score: ProbeScore,
    /// 只在最后一轮以重试档分数命中, 存在误判可能
    pub low_confidence: bool,
}

/// 前导 ID3v2 标签与样本大小的关系
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Id3State {
    /// 无前导标签
    None,
    /// 标签之后的数据少于标签本身, 内容探测依据偏少
    AlmostGreaterProbe,
    /// 标签超出样本, 需要更大的缓冲区
    GreaterProbe,
    /// 标签超出最大探测窗口, 永远无法看到标签后的数据
    GreaterMaxProbe,
}

/// 分数调整步骤, 按固定顺序作用于内容探测分数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScoreAdjustment {
    /// 有探测函数且扩展名匹配
    Extension(Id3State),
    /// 无探测函数, 仅靠扩展名
    ExtensionOnly,
    /// MIME 类型匹配
    Mime,
}

impl ScoreAdjustment {
    fn apply(self, score: ProbeScore) -> ProbeScore {
        match self {
            Self::Extension(Id3State::None | Id3State::GreaterMaxProbe) => {
                score.max(SCORE_EXTENSION)
            }
            Self::Extension(Id3State::AlmostGreaterProbe | Id3State::GreaterProbe) => {
                score.max(SCORE_ID3_CEILING)
            }
            Self::ExtensionOnly => SCORE_EXTENSION,
            Self::Mime => score.max(SCORE_MIME),
        }
    }
}

/// 检查样本开头的 ID3v2 标签, 返回标签状态与应跳过的字节数
fn leading_id3_state(buf: &[u8]) -> (Id3State, usize) {
    if buf.len() <= tag::ID3V2_HEADER_SIZE || !tag::id3v2_match(buf) {
        return (Id3State::None, 0);
    }
    let id3len = tag::id3v2_tag_len(buf);
    let size = buf.len();
    if size > id3len + 16 {
        let state = if size < 2 * id3len + 16 {
            Id3State::AlmostGreaterProbe
        } else {
            Id3State::None
        };
        (state, id3len)
    } else if id3len >= PROBE_BUF_MAX as usize {
        (Id3State::GreaterMaxProbe, 0)
    } else {
        (Id3State::GreaterProbe, 0)
    }
}

/// 对单个格式打分
fn score_format(fmt: &InputFormat, pd: &ProbeData<'_>, id3: Id3State) -> ProbeScore {
    let ext_match = fmt.matches_extension(pd.filename);
    let mut score = 0;
    let mut steps = [None, None];

    match fmt.read_probe {
        Some(read_probe) => {
            score = read_probe(pd);
            if score > 0 {
                trace!("探测 {} 得分 {} (样本 {} 字节)", fmt.name, score, pd.buf.len());
            }
            if ext_match {
                steps[0] = Some(ScoreAdjustment::Extension(id3));
            }
        }
        None if ext_match => steps[0] = Some(ScoreAdjustment::ExtensionOnly),
        None => {}
    }
    if fmt.matches_mime(pd.mime_type) {
        steps[1] = Some(ScoreAdjustment::Mime);
    }

    steps.into_iter().flatten().fold(score, |score, step| {
        let adjusted = step.apply(score);
        if adjusted != score {
            debug!("探测 {} 得分 {} 因 {:?} 调整为 {}", fmt.name, score, step, adjusted);
        }
        adjusted
    })
}

/// 对样本在所有已注册输入格式中打分, 返回唯一最高分格式和最高分
///
/// - `is_opened`: 输入是否已有文件句柄. 带 `NO_FILE` 的格式只在未打开时参与,
///   其余格式只在已打开时参与; `PROBE_ALWAYS` 格式总是参与.
/// - 后出现的格式与当前最高分相同时, 当前胜者被清空; 再往后出现的更高分仍可胜出.
pub fn probe_input_format3(
    registry: &FormatRegistry,
    pd: &ProbeData<'_>,
    is_opened: bool,
) -> (Option<&'static InputFormat>, ProbeScore) {
    let (id3, skip) = leading_id3_state(pd.buf);
    let lpd = ProbeData {
        buf: &pd.buf[skip..],
        ..*pd
    };

    let mut best = None;
    let mut score_max = 0;
    for fmt in registry.inputs() {
        let no_file = fmt.flags.contains(crate::format::FormatFlags::NO_FILE);
        let always = fmt.flags.contains(crate::format::FormatFlags::PROBE_ALWAYS);
        if is_opened == no_file && !always {
            continue;
        }
        let score = score_format(fmt, &lpd, id3);
        if score > score_max {
            score_max = score;
            best = Some(fmt);
        } else if score == score_max {
            best = None;
        }
    }

    if id3 == Id3State::GreaterProbe {
        score_max = score_max.min(SCORE_ID3_CEILING);
    }
    (best, score_max)
}

/// 只有最高分严格大于 `score_max` 时才返回格式, 同时更新 `score_max`
pub fn probe_input_format2(
    registry: &FormatRegistry,
    pd: &ProbeData<'_>,
    is_opened: bool,
    score_max: &mut ProbeScore,
) -> Option<&'static InputFormat> {
    let (fmt, score) = probe_input_format3(registry, pd, is_opened);
    if score > *score_max {
        *score_max = score;
        fmt
    } else {
        None
    }
}

/// 返回任意正分的唯一最高分格式
pub fn probe_input_format(
    registry: &FormatRegistry,
    pd: &ProbeData<'_>,
    is_opened: bool,
) -> Option<&'static InputFormat> {
    let mut score = 0;
    probe_input_format2(registry, pd, is_opened, &mut score)
}

/// 从输入中自适应读取前缀并探测格式
///
/// - `offset`: 容器数据在前缀中的起始偏移, 必须小于 `max_probe_size`
/// - `max_probe_size`: 最大读取量, 0 表示默认 1 MiB, 非 0 时不能小于 2048
///
/// 无论成功与否, 读取过的字节都会归还给 `io`: 之后从 `io` 顺序读取得到的
/// 字节序列与探测前完全一致.
pub fn probe_input_buffer(
    registry: &FormatRegistry,
    io: &mut IoContext,
    filename: Option<&str>,
    offset: u32,
    max_probe_size: u32,
) -> TanceResult<ProbeResult> {
    let max_probe_size = effective_max_probe_size(max_probe_size)?;
    check_probe_offset(offset, max_probe_size)?;

    let mime_type = io
        .mime_type()
        .map(|mime| mime.split(';').next().unwrap_or(mime).trim().to_string());
    let start = io.position()?;

    let mut buf = Vec::new();
    let mut buf_offset = 0usize;
    let outcome = probe_rounds(
        registry,
        io,
        ProbeRoundsInput {
            filename,
            mime_type: mime_type.as_deref(),
            offset: offset as usize,
            max_probe_size: max_probe_size as usize,
        },
        &mut buf,
        &mut buf_offset,
    );

    let rewind = io.rewind_with_probe_data(start, &buf[..buf_offset]);
    let result = outcome?;
    rewind?;
    Ok(result)
}

struct ProbeRoundsInput<'a> {
    filename: Option<&'a str>,
    mime_type: Option<&'a str>,
    offset: usize,
    max_probe_size: usize,
}

/// 逐轮扩大窗口探测, `buf[..buf_offset]` 始终是已从输入读出的全部字节
fn probe_rounds(
    registry: &FormatRegistry,
    io: &mut IoContext,
    input: ProbeRoundsInput<'_>,
    buf: &mut Vec<u8>,
    buf_offset: &mut usize,
) -> TanceResult<ProbeResult> {
    let max_probe_size = input.max_probe_size;
    let mut probe_size = PROBE_BUF_MIN as usize;

    while probe_size <= max_probe_size {
        let mut score = if probe_size < max_probe_size {
            SCORE_RETRY
        } else {
            0
        };

        buf.resize(probe_size + PROBE_PADDING_SIZE, 0);
        // 出错时 buf_offset 已包含本轮读出的部分字节, 调用方据此完整归还
        io.read_into(&mut buf[..probe_size], buf_offset)?;
        let eof = *buf_offset < probe_size;
        if eof {
            // 数据已读完, 不必再为"读更多"打折
            score = 0;
        }

        if *buf_offset >= input.offset {
            buf[*buf_offset..*buf_offset + PROBE_PADDING_SIZE].fill(0);
            let pd = ProbeData {
                buf: &buf[input.offset..*buf_offset],
                filename: input.filename,
                mime_type: input.mime_type,
            };
            if let Some(fmt) = probe_input_format2(registry, &pd, true, &mut score) {
                let low_confidence = score <= SCORE_RETRY;
                if low_confidence {
                    warn!("格式 {} 仅以低分 {} 识别, 可能误判", fmt.name, score);
                } else {
                    debug!(
                        "格式 {} 探测成功, 窗口 {} 字节, 分数 {}",
                        fmt.name, probe_size, score
                    );
                }
                return Ok(ProbeResult {
                    format: fmt,
                    score,
                    low_confidence,
                });
            }
        }

        if eof {
            break;
        }
        probe_size = (probe_size << 1).min(max_probe_size.max(probe_size + 1));
    }

    Err(TanceError::IndeterminateFormat(format!(
        "读取 {buf_offset} 字节后仍无法识别输入格式"
    )))
}
