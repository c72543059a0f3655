//! tance-probe - 容器格式探测工具
//!
//! 对标 FFmpeg 的 ffprobe, 识别输入的容器格式并列出流信息.

mod logging;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use tance_core::TanceError;
use tance_format::stream::{AudioStreamParams, StreamParams};
use tance_format::{FormatOptions, IoContext, registry};

/// tance 容器格式探测工具
#[derive(Parser, Debug)]
#[command(name = "tance-probe", version, about = "纯 Rust 容器格式探测工具")]
struct Cli {
    /// 输入文件路径, `-` 表示标准输入
    #[arg(required = true)]
    inputs: Vec<String>,

    /// 读取全部数据包并统计
    #[arg(long)]
    show_packets: bool,

    /// 输出 JSON 格式
    #[arg(long)]
    json: bool,

    /// 最大探测字节数 (0 表示默认 1 MiB)
    #[arg(long)]
    probe_size: Option<u32>,

    /// 容器数据在输入中的起始偏移
    #[arg(long)]
    offset: Option<u32>,

    /// 强制使用指定格式, 跳过探测
    #[arg(short, long)]
    format: Option<String>,

    /// JSON 配置文件 (命令行参数优先)
    #[arg(long)]
    config: Option<PathBuf>,

    /// 日志详细程度 (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ============================================================
// 输出结构体
// ============================================================

/// 单个输入的探测结果
#[derive(Serialize)]
struct ProbeOutput {
    format: FormatInfo,
    streams: Vec<StreamInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    packets: Option<PacketSummary>,
}

/// 格式信息
#[derive(Serialize)]
struct FormatInfo {
    filename: String,
    format_name: String,
    format_long_name: String,
    nb_streams: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    probe_score: Option<u32>,
    low_confidence: bool,
}

/// 流信息
#[derive(Serialize)]
struct StreamInfo {
    index: usize,
    codec_type: String,
    codec_name: String,
    time_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bit_rate: Option<u64>,
    nb_frames: u64,
}

/// 数据包统计
#[derive(Serialize)]
struct PacketSummary {
    total_packets: u64,
    total_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// ============================================================
// 主逻辑
// ============================================================

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init("tance-probe", cli.verbose) {
        eprintln!("警告: 日志初始化失败: {e:#}");
    }

    let options = match build_options(&cli) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("错误: {e:#}");
            process::exit(2);
        }
    };

    // 各输入互不共享状态, 并行探测; 结果按输入顺序输出
    let results: Vec<(String, Result<ProbeOutput>)> = cli
        .inputs
        .par_iter()
        .map(|input| (input.clone(), probe_one(input, &cli, &options)))
        .collect();

    let mut failed = false;
    let mut outputs = Vec::new();
    for (input, result) in results {
        match result {
            Ok(output) => outputs.push(output),
            Err(e) => {
                failed = true;
                eprintln!("错误: {input}: {e:#}");
            }
        }
    }

    if cli.json {
        match serde_json::to_string_pretty(&outputs) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("错误: JSON 序列化失败: {e}");
                failed = true;
            }
        }
    } else {
        for output in &outputs {
            print_text(output);
        }
    }

    if failed {
        process::exit(1);
    }
}

/// 合并配置文件与命令行参数
fn build_options(cli: &Cli) -> Result<FormatOptions> {
    let mut options = match &cli.config {
        Some(path) => FormatOptions::from_json_file(path)
            .with_context(|| format!("加载配置文件 {} 失败", path.display()))?,
        None => FormatOptions::default(),
    };
    if let Some(size) = cli.probe_size {
        options.max_probe_size = size;
    }
    if let Some(offset) = cli.offset {
        options.probe_offset = offset;
    }
    options.validate().context("探测配置无效")?;
    Ok(options)
}

/// 探测一个输入
fn probe_one(input: &str, cli: &Cli, options: &FormatOptions) -> Result<ProbeOutput> {
    let (mut io, filename) = if input == "-" {
        (IoContext::from_reader(std::io::stdin()), None)
    } else {
        let io = IoContext::open_read(input).with_context(|| format!("无法打开 '{input}'"))?;
        (io, Some(input))
    };

    let formats = registry::global();
    let (format, score, low_confidence, mut demuxer) = match &cli.format {
        Some(name) => {
            let fmt = registry::find_input_format_by_name(name)
                .ok_or_else(|| TanceError::FormatNotFound(name.clone()))?;
            let demuxer = formats
                .open_input_as(fmt, &mut io, options)
                .with_context(|| format!("以 {} 格式打开失败", fmt.name))?;
            (fmt, None, false, demuxer)
        }
        None => {
            let (result, demuxer) = formats
                .open_input(&mut io, filename, options)
                .context("无法识别或打开输入")?;
            (result.format, Some(result.score), result.low_confidence, demuxer)
        }
    };
    info!("{input}: 格式 {} (置信度 {:?})", format.name, score);
    if low_confidence {
        warn!("{input}: 格式 {} 置信度较低, 结果可能不准确", format.name);
    }

    let format_info = FormatInfo {
        filename: input.to_string(),
        format_name: format.name.to_string(),
        format_long_name: format.long_name.to_string(),
        nb_streams: demuxer.streams().len(),
        duration: demuxer.duration(),
        probe_score: score,
        low_confidence,
    };
    let streams = demuxer.streams().iter().map(build_stream_info).collect();

    let packets = cli.show_packets.then(|| {
        let mut summary = PacketSummary {
            total_packets: 0,
            total_bytes: 0,
            error: None,
        };
        loop {
            match demuxer.read_packet(&mut io) {
                Ok(pkt) => {
                    summary.total_packets += 1;
                    summary.total_bytes += pkt.size() as u64;
                }
                Err(TanceError::Eof) => break,
                Err(e) => {
                    warn!("{input}: 读取数据包时出错: {e}");
                    summary.error = Some(e.to_string());
                    break;
                }
            }
        }
        summary
    });

    Ok(ProbeOutput {
        format: format_info,
        streams,
        packets,
    })
}

/// 从 Stream 构建 StreamInfo
fn build_stream_info(stream: &tance_format::Stream) -> StreamInfo {
    let mut info = StreamInfo {
        index: stream.index,
        codec_type: stream.media_type.name().to_string(),
        codec_name: stream.codec_id.name().to_string(),
        time_base: format!("{}/{}", stream.time_base.num, stream.time_base.den),
        duration: stream.duration_seconds(),
        sample_rate: None,
        channels: None,
        profile: None,
        bit_rate: None,
        nb_frames: stream.nb_frames,
    };

    if let StreamParams::Audio(AudioStreamParams {
        sample_rate,
        channels,
        profile,
        bit_rate,
        ..
    }) = &stream.params
    {
        info.sample_rate = Some(*sample_rate);
        info.channels = Some(*channels);
        info.profile = Some(*profile);
        if *bit_rate > 0 {
            info.bit_rate = Some(*bit_rate);
        }
    }

    info
}

/// 文本输出
fn print_text(output: &ProbeOutput) {
    let fmt = &output.format;
    println!("[FORMAT]");
    println!("  文件名       : {}", fmt.filename);
    println!("  格式名称     : {} ({})", fmt.format_name, fmt.format_long_name);
    println!("  流数量       : {}", fmt.nb_streams);
    if let Some(dur) = fmt.duration {
        println!("  时长         : {dur:.3} 秒");
    }
    if let Some(score) = fmt.probe_score {
        let note = if fmt.low_confidence { " (低置信度)" } else { "" };
        println!("  探测置信度   : {score}{note}");
    }
    println!("[/FORMAT]");
    println!();

    for stream in &output.streams {
        println!("[STREAM #{}]", stream.index);
        println!("  类型         : {}", stream.codec_type);
        println!("  编解码器     : {}", stream.codec_name);
        println!("  时间基       : {}", stream.time_base);
        if let Some(dur) = stream.duration {
            println!("  时长         : {dur:.3} 秒");
        }
        if let Some(sr) = stream.sample_rate {
            println!("  采样率       : {sr} Hz");
        }
        if let Some(ch) = stream.channels {
            println!("  声道数       : {ch}");
        }
        if let Some(br) = stream.bit_rate {
            println!("  码率         : {} kbps", br / 1000);
        }
        if stream.nb_frames > 0 {
            println!("  帧数         : {}", stream.nb_frames);
        }
        println!("[/STREAM]");
        println!();
    }

    if let Some(summary) = &output.packets {
        println!("[PACKETS]");
        println!("  数据包总数   : {}", summary.total_packets);
        println!(
            "  数据总量     : {} 字节 ({:.2} KB)",
            summary.total_bytes,
            summary.total_bytes as f64 / 1024.0
        );
        if let Some(err) = &summary.error {
            println!("  错误         : {err}");
        }
        println!("[/PACKETS]");
        println!();
    }
}
