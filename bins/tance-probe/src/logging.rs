//! 日志初始化模块.
//!
//! 双输出:
//! - console: 彩色, 输出到 stderr, 默认 warn, -v 为 info, -vv 为 debug, -vvv 为 trace
//! - file: 无色, 默认 info, 可通过 -v/-vv 或 TANCE_LOG 环境变量调整
//!
//! 日志文件输出到 $cwd/logs/{prefix}.{date}.log. 库中 `log` 宏产生的记录同样会被收集.

use std::sync::OnceLock;

use anyhow::Context;
use chrono::{Datelike, Local, Timelike};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 初始化日志系统
///
/// - `file_prefix`: 日志文件前缀 (如 "tance-probe")
/// - `verbosity`: -v 的个数
pub fn init(file_prefix: &str, verbosity: u8) -> anyhow::Result<()> {
    std::fs::create_dir_all("logs").context("创建 logs 目录失败")?;

    let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix(file_prefix)
        .filename_suffix("log")
        .build("logs")
        .context("创建日志文件失败")?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    LOG_GUARD.set(guard).ok();

    let console_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let console_layer = fmt::Layer::default()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .event_format(ConsoleFormatter)
        .with_filter(EnvFilter::new(console_level));

    let file_level = match verbosity {
        0 | 1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let file_filter =
        EnvFilter::try_from_env("TANCE_LOG").unwrap_or_else(|_| EnvFilter::new(file_level));
    let file_layer = fmt::Layer::default()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(file_filter);

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("初始化日志订阅器失败")?;
    Ok(())
}

fn write_timestamp(writer: &mut Writer<'_>) -> std::fmt::Result {
    let now = Local::now();
    write!(
        writer,
        "[{:02}-{:02} {:02}:{:02}:{:02}.{:03}] ",
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.timestamp_subsec_millis(),
    )
}

/// Console 格式: 彩色级别 + 时间戳
struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let color = match *meta.level() {
            tracing::Level::ERROR => "\x1b[31m",
            tracing::Level::WARN => "\x1b[33m",
            tracing::Level::INFO => "\x1b[32m",
            _ => "\x1b[34m",
        };
        write_timestamp(&mut writer)?;
        write!(writer, "{}{:5}\x1b[0m > ", color, meta.level())?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// File 格式: 无色, 时间戳 + 级别 + 消息
struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        write_timestamp(&mut writer)?;
        write!(writer, "{:5} > ", event.metadata().level())?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
