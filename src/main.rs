//! govwatch CLI
//!
//! 按周期读取报告、过滤静音后分发通知；同时提供静音命令入口。

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use govwatch::{
    mute::render_mutes_list, AppConfig, BatchOutcome, MuteCommandHandler, MuteStore,
    NotificationBuilder, NotificationDispatcher, Report, RequesterContext,
};

#[derive(Parser)]
#[command(name = "govwatch")]
#[command(about = "Governance proposal notifications with mute rules")]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 ~/.config/govwatch/config.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Dry-run 模式（只打印不发送）
    #[arg(long, global = true)]
    dry_run: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 对报告文件执行一次分发
    Dispatch {
        /// 报告 JSON 文件
        #[arg(long, short)]
        report: PathBuf,
    },
    /// 周期性分发，直到 Ctrl-C
    Watch {
        /// 报告 JSON 文件（每个周期重新读取）
        #[arg(long, short)]
        report: PathBuf,
        /// 周期（秒），默认取配置文件
        #[arg(long, short)]
        interval: Option<u64>,
    },
    /// 添加静音规则，例如: mute chain=cosmoshub proposal=55 duration=1h
    Mute {
        /// 规则文本
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// 请求者
        #[arg(long)]
        requester: String,
    },
    /// 列出静音规则
    Mutes {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
        /// 包含已过期的规则
        #[arg(long)]
        all: bool,
    },
    /// 删除静音规则
    Unmute {
        /// 规则 ID
        id: String,
        /// 请求者
        #[arg(long)]
        requester: String,
    },
    /// 处理一条聊天命令（/mute、/mutes、/unmute）并打印回复
    Command {
        /// 命令文本
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        text: Vec<String>,
        /// 请求者
        #[arg(long)]
        requester: String,
    },
    /// 清理已过期的静音规则
    Purge,
    /// 检查配置文件
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("govwatch=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Dispatch { report } => {
            let builder = NotificationBuilder::new(config).dry_run(cli.dry_run);
            // 阻塞 HTTP 客户端的创建、使用和释放都放在阻塞线程中
            let outcome = tokio::task::spawn_blocking(move || -> Result<BatchOutcome> {
                let dispatcher = builder.build()?;
                dispatcher.dispatch(Report::load(&report)?)
            })
            .await??;
            print_outcome(&outcome);
        }
        Commands::Watch { report, interval } => {
            let interval = interval.unwrap_or(config.interval_secs).max(1);
            let builder = NotificationBuilder::new(config).dry_run(cli.dry_run);
            let dispatcher = Arc::new(tokio::task::spawn_blocking(move || builder.build()).await??);
            watch(Arc::clone(&dispatcher), report, interval).await;
            tokio::task::spawn_blocking(move || drop(dispatcher)).await?;
        }
        Commands::Mute { text, requester } => {
            let handler = MuteCommandHandler::new(open_store(&config)?);
            let raw = join_command_args(&text);
            match handler.add_mute_from_command(&raw, &RequesterContext::new(requester)) {
                Ok(reply) => println!("{}", reply),
                Err(e) => {
                    error!(error = %e, "Error adding mute");
                    eprintln!("Error adding mute");
                    return Err(e);
                }
            }
        }
        Commands::Mutes { json, all } => {
            let store = open_store(&config)?;
            let mutes = if all {
                store.all_mutes()?
            } else {
                store.active_mutes(Utc::now())?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&mutes)?);
            } else {
                println!("{}", render_mutes_list(&mutes));
            }
        }
        Commands::Unmute { id, requester } => {
            let handler = MuteCommandHandler::new(open_store(&config)?);
            let reply = handler.remove_mute_from_command(&id, &RequesterContext::new(requester))?;
            println!("{}", reply);
        }
        Commands::Command { text, requester } => {
            let handler = MuteCommandHandler::new(open_store(&config)?);
            let raw = join_command_args(&text);
            println!("{}", handler.handle(&raw, &RequesterContext::new(requester)));
        }
        Commands::Purge => {
            let removed = open_store(&config)?.purge_expired(Utc::now())?;
            println!("Removed {} expired mute(s)", removed);
        }
        Commands::CheckConfig => {
            let warnings = config.validate()?;
            println!("data_dir: {}", config.data_dir.display());
            println!("interval: {}s", config.interval_secs);
            println!("reporters configured: {}", config.reporter_count());
            for warning in &warnings {
                println!("warning: {}", warning);
            }
            if warnings.is_empty() {
                println!("Config OK");
            }
        }
    }

    Ok(())
}

fn open_store(config: &AppConfig) -> Result<MuteStore> {
    NotificationBuilder::new(config.clone()).mute_store()
}

/// 每个 tick 执行一个周期；周期不重入，超时的 tick 直接跳过
async fn watch(dispatcher: Arc<NotificationDispatcher>, report: PathBuf, interval_secs: u64) {
    info!(interval_secs, report = %report.display(), "Starting watch loop");

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match run_cycle(Arc::clone(&dispatcher), &report).await {
                    Ok(outcome) => print_outcome(&outcome),
                    Err(e) => error!(error = %e, "Cycle failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, stopping watch loop");
                break;
            }
        }
    }
}

async fn run_cycle(dispatcher: Arc<NotificationDispatcher>, report: &Path) -> Result<BatchOutcome> {
    let report = report.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<BatchOutcome> {
        dispatcher.dispatch(Report::load(&report)?)
    })
    .await?
}

fn print_outcome(outcome: &BatchOutcome) {
    println!(
        "{} item(s), {} suppressed, {} to send",
        outcome.total_items,
        outcome.suppressed,
        outcome.to_send()
    );
    for r in &outcome.reporters {
        println!(
            "  {}: delivered {}, skipped {}, failed {}",
            r.reporter,
            r.delivered,
            r.skipped,
            r.failures.len()
        );
        for failure in &r.failures {
            println!("    {}: {}", failure.item, failure.error);
        }
    }
    if !outcome.all_succeeded() {
        warn!(failed = ?outcome.failed_reporters(), "Some reporters failed");
    }
}

/// shell 已去掉引号，含空白的 key=value 需要重新加引号
fn join_command_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((key, value)) if value.chars().any(char::is_whitespace) => {
                format!("{}=\"{}\"", key, value)
            }
            _ => arg.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
