//! xu-trace - DPB 重排轨迹回放工具
//!
//! 读取 JSON 描述的解码顺序轨迹, 逐步送入 DPB, 核对或打印输出顺序.

mod logging;
mod trace;

use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;

use xu_core::Rational;

#[derive(Parser, Debug)]
#[command(name = "xu-trace", version, about = "DPB 输出重排轨迹回放工具")]
struct Cli {
    /// 日志详细程度 (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// 额外写入按天滚动的日志文件到该目录
    #[arg(long = "log-dir", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 回放轨迹并核对每一步的输出与计数, 任一不符时退出码为 1
    Run {
        /// 轨迹文件
        #[arg(required = true)]
        traces: Vec<PathBuf>,
    },
    /// 回放轨迹并打印每一步的输出, 不做核对
    Show {
        /// 轨迹文件
        trace: PathBuf,

        /// 覆盖轨迹中的场率 (如 "60000/1001" 或 "50")
        #[arg(long = "field-rate")]
        field_rate: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init("xu-trace", cli.verbose, cli.log_dir.as_deref()) {
        eprintln!("警告: {e:#}");
    }

    let result = match &cli.command {
        Command::Run { traces } => run(traces),
        Command::Show { trace, field_rate } => show(trace, field_rate.as_deref()),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("错误: {e:#}");
            process::exit(1);
        }
    }
}

/// 逐个回放并核对, 返回是否全部通过
fn run(paths: &[PathBuf]) -> Result<bool> {
    let mut failed = 0usize;
    for path in paths {
        let trace = trace::load_trace(path)?;
        match trace::replay(&trace, None, true) {
            Ok(replay) => {
                println!(
                    "通过  {} ({} 步, 输出 {} 帧)",
                    replay.name,
                    replay.steps.len(),
                    replay.stats.output
                );
            }
            Err(e) => {
                failed += 1;
                println!("失败  {}: {e}", trace.name);
            }
        }
    }

    info!("回放完成: 共 {} 个轨迹, 失败 {}", paths.len(), failed);
    if failed > 0 {
        eprintln!("{failed} 个轨迹未通过");
    }
    Ok(failed == 0)
}

fn show(path: &Path, field_rate: Option<&str>) -> Result<bool> {
    let field_rate = field_rate
        .map(Rational::from_str)
        .transpose()
        .context("无效的场率")?;
    let trace = trace::load_trace(path)?;
    let replay = trace::replay(&trace, field_rate, false)
        .with_context(|| format!("回放轨迹失败: {}", trace.name))?;

    println!("轨迹: {}", replay.name);
    for step in &replay.steps {
        println!(
            "  第 {:3} 步  输出 {:?}  pts {:?}  size={} stored_fields={}",
            step.step, step.focs, step.pts, step.size, step.stored_fields
        );
    }
    println!("输出顺序: {:?}", replay.output_order());
    println!("统计: {:?}", replay.stats);
    Ok(true)
}
