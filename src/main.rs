use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use firefighter_request::utils::logging;
use firefighter_request::{App, Config};
use tracing::info;

/// 特权账号申请提交客户端
#[derive(Parser, Debug)]
#[command(name = "firefighter-request", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 提交申请（默认提交 SUBMISSION_FOLDER 下的全部 TOML）
    Submit {
        /// 只提交单个 TOML 文件
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// 列出所有申请
    List,
    /// 查看申请详情
    Show { id: String },
    /// 查看 CDHDR / CDPOS 上传统计
    Stats { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    let app = App::initialize(config)?;

    match cli.command.unwrap_or(Command::Submit { file: None }) {
        Command::Submit { file: Some(path) } => {
            let report = app.submit_file(&path).await?;
            for notice in &report.notices {
                println!("{notice}");
            }
        }
        Command::Submit { file: None } => {
            let stats = app.run_folder().await?;
            info!("✓ 提交结束: 成功 {}/{}", stats.success, stats.total);
        }
        Command::List => print!("{}", app.list().await?),
        Command::Show { id } => print!("{}", app.show(&id).await?),
        Command::Stats { id } => print!("{}", app.stats(&id).await?),
    }

    Ok(())
}
