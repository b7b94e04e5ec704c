use anyhow::Result;
use clap::Parser;

use lesson_unlocker::logger;
use lesson_unlocker::orchestrator::App;
use lesson_unlocker::Config;

/// 登录课程站点并批量解锁课程
#[derive(Debug, Parser)]
#[command(name = "lesson_unlocker")]
#[command(about = "登录 Engage Bricks 并批量解锁课程", long_about = None)]
struct Cli {
    /// 登录用户名
    #[arg(short, long)]
    username: String,

    /// 登录密码
    #[arg(short, long)]
    password: String,

    /// 以可见窗口运行浏览器
    #[arg(long)]
    visible: bool,

    /// 覆盖内置计划的 TOML 文件
    #[arg(long)]
    plan: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    let cli = Cli::parse();

    // 加载配置，命令行参数优先于环境变量
    let mut config = Config::from_env();
    if cli.visible {
        config.visible = true;
    }
    if cli.plan.is_some() {
        config.plan_file = cli.plan;
    }

    // 初始化并运行应用
    let app = App::initialize(config, &cli.username, &cli.password).await?;
    app.run().await?;

    Ok(())
}
