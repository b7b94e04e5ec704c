//! 应用编排
//!
//! ## 职责
//!
//! 1. **应用初始化**：启动浏览器、登录、捕获 token、探测 campaign 状态
//! 2. **计划加载**：TOML 文件或内置 campaign 计划
//! 3. **运行委托**：交给 unlock_runner 执行两阶段解锁
//! 4. **收尾**：输出最终统计并关闭浏览器

use anyhow::Result;
use std::path::Path;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::browser;
use crate::clients::LessonClient;
use crate::config::Config;
use crate::error::{AppError, AuthError};
use crate::infrastructure::ApiSession;
use crate::login;
use crate::models::counters::RunReport;
use crate::models::plan::ModulePlan;
use crate::models::load_plan_from_toml;
use crate::orchestrator::unlock_runner::UnlockRunner;
use crate::workflow::TracingObserver;

/// 应用主结构
pub struct App {
    config: Config,
    client: LessonClient,
}

impl App {
    /// 初始化应用：登录完成且状态探测通过后才返回
    pub async fn initialize(config: Config, username: &str, password: &str) -> Result<Self> {
        log_startup(&config);

        // 启动浏览器
        let (browser, page) = browser::launch_browser(config.visible).await?;

        // 登录并捕获 XSRF token，缺失则直接失败
        let token = login::login_and_capture_token(&page, &config, username, password).await?;

        let session = ApiSession::new(browser, page, token);
        let client = LessonClient::new(session, &config);

        // campaign 状态探测，未授权则中止
        check_campaign_status(&client).await?;

        Ok(Self { config, client })
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> Result<RunReport> {
        let plan = load_plan(&self.config).await?;
        if plan.is_empty() {
            warn!("⚠️ 解锁计划为空，没有可处理的课程");
        }

        let observer = TracingObserver;
        let report = {
            let runner = UnlockRunner::new(&self.client, &self.config, &observer);
            runner.run(plan).await
        };

        print_final_stats(&report);

        info!("脚本执行完毕，浏览器将在 5 秒后关闭...");
        sleep(Duration::from_secs(5)).await;
        if let Err(e) = self.client.shutdown().await {
            warn!("关闭浏览器失败: {}", e);
        }

        Ok(report)
    }
}

/// 加载解锁计划：优先 TOML 文件，否则使用内置 campaign 计划
async fn load_plan(config: &Config) -> Result<ModulePlan> {
    match &config.plan_file {
        Some(path) => {
            info!("📁 从文件加载计划: {}", path);
            load_plan_from_toml(Path::new(path)).await
        }
        None => {
            info!("📁 使用内置 campaign 计划");
            Ok(ModulePlan::builtin())
        }
    }
}

/// campaign 状态探测：响应体出现 unauthorized 即认证失败
async fn check_campaign_status(client: &LessonClient) -> Result<()> {
    info!("🔍 探测 campaign 状态...");

    let response = client.campaign_status().await?;

    if response.body.to_lowercase().contains("unauthorized") {
        return Err(AppError::Auth(AuthError::Unauthorized {
            body: response.body,
        })
        .into());
    }

    info!("✓ 状态探测通过: {}", response.body_preview());
    Ok(())
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 课程批量解锁");
    info!("🌐 站点: {}", config.base_url);
    info!("👁️ 可见模式: {}", config.visible);
    info!("{}", "=".repeat(60));
}

fn print_final_stats(report: &RunReport) {
    let totals = report.totals();

    info!("\n{}", "=".repeat(60));
    info!("📊 最终统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("课程总数: {}", totals.processed);
    info!("✅ 解锁成功: {}", totals.successful);
    info!("❌ 解锁失败: {}", totals.failed);
    info!("✅ 完成标记成功: {}", totals.completed_successful);
    info!("❌ 完成标记失败: {}", totals.completed_failed);
    info!("{}", "=".repeat(60));
}
