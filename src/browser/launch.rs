//! 浏览器启动

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult, BrowserError};

/// 启动浏览器并打开一个空白页面
///
/// `visible` 为 true 时以可见窗口运行，便于观察登录过程。
pub async fn launch_browser(visible: bool) -> AppResult<(Browser, Page)> {
    info!("🚀 启动浏览器 (可见模式: {})...", visible);

    let mut builder = BrowserConfig::builder().args(vec![
        "--no-sandbox",            // 容器环境下沙盒会导致启动失败
        "--disable-dev-shm-usage", // 防止共享内存不足
    ]);
    if visible {
        builder = builder.with_head();
    }

    let config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        AppError::Browser(BrowserError::Configuration { reason: e })
    })?;

    // 启动浏览器
    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AppError::Browser(BrowserError::Launch { source: e })
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        AppError::Browser(BrowserError::PageCreation { source: e })
    })?;

    info!("✅ 浏览器就绪");

    Ok((browser, page))
}
