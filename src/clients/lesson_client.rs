//! 课程 API 客户端
//!
//! 基于已认证会话实现 [`LessonApi`]：模块导航、课程浏览和三种
//! 固定请求体的提交，另带一次性的 campaign 状态探测。

use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::clients::LessonApi;
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{ApiResponse, ApiSession};
use crate::models::payloads;

/// 浏览器实现的课程平台客户端
pub struct LessonClient {
    session: ApiSession,
    config: Config,
}

impl LessonClient {
    /// 创建新的课程客户端
    pub fn new(session: ApiSession, config: &Config) -> Self {
        Self {
            session,
            config: config.clone(),
        }
    }

    /// campaign 状态探测（运行前执行一次）
    pub async fn campaign_status(&self) -> AppResult<ApiResponse> {
        self.session.get(&self.config.campaign_status_url()).await
    }

    /// 消费客户端并关闭浏览器
    pub async fn shutdown(self) -> AppResult<()> {
        self.session.close().await
    }
}

impl LessonApi for LessonClient {
    async fn open_module(&self, module_id: u32, settle_secs: u64) -> AppResult<()> {
        let url = self.config.module_url(module_id);
        debug!("导航到模块页: {}", url);

        self.session.goto(&url).await?;
        sleep(Duration::from_secs(settle_secs)).await;
        Ok(())
    }

    async fn view_lesson(&self, lesson_id: u32, settle_secs: u64) -> AppResult<()> {
        let url = self.config.lesson_url(lesson_id);
        debug!("打开课程页: {}", url);

        // 用独立页面浏览课程，主页面保持在模块总览上
        let lesson_page = self.session.open_page(&url).await?;
        sleep(Duration::from_secs(settle_secs)).await;

        if let Err(e) = lesson_page.close().await {
            debug!("关闭课程页失败（忽略）: {}", e);
        }
        Ok(())
    }

    async fn post_progress(&self, lesson_id: u32) -> AppResult<ApiResponse> {
        self.session
            .post_json(
                &self.config.lesson_api_url(lesson_id),
                &payloads::progress_payload(),
            )
            .await
    }

    async fn post_first_lesson(&self, lesson_id: u32) -> AppResult<ApiResponse> {
        self.session
            .post_json(
                &self.config.lesson_api_url(lesson_id),
                &payloads::first_lesson_payload(),
            )
            .await
    }

    async fn post_completion(&self, lesson_id: u32) -> AppResult<ApiResponse> {
        self.session
            .post_json(
                &self.config.lesson_api_url(lesson_id),
                &payloads::completion_payload(),
            )
            .await
    }
}
