//! 课程平台客户端层
//!
//! [`LessonApi`] 是 runner 对外部站点的唯一接口：浏览器实现
//! ([`LessonClient`]) 负责真实导航和页面内请求，测试里用脚本化
//! 实现替代，runner 对两者一视同仁。

pub mod lesson_client;

pub use lesson_client::LessonClient;

use crate::error::AppResult;
use crate::infrastructure::ApiResponse;

/// 课程平台交互能力
///
/// 所有方法都可能因导航 / 网络问题返回错误；非 2xx 响应不算错误，
/// 由调用方检查 [`ApiResponse::is_success`]。
#[allow(async_fn_in_trait)]
pub trait LessonApi {
    /// 打开模块总览页并等待其稳定
    async fn open_module(&self, module_id: u32, settle_secs: u64) -> AppResult<()>;

    /// 浏览课程内容页：打开、等待、关闭
    async fn view_lesson(&self, lesson_id: u32, settle_secs: u64) -> AppResult<()>;

    /// 发送进度请求（标记全部内容单元已访问）
    async fn post_progress(&self, lesson_id: u32) -> AppResult<ApiResponse>;

    /// 发送首课请求（满分 + 完成 + 30 秒时长）
    async fn post_first_lesson(&self, lesson_id: u32) -> AppResult<ApiResponse>;

    /// 发送完成请求（课程状态置为 completed）
    async fn post_completion(&self, lesson_id: u32) -> AppResult<ApiResponse>;
}
