//! 课程处理流程 - 流程层
//!
//! 定义"一节课"的完整处理顺序：浏览内容页 → 进度请求 →（首课
//! 附加请求）→ 完成请求。阶段二的收尾课程带一次原地重试。
//!
//! 流程只负责调用顺序和结果判定，不触碰任何计数器——计数全部
//! 由 runner 完成。

use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::clients::LessonApi;
use crate::config::Config;
use crate::error::AppResult;
use crate::workflow::lesson_ctx::LessonCtx;

/// 单节课程的流程结果
///
/// 完成请求失败不影响解锁本身，所以单独成一档。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LessonOutcome {
    /// 进度和完成请求都成功
    Completed,
    /// 进度成功，完成请求失败
    CompletionFailed,
    /// 进度请求返回非 2xx
    ProgressFailed,
}

/// 课程处理流程
pub struct LessonFlow<'a, A: LessonApi> {
    api: &'a A,
    config: &'a Config,
}

impl<'a, A: LessonApi> LessonFlow<'a, A> {
    /// 创建新的课程流程
    pub fn new(api: &'a A, config: &'a Config) -> Self {
        Self { api, config }
    }

    /// 常规 / 重试流程
    ///
    /// 首课的附加请求在进度请求之后、判定其结果之前发出，附加
    /// 请求的结果只记录日志，不参与成败判定。
    pub async fn run(&self, ctx: &LessonCtx, view_settle_secs: u64) -> AppResult<LessonOutcome> {
        self.api.view_lesson(ctx.lesson_id, view_settle_secs).await?;

        let progress = self.api.post_progress(ctx.lesson_id).await?;

        if ctx.is_first {
            info!("{} 模块首课，发送附加请求", ctx);
            self.send_first_lesson_extra(ctx).await;
            sleep(Duration::from_secs(self.config.lesson_throttle_secs)).await;
        }

        if !progress.is_success() {
            warn!(
                "{} 进度请求失败 ({}): {}",
                ctx,
                progress.status,
                progress.body_preview()
            );
            return Ok(LessonOutcome::ProgressFailed);
        }

        info!("{} 进度请求成功", ctx);
        Ok(self.complete(ctx).await)
    }

    /// 收尾课程流程（阶段二）
    ///
    /// 进度请求失败时退避后把浏览 + 进度原地重做一次；最终成功的
    /// 话在完成请求成功后再补发一次首课请求作为收尾。
    pub async fn run_final(&self, ctx: &LessonCtx) -> AppResult<LessonOutcome> {
        self.api
            .view_lesson(ctx.lesson_id, self.config.retry_view_settle_secs)
            .await?;

        let mut progress = self.api.post_progress(ctx.lesson_id).await?;

        if !progress.is_success() {
            warn!(
                "{} 进度请求失败 ({})，退避后重试一次...",
                ctx, progress.status
            );
            sleep(Duration::from_secs(self.config.failure_backoff_secs)).await;

            self.api
                .view_lesson(ctx.lesson_id, self.config.retry_view_settle_secs)
                .await?;
            progress = self.api.post_progress(ctx.lesson_id).await?;
        }

        if !progress.is_success() {
            warn!(
                "{} 重试后进度请求仍失败 ({}): {}",
                ctx,
                progress.status,
                progress.body_preview()
            );
            return Ok(LessonOutcome::ProgressFailed);
        }

        info!("{} 进度请求成功", ctx);
        let outcome = self.complete(ctx).await;

        if outcome == LessonOutcome::Completed {
            info!("{} 补发收尾的首课请求", ctx);
            self.send_first_lesson_extra(ctx).await;
        }

        Ok(outcome)
    }

    // ========== 内部步骤 ==========

    /// 发送完成请求；它的失败不推翻已经成功的解锁
    async fn complete(&self, ctx: &LessonCtx) -> LessonOutcome {
        match self.api.post_completion(ctx.lesson_id).await {
            Ok(resp) if resp.is_success() => {
                info!("{} 已标记为完成", ctx);
                LessonOutcome::Completed
            }
            Ok(resp) => {
                warn!(
                    "{} 完成请求失败 ({}): {}",
                    ctx,
                    resp.status,
                    resp.body_preview()
                );
                LessonOutcome::CompletionFailed
            }
            Err(e) => {
                warn!("{} 完成请求出错: {}", ctx, e);
                LessonOutcome::CompletionFailed
            }
        }
    }

    /// 首课附加请求，结果仅记录日志
    async fn send_first_lesson_extra(&self, ctx: &LessonCtx) {
        match self.api.post_first_lesson(ctx.lesson_id).await {
            Ok(resp) if resp.is_success() => {
                info!("{} 首课请求成功", ctx);
            }
            Ok(resp) => {
                warn!(
                    "{} 首课请求失败 ({}): {}",
                    ctx,
                    resp.status,
                    resp.body_preview()
                );
            }
            Err(e) => {
                warn!("{} 首课请求出错: {}", ctx, e);
            }
        }
    }
}
