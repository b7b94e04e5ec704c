//! 运行事件与观察者
//!
//! runner 自己不打印任何东西，所有进度都通过 [`RunObserver`] 发出：
//! CLI 挂一个 tracing 实现，测试挂一个录制实现。

use tracing::{info, warn};

use crate::models::counters::{PhaseCounters, RunReport};
use crate::workflow::lesson_ctx::Phase;

/// 单节课程的最终处置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LessonDisposition {
    /// 进度和完成请求都成功
    Completed,
    /// 进度成功但完成请求失败（解锁仍算成功）
    CompletionFailed,
    /// 进度请求返回非 2xx
    ProgressFailed,
    /// 处理过程中抛出了错误（导航 / 网络）
    Errored,
}

/// 运行期间发出的事件
#[derive(Clone, Debug)]
pub enum RunEvent {
    /// 运行开始：拆分后的工作量
    RunStarted {
        module_total: usize,
        regular_total: usize,
        finals_total: usize,
    },
    /// 开始处理一个模块的常规课程
    ModuleStarted { module_id: u32, lesson_total: usize },
    /// 一节课程处理完毕
    LessonProcessed {
        module_id: u32,
        lesson_id: u32,
        phase: Phase,
        disposition: LessonDisposition,
    },
    /// 阶段一每处理 10 节课的进度汇报
    Heartbeat {
        processed: usize,
        total: usize,
        counters: PhaseCounters,
    },
    /// 重试轮开始
    RetryPassStarted { lesson_total: usize },
    /// 一个阶段结束（重试轮结果并入阶段一）
    PhaseCompleted { phase: Phase, counters: PhaseCounters },
    /// 整个运行结束
    RunCompleted { report: RunReport },
}

/// 运行观察者
pub trait RunObserver {
    fn on_event(&self, event: &RunEvent);
}

/// 把事件写到 tracing 日志的观察者
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::RunStarted {
                module_total,
                regular_total,
                finals_total,
            } => {
                info!("{}", "=".repeat(60));
                info!(
                    "开始处理 {} 个模块的 {} 节常规课程",
                    module_total, regular_total
                );
                info!("📌 收尾课程 {} 节将在阶段二处理", finals_total);
                info!("{}", "=".repeat(60));
            }
            RunEvent::ModuleStarted {
                module_id,
                lesson_total,
            } => {
                info!("\n{}", "─".repeat(60));
                info!("📦 处理模块 {}（{} 节常规课程）", module_id, lesson_total);
                info!("{}", "─".repeat(60));
            }
            RunEvent::LessonProcessed {
                module_id,
                lesson_id,
                phase,
                disposition,
            } => match disposition {
                LessonDisposition::Completed => {
                    info!("✅ 课程 {} (模块 {}, {}): 解锁并完成", lesson_id, module_id, phase);
                }
                LessonDisposition::CompletionFailed => {
                    warn!(
                        "⚠️ 课程 {} (模块 {}, {}): 已解锁，但完成请求失败",
                        lesson_id, module_id, phase
                    );
                }
                LessonDisposition::ProgressFailed => {
                    warn!("❌ 课程 {} (模块 {}, {}): 进度请求失败", lesson_id, module_id, phase);
                }
                LessonDisposition::Errored => {
                    warn!("❌ 课程 {} (模块 {}, {}): 处理出错", lesson_id, module_id, phase);
                }
            },
            RunEvent::Heartbeat {
                processed,
                total,
                counters,
            } => {
                info!(
                    "进度: {}/{} 节课程已处理（成功 {}, 失败 {}）",
                    processed, total, counters.successful, counters.failed
                );
                info!(
                    "完成状态: {} 节已标记完成, {} 节完成请求失败",
                    counters.completed_successful, counters.completed_failed
                );
            }
            RunEvent::RetryPassStarted { lesson_total } => {
                info!("\n{}", "─".repeat(60));
                info!("🔁 {} 节课程首轮失败，使用更长延迟重试...", lesson_total);
                info!("{}", "─".repeat(60));
            }
            RunEvent::PhaseCompleted { phase, counters } => {
                info!("\n{}", "─".repeat(60));
                info!(
                    "✓ {}阶段完成: 成功 {}, 失败 {} / 共 {} 节",
                    phase, counters.successful, counters.failed, counters.processed
                );
                info!(
                    "完成状态: {} 节已标记完成, {} 节完成请求失败",
                    counters.completed_successful, counters.completed_failed
                );
                info!("{}", "─".repeat(60));
            }
            RunEvent::RunCompleted { report } => {
                let totals = report.totals();
                info!(
                    "\n✅ 运行结束: 解锁成功 {}, 失败 {}",
                    totals.successful, totals.failed
                );
            }
        }
    }
}
