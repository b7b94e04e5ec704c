//! 批量解锁 runner - 编排层
//!
//! ## 职责
//!
//! 本模块持有两阶段工作列表并驱动整个解锁流程：
//!
//! 1. **阶段一**：按计划顺序逐模块处理常规课程
//! 2. **重试轮**：首轮失败的课程在阶段一结束后统一重试一次
//! 3. **阶段二**：处理每个模块的收尾课程
//! 4. **计数统计**：所有计数器只在这里修改
//!
//! ## 设计特点
//!
//! - 严格串行：同一时刻只有一个在途请求
//! - 课程边界统一兜错：导航 / 网络错误与非 2xx 响应走同一条
//!   "计失败、进台账、重新导航"路径
//! - 失败不重试第二次：重试轮之后的失败是永久失败

use tokio::time::{sleep, Duration};
use tracing::warn;

use crate::clients::LessonApi;
use crate::config::Config;
use crate::models::counters::{PhaseCounters, RunReport};
use crate::models::plan::ModulePlan;
use crate::workflow::{
    LessonCtx, LessonDisposition, LessonFlow, LessonOutcome, Phase, RunEvent, RunObserver,
};

/// 首轮失败课程的台账：模块ID → 失败课程列表，保持插入顺序
type FailedLedger = Vec<(u32, Vec<u32>)>;

/// 批量解锁 runner
pub struct UnlockRunner<'a, A: LessonApi> {
    api: &'a A,
    config: &'a Config,
    observer: &'a dyn RunObserver,
}

impl<'a, A: LessonApi> UnlockRunner<'a, A> {
    /// 创建新的 runner
    pub fn new(api: &'a A, config: &'a Config, observer: &'a dyn RunObserver) -> Self {
        Self {
            api,
            config,
            observer,
        }
    }

    /// 执行整个解锁计划，返回两阶段的汇总报告
    ///
    /// 计划内的所有错误都被折叠进计数器，不会中断运行。
    pub async fn run(&self, plan: ModulePlan) -> RunReport {
        let split = plan.split_finals();
        let flow = LessonFlow::new(self.api, self.config);

        self.emit(RunEvent::RunStarted {
            module_total: split.regular.len(),
            regular_total: split.regular_count(),
            finals_total: split.finals.len(),
        });

        // ========== 阶段一：常规课程 ==========
        let mut regular = PhaseCounters::default();
        let mut ledger: FailedLedger = Vec::new();
        let regular_total = split.regular_count();

        for module in &split.regular {
            // 拆分后没有常规课程的模块整个跳过
            if module.lessons.is_empty() {
                continue;
            }

            self.emit(RunEvent::ModuleStarted {
                module_id: module.id,
                lesson_total: module.lessons.len(),
            });

            self.open_module_best_effort(module.id, self.config.page_settle_secs)
                .await;

            let mut failed_here: Vec<u32> = Vec::new();

            for (index, &lesson_id) in module.lessons.iter().enumerate() {
                regular.processed += 1;
                let ctx = LessonCtx::new(module.id, lesson_id, Phase::Regular, index == 0);

                match flow.run(&ctx, self.config.page_settle_secs).await {
                    Ok(LessonOutcome::Completed) => {
                        regular.successful += 1;
                        regular.completed_successful += 1;
                        self.emit_lesson(&ctx, LessonDisposition::Completed);
                        sleep(Duration::from_secs(self.config.lesson_throttle_secs)).await;
                    }
                    Ok(LessonOutcome::CompletionFailed) => {
                        regular.successful += 1;
                        regular.completed_failed += 1;
                        self.emit_lesson(&ctx, LessonDisposition::CompletionFailed);
                        sleep(Duration::from_secs(self.config.lesson_throttle_secs)).await;
                    }
                    Ok(LessonOutcome::ProgressFailed) => {
                        // 失败只进台账，留给重试轮，不在本轮原地重试
                        regular.failed += 1;
                        failed_here.push(lesson_id);
                        self.emit_lesson(&ctx, LessonDisposition::ProgressFailed);

                        sleep(Duration::from_secs(self.config.failure_backoff_secs)).await;
                        self.open_module_best_effort(module.id, self.config.renav_settle_secs)
                            .await;
                        sleep(Duration::from_secs(self.config.lesson_throttle_secs)).await;
                    }
                    Err(e) => {
                        warn!("{} 处理出错: {}", ctx, e);
                        regular.failed += 1;
                        failed_here.push(lesson_id);
                        self.emit_lesson(&ctx, LessonDisposition::Errored);

                        self.open_module_best_effort(module.id, self.config.renav_settle_secs)
                            .await;
                    }
                }

                if regular.processed % 10 == 0 {
                    self.emit(RunEvent::Heartbeat {
                        processed: regular.processed,
                        total: regular_total,
                        counters: regular,
                    });
                }
            }

            if !failed_here.is_empty() {
                ledger.push((module.id, failed_here));
            }
        }

        // ========== 重试轮：统一重试首轮失败的课程 ==========
        self.retry_pass(&flow, &ledger, &mut regular).await;

        self.emit(RunEvent::PhaseCompleted {
            phase: Phase::Regular,
            counters: regular,
        });

        // ========== 阶段二：收尾课程 ==========
        let mut finals = PhaseCounters::default();

        for &(module_id, lesson_id) in &split.finals {
            finals.processed += 1;
            let ctx = LessonCtx::new(module_id, lesson_id, Phase::Final, false);

            // 阶段二的模块导航是流程的一部分，失败即课程失败
            let result = match self
                .api
                .open_module(module_id, self.config.page_settle_secs)
                .await
            {
                Ok(()) => flow.run_final(&ctx).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(LessonOutcome::Completed) => {
                    finals.successful += 1;
                    finals.completed_successful += 1;
                    self.emit_lesson(&ctx, LessonDisposition::Completed);
                }
                Ok(LessonOutcome::CompletionFailed) => {
                    finals.successful += 1;
                    finals.completed_failed += 1;
                    self.emit_lesson(&ctx, LessonDisposition::CompletionFailed);
                }
                Ok(LessonOutcome::ProgressFailed) => {
                    finals.failed += 1;
                    self.emit_lesson(&ctx, LessonDisposition::ProgressFailed);
                }
                Err(e) => {
                    warn!("{} 处理出错: {}", ctx, e);
                    finals.failed += 1;
                    self.emit_lesson(&ctx, LessonDisposition::Errored);
                }
            }

            sleep(Duration::from_secs(self.config.module_done_delay_secs)).await;
        }

        self.emit(RunEvent::PhaseCompleted {
            phase: Phase::Final,
            counters: finals,
        });

        let report = RunReport { regular, finals };
        self.emit(RunEvent::RunCompleted { report });
        report
    }

    /// 重试轮：每个有失败记录的模块重新导航一次，逐课程再试一遍。
    /// 重试成功把 failed/successful 作为一个步骤一起修正；再次失败
    /// 只记录，不再重试。
    async fn retry_pass(
        &self,
        flow: &LessonFlow<'a, A>,
        ledger: &FailedLedger,
        counters: &mut PhaseCounters,
    ) {
        let retry_total: usize = ledger.iter().map(|(_, lessons)| lessons.len()).sum();
        if retry_total == 0 {
            return;
        }

        self.emit(RunEvent::RetryPassStarted {
            lesson_total: retry_total,
        });

        for (module_id, lesson_ids) in ledger {
            self.open_module_best_effort(*module_id, self.config.renav_settle_secs)
                .await;

            for &lesson_id in lesson_ids {
                let ctx = LessonCtx::new(*module_id, lesson_id, Phase::Retry, false);

                match flow.run(&ctx, self.config.retry_view_settle_secs).await {
                    Ok(LessonOutcome::Completed) => {
                        counters.resolve_retry();
                        counters.completed_successful += 1;
                        self.emit_lesson(&ctx, LessonDisposition::Completed);
                    }
                    Ok(LessonOutcome::CompletionFailed) => {
                        counters.resolve_retry();
                        counters.completed_failed += 1;
                        self.emit_lesson(&ctx, LessonDisposition::CompletionFailed);
                    }
                    Ok(LessonOutcome::ProgressFailed) => {
                        warn!("{} 重试仍失败，记为永久失败", ctx);
                        self.emit_lesson(&ctx, LessonDisposition::ProgressFailed);
                    }
                    Err(e) => {
                        warn!("{} 重试出错: {}", ctx, e);
                        self.emit_lesson(&ctx, LessonDisposition::Errored);
                    }
                }

                sleep(Duration::from_secs(self.config.retry_throttle_secs)).await;
            }
        }
    }

    /// 打开模块总览页；失败只记录，处理继续
    async fn open_module_best_effort(&self, module_id: u32, settle_secs: u64) {
        if let Err(e) = self.api.open_module(module_id, settle_secs).await {
            warn!("⚠️ 打开模块 {} 总览页失败（继续处理）: {}", module_id, e);
        }
    }

    fn emit(&self, event: RunEvent) {
        self.observer.on_event(&event);
    }

    fn emit_lesson(&self, ctx: &LessonCtx, disposition: LessonDisposition) {
        self.emit(RunEvent::LessonProcessed {
            module_id: ctx.module_id,
            lesson_id: ctx.lesson_id,
            phase: ctx.phase,
            disposition,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::infrastructure::ApiResponse;
    use crate::models::plan::ModuleLessons;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// 零延迟配置，测试里不等待
    fn test_config() -> Config {
        Config {
            page_settle_secs: 0,
            lesson_throttle_secs: 0,
            failure_backoff_secs: 0,
            renav_settle_secs: 0,
            retry_view_settle_secs: 0,
            retry_throttle_secs: 0,
            module_done_delay_secs: 0,
            ..Config::default()
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Call {
        OpenModule(u32),
        ViewLesson(u32),
        Progress(u32),
        FirstLesson(u32),
        Completion(u32),
    }

    /// 脚本化的课程平台：进度请求按预设状态序列应答，其余请求
    /// 固定返回 200，并录制全部调用
    struct ScriptedApi {
        progress_plan: Mutex<HashMap<u32, VecDeque<u16>>>,
        view_errors: Mutex<HashMap<u32, u32>>,
        fail_module_nav: bool,
        calls: Mutex<Vec<Call>>,
    }

    impl ScriptedApi {
        fn all_success() -> Self {
            Self {
                progress_plan: Mutex::new(HashMap::new()),
                view_errors: Mutex::new(HashMap::new()),
                fail_module_nav: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// 指定某节课程的进度响应序列；取尽后默认 200
        fn with_progress_statuses(lesson_id: u32, statuses: Vec<u16>) -> Self {
            let api = Self::all_success();
            api.progress_plan
                .lock()
                .unwrap()
                .insert(lesson_id, statuses.into());
            api
        }

        /// 指定某节课程的前 n 次浏览抛错
        fn with_view_errors(lesson_id: u32, times: u32) -> Self {
            let api = Self::all_success();
            api.view_errors.lock().unwrap().insert(lesson_id, times);
            api
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn count(&self, call: &Call) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
        }

        fn ok(status: u16) -> ApiResponse {
            ApiResponse {
                status,
                body: String::new(),
            }
        }
    }

    impl LessonApi for ScriptedApi {
        async fn open_module(&self, module_id: u32, _settle_secs: u64) -> AppResult<()> {
            self.record(Call::OpenModule(module_id));
            if self.fail_module_nav {
                return Err(AppError::api_request_failed(
                    format!("/modules/{}", module_id),
                    "模拟导航失败",
                ));
            }
            Ok(())
        }

        async fn view_lesson(&self, lesson_id: u32, _settle_secs: u64) -> AppResult<()> {
            self.record(Call::ViewLesson(lesson_id));
            let mut errors = self.view_errors.lock().unwrap();
            if let Some(remaining) = errors.get_mut(&lesson_id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(AppError::Other(format!("模拟浏览课程 {} 失败", lesson_id)));
                }
            }
            Ok(())
        }

        async fn post_progress(&self, lesson_id: u32) -> AppResult<ApiResponse> {
            self.record(Call::Progress(lesson_id));
            let mut plan = self.progress_plan.lock().unwrap();
            let status = plan
                .get_mut(&lesson_id)
                .and_then(|queue| queue.pop_front())
                .unwrap_or(200);
            Ok(Self::ok(status))
        }

        async fn post_first_lesson(&self, lesson_id: u32) -> AppResult<ApiResponse> {
            self.record(Call::FirstLesson(lesson_id));
            Ok(Self::ok(200))
        }

        async fn post_completion(&self, lesson_id: u32) -> AppResult<ApiResponse> {
            self.record(Call::Completion(lesson_id));
            Ok(Self::ok(200))
        }
    }

    /// 录制事件的观察者
    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<RunEvent>>,
    }

    impl RunObserver for RecordingObserver {
        fn on_event(&self, event: &RunEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    impl RecordingObserver {
        fn lesson_events(&self) -> Vec<(u32, Phase, LessonDisposition)> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    RunEvent::LessonProcessed {
                        lesson_id,
                        phase,
                        disposition,
                        ..
                    } => Some((*lesson_id, *phase, *disposition)),
                    _ => None,
                })
                .collect()
        }
    }

    fn plan_m1() -> ModulePlan {
        ModulePlan::new(vec![ModuleLessons {
            id: 1,
            lessons: vec![10, 11, 12],
        }])
    }

    async fn run_with(api: &ScriptedApi, plan: ModulePlan) -> (RunReport, RecordingObserver) {
        let config = test_config();
        let observer = RecordingObserver::default();
        let report = {
            let runner = UnlockRunner::new(api, &config, &observer);
            runner.run(plan).await
        };
        (report, observer)
    }

    #[tokio::test]
    async fn test_all_success_scenario() {
        let api = ScriptedApi::all_success();

        let (report, _) = run_with(&api, plan_m1()).await;

        let totals = report.totals();
        assert_eq!(totals.successful, 3);
        assert_eq!(totals.failed, 0);
        assert_eq!(totals.completed_successful, 3);
        assert_eq!(totals.completed_failed, 0);

        // 课程 12 留到阶段二，阶段一只处理 10 和 11
        assert_eq!(report.regular.processed, 2);
        assert_eq!(report.finals.processed, 1);

        // 只有首节课程 10 收到首课附加请求；12 的是阶段二的收尾补发
        assert_eq!(api.count(&Call::FirstLesson(10)), 1);
        assert_eq!(api.count(&Call::FirstLesson(11)), 0);
        assert_eq!(api.count(&Call::FirstLesson(12)), 1);
    }

    #[tokio::test]
    async fn test_failed_lesson_resolved_by_retry_pass() {
        let api = ScriptedApi::with_progress_statuses(11, vec![500, 200]);

        let (report, observer) = run_with(&api, plan_m1()).await;

        let totals = report.totals();
        assert_eq!(totals.successful, 3);
        assert_eq!(totals.failed, 0);
        assert_eq!(totals.completed_successful, 3);

        // 失败不在本轮原地重试：重试轮里恰好补一次
        assert_eq!(api.count(&Call::Progress(11)), 2);

        // 首轮失败 + 重试成功各记录一次
        let events_for_11 = observer
            .lesson_events()
            .into_iter()
            .filter(|(id, _, _)| *id == 11)
            .collect::<Vec<_>>();
        assert_eq!(
            events_for_11,
            vec![
                (11, Phase::Regular, LessonDisposition::ProgressFailed),
                (11, Phase::Retry, LessonDisposition::Completed),
            ]
        );

        // 初次导航 + 失败后重新导航 + 重试轮导航 + 阶段二导航
        assert_eq!(api.count(&Call::OpenModule(1)), 4);
    }

    #[tokio::test]
    async fn test_lesson_failing_twice_is_permanent() {
        let api = ScriptedApi::with_progress_statuses(11, vec![500, 500]);

        let (report, _) = run_with(&api, plan_m1()).await;

        let totals = report.totals();
        assert_eq!(totals.successful, 2);
        assert_eq!(totals.failed, 1);
        assert_eq!(totals.completed_successful, 2);

        // 每节课最多一次延迟重试，之后不再尝试
        assert_eq!(api.count(&Call::Progress(11)), 2);
        // 失败的课程不发完成请求
        assert_eq!(api.count(&Call::Completion(11)), 0);
    }

    #[tokio::test]
    async fn test_view_error_goes_through_same_retry_path() {
        let api = ScriptedApi::with_view_errors(11, 1);

        let (report, observer) = run_with(&api, plan_m1()).await;

        // 浏览失败与 API 失败不区分：同样进台账、同样重试成功
        let totals = report.totals();
        assert_eq!(totals.successful, 3);
        assert_eq!(totals.failed, 0);

        let events_for_11 = observer
            .lesson_events()
            .into_iter()
            .filter(|(id, _, _)| *id == 11)
            .collect::<Vec<_>>();
        assert_eq!(
            events_for_11,
            vec![
                (11, Phase::Regular, LessonDisposition::Errored),
                (11, Phase::Retry, LessonDisposition::Completed),
            ]
        );
    }

    #[tokio::test]
    async fn test_single_lesson_module_runs_only_in_phase_two() {
        let api = ScriptedApi::all_success();
        let plan = ModulePlan::new(vec![ModuleLessons {
            id: 7,
            lessons: vec![99],
        }]);

        let (report, _) = run_with(&api, plan).await;

        assert_eq!(report.regular.processed, 0);
        assert_eq!(report.finals.processed, 1);
        assert_eq!(report.totals().successful, 1);

        // 阶段一整个跳过，连模块导航都不做；阶段二导航一次
        assert_eq!(api.count(&Call::OpenModule(7)), 1);
    }

    #[tokio::test]
    async fn test_first_lesson_extra_call_once_per_module() {
        let api = ScriptedApi::all_success();
        let plan = ModulePlan::new(vec![
            ModuleLessons {
                id: 1,
                lessons: vec![10, 11, 12],
            },
            ModuleLessons {
                id: 2,
                lessons: vec![20, 21, 22],
            },
        ]);

        let _ = run_with(&api, plan).await;

        assert_eq!(api.count(&Call::FirstLesson(10)), 1);
        assert_eq!(api.count(&Call::FirstLesson(20)), 1);
        assert_eq!(api.count(&Call::FirstLesson(11)), 0);
        assert_eq!(api.count(&Call::FirstLesson(21)), 0);
    }

    #[tokio::test]
    async fn test_every_lesson_settles_exactly_once() {
        // 11 永久失败、21 重试成功，其余一次通过
        let api = ScriptedApi::all_success();
        {
            let mut plan = api.progress_plan.lock().unwrap();
            plan.insert(11, vec![500, 500].into());
            plan.insert(21, vec![500, 200].into());
        }
        let plan = ModulePlan::new(vec![
            ModuleLessons {
                id: 1,
                lessons: vec![10, 11, 12],
            },
            ModuleLessons {
                id: 2,
                lessons: vec![20, 21, 22],
            },
        ]);
        let total_lessons = plan.lesson_count();

        let (report, observer) = run_with(&api, plan).await;

        // 首轮事件（常规 + 收尾）覆盖每节课恰好一次
        let first_round: Vec<u32> = observer
            .lesson_events()
            .into_iter()
            .filter(|(_, phase, _)| *phase != Phase::Retry)
            .map(|(id, _, _)| id)
            .collect();
        let mut sorted = first_round.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(first_round.len(), total_lessons);
        assert_eq!(sorted.len(), total_lessons);

        // 重试后每节失败课程归入成功或永久失败，二者只居其一
        let totals = report.totals();
        assert_eq!(totals.successful + totals.failed, total_lessons);
        assert_eq!(totals.successful, 5);
        assert_eq!(totals.failed, 1);
    }

    #[tokio::test]
    async fn test_final_lesson_retries_in_place_once() {
        let api = ScriptedApi::with_progress_statuses(12, vec![500, 200]);

        let (report, _) = run_with(&api, plan_m1()).await;

        assert_eq!(report.finals.successful, 1);
        assert_eq!(report.finals.failed, 0);
        // 原地重试：浏览和进度各两次，模块导航不重复
        assert_eq!(api.count(&Call::Progress(12)), 2);
        assert_eq!(api.count(&Call::ViewLesson(12)), 2);
        assert_eq!(api.count(&Call::OpenModule(1)), 2);
        // 成功后才补发收尾的首课请求
        assert_eq!(api.count(&Call::FirstLesson(12)), 1);
    }

    #[tokio::test]
    async fn test_final_lesson_double_failure_is_final() {
        let api = ScriptedApi::with_progress_statuses(12, vec![500, 500]);

        let (report, _) = run_with(&api, plan_m1()).await;

        assert_eq!(report.finals.successful, 0);
        assert_eq!(report.finals.failed, 1);
        assert_eq!(api.count(&Call::Progress(12)), 2);
        assert_eq!(api.count(&Call::Completion(12)), 0);
        assert_eq!(api.count(&Call::FirstLesson(12)), 0);
    }

    #[tokio::test]
    async fn test_module_nav_failure_fatal_only_in_phase_two() {
        let mut api = ScriptedApi::all_success();
        api.fail_module_nav = true;

        let (report, _) = run_with(&api, plan_m1()).await;

        // 阶段一导航失败只是尽力而为，课程照常处理
        assert_eq!(report.regular.successful, 2);
        assert_eq!(report.regular.failed, 0);
        // 阶段二导航失败则课程计为失败
        assert_eq!(report.finals.failed, 1);
        assert_eq!(report.finals.successful, 0);
    }
}
