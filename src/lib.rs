//! # Lesson Unlocker
//!
//! 自动完成在线课程解锁的 Rust 应用程序：登录站点、捕获 XSRF
//! token，然后按计划批量调用课程 API 标记"已浏览"和"已完成"。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Browser / Page / token），只暴露能力
//! - `ApiSession` - 唯一的会话 owner，提供绑定登录态的 get / post 能力
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - 描述"我能对课程平台做什么"，只处理单次交互
//! - `LessonApi` - runner 与外部站点之间的唯一接口
//! - `LessonClient` - 浏览器实现：导航、课程浏览、三种固定请求体
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一节课"的完整处理流程
//! - `LessonCtx` - 上下文封装（模块 + 课程 + 阶段）
//! - `LessonFlow` - 流程编排（浏览 → 进度 → 首课附加 → 完成）
//! - `RunObserver` - 运行事件的观察者接口
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/unlock_runner` - 批量解锁 runner：两阶段工作
//!   列表、失败台账、重试轮和全部计数器
//! - `orchestrator/app` - 应用入口：初始化、登录、探测、收尾
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod login;
pub mod models;
pub mod orchestrator;
pub mod workflow;

// 重新导出常用类型
pub use clients::{LessonApi, LessonClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ApiResponse, ApiSession};
pub use models::{ModuleLessons, ModulePlan, PhaseCounters, RunReport};
pub use orchestrator::{App, UnlockRunner};
pub use workflow::{LessonCtx, LessonFlow, LessonOutcome, Phase, RunEvent, RunObserver, TracingObserver};
