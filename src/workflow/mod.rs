pub mod events;
pub mod lesson_ctx;
pub mod lesson_flow;

pub use events::{LessonDisposition, RunEvent, RunObserver, TracingObserver};
pub use lesson_ctx::{LessonCtx, Phase};
pub use lesson_flow::{LessonFlow, LessonOutcome};
