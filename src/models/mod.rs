pub mod counters;
pub mod loaders;
pub mod payloads;
pub mod plan;

pub use counters::{PhaseCounters, RunReport};
pub use loaders::load_plan_from_toml;
pub use plan::{ModuleLessons, ModulePlan, SplitPlan};
