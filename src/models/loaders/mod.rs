pub mod plan_loader;

pub use plan_loader::load_plan_from_toml;
