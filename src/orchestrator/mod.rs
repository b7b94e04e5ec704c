pub mod app;
pub mod unlock_runner;

pub use app::App;
pub use unlock_runner::UnlockRunner;
