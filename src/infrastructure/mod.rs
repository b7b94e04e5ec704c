pub mod session;

pub use session::{ApiResponse, ApiSession};
