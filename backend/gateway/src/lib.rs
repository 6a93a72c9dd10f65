pub mod analyze_api;
pub mod error;
pub mod health_api;
pub mod prescription_api;
pub mod quality_api;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, start_server, AppState};
