pub mod execution_events;
pub mod logger;

pub use execution_events::log_step;
pub use logger::init_logger;
