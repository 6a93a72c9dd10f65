pub mod error;
pub mod gateway;
pub mod normalize;
pub mod prompts;
pub mod providers;
pub mod quality;

pub use error::ExtractionError;
pub use gateway::{Extracted, ExtractionConfig, ExtractionGateway};
pub use quality::{assess_quality, QualityReport};
