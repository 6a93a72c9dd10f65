pub mod execution;
pub mod plan;
pub mod response;
pub mod traits;
pub mod types;

pub use execution::{ExecutionLog, ExecutionLogEntry, ExecutionReport, RunState, StepOutcome};
pub use plan::{ActionKind, ActionPlan, ActionStep, PlanViolation};
pub use response::{AnalyzeResponse, ResponseStatus};
pub use traits::{
    CapabilityResponse, PlanCapabilityRequest, PlanProvider, VisionProvider, VisionRequest,
};
pub use types::{
    ExtractedRecord, Extraction, ExtractionHint, Position, UIElement, UISchema,
};
