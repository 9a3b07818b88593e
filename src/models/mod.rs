pub mod call;
pub mod call_detail;
pub mod session;
pub mod symptom;

pub use call::{
    CallEvent, CallSession, CallState, PipelineReport, PipelineStep, ProviderEvent, StartedCall,
    StepFailure,
};
pub use call_detail::{
    CallAnalysis, CallDetail, HealthAlerts, SummaryEntry, SummaryRecord, SymptomReport,
};
pub use session::SessionContext;
pub use symptom::{Severity, Symptom, SymptomObservation};
