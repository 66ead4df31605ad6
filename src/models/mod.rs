pub mod details;
pub mod form;
pub mod loaders;
pub mod request;
pub mod upload;

pub use details::{
    AiInsights, AnalysisResult, AuditLog, ChangeDocLog, RequestDetails, RiskLevel,
    TransactionUsage,
};
pub use form::{RequestForm, Submission};
pub use loaders::{load_all_submissions, load_artifact, load_toml_to_submission};
pub use request::{ClientName, Request, RequestPayload, RequestSummary, TargetSystem};
pub use upload::{
    Attachments, FileUploadResponse, LogArtifact, LogKind, UploadStatistics, UploadStats,
};
