pub mod notice;
pub mod step;
pub mod submission_ctx;
pub mod submission_flow;

pub use notice::{Notice, NoticeLevel};
pub use step::{
    Decision, Guard, OnUnmet, Precondition, StepBoard, StepId, StepSpec, StepStatus,
    SUBMISSION_PLAN, WARN_ANALYSIS_SKIPPED, WARN_CDPOS_CDHDR_FAILED, WARN_CDPOS_NO_CDHDR,
};
pub use submission_ctx::SubmissionCtx;
pub use submission_flow::{SubmissionFlow, SubmissionReport};
