// src/types/mod.rs
pub mod bundle;
pub mod job_intel;
pub mod resume;
pub mod score;
pub mod tracker;

pub use bundle::{JobRequest, OutputBundle, PipelineOutcome};
pub use job_intel::JobIntel;
pub use resume::{CoverLetter, Evidence, RequirementEvidence, ResumeDocument, TailoredResume};
pub use score::{DiffOp, ScoreReport};
pub use tracker::TrackerRow;
