pub mod cli;
pub mod controller;
pub mod core;
pub mod cover_letter;
pub mod error;
pub mod job_intel;
pub mod latex;
pub mod scoring;
pub mod tailor;
pub mod tracker;
pub mod types;
pub mod utils;

pub use controller::Controller;
pub use error::{PipelineError, Stage};
pub use types::{JobRequest, OutputBundle, PipelineOutcome};
