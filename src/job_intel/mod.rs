// src/job_intel/mod.rs
//! Job posting acquisition (fetch + HTML reduction) and heuristic extraction

pub mod extractor;
pub mod job_scraper;

pub use extractor::{extract_job_intel, requirement_terms, ExtractionContext};
pub use job_scraper::{JobPosting, JobScraper, PageFetcher};
