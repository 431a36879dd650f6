// src/job_intel/job_scraper.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::core::config_manager::FetchConfig;

/// Network collaborator: raw HTML for a URL, or an error. No retries.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

/// Title, company, location and description lifted from a job page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
}

impl JobPosting {
    /// Posting pasted as plain text: the first non-empty line is the title.
    pub fn from_text(text: &str) -> Self {
        let title = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .chars()
            .take(120)
            .collect();

        Self {
            title,
            company: String::new(),
            location: String::new(),
            description: text.to_string(),
        }
    }

    /// Text handed to the extractor: title line first, then the description.
    pub fn full_text(&self) -> String {
        if self.title.is_empty() || self.description.trim_start().starts_with(&self.title) {
            self.description.clone()
        } else {
            format!("{}\n{}", self.title, self.description)
        }
    }
}

pub struct JobScraper {
    client: Client,
}

impl JobScraper {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Reduce a job page to a [`JobPosting`], trying job-board selectors
    /// before generic ones.
    pub fn parse_posting(html: &str) -> Option<JobPosting> {
        let document = Html::parse_document(html);
        Self::parse_linkedin_job(&document).or_else(|| Self::parse_generic_job(&document))
    }

    fn parse_linkedin_job(document: &Html) -> Option<JobPosting> {
        let title_selectors = [
            "h1.top-card-layout__title",
            ".job-details-jobs-unified-top-card__job-title",
            "h1[data-test-id='job-title']",
        ];

        let company_selectors = [
            ".job-details-jobs-unified-top-card__company-name",
            ".top-card-layout__card .top-card-layout__second-subline",
            "a[data-test-id='job-poster-name']",
        ];

        let description_selectors = [
            ".jobs-box__html-content",
            ".jobs-description__container",
            ".jobs-description-content__text",
            "[data-test-id='job-description']",
        ];

        let location_selectors = [
            ".job-details-jobs-unified-top-card__bullet",
            "[data-test-id='job-location']",
        ];

        let title = Self::find_text_by_selectors(document, &title_selectors)?;
        let description = Self::find_block_by_selectors(document, &description_selectors)?;

        Some(JobPosting {
            title,
            company: Self::find_text_by_selectors(document, &company_selectors).unwrap_or_default(),
            location: Self::find_text_by_selectors(document, &location_selectors)
                .unwrap_or_default(),
            description,
        })
    }

    fn parse_generic_job(document: &Html) -> Option<JobPosting> {
        warn!("Falling back to generic job parsing");

        let title_selectors = ["h1", "[class*='job-title']", "[class*='title']", "title"];

        let company_selectors = [
            "[class*='company']",
            "[class*='employer']",
            "[class*='organization']",
        ];

        let location_selectors = ["[class*='location']"];

        let description_selectors = [
            "[class*='description']",
            "[class*='content']",
            "[class*='details']",
            "main",
            "article",
            "body",
        ];

        let title = Self::find_text_by_selectors(document, &title_selectors)?;
        let description = Self::find_block_by_selectors(document, &description_selectors)?;

        Some(JobPosting {
            title,
            company: Self::find_text_by_selectors(document, &company_selectors).unwrap_or_default(),
            location: Self::find_text_by_selectors(document, &location_selectors)
                .unwrap_or_default(),
            description,
        })
    }

    fn find_text_by_selectors(document: &Html, selectors: &[&str]) -> Option<String> {
        for selector_str in selectors {
            if let Ok(selector) = Selector::parse(selector_str) {
                if let Some(element) = document.select(&selector).next() {
                    let text = Self::clean_text(&element.text().collect::<Vec<_>>().join(" "));
                    if text.len() > 1 {
                        return Some(text);
                    }
                }
            }
        }
        None
    }

    /// Like [`Self::find_text_by_selectors`] but keeps one line per text node,
    /// so bullet lists and section headers survive for the extractor.
    fn find_block_by_selectors(document: &Html, selectors: &[&str]) -> Option<String> {
        for selector_str in selectors {
            if let Ok(selector) = Selector::parse(selector_str) {
                if let Some(element) = document.select(&selector).next() {
                    let lines: Vec<String> = element
                        .text()
                        .map(Self::clean_text)
                        .filter(|line| !line.is_empty())
                        .collect();
                    let block = lines.join("\n");
                    if block.len() > 20 {
                        return Some(block);
                    }
                }
            }
        }
        None
    }

    fn clean_text(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[async_trait]
impl PageFetcher for JobScraper {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        info!("Fetching job post: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch job post")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        let html = response
            .text()
            .await
            .context("Failed to read response body")?;

        info!("Fetched {} bytes from {}", html.len(), url);
        Ok(html)
    }
}
