//! PDF medical records → plain-language health summary
//!
//! Text is extracted from each uploaded PDF, combined into a bounded prompt,
//! and sent to an OpenAI-compatible chat-completions API. Without an API key
//! (or when every candidate model fails) a keyword-scan placeholder summary
//! is returned instead, so the endpoint degrades rather than erroring.

mod client;
mod extract;

pub use client::SummaryClient;
pub use extract::extract_pdf_text;

use crate::config::SummaryConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome of a summarization request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    /// Model that produced the summary, or "placeholder"
    pub model: String,
    /// Failure note carried alongside a placeholder summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub struct Summarizer {
    client: SummaryClient,
    max_prompt_chars: usize,
}

impl Summarizer {
    pub fn new(config: &SummaryConfig) -> Self {
        Self {
            client: SummaryClient::new(config),
            max_prompt_chars: config.max_prompt_chars,
        }
    }

    /// Summarize a batch of uploaded PDF documents
    ///
    /// Files that yield no text are skipped, matching the tolerance of the
    /// upload flow; the call fails only when nothing readable remains.
    pub async fn summarize_pdfs(&self, documents: Vec<Vec<u8>>) -> Result<SummaryResult> {
        // PDF parsing is CPU-bound; keep it off the async workers
        let extracted: Vec<String> = tokio::task::spawn_blocking(move || {
            documents
                .iter()
                .map(|bytes| extract_pdf_text(bytes))
                .filter(|text| !text.trim().is_empty())
                .collect()
        })
        .await?;

        if extracted.is_empty() {
            anyhow::bail!("no readable text was extracted from the uploaded PDFs");
        }

        let file_count = extracted.len();
        let combined = truncate_text(&extracted.join("\n\n"), self.max_prompt_chars);
        let prompt = build_prompt(&combined, file_count);

        match self.client.generate(&prompt).await {
            Ok((summary, model)) => {
                info!("Summary generated with model {}", model);
                Ok(SummaryResult {
                    summary,
                    model,
                    note: None,
                })
            }
            Err(e) => {
                warn!("Summarization API unavailable, using placeholder: {}", e);
                Ok(SummaryResult {
                    summary: placeholder_summary(&combined, file_count),
                    model: "placeholder".to_string(),
                    note: Some(e.to_string()),
                })
            }
        }
    }
}

fn build_prompt(combined: &str, file_count: usize) -> String {
    format!(
        "You are given text extracted from {file_count} PDF medical record(s).\n\
         Task: Write a concise, plain-language summary of the patient's health history for a general audience.\n\
         \n\
         Requirements:\n\
         - Use short paragraphs and bullet points where helpful.\n\
         - Summarize: key diagnoses, past procedures, medications (with doses if present), allergies, relevant labs/imaging, and follow-ups.\n\
         - Capture approximate timelines if clear (e.g., \"in 2021\", \"recently\").\n\
         - Avoid speculation; if unclear or conflicting, say that.\n\
         - Do not include personally identifiable information.\n\
         - Keep it under 350 words.\n\
         \n\
         Extracted text:\n\
         ---\n\
         {combined}\n\
         ---"
    )
}

/// Keep prompts bounded: head plus a short tail of the combined text
fn truncate_text(text: &str, max_chars: usize) -> String {
    const TAIL_CHARS: usize = 1000;

    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }

    let head: String = text.chars().take(max_chars.saturating_sub(TAIL_CHARS)).collect();
    let tail: String = text.chars().skip(total - TAIL_CHARS).collect();
    format!("{head}\n\n[...truncated...]\n\n{tail}")
}

/// Rough keyword-scan summary used when no API is available
fn placeholder_summary(combined: &str, file_count: usize) -> String {
    let sample: String = combined.chars().take(1200).collect();
    let lines: Vec<&str> = sample
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let grep = |keys: &[&str]| -> String {
        let hits: Vec<&str> = lines
            .iter()
            .filter(|line| {
                let low = line.to_lowercase();
                keys.iter().any(|k| low.contains(k))
            })
            .take(8)
            .copied()
            .collect();

        if hits.is_empty() {
            "- (none detected in sample)".to_string()
        } else {
            hits.iter()
                .map(|h| format!("- {h}"))
                .collect::<Vec<_>>()
                .join("\n")
        }
    };

    let diagnoses = grep(&["diag", "dx", "impression", "assessment"]);
    let meds = grep(&["med", "rx", "prescrib", "dosage"]);
    let allergies = grep(&["allerg", "reaction"]);
    let procedures = grep(&["procedure", "surgery", "operation"]);

    format!(
        "Placeholder health summary (no API key detected). Processed {file_count} PDF file(s).\n\
         \n\
         High-level overview:\n\
         - The records include multiple visits and findings. This is only a rough, automated draft.\n\
         \n\
         Possible diagnoses/assessments noted:\n{diagnoses}\n\
         \n\
         Possible medications mentioned:\n{meds}\n\
         \n\
         Possible allergies:\n{allergies}\n\
         \n\
         Possible procedures:\n{procedures}\n\
         \n\
         Next steps:\n\
         - Provide an OPENAI_API_KEY to enable an AI-generated, plain-language health history summary.\n\
         - Verify details directly in the source PDFs before using clinically."
    )
}
