//! Narrative text for the reports.
//!
//! The pipeline only sees [`NarrativeProvider`]. [`Narrator`] picks the live
//! Gemini client when a credential is configured and the offline text
//! otherwise; any live failure is absorbed by [`generate_insights`].

use std::fmt::Write;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::InsightError;
use crate::models::{Category, NarrativeBundle, SchoolAggregate};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// National reference rates quoted next to the school's indicators.
pub const NATIONAL_ANXIETY_PCT: u32 = 81;
pub const NATIONAL_PARENT_PRESSURE_PCT: u32 = 66;
pub const NATIONAL_SUPPORT_PCT: u32 = 28;

#[allow(async_fn_in_trait)]
pub trait NarrativeProvider {
    async fn narrate(
        &self,
        school: &str,
        stats: &SchoolAggregate,
    ) -> Result<NarrativeBundle, InsightError>;
}

/// Produces the narrative for one school, falling back to the failure text
/// when the provider errors.
pub async fn generate_insights<P: NarrativeProvider>(
    provider: &P,
    school: &str,
    stats: &SchoolAggregate,
) -> NarrativeBundle {
    match provider.narrate(school, stats).await {
        Ok(bundle) => bundle,
        Err(err) => {
            warn!(school, error = %err, "insight generation failed, using fallback text");
            failure_bundle()
        }
    }
}

/// Text used when no credential is configured.
pub fn offline_bundle(stats: &SchoolAggregate) -> NarrativeBundle {
    NarrativeBundle {
        summary_overview: "The students exhibited a diverse range of emotional responses to assessment stimuli. Data indicates significant variance in stress levels compared to national averages.".into(),
        summary_distribution: "Detailed analysis suggests that while some students possess robust coping mechanisms, a notable segment requires targeted intervention to manage evaluation-related anxiety.".into(),
        key_finding: "Moderate Correlation between Preparation and Panic.".into(),
        conclusion: "Implementing structured mentorship programs is recommended.".into(),
        quote: "Success is not final, failure is not fatal: it is the courage to continue that counts.".into(),
        strengths: format!(
            "The school shows a Support Accessibility score of {:.1}%, which differs from the national benchmark. This indicates a unique school culture regarding teacher-student interaction.",
            stats.support_pct
        ),
        weaknesses: format!(
            "Exam anxiety is recorded at {:.1}%. Addressing this through mindfulness and mock-test desensitization could improve overall well-being.",
            stats.anxiety_pct
        ),
    }
}

/// Text used when a live request or its response parsing fails.
pub fn failure_bundle() -> NarrativeBundle {
    NarrativeBundle {
        summary_overview: "Analysis generation failed (API Error).".into(),
        summary_distribution: "Please check API Key or try again.".into(),
        key_finding: "Data Processing Complete".into(),
        conclusion: "Review numerical data below.".into(),
        quote: "Data speaks for itself.".into(),
        strengths: "N/A".into(),
        weaknesses: "N/A".into(),
    }
}

pub struct OfflineNarrator;

impl NarrativeProvider for OfflineNarrator {
    async fn narrate(
        &self,
        _school: &str,
        stats: &SchoolAggregate,
    ) -> Result<NarrativeBundle, InsightError> {
        Ok(offline_bundle(stats))
    }
}

pub struct GeminiNarrator {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiNarrator {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InsightError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl NarrativeProvider for GeminiNarrator {
    async fn narrate(
        &self,
        school: &str,
        stats: &SchoolAggregate,
    ) -> Result<NarrativeBundle, InsightError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_prompt(school, stats) }],
            }],
        });

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(InsightError::Status { status, body });
        }

        let payload: Value = resp.json().await?;
        let text = candidate_text(&payload).ok_or(InsightError::EmptyResponse)?;
        debug!(school, bytes = text.len(), "received narrative");
        parse_narrative(&text)
    }
}

/// Live client when a credential is present, offline text otherwise.
pub enum Narrator {
    Offline(OfflineNarrator),
    Live(GeminiNarrator),
}

impl NarrativeProvider for Narrator {
    async fn narrate(
        &self,
        school: &str,
        stats: &SchoolAggregate,
    ) -> Result<NarrativeBundle, InsightError> {
        match self {
            Narrator::Offline(inner) => inner.narrate(school, stats).await,
            Narrator::Live(inner) => inner.narrate(school, stats).await,
        }
    }
}

pub fn build_prompt(school: &str, stats: &SchoolAggregate) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "ROLE: Expert Education Data Analyst.");
    let _ = writeln!(prompt, "TASK: Write report sections for School: \"{school}\".");
    let _ = writeln!(prompt, "DATA:");
    let _ = writeln!(prompt, "- Total Students: {}", stats.total);
    for category in Category::ALL {
        let tally = stats.tally(category);
        let label = match category {
            Category::Balanced => "Balanced".to_string(),
            other => format!("{} Stress", other.label()),
        };
        let _ = writeln!(prompt, "- {label}: {} ({:.1}%)", tally.count, tally.pct);
    }
    let _ = writeln!(
        prompt,
        "- Exam Anxiety: {:.1}% (National: {NATIONAL_ANXIETY_PCT}%)",
        stats.anxiety_pct
    );
    let _ = writeln!(
        prompt,
        "- Parental Pressure: {:.1}% (National: {NATIONAL_PARENT_PRESSURE_PCT}%)",
        stats.parent_pressure_pct
    );
    let _ = writeln!(
        prompt,
        "- Support Accessibility: {:.1}% (National: {NATIONAL_SUPPORT_PCT}%)",
        stats.support_pct
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "OUTPUT FORMAT (JSON):");
    let _ = writeln!(
        prompt,
        "{}",
        r#"{
    "p1": "Executive Summary Paragraph 1 (Overview of participation and general mood)",
    "p2": "Executive Summary Paragraph 2 (Deep dive into stress distribution)",
    "key_finding": "One punchy key finding headline",
    "conclusion": "One sentence strategic conclusion",
    "quote": "A relevant, inspiring quote for students",
    "strengths": "Insight on Strengths (Compare School vs National data)",
    "weaknesses": "Insight on Points of Intervention (Compare School vs National data)"
}"#
    );
    prompt
}

/// Text of the first candidate, joined across all of its parts.
fn candidate_text(payload: &Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then_some(text)
}

/// Parses model output, tolerating a Markdown code fence around the JSON.
pub fn parse_narrative(text: &str) -> Result<NarrativeBundle, InsightError> {
    let cleaned = text.replace("```json", "").replace("```", "");
    Ok(serde_json::from_str(cleaned.trim())?)
}
