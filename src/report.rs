use std::collections::HashMap;
use std::path::Path;

use crate::error::TemplateError;
use crate::models::{Category, NarrativeBundle, SchoolAggregate};

const BUILTIN_TEMPLATE: &str = include_str!("../templates/report.html");

pub const EST_YEAR: &str = "2024";
pub const SURVEY_MODE: &str = "Online Survey";

/// Every placeholder a report template must contain, without brackets.
pub const TOKENS: &[&str] = &[
    "SCHOOL_NAME",
    "EST_YEAR",
    "MODE",
    "COUNT",
    "EXEC_SUMMARY_P1",
    "EXEC_SUMMARY_P2",
    "EXEC_SUMMARY_KEY_FINDING",
    "EXEC_SUMMARY_CONCLUSION",
    "INSERT_KEY_QUOTE",
    "VAL_BALANCED",
    "PCT_BALANCED",
    "VAL_MILD",
    "PCT_MILD",
    "VAL_MOD",
    "PCT_MOD",
    "VAL_HIGH",
    "PCT_HIGH",
    "VAL_SEVERE",
    "PCT_SEVERE",
    "VAL_TOTAL",
    "PCT_ANXIETY",
    "PCT_PARENT_PRESSURE",
    "PCT_SUPPORT",
    "INSIGHT_STRENGTHS",
    "INSIGHT_WEAKNESS",
    "DEFAULTED_ANSWERS",
];

/// A report template whose placeholders have been checked against [`TOKENS`].
#[derive(Debug, Clone)]
pub struct Template {
    text: String,
}

impl Template {
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::parse(BUILTIN_TEMPLATE)
    }

    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path).map_err(|e| TemplateError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        check_token_table()?;

        let found = scan_tokens(text);
        if let Some(unknown) = found.iter().copied().find(|name| !TOKENS.contains(name)) {
            return Err(TemplateError::UnknownToken(unknown.to_string()));
        }
        if let Some(missing) = TOKENS.iter().copied().find(|name| !found.contains(name)) {
            return Err(TemplateError::MissingToken(missing));
        }

        Ok(Self {
            text: text.to_string(),
        })
    }
}

fn check_token_table() -> Result<(), TemplateError> {
    for &inner in TOKENS {
        for &outer in TOKENS {
            if inner != outer && format!("[{outer}]").contains(&format!("[{inner}]")) {
                return Err(TemplateError::OverlappingTokens { inner, outer });
            }
        }
    }
    Ok(())
}

fn is_token_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Bracketed upper-case names in `text`, in order of appearance.
fn scan_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('[') {
        rest = &rest[start + 1..];
        if let Some(end) = rest.find(']') {
            let name = &rest[..end];
            if is_token_name(name) {
                tokens.push(name);
            }
        }
    }
    tokens
}

/// Fills every placeholder in one left-to-right pass. Substituted text is
/// never rescanned.
pub fn render(
    template: &Template,
    stats: &SchoolAggregate,
    narrative: &NarrativeBundle,
) -> String {
    let values = substitutions(stats, narrative);
    let mut out = String::with_capacity(template.text.len() + 4096);
    let mut rest = template.text.as_str();

    while let Some(start) = rest.find('[') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let value = after
            .find(']')
            .and_then(|end| values.get(&after[..end]).map(|v| (end, v)));
        match value {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('[');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn substitutions(
    stats: &SchoolAggregate,
    narrative: &NarrativeBundle,
) -> HashMap<&'static str, String> {
    let count = |c: Category| stats.tally(c).count.to_string();
    let pct = |c: Category| format!("{:.1}", stats.tally(c).pct);

    HashMap::from([
        ("SCHOOL_NAME", esc(&stats.name)),
        ("EST_YEAR", EST_YEAR.to_string()),
        ("MODE", SURVEY_MODE.to_string()),
        ("COUNT", stats.total.to_string()),
        ("EXEC_SUMMARY_P1", esc(&narrative.summary_overview)),
        ("EXEC_SUMMARY_P2", esc(&narrative.summary_distribution)),
        ("EXEC_SUMMARY_KEY_FINDING", esc(&narrative.key_finding)),
        ("EXEC_SUMMARY_CONCLUSION", esc(&narrative.conclusion)),
        ("INSERT_KEY_QUOTE", esc(&narrative.quote)),
        ("VAL_BALANCED", count(Category::Balanced)),
        ("PCT_BALANCED", pct(Category::Balanced)),
        ("VAL_MILD", count(Category::Mild)),
        ("PCT_MILD", pct(Category::Mild)),
        ("VAL_MOD", count(Category::Moderate)),
        ("PCT_MOD", pct(Category::Moderate)),
        ("VAL_HIGH", count(Category::High)),
        ("PCT_HIGH", pct(Category::High)),
        ("VAL_SEVERE", count(Category::Severe)),
        ("PCT_SEVERE", pct(Category::Severe)),
        ("VAL_TOTAL", stats.total.to_string()),
        ("PCT_ANXIETY", format!("{:.1}", stats.anxiety_pct)),
        ("PCT_PARENT_PRESSURE", format!("{:.1}", stats.parent_pressure_pct)),
        ("PCT_SUPPORT", format!("{:.1}", stats.support_pct)),
        ("INSIGHT_STRENGTHS", esc(&narrative.strengths)),
        ("INSIGHT_WEAKNESS", esc(&narrative.weaknesses)),
        ("DEFAULTED_ANSWERS", stats.defaulted_answers.to_string()),
    ])
}

fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
