use serde::Deserialize;

/// Number of Likert questions on the survey.
pub const QUESTION_COUNT: usize = 20;

/// Questions 1..=16 are scored forward, 17..=20 reversed.
pub const FORWARD_QUESTIONS: usize = 16;

/// One of the five ordinal answer labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Never,
    Rarely,
    Sometimes,
    Often,
    Always,
}

impl Frequency {
    /// Exact, case-sensitive match against the export's labels.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Never" => Some(Self::Never),
            "Rarely" => Some(Self::Rarely),
            "Sometimes" => Some(Self::Sometimes),
            "Often" => Some(Self::Often),
            "Always" => Some(Self::Always),
            _ => None,
        }
    }

    pub fn forward(self) -> u32 {
        match self {
            Self::Never => 1,
            Self::Rarely => 2,
            Self::Sometimes => 3,
            Self::Often => 4,
            Self::Always => 5,
        }
    }

    pub fn reverse(self) -> u32 {
        6 - self.forward()
    }

    pub fn is_frequent(self) -> bool {
        matches!(self, Self::Often | Self::Always)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Balanced,
    Mild,
    Moderate,
    High,
    Severe,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Balanced,
        Category::Mild,
        Category::Moderate,
        Category::High,
        Category::Severe,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Balanced => 0,
            Self::Mild => 1,
            Self::Moderate => 2,
            Self::High => 3,
            Self::Severe => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Severe => "Severe",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoredRespondent {
    pub school: Option<String>,
    pub answers: [Option<Frequency>; QUESTION_COUNT],
    pub total: u32,
    pub category: Category,
    /// Answers that were missing or unrecognized and scored as neutral.
    pub defaulted: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryTally {
    pub count: usize,
    pub pct: f64,
}

#[derive(Debug, Clone)]
pub struct SchoolAggregate {
    pub name: String,
    pub total: usize,
    /// Indexed by `Category::index`.
    pub categories: [CategoryTally; 5],
    pub anxiety_pct: f64,
    pub parent_pressure_pct: f64,
    pub support_pct: f64,
    pub defaulted_answers: u32,
}

impl SchoolAggregate {
    pub fn tally(&self, category: Category) -> CategoryTally {
        self.categories[category.index()]
    }
}

/// Narrative text for one school's report. Field names on the wire follow
/// the JSON object the text-generation prompt asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NarrativeBundle {
    #[serde(rename = "p1", default)]
    pub summary_overview: String,
    #[serde(rename = "p2", default)]
    pub summary_distribution: String,
    #[serde(default)]
    pub key_finding: String,
    #[serde(default)]
    pub conclusion: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub weaknesses: String,
}

#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub school: String,
    pub html: String,
}
