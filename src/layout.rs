use std::path::Path;

use serde::Deserialize;

use crate::error::{FormatError, LayoutError};
use crate::models::QUESTION_COUNT;

/// Column index of question 1 when questions are bound by position.
pub const FIRST_QUESTION_COLUMN: usize = 8;

/// Minimum width of a survey export.
pub const MIN_COLUMNS: usize = FIRST_QUESTION_COLUMN + QUESTION_COUNT;

pub const DEFAULT_SCHOOL_COLUMN: &str = "sname";

/// How survey columns are located in the export's header.
///
/// Without `questions` the 20 answers are read from columns 8..=27 in order.
/// Naming them binds each question to its header instead.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnLayout {
    pub school_column: String,
    pub questions: Option<Vec<String>>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            school_column: DEFAULT_SCHOOL_COLUMN.into(),
            questions: None,
        }
    }
}

/// Column indices resolved against a concrete header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayout {
    pub school: usize,
    pub questions: [usize; QUESTION_COUNT],
}

impl ColumnLayout {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, LayoutError> {
        toml::from_str(text).map_err(|source| LayoutError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let text = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedLayout, FormatError> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        let school = find(&self.school_column).ok_or_else(|| FormatError::MissingSchoolColumn {
            name: self.school_column.clone(),
        })?;

        let mut questions = [0usize; QUESTION_COUNT];
        match &self.questions {
            None => {
                if headers.len() < MIN_COLUMNS {
                    return Err(FormatError::TooFewColumns {
                        found: headers.len(),
                        required: MIN_COLUMNS,
                    });
                }
                for (i, slot) in questions.iter_mut().enumerate() {
                    *slot = FIRST_QUESTION_COLUMN + i;
                }
            }
            Some(names) => {
                if names.len() != QUESTION_COUNT {
                    return Err(FormatError::QuestionCount { found: names.len() });
                }
                for (i, name) in names.iter().enumerate() {
                    questions[i] = find(name).ok_or_else(|| FormatError::MissingQuestion {
                        number: i + 1,
                        name: name.clone(),
                    })?;
                }
            }
        }

        Ok(ResolvedLayout { school, questions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(n: usize) -> Vec<String> {
        let mut h: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
        h[1] = "sname".to_string();
        h
    }

    #[test]
    fn positional_layout_uses_columns_8_to_27() {
        let resolved = ColumnLayout::default().resolve(&headers(28)).unwrap();
        assert_eq!(resolved.school, 1);
        assert_eq!(resolved.questions[0], 8);
        assert_eq!(resolved.questions[19], 27);
    }

    #[test]
    fn positional_layout_rejects_narrow_tables() {
        let err = ColumnLayout::default().resolve(&headers(27)).unwrap_err();
        assert_eq!(
            err,
            FormatError::TooFewColumns {
                found: 27,
                required: 28
            }
        );
    }

    #[test]
    fn missing_school_column_is_reported_by_name() {
        let layout = ColumnLayout {
            school_column: "school".into(),
            questions: None,
        };
        let err = layout.resolve(&headers(28)).unwrap_err();
        assert_eq!(
            err,
            FormatError::MissingSchoolColumn {
                name: "school".into()
            }
        );
    }

    #[test]
    fn named_layout_binds_by_header() {
        let mut h = headers(30);
        h.reverse();
        let names: Vec<String> = (0..20).map(|i| format!("col{}", i + 10)).collect();
        let layout = ColumnLayout {
            school_column: "sname".into(),
            questions: Some(names),
        };
        let resolved = layout.resolve(&h).unwrap();
        assert_eq!(h[resolved.questions[0]], "col10");
        assert_eq!(h[resolved.questions[19]], "col29");
    }

    #[test]
    fn named_layout_names_the_missing_question() {
        let mut names: Vec<String> = (0..20).map(|i| format!("col{}", i + 8)).collect();
        names[4] = "Q5 parents".into();
        let layout = ColumnLayout {
            school_column: "sname".into(),
            questions: Some(names),
        };
        let err = layout.resolve(&headers(28)).unwrap_err();
        assert_eq!(
            err,
            FormatError::MissingQuestion {
                number: 5,
                name: "Q5 parents".into()
            }
        );
    }

    #[test]
    fn layout_file_parses_toml() {
        let layout = ColumnLayout::from_toml(
            "school_column = \"School\"\n",
            Path::new("layout.toml"),
        )
        .unwrap();
        assert_eq!(layout.school_column, "School");
        assert!(layout.questions.is_none());

        let err = ColumnLayout::from_toml("colour = 3\n", Path::new("layout.toml"));
        assert!(matches!(err, Err(LayoutError::Parse { .. })));
    }
}
