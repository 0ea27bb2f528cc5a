use tracing::{debug, info};

use crate::aggregate::aggregate;
use crate::error::FormatError;
use crate::insights::{generate_insights, NarrativeProvider};
use crate::layout::ColumnLayout;
use crate::loader::SurveyTable;
use crate::models::{ReportDocument, SchoolAggregate};
use crate::report::{render, Template};
use crate::score::score_table;

/// Emitted after each school's report is rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

/// Scores every respondent and aggregates by school.
pub fn summarize(
    table: &SurveyTable,
    layout: &ColumnLayout,
) -> Result<Vec<SchoolAggregate>, FormatError> {
    let resolved = layout.resolve(&table.headers)?;
    let scored = score_table(&table.rows, &resolved);
    let schools = aggregate(&scored);
    info!(
        respondents = scored.len(),
        schools = schools.len(),
        "scored survey responses"
    );
    Ok(schools)
}

/// Runs the full pass: one narrative request and one render per school,
/// serially, in first-appearance order.
pub async fn generate_reports<P, F>(
    table: &SurveyTable,
    layout: &ColumnLayout,
    template: &Template,
    narrator: &P,
    mut on_progress: F,
) -> Result<Vec<ReportDocument>, FormatError>
where
    P: NarrativeProvider,
    F: FnMut(Progress),
{
    let schools = summarize(table, layout)?;
    let total = schools.len();
    let mut reports = Vec::with_capacity(total);

    for (idx, stats) in schools.iter().enumerate() {
        if stats.defaulted_answers > 0 {
            debug!(
                school = %stats.name,
                defaulted = stats.defaulted_answers,
                "answers scored as neutral"
            );
        }

        let narrative = generate_insights(narrator, &stats.name, stats).await;
        reports.push(ReportDocument {
            school: stats.name.clone(),
            html: render(template, stats, &narrative),
        });
        on_progress(Progress {
            done: idx + 1,
            total,
        });
    }

    Ok(reports)
}
