use std::collections::HashMap;

use crate::models::{CategoryTally, SchoolAggregate, ScoredRespondent};

/// Zero-based question indices of the benchmark indicators.
pub const ANXIETY_QUESTION: usize = 0;
pub const PARENT_PRESSURE_QUESTION: usize = 4;
pub const SUPPORT_QUESTION: usize = 18;

/// Groups respondents by school in first-appearance order. Rows without a
/// school are dropped.
pub fn aggregate(scored: &[ScoredRespondent]) -> Vec<SchoolAggregate> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&ScoredRespondent>> = HashMap::new();

    for respondent in scored {
        let Some(school) = respondent.school.as_deref() else {
            continue;
        };
        groups
            .entry(school)
            .or_insert_with(|| {
                order.push(school);
                Vec::new()
            })
            .push(respondent);
    }

    order
        .into_iter()
        .filter_map(|school| {
            let members = groups.get(school)?;
            summarize_school(school, members)
        })
        .collect()
}

fn summarize_school(name: &str, members: &[&ScoredRespondent]) -> Option<SchoolAggregate> {
    let total = members.len();
    if total == 0 {
        return None;
    }

    let mut counts = [0usize; 5];
    for respondent in members {
        counts[respondent.category.index()] += 1;
    }

    let frequent = |question: usize| {
        members
            .iter()
            .filter(|r| r.answers[question].is_some_and(|a| a.is_frequent()))
            .count()
    };

    Some(SchoolAggregate {
        name: name.to_string(),
        total,
        categories: counts.map(|count| CategoryTally {
            count,
            pct: percentage(count, total),
        }),
        anxiety_pct: percentage(frequent(ANXIETY_QUESTION), total),
        parent_pressure_pct: percentage(frequent(PARENT_PRESSURE_QUESTION), total),
        support_pct: percentage(frequent(SUPPORT_QUESTION), total),
        defaulted_answers: members.iter().map(|r| r.defaulted).sum(),
    })
}

/// `count / total * 100` rounded to one decimal. Rounds the exact binary
/// value, so only true ties go to even.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = count as f64 / total as f64 * 100.0;
    format!("{raw:.1}").parse().unwrap_or(raw)
}
