use crate::layout::ResolvedLayout;
use crate::loader::Respondent;
use crate::models::{Category, Frequency, ScoredRespondent, FORWARD_QUESTIONS, QUESTION_COUNT};

/// Value used for a missing or unrecognized answer.
pub const NEUTRAL_VALUE: u32 = 3;

pub fn score_row(row: &Respondent, layout: &ResolvedLayout) -> ScoredRespondent {
    let school = row.cell(layout.school).map(str::to_string);

    let mut answers = [None; QUESTION_COUNT];
    let mut defaulted = 0;
    let mut total = 0;

    for (question, column) in layout.questions.iter().enumerate() {
        let answer = row.cell(*column).and_then(Frequency::parse);
        answers[question] = answer;
        total += match answer {
            Some(value) => question_value(question, value),
            None => {
                defaulted += 1;
                NEUTRAL_VALUE
            }
        };
    }

    ScoredRespondent {
        school,
        answers,
        total,
        category: categorize(total),
        defaulted,
    }
}

pub fn score_table(rows: &[Respondent], layout: &ResolvedLayout) -> Vec<ScoredRespondent> {
    rows.iter().map(|row| score_row(row, layout)).collect()
}

/// Points for a zero-based question index; the last four questions describe
/// coping behaviour and score in reverse.
pub fn question_value(question: usize, answer: Frequency) -> u32 {
    if question < FORWARD_QUESTIONS {
        answer.forward()
    } else {
        answer.reverse()
    }
}

pub fn categorize(total: u32) -> Category {
    match total {
        0..=36 => Category::Balanced,
        37..=52 => Category::Mild,
        53..=68 => Category::Moderate,
        69..=84 => Category::High,
        _ => Category::Severe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn layout() -> ResolvedLayout {
        let mut questions = [0; QUESTION_COUNT];
        for (i, q) in questions.iter_mut().enumerate() {
            *q = 8 + i;
        }
        ResolvedLayout {
            school: 1,
            questions,
        }
    }

    fn row(school: Option<&str>, answers: &[&str]) -> Respondent {
        let mut cells: Vec<Option<String>> = vec![None; 8];
        cells[1] = school.map(String::from);
        cells.extend(
            answers
                .iter()
                .map(|a| (!a.is_empty()).then(|| a.to_string())),
        );
        Respondent { cells }
    }

    #[test]
    fn all_sometimes_is_moderate() {
        let scored = score_row(&row(Some("Hill"), &["Sometimes"; 20]), &layout());
        assert_eq!(scored.total, 60);
        assert_eq!(scored.category, Category::Moderate);
        assert_eq!(scored.defaulted, 0);
        assert_eq!(scored.school.as_deref(), Some("Hill"));
    }

    #[test]
    fn all_never_is_balanced_boundary() {
        let scored = score_row(&row(Some("Hill"), &["Never"; 20]), &layout());
        assert_eq!(scored.total, 16 + 4 * 5);
        assert_eq!(scored.category, Category::Balanced);
    }

    #[test]
    fn all_always_scores_reverse_questions_low() {
        let scored = score_row(&row(Some("Hill"), &["Always"; 20]), &layout());
        assert_eq!(scored.total, 16 * 5 + 4);
        assert_eq!(scored.category, Category::High);
    }

    #[test]
    fn unknown_labels_default_to_neutral() {
        let mut answers = vec!["Never"; 20];
        answers[0] = "N/A";
        answers[1] = "";
        answers[19] = "always";
        let scored = score_row(&row(None, &answers), &layout());
        assert_eq!(scored.defaulted, 3);
        // 15 forward Never (14 + two defaults at 3), reverse: 3 Never + one default.
        assert_eq!(scored.total, 14 + 3 + 3 + 3 * 5 + 3);
        assert!(scored.school.is_none());
    }

    #[test]
    fn missing_cells_default_to_neutral() {
        let scored = score_row(&row(Some("Hill"), &[]), &layout());
        assert_eq!(scored.total, 60);
        assert_eq!(scored.defaulted, 20);
    }

    #[test]
    fn category_boundaries() {
        assert_eq!(categorize(20), Category::Balanced);
        assert_eq!(categorize(36), Category::Balanced);
        assert_eq!(categorize(37), Category::Mild);
        assert_eq!(categorize(52), Category::Mild);
        assert_eq!(categorize(53), Category::Moderate);
        assert_eq!(categorize(68), Category::Moderate);
        assert_eq!(categorize(69), Category::High);
        assert_eq!(categorize(84), Category::High);
        assert_eq!(categorize(85), Category::Severe);
        assert_eq!(categorize(100), Category::Severe);
    }

    #[test]
    fn bands_are_contiguous_and_ordered() {
        let mut previous = categorize(20).index();
        for total in 21..=100 {
            let current = categorize(total).index();
            assert!(current == previous || current == previous + 1);
            previous = current;
        }
        assert_eq!(previous, Category::Severe.index());
    }

    fn label() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Never".to_string()),
            Just("Rarely".to_string()),
            Just("Sometimes".to_string()),
            Just("Often".to_string()),
            Just("Always".to_string()),
            "[a-z ]{0,8}",
        ]
    }

    proptest! {
        #[test]
        fn score_stays_in_range(answers in proptest::collection::vec(label(), 20)) {
            let refs: Vec<&str> = answers.iter().map(String::as_str).collect();
            let scored = score_row(&row(Some("Hill"), &refs), &layout());
            prop_assert!((20..=100).contains(&scored.total));
            prop_assert_eq!(scored.category, categorize(scored.total));
        }
    }
}
