use crate::LogicOperator;

/// Test one submitted answer against a condition literal.
///
/// `answer` is `None` when the source question has no recorded answer. The
/// function is total: unparsable numbers and unsupported operators yield
/// `false`.
#[must_use]
pub fn evaluate_condition(
    answer: Option<&str>,
    operator: LogicOperator,
    condition_value: &str,
) -> bool {
    match operator {
        LogicOperator::IsAnswered => is_answered(answer),
        LogicOperator::IsEmpty => !is_answered(answer),
        LogicOperator::Equals => answer.is_some_and(|a| a == condition_value),
        LogicOperator::NotEquals => answer.is_some_and(|a| a != condition_value),
        LogicOperator::Contains => answer.is_some_and(|a| contains(a, condition_value)),
        LogicOperator::NotContains => answer.is_some_and(|a| !contains(a, condition_value)),
        LogicOperator::GreaterThan => compare_numeric(answer, condition_value, |a, b| a > b),
        LogicOperator::LessThan => compare_numeric(answer, condition_value, |a, b| a < b),
        LogicOperator::GreaterOrEqual => compare_numeric(answer, condition_value, |a, b| a >= b),
        LogicOperator::LessOrEqual => compare_numeric(answer, condition_value, |a, b| a <= b),
        LogicOperator::Unsupported => false,
    }
}

/// A whitespace-only answer counts as unanswered.
fn is_answered(answer: Option<&str>) -> bool {
    answer.is_some_and(|a| !a.trim().is_empty())
}

/// Multi-select answers are comma-joined; those test membership, anything
/// else tests substring containment.
///
/// Answers carry no question type, so free text that happens to contain a
/// comma is also read as a list: `"great, fast service"` contains
/// `"great"` but not `"fast"`.
fn contains(answer: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    if answer.contains(',') {
        let needle = needle.trim();
        answer.split(',').any(|item| item.trim() == needle)
    } else {
        answer.contains(needle)
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn compare_numeric(
    answer: Option<&str>,
    condition_value: &str,
    cmp: impl Fn(f64, f64) -> bool,
) -> bool {
    match (answer.and_then(parse_number), parse_number(condition_value)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}
