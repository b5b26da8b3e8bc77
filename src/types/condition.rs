use std::fmt;

use super::ids::QuestionId;
use super::operator::LogicOperator;

/// A predicate over the answer to one source question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub source: QuestionId,
    pub operator: LogicOperator,
    pub value: String,
}

impl Condition {
    #[must_use]
    pub fn new(
        source: impl Into<QuestionId>,
        operator: LogicOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            operator,
            value: value.into(),
        }
    }

    /// Test the condition against the source question's answer.
    #[must_use]
    pub fn matches(&self, answer: Option<&str>) -> bool {
        crate::evaluate::evaluate_condition(answer, self.operator, &self.value)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator.requires_value() {
            write!(f, "{} {} ", self.source, self.operator)?;
            write_quoted(f, &self.value)
        } else {
            write!(f, "{} {}", self.source, self.operator)
        }
    }
}

pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

/// Intermediate builder for answer conditions.
/// Created by [`answer()`]; requires an operator method to produce a [`Condition`].
#[derive(Debug, Clone)]
pub struct AnswerExpr {
    source: QuestionId,
}

impl AnswerExpr {
    fn with(self, operator: LogicOperator, value: impl fmt::Display) -> Condition {
        Condition {
            source: self.source,
            operator,
            value: value.to_string(),
        }
    }

    #[must_use]
    pub fn equals(self, value: impl fmt::Display) -> Condition {
        self.with(LogicOperator::Equals, value)
    }

    #[must_use]
    pub fn not_equals(self, value: impl fmt::Display) -> Condition {
        self.with(LogicOperator::NotEquals, value)
    }

    #[must_use]
    pub fn contains(self, value: impl fmt::Display) -> Condition {
        self.with(LogicOperator::Contains, value)
    }

    #[must_use]
    pub fn not_contains(self, value: impl fmt::Display) -> Condition {
        self.with(LogicOperator::NotContains, value)
    }

    #[must_use]
    pub fn greater_than(self, value: impl fmt::Display) -> Condition {
        self.with(LogicOperator::GreaterThan, value)
    }

    #[must_use]
    pub fn less_than(self, value: impl fmt::Display) -> Condition {
        self.with(LogicOperator::LessThan, value)
    }

    #[must_use]
    pub fn greater_or_equal(self, value: impl fmt::Display) -> Condition {
        self.with(LogicOperator::GreaterOrEqual, value)
    }

    #[must_use]
    pub fn less_or_equal(self, value: impl fmt::Display) -> Condition {
        self.with(LogicOperator::LessOrEqual, value)
    }

    #[must_use]
    pub fn is_answered(self) -> Condition {
        self.with(LogicOperator::IsAnswered, "")
    }

    #[must_use]
    pub fn is_empty(self) -> Condition {
        self.with(LogicOperator::IsEmpty, "")
    }
}

/// Start a condition on the answer to `question`.
#[must_use]
pub fn answer(question: &str) -> AnswerExpr {
    AnswerExpr {
        source: QuestionId::from(question),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_equals_str() {
        let cond = answer("q1").equals("2");
        assert_eq!(
            cond,
            Condition {
                source: QuestionId::from("q1"),
                operator: LogicOperator::Equals,
                value: "2".to_owned(),
            }
        );
    }

    #[test]
    fn numeric_literals_are_stringified() {
        let cond = answer("age").greater_or_equal(18);
        assert_eq!(cond.operator, LogicOperator::GreaterOrEqual);
        assert_eq!(cond.value, "18");

        let cond = answer("score").less_than(2.5);
        assert_eq!(cond.value, "2.5");
    }

    #[test]
    fn presence_conditions_have_empty_value() {
        assert_eq!(answer("q").is_answered().value, "");
        assert_eq!(answer("q").is_empty().operator, LogicOperator::IsEmpty);
    }

    #[test]
    fn all_builder_operators() {
        let ops = vec![
            (answer("f").equals(1), LogicOperator::Equals),
            (answer("f").not_equals(1), LogicOperator::NotEquals),
            (answer("f").contains(1), LogicOperator::Contains),
            (answer("f").not_contains(1), LogicOperator::NotContains),
            (answer("f").greater_than(1), LogicOperator::GreaterThan),
            (answer("f").less_than(1), LogicOperator::LessThan),
            (answer("f").greater_or_equal(1), LogicOperator::GreaterOrEqual),
            (answer("f").less_or_equal(1), LogicOperator::LessOrEqual),
            (answer("f").is_answered(), LogicOperator::IsAnswered),
            (answer("f").is_empty(), LogicOperator::IsEmpty),
        ];
        for (cond, expected) in ops {
            assert_eq!(cond.operator, expected);
        }
    }

    #[test]
    fn display_quotes_and_escapes_values() {
        assert_eq!(answer("q1").equals("2").to_string(), r#"q1 == "2""#);
        assert_eq!(
            answer("q1").contains("say \"hi\"").to_string(),
            r#"q1 contains "say \"hi\"""#
        );
        assert_eq!(answer("q1").is_answered().to_string(), "q1 is answered");
    }

    #[test]
    fn matches_delegates_to_evaluator() {
        let cond = answer("q1").equals("yes");
        assert!(cond.matches(Some("yes")));
        assert!(!cond.matches(Some("no")));
        assert!(!cond.matches(None));
    }
}
