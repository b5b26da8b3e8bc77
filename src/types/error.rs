use std::fmt;

use thiserror::Error;

use super::ids::{QuestionId, RuleId};
use super::operator::LogicOperator;

/// Which question reference of a rule an error points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionRole {
    Owner,
    Source,
    Target,
}

impl fmt::Display for QuestionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionRole::Owner => f.write_str("owner"),
            QuestionRole::Source => f.write_str("source"),
            QuestionRole::Target => f.write_str("target"),
        }
    }
}

/// An authoring defect that blocks a rule set from being accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rule '{rule}' uses question '{question}' as both owner and source")]
    SelfReference { rule: RuleId, question: QuestionId },

    #[error("rule '{rule}' references unknown {role} question '{question}'")]
    UnknownQuestion {
        rule: RuleId,
        role: QuestionRole,
        question: QuestionId,
    },

    #[error(
        "rules '{first}', '{second}' share priority {priority} on '{owner}' ('{source_question}')"
    )]
    DuplicatePriority {
        first: RuleId,
        second: RuleId,
        owner: QuestionId,
        source_question: QuestionId,
        priority: u32,
    },

    #[error("duplicate rule id '{rule}'")]
    DuplicateRule { rule: RuleId },

    #[error("question '{question}' is declared more than once")]
    DuplicateQuestion { question: QuestionId },

    #[error("rule '{rule}' needs a condition value for operator '{operator}'")]
    MissingConditionValue {
        rule: RuleId,
        operator: LogicOperator,
    },

    #[error("rule '{rule}' uses an operator this engine does not support")]
    UnsupportedOperator { rule: RuleId },

    #[error("rule '{rule}' is missing its {part}")]
    Incomplete { rule: RuleId, part: &'static str },
}

impl ValidationError {
    /// Whether this error is caused by the given rule.
    #[must_use]
    pub fn involves(&self, id: &RuleId) -> bool {
        match self {
            ValidationError::SelfReference { rule, .. }
            | ValidationError::UnknownQuestion { rule, .. }
            | ValidationError::DuplicateRule { rule }
            | ValidationError::MissingConditionValue { rule, .. }
            | ValidationError::UnsupportedOperator { rule }
            | ValidationError::Incomplete { rule, .. } => rule == id,
            ValidationError::DuplicatePriority { first, second, .. } => first == id || second == id,
            ValidationError::DuplicateQuestion { .. } => false,
        }
    }
}

/// A non-blocking authoring concern surfaced in the logic map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Show/Hide rules whose visibility depends on each other in a loop.
    /// The path starts and ends with the same question.
    VisibilityCycle { path: Vec<QuestionId> },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::VisibilityCycle { path } => {
                let joined: Vec<&str> = path.iter().map(QuestionId::as_str).collect();
                write!(f, "visibility cycle: {}", joined.join(" -> "))
            }
        }
    }
}

/// A rule set refused at authoring time, with every defect found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRules {
    errors: Vec<ValidationError>,
}

impl RejectedRules {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl fmt::Display for RejectedRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule set rejected")?;
        for (i, err) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RejectedRules {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_reference_message() {
        let err = ValidationError::SelfReference {
            rule: "r1".into(),
            question: "q1".into(),
        };
        assert_eq!(
            err.to_string(),
            "rule 'r1' uses question 'q1' as both owner and source"
        );
    }

    #[test]
    fn unknown_question_message() {
        let err = ValidationError::UnknownQuestion {
            rule: "r1".into(),
            role: QuestionRole::Target,
            question: "gone".into(),
        };
        assert_eq!(
            err.to_string(),
            "rule 'r1' references unknown target question 'gone'"
        );
    }

    #[test]
    fn duplicate_priority_message() {
        let err = ValidationError::DuplicatePriority {
            first: "r1".into(),
            second: "r2".into(),
            owner: "q3".into(),
            source_question: "q1".into(),
            priority: 0,
        };
        assert_eq!(err.to_string(), "rules 'r1', 'r2' share priority 0 on 'q3' ('q1')");
    }

    #[test]
    fn missing_value_message() {
        let err = ValidationError::MissingConditionValue {
            rule: "r1".into(),
            operator: LogicOperator::GreaterThan,
        };
        assert_eq!(
            err.to_string(),
            "rule 'r1' needs a condition value for operator '>'"
        );
    }

    #[test]
    fn incomplete_message() {
        let err = ValidationError::Incomplete {
            rule: "r1".into(),
            part: "action",
        };
        assert_eq!(err.to_string(), "rule 'r1' is missing its action");
    }

    #[test]
    fn involves_rule() {
        let dup = ValidationError::DuplicatePriority {
            first: "r1".into(),
            second: "r2".into(),
            owner: "q3".into(),
            source_question: "q1".into(),
            priority: 0,
        };
        assert!(dup.involves(&"r1".into()));
        assert!(dup.involves(&"r2".into()));
        assert!(!dup.involves(&"r3".into()));

        let q = ValidationError::DuplicateQuestion { question: "q1".into() };
        assert!(!q.involves(&"r1".into()));
    }

    #[test]
    fn cycle_warning_message() {
        let warning = ValidationWarning::VisibilityCycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(warning.to_string(), "visibility cycle: a -> b -> a");
    }

    #[test]
    fn rejected_lists_every_error() {
        let rejected = RejectedRules::new(vec![
            ValidationError::DuplicateRule { rule: "r1".into() },
            ValidationError::UnsupportedOperator { rule: "r2".into() },
        ]);
        assert_eq!(rejected.errors().len(), 2);
        assert_eq!(
            rejected.to_string(),
            "rule set rejected: duplicate rule id 'r1'; \
             rule 'r2' uses an operator this engine does not support"
        );
    }
}
