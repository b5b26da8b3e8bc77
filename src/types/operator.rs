use std::fmt;

/// Comparison operators a rule condition can apply to a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogicOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    IsAnswered,
    IsEmpty,
    /// An operator this engine does not recognise, e.g. one written by a newer
    /// authoring client. It never matches.
    #[cfg_attr(feature = "serde", serde(other))]
    Unsupported,
}

impl LogicOperator {
    /// Every supported operator, in declaration order.
    pub const ALL: [LogicOperator; 10] = [
        LogicOperator::Equals,
        LogicOperator::NotEquals,
        LogicOperator::Contains,
        LogicOperator::NotContains,
        LogicOperator::GreaterThan,
        LogicOperator::LessThan,
        LogicOperator::GreaterOrEqual,
        LogicOperator::LessOrEqual,
        LogicOperator::IsAnswered,
        LogicOperator::IsEmpty,
    ];

    /// Whether the operator compares against a condition literal. Presence
    /// checks (`IsAnswered`, `IsEmpty`) ignore the literal.
    #[must_use]
    pub fn requires_value(self) -> bool {
        !matches!(
            self,
            LogicOperator::IsAnswered | LogicOperator::IsEmpty | LogicOperator::Unsupported
        )
    }

    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            LogicOperator::GreaterThan
                | LogicOperator::LessThan
                | LogicOperator::GreaterOrEqual
                | LogicOperator::LessOrEqual
        )
    }

    /// Short label used on logic map edges.
    pub(crate) fn label(self) -> &'static str {
        match self {
            LogicOperator::Equals => "=",
            LogicOperator::NotEquals => "≠",
            LogicOperator::Contains => "contains",
            LogicOperator::NotContains => "not contains",
            LogicOperator::GreaterThan => ">",
            LogicOperator::LessThan => "<",
            LogicOperator::GreaterOrEqual => "≥",
            LogicOperator::LessOrEqual => "≤",
            LogicOperator::IsAnswered => "is answered",
            LogicOperator::IsEmpty => "is empty",
            LogicOperator::Unsupported => "unsupported",
        }
    }
}

/// Renders the operator in rule DSL syntax.
impl fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            LogicOperator::Equals => "==",
            LogicOperator::NotEquals => "!=",
            LogicOperator::Contains => "contains",
            LogicOperator::NotContains => "not contains",
            LogicOperator::GreaterThan => ">",
            LogicOperator::LessThan => "<",
            LogicOperator::GreaterOrEqual => ">=",
            LogicOperator::LessOrEqual => "<=",
            LogicOperator::IsAnswered => "is answered",
            LogicOperator::IsEmpty => "is empty",
            LogicOperator::Unsupported => "unsupported",
        };
        f.write_str(symbol)
    }
}
