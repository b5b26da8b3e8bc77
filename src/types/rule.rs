use std::fmt;

use super::condition::Condition;
use super::ids::{QuestionId, RuleId};

/// What a rule does when its condition matches.
///
/// `Show` and `Hide` control the owner question's visibility. `SkipTo` and
/// `End` are navigation actions and ignore the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicAction {
    Show,
    Hide,
    SkipTo(QuestionId),
    End,
}

/// Field-less discriminant of [`LogicAction`], used on the wire and on
/// logic map edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionKind {
    Show,
    Hide,
    SkipTo,
    End,
}

impl LogicAction {
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            LogicAction::Show => ActionKind::Show,
            LogicAction::Hide => ActionKind::Hide,
            LogicAction::SkipTo(_) => ActionKind::SkipTo,
            LogicAction::End => ActionKind::End,
        }
    }

    /// `true` for `SkipTo` and `End`.
    #[must_use]
    pub fn is_navigation(&self) -> bool {
        matches!(self, LogicAction::SkipTo(_) | LogicAction::End)
    }

    #[must_use]
    pub fn target(&self) -> Option<&QuestionId> {
        match self {
            LogicAction::SkipTo(target) => Some(target),
            _ => None,
        }
    }
}

impl ActionKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            ActionKind::Show => "→ Show",
            ActionKind::Hide => "→ Hide",
            ActionKind::SkipTo => "→ Skip to",
            ActionKind::End => "→ End survey",
        }
    }
}

impl fmt::Display for LogicAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicAction::Show => f.write_str("show"),
            LogicAction::Hide => f.write_str("hide"),
            LogicAction::SkipTo(target) => write!(f, "skip to {target}"),
            LogicAction::End => f.write_str("end"),
        }
    }
}

/// A conditional branching rule authored on a survey.
///
/// Rules are evaluated in ascending `priority`, then ascending `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub id: RuleId,
    pub owner: QuestionId,
    pub condition: Condition,
    pub action: LogicAction,
    pub priority: u32,
}

impl Rule {
    #[must_use]
    pub fn new(
        id: impl Into<RuleId>,
        owner: impl Into<QuestionId>,
        condition: Condition,
        action: LogicAction,
        priority: u32,
    ) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            condition,
            action,
            priority,
        }
    }

    /// The question whose answer the condition inspects.
    #[must_use]
    pub fn source(&self) -> &QuestionId {
        &self.condition.source
    }

    pub(crate) fn sort_key(&self) -> (u32, &RuleId) {
        (self.priority, &self.id)
    }
}

/// Renders the rule in DSL syntax; the output parses back to an equal rule.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule {} on {} (priority {}):\n    when {} then {}",
            self.id, self.owner, self.priority, self.condition, self.action
        )
    }
}

/// A rule awaiting an id and/or priority, as submitted by an author.
///
/// A missing priority becomes one past the highest priority already used by
/// the owner question (0 for its first rule).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDraft {
    pub id: Option<RuleId>,
    pub owner: QuestionId,
    pub condition: Condition,
    pub action: LogicAction,
    pub priority: Option<u32>,
}

impl RuleDraft {
    #[must_use]
    pub fn new(owner: impl Into<QuestionId>, condition: Condition, action: LogicAction) -> Self {
        Self {
            id: None,
            owner: owner.into(),
            condition,
            action,
            priority: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<RuleId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub(crate) fn into_rule(self, id: RuleId, priority: u32) -> Rule {
        Rule {
            id,
            owner: self.owner,
            condition: self.condition,
            action: self.action,
            priority,
        }
    }
}

/// Next free priority for `owner`: one past its highest, or 0.
pub(crate) fn next_priority<'a>(
    rules: impl IntoIterator<Item = &'a Rule>,
    owner: &QuestionId,
) -> u32 {
    rules
        .into_iter()
        .filter(|r| &r.owner == owner)
        .map(|r| r.priority.saturating_add(1))
        .max()
        .unwrap_or(0)
}
