//! JSON shapes for rule authoring endpoints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ActionKind, Condition, LogicAction, LogicOperator, QuestionId, Rule, RuleDraft, RuleId};

/// A rule as sent and received by authoring clients. `SkipTo` carries its
/// target in `targetQuestionId`; other actions ignore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicRuleDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RuleId>,
    pub owner_question_id: QuestionId,
    pub source_question_id: QuestionId,
    pub operator: LogicOperator,
    #[serde(default)]
    pub condition_value: String,
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_question_id: Option<QuestionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DtoError {
    #[error("skip-to rules need a targetQuestionId")]
    MissingTarget,
}

impl TryFrom<LogicRuleDto> for RuleDraft {
    type Error = DtoError;

    fn try_from(dto: LogicRuleDto) -> Result<Self, Self::Error> {
        let action = match dto.action {
            ActionKind::Show => LogicAction::Show,
            ActionKind::Hide => LogicAction::Hide,
            ActionKind::End => LogicAction::End,
            ActionKind::SkipTo => {
                LogicAction::SkipTo(dto.target_question_id.ok_or(DtoError::MissingTarget)?)
            }
        };
        Ok(RuleDraft {
            id: dto.id,
            owner: dto.owner_question_id,
            condition: Condition::new(dto.source_question_id, dto.operator, dto.condition_value),
            action,
            priority: dto.priority,
        })
    }
}

impl From<&Rule> for LogicRuleDto {
    fn from(rule: &Rule) -> Self {
        Self {
            id: Some(rule.id.clone()),
            owner_question_id: rule.owner.clone(),
            source_question_id: rule.source().clone(),
            operator: rule.condition.operator,
            condition_value: rule.condition.value.clone(),
            action: rule.action.kind(),
            target_question_id: rule.action.target().cloned(),
            priority: Some(rule.priority),
        }
    }
}
