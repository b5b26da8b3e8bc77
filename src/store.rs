use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

use crate::service::SnapshotSource;
use crate::types::next_priority;
use crate::{QuestionId, RejectedRules, Rule, RuleDraft, RuleId, SurveyLogic};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("survey '{0}' not found")]
    SurveyNotFound(String),

    #[error("rule '{0}' not found")]
    RuleNotFound(RuleId),

    #[error("question '{0}' not found")]
    QuestionNotFound(QuestionId),

    #[error("reorder for '{owner}' must list each of its rules exactly once")]
    ReorderMismatch { owner: QuestionId },

    #[error(transparent)]
    Rejected(#[from] RejectedRules),
}

/// In-memory rule persistence with copy-on-write snapshots.
///
/// Every write validates the resulting rule set and swaps in a new
/// `Arc<SurveyLogic>`; readers keep whatever snapshot they already hold.
/// A write is refused only for errors caused by the rules it touches, so a
/// survey already carrying dangling rules stays editable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    surveys: RwLock<HashMap<String, Arc<SurveyLogic>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_survey(&self, survey_id: &str, logic: SurveyLogic) {
        let mut surveys = self.surveys.write().unwrap_or_else(PoisonError::into_inner);
        surveys.insert(survey_id.to_owned(), Arc::new(logic));
    }

    /// Known survey ids, sorted.
    #[must_use]
    pub fn survey_ids(&self) -> Vec<String> {
        let surveys = self.surveys.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = surveys.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Persist a new rule. A missing id becomes `rule-N`; a missing priority
    /// goes after the owner's existing rules.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for an unknown survey or a rule that fails validation.
    pub fn add_rule(&self, survey_id: &str, draft: RuleDraft) -> Result<Rule, StoreError> {
        self.write(survey_id, |logic| {
            let id = draft.id.clone().unwrap_or_else(|| fresh_id(logic.rules()));
            let priority = draft
                .priority
                .unwrap_or_else(|| next_priority(logic.rules(), &draft.owner));
            let rule = draft.into_rule(id, priority);
            let mut rules = logic.rules().to_vec();
            rules.push(rule.clone());
            Ok((rules, vec![rule.id.clone()], rule))
        })
    }

    /// Replace a rule's owner, condition and action, keeping its id. Without
    /// an explicit priority the old one is kept.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for an unknown survey or rule, or a rule that
    /// fails validation.
    pub fn update_rule(
        &self,
        survey_id: &str,
        rule_id: &str,
        draft: RuleDraft,
    ) -> Result<Rule, StoreError> {
        self.write(survey_id, |logic| {
            let mut rules = logic.rules().to_vec();
            let slot = rules
                .iter_mut()
                .find(|r| r.id == rule_id)
                .ok_or_else(|| StoreError::RuleNotFound(RuleId::from(rule_id)))?;
            let priority = draft.priority.unwrap_or(slot.priority);
            let rule = draft.into_rule(slot.id.clone(), priority);
            *slot = rule.clone();
            Ok((rules, vec![rule.id.clone()], rule))
        })
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] for an unknown survey or rule.
    pub fn remove_rule(&self, survey_id: &str, rule_id: &str) -> Result<Rule, StoreError> {
        self.write(survey_id, |logic| {
            let mut rules = logic.rules().to_vec();
            let index = rules
                .iter()
                .position(|r| r.id == rule_id)
                .ok_or_else(|| StoreError::RuleNotFound(RuleId::from(rule_id)))?;
            let removed = rules.remove(index);
            Ok((rules, Vec::new(), removed))
        })
    }

    /// Delete a question. Rules referencing it are kept and stop matching.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for an unknown survey or question.
    pub fn remove_question(&self, survey_id: &str, question_id: &str) -> Result<(), StoreError> {
        let mut surveys = self.surveys.write().unwrap_or_else(PoisonError::into_inner);
        let logic = surveys
            .get(survey_id)
            .ok_or_else(|| StoreError::SurveyNotFound(survey_id.to_owned()))?;
        if !logic.question_ids().iter().any(|q| q == question_id) {
            return Err(StoreError::QuestionNotFound(QuestionId::from(question_id)));
        }
        let dangling = logic
            .rules()
            .iter()
            .filter(|r| {
                r.owner == question_id
                    || *r.source() == question_id
                    || r.action.target().is_some_and(|t| t == question_id)
            })
            .count();
        if dangling > 0 {
            tracing::warn!(
                survey_id,
                question_id,
                dangling,
                "question removed with rules still referencing it"
            );
        }
        let updated = logic.without_question(question_id);
        surveys.insert(survey_id.to_owned(), Arc::new(updated));
        Ok(())
    }

    /// Set the evaluation order of `owner`'s rules: the first id gets
    /// priority 0, the next 1, and so on.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReorderMismatch`] unless `order` names each of
    /// the owner's rules exactly once.
    pub fn reorder(
        &self,
        survey_id: &str,
        owner: &str,
        order: &[RuleId],
    ) -> Result<Vec<Rule>, StoreError> {
        self.write(survey_id, |logic| {
            let owned: HashSet<&RuleId> = logic
                .rules()
                .iter()
                .filter(|r| r.owner == owner)
                .map(|r| &r.id)
                .collect();
            let listed: HashSet<&RuleId> = order.iter().collect();
            if listed.len() != order.len() || listed != owned {
                return Err(StoreError::ReorderMismatch {
                    owner: QuestionId::from(owner),
                });
            }
            let mut rules = logic.rules().to_vec();
            for rule in &mut rules {
                if let Some(position) = order.iter().position(|id| *id == rule.id) {
                    rule.priority = u32::try_from(position).unwrap_or(u32::MAX);
                }
            }
            let reordered: Vec<Rule> = order
                .iter()
                .filter_map(|id| rules.iter().find(|r| r.id == *id).cloned())
                .collect();
            Ok((rules, order.to_vec(), reordered))
        })
    }

    /// Copy-on-write update. `f` returns the new rules, the ids it wrote,
    /// and the value handed back to the caller.
    fn write<T>(
        &self,
        survey_id: &str,
        f: impl FnOnce(&SurveyLogic) -> Result<(Vec<Rule>, Vec<RuleId>, T), StoreError>,
    ) -> Result<T, StoreError> {
        let mut surveys = self.surveys.write().unwrap_or_else(PoisonError::into_inner);
        let current = surveys
            .get(survey_id)
            .ok_or_else(|| StoreError::SurveyNotFound(survey_id.to_owned()))?;
        let (rules, written, out) = f(current)?;
        let candidate = current.with_rules(rules);

        let report = candidate.validate();
        let blocking: Vec<_> = report
            .errors()
            .iter()
            .filter(|e| written.iter().any(|id| e.involves(id)))
            .cloned()
            .collect();
        if !blocking.is_empty() {
            let rejected = RejectedRules::new(blocking);
            tracing::warn!(survey_id, error = %rejected, "rule write rejected");
            return Err(rejected.into());
        }
        for warning in report.warnings() {
            tracing::warn!(survey_id, %warning, "rule write accepted with warning");
        }

        surveys.insert(survey_id.to_owned(), Arc::new(candidate));
        Ok(out)
    }
}

impl SnapshotSource for MemoryStore {
    fn snapshot(&self, survey_id: &str) -> Option<Arc<SurveyLogic>> {
        let surveys = self.surveys.read().unwrap_or_else(PoisonError::into_inner);
        surveys.get(survey_id).cloned()
    }
}

fn fresh_id(rules: &[Rule]) -> RuleId {
    let taken: HashSet<&str> = rules.iter().map(|r| r.id.as_str()).collect();
    (rules.len() + 1..)
        .map(|n| format!("rule-{n}"))
        .find(|id| !taken.contains(id.as_str()))
        .map_or_else(|| RuleId::from("rule-0"), RuleId::new)
}
