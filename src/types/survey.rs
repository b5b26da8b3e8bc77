use std::collections::HashMap;
use std::fmt;

use super::answers::Answers;
use super::condition::Condition;
use super::error::{RejectedRules, ValidationError};
use super::evaluation::{EvaluateRequest, EvaluationResult};
use super::graph::LogicGraph;
use super::ids::{QuestionId, RuleId};
use super::question::{sort_questions, Question};
use super::rule::{LogicAction, Rule, RuleDraft};
use crate::validate::ValidationReport;

/// Builder for constructing a [`SurveyLogic`].
///
/// Questions are registered in survey order; rules are defined via closures
/// and validated on [`compile()`](Self::compile).
///
/// # Example
///
/// ```
/// use branchwise::{answer, Answers, LogicBuilder};
///
/// let logic = LogicBuilder::new()
///     .question("smoker")
///     .question("cigarettes_per_day")
///     .question("feedback")
///     .rule("skip_cigarettes", |r| {
///         r.on("cigarettes_per_day").when(answer("smoker").equals("no")).hide()
///     })
///     .compile()
///     .unwrap();
///
/// let result = logic.evaluate(&Answers::new().set("smoker", "no"), None);
/// assert!(result.is_hidden("cigarettes_per_day"));
/// assert_eq!(result.next_question_id().unwrap(), "feedback");
/// ```
#[derive(Debug, Default)]
pub struct LogicBuilder {
    questions: Vec<Question>,
    rules: Vec<(RuleId, RuleBuilder)>,
}

/// Intermediate builder passed to the rule definition closure.
///
/// A rule needs an owner (`on`), a condition (`when`) and an action.
#[derive(Debug, Default)]
pub struct RuleBuilder {
    owner: Option<QuestionId>,
    condition: Option<Condition>,
    action: Option<LogicAction>,
    priority: Option<u32>,
}

impl LogicBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an optional question to the survey.
    #[must_use]
    pub fn question(self, id: &str) -> Self {
        let order = self.next_order();
        self.with_question(Question::new(id, order))
    }

    /// Append a required question to the survey.
    #[must_use]
    pub fn required_question(self, id: &str) -> Self {
        let order = self.next_order();
        self.with_question(Question::new(id, order).required())
    }

    #[must_use]
    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    fn next_order(&self) -> i32 {
        i32::try_from(self.questions.len()).unwrap_or(i32::MAX)
    }

    /// Define a rule.
    #[must_use]
    pub fn rule(mut self, id: &str, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        self.rules.push((RuleId::from(id), f(RuleBuilder::default())));
        self
    }

    /// Validate and freeze the survey logic.
    ///
    /// # Errors
    ///
    /// Returns [`RejectedRules`] listing every incomplete rule and every
    /// validation error.
    pub fn compile(self) -> Result<SurveyLogic, RejectedRules> {
        let mut errors = Vec::new();
        let mut drafts = Vec::with_capacity(self.rules.len());
        for (id, builder) in self.rules {
            match builder.finish(&id) {
                Ok(draft) => drafts.push(draft.with_id(id)),
                Err(err) => errors.push(err),
            }
        }
        if !errors.is_empty() {
            return Err(RejectedRules::new(errors));
        }
        SurveyLogic::new(self.questions, assign_priorities(drafts))
    }
}

impl RuleBuilder {
    /// Set the owner question.
    #[must_use]
    pub fn on(mut self, owner: &str) -> Self {
        self.owner = Some(QuestionId::from(owner));
        self
    }

    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn show(self) -> Self {
        self.action(LogicAction::Show)
    }

    #[must_use]
    pub fn hide(self) -> Self {
        self.action(LogicAction::Hide)
    }

    #[must_use]
    pub fn skip_to(self, target: &str) -> Self {
        self.action(LogicAction::SkipTo(QuestionId::from(target)))
    }

    #[must_use]
    pub fn end(self) -> Self {
        self.action(LogicAction::End)
    }

    #[must_use]
    pub fn action(mut self, action: LogicAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Explicit priority. Without one the rule goes after the owner's other rules.
    #[must_use]
    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    fn finish(self, id: &RuleId) -> Result<RuleDraft, ValidationError> {
        let missing = |part| ValidationError::Incomplete {
            rule: id.clone(),
            part,
        };
        let owner = self.owner.ok_or_else(|| missing("owner"))?;
        let condition = self.condition.ok_or_else(|| missing("condition"))?;
        let action = self.action.ok_or_else(|| missing("action"))?;
        Ok(RuleDraft {
            id: None,
            owner,
            condition,
            action,
            priority: self.priority,
        })
    }
}

/// Resolve draft priorities. Explicit priorities are kept; the rest are
/// appended after the highest priority of their owner, in declaration order.
///
/// Drafts must carry ids.
pub(crate) fn assign_priorities(drafts: Vec<RuleDraft>) -> Vec<Rule> {
    let mut next: HashMap<QuestionId, u32> = HashMap::new();
    for draft in &drafts {
        if let Some(p) = draft.priority {
            let slot = next.entry(draft.owner.clone()).or_insert(0);
            *slot = (*slot).max(p.saturating_add(1));
        }
    }
    drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| {
            let priority = match draft.priority {
                Some(p) => p,
                None => {
                    let slot = next.entry(draft.owner.clone()).or_insert(0);
                    let p = *slot;
                    *slot = slot.saturating_add(1);
                    p
                }
            };
            let id = draft
                .id
                .clone()
                .unwrap_or_else(|| RuleId::new(format!("rule-{}", i + 1)));
            draft.into_rule(id, priority)
        })
        .collect()
}

/// An immutable snapshot of a survey's questions and logic rules.
///
/// Cheap to share behind `Arc`; evaluation borrows it read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyLogic {
    questions: Vec<Question>,
    question_ids: Vec<QuestionId>,
    rules: Vec<Rule>,
}

impl SurveyLogic {
    /// Build a snapshot, rejecting it if validation reports any error.
    /// Validation warnings are logged and otherwise accepted.
    ///
    /// # Errors
    ///
    /// Returns [`RejectedRules`] with every validation error.
    pub fn new(questions: Vec<Question>, rules: Vec<Rule>) -> Result<Self, RejectedRules> {
        let logic = Self::unchecked(questions, rules);
        let report = logic.validate();
        for warning in report.warnings() {
            tracing::warn!(%warning, "survey logic accepted with warning");
        }
        report.into_result().map(|_| logic)
    }

    /// Build a snapshot without validation, e.g. from storage after a question
    /// was deleted. Evaluation stays total over such rule sets.
    #[must_use]
    pub fn unchecked(mut questions: Vec<Question>, rules: Vec<Rule>) -> Self {
        sort_questions(&mut questions);
        let question_ids = questions.iter().map(|q| q.id.clone()).collect();
        Self {
            questions,
            question_ids,
            rules,
        }
    }

    /// Evaluate visibility and navigation for the given answers.
    pub fn evaluate(&self, answers: &Answers, current: Option<&QuestionId>) -> EvaluationResult {
        crate::resolve::resolve(&self.rules, answers, &self.question_ids, current)
    }

    /// Evaluate a wire request.
    pub fn evaluate_request(&self, request: &EvaluateRequest) -> EvaluationResult {
        let answers: Answers = request.answers.iter().collect();
        self.evaluate(&answers, request.current_question_id.as_ref())
    }

    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        crate::validate::validate(&self.rules, &self.question_ids)
    }

    #[must_use]
    pub fn logic_graph(&self) -> LogicGraph {
        self.validate().into_graph()
    }

    /// Questions in survey order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_ids(&self) -> &[QuestionId] {
        &self.question_ids
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Rules owned by `owner`, in evaluation order.
    #[must_use]
    pub fn rules_for(&self, owner: &str) -> Vec<&Rule> {
        let mut owned: Vec<&Rule> = self.rules.iter().filter(|r| r.owner == owner).collect();
        owned.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        owned
    }

    /// Render the snapshot in the rule DSL.
    #[must_use]
    pub fn to_dsl(&self) -> String {
        let mut out = String::new();
        for q in &self.questions {
            out.push_str("question ");
            out.push_str(q.id.as_str());
            if q.is_required {
                out.push_str(" (required)");
            }
            out.push('\n');
        }
        for rule in &self.rules {
            out.push_str(&rule.to_string());
            out.push('\n');
        }
        out
    }

    /// Parse DSL text and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`BranchwiseError`](crate::BranchwiseError) on parse or
    /// validation failure.
    pub fn from_dsl(input: &str) -> Result<Self, crate::BranchwiseError> {
        let parsed = crate::parse::parse(input)?;
        let logic = Self::new(parsed.questions, assign_priorities(parsed.rules))?;
        Ok(logic)
    }

    /// Read a DSL file and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`BranchwiseError`](crate::BranchwiseError) on I/O, parse or
    /// validation failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::BranchwiseError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_dsl(&input)
    }

    /// Same questions, different rules. Callers validate.
    pub(crate) fn with_rules(&self, rules: Vec<Rule>) -> Self {
        Self {
            questions: self.questions.clone(),
            question_ids: self.question_ids.clone(),
            rules,
        }
    }

    pub(crate) fn without_question(&self, question: &str) -> Self {
        let questions = self
            .questions
            .iter()
            .filter(|q| q.id != question)
            .cloned()
            .collect();
        Self::unchecked(questions, self.rules.clone())
    }
}

#[cfg(feature = "binary-cache")]
impl SurveyLogic {
    /// Serialize this snapshot to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload metadata so callers can tell when the DSL source changed.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize a snapshot previously produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or structural failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or structural failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for SurveyLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SurveyLogic({} questions, {} rules)",
            self.questions.len(),
            self.rules.len(),
        )
    }
}
