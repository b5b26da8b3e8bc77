use std::fmt;

use super::answers::Answer;
use super::ids::QuestionId;

/// Input to one evaluation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct EvaluateRequest {
    /// The question the respondent just answered. When absent, the last
    /// answered question in survey order is used.
    #[cfg_attr(feature = "serde", serde(default))]
    pub current_question_id: Option<QuestionId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub answers: Vec<Answer>,
}

impl EvaluateRequest {
    #[must_use]
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            current_question_id: None,
            answers,
        }
    }

    #[must_use]
    pub fn at(mut self, current: impl Into<QuestionId>) -> Self {
        self.current_question_id = Some(current.into());
        self
    }
}

/// Visibility and navigation decision for one set of answers.
///
/// Question id lists are in survey order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[must_use]
pub struct EvaluationResult {
    visible_question_ids: Vec<QuestionId>,
    hidden_question_ids: Vec<QuestionId>,
    next_question_id: Option<QuestionId>,
    should_end_survey: bool,
}

impl EvaluationResult {
    pub(crate) fn new(
        visible_question_ids: Vec<QuestionId>,
        hidden_question_ids: Vec<QuestionId>,
        next_question_id: Option<QuestionId>,
        should_end_survey: bool,
    ) -> Self {
        Self {
            visible_question_ids,
            hidden_question_ids,
            next_question_id,
            should_end_survey,
        }
    }

    #[must_use]
    pub fn visible_question_ids(&self) -> &[QuestionId] {
        &self.visible_question_ids
    }

    #[must_use]
    pub fn hidden_question_ids(&self) -> &[QuestionId] {
        &self.hidden_question_ids
    }

    #[must_use]
    pub fn next_question_id(&self) -> Option<&QuestionId> {
        self.next_question_id.as_ref()
    }

    #[must_use]
    pub fn should_end_survey(&self) -> bool {
        self.should_end_survey
    }

    #[must_use]
    pub fn is_visible(&self, question: &str) -> bool {
        self.visible_question_ids.iter().any(|q| q == question)
    }

    #[must_use]
    pub fn is_hidden(&self, question: &str) -> bool {
        self.hidden_question_ids.iter().any(|q| q == question)
    }
}

fn join(ids: &[QuestionId]) -> String {
    ids.iter()
        .map(QuestionId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "visible: [{}]", join(&self.visible_question_ids))?;
        write!(f, ", hidden: [{}]", join(&self.hidden_question_ids))?;
        if self.should_end_survey {
            write!(f, ", end survey")
        } else {
            match &self.next_question_id {
                Some(next) => write!(f, ", next: {next}"),
                None => write!(f, ", next: none"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<QuestionId> {
        raw.iter().map(|s| QuestionId::from(*s)).collect()
    }

    #[test]
    fn accessors() {
        let result = EvaluationResult::new(
            ids(&["q1", "q3"]),
            ids(&["q2"]),
            Some(QuestionId::from("q3")),
            false,
        );
        assert!(result.is_visible("q1"));
        assert!(result.is_hidden("q2"));
        assert!(!result.is_visible("q2"));
        assert_eq!(result.next_question_id(), Some(&QuestionId::from("q3")));
        assert!(!result.should_end_survey());
    }

    #[test]
    fn display_next() {
        let result =
            EvaluationResult::new(ids(&["q1", "q3"]), ids(&["q2"]), Some("q3".into()), false);
        assert_eq!(result.to_string(), "visible: [q1, q3], hidden: [q2], next: q3");
    }

    #[test]
    fn display_end() {
        let result = EvaluationResult::new(ids(&["q1"]), vec![], None, true);
        assert_eq!(result.to_string(), "visible: [q1], hidden: [], end survey");
    }

    #[test]
    fn request_builder() {
        let request = EvaluateRequest::new(vec![Answer::new("q1", "2")]).at("q1");
        assert_eq!(request.current_question_id, Some(QuestionId::from("q1")));
        assert_eq!(request.answers.len(), 1);
    }
}
