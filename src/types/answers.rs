use std::collections::HashMap;

use super::ids::QuestionId;

/// One submitted answer in its canonical serialized form: a choice index such
/// as `"2"`, `"true"`/`"false"`, free text, or comma-joined indices for
/// multi-select questions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Answer {
    pub question_id: QuestionId,
    pub value: String,
}

impl Answer {
    #[must_use]
    pub fn new(question_id: impl Into<QuestionId>, value: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            value: value.into(),
        }
    }
}

/// Answers collected so far, keyed by question.
///
/// A question with no entry is *absent*, which is distinct from an entry whose
/// value is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answers {
    data: HashMap<QuestionId, String>,
}

impl Answers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer, replacing any earlier one for the same question.
    #[must_use]
    pub fn set(mut self, question: &str, value: impl Into<String>) -> Self {
        self.insert(QuestionId::from(question), value.into());
        self
    }

    pub fn insert(&mut self, question: QuestionId, value: String) {
        self.data.insert(question, value);
    }

    #[must_use]
    pub fn get(&self, question: &str) -> Option<&str> {
        self.data.get(question).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, question: &str) -> bool {
        self.data.contains_key(question)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Later entries for the same question win.
impl FromIterator<Answer> for Answers {
    fn from_iter<I: IntoIterator<Item = Answer>>(iter: I) -> Self {
        let mut answers = Answers::new();
        for answer in iter {
            answers.insert(answer.question_id, answer.value);
        }
        answers
    }
}

impl<'a> FromIterator<&'a Answer> for Answers {
    fn from_iter<I: IntoIterator<Item = &'a Answer>>(iter: I) -> Self {
        iter.into_iter().cloned().collect()
    }
}
