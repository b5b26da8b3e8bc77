use super::ids::QuestionId;

/// A survey question as seen by the logic engine. Text, type and options
/// live elsewhere; only the ordering data matters here.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Question {
    pub id: QuestionId,
    pub order: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_required: bool,
}

impl Question {
    #[must_use]
    pub fn new(id: impl Into<QuestionId>, order: i32) -> Self {
        Self {
            id: id.into(),
            order,
            is_required: false,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }
}

/// Sort questions into survey order: `order` ascending, then id.
pub(crate) fn sort_questions(questions: &mut [Question]) {
    questions.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
}
