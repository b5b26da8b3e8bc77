use crate::{Question, RuleDraft};

/// The result of parsing a DSL input string.
///
/// Questions keep their declaration order. Rule drafts always carry an id;
/// the priority is `None` when the rule omits its annotation.
#[derive(Debug)]
pub struct ParsedLogic {
    pub questions: Vec<Question>,
    pub rules: Vec<RuleDraft>,
}
