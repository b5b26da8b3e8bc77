use super::ids::{QuestionId, RuleId};
use super::operator::LogicOperator;
use super::rule::ActionKind;

/// A question in the logic map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LogicNode {
    pub id: QuestionId,
    /// Position in survey order.
    pub order: usize,
    /// Some rule controls this question.
    pub has_logic: bool,
    /// Some rule inspects this question's answer.
    pub is_conditional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeKind {
    /// Source question → owner question.
    Condition,
    /// Owner question → skip target.
    Jump,
}

/// One rule drawn as an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LogicEdge {
    pub rule_id: RuleId,
    pub from: QuestionId,
    pub to: QuestionId,
    pub kind: EdgeKind,
    pub operator: LogicOperator,
    pub condition_value: String,
    pub action: ActionKind,
    pub label: String,
}

/// Directed rule graph for the admin logic map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogicGraph {
    pub nodes: Vec<LogicNode>,
    pub edges: Vec<LogicEdge>,
}

impl LogicGraph {
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&LogicNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a LogicEdge> + 'a {
        self.edges.iter().filter(move |e| e.from == id)
    }

    pub fn edges_to<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a LogicEdge> + 'a {
        self.edges.iter().filter(move |e| e.to == id)
    }
}

/// Human-readable edge label, e.g. `= '2' → Hide` or `is answered → End survey`.
pub(crate) fn edge_label(operator: LogicOperator, value: &str, action: ActionKind) -> String {
    if operator.requires_value() {
        format!("{} '{}' {}", operator.label(), value, action.label())
    } else {
        format!("{} {}", operator.label(), action.label())
    }
}
