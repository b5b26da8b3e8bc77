mod answers;
mod condition;
mod error;
mod evaluation;
pub(crate) mod graph;
mod ids;
mod operator;
mod question;
mod rule;
mod survey;

pub use answers::{Answer, Answers};
pub use condition::{answer, AnswerExpr, Condition};
pub use error::{QuestionRole, RejectedRules, ValidationError, ValidationWarning};
pub use evaluation::{EvaluateRequest, EvaluationResult};
pub use graph::{EdgeKind, LogicEdge, LogicGraph, LogicNode};
pub use ids::{QuestionId, RuleId};
pub use operator::LogicOperator;
pub use question::Question;
pub use rule::{ActionKind, LogicAction, Rule, RuleDraft};
pub use survey::{LogicBuilder, RuleBuilder, SurveyLogic};

pub(crate) use rule::next_priority;
pub(crate) use survey::assign_priorities;
