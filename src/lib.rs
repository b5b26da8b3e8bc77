//! Question branching logic for surveys.
//!
//! Authors attach rules to questions ("hide Q3 when Q1 == 2", "skip to Q7
//! when Q2 is answered"). [`SurveyLogic`] validates them once and evaluates
//! them on every answer change, returning which questions are visible and
//! where the respondent goes next.
//!
//! ```
//! use branchwise::{answer, Answers, LogicBuilder};
//!
//! let logic = LogicBuilder::new()
//!     .question("age")
//!     .question("alcohol")
//!     .question("comments")
//!     .rule("minors", |r| r.on("alcohol").when(answer("age").less_than(18)).hide())
//!     .compile()
//!     .unwrap();
//!
//! let result = logic.evaluate(&Answers::new().set("age", "16"), None);
//! assert!(result.is_hidden("alcohol"));
//! assert_eq!(result.next_question_id().unwrap(), "comments");
//! ```

#[cfg(feature = "serde")]
pub mod dto;
mod error;
mod evaluate;
pub mod parse;
mod resolve;
#[cfg(feature = "binary-cache")]
pub mod serial;
#[cfg(feature = "server")]
pub mod server;
pub mod service;
pub mod store;
mod types;
mod validate;

pub use error::BranchwiseError;
pub use evaluate::evaluate_condition;
pub use resolve::resolve;
#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
pub use service::{LogicMap, LogicService, ServiceError, SnapshotSource};
pub use store::{MemoryStore, StoreError};
pub use types::{
    answer, ActionKind, Answer, AnswerExpr, Answers, Condition, EdgeKind, EvaluateRequest,
    EvaluationResult, LogicAction, LogicBuilder, LogicEdge, LogicGraph, LogicNode, LogicOperator,
    Question, QuestionId, QuestionRole, RejectedRules, Rule, RuleBuilder, RuleDraft, RuleId,
    SurveyLogic, ValidationError, ValidationWarning,
};
pub use validate::{validate, ValidationReport};
