use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::{EvaluateRequest, EvaluationResult, LogicEdge, LogicNode, SurveyLogic};

/// Supplies the current logic snapshot of a survey.
///
/// Implementations must hand out a consistent snapshot: a rule write that
/// happens during an evaluation is either fully visible to it or not at all.
pub trait SnapshotSource {
    fn snapshot(&self, survey_id: &str) -> Option<Arc<SurveyLogic>>;
}

impl SnapshotSource for HashMap<String, Arc<SurveyLogic>> {
    fn snapshot(&self, survey_id: &str) -> Option<Arc<SurveyLogic>> {
        self.get(survey_id).cloned()
    }
}

impl<T: SnapshotSource + ?Sized> SnapshotSource for Arc<T> {
    fn snapshot(&self, survey_id: &str) -> Option<Arc<SurveyLogic>> {
        (**self).snapshot(survey_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("survey '{0}' not found")]
    SurveyNotFound(String),
}

/// The validated rule graph of one survey, shaped for the admin logic map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LogicMap {
    pub survey_id: String,
    pub nodes: Vec<LogicNode>,
    pub edges: Vec<LogicEdge>,
    /// Rules that no longer validate, e.g. after a question was deleted.
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Stateless request/response boundary over a [`SnapshotSource`].
#[derive(Debug, Clone)]
pub struct LogicService<S> {
    source: S,
}

impl<S: SnapshotSource> LogicService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn snapshot(&self, survey_id: &str) -> Result<Arc<SurveyLogic>, ServiceError> {
        self.source
            .snapshot(survey_id)
            .ok_or_else(|| ServiceError::SurveyNotFound(survey_id.to_owned()))
    }

    /// Evaluate visibility and navigation for a survey.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::SurveyNotFound`] for an unknown survey. Rule
    /// defects never fail an evaluation.
    pub fn evaluate(
        &self,
        survey_id: &str,
        request: &EvaluateRequest,
    ) -> Result<EvaluationResult, ServiceError> {
        let logic = self.snapshot(survey_id)?;
        let result = logic.evaluate_request(request);
        tracing::debug!(
            survey_id,
            answers = request.answers.len(),
            end = result.should_end_survey(),
            "evaluated survey logic"
        );
        Ok(result)
    }

    /// Build the logic map for a survey.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::SurveyNotFound`] for an unknown survey.
    pub fn logic_map(&self, survey_id: &str) -> Result<LogicMap, ServiceError> {
        let logic = self.snapshot(survey_id)?;
        let report = logic.validate();
        let errors = report.errors().iter().map(ToString::to_string).collect();
        let warnings = report.warnings().iter().map(ToString::to_string).collect();
        let graph = report.into_graph();
        Ok(LogicMap {
            survey_id: survey_id.to_owned(),
            nodes: graph.nodes,
            edges: graph.edges,
            errors,
            warnings,
        })
    }
}
