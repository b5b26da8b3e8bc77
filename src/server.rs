//! HTTP surface: evaluation and logic map for the survey runtime and admin
//! UI, plus rule authoring endpoints backed by a [`MemoryStore`].

use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::dto::{DtoError, LogicRuleDto};
use crate::{
    BranchwiseError, EvaluateRequest, EvaluationResult, LogicMap, LogicService, MemoryStore,
    RuleDraft, RuleId, ServiceError, SnapshotSource, StoreError, SurveyLogic,
};

pub type AppState = Arc<LogicService<MemoryStore>>;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Directory of `*.logic` files, one survey per file named by its stem.
    pub surveys: PathBuf,
}

/// Load every `*.logic` file in `dir` into `store`. Returns the number of
/// surveys loaded.
///
/// # Errors
///
/// Fails on the first unreadable directory or invalid survey file.
pub fn load_surveys(store: &MemoryStore, dir: &FsPath) -> Result<usize, BranchwiseError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "logic"))
        .collect();
    paths.sort();

    let mut loaded = 0;
    for path in paths {
        let Some(survey_id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_owned) else {
            continue;
        };
        let logic = SurveyLogic::from_file(&path).map_err(|source| {
            if let BranchwiseError::Parse(parse) = &source {
                tracing::error!(
                    path = %path.display(),
                    line = parse.line(),
                    column = parse.column(),
                    reason = parse.reason(),
                    "survey file does not parse"
                );
            }
            BranchwiseError::SurveyFile {
                path: path.clone(),
                source: Box::new(source),
            }
        })?;
        tracing::info!(
            %survey_id,
            questions = logic.questions().len(),
            rules = logic.rules().len(),
            "loaded survey"
        );
        store.put_survey(&survey_id, logic);
        loaded += 1;
    }
    Ok(loaded)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/surveys", get(list_surveys))
        .route("/surveys/{id}/logic/evaluate", post(evaluate))
        .route("/surveys/{id}/logic/map", get(logic_map))
        .route("/surveys/{id}/logic/rules", get(list_rules).post(create_rule))
        .route("/surveys/{id}/logic/rules/{rule_id}", put(update_rule).delete(delete_rule))
        .route("/surveys/{id}/questions/{question_id}/logic/reorder", put(reorder_rules))
        .route("/surveys/{id}/questions/{question_id}", delete(delete_question))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Load surveys from `config.surveys` and serve until the process stops.
///
/// # Errors
///
/// Returns [`BranchwiseError`] if surveys fail to load or the socket fails.
pub async fn serve(config: ServerConfig) -> Result<(), BranchwiseError> {
    let store = MemoryStore::new();
    let loaded = load_surveys(&store, &config.surveys)?;
    tracing::info!(loaded, dir = %config.surveys.display(), "surveys ready");

    let app = router(Arc::new(LogicService::new(store)));
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %config.bind, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// -- Errors -----------------------------------------------------------------

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Unprocessable { message: String, details: Vec<String> },
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::NotFound(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SurveyNotFound(_)
            | StoreError::RuleNotFound(_)
            | StoreError::QuestionNotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::ReorderMismatch { .. } => ApiError::Unprocessable {
                message: err.to_string(),
                details: Vec::new(),
            },
            StoreError::Rejected(rejected) => ApiError::Unprocessable {
                message: "rule set rejected".to_owned(),
                details: rejected.errors().iter().map(ToString::to_string).collect(),
            },
        }
    }
}

impl From<DtoError> for ApiError {
    fn from(err: DtoError) -> Self {
        ApiError::Unprocessable {
            message: err.to_string(),
            details: Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Unprocessable { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": message, "details": details })),
            )
                .into_response(),
        }
    }
}

// -- Handlers ---------------------------------------------------------------

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_surveys(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.source().survey_ids())
}

async fn evaluate(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluationResult>, ApiError> {
    Ok(Json(state.evaluate(&survey_id, &request)?))
}

async fn logic_map(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
) -> Result<Json<LogicMap>, ApiError> {
    Ok(Json(state.logic_map(&survey_id)?))
}

async fn list_rules(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
) -> Result<Json<Vec<LogicRuleDto>>, ApiError> {
    let logic = state
        .source()
        .snapshot(&survey_id)
        .ok_or_else(|| ServiceError::SurveyNotFound(survey_id.clone()))?;
    let mut rules: Vec<_> = logic.rules().iter().collect();
    rules.sort_by(|a, b| (&a.owner, a.priority, &a.id).cmp(&(&b.owner, b.priority, &b.id)));
    Ok(Json(rules.into_iter().map(LogicRuleDto::from).collect()))
}

async fn create_rule(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
    Json(dto): Json<LogicRuleDto>,
) -> Result<(StatusCode, Json<LogicRuleDto>), ApiError> {
    let draft = RuleDraft::try_from(dto)?;
    let rule = state.source().add_rule(&survey_id, draft)?;
    Ok((StatusCode::CREATED, Json(LogicRuleDto::from(&rule))))
}

async fn update_rule(
    State(state): State<AppState>,
    Path((survey_id, rule_id)): Path<(String, String)>,
    Json(dto): Json<LogicRuleDto>,
) -> Result<Json<LogicRuleDto>, ApiError> {
    let draft = RuleDraft::try_from(dto)?;
    let rule = state.source().update_rule(&survey_id, &rule_id, draft)?;
    Ok(Json(LogicRuleDto::from(&rule)))
}

async fn delete_rule(
    State(state): State<AppState>,
    Path((survey_id, rule_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.source().remove_rule(&survey_id, &rule_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderRequest {
    rule_ids: Vec<RuleId>,
}

async fn reorder_rules(
    State(state): State<AppState>,
    Path((survey_id, question_id)): Path<(String, String)>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Vec<LogicRuleDto>>, ApiError> {
    let rules = state.source().reorder(&survey_id, &question_id, &request.rule_ids)?;
    Ok(Json(rules.iter().map(LogicRuleDto::from).collect()))
}

async fn delete_question(
    State(state): State<AppState>,
    Path((survey_id, question_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.source().remove_question(&survey_id, &question_id)?;
    Ok(StatusCode::NO_CONTENT)
}
