use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::trials::allocation::PopulationLedger;
use crate::trials::catalog::{TrialPackage, UserState};
use crate::trials::store::TrialStore;

use super::domain::UserId;
use super::manager::{TrialError, TrialSessionManager};

/// Router builder exposing the trial lifecycle plus catalog administration
/// and the population drift view.
pub fn trial_router<S, L>(manager: Arc<TrialSessionManager<S, L>>) -> Router
where
    S: TrialStore + 'static,
    L: PopulationLedger + 'static,
{
    Router::new()
        .route("/api/v1/trials/sessions", post(start_handler::<S, L>))
        .route(
            "/api/v1/trials/sessions/:user_id/answers",
            post(answer_handler::<S, L>),
        )
        .route(
            "/api/v1/trials/sessions/:user_id",
            delete(cancel_handler::<S, L>),
        )
        .route("/api/v1/trials/available", get(available_handler::<S, L>))
        .route("/api/v1/trials/packages", get(packages_handler::<S, L>))
        .route(
            "/api/v1/trials/packages/:key/enabled",
            put(set_enabled_handler::<S, L>),
        )
        .route("/api/v1/trials/population", get(population_handler::<S, L>))
        .with_state(manager)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartRequest {
    pub(crate) user_id: String,
    /// Exact package to run; mutually exclusive with `tag`.
    #[serde(default)]
    pub(crate) package: Option<String>,
    /// Draw a package carrying this tag, weighted by trigger chance.
    #[serde(default)]
    pub(crate) tag: Option<String>,
    #[serde(default)]
    pub(crate) rank: u32,
    #[serde(default)]
    pub(crate) attribute: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerRequest {
    pub(crate) answer: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AvailableQuery {
    #[serde(default)]
    pub(crate) rank: u32,
    #[serde(default)]
    pub(crate) attribute: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetEnabledRequest {
    pub(crate) enabled: bool,
}

/// Catalog listing entry; question bodies and scoring tables stay inside
/// the engine.
#[derive(Debug, Serialize)]
pub(crate) struct PackageView {
    pub(crate) key: &'static str,
    pub(crate) name: &'static str,
    pub(crate) description: &'static str,
    pub(crate) kind: &'static str,
    pub(crate) tags: &'static [&'static str],
    pub(crate) trigger_chance: f64,
    pub(crate) enabled: bool,
}

impl PackageView {
    fn render(package: &TrialPackage, enabled: bool) -> Self {
        Self {
            key: package.key,
            name: package.name,
            description: package.description,
            kind: package.kind.label(),
            tags: package.tags,
            trigger_chance: package.trigger_chance,
            enabled,
        }
    }
}

pub(crate) async fn start_handler<S, L>(
    State(manager): State<Arc<TrialSessionManager<S, L>>>,
    axum::Json(request): axum::Json<StartRequest>,
) -> Response
where
    S: TrialStore + 'static,
    L: PopulationLedger + 'static,
{
    let user_id = UserId(request.user_id);
    let state = UserState {
        rank: request.rank,
        attribute: request.attribute,
    };
    let started = match (request.package, request.tag) {
        (Some(key), None) => manager.start(user_id, &key, &state),
        (None, Some(tag)) => manager.start_by_tag(user_id, &tag, &state),
        _ => {
            let payload = json!({
                "error": "request must name exactly one of 'package' or 'tag'",
                "code": "invalid_request",
            });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };
    match started {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(error) => rejection(error),
    }
}

pub(crate) async fn answer_handler<S, L>(
    State(manager): State<Arc<TrialSessionManager<S, L>>>,
    Path(user_id): Path<String>,
    axum::Json(request): axum::Json<AnswerRequest>,
) -> Response
where
    S: TrialStore + 'static,
    L: PopulationLedger + 'static,
{
    let user_id = UserId(user_id);
    match manager.submit_answer(&user_id, &request.answer).await {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => rejection(error),
    }
}

pub(crate) async fn cancel_handler<S, L>(
    State(manager): State<Arc<TrialSessionManager<S, L>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: TrialStore + 'static,
    L: PopulationLedger + 'static,
{
    let user_id = UserId(user_id);
    match manager.cancel(&user_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => rejection(error),
    }
}

pub(crate) async fn available_handler<S, L>(
    State(manager): State<Arc<TrialSessionManager<S, L>>>,
    Query(query): Query<AvailableQuery>,
) -> Response
where
    S: TrialStore + 'static,
    L: PopulationLedger + 'static,
{
    let state = UserState {
        rank: query.rank,
        attribute: query.attribute,
    };
    let views: Vec<PackageView> = manager
        .available_trials(&state)
        .iter()
        .map(|package| PackageView::render(package, true))
        .collect();
    (StatusCode::OK, axum::Json(views)).into_response()
}

pub(crate) async fn packages_handler<S, L>(
    State(manager): State<Arc<TrialSessionManager<S, L>>>,
) -> Response
where
    S: TrialStore + 'static,
    L: PopulationLedger + 'static,
{
    let catalog = manager.catalog();
    let views: Vec<PackageView> = catalog
        .packages()
        .iter()
        .map(|package| PackageView::render(package, catalog.is_enabled(package.key)))
        .collect();
    (StatusCode::OK, axum::Json(views)).into_response()
}

pub(crate) async fn set_enabled_handler<S, L>(
    State(manager): State<Arc<TrialSessionManager<S, L>>>,
    Path(key): Path<String>,
    axum::Json(request): axum::Json<SetEnabledRequest>,
) -> Response
where
    S: TrialStore + 'static,
    L: PopulationLedger + 'static,
{
    match manager.catalog().set_enabled(&key, request.enabled) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string(), "code": "unknown_package" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn population_handler<S, L>(
    State(manager): State<Arc<TrialSessionManager<S, L>>>,
) -> Response
where
    S: TrialStore + 'static,
    L: PopulationLedger + 'static,
{
    match manager.population_report().await {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => rejection(error),
    }
}

/// Maps engine rejections onto HTTP statuses; the machine-readable code
/// rides along for chat adapters that front this API.
fn rejection(error: TrialError) -> Response {
    let status = match &error {
        TrialError::SessionExists | TrialError::CompletionInProgress => StatusCode::CONFLICT,
        TrialError::NoSession
        | TrialError::UnknownPackage(_)
        | TrialError::NoEligiblePackage(_) => StatusCode::NOT_FOUND,
        TrialError::ConditionsNotMet | TrialError::AbuseDetected { .. } => StatusCode::FORBIDDEN,
        TrialError::MalformedChoice { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        TrialError::SessionExpired => StatusCode::GONE,
        TrialError::Scoring(_) | TrialError::Allocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string(), "code": error.code() });
    (status, axum::Json(payload)).into_response()
}
