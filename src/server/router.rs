use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tracing::{info, warn};

use crate::config::metadata::MetadataSnapshot;
use crate::error::MetadataError;
use crate::minter::{scopes_from_query, TokenMinter};
use crate::observability::metrics::get_metrics;
use crate::utils::constants::*;

#[derive(Clone)]
pub struct AppState {
    pub metadata: Arc<MetadataSnapshot>,
    pub minter: TokenMinter,
}

impl AppState {
    pub fn new(metadata: MetadataSnapshot, minter: TokenMinter) -> Self {
        Self {
            metadata: Arc::new(metadata),
            minter,
        }
    }
}

/// Every metadata path is resolved by one fallback handler so the
/// `Metadata-Flavor` gate runs before path matching.
pub fn router(state: AppState) -> Router {
    Router::new().fallback(handle_request).with_state(state)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    InstanceId,
    Region,
    Zone,
    Aliases,
    Email,
    Token,
    Identity,
    NumericProjectId,
    ProjectId,
}

impl Route {
    fn from_path(path: &str) -> Option<Self> {
        let route = match path {
            PATH_INSTANCE_ID => Route::InstanceId,
            PATH_SA_ALIASES => Route::Aliases,
            PATH_SA_EMAIL => Route::Email,
            PATH_SA_TOKEN => Route::Token,
            PATH_SA_IDENTITY => Route::Identity,
            PATH_INSTANCE_REGION => Route::Region,
            PATH_INSTANCE_ZONE => Route::Zone,
            PATH_NUMERIC_PROJECT_ID => Route::NumericProjectId,
            PATH_PROJECT_ID => Route::ProjectId,
            _ => return None,
        };
        Some(route)
    }
}

async fn handle_request(State(state): State<AppState>, req: Request) -> Response {
    let metrics = get_metrics().await;
    let uri = req.uri().clone();
    info!(
        "Handling request for {}",
        uri.path_and_query().map(|pq| pq.as_str()).unwrap_or(uri.path())
    );

    let query = Query::<Vec<(String, String)>>::try_from_uri(&uri)
        .map(|Query(query)| query)
        .unwrap_or_default();
    let route = Route::from_path(uri.path());

    let response = respond(&state, req.headers(), route, &query).await;

    let path_label = if route.is_some() { uri.path() } else { "other" };
    metrics
        .requests
        .with_label_values(&[path_label, response.status().as_str()])
        .inc();
    response
}

async fn respond(
    state: &AppState,
    headers: &HeaderMap,
    route: Option<Route>,
    query: &[(String, String)],
) -> Response {
    let flavor = headers
        .get(METADATA_FLAVOR_HEADER)
        .map(|value| value.as_bytes());
    if flavor != Some(METADATA_FLAVOR_VALUE.as_bytes()) {
        return reply(StatusCode::FORBIDDEN, CONTENT_TYPE_HTML, Body::empty());
    }

    let Some(route) = route else {
        return reply(StatusCode::NOT_FOUND, CONTENT_TYPE_HTML, "404 page not found\n");
    };

    let md = &state.metadata;
    match route {
        Route::InstanceId => text(md.instance.id.clone()),
        Route::Aliases => text(DEFAULT_SERVICE_ACCOUNT_ALIAS),
        Route::Email => text(state.minter.service_account_email().to_owned()),
        Route::Region => text(md.instance.region.clone()),
        Route::Zone => text(md.zone()),
        Route::NumericProjectId => text(md.project.numeric_project_id.clone()),
        Route::ProjectId => text(md.project.project_id.clone()),
        Route::Token => {
            let scopes = scopes_from_query(first_param(query, "scopes"));
            match state.minter.mint_access(scopes).await {
                Ok(body) => reply(StatusCode::OK, CONTENT_TYPE_JSON, body),
                Err(e) => internal_error(e),
            }
        }
        Route::Identity => {
            let audience = first_param(query, "audience").unwrap_or_default();
            match state.minter.mint_identity(audience).await {
                Ok(token) => text(token),
                Err(e) => internal_error(e),
            }
        }
    }
}

/// First value wins when a parameter is repeated.
fn first_param<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn text(body: impl Into<Body>) -> Response {
    reply(StatusCode::OK, CONTENT_TYPE_TEXT, body)
}

fn internal_error(err: MetadataError) -> Response {
    warn!("responding 500: {}", err);
    reply(StatusCode::INTERNAL_SERVER_ERROR, CONTENT_TYPE_PLAIN, err.to_string())
}

/// Response with the fixed metadata-server headers.
fn reply(status: StatusCode, content_type: &'static str, body: impl Into<Body>) -> Response {
    (
        status,
        [
            (HeaderName::from_static(METADATA_FLAVOR_HEADER), METADATA_FLAVOR_VALUE),
            (header::SERVER, SERVER_HEADER_VALUE),
            (header::CONTENT_TYPE, content_type),
        ],
        body.into(),
    )
        .into_response()
}
