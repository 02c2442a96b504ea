use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use biblenames_db::BibleNames;
use biblenames_index::{DivisionError, LocaleIndex, OrderError, ResolutionError};
use biblenames_types::{BookCode, CodeError, DivisionRecord, ResolutionTarget};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone)]
pub struct AppState {
    pub names: Arc<BibleNames>,
    pub disable_cache: bool,
}

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub locale: Option<String>,
    pub q: Option<String>,
}

#[derive(Serialize)]
struct LocaleSummary {
    id: String,
    books: usize,
    divisions: usize,
    keys: usize,
    evicted: usize,
}

#[derive(Serialize)]
struct LocalesResponse {
    locales: Vec<LocaleSummary>,
}

#[derive(Serialize)]
struct ResolveResponse {
    locale: String,
    query: String,
    kind: &'static str,
    target: String,
    name: Option<String>,
    members: Option<Vec<String>>,
}

#[derive(Serialize)]
struct BookNameResponse {
    locale: String,
    code: String,
    default_name: String,
    default_abbreviation: String,
    input_variants: Vec<String>,
    divisions: Vec<String>,
}

#[derive(Serialize)]
struct DivisionResponse {
    locale: String,
    tag: String,
    default_name: String,
    default_abbreviation: String,
    input_variants: Vec<String>,
    members: Vec<String>,
}

#[derive(Serialize)]
struct BookDivisionsResponse {
    locale: String,
    code: String,
    divisions: Vec<String>,
}

#[derive(Serialize)]
struct OrderSummary {
    name: String,
    entries: usize,
}

#[derive(Serialize)]
struct OrdersResponse {
    orders: Vec<OrderSummary>,
}

#[derive(Serialize)]
struct SequenceResponse {
    name: String,
    sequence: Vec<String>,
}

#[derive(Serialize)]
struct PositionResponse {
    order: String,
    code: String,
    position: u32,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/locales", get(locales))
        .route("/v1/resolve", get(resolve))
        .route("/v1/names/{locale}/{code}", get(book_name))
        .route("/v1/divisions/{locale}/{tag}", get(division))
        .route("/v1/books/{locale}/{code}/divisions", get(book_divisions))
        .route("/v1/orders", get(orders))
        .route("/v1/orders/{name}", get(order_sequence))
        .route("/v1/orders/{name}/position/{code}", get(order_position))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn locales(State(state): State<AppState>) -> Response {
    let mut locales = Vec::new();
    for id in state.names.locales() {
        // A locale unloaded between listing and lookup is simply left out.
        let Ok(locale) = state.names.locale(&id) else {
            continue;
        };
        let stats = locale.stats();
        locales.push(LocaleSummary {
            id,
            books: locale.book_count(),
            divisions: locale.divisions().len(),
            keys: locale.index().len(),
            evicted: stats.evicted,
        });
    }
    json_response(&state, LocalesResponse { locales })
}

async fn resolve(
    State(state): State<AppState>,
    Query(params): Query<ResolveQuery>,
) -> Result<Response, ApiError> {
    let locale_id = params
        .locale
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("locale is required"))?;
    let query = params.q.unwrap_or_default();
    let locale = state.names.locale(&locale_id)?;
    let target = locale.resolve(&query)?;

    let response = match &target {
        ResolutionTarget::Book(code) => ResolveResponse {
            locale: locale_id,
            query,
            kind: target.kind(),
            target: code.to_string(),
            name: locale
                .book_name(*code)
                .map(|record| record.default_name.clone()),
            members: None,
        },
        ResolutionTarget::Division(tag) => ResolveResponse {
            locale: locale_id,
            query,
            kind: target.kind(),
            target: tag.to_string(),
            name: locale
                .division(tag.as_str())
                .map(|record| record.default_name.clone()),
            members: locale.members_of(tag.as_str()).ok().map(code_strings),
        },
    };
    Ok(json_response(&state, response))
}

async fn book_name(
    State(state): State<AppState>,
    Path((locale_id, raw_code)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let code = parse_code(&raw_code)?;
    let locale = state.names.locale(&locale_id)?;
    let record = locale.book_name(code).ok_or_else(|| {
        ApiError::not_found(format!("locale {locale_id} has no name for book {code}"))
    })?;
    let response = BookNameResponse {
        code: code.to_string(),
        default_name: record.default_name.clone(),
        default_abbreviation: record.default_abbreviation.clone(),
        input_variants: record.input_variants.clone(),
        divisions: division_tags(&locale, code),
        locale: locale_id,
    };
    Ok(json_response(&state, response))
}

async fn division(
    State(state): State<AppState>,
    Path((locale_id, tag)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let locale = state
        .names
        .locale(&locale_id)
        .map_err(|_| DivisionError::UnknownLocale(locale_id.clone()))?;
    let members = code_strings(locale.members_of(&tag)?);
    let record: &DivisionRecord = locale
        .division(&tag)
        .ok_or_else(|| ApiError::not_found(format!("locale {locale_id} has no division {tag:?}")))?;
    let response = DivisionResponse {
        tag: record.standard_abbreviation.to_string(),
        default_name: record.default_name.clone(),
        default_abbreviation: record.default_abbreviation.clone(),
        input_variants: record.input_variants.clone(),
        members,
        locale: locale_id,
    };
    Ok(json_response(&state, response))
}

async fn book_divisions(
    State(state): State<AppState>,
    Path((locale_id, raw_code)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let code = parse_code(&raw_code)?;
    let divisions = state
        .names
        .divisions_containing(&locale_id, code)?
        .iter()
        .map(ToString::to_string)
        .collect();
    let response = BookDivisionsResponse {
        locale: locale_id,
        code: code.to_string(),
        divisions,
    };
    Ok(json_response(&state, response))
}

async fn orders(State(state): State<AppState>) -> Response {
    let orders = state
        .names
        .orders()
        .into_iter()
        .filter_map(|name| {
            let entries = state.names.order(&name).ok()?.len();
            Some(OrderSummary { name, entries })
        })
        .collect();
    json_response(&state, OrdersResponse { orders })
}

async fn order_sequence(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let sequence = code_strings(&state.names.sequence_of(&name)?);
    Ok(json_response(&state, SequenceResponse { name, sequence }))
}

async fn order_position(
    State(state): State<AppState>,
    Path((name, raw_code)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let code = parse_code(&raw_code)?;
    let position = state.names.position_of(&name, code)?;
    let response = PositionResponse {
        order: name,
        code: code.to_string(),
        position,
    };
    Ok(json_response(&state, response))
}

/// Book codes in URLs are matched case-insensitively.
fn parse_code(raw: &str) -> Result<BookCode, ApiError> {
    Ok(BookCode::new(&raw.trim().to_ascii_uppercase())?)
}

fn code_strings(codes: &[BookCode]) -> Vec<String> {
    codes.iter().map(ToString::to_string).collect()
}

fn division_tags(locale: &LocaleIndex, code: BookCode) -> Vec<String> {
    locale
        .divisions_containing(code)
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

fn json_response<T: Serialize>(state: &AppState, body: T) -> Response {
    if state.disable_cache {
        return Json(body).into_response();
    }
    (
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=300"),
        )],
        Json(body),
    )
        .into_response()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }

    fn not_found<T: Into<String>>(msg: T) -> Self {
        ApiError::NotFound(msg.into())
    }
}

impl From<ResolutionError> for ApiError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::EmptyInput => ApiError::bad_request(err.to_string()),
            ResolutionError::UnknownLocale(_) | ResolutionError::NotFound { .. } => {
                ApiError::not_found(err.to_string())
            }
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::not_found(err.to_string())
    }
}

impl From<DivisionError> for ApiError {
    fn from(err: DivisionError) -> Self {
        ApiError::not_found(err.to_string())
    }
}

impl From<CodeError> for ApiError {
    fn from(err: CodeError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
