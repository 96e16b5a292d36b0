// 🌐 REST API - /v1/swift-codes
//
// Thin transport over CodeResolver: validate input, call the resolver, shape
// the JSON. All domain rules live in the resolver.

use crate::code::{validate_code, validate_country, BankCode};
use crate::db::SqliteStore;
use crate::error::DirectoryError;
use crate::resolver::{CodeDetails, CodeResolver};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const INVALID_CODE: &str = "SWIFT code is incorrect or is not 11 characters long.";
const INVALID_COUNTRY: &str = "Country ISO2 code is incorrect or is not 2 characters long.";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    resolver: Arc<Mutex<CodeResolver<SqliteStore>>>,
}

impl AppState {
    pub fn new(resolver: CodeResolver<SqliteStore>) -> Self {
        Self {
            resolver: Arc::new(Mutex::new(resolver)),
        }
    }

    fn resolver(&self) -> Result<MutexGuard<'_, CodeResolver<SqliteStore>>, ApiError> {
        self.resolver
            .lock()
            .map_err(|_| ApiError::Internal("resolver lock poisoned".to_string()))
    }
}

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwiftCodeWithBranchesResponse {
    pub address: String,
    pub bank_name: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    pub country_name: String,
    pub is_headquarter: bool,
    pub swift_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<SwiftCodeBranchResponse>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwiftCodeBranchResponse {
    pub address: String,
    pub bank_name: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    pub country_name: String,
    pub is_headquarter: bool,
    pub swift_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwiftCodeCountryResponse {
    pub address: String,
    pub bank_name: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    pub is_headquarter: bool,
    pub swift_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwiftCodesByCountryResponse {
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    pub country_name: String,
    pub swift_codes: Vec<SwiftCodeCountryResponse>,
}

/// POST body. Everything optional so missing fields become validation
/// messages instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSwiftCodeRequest {
    pub address: Option<String>,
    pub bank_name: Option<String>,
    #[serde(rename = "countryISO2")]
    pub country_iso2: Option<String>,
    pub country_name: Option<String>,
    pub swift_code: Option<String>,
    pub is_headquarter: Option<bool>,
}

impl From<CodeDetails> for SwiftCodeWithBranchesResponse {
    fn from(details: CodeDetails) -> Self {
        let code = details.code;
        Self {
            is_headquarter: code.is_headquarter(),
            branches: details
                .branches
                .map(|branches| branches.into_iter().map(Into::into).collect()),
            address: code.address,
            bank_name: code.bank_name,
            country_iso2: code.country_iso2,
            country_name: code.country_name,
            swift_code: code.code,
        }
    }
}

impl From<BankCode> for SwiftCodeBranchResponse {
    fn from(code: BankCode) -> Self {
        Self {
            is_headquarter: code.is_headquarter(),
            address: code.address,
            bank_name: code.bank_name,
            country_iso2: code.country_iso2,
            country_name: code.country_name,
            swift_code: code.code,
        }
    }
}

impl From<BankCode> for SwiftCodeCountryResponse {
    fn from(code: BankCode) -> Self {
        Self {
            is_headquarter: code.is_headquarter(),
            address: code.address,
            bank_name: code.bank_name,
            country_iso2: code.country_iso2,
            swift_code: code.code,
        }
    }
}

impl CreateSwiftCodeRequest {
    /// Collect every violated rule, then build the record
    fn validate(self) -> Result<BankCode, ApiError> {
        let mut messages = Vec::new();

        let mut required = |value: &Option<String>, message: &str| -> String {
            match value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => {
                    messages.push(message.to_string());
                    String::new()
                }
            }
        };

        let swift_code = required(&self.swift_code, "SWIFT code must not be empty.");
        let bank_name = required(&self.bank_name, "Bank name must not be empty.");
        let address = required(&self.address, "Address must not be empty.");
        let country_iso2 = required(&self.country_iso2, "Country ISO2 Code must not be empty.");
        let country_name = required(&self.country_name, "Country name must not be empty.");

        if !swift_code.is_empty() && !is_valid_code(&swift_code) {
            messages.push(INVALID_CODE.to_string());
        }
        if !country_iso2.is_empty() && !is_valid_country(&country_iso2) {
            messages.push(INVALID_COUNTRY.to_string());
        }
        // Presence only; the code suffix decides what the record is
        if self.is_headquarter.is_none() {
            messages.push("Headquarter flag must not be empty.".to_string());
        }

        if !messages.is_empty() {
            return Err(ApiError::Validation(messages));
        }

        Ok(BankCode::new(
            &swift_code,
            &bank_name,
            &address,
            &country_iso2,
            &country_name,
        ))
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Validation(Vec<String>),
    Domain(DirectoryError),
    Internal(String),
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        ApiError::Domain(err)
    }
}

pub fn status_for(err: &DirectoryError) -> StatusCode {
    match err {
        DirectoryError::NotFound { .. } => StatusCode::NOT_FOUND,
        DirectoryError::DuplicateCode(_) => StatusCode::CONFLICT,
        DirectoryError::DeletionConflict { .. } => StatusCode::CONFLICT,
        DirectoryError::MalformedInput(_) => StatusCode::BAD_REQUEST,
        DirectoryError::Storage(_) | DirectoryError::Source(_) | DirectoryError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(messages) => {
                tracing::warn!(?messages, "rejected invalid request");
                (StatusCode::BAD_REQUEST, Json(json!({ "messages": messages }))).into_response()
            }
            ApiError::Domain(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "request failed");
                } else {
                    tracing::warn!(error = %err, "request refused");
                }
                (status, Json(json!({ "message": err.to_string() }))).into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(%message, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": message })),
                )
                    .into_response()
            }
        }
    }
}

// Layout rules come from `code`; the transport additionally wants uppercase
fn is_valid_code(code: &str) -> bool {
    validate_code(code).is_ok() && is_uppercase(code)
}

fn is_valid_country(iso2: &str) -> bool {
    validate_country(iso2).is_ok() && is_uppercase(iso2)
}

fn is_uppercase(value: &str) -> bool {
    !value.chars().any(|c| c.is_ascii_lowercase())
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /v1/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /v1/swift-codes/:swift_code - One code, with branches for headquarters
async fn find_code(
    State(state): State<AppState>,
    Path(swift_code): Path<String>,
) -> Result<Json<SwiftCodeWithBranchesResponse>, ApiError> {
    if !is_valid_code(&swift_code) {
        return Err(ApiError::Validation(vec![INVALID_CODE.to_string()]));
    }

    let details = state.resolver()?.find_with_branches(&swift_code)?;
    Ok(Json(details.into()))
}

/// GET /v1/swift-codes/country/:country_iso2 - All codes of a country
async fn find_country(
    State(state): State<AppState>,
    Path(country_iso2): Path<String>,
) -> Result<Json<SwiftCodesByCountryResponse>, ApiError> {
    if !is_valid_country(&country_iso2) {
        return Err(ApiError::Validation(vec![INVALID_COUNTRY.to_string()]));
    }

    let codes = state.resolver()?.find_by_country(&country_iso2)?;
    // Never empty: the resolver reports an empty country as NotFound
    let country_name = codes
        .first()
        .map(|c| c.country_name.clone())
        .unwrap_or_default();

    Ok(Json(SwiftCodesByCountryResponse {
        country_iso2,
        country_name,
        swift_codes: codes.into_iter().map(Into::into).collect(),
    }))
}

/// POST /v1/swift-codes - Create one code
async fn create_code(
    State(state): State<AppState>,
    payload: Result<Json<CreateSwiftCodeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Validation(vec![e.body_text()]))?;
    let record = request.validate()?;

    state.resolver()?.create(record)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "SWIFT code was successfully created." })),
    ))
}

/// DELETE /v1/swift-codes/:swift_code - Delete a code (and a headquarter's branches)
async fn delete_code(
    State(state): State<AppState>,
    Path(swift_code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_valid_code(&swift_code) {
        return Err(ApiError::Validation(vec![INVALID_CODE.to_string()]));
    }

    state.resolver()?.delete(&swift_code)?;

    Ok(Json(json!({ "message": "SWIFT code was successfully deleted." })))
}

/// Build the axum router with all endpoints
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(health_check))
        .route("/v1/swift-codes", post(create_code))
        .route(
            "/v1/swift-codes/:swift_code",
            get(find_code).delete(delete_code),
        )
        .route("/v1/swift-codes/country/:country_iso2", get(find_country))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
