//! HTTP handlers. Thin adapters: parse, validate, call the core, format.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

use fairway_lib::{Error as LibError, RouteRequest, SearchOptions};

use crate::envelope::ErrorEnvelope;
use crate::metrics::{
    record_alternatives_returned, record_route_calculated, record_route_failed, record_route_hops,
};
use crate::middleware::extract_or_generate_request_id;
use crate::request::{PortSearchQuery, Validate};
use crate::state::AppState;

/// `POST /routes/calculate`
pub async fn calculate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RouteRequest>,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);
    info!(
        request_id = %request_id,
        origin = %request.origin,
        destination = %request.destination,
        criterion = request.criterion.as_str(),
        "handling calculate request"
    );

    if let Err(envelope) = Validate::validate(&request, request_id.as_str()) {
        record_route_failed(&envelope.error);
        return envelope.into_response();
    }

    let criterion = request.criterion;
    match state.coordinator().calculate(request).await {
        Ok(response) => {
            record_route_calculated(criterion.as_str(), response.cache_hit);
            if let Some(primary) = &response.primary_route {
                record_route_hops(primary.segments.len(), criterion.as_str());
            }
            record_alternatives_returned(response.alternative_routes.len());
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => {
            record_route_failed(err.kind());
            ErrorEnvelope::from_error(&err, request_id.as_str()).into_response()
        }
    }
}

/// `POST /routes/validate`
pub async fn validate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RouteRequest>,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);
    let result = state.coordinator().validate(&request);
    info!(request_id = %request_id, valid = result.valid, "validated route request");
    (StatusCode::OK, Json(result)).into_response()
}

/// `GET /ports/search`
pub async fn port_search_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PortSearchQuery>,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);
    if let Err(envelope) = query.validate(request_id.as_str()) {
        return envelope.into_response();
    }

    let options = SearchOptions {
        limit: query.limit,
        country: query.country.clone(),
        vessel_type_compatible: query.vessel_type_compatible,
        include_inactive: query.include_inactive,
    };
    match state.repository().search(&query.q, &options) {
        Ok(hits) => (StatusCode::OK, Json(hits)).into_response(),
        Err(err) => ErrorEnvelope::from_error(&err, request_id.as_str()).into_response(),
    }
}

/// `GET /ports/{code}`
pub async fn port_get_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);
    let normalized = code.to_uppercase();
    if !fairway_lib::port::is_unlocode(&normalized) {
        return ErrorEnvelope::from_error(
            &LibError::Validation {
                message: format!("{code:?} is not a 5-letter UN/LOCODE"),
            },
            request_id.as_str(),
        )
        .into_response();
    }

    match state.repository().get(&normalized) {
        Ok(port) => (StatusCode::OK, Json(port)).into_response(),
        Err(err) => ErrorEnvelope::from_error(&err, request_id.as_str()).into_response(),
    }
}
