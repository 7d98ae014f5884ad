//! The HTTP surface (SPEC_FULL.md §4.6): three `ListMetrics` routes plus an
//! unauthenticated healthcheck, wired the way a real deployed service wires
//! its router — grounded on how `metrique-service-metrics` documents
//! wiring a service-wide sink, with the server crate playing the same
//! glue role for inbound requests instead.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid_like::request_id;
use utapi_core::{Granularity, UtapiError};
use utapi_reader::{Dispatcher, ListMetricsRequest};

use crate::auth::{self, CredentialStore, RequestToVerify};
use crate::error::ApiError;
use crate::store::StoreHandle;

/// Shared handler state, built once at startup.
///
/// Holds the store by value rather than a [`Dispatcher`] directly:
/// `Dispatcher<'a, D>` borrows its store, so each handler builds one
/// against `&state.store` for the lifetime of that single request (the
/// same pattern `utapi-reader`'s own tests use), rather than AppState
/// trying to hold a self-referential borrow across the whole process.
pub struct AppState {
    /// The configured backing store.
    pub store: StoreHandle,
    /// The component name, used for the service-level singleton resource.
    pub component: String,
    /// The credential store backing request authentication.
    pub credentials: Arc<dyn CredentialStore>,
}

/// Required query parameters on every `ListMetrics` route
/// (spec.md §6: `Action=ListMetrics&Version=20160815`).
#[derive(Debug, Deserialize)]
struct ListMetricsQuery {
    #[serde(rename = "Action")]
    action: String,
    #[serde(rename = "Version")]
    version: String,
}

impl ListMetricsQuery {
    fn validate(&self) -> Result<(), ApiError> {
        if self.action != "ListMetrics" || self.version != "20160815" {
            return Err(ApiError::BadRequest("expected Action=ListMetrics&Version=20160815".to_string()));
        }
        Ok(())
    }
}

/// `POST /{family}` request body (spec.md §6). Exactly one of `buckets` /
/// `accounts` is meaningful for a given route; both are accepted as
/// optional so one struct covers all three routes, with `resources()`
/// resolving the one the route actually needs.
#[derive(Debug, Deserialize, Default)]
struct ListMetricsBody {
    #[serde(default)]
    buckets: Option<Vec<String>>,
    #[serde(default)]
    accounts: Option<Vec<String>>,
    #[serde(rename = "timeRange")]
    time_range: [i64; 2],
}

impl ListMetricsBody {
    fn resources(&self, family: Granularity) -> Vec<String> {
        match family {
            Granularity::Bucket => self.buckets.clone().unwrap_or_default(),
            Granularity::Account => self.accounts.clone().unwrap_or_default(),
            Granularity::Service => Vec::new(),
        }
    }
}

/// Build the router for the three `ListMetrics` routes plus healthcheck.
///
/// `/buckets`, `/accounts`, and `/service` (spec.md §6) are served by one
/// parameterized route rather than three literal ones; `family_from_path`
/// rejects any segment outside that closed set with 400, so the externally
/// observable surface is identical to three hardcoded routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/{family}", post(list_metrics))
        .route("/_/healthcheck", get(healthcheck))
        .with_state(state)
}

async fn healthcheck() -> StatusCode {
    StatusCode::OK
}

async fn list_metrics(
    State(state): State<Arc<AppState>>,
    Path(family_segment): Path<String>,
    Query(query): Query<ListMetricsQuery>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<Vec<serde_json::Value>>, ApiError> {
    query.validate()?;
    let family = family_from_path(&family_segment)?;
    let request_id = request_id();

    let header_pairs: Vec<(String, String)> =
        headers.iter().map(|(name, value)| (name.as_str().to_lowercase(), value.to_str().unwrap_or("").to_string())).collect();
    let to_verify = RequestToVerify {
        method: "POST",
        path: &format!("/{family_segment}"),
        query: &format!("Action={}&Version={}", query.action, query.version),
        headers: &header_pairs,
        body: &body,
    };
    auth::verify(&to_verify, state.credentials.as_ref()).await?;

    let parsed: ListMetricsBody = serde_json::from_slice(&body).map_err(|err| ApiError::BadRequest(format!("malformed request body: {err}")))?;
    if parsed.time_range[0] > parsed.time_range[1] {
        return Err(ApiError::Engine(UtapiError::precondition("timeRange start must not be after end")));
    }

    let list_request = ListMetricsRequest { resources: parsed.resources(family), time_range: parsed.time_range };

    tracing::info!(request_id = %request_id, family = %family, "ListMetrics request");
    let dispatcher = Dispatcher::new(&state.store, state.component.clone());
    let records = dispatcher.list_metrics(family, list_request).await?;
    let body = records.into_iter().map(|record| serde_json::to_value(record).expect("MetricsRecord always serializes")).collect();
    Ok(Json(body))
}

fn family_from_path(segment: &str) -> Result<Granularity, ApiError> {
    match segment {
        "buckets" => Ok(Granularity::Bucket),
        "accounts" => Ok(Granularity::Account),
        "service" => Ok(Granularity::Service),
        other => Err(ApiError::BadRequest(format!("unrecognized resource family `{other}`"))),
    }
}

/// A minimal request-id generator: the spec only requires *a* correlatable
/// id threaded through `pushMetric`/`ListMetrics` logging (SPEC_FULL.md
/// §4.9), not any particular format.
mod uuid_like {
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    pub fn request_id() -> String {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!("req-{nanos:x}-{n:x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_family_segment_is_a_bad_request() {
        assert!(family_from_path("widgets").is_err());
        assert!(matches!(family_from_path("buckets"), Ok(Granularity::Bucket)));
    }

    #[test]
    fn query_validation_rejects_wrong_action_or_version() {
        let bad = ListMetricsQuery { action: "ListMetrics".into(), version: "20150101".into() };
        assert!(bad.validate().is_err());
        let good = ListMetricsQuery { action: "ListMetrics".into(), version: "20160815".into() };
        assert!(good.validate().is_ok());
    }
}
