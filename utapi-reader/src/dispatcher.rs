//! Routes the three `ListMetrics` request families to a [`ListMetrics`]
//! lister (SPEC_FULL.md §4.5).

use utapi_core::{Granularity, MetricsRecord, UtapiError};
use utapi_store::Datastore;

use crate::lister::{ListMetrics, ListMetricsRequest, DEFAULT_CONCURRENCY};

/// Dispatches a validated request to the lister for its family and awaits
/// the result (SPEC_FULL.md §4.5). One dispatcher per deployed component,
/// holding the backing-store reference and the configured component name
/// used to synthesize the service-level singleton resource.
pub struct Dispatcher<'a, D> {
    store: &'a D,
    component: String,
    concurrency: usize,
}

impl<'a, D: Datastore> Dispatcher<'a, D> {
    /// A dispatcher with the default read-side concurrency cap.
    pub fn new(store: &'a D, component: impl Into<String>) -> Self {
        Self { store, component: component.into(), concurrency: DEFAULT_CONCURRENCY }
    }

    /// Override the per-request concurrency cap (SPEC_FULL.md §4.4's
    /// "Read-side parallelism" default is 5; this is the configuration
    /// seam for deployments that want a different bound).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Run a `ListMetrics` query for `family`.
    pub async fn list_metrics(&self, family: Granularity, request: ListMetricsRequest) -> Result<Vec<MetricsRecord>, UtapiError> {
        let lister = ListMetrics::new(self.store, family, self.component.clone());
        lister.list(request, self.concurrency).await
    }
}
