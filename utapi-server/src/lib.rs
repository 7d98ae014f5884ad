// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! The HTTP surface, request authenticator, configuration, and binary for
//! the utapi metric-accounting engine (SPEC_FULL.md §4.6–§4.9): everything
//! outside THE CORE needed to run it as a deployed service.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod store;

use std::sync::Arc;

use config::Config;

/// Build the router-ready [`handlers::AppState`] from a loaded [`Config`],
/// connecting to the configured backing store and loading credentials.
pub async fn build_app_state(config: &Config) -> Result<Arc<handlers::AppState>, Box<dyn std::error::Error>> {
    let store = store::StoreHandle::connect_redis(&config.redis.host, config.redis.port).await?;
    let credentials = auth::FileCredentialStore::load(&config.credentials)?;
    Ok(Arc::new(handlers::AppState {
        store,
        component: config.component.clone(),
        credentials: Arc::new(credentials),
    }))
}
