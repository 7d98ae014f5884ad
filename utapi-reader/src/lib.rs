// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! The read path of the metric-accounting engine: interval enumeration,
//! per-resource batch construction, bounded-concurrency aggregation, and
//! the family dispatcher (SPEC_FULL.md §4.4–§4.5).

mod dispatcher;
mod lister;

pub use dispatcher::Dispatcher;
pub use lister::{ListMetrics, ListMetricsRequest, DEFAULT_CONCURRENCY};
