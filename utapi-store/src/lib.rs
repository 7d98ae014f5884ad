// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! The pluggable backing-store layer for the metric-accounting engine.
//!
//! [`Datastore`] is the asynchronous contract every adapter implements.
//! [`InMemoryStore`] is used throughout the workspace's own test suites;
//! [`RedisStore`] is the production adapter, a thin wrapper over a
//! multiplexed [`redis::aio::ConnectionManager`].

pub mod command;
pub mod datastore;
pub mod error;
pub mod memory;
pub mod redis_store;
pub mod value;

pub use command::Command;
pub use datastore::{CommandResult, Datastore};
pub use error::StoreError;
pub use memory::InMemoryStore;
pub use redis_store::RedisStore;
pub use value::{ScoreBound, StoreValue};
