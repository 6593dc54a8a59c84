//! Bridge core for the natural-language monitoring assistant
//!
//! This crate provides the pipeline between a language model that emits
//! monitoring-API paths and the monitoring API's heterogeneous JSON:
//! - Request synthesis from raw model text, with top-N augmentation
//! - Response type classification from endpoint paths
//! - Per-type response normalization into stable, typed shapes
//! - Performance aggregation into a resource profile
//!
//! Transport, credentials and retries live behind the injected
//! `RequestExecutor`; everything here is request-scoped and stateless
//! between calls.

pub mod classify;
pub mod executor;
pub mod models;
pub mod normalize;
pub mod profile;
pub mod request;
pub mod units;

pub use classify::{classify, ResponseTypeTag};
pub use executor::{fetch_resource_inventory, RequestExecutor, ResourceName};
pub use models::*;
pub use normalize::{normalize, NormalizeContext};
pub use profile::{
    CollectorConfig, Configuration, ProfileCollector, ProfileError, ResourceProfile, RollupStats,
    TimeRange,
};
pub use request::{
    augment_top_n, synthesize, HttpMethod, NameTable, QueryParams, QueryValue, RequestDescriptor,
};
pub use units::{detect_unit, format_value};
