#![forbid(unsafe_code)]

//! Topology snapshot construction and status aggregation.
//!
//! This crate turns the raw payload of a topology fetch into the
//! immutable [`fmap_model::GraphSnapshot`] the rest of the pipeline
//! consumes, and derives per-node health from it:
//!
//! - [`builder`] — normalizes nodes/links, emits canonical YAML with
//!   per-node row offsets, re-associates pods and search resources to
//!   their owning nodes, and falls back to cache or placeholder when no
//!   fresh data exists. Never fails; fetch errors become flags.
//! - [`status`] — the pure status aggregation pass producing a
//!   [`status::StatusMap`] side-table of pulses, icons, and per-cluster
//!   replica counts.
//! - [`cache`] — the injected, bounded LRU snapshot cache.
//! - [`yaml`] — volatile-metadata stripping and key-sorted serialization.
//!
//! # Example
//! ```
//! use fmap_graph::builder::{TopologyRequest, TopologyFetch, build_snapshot};
//! use fmap_graph::cache::SnapshotCache;
//!
//! let request = TopologyRequest {
//!     name: "guestbook".to_string(),
//!     store_key: "guestbook-view".to_string(),
//!     ..TopologyRequest::default()
//! };
//! let mut cache = SnapshotCache::with_default_capacity();
//!
//! // No fetch has completed yet: the builder degrades to a placeholder
//! // graph holding just the root application.
//! let snapshot = build_snapshot(&request, TopologyFetch::default(), &mut cache);
//! assert!(snapshot.is_placeholder());
//! assert_eq!(snapshot.nodes.len(), 1);
//! ```

pub mod builder;
pub mod cache;
pub mod status;
pub mod yaml;

pub use builder::{TopologyFetch, TopologyRequest, active_channel, build_snapshot};
pub use cache::{CacheStats, SnapshotCache, StoredChannels, StoredElements};
pub use status::{StatusMap, compute_status, must_have_pods, status_map};
