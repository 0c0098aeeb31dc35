#![forbid(unsafe_code)]

//! Core data model for Fleetmap topology snapshots.
//!
//! Everything the pipeline crates exchange lives here: typed node ids,
//! the [`Node`]/[`Link`] graph vertices and edges, the tagged
//! [`NodeSpecs`] union over node types, pod and resource input records,
//! health [`Pulse`] classification, and the immutable [`GraphSnapshot`]
//! handed to the render surface.
//!
//! The model is deliberately passive: no pass in the pipeline mutates a
//! node after the builder produced it. Derived state (status, positions)
//! travels in side-tables keyed by [`NodeId`] so the aggregation, layout,
//! and projection passes stay pure and order-independent.

pub mod node;
pub mod records;
pub mod snapshot;
pub mod status;

pub use node::{Link, Node, NodeId, NodeSpecs, NodeType};
pub use records::{PodRecord, RequestStatus, ResourceRecord};
pub use snapshot::{GraphSnapshot, SnapshotDetails};
pub use status::{NodeStatus, Pulse, ReplicaCounts, StatusIcon};
