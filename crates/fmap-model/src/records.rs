//! Input records owned by the fetch collaborator.
//!
//! The builder only reads and re-indexes these; it never writes them back.

use serde::{Deserialize, Serialize};

/// State of the topology fetch that produced the current payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Nothing requested yet.
    #[default]
    NotRequested,
    /// A fetch is in flight.
    InFlight,
    /// Last fetch completed successfully.
    Done,
    /// Last fetch failed.
    Error,
}

impl RequestStatus {
    #[must_use]
    pub fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Snapshot of one running pod instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PodRecord {
    pub name: String,
    pub namespace: String,
    pub cluster: String,
    pub container: String,
    /// Raw phase string: `Running`, `Pending`, `CrashLoopBackOff`, ...
    pub status: String,
    /// Creation timestamp as reported (RFC 3339 or `YYYY-MM-DD HH:MM:SS`).
    pub created: Option<String>,
    /// Container start timestamp, same formats as `created`.
    pub started_at: Option<String>,
    pub host_ip: Option<String>,
    pub pod_ip: Option<String>,
    pub restarts: u32,
}

/// One deployed resource instance as returned by the search collaborator.
///
/// Replica counts are present only for kinds that publish them; for
/// intermediate objects the status aggregator falls back to counting
/// `Running` pods instead.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Lowercased resource kind (`deployment`, `subscription`, ...).
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    pub cluster: String,
    pub status: String,
    /// Semicolon-separated `key=value` labels as reported by search.
    pub label: Option<String>,
    pub desired: Option<u32>,
    pub ready: Option<u32>,
    pub current: Option<u32>,
    pub available: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_error_status_is_error() {
        assert!(RequestStatus::Error.is_error());
        assert!(!RequestStatus::Done.is_error());
        assert!(!RequestStatus::InFlight.is_error());
        assert!(!RequestStatus::NotRequested.is_error());
    }

    #[test]
    fn pod_record_defaults_are_empty() {
        let pod = PodRecord::default();
        assert!(pod.name.is_empty());
        assert_eq!(pod.restarts, 0);
        assert!(pod.host_ip.is_none());
    }
}
