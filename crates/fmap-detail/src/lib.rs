#![forbid(unsafe_code)]

//! Detail and tooltip projection.
//!
//! Pure functions from a node (plus its derived status) to the ordered
//! record lists the hover/selection UI renders: labeled detail rows,
//! deploy-status tables, action links, and tooltip entries with search
//! deep links. Nothing here touches the graph; callers pass the node and
//! read back records.
//!
//! Label keys are stable strings (`resource.name`, ...). The render
//! surface owns translation; [`label_text`] provides the default English
//! catalog.

pub mod details;
pub mod text;
pub mod tooltips;

pub use details::{deploy_status_rows, node_description, node_details};
pub use text::{age, counter_zoom, wrapped_label};
pub use tooltips::{label_text, node_tooltips};

/// A `label: value` detail line.
///
/// Header rows carry only a key; per-cluster rows carry a dynamic
/// `label_value` instead of a key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelRow {
    pub label_key: Option<&'static str>,
    pub label_value: Option<String>,
    pub value: Option<String>,
    pub indent: bool,
    pub is_error: bool,
}

impl LabelRow {
    #[must_use]
    pub fn keyed(label_key: &'static str, value: impl Into<String>) -> Self {
        Self {
            label_key: Some(label_key),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn header(label_key: &'static str) -> Self {
        Self {
            label_key: Some(label_key),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn bare(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }
}

/// Action behind a detail link row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Open the search page filtered to this resource.
    ShowSearch {
        kind: String,
        name: String,
        namespace: Option<String>,
    },
    /// Open the log viewer for one pod.
    ShowPodLog {
        name: String,
        namespace: String,
        cluster: String,
    },
    /// Scroll the YAML editor to this node's document.
    ShowYaml { row: usize },
}

/// One record in a node's detail list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailRow {
    Label(LabelRow),
    Link {
        label: &'static str,
        action: LinkAction,
        indent: bool,
    },
    /// Vertical gap between sections.
    Spacer,
}

/// One tooltip record for a hovered node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tooltip {
    Entry {
        name: String,
        value: String,
        href: Option<String>,
    },
    /// Trailing "and N more" summary for truncated lists.
    Summary(String),
}
