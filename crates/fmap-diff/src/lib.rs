#![forbid(unsafe_code)]

//! YAML change highlighting for linked template editors.
//!
//! When the template editor regenerates YAML, the user needs to see what
//! moved: this crate parses both versions into line-annotated trees
//! ([`line_tree`]), computes a structural diff ([`tree_diff`]),
//! reclassifies the raw diff operations into visual treatments, and
//! emits whole-line decorations plus a scroll-to target ([`highlight`]).
//!
//! # Example
//! ```
//! use fmap_diff::plan_highlights;
//!
//! let plan = plan_highlights("a: 1\nb: 2\n", "a: 1\nb: 3\nc: 4\n");
//! assert_eq!(plan.decorations.len(), 2);
//! // The edit on line 1 wins the scroll target over the addition below it.
//! assert_eq!(plan.changed_line(), Some(1));
//! ```

pub mod highlight;
pub mod line_tree;
pub mod tree_diff;

pub use highlight::{
    Decoration, EditorSurface, HighlightPlan, TabDecision, TabState, highlight_changes,
    plan_highlights, select_tab, unique_name,
};
pub use line_tree::{Annotated, AnnotatedValue, DocEntry, LineTree, parse_line_tree};
pub use tree_diff::{ArrayOp, DiffEntry, DiffKind, PathSeg, diff_documents, normalize};
