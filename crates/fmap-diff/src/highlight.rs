//! Change highlighting: structural diffs reclassified into whole-line
//! editor decorations.
//!
//! The pass is two-phase by construction: [`plan_highlights`] computes a
//! [`HighlightPlan`] without touching anything, and the caller applies
//! it to an [`EditorSurface`] once the surface has committed its own
//! update. No deferred scheduling is involved.

use std::collections::HashSet;

use tracing::debug;

use crate::line_tree::{Annotated, LineTree, parse_line_tree};
use crate::tree_diff::{ArrayOp, DiffEntry, DiffKind, PathSeg, diff_documents, normalize};

/// Decoration style class for changed lines.
const CHANGED_STYLE_CLASS: &str = "insertedLineDecoration";
/// Minimap marker color for changed lines.
const CHANGED_MINIMAP_COLOR: &str = "#c0c0ff";

/// One whole-line decoration over an inclusive 0-based line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub line_range_start: usize,
    pub line_range_end: usize,
    pub whole_line: bool,
    pub style_class: String,
    pub minimap_color: String,
}

impl Decoration {
    fn over(start: usize, end: usize) -> Self {
        Self {
            line_range_start: start,
            line_range_end: end.max(start),
            whole_line: true,
            style_class: CHANGED_STYLE_CLASS.to_string(),
            minimap_color: CHANGED_MINIMAP_COLOR.to_string(),
        }
    }
}

/// The external text-editing surface decorations are applied to.
pub trait EditorSurface {
    /// Replace the change decorations wholesale.
    fn set_decorations(&mut self, decorations: &[Decoration]);
    /// Record the line the surface should scroll to, if any.
    fn set_changed_line(&mut self, line: Option<usize>);
}

/// Computed decorations plus scroll bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighlightPlan {
    pub decorations: Vec<Decoration>,
    /// Earliest edited line.
    pub first_edit_line: Option<usize>,
    /// Earliest newly-added line.
    pub first_new_line: Option<usize>,
}

impl HighlightPlan {
    /// The line to scroll to: edits win over pure additions unless the
    /// addition starts earlier.
    #[must_use]
    pub fn changed_line(&self) -> Option<usize> {
        match (self.first_edit_line, self.first_new_line) {
            (Some(edit), Some(new)) => Some(if new < edit { new } else { edit }),
            (Some(edit), None) => Some(edit),
            (None, new) => new,
        }
    }

    /// Apply the plan to an editor surface.
    pub fn apply(&self, surface: &mut dyn EditorSurface) {
        surface.set_decorations(&self.decorations);
        surface.set_changed_line(self.changed_line());
    }
}

/// Compute the highlight plan between two template versions.
///
/// Literal periods are replaced in both texts before parsing: they would
/// corrupt path-based field lookups, and replacing them symmetrically
/// leaves every line range intact.
#[must_use]
pub fn plan_highlights(old_text: &str, new_text: &str) -> HighlightPlan {
    let old_text = old_text.replace('.', "_");
    let new_text = new_text.replace('.', "_");
    let old_tree = parse_line_tree(&old_text);
    let new_tree = parse_line_tree(&new_text);

    let mut old_raw = old_tree.raw_by_kind();
    let new_raw = new_tree.raw_by_kind();
    normalize(&mut old_raw, &new_raw);
    let diffs = diff_documents(&old_raw, &new_raw);

    let mut plan = HighlightPlan::default();
    let mut ignore_paths: Vec<String> = Vec::new();

    for diff in &diffs {
        reclassify(diff, &new_tree, &mut ignore_paths, &mut plan);
    }
    debug!(
        diffs = diffs.len(),
        decorations = plan.decorations.len(),
        "highlight plan computed"
    );
    plan
}

/// Compute and immediately apply a plan; returns it for inspection.
pub fn highlight_changes(
    surface: &mut dyn EditorSurface,
    old_text: &str,
    new_text: &str,
) -> HighlightPlan {
    let plan = plan_highlights(old_text, new_text);
    plan.apply(surface);
    plan
}

/// Walk the annotated tree along a diff path.
fn lookup<'t>(tree: &'t LineTree, diff: &DiffEntry, path: &[PathSeg]) -> Option<&'t Annotated> {
    let doc = tree.kinds.get(&diff.doc_kind)?.get(diff.doc_index)?;
    let mut node = &doc.synced;
    for seg in path {
        node = match seg {
            PathSeg::Key(key) => node.field(key)?,
            PathSeg::Index(index) => node.item(*index)?,
        };
    }
    Some(node)
}

/// Reclassify one structural diff against the new line tree and emit its
/// decoration, if any survives.
fn reclassify(
    diff: &DiffEntry,
    new_tree: &LineTree,
    ignore_paths: &mut Vec<String>,
    plan: &mut HighlightPlan,
) {
    let Some(target) = lookup(new_tree, diff, &diff.path) else {
        // No counterpart in the new text: nothing to highlight.
        return;
    };

    enum Visual {
        Edit { line: usize },
        New { start: usize, end: usize },
        Suppressed,
    }

    let mut visual = match &diff.kind {
        DiffKind::Edit if target.is_leaf() => {
            if target.line_count > 1 {
                // A multi-line edit means lines were added under an
                // existing key; the first line merely reformatted.
                Visual::New {
                    start: target.start_line + 1,
                    end: target.start_line + target.line_count - 1,
                }
            } else {
                Visual::Edit {
                    line: target.start_line,
                }
            }
        }
        DiffKind::New => Visual::New {
            start: target.start_line,
            end: target.start_line + target.line_count.saturating_sub(1),
        },
        DiffKind::Array { index, op } => match op {
            ArrayOp::New => match target.item(*index) {
                Some(item) => Visual::New {
                    start: item.start_line,
                    end: item.start_line + item.line_count.saturating_sub(1),
                },
                None => Visual::Suppressed,
            },
            ArrayOp::Delete => {
                // Everything compared inside a shrunk array is noise:
                // alignments against now-irrelevant siblings.
                ignore_paths.push(diff.path_string());
                Visual::Suppressed
            }
        },
        DiffKind::Edit if !diff.path.is_empty() && target.line_count > 1 => {
            // A structural edit spanning several lines becomes a new
            // block over the enclosing field.
            let parent_path = &diff.path[..diff.path.len() - 1];
            match lookup(new_tree, diff, parent_path) {
                Some(parent) => Visual::New {
                    start: parent.start_line,
                    end: parent.start_line + parent.line_count.saturating_sub(1),
                },
                None => Visual::Suppressed,
            }
        }
        DiffKind::Edit | DiffKind::Delete => Visual::Suppressed,
    };

    if !ignore_paths.is_empty() {
        let path = diff.path_string();
        if ignore_paths.iter().any(|prefix| path.starts_with(prefix.as_str())) {
            visual = Visual::Suppressed;
        }
    }

    // An edit whose surviving value is empty has nothing to underline.
    if let Visual::Edit { .. } = visual
        && matches!(
            target.value,
            crate::line_tree::AnnotatedValue::Scalar(serde_yaml::Value::Null)
        )
    {
        visual = Visual::Suppressed;
    }

    match visual {
        Visual::Edit { line } => {
            plan.decorations.push(Decoration::over(line, line));
            plan.first_edit_line = Some(plan.first_edit_line.map_or(line, |l| l.min(line)));
        }
        Visual::New { start, end } => {
            plan.decorations.push(Decoration::over(start, end));
            plan.first_new_line = Some(plan.first_new_line.map_or(start, |l| l.min(start)));
        }
        Visual::Suppressed => {}
    }
}

// ── Tab coordination ────────────────────────────────────────────────────

/// Highlight state of one editor tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TabState {
    /// The tab's scroll-to line, when it has changes.
    pub changed: Option<usize>,
    /// First error-marker line, when the tab has errors.
    pub first_error_line: Option<usize>,
}

/// Outcome of the auto-switch decision across tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TabDecision {
    /// Tab to select, when the current one shows neither change nor error.
    pub switch_to: Option<usize>,
    /// Line to reveal on the winning tab (errors beat changes).
    pub reveal_line: Option<usize>,
}

/// Decide which tab to show after a template update.
///
/// The first tab with a change or error wins; the selection only moves
/// when the currently selected tab has neither — or has only a change
/// while another tab holds an error.
#[must_use]
pub fn select_tab(tabs: &[TabState], selected: usize) -> TabDecision {
    let mut winner: Option<usize> = None;
    let mut reveal = None;
    let mut switch = true;

    for (index, tab) in tabs.iter().enumerate() {
        if tab.changed.is_some() || tab.first_error_line.is_some() {
            if winner.is_none() {
                winner = Some(index);
                reveal = tab.first_error_line.or(tab.changed);
            }
            if index == selected {
                switch = false;
            } else if !switch && tab.first_error_line.is_some() {
                switch = true;
            }
        }
    }

    TabDecision {
        switch_to: if switch { winner } else { None },
        reveal_line: reveal,
    }
}

/// Pick a name not yet in `taken` by appending `-1`, `-2`, ... to the
/// base name (any existing numeric suffix is stripped first).
#[must_use]
pub fn unique_name(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    let without_digits = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let base = if without_digits.len() < name.len() {
        without_digits.trim_end_matches('-')
    } else {
        name
    };
    let mut count = 1usize;
    loop {
        let candidate = format!("{base}-{count}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        decorations: Vec<Decoration>,
        changed_line: Option<usize>,
        applied: usize,
    }

    impl EditorSurface for RecordingSurface {
        fn set_decorations(&mut self, decorations: &[Decoration]) {
            self.decorations = decorations.to_vec();
            self.applied += 1;
        }
        fn set_changed_line(&mut self, line: Option<usize>) {
            self.changed_line = line;
        }
    }

    #[test]
    fn edit_and_addition_decorate_their_lines() {
        let plan = plan_highlights("a: 1\nb: 2\n", "a: 1\nb: 3\nc: 4\n");
        assert_eq!(plan.decorations.len(), 2);
        // Line 1 (0-based) carries the edit, line 2 the addition.
        assert_eq!(plan.first_edit_line, Some(1));
        assert_eq!(plan.first_new_line, Some(2));
        assert_eq!(plan.changed_line(), Some(1), "edits precede pure additions");
        let edit = &plan.decorations[0];
        assert!(edit.whole_line);
        assert_eq!(edit.style_class, "insertedLineDecoration");
        assert_eq!(edit.minimap_color, "#c0c0ff");
    }

    #[test]
    fn earlier_addition_wins_the_scroll_target() {
        let plan = plan_highlights("a: 1\nz: 9\n", "a: 1\nnew: 4\nz: 8\n");
        // Addition on line 1, edit on line 2.
        assert_eq!(plan.first_new_line, Some(1));
        assert_eq!(plan.first_edit_line, Some(2));
        assert_eq!(plan.changed_line(), Some(1));
    }

    #[test]
    fn identical_documents_produce_an_empty_plan() {
        let text = "kind: Service\nmetadata:\n  name: svc\n";
        let plan = plan_highlights(text, text);
        assert!(plan.decorations.is_empty());
        assert_eq!(plan.changed_line(), None);
    }

    #[test]
    fn new_nested_block_covers_its_line_range() {
        let old = "kind: Service\nmetadata:\n  name: svc\n";
        let new = "kind: Service\nmetadata:\n  name: svc\nspec:\n  ports:\n  - 80\n";
        let plan = plan_highlights(old, new);
        assert_eq!(plan.decorations.len(), 1);
        let deco = &plan.decorations[0];
        assert_eq!((deco.line_range_start, deco.line_range_end), (3, 5));
    }

    #[test]
    fn new_array_item_promotes_to_its_range() {
        let old = "spec:\n  ports:\n  - 80\n";
        let new = "spec:\n  ports:\n  - 80\n  - 443\n";
        let plan = plan_highlights(old, new);
        assert_eq!(plan.decorations.len(), 1);
        assert_eq!(plan.decorations[0].line_range_start, 3);
        assert_eq!(plan.decorations[0].line_range_end, 3);
    }

    #[test]
    fn array_delete_suppresses_sibling_noise() {
        let old = "items:\n- name: a\n  image: x\n- name: b\n  image: y\n";
        let new = "items:\n- name: a\n  image: x\n";
        let plan = plan_highlights(old, new);
        // The shrink itself and the comparisons against removed siblings
        // produce no decorations.
        assert!(plan.decorations.is_empty());
    }

    #[test]
    fn removed_value_has_nothing_to_underline() {
        let old = "a: 1\nb: 2\n";
        let new = "a: 1\nb:\n";
        let plan = plan_highlights(old, new);
        assert!(plan.decorations.is_empty());
    }

    #[test]
    fn periods_are_sanitized_symmetrically() {
        let old = "host: 10.0.0.1\n";
        let new = "host: 10.0.0.2\n";
        let plan = plan_highlights(old, new);
        assert_eq!(plan.decorations.len(), 1);
        assert_eq!(plan.decorations[0].line_range_start, 0);
    }

    #[test]
    fn apply_pushes_plan_to_the_surface() {
        let mut surface = RecordingSurface::default();
        let plan = highlight_changes(&mut surface, "a: 1\n", "a: 2\n");
        assert_eq!(surface.applied, 1);
        assert_eq!(surface.decorations, plan.decorations);
        assert_eq!(surface.changed_line, Some(0));
    }

    #[test]
    fn tab_selection_prefers_errors_over_changes() {
        // Selected tab has a change; another tab has an error.
        let tabs = [
            TabState {
                changed: Some(3),
                first_error_line: None,
            },
            TabState {
                changed: None,
                first_error_line: Some(7),
            },
        ];
        let decision = select_tab(&tabs, 0);
        assert_eq!(decision.switch_to, Some(0));
        assert_eq!(decision.reveal_line, Some(3));
    }

    #[test]
    fn tab_with_changes_keeps_the_selection() {
        let tabs = [
            TabState {
                changed: Some(2),
                first_error_line: None,
            },
            TabState {
                changed: Some(5),
                first_error_line: None,
            },
        ];
        let decision = select_tab(&tabs, 0);
        assert_eq!(decision.switch_to, None);
    }

    #[test]
    fn selection_moves_to_the_tab_with_content() {
        let tabs = [
            TabState::default(),
            TabState {
                changed: Some(4),
                first_error_line: None,
            },
        ];
        let decision = select_tab(&tabs, 0);
        assert_eq!(decision.switch_to, Some(1));
        assert_eq!(decision.reveal_line, Some(4));
    }

    #[test]
    fn unique_name_appends_and_skips() {
        let taken: HashSet<String> =
            ["web".to_string(), "web-1".to_string()].into_iter().collect();
        assert_eq!(unique_name("api", &taken), "api");
        assert_eq!(unique_name("web", &taken), "web-2");
        assert_eq!(unique_name("web-1", &taken), "web-2");
    }
}
