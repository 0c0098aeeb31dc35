//! Line-annotated YAML parsing.
//!
//! Parses a block-style YAML document set into a tree where every field
//! carries `{value, start_line, line_count}`, so structural diffs can be
//! mapped back to source line ranges. The tree is grouped by each
//! document's top-level `kind`, mirroring how the template editor lays
//! one resource per document. Rebuilt whole on every edit; never patched
//! in place.
//!
//! The parser covers the block subset the canonical emitter produces
//! (nested mappings, sequences, quoted scalars, literal/folded blocks);
//! flow collections parse as leaf scalars, which is exactly how the diff
//! wants to treat them.

use std::collections::BTreeMap;

use serde_yaml::Value;

/// Kind bucket for documents without a top-level `kind` field.
pub const UNKNOWN_KIND: &str = "unknown";

/// A parsed value with its source line range.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotated {
    pub value: AnnotatedValue,
    /// First line of the field (the key line), 0-based in the full text.
    pub start_line: usize,
    /// Total lines the field spans, key line included.
    pub line_count: usize,
}

/// Shape of an annotated value.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotatedValue {
    Scalar(Value),
    Mapping(BTreeMap<String, Annotated>),
    Sequence(Vec<Annotated>),
}

impl Annotated {
    /// Child annotation under a mapping key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Annotated> {
        match &self.value {
            AnnotatedValue::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    /// Child annotation at a sequence index.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&Annotated> {
        match &self.value {
            AnnotatedValue::Sequence(items) => items.get(index),
            _ => None,
        }
    }

    /// True for leaf values (scalars, including flow collections).
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.value, AnnotatedValue::Scalar(_))
    }

    /// Strip annotations, leaving the plain value tree.
    #[must_use]
    pub fn to_raw(&self) -> Value {
        match &self.value {
            AnnotatedValue::Scalar(value) => value.clone(),
            AnnotatedValue::Mapping(map) => {
                let mut mapping = serde_yaml::Mapping::new();
                for (key, child) in map {
                    mapping.insert(Value::String(key.clone()), child.to_raw());
                }
                Value::Mapping(mapping)
            }
            AnnotatedValue::Sequence(items) => {
                Value::Sequence(items.iter().map(Annotated::to_raw).collect())
            }
        }
    }
}

/// One parsed document: the plain value tree plus its annotated mirror.
#[derive(Debug, Clone, PartialEq)]
pub struct DocEntry {
    pub raw: Value,
    pub synced: Annotated,
}

/// All documents of a text, grouped by top-level kind in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineTree {
    pub kinds: BTreeMap<String, Vec<DocEntry>>,
}

impl LineTree {
    /// The plain value trees per kind, for structural diffing.
    #[must_use]
    pub fn raw_by_kind(&self) -> BTreeMap<String, Vec<Value>> {
        self.kinds
            .iter()
            .map(|(kind, docs)| {
                (kind.clone(), docs.iter().map(|d| d.raw.clone()).collect())
            })
            .collect()
    }
}

/// Parse a multi-document YAML text into its line tree.
#[must_use]
pub fn parse_line_tree(text: &str) -> LineTree {
    let lines: Vec<&str> = text.lines().collect();
    let mut tree = LineTree::default();

    let mut doc_start = 0usize;
    let mut cursor = 0usize;
    while cursor <= lines.len() {
        let at_separator = cursor == lines.len()
            || lines[cursor].trim_end() == "---"
            || lines[cursor].trim_end().starts_with("--- ");
        if at_separator {
            if let Some(annotated) = parse_block(&lines, doc_start, cursor, 0) {
                let raw = annotated.to_raw();
                let kind = raw
                    .get("kind")
                    .and_then(Value::as_str)
                    .unwrap_or(UNKNOWN_KIND)
                    .to_string();
                tree.kinds
                    .entry(kind)
                    .or_default()
                    .push(DocEntry { raw, synced: annotated });
            }
            doc_start = cursor + 1;
        }
        cursor += 1;
    }
    tree
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_blank(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Last content line within `[start, end)`, for span computation.
fn last_content_line(lines: &[&str], start: usize, end: usize) -> usize {
    let mut last = start;
    for (offset, line) in lines[start..end].iter().enumerate() {
        if !is_blank(line) {
            last = start + offset;
        }
    }
    last
}

/// Parse the block spanning `[start, end)` at the given indent.
fn parse_block(lines: &[&str], start: usize, end: usize, indent: usize) -> Option<Annotated> {
    let mut cursor = start;
    while cursor < end && is_blank(lines[cursor]) {
        cursor += 1;
    }
    if cursor >= end {
        return None;
    }

    let first = lines[cursor];
    let first_indent = indent_of(first);
    if first_indent < indent {
        return None;
    }

    if first.trim_start().starts_with("- ") || first.trim_start() == "-" {
        parse_sequence(lines, cursor, end, first_indent)
    } else if first.trim_start().contains(':') {
        parse_mapping(lines, cursor, end, first_indent)
    } else {
        // A bare scalar block.
        let last = last_content_line(lines, cursor, end);
        Some(Annotated {
            value: AnnotatedValue::Scalar(parse_scalar(first.trim())),
            start_line: cursor,
            line_count: last - cursor + 1,
        })
    }
}

fn parse_mapping(lines: &[&str], start: usize, end: usize, indent: usize) -> Option<Annotated> {
    let mut map = BTreeMap::new();
    let mut cursor = start;

    while cursor < end {
        let line = lines[cursor];
        if is_blank(line) {
            cursor += 1;
            continue;
        }
        let line_indent = indent_of(line);
        if line_indent < indent {
            break;
        }
        if line_indent > indent {
            // Stray deeper content without a key; skip.
            cursor += 1;
            continue;
        }

        let trimmed = line.trim_start();
        let Some((key_part, rest)) = split_key(trimmed) else {
            cursor += 1;
            continue;
        };

        // The entry spans until the next key at this indent or shallower.
        // Same-indent dash lines belong to the entry: a block sequence
        // sits at its key's indent.
        let mut entry_end = cursor + 1;
        while entry_end < end {
            let next = lines[entry_end];
            if !is_blank(next) {
                let next_indent = indent_of(next);
                if next_indent < indent {
                    break;
                }
                if next_indent == indent && !next.trim_start().starts_with('-') {
                    break;
                }
            }
            entry_end += 1;
        }
        let last = last_content_line(lines, cursor, entry_end);

        let value = parse_entry_value(lines, cursor, entry_end, indent, rest);
        map.insert(
            key_part.to_string(),
            Annotated {
                value,
                start_line: cursor,
                line_count: last - cursor + 1,
            },
        );
        cursor = entry_end;
    }

    if map.is_empty() {
        return None;
    }
    let last = last_content_line(lines, start, cursor);
    Some(Annotated {
        value: AnnotatedValue::Mapping(map),
        start_line: start,
        line_count: last - start + 1,
    })
}

fn parse_sequence(lines: &[&str], start: usize, end: usize, indent: usize) -> Option<Annotated> {
    let mut items = Vec::new();
    let mut cursor = start;

    while cursor < end {
        let line = lines[cursor];
        if is_blank(line) {
            cursor += 1;
            continue;
        }
        let line_indent = indent_of(line);
        if line_indent < indent {
            break;
        }
        let trimmed = line.trim_start();
        if line_indent > indent || !(trimmed.starts_with("- ") || trimmed == "-") {
            cursor += 1;
            continue;
        }

        // Item spans until the next dash at this indent or a dedent.
        let mut item_end = cursor + 1;
        while item_end < end {
            let next = lines[item_end];
            if !is_blank(next) {
                let next_indent = indent_of(next);
                if next_indent < indent
                    || (next_indent == indent && next.trim_start().starts_with('-'))
                {
                    break;
                }
            }
            item_end += 1;
        }
        let last = last_content_line(lines, cursor, item_end);

        let inline = trimmed.strip_prefix('-').unwrap_or("").trim_start();
        let value = if inline.is_empty() {
            // Nested block on the following lines.
            parse_block(lines, cursor + 1, item_end, indent + 1)
                .map(|a| a.value)
                .unwrap_or(AnnotatedValue::Scalar(Value::Null))
        } else if inline.contains(": ") || inline.ends_with(':') {
            // Compact mapping starting on the dash line: re-parse the
            // item with the dash replaced by a space.
            parse_inline_item(lines, cursor, item_end, indent)
        } else {
            AnnotatedValue::Scalar(parse_scalar(inline))
        };

        items.push(Annotated {
            value,
            start_line: cursor,
            line_count: last - cursor + 1,
        });
        cursor = item_end;
    }

    if items.is_empty() {
        return None;
    }
    let last = last_content_line(lines, start, cursor);
    Some(Annotated {
        value: AnnotatedValue::Sequence(items),
        start_line: start,
        line_count: last - start + 1,
    })
}

/// Parse a `- key: value` item: the dash counts as indentation for the
/// mapping that starts on the same line.
fn parse_inline_item(lines: &[&str], start: usize, end: usize, indent: usize) -> AnnotatedValue {
    let mut patched: Vec<String> = Vec::with_capacity(end - start);
    for (offset, line) in lines[start..end].iter().enumerate() {
        if offset == 0 {
            let mut replaced = String::with_capacity(line.len());
            replaced.push_str(&" ".repeat(indent + 2));
            replaced.push_str(line.trim_start().trim_start_matches('-').trim_start());
            patched.push(replaced);
        } else {
            patched.push((*line).to_string());
        }
    }
    let patched_refs: Vec<&str> = patched.iter().map(String::as_str).collect();
    match parse_mapping(&patched_refs, 0, patched_refs.len(), indent + 2) {
        Some(mut annotated) => {
            shift_lines(&mut annotated, start);
            annotated.value
        }
        None => AnnotatedValue::Scalar(Value::Null),
    }
}

/// Re-base a locally parsed annotation onto absolute line numbers.
fn shift_lines(annotated: &mut Annotated, offset: usize) {
    annotated.start_line += offset;
    match &mut annotated.value {
        AnnotatedValue::Mapping(map) => {
            for child in map.values_mut() {
                shift_lines(child, offset);
            }
        }
        AnnotatedValue::Sequence(items) => {
            for child in items {
                shift_lines(child, offset);
            }
        }
        AnnotatedValue::Scalar(_) => {}
    }
}

/// The value of a mapping entry: inline scalar, block scalar, or nested
/// block.
fn parse_entry_value(
    lines: &[&str],
    key_line: usize,
    entry_end: usize,
    indent: usize,
    rest: &str,
) -> AnnotatedValue {
    let rest = rest.trim();
    if rest == "|" || rest == ">" || rest.starts_with("|-") || rest.starts_with(">-") {
        // Block scalar: join the indented continuation lines.
        let body: Vec<&str> = lines[key_line + 1..entry_end]
            .iter()
            .map(|line| line.trim_start_matches(' '))
            .collect();
        return AnnotatedValue::Scalar(Value::String(body.join("\n")));
    }
    if !rest.is_empty() {
        return AnnotatedValue::Scalar(parse_scalar(rest));
    }
    // The nested block's own indent decides its depth; the key's indent
    // is only a floor (block sequences sit at the key's indent).
    parse_block(lines, key_line + 1, entry_end, indent)
        .map(|a| a.value)
        .unwrap_or(AnnotatedValue::Scalar(Value::Null))
}

/// Split `key: rest` on the first unquoted colon.
fn split_key(trimmed: &str) -> Option<(&str, &str)> {
    let mut in_single = false;
    let mut in_double = false;
    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            ':' if !in_single && !in_double => {
                let rest = &trimmed[idx + 1..];
                if rest.is_empty() || rest.starts_with(' ') {
                    let key = trimmed[..idx].trim().trim_matches('"').trim_matches('\'');
                    return Some((key, rest));
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a scalar via the YAML reader; anything unreadable stays a string.
fn parse_scalar(text: &str) -> Value {
    serde_yaml::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_i64(annotated: &Annotated) -> Option<i64> {
        match &annotated.value {
            AnnotatedValue::Scalar(value) => value.as_i64(),
            _ => None,
        }
    }

    #[test]
    fn flat_mapping_lines() {
        let tree = parse_line_tree("a: 1\nb: 2\n");
        let docs = &tree.kinds[UNKNOWN_KIND];
        assert_eq!(docs.len(), 1);
        let a = docs[0].synced.field("a").unwrap();
        let b = docs[0].synced.field("b").unwrap();
        assert_eq!((a.start_line, a.line_count), (0, 1));
        assert_eq!((b.start_line, b.line_count), (1, 1));
        assert_eq!(scalar_i64(a), Some(1));
    }

    #[test]
    fn documents_group_by_kind() {
        let text = "kind: Deployment\nname: web\n---\nkind: Service\nname: svc\n---\nkind: Service\nname: svc2\n";
        let tree = parse_line_tree(text);
        assert_eq!(tree.kinds["Deployment"].len(), 1);
        assert_eq!(tree.kinds["Service"].len(), 2);
        // Line annotations are absolute in the whole text.
        let svc2 = &tree.kinds["Service"][1].synced;
        assert_eq!(svc2.field("name").unwrap().start_line, 7);
    }

    #[test]
    fn nested_mapping_spans_cover_children() {
        let text = "kind: Deployment\nmetadata:\n  name: web\n  namespace: default\nspec:\n  replicas: 3\n";
        let tree = parse_line_tree(text);
        let doc = &tree.kinds["Deployment"][0].synced;
        let metadata = doc.field("metadata").unwrap();
        assert_eq!((metadata.start_line, metadata.line_count), (1, 3));
        let name = metadata.field("name").unwrap();
        assert_eq!((name.start_line, name.line_count), (2, 1));
        assert!(!metadata.is_leaf());
        assert!(name.is_leaf());
    }

    #[test]
    fn sequences_annotate_each_item() {
        let text = "containers:\n- name: web\n  image: nginx\n- name: sidecar\n  image: envoy\n";
        let tree = parse_line_tree(text);
        let doc = &tree.kinds[UNKNOWN_KIND][0].synced;
        let containers = doc.field("containers").unwrap();
        let first = containers.item(0).unwrap();
        let second = containers.item(1).unwrap();
        assert_eq!((first.start_line, first.line_count), (1, 2));
        assert_eq!((second.start_line, second.line_count), (3, 2));
        assert_eq!(
            first.field("name").and_then(|a| match &a.value {
                AnnotatedValue::Scalar(Value::String(s)) => Some(s.clone()),
                _ => None,
            }),
            Some("web".to_string())
        );
    }

    #[test]
    fn scalar_sequences_parse() {
        let text = "channels:\n- dev\n- prod\n";
        let tree = parse_line_tree(text);
        let channels = tree.kinds[UNKNOWN_KIND][0].synced.field("channels").unwrap();
        assert_eq!(channels.item(1).unwrap().start_line, 2);
        let raw = channels.to_raw();
        assert_eq!(raw.as_sequence().map(Vec::len), Some(2));
    }

    #[test]
    fn block_scalars_span_their_body() {
        let text = "data:\n  script: |\n    line one\n    line two\nafter: 1\n";
        let tree = parse_line_tree(text);
        let doc = &tree.kinds[UNKNOWN_KIND][0].synced;
        let script = doc.field("data").unwrap().field("script").unwrap();
        assert_eq!((script.start_line, script.line_count), (1, 3));
        assert!(script.is_leaf());
    }

    #[test]
    fn raw_tree_round_trips_values() {
        let text = "kind: Service\nmetadata:\n  name: svc\nports:\n- 80\n- 443\n";
        let tree = parse_line_tree(text);
        let raw = &tree.kinds["Service"][0].raw;
        assert_eq!(
            raw.pointer_like("/metadata/name"),
            Some(&Value::String("svc".to_string()))
        );
    }

    #[test]
    fn empty_text_parses_to_empty_tree() {
        assert!(parse_line_tree("").kinds.is_empty());
        assert!(parse_line_tree("\n\n").kinds.is_empty());
    }

    /// Minimal pointer helper for tests.
    trait PointerLike {
        fn pointer_like(&self, path: &str) -> Option<&Value>;
    }

    impl PointerLike for Value {
        fn pointer_like(&self, path: &str) -> Option<&Value> {
            path.split('/')
                .filter(|seg| !seg.is_empty())
                .try_fold(self, |value, seg| value.get(seg))
        }
    }
}
