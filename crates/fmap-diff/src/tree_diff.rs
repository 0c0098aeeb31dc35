//! Structural diff between two parsed YAML value trees.
//!
//! Entries carry a field path relative to `{kind, document index}` so
//! the highlight pass can look the target back up in the line-annotated
//! tree. Array growth and shrinkage produce dedicated entries carrying
//! the affected index; edits inside aligned array items recurse with the
//! index on the path.

use std::collections::BTreeMap;
use std::fmt;

use serde_yaml::Value;

/// One path segment: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSeg {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Operation applied at an array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOp {
    New,
    Delete,
}

/// The kind of change an entry describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffKind {
    /// A field's value changed.
    Edit,
    /// A field exists only in the new tree.
    New,
    /// A field exists only in the old tree.
    Delete,
    /// An array grew or shrank at `index`.
    Array { index: usize, op: ArrayOp },
}

/// One structural difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub kind: DiffKind,
    /// Top-level resource kind the documents group under.
    pub doc_kind: String,
    /// Index of the document within its kind group.
    pub doc_index: usize,
    /// Field path inside the document; for `Array` entries it names the
    /// array itself.
    pub path: Vec<PathSeg>,
}

impl DiffEntry {
    /// Slash-joined path, used for nested-under-deleted-array matching.
    #[must_use]
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Align positionally-compared document lists before diffing.
///
/// When the same kind has a different document count on each side, an
/// empty placeholder is inserted into the shorter (old) list at the
/// index of any new document whose `metadata.name` has no counterpart,
/// so positional comparison does not flag every following document.
/// A known approximation: several inserts or removes in one edit can
/// still misalign.
pub fn normalize(old: &mut BTreeMap<String, Vec<Value>>, new: &BTreeMap<String, Vec<Value>>) {
    for (kind, new_docs) in new {
        let Some(old_docs) = old.get_mut(kind) else {
            continue;
        };
        if old_docs.len() == new_docs.len() {
            continue;
        }
        let old_names: Vec<Option<String>> = old_docs
            .iter()
            .map(|doc| doc_name(doc).map(str::to_owned))
            .collect();
        for (index, doc) in new_docs.iter().enumerate() {
            let name = doc_name(doc);
            if name.is_some() && !old_names.iter().any(|o| o.as_deref() == name) {
                let at = index.min(old_docs.len());
                old_docs.insert(at, Value::Mapping(serde_yaml::Mapping::new()));
            }
        }
    }
}

fn doc_name(doc: &Value) -> Option<&str> {
    doc.get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
}

/// Diff two kind-grouped document sets.
#[must_use]
pub fn diff_documents(
    old: &BTreeMap<String, Vec<Value>>,
    new: &BTreeMap<String, Vec<Value>>,
) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    let empty = Vec::new();

    let kinds: Vec<&String> = old.keys().chain(new.keys().filter(|k| !old.contains_key(*k))).collect();
    for kind in kinds {
        let old_docs = old.get(kind).unwrap_or(&empty);
        let new_docs = new.get(kind).unwrap_or(&empty);
        let count = old_docs.len().max(new_docs.len());
        for index in 0..count {
            match (old_docs.get(index), new_docs.get(index)) {
                (Some(old_doc), Some(new_doc)) => {
                    diff_values(old_doc, new_doc, kind, index, &mut Vec::new(), &mut entries);
                }
                (None, Some(_)) => entries.push(DiffEntry {
                    kind: DiffKind::New,
                    doc_kind: kind.clone(),
                    doc_index: index,
                    path: Vec::new(),
                }),
                (Some(_), None) => entries.push(DiffEntry {
                    kind: DiffKind::Delete,
                    doc_kind: kind.clone(),
                    doc_index: index,
                    path: Vec::new(),
                }),
                (None, None) => {}
            }
        }
    }
    entries
}

fn diff_values(
    old: &Value,
    new: &Value,
    doc_kind: &str,
    doc_index: usize,
    path: &mut Vec<PathSeg>,
    out: &mut Vec<DiffEntry>,
) {
    if old == new {
        return;
    }
    match (old, new) {
        (Value::Mapping(old_map), Value::Mapping(new_map)) => {
            for (key, old_value) in old_map {
                let Some(key_str) = key.as_str() else { continue };
                path.push(PathSeg::Key(key_str.to_string()));
                match new_map.get(key) {
                    Some(new_value) => {
                        diff_values(old_value, new_value, doc_kind, doc_index, path, out);
                    }
                    None => out.push(DiffEntry {
                        kind: DiffKind::Delete,
                        doc_kind: doc_kind.to_string(),
                        doc_index,
                        path: path.clone(),
                    }),
                }
                path.pop();
            }
            for key in new_map.keys() {
                let Some(key_str) = key.as_str() else { continue };
                if !old_map.contains_key(key) {
                    path.push(PathSeg::Key(key_str.to_string()));
                    out.push(DiffEntry {
                        kind: DiffKind::New,
                        doc_kind: doc_kind.to_string(),
                        doc_index,
                        path: path.clone(),
                    });
                    path.pop();
                }
            }
        }
        (Value::Sequence(old_items), Value::Sequence(new_items)) => {
            let aligned = old_items.len().min(new_items.len());
            for index in 0..aligned {
                path.push(PathSeg::Index(index));
                diff_values(
                    &old_items[index],
                    &new_items[index],
                    doc_kind,
                    doc_index,
                    path,
                    out,
                );
                path.pop();
            }
            for index in aligned..new_items.len() {
                out.push(DiffEntry {
                    kind: DiffKind::Array {
                        index,
                        op: ArrayOp::New,
                    },
                    doc_kind: doc_kind.to_string(),
                    doc_index,
                    path: path.clone(),
                });
            }
            for index in aligned..old_items.len() {
                out.push(DiffEntry {
                    kind: DiffKind::Array {
                        index,
                        op: ArrayOp::Delete,
                    },
                    doc_kind: doc_kind.to_string(),
                    doc_index,
                    path: path.clone(),
                });
            }
        }
        _ => out.push(DiffEntry {
            kind: DiffKind::Edit,
            doc_kind: doc_kind.to_string(),
            doc_index,
            path: path.clone(),
        }),
    }
}
