//! Label parsing and token classification helpers.
//!
//! Annotation labels can carry a trailing movement index, either
//! `-<digits>` (a regular index) or `=<digits>` (a gapping index).
//! [`label_and_index`] splits a raw label into its bare form and the
//! index; the tree model then stores indices canonically in node
//! metadata under the `INDEX` and `IDX-TYPE` keys.

use thiserror::Error;

use crate::tree::{Metadata, MetadataValue, NodeId, Tree};

/// Error raised for labels that cannot carry a well-formed index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    /// A label may contain at most one `=`.
    #[error("label {0:?} contains more than one `=`")]
    MultipleGaps(String),
}

/// How a movement index binds to its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// A `-n` index.
    Regular,
    /// A `=n` gapping index.
    Gap,
}

impl IndexType {
    /// The separator used in label suffixes, `-` or `=`.
    pub fn short(self) -> char {
        match self {
            IndexType::Regular => '-',
            IndexType::Gap => '=',
        }
    }

    /// The form used in `IDX-TYPE` metadata, `regular` or `gap`.
    pub fn long(self) -> &'static str {
        match self {
            IndexType::Regular => "regular",
            IndexType::Gap => "gap",
        }
    }

    pub fn from_long(s: &str) -> Option<IndexType> {
        match s {
            "regular" => Some(IndexType::Regular),
            "gap" => Some(IndexType::Gap),
            _ => None,
        }
    }
}

/// Splits a raw label into its bare label and trailing index, if any.
///
/// `FOO-1` gives `("FOO", Regular, 1)`; `FOO=1` gives `("FOO", Gap, 1)`.
/// Dash tags are preserved: `FOO-BAR-1` gives `("FOO-BAR", Regular, 1)`.
/// A label with more than one `=` is malformed.
pub fn label_and_index(
    raw: &str,
) -> Result<(String, Option<IndexType>, Option<u32>), LabelError> {
    if raw.matches('=').count() > 1 {
        return Err(LabelError::MultipleGaps(raw.to_string()));
    }
    let digits = raw
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits > 0 && digits < raw.len() {
        let sep_at = raw.len() - digits - 1;
        let ty = match raw.as_bytes()[sep_at] {
            b'-' => Some(IndexType::Regular),
            b'=' => Some(IndexType::Gap),
            _ => None,
        };
        if let Some(ty) = ty
            && sep_at > 0
            && let Ok(idx) = raw[sep_at + 1..].parse::<u32>()
        {
            return Ok((raw[..sep_at].to_string(), Some(ty), Some(idx)));
        }
    }
    Ok((raw.to_string(), None, None))
}

/// Trace tokens that carry their index on the leaf text rather than
/// the label.
pub const TRACE_TOKENS: &[&str] = &["*T*", "*ICH*", "*CL*", "*"];

fn bare_token(text: &str) -> &str {
    text.split('-').next().unwrap_or(text)
}

/// Whether a leaf text is one of the whitelisted trace tokens,
/// possibly with an index suffix.
pub fn is_trace_token(text: &str) -> bool {
    TRACE_TOKENS.contains(&bare_token(text))
}

/// Whether a trace token marks movement (and so needs an index).
pub fn is_movement_token(text: &str) -> bool {
    matches!(bare_token(text), "*T*" | "*ICH*" | "*CL*")
}

/// Whether a leaf text is an empty category: a trace or a null `0`.
pub fn is_ec_token(text: &str) -> bool {
    is_trace_token(text) || bare_token(text) == "0"
}

/// The serializer-side test: anything starting with `*`, or the null
/// `0`, keeps its index on the text rather than the label.
pub fn looks_like_trace(text: &str) -> bool {
    text.starts_with('*') || text == "0"
}

/// Whether a label marks corpus markup rather than linguistic content.
pub fn is_code_label(label: &str) -> bool {
    label == "CODE" || label.starts_with("CODING")
}

/// Converts a node's children into a metadata map: leaf children become
/// text entries keyed by label, nonterminal children become nested maps.
pub fn tree_to_metadata(tree: &Tree, node: NodeId) -> Metadata {
    let mut md = Metadata::new();
    for &child in tree.children(node) {
        let value = match tree.text(child) {
            Some(text) => MetadataValue::Text(text.to_string()),
            None => MetadataValue::Map(tree_to_metadata(tree, child)),
        };
        md.insert(tree.label(child).to_string(), value);
    }
    md
}

/// If the tree is a corpus VERSION header (a root wrapper whose sole
/// child is labelled `VERSION`), returns the header's metadata.
pub fn version_metadata(tree: &Tree) -> Option<Metadata> {
    let root = tree.root();
    if !tree.is_root_node(root) {
        return None;
    }
    let &child = tree.children(root).first()?;
    if tree.label(child) == "VERSION" {
        Some(tree_to_metadata(tree, child))
    } else {
        None
    }
}
