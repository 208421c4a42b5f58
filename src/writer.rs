//! Rendering trees back to bracketed text.
//!
//! Three output dialects are supported. `old-style` and `dash` place
//! movement indices back on labels (or on the text, for traces) and can
//! only express index and lemma metadata; `deep` renders every leaf as
//! a small subtree with an `(ORTHO ...)` child and a full `(METADATA
//! ...)` block, losing nothing. Children are laid out one per line,
//! aligned under the column that follows `(LABEL `.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::tree::{Metadata, MetadataValue, NodeId, Tree};
use crate::util::{is_code_label, is_ec_token, is_movement_token, looks_like_trace};

/// The serialization dialect of a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    OldStyle,
    Dash,
    Deep,
}

impl FromStr for Format {
    type Err = WriteError;

    fn from_str(s: &str) -> Result<Format, WriteError> {
        match s {
            "old-style" => Ok(Format::OldStyle),
            "dash" => Ok(Format::Dash),
            "deep" => Ok(Format::Deep),
            _ => Err(WriteError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::OldStyle => "old-style",
            Format::Dash => "dash",
            Format::Deep => "deep",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("unknown corpus format: {0}")]
    UnknownFormat(String),
    #[error("movement trace {0:?} has no index")]
    TraceWithoutIndex(String),
}

/// Renders one sentence in the given dialect.
pub fn write(tree: &Tree, format: Format) -> Result<String, WriteError> {
    let mut out = String::new();
    write_node(tree, tree.root(), 0, format, &mut out)?;
    Ok(out)
}

fn pad(out: &mut String, col: usize) {
    for _ in 0..col {
        out.push(' ');
    }
}

fn write_node(
    tree: &Tree,
    node: NodeId,
    indent: usize,
    format: Format,
    out: &mut String,
) -> Result<(), WriteError> {
    match tree.text(node) {
        Some(text) => write_leaf(tree, node, text, indent, format, out),
        None => write_branch(tree, node, indent, format, out),
    }
}

fn index_suffix(tree: &Tree, node: NodeId) -> String {
    match tree.index(node) {
        Some((idx, ty)) => format!("{}{}", ty.short(), idx),
        None => String::new(),
    }
}

fn write_leaf(
    tree: &Tree,
    node: NodeId,
    text: &str,
    indent: usize,
    format: Format,
    out: &mut String,
) -> Result<(), WriteError> {
    let label = tree.label(node);
    match format {
        Format::OldStyle | Format::Dash => {
            let idxstr = index_suffix(tree, node);
            let mut rendered = text.to_string();
            if format == Format::Dash
                && let Some(MetadataValue::Text(lemma)) = tree.metadata(node).get("LEMMA")
            {
                rendered.push('-');
                rendered.push_str(lemma);
            }
            // only indices the reader takes from the text go on the text
            if is_ec_token(text) {
                out.push_str(&format!("({label} {rendered}{idxstr})"));
            } else {
                out.push_str(&format!("({label}{idxstr} {rendered})"));
            }
            Ok(())
        }
        Format::Deep => {
            if is_movement_token(text) && tree.index(node).is_none() {
                return Err(WriteError::TraceWithoutIndex(text.to_string()));
            }
            let tag = if looks_like_trace(text) || is_code_label(label) {
                "ALT-ORTHO"
            } else {
                "ORTHO"
            };
            let head = format!("({label} ");
            let col = indent + head.chars().count();
            out.push_str(&head);
            out.push_str(&format!("({tag} {text})"));
            let md = tree.metadata(node);
            if !md.is_empty() {
                out.push('\n');
                pad(out, col);
                metadata_block("METADATA", md, col, out);
            }
            out.push(')');
            Ok(())
        }
    }
}

fn write_branch(
    tree: &Tree,
    node: NodeId,
    indent: usize,
    format: Format,
    out: &mut String,
) -> Result<(), WriteError> {
    let is_root = tree.is_root_node(node);
    let mut head = String::from("(");
    if !is_root {
        head.push_str(tree.label(node));
    }
    let mut md = tree.metadata(node).clone();
    if !is_root && matches!(format, Format::OldStyle | Format::Dash) {
        head.push_str(&index_suffix(tree, node));
        md.remove("INDEX");
        md.remove("IDX-TYPE");
    }
    head.push(' ');
    let col = indent + head.chars().count();
    out.push_str(&head);
    for (i, &child) in tree.children(node).iter().enumerate() {
        if i > 0 {
            out.push('\n');
            pad(out, col);
        }
        write_node(tree, child, col, format, out)?;
    }
    if !md.is_empty() {
        out.push('\n');
        pad(out, col);
        metadata_block("METADATA", &md, col, out);
    }
    if is_root && let Some(id) = tree.id() {
        out.push_str("\n  (ID ");
        out.push_str(id);
        out.push(')');
    }
    out.push(')');
    Ok(())
}

/// Renders a metadata map as a `(NAME ...)` block whose opening paren
/// sits at `col`, entries aligned below one another, keys in sorted
/// order.
pub(crate) fn metadata_block(name: &str, md: &Metadata, col: usize, out: &mut String) {
    let head = format!("({name} ");
    let inner = col + head.chars().count();
    out.push_str(&head);
    for (i, (key, value)) in md.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            pad(out, inner);
        }
        match value {
            MetadataValue::Text(s) => out.push_str(&format!("({key} {s})")),
            MetadataValue::Map(m) => metadata_block(key, m, inner, out),
        }
    }
    out.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::tree::Tree;

    fn leaf_strs(leaf: &Tree, expect: [&str; 3]) {
        assert_eq!(write(leaf, Format::OldStyle).unwrap(), expect[0]);
        assert_eq!(write(leaf, Format::Dash).unwrap(), expect[1]);
        assert_eq!(write(leaf, Format::Deep).unwrap(), expect[2]);
    }

    #[test]
    fn plain_leaf() {
        let l = Tree::leaf("FOO", "bar").unwrap();
        leaf_strs(&l, ["(FOO bar)", "(FOO bar)", "(FOO (ORTHO bar))"]);
    }

    #[test]
    fn indexed_leaf() {
        let l = Tree::leaf("FOO-1", "bar").unwrap();
        leaf_strs(
            &l,
            [
                "(FOO-1 bar)",
                "(FOO-1 bar)",
                "(FOO (ORTHO bar)\n     (METADATA (IDX-TYPE regular)\n               (INDEX 1)))",
            ],
        );
    }

    #[test]
    fn lemma_leaf() {
        let mut l = Tree::leaf("FOO", "bar").unwrap();
        l.metadata_mut(l.root())
            .insert("LEMMA".to_string(), "baz".into());
        leaf_strs(
            &l,
            [
                "(FOO bar)",
                "(FOO bar-baz)",
                "(FOO (ORTHO bar)\n     (METADATA (LEMMA baz)))",
            ],
        );
    }

    #[test]
    fn trace_leaf() {
        let l = parse("(FOO *T*-1)", Format::OldStyle).unwrap();
        leaf_strs(
            &l,
            [
                "(FOO *T*-1)",
                "(FOO *T*-1)",
                "(FOO (ALT-ORTHO *T*)\n     (METADATA (IDX-TYPE regular)\n               (INDEX 1)))",
            ],
        );
    }

    #[test]
    fn movement_trace_needs_index_in_deep() {
        let l = Tree::leaf("FOO", "*T*").unwrap();
        assert_eq!(
            write(&l, Format::Deep),
            Err(WriteError::TraceWithoutIndex("*T*".to_string()))
        );
        // a bare * is an EC but not movement, so it renders
        let l = Tree::leaf("FOO", "*").unwrap();
        assert_eq!(write(&l, Format::Deep).unwrap(), "(FOO (ALT-ORTHO *))");
    }

    #[test]
    fn root_layout() {
        let t = parse(
            "( (IP (NP (D I)) (VBP love)\n (NP (NPR Python) (NPR programming))))",
            Format::OldStyle,
        )
        .unwrap();
        assert_eq!(
            t.to_string(),
            "( (IP (NP (D I))\n      (VBP love)\n      (NP (NPR Python)\n          (NPR programming))))"
        );
    }

    #[test]
    fn root_id_layout() {
        let t = parse(
            "( (IP (NP (D I)) (VBP love) (NP (NPR Python) (NPR programming)))(ID foo))",
            Format::OldStyle,
        )
        .unwrap();
        assert_eq!(t.id(), Some("foo"));
        let expect = "( (IP (NP (D I))\n      (VBP love)\n      (NP (NPR Python)\n          (NPR programming)))\n  (ID foo))";
        assert_eq!(t.to_string(), expect);

        // the position of the ID node does not matter to parsing
        let t2 = parse(
            "( (ID foo)(IP (NP (D I)) (VBP love) (NP (NPR Python) (NPR programming))))",
            Format::OldStyle,
        )
        .unwrap();
        assert_eq!(t, t2);
        assert_eq!(t2.to_string(), expect);
    }

    #[test]
    fn root_metadata_layout() {
        let t = parse(
            "( (IP (NP (D I)) (VBP love) (NP (NPR Python) (NPR programming)))\
             (METADATA (AOO bar) (BOO (A 1) (B 2))))",
            Format::OldStyle,
        )
        .unwrap();
        let expect = "( (IP (NP (D I))\n      (VBP love)\n      (NP (NPR Python)\n          (NPR programming)))\n  (METADATA (AOO bar)\n            (BOO (A 1)\n                 (B 2))))";
        assert_eq!(t.to_string(), expect);

        let t2 = parse(
            "( (METADATA (BOO (A 1) (B 2)) (AOO bar)) \
             (IP (NP (D I)) (VBP love) (NP (NPR Python) (NPR programming))))",
            Format::OldStyle,
        )
        .unwrap();
        assert_eq!(t, t2);
        assert_eq!(t2.to_string(), expect);
    }

    #[test]
    fn root_metadata_and_id_layout() {
        let t = parse(
            "( (IP (NP (D I)) (VBP love) (NP (NPR Python) (NPR programming)))\
             (METADATA (AOO bar) (BOO (A 1) (B 2))) (ID foo))",
            Format::OldStyle,
        )
        .unwrap();
        assert_eq!(
            t.to_string(),
            "( (IP (NP (D I))\n      (VBP love)\n      (NP (NPR Python)\n          (NPR programming)))\n  (METADATA (AOO bar)\n            (BOO (A 1)\n                 (B 2)))\n  (ID foo))"
        );
    }

    #[test]
    fn indexed_null_ec_round_trip() {
        use crate::util::IndexType;

        let t = parse("(X-1 0)", Format::OldStyle).unwrap();
        assert_eq!(t.label(t.root()), "X");
        assert_eq!(t.text(t.root()), Some("0"));
        assert_eq!(t.index(t.root()), Some((1, IndexType::Regular)));
        assert_eq!(write(&t, Format::OldStyle).unwrap(), "(X 0-1)");
        assert_eq!(parse("(X 0-1)", Format::OldStyle).unwrap(), t);

        // dash must not mistake the text-side index for a lemma
        assert_eq!(write(&t, Format::Dash).unwrap(), "(X 0-1)");
        let back = parse("(X 0-1)", Format::Dash).unwrap();
        assert!(back.metadata(back.root()).get("LEMMA").is_none());
        assert_eq!(back, t);
    }

    #[test]
    fn trace_lookalike_keeps_label_index() {
        let t = parse("(X-1 *FOO*)", Format::OldStyle).unwrap();
        assert_eq!(t.text(t.root()), Some("*FOO*"));
        assert_eq!(write(&t, Format::OldStyle).unwrap(), "(X-1 *FOO*)");
        assert_eq!(parse("(X-1 *FOO*)", Format::OldStyle).unwrap(), t);
    }

    #[test]
    fn gap_index_round_trip() {
        let src = "( (IP=1 (FOO bar)))";
        let t = parse(src, Format::OldStyle).unwrap();
        assert_eq!(t.to_string(), src);
    }

    #[test]
    fn round_trips() {
        let src = "( (IP (NP-SBJ (NPR John))\n      (V eats)\n      (NP-OB1 *ICH*-1)\n      (NP-1 (D the)\n            (N apple))))";
        for format in [Format::OldStyle, Format::Dash, Format::Deep] {
            let t = parse(src, Format::OldStyle).unwrap();
            let text = write(&t, format).unwrap();
            let back = parse(&text, format).unwrap();
            assert_eq!(t, back, "round trip through {format}");
        }
    }

    #[test]
    fn dash_lemma_round_trip() {
        let t = parse("(FOO bar-baz)", Format::Dash).unwrap();
        assert_eq!(t.text(t.root()), Some("bar"));
        assert_eq!(
            t.metadata(t.root()).get("LEMMA"),
            Some(&MetadataValue::Text("baz".to_string()))
        );
        assert_eq!(write(&t, Format::Dash).unwrap(), "(FOO bar-baz)");
    }

    #[test]
    fn format_names() {
        assert_eq!("old-style".parse::<Format>().unwrap(), Format::OldStyle);
        assert_eq!("dash".parse::<Format>().unwrap(), Format::Dash);
        assert_eq!("deep".parse::<Format>().unwrap(), Format::Deep);
        assert!("shallow".parse::<Format>().is_err());
        assert_eq!(Format::Deep.to_string(), "deep");
    }
}
