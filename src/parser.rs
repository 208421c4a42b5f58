//! Parsing bracketed treebank text into [`Tree`]s.
//!
//! The surface syntax is a Lisp-ish s-expression: `(` and `)` are
//! standalone tokens, whitespace separates atoms. A first pass reads
//! one balanced list with an explicit stack; a second pass interprets
//! the list's shape. A list whose first element is itself a list is a
//! root wrapper (its `(ID ...)` and `(METADATA ...)` children are
//! pseudo-children); a two-element list with an atomic second element
//! is a leaf; everything else is a nonterminal, whose `(METADATA ...)`
//! child, if any, is consumed into the node's metadata map.
//!
//! [`parse_corpus`] layers corpus conventions on top: CorpusSearch
//! comments, blank-line sentence separation, and an optional leading
//! `( (VERSION ...))` header that names the dialect of the rest of the
//! file.

use thiserror::Error;

use crate::tree::{Metadata, MetadataValue, Tree, TreeError};
use crate::util::{LabelError, is_code_label, is_ec_token, label_and_index, version_metadata};
use crate::writer::{self, Format};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty input")]
    Empty,
    #[error("unmatched opening bracket")]
    UnmatchedOpen,
    #[error("unmatched closing bracket")]
    UnmatchedClose,
    #[error("stray token outside any tree: {0}")]
    StrayToken(String),
    #[error("trailing content after the tree")]
    TrailingContent,
    #[error("node has too few children")]
    TooFewChildren,
    #[error("leaf {0:?} has too many children")]
    LeafExtraChildren(String),
    #[error("too many children of root node")]
    RootExtraChildren,
    #[error("deep leaf {0:?} is missing its ORTHO child")]
    DeepLeafMissingOrtho(String),
    #[error("malformed metadata entry")]
    BadMetadata,
    #[error("node has more than one METADATA child")]
    DuplicateMetadata,
    #[error("unbalanced comment")]
    UnbalancedComment,
    #[error("unknown corpus format: {0}")]
    UnknownFormat(String),
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error(transparent)]
    Structure(#[from] TreeError),
}

#[derive(Debug, Clone)]
enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

fn head_of(list: &[Sexp]) -> Option<&str> {
    match list.first() {
        Some(Sexp::Atom(a)) => Some(a),
        _ => None,
    }
}

/// Reads exactly one balanced list from the input.
fn read_sexp(text: &str) -> Result<Vec<Sexp>, ParseError> {
    let mut stack: Vec<Vec<Sexp>> = Vec::new();
    let mut finished: Option<Vec<Sexp>> = None;
    let mut tok = String::new();

    let mut place_atom = |stack: &mut Vec<Vec<Sexp>>,
                          finished: &Option<Vec<Sexp>>,
                          tok: &mut String|
     -> Result<(), ParseError> {
        if tok.is_empty() {
            return Ok(());
        }
        if finished.is_some() {
            return Err(ParseError::TrailingContent);
        }
        match stack.last_mut() {
            Some(top) => {
                top.push(Sexp::Atom(std::mem::take(tok)));
                Ok(())
            }
            None => Err(ParseError::StrayToken(std::mem::take(tok))),
        }
    };

    for ch in text.chars() {
        match ch {
            '(' => {
                place_atom(&mut stack, &finished, &mut tok)?;
                if finished.is_some() {
                    return Err(ParseError::TrailingContent);
                }
                stack.push(Vec::new());
            }
            ')' => {
                place_atom(&mut stack, &finished, &mut tok)?;
                let done = stack.pop().ok_or(ParseError::UnmatchedClose)?;
                match stack.last_mut() {
                    Some(top) => top.push(Sexp::List(done)),
                    None => finished = Some(done),
                }
            }
            c if c.is_whitespace() => place_atom(&mut stack, &finished, &mut tok)?,
            c => tok.push(c),
        }
    }
    place_atom(&mut stack, &finished, &mut tok)?;
    if !stack.is_empty() {
        return Err(ParseError::UnmatchedOpen);
    }
    finished.ok_or(ParseError::Empty)
}

/// Parses one sentence in the given dialect.
pub fn parse(text: &str, format: Format) -> Result<Tree, ParseError> {
    build_node(read_sexp(text)?, format)
}

fn build_node(items: Vec<Sexp>, format: Format) -> Result<Tree, ParseError> {
    match items.first() {
        None => Err(ParseError::TooFewChildren),
        Some(Sexp::List(_)) => build_root(items, format),
        Some(Sexp::Atom(_)) => {
            let mut it = items.into_iter();
            let Some(Sexp::Atom(label)) = it.next() else {
                unreachable!()
            };
            build_labelled(label, it.collect(), format)
        }
    }
}

fn build_root(items: Vec<Sexp>, format: Format) -> Result<Tree, ParseError> {
    let mut id = None;
    let mut metadata: Option<Metadata> = None;
    let mut sentence: Option<Vec<Sexp>> = None;
    for item in items {
        let list = match item {
            Sexp::List(l) => l,
            Sexp::Atom(tok) => return Err(ParseError::StrayToken(tok)),
        };
        if head_of(&list) == Some("ID")
            && list.len() == 2
            && let Sexp::Atom(v) = &list[1]
        {
            id = Some(v.clone());
        } else if head_of(&list) == Some("METADATA") {
            if metadata.replace(list_to_metadata(&list[1..])?).is_some() {
                return Err(ParseError::DuplicateMetadata);
            }
        } else if sentence.replace(list).is_some() {
            return Err(ParseError::RootExtraChildren);
        }
    }
    let sentence = sentence.ok_or(ParseError::TooFewChildren)?;
    let child = build_node(sentence, format)?;
    Ok(Tree::rooted(id, child, metadata.unwrap_or_default())?)
}

fn build_labelled(label: String, rest: Vec<Sexp>, format: Format) -> Result<Tree, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::TooFewChildren);
    }
    if matches!(rest.first(), Some(Sexp::Atom(_))) {
        if rest.len() != 1 {
            return Err(ParseError::LeafExtraChildren(label));
        }
        let Some(Sexp::Atom(text)) = rest.into_iter().next() else {
            unreachable!()
        };
        return build_leaf(label, text, format);
    }
    if let Some(leaf) = build_deep_leaf(&label, &rest, format)? {
        return Ok(leaf);
    }
    build_nonterminal(label, rest, format)
}

fn build_leaf(mut label: String, mut text: String, format: Format) -> Result<Tree, ParseError> {
    let mut md = Metadata::new();
    // empty categories keep their index on the text; an EC without one
    // may still carry it on the label, like any other leaf
    let mut indexed = false;
    if is_ec_token(&text) {
        let (bare, ty, idx) = label_and_index(&text)?;
        if let (Some(ty), Some(idx)) = (ty, idx) {
            text = bare;
            md.insert("INDEX".to_string(), MetadataValue::Text(idx.to_string()));
            md.insert("IDX-TYPE".to_string(), MetadataValue::Text(ty.long().to_string()));
            indexed = true;
        }
    }
    if !indexed {
        let (bare, ty, idx) = label_and_index(&label)?;
        label = bare;
        if let (Some(ty), Some(idx)) = (ty, idx) {
            md.insert("INDEX".to_string(), MetadataValue::Text(idx.to_string()));
            md.insert("IDX-TYPE".to_string(), MetadataValue::Text(ty.long().to_string()));
        }
    }
    if format == Format::Dash
        && !is_code_label(&label)
        && let Some(at) = text.rfind('-')
    {
        let lemma = text[at + 1..].to_string();
        text.truncate(at);
        md.insert("LEMMA".to_string(), MetadataValue::Text(lemma));
    }
    Ok(Tree::leaf_parts(label, text, md))
}

/// Recognizes the deep-format leaf shapes: `(label (ORTHO text)
/// (METADATA ...))` in any dialect and child order, and, in the deep
/// dialect only, the metadata-less `(label (ORTHO text))` form.
fn build_deep_leaf(
    label: &str,
    rest: &[Sexp],
    format: Format,
) -> Result<Option<Tree>, ParseError> {
    let ortho = rest.iter().position(|s| {
        matches!(s, Sexp::List(l)
            if matches!(head_of(l), Some("ORTHO" | "ALT-ORTHO")) && l.len() == 2
                && matches!(l[1], Sexp::Atom(_)))
    });
    let meta = rest
        .iter()
        .position(|s| matches!(s, Sexp::List(l) if head_of(l) == Some("METADATA")));
    let (ortho, metadata) = match (rest.len(), ortho, meta) {
        (1, Some(o), None) if format == Format::Deep => (o, Metadata::new()),
        (1, None, Some(_)) if format == Format::Deep => {
            return Err(ParseError::DeepLeafMissingOrtho(label.to_string()));
        }
        (2, Some(o), Some(m)) => {
            let Sexp::List(entry) = &rest[m] else {
                unreachable!()
            };
            (o, list_to_metadata(&entry[1..])?)
        }
        _ => return Ok(None),
    };
    let Sexp::List(entry) = &rest[ortho] else {
        unreachable!()
    };
    let Sexp::Atom(text) = &entry[1] else {
        unreachable!()
    };
    Ok(Some(Tree::leaf_with(label, text, metadata).map_err(
        ParseError::Structure,
    )?))
}

fn build_nonterminal(label: String, rest: Vec<Sexp>, format: Format) -> Result<Tree, ParseError> {
    let mut metadata: Option<Metadata> = None;
    let mut children = Vec::new();
    for item in rest {
        let list = match item {
            Sexp::List(l) => l,
            Sexp::Atom(tok) => return Err(ParseError::StrayToken(tok)),
        };
        if head_of(&list) == Some("METADATA") {
            if metadata.replace(list_to_metadata(&list[1..])?).is_some() {
                return Err(ParseError::DuplicateMetadata);
            }
        } else {
            children.push(build_node(list, format)?);
        }
    }
    if children.is_empty() {
        return Err(ParseError::TooFewChildren);
    }
    Ok(Tree::branch_with(&label, children, metadata.unwrap_or_default())?)
}

fn list_to_metadata(entries: &[Sexp]) -> Result<Metadata, ParseError> {
    let mut md = Metadata::new();
    for entry in entries {
        let Sexp::List(entry) = entry else {
            return Err(ParseError::BadMetadata);
        };
        let Some(Sexp::Atom(key)) = entry.first() else {
            return Err(ParseError::BadMetadata);
        };
        let value = match entry.get(1) {
            None => return Err(ParseError::BadMetadata),
            Some(Sexp::Atom(v)) if entry.len() == 2 => MetadataValue::Text(v.clone()),
            _ => MetadataValue::Map(list_to_metadata(&entry[1..])?),
        };
        md.insert(key.clone(), value);
    }
    Ok(md)
}

/// A parsed corpus: its VERSION metadata and its sentences.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    pub metadata: Metadata,
    pub trees: Vec<Tree>,
}

impl Corpus {
    /// The dialect named by the FORMAT metadata key, defaulting to
    /// old-style.
    pub fn format(&self) -> Format {
        self.metadata
            .get("FORMAT")
            .and_then(MetadataValue::as_text)
            .and_then(|f| f.parse().ok())
            .unwrap_or_default()
    }

    /// Renders the whole corpus: the VERSION header (if there is any
    /// metadata) followed by blank-line-separated sentences.
    pub fn text(&self) -> Result<String, writer::WriteError> {
        let mut out = String::new();
        if !self.metadata.is_empty() {
            out.push_str("( ");
            writer::metadata_block("VERSION", &self.metadata, 2, &mut out);
            out.push_str(")\n\n");
        }
        let format = self.format();
        let rendered: Vec<String> = self
            .trees
            .iter()
            .map(|t| writer::write(t, format))
            .collect::<Result<_, _>>()?;
        out.push_str(&rendered.join("\n\n"));
        Ok(out)
    }

    /// All words of all sentences, in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.trees.iter().flat_map(Tree::words)
    }
}

/// Parses a whole corpus file's text.
pub fn parse_corpus(text: &str) -> Result<Corpus, ParseError> {
    let stripped = strip_comments(text)?;
    let mut metadata = Metadata::new();
    let mut format = Format::OldStyle;
    let mut trees = Vec::new();
    for (i, chunk) in sentence_chunks(&stripped).into_iter().enumerate() {
        if i == 0 {
            // a version header, if present, names the dialect of the rest
            let tree = parse(&chunk, Format::OldStyle)?;
            if let Some(md) = version_metadata(&tree) {
                if let Some(f) = md.get("FORMAT").and_then(MetadataValue::as_text) {
                    format = f
                        .parse()
                        .map_err(|_| ParseError::UnknownFormat(f.to_string()))?;
                }
                metadata = md;
            } else {
                trees.push(tree);
            }
            continue;
        }
        trees.push(parse(&chunk, format)?);
    }
    Ok(Corpus { metadata, trees })
}

/// Drops CorpusSearch comments: `/* ... */` and `/~* ... *~/` blocks
/// (line-delimited) and single `<+ ...` lines.
fn strip_comments(text: &str) -> Result<String, ParseError> {
    let mut out = String::new();
    let mut comment = false;
    for line in text.lines() {
        if line.starts_with("/*") || line.starts_with("/~*") {
            comment = true;
        } else if line.starts_with("<+") {
            // single-line parser-mode comment
        } else if comment && (line.ends_with("*/") || line.ends_with("*~/")) {
            comment = false;
        } else if !comment {
            out.push_str(line);
            out.push('\n');
        }
    }
    if comment {
        return Err(ParseError::UnbalancedComment);
    }
    Ok(out)
}

/// Splits corpus text into blank-line-separated sentence chunks.
fn sentence_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut cur = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !cur.is_empty() {
                chunks.push(std::mem::take(&mut cur));
            }
        } else {
            cur.push_str(line);
            cur.push('\n');
        }
    }
    if !cur.is_empty() {
        chunks.push(cur);
    }
    chunks
}
