//! The predicate algebra for querying trees.
//!
//! A [`SearchFn`] is a structured predicate over one node of a [`Tree`].
//! Applying it yields a [`MatchResult`]: nothing, the node itself (or a
//! related node, for the moving predicates), or a list of nodes. The
//! `&`, `|`, and `!` operators combine predicates; `&` and `|`
//! short-circuit on a falsy left side without evaluating the right, and
//! a chained predicate receives the *original* node, not the left
//! side's result.
//!
//! Sibling- and precedence-sensitive predicates skip *ignored* nodes.
//! By default the `CODE`, `ID`, and `METADATA` pseudo-nodes are
//! ignored; [`ignoring`] installs an extra ignore predicate for the
//! dynamic extent of its argument only. Ignore predicates themselves
//! always evaluate with no active ignore.
//!
//! Because a `SearchFn` is data rather than an opaque closure, its
//! `Display` form is a pure function of its structure: two separately
//! built but identical predicates render identically.

use std::fmt;
use std::ops;
use std::sync::Arc;

use regex::Regex;
use rustc_hash::FxHashMap;

use crate::tree::{NodeId, Tree};
use crate::util::is_trace_token;

/// A string-or-regex predicate argument. Regexes match anchored at the
/// start of the candidate.
#[derive(Clone)]
pub enum StrMatch {
    Literal(String),
    Regex(Regex),
}

impl StrMatch {
    fn matches_exact(&self, s: &str) -> bool {
        match self {
            StrMatch::Literal(l) => l == s,
            StrMatch::Regex(re) => anchored(re, s),
        }
    }

    /// Literal match, also accepting trailing dash tags: `NP` matches
    /// both `NP` and `NP-SBJ`.
    fn matches_with_dash(&self, s: &str) -> bool {
        match self {
            StrMatch::Literal(l) => {
                s == l
                    || (s.len() > l.len()
                        && s.starts_with(l.as_str())
                        && s.as_bytes()[l.len()] == b'-')
            }
            StrMatch::Regex(re) => anchored(re, s),
        }
    }
}

fn anchored(re: &Regex, s: &str) -> bool {
    re.find(s).is_some_and(|m| m.start() == 0)
}

impl fmt::Debug for StrMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrMatch::Literal(l) => write!(f, "Literal({l:?})"),
            StrMatch::Regex(re) => write!(f, "Regex({:?})", re.as_str()),
        }
    }
}

impl fmt::Display for StrMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrMatch::Literal(l) => write!(f, "'{l}'"),
            StrMatch::Regex(re) => write!(f, "re('{}')", re.as_str()),
        }
    }
}

impl From<&str> for StrMatch {
    fn from(s: &str) -> StrMatch {
        StrMatch::Literal(s.to_string())
    }
}

impl From<String> for StrMatch {
    fn from(s: String) -> StrMatch {
        StrMatch::Literal(s)
    }
}

impl From<Regex> for StrMatch {
    fn from(re: Regex) -> StrMatch {
        StrMatch::Regex(re)
    }
}

/// The comparison mode for [`daughter_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Equal,
    Less,
    Greater,
}

impl Cmp {
    fn holds(self, have: usize, want: usize) -> bool {
        match self {
            Cmp::Equal => have == want,
            Cmp::Less => have < want,
            Cmp::Greater => have > want,
        }
    }
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cmp::Equal => "equal",
            Cmp::Less => "less",
            Cmp::Greater => "greater",
        })
    }
}

/// A named label comparator for [`shares_label_with_mod`]. The name is
/// part of the predicate's printed form.
#[derive(Clone)]
pub struct LabelCmp {
    name: String,
    cmp: Arc<dyn Fn(&str, &str) -> bool + Send + Sync>,
}

impl LabelCmp {
    pub fn new(
        name: impl Into<String>,
        cmp: impl Fn(&str, &str) -> bool + Send + Sync + 'static,
    ) -> LabelCmp {
        LabelCmp { name: name.into(), cmp: Arc::new(cmp) }
    }

    pub fn equality() -> LabelCmp {
        LabelCmp::new("equal", |a, b| a == b)
    }
}

/// The outcome of applying a predicate to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    None,
    One(NodeId),
    Many(Vec<NodeId>),
}

impl MatchResult {
    /// Truthiness: `None` and an empty `Many` are falsy.
    pub fn is_match(&self) -> bool {
        match self {
            MatchResult::None => false,
            MatchResult::One(_) => true,
            MatchResult::Many(v) => !v.is_empty(),
        }
    }

    /// Flattens the result to a list of nodes.
    pub fn nodes(self) -> Vec<NodeId> {
        match self {
            MatchResult::None => Vec::new(),
            MatchResult::One(n) => vec![n],
            MatchResult::Many(v) => v,
        }
    }
}

/// The ignore predicate in force during an evaluation.
#[derive(Clone, Copy, Default)]
pub struct IgnoreScope<'a> {
    active: Option<&'a SearchFn>,
}

const DEFAULT_IGNORED: &[&str] = &["CODE", "ID", "METADATA"];

fn should_ignore(tree: &Tree, node: NodeId, scope: IgnoreScope<'_>) -> bool {
    if let Some(f) = scope.active
        && f.eval(tree, node, IgnoreScope::default()).is_match()
    {
        return true;
    }
    let label = tree.label(node);
    DEFAULT_IGNORED.iter().any(|base| {
        label == *base || (label.starts_with(base) && label[base.len()..].starts_with('-'))
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SisterWalk {
    All,
    Left,
    Right,
    ImmLeft,
    ImmRight,
}

impl SisterWalk {
    fn has_name(self) -> &'static str {
        match self {
            SisterWalk::All => "has_sister",
            SisterWalk::Left => "has_left_sister",
            SisterWalk::Right => "has_right_sister",
            SisterWalk::ImmLeft => "has_imm_left_sister",
            SisterWalk::ImmRight => "has_imm_right_sister",
        }
    }

    fn collect_name(self) -> &'static str {
        match self {
            SisterWalk::All => "sisters",
            SisterWalk::Left => "left_sisters",
            SisterWalk::Right => "right_sisters",
            SisterWalk::ImmLeft => "imm_left_sister",
            SisterWalk::ImmRight => "imm_right_sister",
        }
    }
}

/// Collects the non-ignored sisters reached by the given walk, nearest
/// first on each side.
fn sisters_of(tree: &Tree, node: NodeId, walk: SisterWalk, scope: IgnoreScope<'_>) -> Vec<NodeId> {
    let gather = |step: fn(&Tree, NodeId) -> Option<NodeId>, only_first: bool| {
        let mut out = Vec::new();
        let mut cur = node;
        while let Some(s) = step(tree, cur) {
            cur = s;
            if !should_ignore(tree, s, scope) {
                out.push(s);
                if only_first {
                    break;
                }
            }
        }
        out
    };
    match walk {
        SisterWalk::Left => gather(Tree::left_sibling, false),
        SisterWalk::Right => gather(Tree::right_sibling, false),
        SisterWalk::ImmLeft => gather(Tree::left_sibling, true),
        SisterWalk::ImmRight => gather(Tree::right_sibling, true),
        SisterWalk::All => {
            let mut out = gather(Tree::left_sibling, false);
            out.extend(gather(Tree::right_sibling, false));
            out
        }
    }
}

#[derive(Clone)]
enum Matcher {
    Anything,
    HasLabel { label: StrMatch, exact: bool },
    HasText(StrMatch),
    HasWord(StrMatch),
    HasLemma(StrMatch),
    HasDashTag(String),
    HasDaughter(Box<SearchFn>),
    Daughters(Box<SearchFn>),
    FirstDaughter(Box<SearchFn>),
    HasSister(SisterWalk, Box<SearchFn>),
    Sisters(SisterWalk, Box<SearchFn>),
    HasParent(Box<SearchFn>),
    Parent(Box<SearchFn>),
    HasAncestor(Box<SearchFn>),
    Ancestor(Box<SearchFn>),
    IPrecedes(Box<SearchFn>),
    IsLeaf,
    IsRoot,
    IsTrace,
    IsGapped,
    IsIndexed,
    DaughterCount(usize, Cmp),
    CoIndexed(Box<SearchFn>),
    HasCoIndexed(Box<SearchFn>),
    Antecedent(Box<SearchFn>),
    HasAntecedent(Box<SearchFn>),
    SharesLabelWith { with: Box<SearchFn>, all: bool },
    SharesLabelWithMod { with: Box<SearchFn>, all: bool, cmp: LabelCmp },
    Deep(Box<SearchFn>),
    Ignoring { ignore: Box<SearchFn>, inner: Box<SearchFn> },
    And(Box<SearchFn>, Box<SearchFn>),
    Or(Box<SearchFn>, Box<SearchFn>),
    Not(Box<SearchFn>),
}

/// A structured, combinable predicate over tree nodes.
#[derive(Clone)]
pub struct SearchFn {
    matcher: Matcher,
}

impl From<Matcher> for SearchFn {
    fn from(matcher: Matcher) -> SearchFn {
        SearchFn { matcher }
    }
}

impl SearchFn {
    /// Applies the predicate to one node under the default ignores.
    pub fn matches(&self, tree: &Tree, node: NodeId) -> MatchResult {
        self.eval(tree, node, IgnoreScope::default())
    }

    pub fn is_match(&self, tree: &Tree, node: NodeId) -> bool {
        self.matches(tree, node).is_match()
    }

    fn eval(&self, tree: &Tree, node: NodeId, scope: IgnoreScope<'_>) -> MatchResult {
        use MatchResult::{Many, None as NoMatch, One};
        match &self.matcher {
            Matcher::Anything => One(node),
            Matcher::HasLabel { label, exact } => {
                let matched = if *exact {
                    label.matches_exact(tree.label(node))
                } else {
                    label.matches_with_dash(tree.label(node))
                };
                if matched { One(node) } else { NoMatch }
            }
            Matcher::HasText(text) | Matcher::HasWord(text) => match tree.text(node) {
                Some(t) if text.matches_with_dash(t) => One(node),
                _ => NoMatch,
            },
            Matcher::HasLemma(lemma) => {
                let found = tree
                    .metadata(node)
                    .get("LEMMA")
                    .and_then(|v| v.as_text())
                    .is_some_and(|l| lemma.matches_exact(l));
                if tree.is_leaf(node) && found { One(node) } else { NoMatch }
            }
            Matcher::HasDashTag(tag) => {
                let mut parts = tree.label(node).split('-');
                parts.next();
                if parts.any(|p| p == tag) { One(node) } else { NoMatch }
            }
            Matcher::HasDaughter(f) => {
                let hit = tree
                    .children(node)
                    .iter()
                    .filter(|&&d| !should_ignore(tree, d, scope))
                    .any(|&d| f.eval(tree, d, scope).is_match());
                if hit { One(node) } else { NoMatch }
            }
            Matcher::Daughters(f) => Many(
                tree.children(node)
                    .iter()
                    .filter(|&&d| !should_ignore(tree, d, scope))
                    .flat_map(|&d| f.eval(tree, d, scope).nodes())
                    .collect(),
            ),
            Matcher::FirstDaughter(f) => tree
                .children(node)
                .iter()
                .find(|&&d| f.eval(tree, d, scope).is_match())
                .map_or(NoMatch, |&d| One(d)),
            Matcher::HasSister(walk, f) => {
                let sisters = sisters_of(tree, node, *walk, scope);
                if !sisters.is_empty()
                    && sisters.iter().any(|&s| f.eval(tree, s, scope).is_match())
                {
                    One(node)
                } else {
                    NoMatch
                }
            }
            Matcher::Sisters(walk, f) => Many(
                sisters_of(tree, node, *walk, scope)
                    .into_iter()
                    .flat_map(|s| f.eval(tree, s, scope).nodes())
                    .collect(),
            ),
            Matcher::HasParent(f) => match tree.parent(node) {
                Some(p) if f.eval(tree, p, scope).is_match() => One(node),
                _ => NoMatch,
            },
            Matcher::Parent(f) => match tree.parent(node) {
                Some(p) => f.eval(tree, p, scope),
                None => NoMatch,
            },
            Matcher::HasAncestor(f) => {
                let mut cur = tree.parent(node);
                while let Some(a) = cur {
                    if f.eval(tree, a, scope).is_match() {
                        return One(node);
                    }
                    cur = tree.parent(a);
                }
                NoMatch
            }
            Matcher::Ancestor(f) => {
                let mut cur = tree.parent(node);
                while let Some(a) = cur {
                    if f.eval(tree, a, scope).is_match() {
                        return One(a);
                    }
                    cur = tree.parent(a);
                }
                NoMatch
            }
            Matcher::IPrecedes(f) => {
                let mut this = Some(node);
                while let Some(t) = this {
                    let mut next = tree.right_sibling(t);
                    while let Some(n) = next {
                        if should_ignore(tree, n, scope) {
                            next = tree.right_sibling(n);
                        } else {
                            break;
                        }
                    }
                    if let Some(n) = next
                        && f.left_edge(tree, n, scope)
                    {
                        return One(node);
                    }
                    this = tree.parent(t);
                }
                NoMatch
            }
            Matcher::IsLeaf => {
                if tree.is_leaf(node) { One(node) } else { NoMatch }
            }
            Matcher::IsRoot => match tree.parent(node) {
                Some(p) if tree.is_root_node(p) => One(node),
                _ => NoMatch,
            },
            Matcher::IsTrace => {
                if is_trace_node(tree, node) { One(node) } else { NoMatch }
            }
            Matcher::IsGapped => match tree.index(node) {
                Some((_, crate::util::IndexType::Gap)) => One(node),
                _ => NoMatch,
            },
            Matcher::IsIndexed => {
                if tree.index(node).is_some() { One(node) } else { NoMatch }
            }
            Matcher::DaughterCount(want, cmp) => {
                if cmp.holds(tree.children(node).len(), *want) {
                    One(node)
                } else {
                    NoMatch
                }
            }
            Matcher::CoIndexed(f) => Many(
                coindex_sharers(tree, node)
                    .into_iter()
                    .filter(|&c| f.eval(tree, c, scope).is_match())
                    .collect(),
            ),
            Matcher::HasCoIndexed(f) => {
                let hit = coindex_sharers(tree, node)
                    .into_iter()
                    .any(|c| f.eval(tree, c, scope).is_match());
                if hit { One(node) } else { NoMatch }
            }
            Matcher::Antecedent(f) => match antecedent_of(tree, node) {
                Some(a) if f.eval(tree, a, scope).is_match() => One(a),
                _ => NoMatch,
            },
            Matcher::HasAntecedent(f) => match antecedent_of(tree, node) {
                Some(a) if f.eval(tree, a, scope).is_match() => One(node),
                _ => NoMatch,
            },
            Matcher::SharesLabelWith { with, all } => {
                let label = tree.label(node);
                for c in with.eval(tree, node, scope).nodes() {
                    if tree.label(c) == label {
                        if !all {
                            return One(node);
                        }
                    } else if *all {
                        return NoMatch;
                    }
                }
                if *all { One(node) } else { NoMatch }
            }
            Matcher::SharesLabelWithMod { with, all, cmp } => {
                let label = tree.label(node);
                let candidates = with.eval(tree, node, scope).nodes();
                if candidates.is_empty() {
                    return NoMatch;
                }
                for c in candidates {
                    if (cmp.cmp)(label, tree.label(c)) {
                        if !all {
                            return One(node);
                        }
                    } else if *all {
                        return NoMatch;
                    }
                }
                if *all { One(node) } else { NoMatch }
            }
            Matcher::Deep(f) => Many(
                tree.subtrees(node)
                    .flat_map(|n| f.eval(tree, n, scope).nodes())
                    .collect(),
            ),
            Matcher::Ignoring { ignore, inner } => {
                inner.eval(tree, node, IgnoreScope { active: Some(ignore) })
            }
            Matcher::And(a, b) => {
                let res = a.eval(tree, node, scope);
                if res.is_match() { b.eval(tree, node, scope) } else { res }
            }
            Matcher::Or(a, b) => {
                let res = a.eval(tree, node, scope);
                if res.is_match() { res } else { b.eval(tree, node, scope) }
            }
            Matcher::Not(a) => {
                if a.eval(tree, node, scope).is_match() { NoMatch } else { One(node) }
            }
        }
    }

    /// Descends leftmost non-ignored children looking for a match at
    /// the left edge of the subtree.
    fn left_edge(&self, tree: &Tree, node: NodeId, scope: IgnoreScope<'_>) -> bool {
        if self.eval(tree, node, scope).is_match() {
            return true;
        }
        let mut child = tree.children(node).first().copied();
        while let Some(c) = child {
            if should_ignore(tree, c, scope) {
                child = tree.right_sibling(c);
            } else {
                break;
            }
        }
        match child {
            Some(c) => self.left_edge(tree, c, scope),
            None => false,
        }
    }
}

fn is_trace_node(tree: &Tree, node: NodeId) -> bool {
    tree.text(node).is_some_and(is_trace_token)
}

/// Groups every indexed node in the sentence by index value.
fn index_groups(tree: &Tree) -> FxHashMap<u32, Vec<NodeId>> {
    let mut groups: FxHashMap<u32, Vec<NodeId>> = FxHashMap::default();
    for n in tree.subtrees(tree.root()) {
        if let Some((idx, _)) = tree.index(n) {
            groups.entry(idx).or_default().push(n);
        }
    }
    groups
}

/// The other nodes sharing this node's index.
fn coindex_sharers(tree: &Tree, node: NodeId) -> Vec<NodeId> {
    let Some((idx, _)) = tree.index(node) else {
        return Vec::new();
    };
    index_groups(tree)
        .remove(&idx)
        .unwrap_or_default()
        .into_iter()
        .filter(|&c| c != node)
        .collect()
}

/// The unique non-trace node sharing this node's index, if exactly one
/// exists.
fn antecedent_of(tree: &Tree, node: NodeId) -> Option<NodeId> {
    let sharers: Vec<NodeId> = coindex_sharers(tree, node)
        .into_iter()
        .filter(|&c| !is_trace_node(tree, c))
        .collect();
    match sharers.as_slice() {
        &[only] => Some(only),
        _ => None,
    }
}

// Constructors

/// The identity predicate: matches every node.
pub fn anything() -> SearchFn {
    Matcher::Anything.into()
}

/// Matches a node whose label equals the argument, allowing extra
/// trailing dash tags (`NP` matches `NP-SBJ`). Regexes match anchored
/// at the start of the label.
pub fn has_label(label: impl Into<StrMatch>) -> SearchFn {
    Matcher::HasLabel { label: label.into(), exact: false }.into()
}

/// Like [`has_label`], but a literal must match the entire label.
pub fn has_label_exact(label: impl Into<StrMatch>) -> SearchFn {
    Matcher::HasLabel { label: label.into(), exact: true }.into()
}

/// Matches a leaf by its text, with the same dash-tag latitude as
/// [`has_label`].
pub fn has_text(text: impl Into<StrMatch>) -> SearchFn {
    Matcher::HasText(text.into()).into()
}

/// Matches a leaf by its surface word.
pub fn has_word(word: impl Into<StrMatch>) -> SearchFn {
    Matcher::HasWord(word.into()).into()
}

/// Matches a leaf whose LEMMA metadata equals (or, for a regex,
/// matches) the argument.
pub fn has_lemma(lemma: impl Into<StrMatch>) -> SearchFn {
    Matcher::HasLemma(lemma.into()).into()
}

/// Matches a node carrying the given dash tag anywhere after the base
/// label.
pub fn has_dash_tag(tag: impl Into<String>) -> SearchFn {
    Matcher::HasDashTag(tag.into()).into()
}

/// Matches a node one of whose (non-ignored) daughters satisfies the
/// predicate; yields the node itself.
pub fn has_daughter(f: SearchFn) -> SearchFn {
    Matcher::HasDaughter(Box::new(f)).into()
}

/// Collects the (non-ignored) daughters satisfying the predicate.
pub fn daughters(f: SearchFn) -> SearchFn {
    Matcher::Daughters(Box::new(f)).into()
}

/// Yields the leftmost daughter satisfying the predicate.
pub fn first_daughter(f: SearchFn) -> SearchFn {
    Matcher::FirstDaughter(Box::new(f)).into()
}

pub fn has_sister(f: SearchFn) -> SearchFn {
    Matcher::HasSister(SisterWalk::All, Box::new(f)).into()
}

pub fn has_left_sister(f: SearchFn) -> SearchFn {
    Matcher::HasSister(SisterWalk::Left, Box::new(f)).into()
}

pub fn has_right_sister(f: SearchFn) -> SearchFn {
    Matcher::HasSister(SisterWalk::Right, Box::new(f)).into()
}

pub fn has_imm_left_sister(f: SearchFn) -> SearchFn {
    Matcher::HasSister(SisterWalk::ImmLeft, Box::new(f)).into()
}

pub fn has_imm_right_sister(f: SearchFn) -> SearchFn {
    Matcher::HasSister(SisterWalk::ImmRight, Box::new(f)).into()
}

/// Collects the sisters satisfying the predicate, nearest first on
/// each side.
pub fn sisters(f: SearchFn) -> SearchFn {
    Matcher::Sisters(SisterWalk::All, Box::new(f)).into()
}

pub fn left_sisters(f: SearchFn) -> SearchFn {
    Matcher::Sisters(SisterWalk::Left, Box::new(f)).into()
}

pub fn right_sisters(f: SearchFn) -> SearchFn {
    Matcher::Sisters(SisterWalk::Right, Box::new(f)).into()
}

pub fn imm_left_sister(f: SearchFn) -> SearchFn {
    Matcher::Sisters(SisterWalk::ImmLeft, Box::new(f)).into()
}

pub fn imm_right_sister(f: SearchFn) -> SearchFn {
    Matcher::Sisters(SisterWalk::ImmRight, Box::new(f)).into()
}

/// Matches a node whose parent satisfies the predicate; yields the
/// node itself.
pub fn has_parent(f: SearchFn) -> SearchFn {
    Matcher::HasParent(Box::new(f)).into()
}

/// Applies the predicate to the node's parent and yields its result.
pub fn parent(f: SearchFn) -> SearchFn {
    Matcher::Parent(Box::new(f)).into()
}

/// Matches a node any of whose ancestors satisfies the predicate;
/// yields the node itself.
pub fn has_ancestor(f: SearchFn) -> SearchFn {
    Matcher::HasAncestor(Box::new(f)).into()
}

/// Yields the nearest ancestor satisfying the predicate.
pub fn ancestor(f: SearchFn) -> SearchFn {
    Matcher::Ancestor(Box::new(f)).into()
}

/// Matches a node immediately (linearly) preceding a node that
/// satisfies the predicate, skipping ignored material.
pub fn i_precedes(f: SearchFn) -> SearchFn {
    Matcher::IPrecedes(Box::new(f)).into()
}

pub fn is_leaf() -> SearchFn {
    Matcher::IsLeaf.into()
}

/// Matches the top of the actual sentence: the child of the root
/// wrapper.
pub fn is_root() -> SearchFn {
    Matcher::IsRoot.into()
}

pub fn is_trace() -> SearchFn {
    Matcher::IsTrace.into()
}

/// Matches the reduced half of a gapping construction (a `=n` index).
pub fn is_gapped() -> SearchFn {
    Matcher::IsGapped.into()
}

pub fn is_indexed() -> SearchFn {
    Matcher::IsIndexed.into()
}

pub fn daughter_count(n: usize, cmp: Cmp) -> SearchFn {
    Matcher::DaughterCount(n, cmp).into()
}

/// Collects the nodes coindexed with this one that satisfy the
/// predicate.
pub fn co_indexed(f: SearchFn) -> SearchFn {
    Matcher::CoIndexed(Box::new(f)).into()
}

/// Matches a node coindexed with some node satisfying the predicate;
/// yields the node itself.
pub fn has_co_indexed(f: SearchFn) -> SearchFn {
    Matcher::HasCoIndexed(Box::new(f)).into()
}

/// Yields the node's antecedent (the unique coindexed non-trace node)
/// if it satisfies the predicate.
pub fn antecedent(f: SearchFn) -> SearchFn {
    Matcher::Antecedent(Box::new(f)).into()
}

/// Matches a node whose antecedent satisfies the predicate; yields the
/// node itself.
pub fn has_antecedent(f: SearchFn) -> SearchFn {
    Matcher::HasAntecedent(Box::new(f)).into()
}

/// Matches a node sharing its label with the nodes picked out by the
/// inner predicate: any of them, or, with `all`, every one of them
/// (vacuously true when none are picked out).
pub fn shares_label_with(with: SearchFn, all: bool) -> SearchFn {
    Matcher::SharesLabelWith { with: Box::new(with), all }.into()
}

/// Like [`shares_label_with`] with a custom comparator; no match when
/// the inner predicate picks out nothing.
pub fn shares_label_with_mod(with: SearchFn, all: bool, cmp: LabelCmp) -> SearchFn {
    Matcher::SharesLabelWithMod { with: Box::new(with), all, cmp }.into()
}

/// Applies the predicate to the node and every descendant, collecting
/// all matches.
pub fn deep(f: SearchFn) -> SearchFn {
    Matcher::Deep(Box::new(f)).into()
}

/// Evaluates `inner` with `ignore` as the active ignore predicate.
pub fn ignoring(ignore: SearchFn, inner: SearchFn) -> SearchFn {
    Matcher::Ignoring { ignore: Box::new(ignore), inner: Box::new(inner) }.into()
}

impl ops::BitAnd for SearchFn {
    type Output = SearchFn;

    fn bitand(self, rhs: SearchFn) -> SearchFn {
        Matcher::And(Box::new(self), Box::new(rhs)).into()
    }
}

impl ops::BitOr for SearchFn {
    type Output = SearchFn;

    fn bitor(self, rhs: SearchFn) -> SearchFn {
        Matcher::Or(Box::new(self), Box::new(rhs)).into()
    }
}

impl ops::Not for SearchFn {
    type Output = SearchFn;

    fn not(self) -> SearchFn {
        Matcher::Not(Box::new(self)).into()
    }
}

impl fmt::Display for SearchFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matcher {
            Matcher::Anything => write!(f, "anything()"),
            Matcher::HasLabel { label, exact: false } => write!(f, "has_label({label})"),
            Matcher::HasLabel { label, exact: true } => write!(f, "has_label({label}, exact)"),
            Matcher::HasText(t) => write!(f, "has_text({t})"),
            Matcher::HasWord(w) => write!(f, "has_word({w})"),
            Matcher::HasLemma(l) => write!(f, "has_lemma({l})"),
            Matcher::HasDashTag(t) => write!(f, "has_dash_tag('{t}')"),
            Matcher::HasDaughter(g) => write!(f, "has_daughter({g})"),
            Matcher::Daughters(g) => write!(f, "daughters({g})"),
            Matcher::FirstDaughter(g) => write!(f, "first_daughter({g})"),
            Matcher::HasSister(walk, g) => write!(f, "{}({g})", walk.has_name()),
            Matcher::Sisters(walk, g) => write!(f, "{}({g})", walk.collect_name()),
            Matcher::HasParent(g) => write!(f, "has_parent({g})"),
            Matcher::Parent(g) => write!(f, "parent({g})"),
            Matcher::HasAncestor(g) => write!(f, "has_ancestor({g})"),
            Matcher::Ancestor(g) => write!(f, "ancestor({g})"),
            Matcher::IPrecedes(g) => write!(f, "i_precedes({g})"),
            Matcher::IsLeaf => write!(f, "is_leaf()"),
            Matcher::IsRoot => write!(f, "is_root()"),
            Matcher::IsTrace => write!(f, "is_trace()"),
            Matcher::IsGapped => write!(f, "is_gapped()"),
            Matcher::IsIndexed => write!(f, "is_indexed()"),
            Matcher::DaughterCount(n, cmp) => write!(f, "daughter_count({n}, {cmp})"),
            Matcher::CoIndexed(g) => write!(f, "co_indexed({g})"),
            Matcher::HasCoIndexed(g) => write!(f, "has_co_indexed({g})"),
            Matcher::Antecedent(g) => write!(f, "antecedent({g})"),
            Matcher::HasAntecedent(g) => write!(f, "has_antecedent({g})"),
            Matcher::SharesLabelWith { with, all } => {
                write!(f, "shares_label_with({with}, all={all})")
            }
            Matcher::SharesLabelWithMod { with, all, cmp } => {
                write!(f, "shares_label_with_mod({with}, all={all}, {})", cmp.name)
            }
            Matcher::Deep(g) => write!(f, "deep({g})"),
            Matcher::Ignoring { ignore, inner } => write!(f, "ignoring({ignore}, {inner})"),
            Matcher::And(a, b) => write!(f, "{a} & {b}"),
            Matcher::Or(a, b) => write!(f, "{a} | {b}"),
            Matcher::Not(a) => write!(f, "!{a}"),
        }
    }
}

impl fmt::Debug for SearchFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SearchFn({self})")
    }
}
