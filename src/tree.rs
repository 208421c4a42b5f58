//! Arena-backed model for one parsed sentence.
//!
//! A [`Tree`] owns every node of a sentence in a single `Vec`; nodes
//! refer to each other by [`NodeId`]. Each node carries a label, a
//! metadata map, an optional parent, and a kind-specific payload:
//! leaves hold text, nonterminals hold ordered children, and the root
//! wrapper holds exactly one child plus an optional sentence ID.
//!
//! Mutations keep the parent/child links coherent: a node is a child of
//! its parent exactly when the parent's child list contains it.
//! Detached nodes may linger in the arena; reachability is always
//! judged from [`Tree::root`]. `Clone` is a deep copy, so handing a
//! tree to a transformer never aliases the caller's nodes.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use thiserror::Error;

use crate::util::{IndexType, LabelError, is_code_label, is_ec_token, label_and_index};
use crate::writer::{self, Format};

/// Identifies a node within its owning [`Tree`].
pub type NodeId = usize;

/// Per-node annotation map. Keys serialize in sorted order.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A metadata entry: either a text value or a nested map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetadataValue {
    Text(String),
    Map(Metadata),
}

impl MetadataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            MetadataValue::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&Metadata> {
        match self {
            MetadataValue::Text(_) => None,
            MetadataValue::Map(m) => Some(m),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> MetadataValue {
        MetadataValue::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> MetadataValue {
        MetadataValue::Text(s)
    }
}

/// Structural violations raised by tree construction and mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("nodes cannot have an empty label")]
    EmptyLabel,
    #[error("the root wrapper has no label to change")]
    RootRelabel,
    #[error("node is already attached to a parent")]
    AlreadyParented,
    #[error("a root wrapper cannot be inserted into another tree")]
    RootAsChild,
    #[error("a root wrapper holds exactly one child")]
    RootArity,
    #[error("leaves cannot hold children")]
    LeafChildren,
    #[error("child index {0} is out of bounds")]
    BadChildIndex(usize),
    #[error("this tree has no root wrapper")]
    NotRooted,
    #[error(transparent)]
    Label(#[from] LabelError),
}

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf { text: String },
    NonTerminal { children: Vec<NodeId> },
    Root { id: Option<String>, children: Vec<NodeId> },
}

#[derive(Debug, Clone)]
struct Node {
    label: String,
    metadata: Metadata,
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// One sentence: an arena of nodes plus the id of the topmost one.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

fn index_metadata(label: &str) -> Result<(String, Metadata), LabelError> {
    let (bare, ty, idx) = label_and_index(label)?;
    let mut md = Metadata::new();
    if let (Some(ty), Some(idx)) = (ty, idx) {
        md.insert("INDEX".to_string(), MetadataValue::Text(idx.to_string()));
        md.insert("IDX-TYPE".to_string(), MetadataValue::Text(ty.long().to_string()));
    }
    Ok((bare, md))
}

impl Tree {
    /// Builds a single leaf. A trailing index on the label moves into
    /// the metadata.
    pub fn leaf(label: &str, text: &str) -> Result<Tree, TreeError> {
        Tree::leaf_with(label, text, Metadata::new())
    }

    pub fn leaf_with(label: &str, text: &str, metadata: Metadata) -> Result<Tree, TreeError> {
        let (bare, mut md) = index_metadata(label)?;
        md.extend(metadata);
        Ok(Tree::leaf_parts(bare, text.to_string(), md))
    }

    pub(crate) fn leaf_parts(label: String, text: String, metadata: Metadata) -> Tree {
        Tree {
            nodes: vec![Node {
                label,
                metadata,
                parent: None,
                kind: NodeKind::Leaf { text },
            }],
            root: 0,
        }
    }

    /// Builds a nonterminal over the given children, consuming them.
    pub fn branch(label: &str, children: Vec<Tree>) -> Result<Tree, TreeError> {
        Tree::branch_with(label, children, Metadata::new())
    }

    pub fn branch_with(
        label: &str,
        children: Vec<Tree>,
        metadata: Metadata,
    ) -> Result<Tree, TreeError> {
        let (bare, mut md) = index_metadata(label)?;
        md.extend(metadata);
        Tree::branch_parts(bare, children, md)
    }

    pub(crate) fn branch_parts(
        label: String,
        children: Vec<Tree>,
        metadata: Metadata,
    ) -> Result<Tree, TreeError> {
        let mut tree = Tree {
            nodes: vec![Node {
                label,
                metadata,
                parent: None,
                kind: NodeKind::NonTerminal { children: Vec::new() },
            }],
            root: 0,
        };
        for child in children {
            if matches!(child.nodes[child.root].kind, NodeKind::Root { .. }) {
                return Err(TreeError::RootAsChild);
            }
            let cid = tree.absorb(child);
            tree.nodes[cid].parent = Some(tree.root);
            tree.child_list_mut(tree.root).push(cid);
        }
        Ok(tree)
    }

    /// Wraps a sentence in the root wrapper, which carries the optional
    /// sentence ID and sentence-level metadata.
    pub fn rooted(
        id: Option<String>,
        sentence: Tree,
        metadata: Metadata,
    ) -> Result<Tree, TreeError> {
        if matches!(sentence.nodes[sentence.root].kind, NodeKind::Root { .. }) {
            return Err(TreeError::RootAsChild);
        }
        let mut tree = Tree {
            nodes: vec![Node {
                label: String::new(),
                metadata,
                parent: None,
                kind: NodeKind::Root { id, children: Vec::new() },
            }],
            root: 0,
        };
        let cid = tree.absorb(sentence);
        tree.nodes[cid].parent = Some(tree.root);
        tree.child_list_mut(tree.root).push(cid);
        Ok(tree)
    }

    /// Moves another tree's nodes into this arena, detached. Returns
    /// the id of the grafted subtree's top node.
    pub(crate) fn absorb(&mut self, other: Tree) -> NodeId {
        let base = self.nodes.len();
        let top = other.root + base;
        for mut node in other.nodes {
            if let Some(p) = node.parent.as_mut() {
                *p += base;
            }
            match &mut node.kind {
                NodeKind::Leaf { .. } => {}
                NodeKind::NonTerminal { children } | NodeKind::Root { children, .. } => {
                    for c in children {
                        *c += base;
                    }
                }
            }
            self.nodes.push(node);
        }
        top
    }

    /// Allocates a detached leaf in this arena.
    pub(crate) fn alloc_leaf(&mut self, label: &str, text: &str) -> Result<NodeId, TreeError> {
        let (bare, md) = index_metadata(label)?;
        self.nodes.push(Node {
            label: bare,
            metadata: md,
            parent: None,
            kind: NodeKind::Leaf { text: text.to_string() },
        });
        Ok(self.nodes.len() - 1)
    }

    /// Allocates a detached, childless nonterminal in this arena.
    pub(crate) fn alloc_nonterminal(&mut self, label: &str) -> Result<NodeId, TreeError> {
        let (bare, md) = index_metadata(label)?;
        self.nodes.push(Node {
            label: bare,
            metadata: md,
            parent: None,
            kind: NodeKind::NonTerminal { children: Vec::new() },
        });
        Ok(self.nodes.len() - 1)
    }

    fn child_list_mut(&mut self, node: NodeId) -> &mut Vec<NodeId> {
        match &mut self.nodes[node].kind {
            NodeKind::NonTerminal { children } | NodeKind::Root { children, .. } => children,
            NodeKind::Leaf { .. } => unreachable!("leaves hold no child list"),
        }
    }

    /// The topmost node of the sentence.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn label(&self, node: NodeId) -> &str {
        &self.nodes[node].label
    }

    /// Relabels a node. The new label is trimmed; an empty result is an
    /// error, and the root wrapper's empty label cannot change.
    pub fn set_label(&mut self, node: NodeId, label: &str) -> Result<(), TreeError> {
        if matches!(self.nodes[node].kind, NodeKind::Root { .. }) {
            return Err(TreeError::RootRelabel);
        }
        let label = label.trim();
        if label.is_empty() {
            return Err(TreeError::EmptyLabel);
        }
        self.nodes[node].label = label.to_string();
        Ok(())
    }

    pub fn metadata(&self, node: NodeId) -> &Metadata {
        &self.nodes[node].metadata
    }

    pub fn metadata_mut(&mut self, node: NodeId) -> &mut Metadata {
        &mut self.nodes[node].metadata
    }

    /// A leaf's text, or `None` for nonterminals and the root wrapper.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node].kind {
            NodeKind::Leaf { text } => Some(text),
            _ => None,
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        match &self.nodes[node].kind {
            NodeKind::Leaf { .. } => &[],
            NodeKind::NonTerminal { children } | NodeKind::Root { children, .. } => children,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    /// The node's position within its parent's child list.
    pub fn parent_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    pub fn left_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let at = self.parent_index(node)?;
        if at > 0 { Some(self.children(parent)[at - 1]) } else { None }
    }

    pub fn right_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let at = self.parent_index(node)?;
        self.children(parent).get(at + 1).copied()
    }

    pub fn is_leaf(&self, node: NodeId) -> bool {
        matches!(self.nodes[node].kind, NodeKind::Leaf { .. })
    }

    pub fn is_root_node(&self, node: NodeId) -> bool {
        matches!(self.nodes[node].kind, NodeKind::Root { .. })
    }

    /// The sentence ID, if the tree has a root wrapper carrying one.
    pub fn id(&self) -> Option<&str> {
        match &self.nodes[self.root].kind {
            NodeKind::Root { id, .. } => id.as_deref(),
            _ => None,
        }
    }

    pub fn set_id(&mut self, new_id: Option<String>) -> Result<(), TreeError> {
        match &mut self.nodes[self.root].kind {
            NodeKind::Root { id, .. } => {
                *id = new_id;
                Ok(())
            }
            _ => Err(TreeError::NotRooted),
        }
    }

    /// Attaches a detached node under `parent` at `index`.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), TreeError> {
        if self.nodes[child].parent.is_some() {
            return Err(TreeError::AlreadyParented);
        }
        match &self.nodes[child].kind {
            NodeKind::Root { .. } => return Err(TreeError::RootAsChild),
            _ => {}
        }
        match &self.nodes[parent].kind {
            NodeKind::Leaf { .. } => return Err(TreeError::LeafChildren),
            NodeKind::Root { .. } => return Err(TreeError::RootArity),
            NodeKind::NonTerminal { children } => {
                if index > children.len() {
                    return Err(TreeError::BadChildIndex(index));
                }
            }
        }
        self.child_list_mut(parent).insert(index, child);
        self.nodes[child].parent = Some(parent);
        Ok(())
    }

    /// Detaches and returns the child of `parent` at `index`.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Result<NodeId, TreeError> {
        match &self.nodes[parent].kind {
            NodeKind::Leaf { .. } => return Err(TreeError::LeafChildren),
            NodeKind::Root { .. } => return Err(TreeError::RootArity),
            NodeKind::NonTerminal { children } => {
                if index >= children.len() {
                    return Err(TreeError::BadChildIndex(index));
                }
            }
        }
        let child = self.child_list_mut(parent).remove(index);
        self.nodes[child].parent = None;
        Ok(child)
    }

    /// Swaps the child of `parent` at `index` for a detached node,
    /// returning the old child detached. This is the one child mutation
    /// the root wrapper permits (at index 0).
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<NodeId, TreeError> {
        if self.nodes[child].parent.is_some() {
            return Err(TreeError::AlreadyParented);
        }
        if matches!(self.nodes[child].kind, NodeKind::Root { .. }) {
            return Err(TreeError::RootAsChild);
        }
        match &self.nodes[parent].kind {
            NodeKind::Leaf { .. } => return Err(TreeError::LeafChildren),
            NodeKind::Root { children, .. } | NodeKind::NonTerminal { children } => {
                if index >= children.len() {
                    return Err(TreeError::BadChildIndex(index));
                }
            }
        }
        let old = self.child_list_mut(parent)[index];
        self.child_list_mut(parent)[index] = child;
        self.nodes[old].parent = None;
        self.nodes[child].parent = Some(parent);
        Ok(old)
    }

    /// The node's movement index, read from `INDEX`/`IDX-TYPE` metadata.
    pub fn index(&self, node: NodeId) -> Option<(u32, IndexType)> {
        let md = self.metadata(node);
        let idx: u32 = md.get("INDEX")?.as_text()?.parse().ok()?;
        let ty = md
            .get("IDX-TYPE")
            .and_then(|v| v.as_text())
            .and_then(IndexType::from_long)
            .unwrap_or(IndexType::Regular);
        Some((idx, ty))
    }

    pub fn set_index(&mut self, node: NodeId, index: u32, ty: IndexType) {
        let md = self.metadata_mut(node);
        md.insert("INDEX".to_string(), MetadataValue::Text(index.to_string()));
        md.insert("IDX-TYPE".to_string(), MetadataValue::Text(ty.long().to_string()));
    }

    pub fn remove_index(&mut self, node: NodeId) -> Option<(u32, IndexType)> {
        let old = self.index(node);
        let md = self.metadata_mut(node);
        md.remove("INDEX");
        md.remove("IDX-TYPE");
        old
    }

    /// The largest movement index anywhere in the sentence.
    pub fn largest_index(&self) -> Option<u32> {
        self.subtrees(self.root)
            .filter_map(|n| self.index(n))
            .map(|(idx, _)| idx)
            .max()
    }

    /// Preorder traversal of the subtree at `node`, including `node`.
    pub fn subtrees(&self, node: NodeId) -> Subtrees<'_> {
        Subtrees { tree: self, stack: vec![node] }
    }

    /// The leaves of the subtree at `node`, left to right.
    pub fn leaves(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.subtrees(node).filter(|&n| self.is_leaf(n))
    }

    /// The sentence's words: leaf texts, skipping empty categories and
    /// code leaves.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.leaves(self.root).filter_map(|n| {
            let text = self.text(n)?;
            if is_ec_token(text) || is_code_label(self.label(n)) {
                None
            } else {
                Some(text)
            }
        })
    }

    /// The sentence's surface text, space-joined with punctuation
    /// attached to the preceding word.
    pub fn urtext(&self) -> String {
        let mut out = String::new();
        for n in self.leaves(self.root) {
            let Some(text) = self.text(n) else { continue };
            if is_ec_token(text) || is_code_label(self.label(n)) {
                continue;
            }
            if !out.is_empty() && !matches!(self.label(n), "," | ".") {
                out.push(' ');
            }
            out.push_str(text);
        }
        out
    }

    /// Deep-copies the subtree at `node` into a fresh tree.
    pub fn clone_subtree(&self, node: NodeId) -> Tree {
        let mut nodes = Vec::new();
        let root = self.copy_into(node, &mut nodes);
        Tree { nodes, root }
    }

    fn copy_into(&self, node: NodeId, nodes: &mut Vec<Node>) -> NodeId {
        let copied = match &self.nodes[node].kind {
            NodeKind::Leaf { text } => NodeKind::Leaf { text: text.clone() },
            NodeKind::NonTerminal { children } => NodeKind::NonTerminal {
                children: children.iter().map(|&c| self.copy_into(c, nodes)).collect(),
            },
            NodeKind::Root { id, children } => NodeKind::Root {
                id: id.clone(),
                children: children.iter().map(|&c| self.copy_into(c, nodes)).collect(),
            },
        };
        nodes.push(Node {
            label: self.nodes[node].label.clone(),
            metadata: self.nodes[node].metadata.clone(),
            parent: None,
            kind: copied,
        });
        let at = nodes.len() - 1;
        for i in 0..nodes[at].kind_children_len() {
            let c = match &nodes[at].kind {
                NodeKind::NonTerminal { children } | NodeKind::Root { children, .. } => children[i],
                NodeKind::Leaf { .. } => unreachable!(),
            };
            nodes[c].parent = Some(at);
        }
        at
    }

    /// Structural comparison of a node in this tree against the top of
    /// another tree. Arena ids never participate.
    pub fn subtree_eq(&self, node: NodeId, other: &Tree) -> bool {
        self.node_eq(node, other, other.root)
    }

    fn node_eq(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
        let (na, nb) = (&self.nodes[a], &other.nodes[b]);
        if na.label != nb.label || na.metadata != nb.metadata {
            return false;
        }
        match (&na.kind, &nb.kind) {
            (NodeKind::Leaf { text: ta }, NodeKind::Leaf { text: tb }) => ta == tb,
            (NodeKind::NonTerminal { .. }, NodeKind::NonTerminal { .. }) => {
                self.children_eq(a, other, b)
            }
            (NodeKind::Root { id: ia, .. }, NodeKind::Root { id: ib, .. }) => {
                ia == ib && self.children_eq(a, other, b)
            }
            _ => false,
        }
    }

    fn children_eq(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
        let (ca, cb) = (self.children(a), other.children(b));
        ca.len() == cb.len()
            && ca.iter().zip(cb).all(|(&x, &y)| self.node_eq(x, other, y))
    }

    fn hash_node<H: Hasher>(&self, node: NodeId, state: &mut H) {
        let n = &self.nodes[node];
        n.label.hash(state);
        n.metadata.hash(state);
        match &n.kind {
            NodeKind::Leaf { text } => {
                0u8.hash(state);
                text.hash(state);
            }
            NodeKind::NonTerminal { children } => {
                1u8.hash(state);
                children.len().hash(state);
            }
            NodeKind::Root { id, children } => {
                2u8.hash(state);
                id.hash(state);
                children.len().hash(state);
            }
        }
        for &c in self.children(node) {
            self.hash_node(c, state);
        }
    }
}

impl Node {
    fn kind_children_len(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf { .. } => 0,
            NodeKind::NonTerminal { children } | NodeKind::Root { children, .. } => children.len(),
        }
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Tree) -> bool {
        self.node_eq(self.root, other, other.root)
    }
}

impl Eq for Tree {}

impl Hash for Tree {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_node(self.root, state);
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // old-style rendering never hits a write error
        let s = writer::write(self, Format::OldStyle).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

/// Explicit-stack preorder iterator over a subtree.
pub struct Subtrees<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Subtrees<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        for &c in self.tree.children(node).iter().rev() {
            self.stack.push(c);
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(t: &Tree) -> u64 {
        let mut h = DefaultHasher::new();
        t.hash(&mut h);
        h.finish()
    }

    fn two_leaf_branch() -> Tree {
        Tree::branch(
            "foo",
            vec![
                Tree::leaf("bar", "BAR").unwrap(),
                Tree::leaf("baz", "BAZ").unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn set_label_validates() {
        let mut t = Tree::leaf("foo", "bar").unwrap();
        let n = t.root();
        assert_eq!(t.label(n), "foo");
        t.set_label(n, " baz ").unwrap();
        assert_eq!(t.label(n), "baz");
        assert_eq!(t.set_label(n, "  "), Err(TreeError::EmptyLabel));
    }

    #[test]
    fn parent_index_and_siblings() {
        let t = two_leaf_branch();
        let top = t.root();
        let kids = t.children(top).to_vec();
        for (i, &k) in kids.iter().enumerate() {
            assert_eq!(t.parent_index(k), Some(i));
        }
        assert_eq!(t.parent_index(top), None);
        assert_eq!(t.right_sibling(kids[0]), Some(kids[1]));
        assert_eq!(t.left_sibling(kids[1]), Some(kids[0]));
        assert_eq!(t.left_sibling(kids[0]), None);
        assert_eq!(t.right_sibling(kids[1]), None);
    }

    #[test]
    fn label_index_moves_to_metadata() {
        let t = Tree::branch("NP-2", vec![Tree::leaf("N", "dog").unwrap()]).unwrap();
        assert_eq!(t.label(t.root()), "NP");
        assert_eq!(t.index(t.root()), Some((2, IndexType::Regular)));
        let mut t = t;
        assert_eq!(t.remove_index(t.root()), Some((2, IndexType::Regular)));
        assert_eq!(t.index(t.root()), None);
    }

    #[test]
    fn largest_index_scans_whole_sentence() {
        let t = parse("( (IP (NP-1 (N dog)) (NP=4 (N cat))))", Format::OldStyle).unwrap();
        assert_eq!(t.largest_index(), Some(4));
        let t = parse("(IP (N dog))", Format::OldStyle).unwrap();
        assert_eq!(t.largest_index(), None);
    }

    #[test]
    fn root_constraints() {
        let sentence = Tree::leaf("foo", "bar").unwrap();
        let mut r = Tree::rooted(None, sentence, Metadata::new()).unwrap();
        let root = r.root();
        assert!(r.is_root_node(root));
        assert_eq!(r.parent(root), None);

        let child = r.children(root)[0];
        assert_eq!(r.remove_child(root, 0), Err(TreeError::RootArity));
        let fresh = r.alloc_leaf("baz", "quux").unwrap();
        assert_eq!(r.insert_child(root, 1, fresh), Err(TreeError::RootArity));
        let old = r.replace_child(root, 0, fresh).unwrap();
        assert_eq!(old, child);
        assert_eq!(r.parent(fresh), Some(root));
        assert_eq!(r.parent(old), None);

        let expect = Tree::rooted(None, Tree::leaf("baz", "quux").unwrap(), Metadata::new());
        assert_eq!(r, expect.unwrap());
    }

    #[test]
    fn root_cannot_be_nested() {
        let inner = Tree::rooted(None, Tree::leaf("a", "b").unwrap(), Metadata::new()).unwrap();
        assert_eq!(
            Tree::branch("foo", vec![inner.clone()]),
            Err(TreeError::RootAsChild)
        );
        assert_eq!(
            Tree::rooted(None, inner, Metadata::new()),
            Err(TreeError::RootAsChild)
        );
    }

    #[test]
    fn insert_rejects_attached_nodes() {
        let mut t = two_leaf_branch();
        let top = t.root();
        let kid = t.children(top)[0];
        assert_eq!(t.insert_child(top, 0, kid), Err(TreeError::AlreadyParented));
    }

    #[test]
    fn structural_equality_ignores_arena_layout() {
        let a = parse("( (IP (NP (PRO it)) (VBP works)))", Format::OldStyle).unwrap();
        let b = Tree::rooted(
            None,
            Tree::branch(
                "IP",
                vec![
                    Tree::branch("NP", vec![Tree::leaf("PRO", "it").unwrap()]).unwrap(),
                    Tree::leaf("VBP", "works").unwrap(),
                ],
            )
            .unwrap(),
            Metadata::new(),
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let c = parse("( (IP (NP (PRO it)) (VBP fails)))", Format::OldStyle).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn clone_is_isolated() {
        let a = parse("( (IP (NP (PRO it)) (VBP works)))", Format::OldStyle).unwrap();
        let mut b = a.clone();
        let leaf = b.leaves(b.root()).next().unwrap();
        b.set_label(leaf, "CHANGED").unwrap();
        assert_ne!(a, b);
        assert_eq!(a, parse("( (IP (NP (PRO it)) (VBP works)))", Format::OldStyle).unwrap());
    }

    #[test]
    fn clone_subtree_extracts() {
        let t = parse("( (IP (NP (PRO it)) (VBP works)))", Format::OldStyle).unwrap();
        let ip = t.children(t.root())[0];
        let np = t.children(ip)[0];
        let sub = t.clone_subtree(np);
        assert_eq!(sub, parse("(NP (PRO it))", Format::OldStyle).unwrap());
        assert_eq!(sub.parent(sub.root()), None);
    }

    #[test]
    fn preorder_traversal() {
        let t = parse("( (IP (NP (D the) (N dog)) (VBP barks)))", Format::OldStyle).unwrap();
        let labels: Vec<&str> = t
            .subtrees(t.root())
            .map(|n| if t.is_leaf(n) { t.text(n).unwrap() } else { t.label(n) })
            .collect();
        assert_eq!(labels, ["", "IP", "NP", "the", "dog", "barks"]);
    }

    #[test]
    fn words_and_urtext() {
        let t = parse(
            "( (IP (NP-SBJ (NPR John)) (V eats) (NP-OB1 *T*-1) (. .)))",
            Format::OldStyle,
        )
        .unwrap();
        let words: Vec<&str> = t.words().collect();
        assert_eq!(words, ["John", "eats", "."]);
        assert_eq!(t.urtext(), "John eats.");
    }
}
