//! Bulk structural edits driven by search predicates.
//!
//! A [`TreeTransformer`] works on a deep copy of the tree it is given,
//! so the caller's tree is never mutated. A pipeline selects nodes
//! with [`find_nodes`](TreeTransformer::find_nodes) (or narrows an
//! existing selection with
//! [`filter_matches`](TreeTransformer::filter_matches)) and then
//! applies an edit to every selected node. Edits return `&mut Self`
//! for chaining and surface structural violations as
//! [`TransformError`]s.

use std::fmt;

use thiserror::Error;

use crate::search::SearchFn;
use crate::tree::{NodeId, Tree, TreeError};
use crate::util::IndexType;

/// Errors raised by transformer edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// The selection includes the root wrapper, which this edit cannot
    /// apply to.
    #[error("edit cannot apply to the root wrapper")]
    RootMatch,
    /// The root wrapper's single child cannot take a sister.
    #[error("cannot add a sister at the top of the sentence")]
    SisterOfRoot,
}

/// An editing session over one sentence.
#[derive(Debug)]
pub struct TreeTransformer {
    tree: Tree,
    matches: Vec<NodeId>,
    match_data: Vec<String>,
    max_index: u32,
}

impl TreeTransformer {
    /// Starts a session on a copy of `tree`.
    pub fn new(tree: &Tree) -> TreeTransformer {
        let tree = tree.clone();
        let max_index = tree.largest_index().unwrap_or(0);
        TreeTransformer { tree, matches: Vec::new(), match_data: Vec::new(), max_index }
    }

    /// Selects every node in the sentence (root wrapper included) for
    /// which the predicate yields something; the yielded nodes, not
    /// the tested ones, become the selection.
    pub fn find_nodes(&mut self, f: &SearchFn) -> &mut Self {
        self.matches = self
            .tree
            .subtrees(self.tree.root())
            .flat_map(|n| f.matches(&self.tree, n).nodes())
            .collect();
        self.match_data.clear();
        self
    }

    /// Like [`find_nodes`](TreeTransformer::find_nodes), but tests
    /// only the root wrapper's children.
    pub fn find_nodes_shallow(&mut self, f: &SearchFn) -> &mut Self {
        self.matches = self
            .tree
            .children(self.tree.root())
            .iter()
            .flat_map(|&n| f.matches(&self.tree, n).nodes())
            .collect();
        self.match_data.clear();
        self
    }

    /// Replaces each match by the nodes the predicate yields for it,
    /// dropping matches where it yields nothing. Stored match data is
    /// replicated across a match's replacements.
    pub fn filter_matches(&mut self, f: &SearchFn) -> &mut Self {
        let mut matches = Vec::new();
        let mut data = Vec::new();
        for (i, &m) in self.matches.iter().enumerate() {
            let res = f.matches(&self.tree, m).nodes();
            if let Some(d) = self.match_data.get(i) {
                data.extend(std::iter::repeat_n(d.clone(), res.len()));
            }
            matches.extend(res);
        }
        self.matches = matches;
        self.match_data = data;
        self
    }

    /// Computes and stores a datum per match, for retrieval after
    /// later pipeline stages reshape the selection.
    pub fn store_match_data(&mut self, f: impl Fn(&Tree, NodeId) -> String) -> &mut Self {
        self.match_data = self.matches.iter().map(|&m| f(&self.tree, m)).collect();
        self
    }

    /// Maps a function over the current matches without changing them.
    pub fn query_matches<T>(&self, f: impl Fn(&Tree, NodeId) -> T) -> Vec<T> {
        self.matches.iter().map(|&m| f(&self.tree, m)).collect()
    }

    pub fn matches(&self) -> &[NodeId] {
        &self.matches
    }

    pub fn match_data(&self) -> &[String] {
        &self.match_data
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    /// Interposes a new node labelled `name` between each match and
    /// its parent. With `move_index`, the match's movement index
    /// migrates to the new node.
    pub fn add_parent_node(
        &mut self,
        name: &str,
        move_index: bool,
    ) -> Result<&mut Self, TransformError> {
        for i in 0..self.matches.len() {
            let m = self.matches[i];
            let (parent, at) = self.position_of(m)?;
            let fresh = self.tree.alloc_nonterminal(name)?;
            let old = self.tree.replace_child(parent, at, fresh)?;
            self.tree.insert_child(fresh, 0, old)?;
            if move_index && let Some((idx, ty)) = self.tree.remove_index(old) {
                self.tree.set_index(fresh, idx, ty);
            }
        }
        Ok(self)
    }

    /// Wraps each match and a run of its siblings in a new node
    /// labelled `name`. Siblings accumulate to the right (or, with
    /// `right` false, the left) until one satisfies `stop`; only then
    /// is the span committed. With `immediate`, a first sibling that
    /// fails `stop` abandons the match. A match whose run never hits
    /// `stop` is left untouched.
    pub fn add_parent_node_spanning(
        &mut self,
        name: &str,
        stop: &SearchFn,
        immediate: bool,
        right: bool,
    ) -> Result<&mut Self, TransformError> {
        for i in 0..self.matches.len() {
            let m = self.matches[i];
            let mut acc = vec![m];
            let mut p = m;
            loop {
                let next = if right {
                    self.tree.right_sibling(p)
                } else {
                    self.tree.left_sibling(p)
                };
                let Some(s) = next else { break };
                p = s;
                acc.push(s);
                if stop.is_match(&self.tree, s) {
                    self.commit_span(name, m, acc, right)?;
                    break;
                }
                if immediate {
                    break;
                }
            }
        }
        Ok(self)
    }

    fn commit_span(
        &mut self,
        name: &str,
        m: NodeId,
        mut acc: Vec<NodeId>,
        right: bool,
    ) -> Result<(), TransformError> {
        let (parent, at) = self.position_of(m)?;
        let start = if right { at } else { at - (acc.len() - 1) };
        for offset in (0..acc.len()).rev() {
            self.tree.remove_child(parent, start + offset)?;
        }
        if !right {
            acc.reverse();
        }
        let fresh = self.tree.alloc_nonterminal(name)?;
        for (i, &n) in acc.iter().enumerate() {
            self.tree.insert_child(fresh, i, n)?;
        }
        self.tree.insert_child(parent, start, fresh)?;
        Ok(())
    }

    /// Moves siblings of each match into the match itself: siblings
    /// accumulate to the right (or left) until one satisfies `stop`,
    /// and the whole run then becomes the match's trailing (or
    /// leading) children, in surface order. As with
    /// [`add_parent_node_spanning`](TreeTransformer::add_parent_node_spanning),
    /// nothing moves unless `stop` fires.
    pub fn extend_until(
        &mut self,
        stop: &SearchFn,
        immediate: bool,
        right: bool,
    ) -> Result<&mut Self, TransformError> {
        for i in 0..self.matches.len() {
            let m = self.matches[i];
            let mut acc = Vec::new();
            let mut p = m;
            loop {
                let next = if right {
                    self.tree.right_sibling(p)
                } else {
                    self.tree.left_sibling(p)
                };
                let Some(s) = next else { break };
                p = s;
                acc.push(s);
                if stop.is_match(&self.tree, s) {
                    self.absorb_run(m, acc, right)?;
                    break;
                }
                if immediate {
                    break;
                }
            }
        }
        Ok(self)
    }

    fn absorb_run(
        &mut self,
        m: NodeId,
        acc: Vec<NodeId>,
        right: bool,
    ) -> Result<(), TransformError> {
        let (parent, at) = self.position_of(m)?;
        for (t, &n) in acc.iter().enumerate() {
            if right {
                // removal pulls the next sibling into position at + 1
                self.tree.remove_child(parent, at + 1)?;
                let end = self.tree.children(m).len();
                self.tree.insert_child(m, end, n)?;
            } else {
                self.tree.remove_child(parent, at - 1 - t)?;
                self.tree.insert_child(m, 0, n)?;
            }
        }
        Ok(())
    }

    /// Relabels every match.
    pub fn change_label(&mut self, label: &str) -> Result<&mut Self, TransformError> {
        for i in 0..self.matches.len() {
            self.tree.set_label(self.matches[i], label)?;
        }
        Ok(self)
    }

    /// Relabels every match by a function of its current label.
    pub fn change_label_with(
        &mut self,
        f: impl Fn(&str) -> String,
    ) -> Result<&mut Self, TransformError> {
        for i in 0..self.matches.len() {
            let new = f(self.tree.label(self.matches[i]));
            self.tree.set_label(self.matches[i], &new)?;
        }
        Ok(self)
    }

    /// Inserts a fresh leaf `(label word)` beside every match, before
    /// it or after it. With `coindex`, the match and its new sister
    /// receive a fresh shared index, distinct per match.
    pub fn add_sister(
        &mut self,
        label: &str,
        word: &str,
        before: bool,
        coindex: bool,
    ) -> Result<&mut Self, TransformError> {
        for i in 0..self.matches.len() {
            let m = self.matches[i];
            let fresh = self.tree.alloc_leaf(label, word)?;
            self.attach_sister(m, fresh, before, coindex)?;
        }
        Ok(self)
    }

    /// Like [`add_sister`](TreeTransformer::add_sister), but inserts a
    /// copy of an arbitrary tree beside each match.
    pub fn add_sister_tree(
        &mut self,
        sister: &Tree,
        before: bool,
        coindex: bool,
    ) -> Result<&mut Self, TransformError> {
        for i in 0..self.matches.len() {
            let m = self.matches[i];
            if sister.is_root_node(sister.root()) {
                return Err(TransformError::Tree(TreeError::RootAsChild));
            }
            let fresh = self.tree.absorb(sister.clone());
            self.attach_sister(m, fresh, before, coindex)?;
        }
        Ok(self)
    }

    fn attach_sister(
        &mut self,
        m: NodeId,
        fresh: NodeId,
        before: bool,
        coindex: bool,
    ) -> Result<(), TransformError> {
        let (parent, at) = self.position_of(m)?;
        if self.tree.is_root_node(parent) {
            return Err(TransformError::SisterOfRoot);
        }
        if coindex {
            let idx = self.max_index + 1;
            self.tree.set_index(m, idx, IndexType::Regular);
            self.tree.set_index(fresh, idx, IndexType::Regular);
            self.max_index = idx;
        }
        let at = if before { at } else { at + 1 };
        self.tree.insert_child(parent, at, fresh)?;
        Ok(())
    }

    /// Prepends a fresh leaf `(label word)` to every match's children.
    pub fn add_daughter(&mut self, label: &str, word: &str) -> Result<&mut Self, TransformError> {
        for i in 0..self.matches.len() {
            let fresh = self.tree.alloc_leaf(label, word)?;
            self.tree.insert_child(self.matches[i], 0, fresh)?;
        }
        Ok(self)
    }

    /// Prepends a copy of an arbitrary tree to every match's children.
    pub fn add_daughter_tree(&mut self, daughter: &Tree) -> Result<&mut Self, TransformError> {
        for i in 0..self.matches.len() {
            if daughter.is_root_node(daughter.root()) {
                return Err(TransformError::Tree(TreeError::RootAsChild));
            }
            let fresh = self.tree.absorb(daughter.clone());
            self.tree.insert_child(self.matches[i], 0, fresh)?;
        }
        Ok(self)
    }

    /// Deletes every match, splicing its children into its place in
    /// the parent. The selection is spent afterwards. The root
    /// wrapper's child can only be pruned when it has exactly one
    /// child of its own.
    pub fn prune(&mut self) -> Result<&mut Self, TransformError> {
        for i in 0..self.matches.len() {
            let m = self.matches[i];
            let (parent, at) = self.position_of(m)?;
            if self.tree.is_root_node(parent) {
                if self.tree.children(m).len() != 1 {
                    return Err(TransformError::Tree(TreeError::RootArity));
                }
                let child = self.tree.remove_child(m, 0)?;
                self.tree.replace_child(parent, at, child)?;
            } else {
                let mut spliced = Vec::new();
                while !self.tree.children(m).is_empty() {
                    spliced.push(self.tree.remove_child(m, 0)?);
                }
                self.tree.remove_child(parent, at)?;
                for (offset, n) in spliced.into_iter().enumerate() {
                    self.tree.insert_child(parent, at + offset, n)?;
                }
            }
        }
        self.matches.clear();
        self.match_data.clear();
        Ok(self)
    }

    fn position_of(&self, m: NodeId) -> Result<(NodeId, usize), TransformError> {
        let parent = self.tree.parent(m).ok_or(TransformError::RootMatch)?;
        let at = self
            .tree
            .parent_index(m)
            .ok_or(TransformError::RootMatch)?;
        Ok((parent, at))
    }
}

impl fmt::Display for TreeTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::search::{
        anything, daughter_count, daughters, has_label, has_label_exact, is_leaf,
    };
    use crate::writer::Format;

    fn tree(src: &str) -> Tree {
        parse(src, Format::OldStyle).unwrap()
    }

    #[test]
    fn add_parent_node_wraps_match() {
        let t = tree("( (IP (NP-SBJ (NPR John)) (V eats)))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&has_label("V")).add_parent_node("VP", false).unwrap();
        assert_eq!(
            *tt.tree(),
            tree("( (IP (NP-SBJ (NPR John)) (VP (V eats))))")
        );
        // the source tree is untouched
        assert_eq!(t, tree("( (IP (NP-SBJ (NPR John)) (V eats)))"));
    }

    #[test]
    fn add_parent_node_can_move_index() {
        let t = tree("( (IP (NP-1 (N dog)) (V barks)))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&has_label("NP")).add_parent_node("XP", true).unwrap();
        assert_eq!(*tt.tree(), tree("( (IP (XP-1 (NP (N dog))) (V barks)))"));
    }

    #[test]
    fn add_parent_node_rejects_root_wrapper() {
        let t = tree("( (IP (FOO bar)))");
        let mut tt = TreeTransformer::new(&t);
        let err = tt
            .find_nodes(&has_label_exact(""))
            .add_parent_node("XP", false)
            .unwrap_err();
        assert_eq!(err, TransformError::RootMatch);
    }

    #[test]
    fn spanning_parent_collects_the_run() {
        let t = tree("( (IP (D the) (ADJ tasty) (N apple) (V rots)))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&has_label("D"))
            .add_parent_node_spanning("NP", &has_label("N"), false, true)
            .unwrap();
        assert_eq!(
            *tt.tree(),
            tree("( (IP (NP (D the) (ADJ tasty) (N apple)) (V rots)))")
        );
    }

    #[test]
    fn spanning_parent_leftward() {
        let t = tree("( (IP (D the) (ADJ tasty) (N apple) (V rots)))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&has_label("N"))
            .add_parent_node_spanning("NP", &has_label("D"), false, false)
            .unwrap();
        assert_eq!(
            *tt.tree(),
            tree("( (IP (NP (D the) (ADJ tasty) (N apple)) (V rots)))")
        );
    }

    #[test]
    fn spanning_parent_without_stop_is_a_no_op() {
        let src = "( (IP (D the) (ADJ tasty) (N apple)))";
        let mut tt = TreeTransformer::new(&tree(src));
        tt.find_nodes(&has_label("D"))
            .add_parent_node_spanning("NP", &has_label("V"), false, true)
            .unwrap();
        assert_eq!(*tt.tree(), tree(src));
    }

    #[test]
    fn spanning_parent_immediate_requires_adjacency() {
        let src = "( (IP (D the) (ADJ tasty) (N apple)))";
        let mut tt = TreeTransformer::new(&tree(src));
        tt.find_nodes(&has_label("D"))
            .add_parent_node_spanning("NP", &has_label("N"), true, true)
            .unwrap();
        assert_eq!(*tt.tree(), tree(src));

        let mut tt = TreeTransformer::new(&tree(src));
        tt.find_nodes(&has_label("ADJ"))
            .add_parent_node_spanning("NP", &has_label("N"), true, true)
            .unwrap();
        assert_eq!(*tt.tree(), tree("( (IP (D the) (NP (ADJ tasty) (N apple))))"));
    }

    #[test]
    fn extend_until_pulls_siblings_in() {
        let t = tree("( (IP (QP (Q more)) (, ,) (ADV slowly) (V runs)))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&has_label("QP"))
            .extend_until(&has_label("ADV"), false, true)
            .unwrap();
        assert_eq!(
            *tt.tree(),
            tree("( (IP (QP (Q more) (, ,) (ADV slowly)) (V runs)))")
        );
    }

    #[test]
    fn extend_until_leftward_keeps_surface_order() {
        let t = tree("( (IP (ADV very) (, ,) (QP (Q more)) (V runs)))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&has_label("QP"))
            .extend_until(&has_label("ADV"), false, false)
            .unwrap();
        assert_eq!(
            *tt.tree(),
            tree("( (IP (QP (ADV very) (, ,) (Q more)) (V runs)))")
        );
    }

    #[test]
    fn change_label_variants() {
        let t = tree("( (IP (NP (N dog)) (NP (N cat))))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&has_label("NP")).change_label("DP").unwrap();
        assert_eq!(*tt.tree(), tree("( (IP (DP (N dog)) (DP (N cat))))"));

        tt.find_nodes(&has_label("DP"))
            .change_label_with(|l| format!("{l}-X"))
            .unwrap();
        assert_eq!(*tt.tree(), tree("( (IP (DP-X (N dog)) (DP-X (N cat))))"));

        let err = tt.find_nodes(&has_label("N")).change_label("  ").unwrap_err();
        assert_eq!(err, TransformError::Tree(TreeError::EmptyLabel));
    }

    #[test]
    fn add_sister_before_and_after() {
        let t = tree("( (IP (NP (N dog))))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&has_label("NP")).add_sister("V", "barks", false, false).unwrap();
        assert_eq!(*tt.tree(), tree("( (IP (NP (N dog)) (V barks)))"));

        tt.find_nodes(&has_label("V")).add_sister("ADV", "loudly", true, false).unwrap();
        assert_eq!(*tt.tree(), tree("( (IP (NP (N dog)) (ADV loudly) (V barks)))"));
    }

    #[test]
    fn add_sister_coindexes_each_match_freshly() {
        let t = tree("( (IP (NP-1 (N dog)) (VP (V sees)) (VP (V runs))))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&has_label("VP"))
            .add_sister("NP", "*", true, true)
            .unwrap();
        assert_eq!(
            *tt.tree(),
            tree("( (IP (NP-1 (N dog)) (NP *-2) (VP-2 (V sees)) (NP *-3) (VP-3 (V runs))))")
        );
    }

    #[test]
    fn add_sister_rejects_top_of_sentence() {
        let t = tree("( (IP (FOO bar)))");
        let mut tt = TreeTransformer::new(&t);
        let err = tt
            .find_nodes(&has_label("IP"))
            .add_sister("X", "x", true, false)
            .unwrap_err();
        assert_eq!(err, TransformError::SisterOfRoot);
    }

    #[test]
    fn add_sister_tree_copies_per_match() {
        let t = tree("( (IP (V sees) (V runs)))");
        let sister = tree("(NP (N dog))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&has_label("V")).add_sister_tree(&sister, false, false).unwrap();
        assert_eq!(
            *tt.tree(),
            tree("( (IP (V sees) (NP (N dog)) (V runs) (NP (N dog))))")
        );
    }

    #[test]
    fn add_daughter_prepends() {
        let t = tree("( (IP (NP (N dog))))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&has_label("NP")).add_daughter("D", "the").unwrap();
        assert_eq!(*tt.tree(), tree("( (IP (NP (D the) (N dog))))"));

        let daughter = tree("(DP (D a))");
        tt.find_nodes(&has_label("NP")).add_daughter_tree(&daughter).unwrap();
        assert_eq!(*tt.tree(), tree("( (IP (NP (DP (D a)) (D the) (N dog))))"));
    }

    #[test]
    fn prune_splices_children_up() {
        let t = tree("( (IP (A a) (XP (B b) (C c)) (D d)))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&has_label("XP")).prune().unwrap();
        assert_eq!(*tt.tree(), tree("( (IP (A a) (B b) (C c) (D d)))"));
        assert!(tt.matches().is_empty());
    }

    #[test]
    fn prune_at_top_needs_a_single_child() {
        let t = tree("( (IP (NP (N dog))))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&has_label("IP")).prune().unwrap();
        assert_eq!(*tt.tree(), tree("( (NP (N dog)))"));

        let t = tree("( (IP (NP (N dog)) (V barks)))");
        let mut tt = TreeTransformer::new(&t);
        let err = tt.find_nodes(&has_label("IP")).prune().unwrap_err();
        assert_eq!(err, TransformError::Tree(TreeError::RootArity));
    }

    #[test]
    fn match_data_survives_filtering() {
        let t = tree("( (IP (NP (N dog) (N cat)) (VP (V runs))))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&(has_label("NP") | has_label("VP")))
            .store_match_data(|t, n| t.label(n).to_string())
            .filter_matches(&daughters(anything()));
        let labels = tt.query_matches(|t, n| t.label(n).to_string());
        assert_eq!(labels, ["N", "N", "V"]);
        assert_eq!(tt.match_data(), ["NP", "NP", "VP"]);
    }

    #[test]
    fn find_nodes_selects_the_yielded_nodes() {
        let t = tree("( (IP (NP (N dog)) (V barks)))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes(&(has_label("NP") & daughters(is_leaf())));
        let labels = tt.query_matches(|t, n| t.label(n).to_string());
        assert_eq!(labels, ["N"]);
    }

    #[test]
    fn find_nodes_shallow_tests_only_the_top() {
        let t = tree("( (IP (NP (N dog)) (V barks)))");
        let mut tt = TreeTransformer::new(&t);
        tt.find_nodes_shallow(&daughter_count(2, crate::search::Cmp::Equal));
        let labels = tt.query_matches(|t, n| t.label(n).to_string());
        assert_eq!(labels, ["IP"]);
    }
}
