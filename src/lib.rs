//! Parsing, querying, and transformation of bracketed treebank
//! corpora.
//!
//! The crate models annotated sentences as arena-backed [`Tree`]s,
//! reads and writes the three bracketed interchange formats
//! ([`Format`]), matches nodes with a combinable predicate algebra
//! ([`search`]), and performs bulk structural edits through
//! [`TreeTransformer`].
//!
//! ```
//! use coppice::search::{has_label, has_daughter};
//! use coppice::{Format, TreeTransformer, parse};
//!
//! let tree = parse("( (IP (NP (N dog)) (V barks)))", Format::OldStyle)?;
//! let mut tt = TreeTransformer::new(&tree);
//! tt.find_nodes(&has_label("V")).add_parent_node("VP", false)?;
//! let ip = tt.tree().children(tt.tree().root())[0];
//! assert!(has_daughter(has_label("VP")).is_match(tt.tree(), ip));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod parser;
pub mod search;
pub mod transformer;
pub mod tree;
pub mod util;
pub mod writer;

pub use parser::{Corpus, ParseError, parse, parse_corpus};
pub use search::{MatchResult, SearchFn};
pub use transformer::{TransformError, TreeTransformer};
pub use tree::{Metadata, MetadataValue, NodeId, Tree, TreeError};
pub use util::{IndexType, LabelError, label_and_index};
pub use writer::{Format, WriteError, write};
