//! Threaded comment trees on the nested-set model
//!
//! This crate keeps one ordered tree of comments per post. It has no storage
//! or transport of its own: callers hand it payloads and get back ids and
//! thread-ordered listings, and may persist the whole state through a
//! [`ForestSnapshot`].
//!
//! ## Core Concepts
//!
//! - **Node**: one comment, carrying a `(left, right)` boundary pair. A node
//!   is an ancestor of another iff its interval strictly contains the
//!   other's, so "all replies to X" is a single contiguous range and
//!   ascending `left` is thread (pre-) order.
//! - **Tree**: every comment under one post, identified by the post's
//!   [`TreeId`]. Structural operations rewrite boundaries within one tree
//!   only.
//! - **Forest**: the engine. Serializes structural operations per tree and
//!   lets queries on different trees run in parallel.
//!
//! ```
//! use threadline_tree::{Forest, Payload, TreeId};
//!
//! let forest = Forest::default();
//! let post = TreeId::new(7);
//!
//! let top = forest.append_child(None, post, Payload::new("ann", "first!", 1))?;
//! let reply = forest.append_child(Some(top), post, Payload::new("bob", "hi", 2))?;
//!
//! let thread = forest.subtree(top, None, false)?;
//! assert_eq!(thread.len(), 1);
//! assert_eq!(thread[0].id(), reply);
//! assert_eq!(thread[0].depth(), 1);
//! # Ok::<(), threadline_tree::TreeError>(())
//! ```

pub mod config;
pub mod error;
pub mod forest;
pub mod ids;
pub mod node;
pub mod snapshot;
mod tree;

pub use config::ForestConfig;
pub use error::{Result, TreeError};
pub use forest::{Forest, ForestStats};
pub use ids::{NodeId, TreeId};
pub use node::{Node, Payload};
pub use snapshot::ForestSnapshot;
