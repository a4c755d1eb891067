//! This crate provides a radix tree that maps IP prefixes (CIDR blocks) to values. Any lookup
//! performs longest-prefix match, which makes the tree a building block for routing tables,
//! access lists, or geo-IP tagging. IPv4 and IPv6 prefixes can be stored in the same tree; each
//! family has its own root, so a lookup never matches a prefix of the other family.
//!
//! Prefixes are given either as CIDR text (`"10.0.0.0/8"`, `"dead::/16"`, or a plain address for
//! a full-length prefix), as raw address bytes, or as any type implementing [`Prefix`]: the
//! [`std::net`] address types, [`Key`], and the prefix types of
//! [ipnet](https://docs.rs/ipnet) (feature `ipnet`, enabled by default),
//! [ipnetwork](https://docs.rs/ipnetwork) (feature `ipnetwork`) and
//! [cidr](https://docs.rs/cidr) (feature `cidr`).
//!
//! ```
//! # use cidr_radix::*;
//! let mut tree = RadixTree::new();
//! tree.add_cidr("1.2.3.0/24", "B")?;
//! tree.add_cidr("1.2.3.0/25", "A")?;
//! assert_eq!(tree.find_cidr("1.2.3.1")?, Some(&"A"));
//! assert_eq!(tree.find_cidr("1.2.3.200")?, Some(&"B"));
//!
//! // `add` refuses to overwrite, `set` replaces.
//! assert_eq!(tree.add_cidr("1.2.3.0/24", "C"), Err(Error::Busy));
//! assert_eq!(tree.set_cidr("1.2.3.0/24", "C")?, Some("B"));
//!
//! tree.delete_cidr("1.2.3.0/25")?;
//! assert_eq!(tree.find_cidr("1.2.3.1")?, Some(&"C"));
//! # Ok::<(), Error>(())
//! ```
//!
//! # Description of the Tree
//!
//! The tree has one node per bit of a prefix: a prefix of length `n` is stored at depth `n`, and
//! the path from the root spells out its bits. At depth `d`, a `0` bit takes the left branch and
//! a `1` bit the right one. Each node has a container for a potential value (`Option`) and two
//! optional children. There is no path compression, so every walk takes at most 32 (IPv4) or 128
//! (IPv6) steps.
//!
//! Nodes live in a table and refer to each other by index. Deleting a value releases all nodes
//! that no longer lead to any value onto a free list, from which later inserts take their nodes
//! before growing the table.
//!
//! # Operations on the tree
//!
//! | Operation                                    | Complexity      |
//! |----------------------------------------------|-----------------|
//! | `add`, `set`, `delete`                       | `O(w)`          |
//! | `find`, `find_with_prefix`, `get`, `get_mut` | `O(w)`          |
//! | `delete_whole_range`                         | `O(w + m)`      |
//! | `clear`                                      | `O(n)`          |
//! | `len` and `is_empty`                         | `O(1)`          |
//!
//! Here, `w` is the address width (32 or 128), `n` the number of nodes, and `m` the number of
//! nodes below the removed prefix.
//!
//! There are two kinds of removals:
//!
//! - [`RadixTree::delete`] removes the value of exactly one prefix, and fails with
//!   [`Error::NotFound`] if there is none.
//! - [`RadixTree::delete_whole_range`] removes a prefix together with all more specific prefixes
//!   it contains, whether or not the prefix itself carries a value.
//!
//! The tree has no internal synchronization. Wrap it in a lock to share it between threads.

#![deny(missing_docs)]

mod error;
mod fmt;
mod inner;
mod parse;
mod prefix;
#[cfg(feature = "serde")]
mod serde;
#[cfg(test)]
mod fuzzing;

pub mod tree;

pub use error::Error;
pub use prefix::{Family, Key, Prefix};
pub use tree::{RadixTree, MAX_PREALLOCATION};
