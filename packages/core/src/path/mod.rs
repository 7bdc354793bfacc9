//! Path Codec
//!
//! All manipulation of materialized-path strings lives here. A path is the
//! ids of every ancestor plus the node's own id, joined by a configurable
//! separator, root first:
//!
//! ```text
//! A        (root)
//! A#B      (child of A)
//! A#B#C    (grandchild of A)
//! ```
//!
//! Keeping the encoding behind [`PathCodec`] means a change of separator or
//! encoding stays local to this module; the services never split or splice
//! path strings themselves.

mod codec;
mod error;

pub use codec::{PathCodec, DEFAULT_SEPARATOR};
pub use error::PathError;
