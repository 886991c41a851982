//! Persisted rating bookkeeping.
//!
//! Every field is stored under `{app identifier}_{logical key}` in the
//! injected `KeyValueStore`. Absent keys read as zero/false/unset.

mod keys;
mod record;

pub use keys::{KeySpace, StateKey};
pub use record::{RatingState, StateStore};
