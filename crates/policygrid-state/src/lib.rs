//! policygrid-state — persistent policy store for PolicyGrid.
//!
//! Backed by [redb](https://docs.rs/redb). Holds at most one
//! [`PolicyRecord`] per application, JSON-serialized into a single table
//! keyed by application id.
//!
//! The [`PolicyStore`] trait is the seam the bind/unbind orchestrators
//! depend on; [`StateStore`] is the redb implementation. `StateStore` is
//! `Clone` + `Send` + `Sync` (backed by `Arc<Database>`) and can be shared
//! across async tasks. redb serialises write transactions and gives each
//! reader a consistent snapshot, so a concurrent `get` never observes a
//! half-written record.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::{PolicyStore, StateStore};
pub use types::*;
