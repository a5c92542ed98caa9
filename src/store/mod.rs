//! store
//!
//! Access to the external case store that owns assurance case documents.
//!
//! # Architecture
//!
//! The [`CaseStore`] trait is the only way this crate talks to the backend.
//! The viewer and the lock coordinator hold an `Arc<dyn CaseStore>` and
//! never see HTTP details.
//!
//! - Store failures never compromise local state: the last accepted
//!   document stays in place
//! - The lock holder is an ordinary field; concurrent writers race and the
//!   last write wins
//!
//! # Modules
//!
//! - `traits`: `CaseStore` trait and `StoreError`
//! - [`http`]: REST implementation using reqwest
//! - [`mock`]: in-memory implementation for deterministic testing

pub mod http;
pub mod mock;
mod traits;

pub use http::HttpCaseStore;
pub use traits::*;
