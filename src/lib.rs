//! caseview - Diagrams and edit locks for collaboratively edited assurance cases
//!
//! An assurance case is a tree of goals, claims and evidence kept in a shared
//! case store. caseview compiles that tree into a Mermaid flowchart with
//! stable, clickable node identifiers, and coordinates the sessions viewing
//! it through an advisory single-writer edit lock kept current by polling.
//!
//! # Architecture
//!
//! - [`core`] - Domain types, the type schema, the case document and config
//! - [`diagram`] - Case tree to Mermaid compiler
//! - [`store`] - Case store interface (REST client and in-memory mock)
//! - [`session`] - Per-context session tokens
//! - [`sync`] - Edit lock, polling and the viewer event loop
//! - [`ui`] - User interaction utilities
//! - [`cli`] - Command-line interface
//!
//! # Correctness Invariants
//!
//! 1. Compiling the same case twice yields byte-identical text
//! 2. Every diagram node identifier is introduced exactly once
//! 3. An older poll response never overwrites a newer one
//! 4. The lock state is a function of the document's lock holder and the
//!    local token, except between an acknowledged write and the next poll
//! 5. A session never clears another session's lock without confirmation

pub mod cli;
pub mod core;
pub mod diagram;
pub mod session;
pub mod store;
pub mod sync;
pub mod ui;
