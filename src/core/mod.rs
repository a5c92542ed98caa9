//! core
//!
//! Core domain types and schemas for caseview.
//!
//! # Modules
//!
//! - [`types`] - Strong types: TypeName, NodeId, CaseId, SessionToken
//! - [`schema`] - Validated node type schema
//! - [`case`] - The assurance case document model
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at construction time
//! - Schemas are validated once and trusted afterwards
//! - Documents are immutable snapshots

pub mod case;
pub mod config;
pub mod schema;
pub mod types;
