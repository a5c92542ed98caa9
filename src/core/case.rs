//! core::case
//!
//! The assurance case document as delivered by the case store.
//!
//! # Wire shape
//!
//! ```json
//! {
//!   "id": 1,
//!   "name": "Safety case",
//!   "description": "...",
//!   "lock_uuid": null,
//!   "goals": [
//!     { "id": 1, "name": "G", "short_description": "...", "property_claims": [ ... ] }
//!   ]
//! }
//! ```
//!
//! Any JSON field holding an array of objects is a child collection, keyed by
//! its field name. Every other field is kept verbatim as an attribute so that
//! structural equality between two fetches covers the whole document.
//!
//! Documents are immutable snapshots: nothing in this crate mutates a fetched
//! case except the in-memory mock store applying a field patch.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use super::schema::TypeSchema;
use super::types::{CaseId, NodeId, SessionToken, TypeName};

/// JSON field carrying the lock holder's session token.
pub const LOCK_FIELD: &str = "lock_uuid";

/// Errors from applying a field patch to a case.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("field '{field}' has an invalid value: {message}")]
    InvalidField { field: String, message: String },

    #[error("field '{0}' cannot be patched")]
    ReadOnlyField(String),
}

/// One node of the case tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct Node {
    id: u64,
    name: String,
    children: BTreeMap<String, Vec<Node>>,
    attributes: BTreeMap<String, Value>,
}

impl Node {
    /// Create a leaf node with no attributes.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            children: BTreeMap::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Append a child to the named collection.
    pub fn with_child(mut self, collection: impl Into<String>, child: Node) -> Self {
        self.children
            .entry(collection.into())
            .or_default()
            .push(child);
        self
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Numeric id, unique within the node's type.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Display label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Children in the named collection, empty if the collection is absent.
    pub fn collection(&self, key: &str) -> &[Node] {
        self.children.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-collection fields.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map =
            serializer.serialize_map(Some(2 + self.attributes.len() + self.children.len()))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("name", &self.name)?;
        for (key, value) in &self.attributes {
            map.serialize_entry(key, value)?;
        }
        for (key, nodes) in &self.children {
            map.serialize_entry(key, nodes)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
struct RawNode {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl TryFrom<RawNode> for Node {
    type Error = serde_json::Error;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let (children, attributes) = split_collections(raw.rest)?;
        Ok(Node {
            id: raw.id,
            name: raw.name,
            children,
            attributes,
        })
    }
}

type Collections = BTreeMap<String, Vec<Node>>;
type Attributes = BTreeMap<String, Value>;

fn is_collection(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().all(Value::is_object),
        _ => false,
    }
}

fn split_collections(rest: Map<String, Value>) -> Result<(Collections, Attributes), serde_json::Error> {
    let mut children = BTreeMap::new();
    let mut attributes = BTreeMap::new();
    for (key, value) in rest {
        if is_collection(&value) {
            let nodes: Vec<Node> = serde_json::from_value(value)?;
            children.insert(key, nodes);
        } else {
            attributes.insert(key, value);
        }
    }
    Ok((children, attributes))
}

/// The full assurance case document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawCase")]
pub struct AssuranceCase {
    id: CaseId,
    name: String,
    description: String,
    lock_holder: Option<SessionToken>,
    collections: BTreeMap<String, Vec<Node>>,
    attributes: BTreeMap<String, Value>,
}

impl AssuranceCase {
    /// Create an empty, unlocked case.
    pub fn new(id: CaseId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            lock_holder: None,
            collections: BTreeMap::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Append a top-level node to the named collection.
    pub fn with_node(mut self, collection: impl Into<String>, node: Node) -> Self {
        self.collections
            .entry(collection.into())
            .or_default()
            .push(node);
        self
    }

    /// Set the lock holder.
    pub fn with_lock_holder(mut self, holder: Option<SessionToken>) -> Self {
        self.lock_holder = holder;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Case id.
    pub fn id(&self) -> CaseId {
        self.id
    }

    /// Case name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Session currently holding the edit lock, if any.
    pub fn lock_holder(&self) -> Option<&SessionToken> {
        self.lock_holder.as_ref()
    }

    /// Top-level nodes in the named collection, empty if absent.
    pub fn collection(&self, key: &str) -> &[Node] {
        self.collections.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-collection fields other than id, name, description and lock holder.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Resolve a diagram node identifier back to its node.
    ///
    /// Walks the tree along the schema, so only nodes reachable from the root
    /// type are found. Returns `None` for unknown identifiers.
    pub fn find_node(&self, schema: &TypeSchema, target: &NodeId) -> Option<&Node> {
        fn search<'a>(
            schema: &TypeSchema,
            type_name: &TypeName,
            nodes: &'a [Node],
            target: &NodeId,
        ) -> Option<&'a Node> {
            let spec = schema.get(type_name)?;
            for node in nodes {
                if type_name == target.type_name() && node.id == target.id() {
                    return Some(node);
                }
                for child_type in &spec.children {
                    let Some(child_spec) = schema.get(child_type) else {
                        continue;
                    };
                    let children = node.collection(&child_spec.collection);
                    if let Some(found) = search(schema, child_type, children, target) {
                        return Some(found);
                    }
                }
            }
            None
        }

        let root = schema.root();
        let spec = schema.get(root)?;
        search(schema, root, self.collection(&spec.collection), target)
    }

    /// Apply a single-field partial update, as the case store does.
    ///
    /// # Errors
    ///
    /// - `CaseError::ReadOnlyField` for `id`
    /// - `CaseError::InvalidField` if the value has the wrong JSON type
    pub fn apply_patch(&mut self, field: &str, value: Value) -> Result<(), CaseError> {
        let invalid = |message: &str| CaseError::InvalidField {
            field: field.to_string(),
            message: message.to_string(),
        };

        match field {
            "id" => return Err(CaseError::ReadOnlyField(field.to_string())),
            LOCK_FIELD | "lockHolder" => {
                self.lock_holder = match value {
                    Value::Null => None,
                    Value::String(s) if s.is_empty() => None,
                    Value::String(s) => {
                        Some(SessionToken::new(s).map_err(|e| invalid(&e.to_string()))?)
                    }
                    _ => return Err(invalid("expected a string or null")),
                };
            }
            "name" => match value {
                Value::String(s) => self.name = s,
                _ => return Err(invalid("expected a string")),
            },
            "description" => match value {
                Value::String(s) => self.description = s,
                _ => return Err(invalid("expected a string")),
            },
            _ => {
                if self.collections.contains_key(field) {
                    return Err(CaseError::ReadOnlyField(field.to_string()));
                }
                self.attributes.insert(field.to_string(), value);
            }
        }
        Ok(())
    }

    /// Short `{id, name}` form used by case listings.
    pub fn summary(&self) -> CaseSummary {
        CaseSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

impl Serialize for AssuranceCase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 4 + self.attributes.len() + self.collections.len();
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("description", &self.description)?;
        map.serialize_entry(LOCK_FIELD, &self.lock_holder)?;
        for (key, value) in &self.attributes {
            map.serialize_entry(key, value)?;
        }
        for (key, nodes) in &self.collections {
            map.serialize_entry(key, nodes)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
struct RawCase {
    id: CaseId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "lock_uuid", alias = "lockHolder", default)]
    lock_holder: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl TryFrom<RawCase> for AssuranceCase {
    type Error = String;

    fn try_from(raw: RawCase) -> Result<Self, Self::Error> {
        let lock_holder = match raw.lock_holder {
            None => None,
            Some(s) if s.is_empty() => None,
            Some(s) => Some(SessionToken::new(s).map_err(|e| e.to_string())?),
        };
        let (collections, attributes) = split_collections(raw.rest).map_err(|e| e.to_string())?;
        Ok(AssuranceCase {
            id: raw.id,
            name: raw.name,
            description: raw.description,
            lock_holder,
            collections,
            attributes,
        })
    }
}

/// `{id, name}` summary of a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSummary {
    /// Case id.
    pub id: CaseId,
    /// Case name.
    pub name: String,
}
