//! core::schema
//!
//! The node type schema: which types exist, which collection key holds each
//! type in the document, how each type is drawn, and which child types it
//! may contain.
//!
//! # Invariants
//!
//! A [`TypeSchema`] can only be obtained through [`TypeSchemaBuilder::build`],
//! which checks once that:
//!
//! - the root type is declared
//! - every child type reference names a declared type
//! - collection keys are non-empty and unique
//! - no type can reach itself through child references (acyclic)
//!
//! Traversal code may therefore trust the schema without re-checking it.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::TypeName;

/// Errors from schema validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("root type '{0}' is not declared")]
    UnknownRoot(TypeName),

    #[error("type '{parent}' references undeclared child type '{child}'")]
    UnknownChild { parent: TypeName, child: TypeName },

    #[error("type '{0}' is declared more than once")]
    DuplicateType(TypeName),

    #[error("type '{0}' has an empty collection key")]
    EmptyCollection(TypeName),

    #[error("collection key '{key}' is used by both '{first}' and '{second}'")]
    DuplicateCollection {
        key: String,
        first: TypeName,
        second: TypeName,
    },

    #[error("type '{0}' reaches itself through its children")]
    Cycle(TypeName),
}

/// Visual shape of a node in the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// `[label]`
    Square,
    /// `{label}`
    Diamond,
    /// `(label)`
    Rounded,
    /// `((label))`
    Circle,
    /// `[(label)]`, the cylinder-style data shape
    Data,
}

impl Shape {
    /// Opening and closing brackets for this shape.
    pub fn brackets(self) -> (&'static str, &'static str) {
        match self {
            Shape::Square => ("[", "]"),
            Shape::Diamond => ("{", "}"),
            Shape::Rounded => ("(", ")"),
            Shape::Circle => ("((", "))"),
            Shape::Data => ("[(", ")]"),
        }
    }

    /// Wrap a label in this shape's brackets.
    pub fn wrap(self, label: &str) -> String {
        let (open, close) = self.brackets();
        format!("{}{}{}", open, label, close)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Square => write!(f, "square"),
            Shape::Diamond => write!(f, "diamond"),
            Shape::Rounded => write!(f, "rounded"),
            Shape::Circle => write!(f, "circle"),
            Shape::Data => write!(f, "data"),
        }
    }
}

/// Schema entry for one node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    /// Key of the collection holding nodes of this type in their parent.
    pub collection: String,
    /// How nodes of this type are drawn.
    pub shape: Shape,
    /// Child types, in the order they are traversed.
    pub children: Vec<TypeName>,
}

/// A validated type schema rooted at a designated top-level type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSchema {
    root: TypeName,
    types: BTreeMap<TypeName, TypeSpec>,
}

impl TypeSchema {
    /// Start building a schema with the given root type.
    pub fn builder(root: TypeName) -> TypeSchemaBuilder {
        TypeSchemaBuilder {
            root,
            types: Vec::new(),
        }
    }

    /// The schema used by the assurance case backend.
    ///
    /// ```text
    /// TopLevelNormativeGoal (goals, square)
    /// ├── Context (context, rounded)
    /// ├── SystemDescription (system_description, data)
    /// └── PropertyClaim (property_claims, diamond)
    ///     └── EvidentialClaim (evidential_claims, rounded)
    ///         └── Evidence (evidence, data)
    /// ```
    pub fn assurance() -> Self {
        fn name(s: &str) -> TypeName {
            TypeName::new(s).expect("built-in type names are valid")
        }

        TypeSchema::builder(name("TopLevelNormativeGoal"))
            .declare(
                name("TopLevelNormativeGoal"),
                "goals",
                Shape::Square,
                vec![
                    name("Context"),
                    name("SystemDescription"),
                    name("PropertyClaim"),
                ],
            )
            .declare(name("Context"), "context", Shape::Rounded, vec![])
            .declare(
                name("SystemDescription"),
                "system_description",
                Shape::Data,
                vec![],
            )
            .declare(
                name("PropertyClaim"),
                "property_claims",
                Shape::Diamond,
                vec![name("EvidentialClaim")],
            )
            .declare(
                name("EvidentialClaim"),
                "evidential_claims",
                Shape::Rounded,
                vec![name("Evidence")],
            )
            .declare(name("Evidence"), "evidence", Shape::Data, vec![])
            .build()
            .expect("built-in schema is valid")
    }

    /// The designated top-level type.
    pub fn root(&self) -> &TypeName {
        &self.root
    }

    /// Look up the spec for a type.
    pub fn get(&self, name: &TypeName) -> Option<&TypeSpec> {
        self.types.get(name)
    }

    /// Look up a type by name string.
    pub fn get_by_str(&self, name: &str) -> Option<(&TypeName, &TypeSpec)> {
        self.types.iter().find(|(k, _)| k.as_str() == name)
    }

    /// All declared types in name order.
    pub fn types(&self) -> impl Iterator<Item = (&TypeName, &TypeSpec)> {
        self.types.iter()
    }

    /// Length of the longest root-to-leaf type chain.
    ///
    /// For a valid schema this bounds the depth of any compiled tree.
    pub fn height(&self) -> usize {
        fn height_of(schema: &TypeSchema, name: &TypeName) -> usize {
            schema
                .types
                .get(name)
                .map(|spec| {
                    1 + spec
                        .children
                        .iter()
                        .map(|c| height_of(schema, c))
                        .max()
                        .unwrap_or(0)
                })
                .unwrap_or(0)
        }
        height_of(self, &self.root)
    }
}

/// Builder for [`TypeSchema`]. Validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct TypeSchemaBuilder {
    root: TypeName,
    types: Vec<(TypeName, TypeSpec)>,
}

impl TypeSchemaBuilder {
    /// Declare a type.
    pub fn declare(
        mut self,
        name: TypeName,
        collection: impl Into<String>,
        shape: Shape,
        children: Vec<TypeName>,
    ) -> Self {
        self.types.push((
            name,
            TypeSpec {
                collection: collection.into(),
                shape,
                children,
            },
        ));
        self
    }

    /// Validate and produce the schema.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found.
    pub fn build(self) -> Result<TypeSchema, SchemaError> {
        let mut types = BTreeMap::new();
        let mut collections: BTreeMap<String, TypeName> = BTreeMap::new();

        for (name, spec) in self.types {
            if spec.collection.is_empty() {
                return Err(SchemaError::EmptyCollection(name));
            }
            if let Some(first) = collections.get(&spec.collection) {
                return Err(SchemaError::DuplicateCollection {
                    key: spec.collection.clone(),
                    first: first.clone(),
                    second: name,
                });
            }
            collections.insert(spec.collection.clone(), name.clone());
            if types.contains_key(&name) {
                return Err(SchemaError::DuplicateType(name));
            }
            types.insert(name, spec);
        }

        if !types.contains_key(&self.root) {
            return Err(SchemaError::UnknownRoot(self.root));
        }

        for (name, spec) in &types {
            if let Some(child) = spec.children.iter().find(|c| !types.contains_key(*c)) {
                return Err(SchemaError::UnknownChild {
                    parent: name.clone(),
                    child: child.clone(),
                });
            }
        }

        let schema = TypeSchema {
            root: self.root,
            types,
        };
        if let Some(name) = schema.find_cycle() {
            return Err(SchemaError::Cycle(name));
        }
        Ok(schema)
    }
}

impl TypeSchema {
    /// Returns `Some(type)` if a cycle is reachable from that type.
    fn find_cycle(&self) -> Option<TypeName> {
        let mut visited = HashSet::new();
        let mut path = HashSet::new();

        for name in self.types.keys() {
            if self.has_cycle_from(name, &mut visited, &mut path) {
                return Some(name.clone());
            }
        }
        None
    }

    fn has_cycle_from<'a>(
        &'a self,
        name: &'a TypeName,
        visited: &mut HashSet<&'a TypeName>,
        path: &mut HashSet<&'a TypeName>,
    ) -> bool {
        if path.contains(name) {
            return true;
        }
        if !visited.insert(name) {
            return false;
        }

        path.insert(name);
        if let Some(spec) = self.types.get(name) {
            for child in &spec.children {
                if self.has_cycle_from(child, visited, path) {
                    return true;
                }
            }
        }
        path.remove(name);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> TypeName {
        TypeName::new(s).unwrap()
    }

    #[test]
    fn shape_brackets() {
        assert_eq!(Shape::Square.wrap("G"), "[G]");
        assert_eq!(Shape::Diamond.wrap("C"), "{C}");
        assert_eq!(Shape::Rounded.wrap("R"), "(R)");
        assert_eq!(Shape::Circle.wrap("O"), "((O))");
        assert_eq!(Shape::Data.wrap("E"), "[(E)]");
    }

    #[test]
    fn shape_serde_lowercase() {
        let shape: Shape = serde_json::from_str("\"data\"").unwrap();
        assert_eq!(shape, Shape::Data);
        assert_eq!(serde_json::to_string(&Shape::Diamond).unwrap(), "\"diamond\"");
    }

    #[test]
    fn assurance_schema_is_valid() {
        let schema = TypeSchema::assurance();
        assert_eq!(schema.root().as_str(), "TopLevelNormativeGoal");
        assert_eq!(schema.types().count(), 6);
        assert_eq!(schema.height(), 4);
        let (_, claim) = schema.get_by_str("PropertyClaim").unwrap();
        assert_eq!(claim.collection, "property_claims");
        assert_eq!(claim.shape, Shape::Diamond);
    }

    #[test]
    fn unknown_root_rejected() {
        let err = TypeSchema::builder(name("Missing"))
            .declare(name("Goal"), "goals", Shape::Square, vec![])
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::UnknownRoot(name("Missing")));
    }

    #[test]
    fn unknown_child_rejected() {
        let err = TypeSchema::builder(name("Goal"))
            .declare(name("Goal"), "goals", Shape::Square, vec![name("Claim")])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownChild {
                parent: name("Goal"),
                child: name("Claim"),
            }
        );
    }

    #[test]
    fn self_reference_rejected() {
        let err = TypeSchema::builder(name("Claim"))
            .declare(name("Claim"), "claims", Shape::Diamond, vec![name("Claim")])
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::Cycle(name("Claim")));
    }

    #[test]
    fn transitive_cycle_rejected() {
        let err = TypeSchema::builder(name("A"))
            .declare(name("A"), "a", Shape::Square, vec![name("B")])
            .declare(name("B"), "b", Shape::Square, vec![name("C")])
            .declare(name("C"), "c", Shape::Square, vec![name("A")])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::Cycle(_)));
    }

    #[test]
    fn shared_child_is_not_a_cycle() {
        let schema = TypeSchema::builder(name("A"))
            .declare(name("A"), "a", Shape::Square, vec![name("B"), name("C")])
            .declare(name("B"), "b", Shape::Square, vec![name("D")])
            .declare(name("C"), "c", Shape::Square, vec![name("D")])
            .declare(name("D"), "d", Shape::Data, vec![])
            .build()
            .unwrap();
        assert_eq!(schema.height(), 3);
    }

    #[test]
    fn duplicate_collection_rejected() {
        let err = TypeSchema::builder(name("A"))
            .declare(name("A"), "items", Shape::Square, vec![])
            .declare(name("B"), "items", Shape::Square, vec![])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateCollection { .. }));
    }

    #[test]
    fn duplicate_type_rejected() {
        let err = TypeSchema::builder(name("A"))
            .declare(name("A"), "a", Shape::Square, vec![])
            .declare(name("A"), "b", Shape::Square, vec![])
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateType(name("A")));
    }

    #[test]
    fn empty_collection_rejected() {
        let err = TypeSchema::builder(name("A"))
            .declare(name("A"), "", Shape::Square, vec![])
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::EmptyCollection(name("A")));
    }
}
