//! core::config::schema
//!
//! Configuration file types.
//!
//! # Example
//!
//! ```toml
//! base_url = "https://cases.example.com/api"
//! poll_interval_secs = 5
//! max_depth = 64
//! request_timeout_secs = 10
//!
//! [schema]
//! root = "Goal"
//!
//! [[schema.types]]
//! name = "Goal"
//! collection = "goals"
//! shape = "square"
//! children = ["Claim"]
//!
//! [[schema.types]]
//! name = "Claim"
//! collection = "claims"
//! shape = "diamond"
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing. A `[schema]` table is turned into a
//! [`TypeSchema`] at load time, so a cyclic or dangling schema is rejected
//! before anything is fetched or compiled.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::schema::{Shape, TypeSchema};
use crate::core::types::TypeName;

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Case store API base URL (e.g. `http://localhost:8000/api`)
    pub base_url: Option<String>,

    /// Seconds between polls
    pub poll_interval_secs: Option<u64>,

    /// Seconds before a case store request is abandoned
    pub request_timeout_secs: Option<u64>,

    /// Maximum traversal depth when compiling a diagram
    pub max_depth: Option<usize>,

    /// Where session tokens are persisted
    pub session_file: Option<PathBuf>,

    /// Replacement for the built-in type schema
    pub schema: Option<SchemaConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "base_url '{}' must start with http:// or https://",
                    url
                )));
            }
        }

        if self.poll_interval_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.max_depth == Some(0) {
            return Err(ConfigError::InvalidValue(
                "max_depth must be greater than zero".to_string(),
            ));
        }

        if let Some(schema) = &self.schema {
            schema.to_schema()?;
        }

        Ok(())
    }
}

/// `[schema]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// Name of the top-level type
    pub root: String,

    /// Declared types
    #[serde(default)]
    pub types: Vec<TypeConfig>,
}

/// One `[[schema.types]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TypeConfig {
    /// Type name (ASCII alphanumeric)
    pub name: String,

    /// Collection key holding nodes of this type
    pub collection: String,

    /// Node shape
    pub shape: Shape,

    /// Child type names in traversal order
    #[serde(default)]
    pub children: Vec<String>,
}

impl SchemaConfig {
    /// Build and validate the schema.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for bad type names or a schema
    /// that fails validation.
    pub fn to_schema(&self) -> Result<TypeSchema, ConfigError> {
        let name = |s: &str| {
            TypeName::new(s).map_err(|e| ConfigError::InvalidValue(format!("schema: {}", e)))
        };

        let mut builder = TypeSchema::builder(name(&self.root)?);
        for ty in &self.types {
            let children = ty
                .children
                .iter()
                .map(|c| name(c))
                .collect::<Result<Vec<_>, _>>()?;
            builder = builder.declare(name(&ty.name)?, ty.collection.clone(), ty.shape, children);
        }

        builder
            .build()
            .map_err(|e| ConfigError::InvalidValue(format!("schema: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_example() {
        let config: FileConfig = toml::from_str(
            r#"
            base_url = "https://cases.example.com/api"
            poll_interval_secs = 2

            [schema]
            root = "Goal"

            [[schema.types]]
            name = "Goal"
            collection = "goals"
            shape = "square"
            children = ["Claim"]

            [[schema.types]]
            name = "Claim"
            collection = "claims"
            shape = "diamond"
            "#,
        )
        .unwrap();

        config.validate().unwrap();
        let schema = config.schema.unwrap().to_schema().unwrap();
        assert_eq!(schema.root().as_str(), "Goal");
        assert_eq!(schema.height(), 2);
    }

    #[test]
    fn zero_interval_rejected() {
        let config = FileConfig {
            poll_interval_secs: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_request_timeout_rejected() {
        let config = FileConfig {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_url_rejected() {
        let config = FileConfig {
            base_url: Some("localhost:8000".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn cyclic_schema_rejected() {
        let config = FileConfig {
            schema: Some(SchemaConfig {
                root: "Claim".to_string(),
                types: vec![TypeConfig {
                    name: "Claim".to_string(),
                    collection: "claims".to_string(),
                    shape: Shape::Diamond,
                    children: vec!["Claim".to_string()],
                }],
            }),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("reaches itself"));
    }

    #[test]
    fn unknown_shape_rejected() {
        let result: Result<TypeConfig, _> = toml::from_str(
            r#"
            name = "Goal"
            collection = "goals"
            shape = "hexagon"
            "#,
        );
        assert!(result.is_err());
    }
}
