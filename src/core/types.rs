//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`TypeName`] - Validated node type name (e.g. `PropertyClaim`)
//! - [`NodeId`] - Diagram node identifier `<type>_<id>`
//! - [`CaseId`] - Numeric assurance case identifier
//! - [`SessionToken`] - Opaque per-context session token
//!
//! # Validation
//!
//! These types enforce validity at construction time. A [`TypeName`] never
//! contains an underscore, which is what makes the `<type>_<id>` naming rule
//! reversible: every [`NodeId`] renders with exactly one underscore.
//!
//! # Examples
//!
//! ```
//! use caseview::core::types::{NodeId, TypeName};
//!
//! let id = NodeId::new(TypeName::new("Evidence").unwrap(), 4);
//! assert_eq!(id.to_string(), "Evidence_4");
//!
//! let parsed: NodeId = "Evidence_4".parse().unwrap();
//! assert_eq!(parsed, id);
//!
//! assert!(TypeName::new("evidential_claim").is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid type name: {0}")]
    InvalidTypeName(String),

    #[error("invalid node id: {0}")]
    InvalidNodeId(String),

    #[error("invalid session token: {0}")]
    InvalidSessionToken(String),
}

/// A validated node type name.
///
/// Type names must be non-empty and consist of ASCII letters and digits only.
/// Underscores are rejected because they delimit the parts of a [`NodeId`].
///
/// # Example
///
/// ```
/// use caseview::core::types::TypeName;
///
/// let name = TypeName::new("TopLevelNormativeGoal").unwrap();
/// assert_eq!(name.as_str(), "TopLevelNormativeGoal");
///
/// assert!(TypeName::new("").is_err());
/// assert!(TypeName::new("Has_Underscore").is_err());
/// assert!(TypeName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeName(String);

impl TypeName {
    /// Create a new validated type name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTypeName` if the name is empty or contains
    /// anything other than ASCII alphanumerics.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidTypeName(
                "type name cannot be empty".into(),
            ));
        }
        if name.contains('_') {
            return Err(TypeError::InvalidTypeName(format!(
                "type name '{}' cannot contain '_'",
                name
            )));
        }
        if let Some(ch) = name.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(TypeError::InvalidTypeName(format!(
                "type name '{}' contains invalid character '{}'",
                name, ch
            )));
        }
        Ok(())
    }

    /// Get the type name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TypeName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TypeName> for String {
    fn from(name: TypeName) -> Self {
        name.0
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a node in the compiled diagram.
///
/// Formed as `<typeName>_<numericId>`. Because [`TypeName`] cannot contain
/// `_`, two distinct (type, id) pairs never produce the same identifier and
/// the identifier can always be split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    type_name: TypeName,
    id: u64,
}

impl NodeId {
    /// Create a node identifier from its parts.
    pub fn new(type_name: TypeName, id: u64) -> Self {
        Self { type_name, id }
    }

    /// The node's type name.
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// The node's numeric id within its type.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.type_name, self.id)
    }
}

impl FromStr for NodeId {
    type Err = TypeError;

    /// Parse the identifier a click callback receives.
    ///
    /// # Example
    ///
    /// ```
    /// use caseview::core::types::NodeId;
    ///
    /// let id: NodeId = "PropertyClaim_12".parse().unwrap();
    /// assert_eq!(id.type_name().as_str(), "PropertyClaim");
    /// assert_eq!(id.id(), 12);
    ///
    /// assert!("PropertyClaim12".parse::<NodeId>().is_err());
    /// assert!("Property_Claim_12".parse::<NodeId>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('_');
        let (Some(type_part), Some(id_part), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(TypeError::InvalidNodeId(format!(
                "'{}' must contain exactly one '_'",
                s
            )));
        };

        let type_name = TypeName::new(type_part)
            .map_err(|e| TypeError::InvalidNodeId(format!("'{}': {}", s, e)))?;
        // Digits only, no sign or padding: the text must be what Display writes.
        let canonical = !id_part.is_empty()
            && id_part.bytes().all(|b| b.is_ascii_digit())
            && (id_part == "0" || !id_part.starts_with('0'));
        let id = id_part
            .parse::<u64>()
            .ok()
            .filter(|_| canonical)
            .ok_or_else(|| TypeError::InvalidNodeId(format!("'{}': id is not a number", s)))?;

        Ok(Self { type_name, id })
    }
}

/// Numeric identifier of an assurance case in the case store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(u64);

impl CaseId {
    /// Wrap a raw case id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw numeric id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CaseId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Opaque token identifying one browsing context.
///
/// Locally minted tokens are UUID v4 strings, but tokens observed in the
/// lock-holder field of a case may come from any client, so any non-empty
/// string without surrounding whitespace is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    /// Create a token from an existing value.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSessionToken` if the value is empty or has
    /// leading/trailing whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.is_empty() {
            return Err(TypeError::InvalidSessionToken(
                "token cannot be empty".into(),
            ));
        }
        if value.trim() != value {
            return Err(TypeError::InvalidSessionToken(
                "token cannot have surrounding whitespace".into(),
            ));
        }
        Ok(Self(value))
    }

    /// Mint a fresh random token.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionToken {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod type_name {
        use super::*;

        #[test]
        fn accepts_alphanumeric() {
            assert!(TypeName::new("Evidence").is_ok());
            assert!(TypeName::new("C1").is_ok());
            assert!(TypeName::new("G").is_ok());
        }

        #[test]
        fn rejects_underscore() {
            let err = TypeName::new("evidential_claim").unwrap_err();
            assert!(matches!(err, TypeError::InvalidTypeName(_)));
        }

        #[test]
        fn rejects_punctuation() {
            assert!(TypeName::new("a-b").is_err());
            assert!(TypeName::new("a.b").is_err());
            assert!(TypeName::new("Ünicode").is_err());
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<TypeName, _> = serde_json::from_str("\"bad_name\"");
            assert!(result.is_err());
        }
    }

    mod node_id {
        use super::*;

        #[test]
        fn display_joins_with_underscore() {
            let id = NodeId::new(TypeName::new("Context").unwrap(), 7);
            assert_eq!(id.to_string(), "Context_7");
        }

        #[test]
        fn parse_splits_at_underscore() {
            let id: NodeId = "EvidentialClaim_31".parse().unwrap();
            assert_eq!(id.type_name().as_str(), "EvidentialClaim");
            assert_eq!(id.id(), 31);
        }

        #[test]
        fn parse_rejects_malformed() {
            assert!("".parse::<NodeId>().is_err());
            assert!("_3".parse::<NodeId>().is_err());
            assert!("Goal_".parse::<NodeId>().is_err());
            assert!("Goal_x".parse::<NodeId>().is_err());
            assert!("Goal_-1".parse::<NodeId>().is_err());
            assert!("Goal_1_2".parse::<NodeId>().is_err());
        }

        #[test]
        fn parse_accepts_only_display_form() {
            assert!("Evidence_+4".parse::<NodeId>().is_err());
            assert!("Evidence_04".parse::<NodeId>().is_err());
            assert!("Evidence_ 4".parse::<NodeId>().is_err());
            assert_eq!("Evidence_0".parse::<NodeId>().unwrap().id(), 0);

            let id = NodeId::new(TypeName::new("Evidence").unwrap(), 4);
            assert_eq!(id.to_string().parse::<NodeId>().unwrap(), id);
        }

        #[test]
        fn distinct_pairs_render_distinct() {
            let a = NodeId::new(TypeName::new("C1").unwrap(), 23);
            let b = NodeId::new(TypeName::new("C12").unwrap(), 3);
            assert_ne!(a.to_string(), b.to_string());
        }
    }

    mod session_token {
        use super::*;

        #[test]
        fn generated_tokens_differ() {
            assert_ne!(SessionToken::generate(), SessionToken::generate());
        }

        #[test]
        fn rejects_empty_and_padded() {
            assert!(SessionToken::new("").is_err());
            assert!(SessionToken::new(" abc").is_err());
            assert!(SessionToken::new("abc").is_ok());
        }
    }

    #[test]
    fn case_id_parses() {
        let id: CaseId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }
}
