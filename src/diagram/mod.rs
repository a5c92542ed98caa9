//! diagram
//!
//! Compiles an assurance case into Mermaid flowchart text.
//!
//! # Output
//!
//! Three statement kinds, one per line:
//!
//! ```text
//! TopLevelNormativeGoal_1[Goal]
//! click TopLevelNormativeGoal_1 callback
//! TopLevelNormativeGoal_1 --- PropertyClaim_2{Claim}
//! click PropertyClaim_2 callback
//! ```
//!
//! A root node gets a declaration; every other node is declared by the edge
//! from its parent, so each identifier is introduced exactly once. Each node
//! is followed by its click binding.
//!
//! # Determinism
//!
//! [`compile`] is a pure function of the case, the schema and the depth
//! limit. The traversal is pre-order: schema order for child types, document
//! order within a collection. Compiling the same input twice yields
//! byte-identical text.
//!
//! # Example
//!
//! ```
//! use caseview::core::case::{AssuranceCase, Node};
//! use caseview::core::schema::TypeSchema;
//! use caseview::core::types::CaseId;
//! use caseview::diagram::compile;
//!
//! let case = AssuranceCase::new(CaseId::new(1), "Case")
//!     .with_node("goals", Node::new(1, "G"));
//! let diagram = compile(&case, &TypeSchema::assurance(), 64).unwrap();
//! assert_eq!(
//!     diagram.render(),
//!     "TopLevelNormativeGoal_1[G]\nclick TopLevelNormativeGoal_1 callback\n"
//! );
//! ```

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::core::case::{AssuranceCase, Node};
use crate::core::schema::{Shape, TypeSchema};
use crate::core::types::{NodeId, TypeName};

/// Flowchart header expected by Mermaid renderers.
pub const HEADER: &str = "graph TB;";

/// Name of the callback every click binding points at.
pub const CLICK_CALLBACK: &str = "callback";

/// Errors from diagram compilation.
///
/// Both variants indicate a malformed schema or document. They are not
/// retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("traversal depth {depth} exceeds limit {max_depth} at node {node}")]
    DepthExceeded {
        depth: usize,
        max_depth: usize,
        node: NodeId,
    },

    #[error("node {0} appears more than once in the case")]
    DuplicateNode(NodeId),
}

/// One line of diagram output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `<id><label>`
    Declare {
        id: NodeId,
        shape: Shape,
        label: String,
    },
    /// `<parent> --- <id><label>`
    Edge {
        parent: NodeId,
        id: NodeId,
        shape: Shape,
        label: String,
    },
    /// `click <id> callback`
    Click { id: NodeId },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Declare { id, shape, label } => write!(f, "{}{}", id, shape.wrap(label)),
            Statement::Edge {
                parent,
                id,
                shape,
                label,
            } => write!(f, "{} --- {}{}", parent, id, shape.wrap(label)),
            Statement::Click { id } => write!(f, "click {} {}", id, CLICK_CALLBACK),
        }
    }
}

/// A compiled diagram: statements plus the identifiers they introduce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagram {
    statements: Vec<Statement>,
    nodes: Vec<NodeId>,
}

impl Diagram {
    /// Statements in output order.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Node identifiers in the order they were introduced.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Whether the diagram declares the given node.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the case had no nodes reachable from the root type.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Statement lines, each terminated by `\n`, without a header.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str(&statement.to_string());
            out.push('\n');
        }
        out
    }

    /// Full Mermaid source: header line followed by [`render`](Self::render).
    pub fn to_mermaid(&self) -> String {
        format!("{}\n{}", HEADER, self.render())
    }
}

struct Frame<'a> {
    type_name: &'a TypeName,
    node: &'a Node,
    parent: Option<NodeId>,
    depth: usize,
}

/// Compile a case into a diagram.
///
/// Traversal starts at the schema root over the case's top-level collection
/// for that type, and is bounded by `max_depth` levels. The schema is trusted
/// to be valid (see [`TypeSchema`]).
///
/// # Errors
///
/// - `CompileError::DepthExceeded` if a node sits deeper than `max_depth`
/// - `CompileError::DuplicateNode` if two nodes share a type and id
pub fn compile(
    case: &AssuranceCase,
    schema: &TypeSchema,
    max_depth: usize,
) -> Result<Diagram, CompileError> {
    let mut diagram = Diagram::default();
    let mut seen = HashSet::new();
    let mut stack: Vec<Frame<'_>> = Vec::new();

    let root = schema.root();
    if let Some(spec) = schema.get(root) {
        // Reverse so the first node is popped first.
        for node in case.collection(&spec.collection).iter().rev() {
            stack.push(Frame {
                type_name: root,
                node,
                parent: None,
                depth: 1,
            });
        }
    }

    while let Some(frame) = stack.pop() {
        let id = NodeId::new(frame.type_name.clone(), frame.node.id());

        if frame.depth > max_depth {
            return Err(CompileError::DepthExceeded {
                depth: frame.depth,
                max_depth,
                node: id,
            });
        }
        if !seen.insert(id.clone()) {
            return Err(CompileError::DuplicateNode(id));
        }

        let Some(spec) = schema.get(frame.type_name) else {
            continue;
        };
        let label = frame.node.name().to_string();
        diagram.statements.push(match frame.parent {
            Some(parent) => Statement::Edge {
                parent,
                id: id.clone(),
                shape: spec.shape,
                label,
            },
            None => Statement::Declare {
                id: id.clone(),
                shape: spec.shape,
                label,
            },
        });
        diagram.statements.push(Statement::Click { id: id.clone() });
        diagram.nodes.push(id.clone());

        let mut children = Vec::new();
        for child_type in &spec.children {
            let Some(child_spec) = schema.get(child_type) else {
                continue;
            };
            for child in frame.node.collection(&child_spec.collection) {
                children.push(Frame {
                    type_name: child_type,
                    node: child,
                    parent: Some(id.clone()),
                    depth: frame.depth + 1,
                });
            }
        }
        stack.extend(children.into_iter().rev());
    }

    Ok(diagram)
}
