//! Arena-backed parse trees
//!
//! A [`ParseTree`] owns its nodes in one dense vector; nodes refer to each
//! other by [`NodeId`] index. Children are owned (a node's `children` list
//! is the only downward path); parent links are plain indices used for
//! upward navigation only, never for ownership. Each node carries an
//! optional [`Value`] data slot for downstream passes.
//!
//! Trees are created fresh per parse and never mutated by the parsing
//! engines after being returned.

use crate::lexer::Token;
use crate::value::Value;
use std::fmt;

/// Node index in a [`ParseTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// What a node represents
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A leaf wrapping a consumed token
    Terminal(Token),
    /// An interior node for a matched rule
    Rule(String),
}

/// One node of a parse tree
#[derive(Debug, Clone)]
pub struct ParseNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: Option<Value>,
}

impl ParseNode {
    /// The node kind
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The rule name, for interior nodes
    pub fn rule_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Rule(name) => Some(name),
            NodeKind::Terminal(_) => None,
        }
    }

    /// The wrapped token, for terminal nodes
    pub fn token(&self) -> Option<&Token> {
        match &self.kind {
            NodeKind::Terminal(token) => Some(token),
            NodeKind::Rule(_) => None,
        }
    }

    /// The attached data, if any
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

/// A parse tree: an arena of nodes plus a root
#[derive(Debug, Clone, Default)]
pub struct ParseTree {
    nodes: Vec<ParseNode>,
    root: Option<NodeId>,
}

impl ParseTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a terminal leaf
    pub fn add_terminal(&mut self, token: Token) -> NodeId {
        self.push(ParseNode {
            kind: NodeKind::Terminal(token),
            parent: None,
            children: Vec::new(),
            data: None,
        })
    }

    /// Add an interior rule node owning `children`
    ///
    /// The children's parent links are set to the new node.
    pub fn add_rule(&mut self, name: &str, children: Vec<NodeId>) -> NodeId {
        let id = self.push(ParseNode {
            kind: NodeKind::Rule(name.to_string()),
            parent: None,
            children: children.clone(),
            data: None,
        });
        for child in children {
            self.nodes[child.0 as usize].parent = Some(id);
        }
        id
    }

    fn push(&mut self, node: ParseNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Set the root node
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// The root node, if set
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Borrow a node
    pub fn node(&self, id: NodeId) -> &ParseNode {
        &self.nodes[id.0 as usize]
    }

    /// A node's children, in order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0 as usize].children
    }

    /// A node's parent, if any
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0 as usize].parent
    }

    /// Attach data to a node
    pub fn set_data(&mut self, id: NodeId, value: Value) {
        self.nodes[id.0 as usize].data = Some(value);
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the arena holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Roll the arena back to `len` nodes
    ///
    /// Used by the backtracking parser to discard nodes built during a
    /// failed production attempt.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    /// The tokens at the leaves under `id`, in input order
    pub fn leaves(&self, id: NodeId) -> Vec<&Token> {
        let mut tokens = Vec::new();
        self.collect_leaves(id, &mut tokens);
        tokens
    }

    fn collect_leaves<'a>(&'a self, id: NodeId, out: &mut Vec<&'a Token>) {
        match &self.nodes[id.0 as usize].kind {
            NodeKind::Terminal(token) => out.push(token),
            NodeKind::Rule(_) => {
                for &child in &self.nodes[id.0 as usize].children {
                    self.collect_leaves(child, out);
                }
            }
        }
    }

    fn format_node(&self, id: NodeId, indent: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..indent {
            write!(f, "  ")?;
        }
        match &self.nodes[id.0 as usize].kind {
            NodeKind::Terminal(token) => writeln!(f, "{} {:?}", token.kind, token.text),
            NodeKind::Rule(name) => {
                writeln!(f, "{}", name)?;
                for &child in &self.nodes[id.0 as usize].children {
                    self.format_node(child, indent + 1, f)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => self.format_node(root, 0, f),
            None => writeln!(f, "<empty tree>"),
        }
    }
}
