//! Colored trees and their text form.
//!
//! A colored tree is stored as an arena of [`TreeNode`]s indexed by integer
//! id, root first. The text grammar is
//!
//! ```text
//! node      := edgeLabel? '[' symbol (',' colorId)? ']' ('(' node* ')')?
//! edgeLabel := '' | '=' | '#' | 'p'
//! ```
//!
//! for single, double, triple, and aromatic edges. A color ties together all
//! nodes that stand for one graph vertex: it occurs on at least two nodes and
//! at most one of them carries children.

use std::{collections::BTreeMap, fmt::Display};

use crate::{error::FormatError, molecule::Bond};

/// One occurrence of a graph vertex in a [`ColoredTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    symbol: String,
    color: Option<usize>,
    edge: Option<Bond>,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl TreeNode {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn color(&self) -> Option<usize> {
        self.color
    }

    /// Label of the edge to the parent; `None` on the root.
    pub fn edge(&self) -> Option<Bond> {
        self.edge
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A rooted tree over occurrences of graph vertices, with colors marking the
/// occurrences that stand for the same vertex.
#[derive(Debug, Clone, Default)]
pub struct ColoredTree {
    nodes: Vec<TreeNode>,
}

impl ColoredTree {
    /// Construct a tree holding only a root.
    pub fn with_root(symbol: impl Into<String>, color: Option<usize>) -> Self {
        Self {
            nodes: vec![TreeNode {
                symbol: symbol.into(),
                color,
                edge: None,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Append a child under `parent` and return its id.
    pub fn push_child(
        &mut self,
        parent: usize,
        edge: Bond,
        symbol: impl Into<String>,
        color: Option<usize>,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            symbol: symbol.into(),
            color,
            edge: Some(edge),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Id of the root, `None` for an empty tree.
    pub fn root(&self) -> Option<usize> {
        (!self.nodes.is_empty()).then_some(0)
    }

    pub fn node(&self, id: usize) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in pre-order (the order of the text form).
    pub fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.root().into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        order
    }

    /// Number of nodes carrying each color.
    pub fn color_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for color in self.nodes.iter().filter_map(|n| n.color) {
            *counts.entry(color).or_insert(0) += 1;
        }
        counts
    }

    /// Check the closure rules: every color occurs at least twice and is
    /// expanded (carries children) on at most one node.
    ///
    /// A color may occur more than twice. In the 3-cube seen from one corner
    /// the opposite corner is reached from three parents, so its color is
    /// written three times.
    pub fn validate(&self) -> Result<(), FormatError> {
        let mut expanded: BTreeMap<usize, usize> = BTreeMap::new();
        for node in self.nodes.iter().filter(|n| !n.is_leaf()) {
            if let Some(color) = node.color {
                *expanded.entry(color).or_insert(0) += 1;
            }
        }
        for (color, count) in self.color_counts() {
            if count < 2 {
                return Err(FormatError::UnclosedColor { color });
            }
            if expanded.get(&color).is_some_and(|&n| n > 1) {
                return Err(FormatError::ColorDefinedTwice { color });
            }
        }
        Ok(())
    }

    /// Parse the text form of a colored tree.
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let mut parser = Parser {
            chars: text.char_indices().collect(),
            pos: 0,
            len: text.len(),
        };
        let tree = parser.parse_tree()?;
        tree.validate()?;
        Ok(tree)
    }

    fn same_subtree(&self, a: usize, other: &ColoredTree, b: usize) -> bool {
        let (x, y) = (&self.nodes[a], &other.nodes[b]);
        x.symbol == y.symbol
            && x.color == y.color
            && x.edge == y.edge
            && x.children.len() == y.children.len()
            && x.children
                .iter()
                .zip(&y.children)
                .all(|(&ca, &cb)| self.same_subtree(ca, other, cb))
    }

    fn write_node(&self, id: usize, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let node = &self.nodes[id];
        if let Some(edge) = node.edge {
            write!(f, "{}", edge.token())?;
        }
        match node.color {
            Some(color) => write!(f, "[{},{}]", node.symbol, color)?,
            None => write!(f, "[{}]", node.symbol)?,
        }
        if !node.children.is_empty() {
            write!(f, "(")?;
            for &child in &node.children {
                self.write_node(child, f)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Trees are equal when their shapes, labels and colors agree, whatever the
/// arena order.
impl PartialEq for ColoredTree {
    fn eq(&self, other: &Self) -> bool {
        match (self.root(), other.root()) {
            (Some(a), Some(b)) => self.same_subtree(a, other, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for ColoredTree {}

impl Display for ColoredTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.root() {
            Some(root) => self.write_node(root, f),
            None => Ok(()),
        }
    }
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
    len: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    /// Byte offset of the current character.
    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.len, |&(i, _)| i)
    }

    fn parse_tree(&mut self) -> Result<ColoredTree, FormatError> {
        match self.peek() {
            None => return Err(FormatError::EmptyInput),
            Some('[') => {}
            Some(']') => {
                return Err(FormatError::UnbalancedBracket {
                    position: self.offset(),
                })
            }
            Some(found) => {
                return Err(FormatError::UnexpectedCharacter {
                    found,
                    position: self.offset(),
                })
            }
        }
        let (symbol, color) = self.parse_atom()?;
        let mut tree = ColoredTree::with_root(symbol, color);

        // Open '(' groups, each remembering the node it belongs to and where
        // it was opened.
        let mut open: Vec<(usize, usize)> = Vec::new();
        let mut last = 0;
        loop {
            match self.peek() {
                None => {
                    return match open.last() {
                        Some(&(_, position)) => {
                            Err(FormatError::UnbalancedParenthesis { position })
                        }
                        None => Ok(tree),
                    };
                }
                Some('(') => {
                    open.push((last, self.offset()));
                    self.pos += 1;
                }
                Some(')') => {
                    let position = self.offset();
                    let (owner, _) = open
                        .pop()
                        .ok_or(FormatError::UnbalancedParenthesis { position })?;
                    last = owner;
                    self.pos += 1;
                }
                Some(c) => {
                    let Some(&(parent, _)) = open.last() else {
                        return Err(FormatError::UnexpectedCharacter {
                            found: c,
                            position: self.offset(),
                        });
                    };
                    let edge = self.parse_edge()?;
                    let (symbol, color) = self.parse_atom()?;
                    last = tree.push_child(parent, edge, symbol, color);
                }
            }
        }
    }

    fn parse_edge(&mut self) -> Result<Bond, FormatError> {
        let position = self.offset();
        match self.peek() {
            Some('[') => Ok(Bond::Single),
            Some(']') => Err(FormatError::UnbalancedBracket { position }),
            Some(token) => {
                let bond = Bond::from_token(token)
                    .map_err(|_| FormatError::UnknownEdgeToken { token, position })?;
                self.pos += 1;
                match self.peek() {
                    Some('[') => Ok(bond),
                    Some(found) => Err(FormatError::UnexpectedCharacter {
                        found,
                        position: self.offset(),
                    }),
                    None => Err(FormatError::UnbalancedBracket {
                        position: self.offset(),
                    }),
                }
            }
            None => Err(FormatError::UnbalancedBracket { position }),
        }
    }

    /// Parse `'[' symbol (',' colorId)? ']'`, starting on the '['.
    fn parse_atom(&mut self) -> Result<(String, Option<usize>), FormatError> {
        let open = self.offset();
        self.pos += 1;

        let mut symbol = String::new();
        let mut color: Option<String> = None;
        loop {
            match self.peek() {
                None | Some('[') | Some('(') | Some(')') => {
                    return Err(FormatError::UnbalancedBracket { position: open })
                }
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some(',') if color.is_none() => {
                    color = Some(String::new());
                    self.pos += 1;
                }
                Some(c) => {
                    match color.as_mut() {
                        Some(digits) => digits.push(c),
                        None => symbol.push(c),
                    }
                    self.pos += 1;
                }
            }
        }

        if symbol.is_empty() {
            return Err(FormatError::EmptySymbol { position: open });
        }
        let color = match color {
            Some(digits) => {
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(FormatError::InvalidColor { position: open });
                }
                Some(
                    digits
                        .parse()
                        .map_err(|_| FormatError::InvalidColor { position: open })?,
                )
            }
            None => None,
        };
        Ok((symbol, color))
    }
}
