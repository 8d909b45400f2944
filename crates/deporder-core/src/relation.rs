//! Node identity and ordering relations.
//!
//! A [`Node`] is nothing more than its name. A [`Relation`] is what a source
//! declares about itself (`before: x` or `after: x`); [`Relation::edge`]
//! normalizes it into the single `prerequisite → dependent` edge the graph
//! store works with.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name of an orderable item. Ordering is byte-lexicographic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Node(String);

impl Node {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Node {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Node {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Node {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Node {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Which side of the target the declaring item wants to be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The declaring item must be ordered ahead of the target.
    Before,
    /// The declaring item must be ordered behind the target.
    After,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown direction keyword.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown relation direction '{0}' (expected 'before' or 'after')")]
pub struct ParseDirectionError(String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            other => Err(ParseDirectionError(other.to_string())),
        }
    }
}

/// An ordering constraint declared by an item against a target name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub direction: Direction,
    pub target: Node,
}

impl Relation {
    #[must_use]
    pub fn before(target: impl Into<Node>) -> Self {
        Self {
            direction: Direction::Before,
            target: target.into(),
        }
    }

    #[must_use]
    pub fn after(target: impl Into<Node>) -> Self {
        Self {
            direction: Direction::After,
            target: target.into(),
        }
    }

    /// Normalize this relation, declared by `name`, into a
    /// `(prerequisite, dependent)` edge.
    ///
    /// `before(name, t)` yields `name → t`; `after(name, t)` yields `t → name`.
    #[must_use]
    pub fn edge(&self, name: &Node) -> (Node, Node) {
        match self.direction {
            Direction::Before => (name.clone(), self.target.clone()),
            Direction::After => (self.target.clone(), name.clone()),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.direction, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn before_points_from_declarer_to_target() {
        let edge = Relation::before("b").edge(&Node::from("a"));
        assert_eq!(edge, (Node::from("a"), Node::from("b")));
    }

    #[test]
    fn after_points_from_target_to_declarer() {
        let edge = Relation::after("a").edge(&Node::from("b"));
        assert_eq!(edge, (Node::from("a"), Node::from("b")));
    }

    #[test]
    fn direction_parses_lowercase_keywords() {
        assert_eq!("before".parse::<Direction>(), Ok(Direction::Before));
        assert_eq!("after".parse::<Direction>(), Ok(Direction::After));
        assert!("Before".parse::<Direction>().is_err());
    }

    #[test]
    fn nodes_order_bytewise() {
        let mut names: Vec<Node> = ["b", "B", "a", "aa"].into_iter().map(Node::from).collect();
        names.sort();
        let rendered: Vec<&str> = names.iter().map(Node::as_str).collect();
        assert_eq!(rendered, ["B", "a", "aa", "b"]);
    }

    #[test]
    fn relation_display_matches_declaration_syntax() {
        assert_eq!(Relation::after("base").to_string(), "after: base");
    }
}
