//! Dotted-path addressing into the node tree. Shared by the validator and
//! the engine; nothing else walks paths.

use thiserror::Error;

use crate::error::SceneplayError;
use crate::step::Step;
use crate::story::NodeTree;

pub const PATH_SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Node \"{path}\" does not exist (longest valid prefix: \"{reached}\").")]
    NodeNotFound { path: String, reached: String },
    #[error("Node path \"{path}\" names a group, not a step sequence.")]
    NodePathIsGroup { path: String },
}

impl ResolveError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NodeNotFound { .. } => "RESOLVE_NODE_NOT_FOUND",
            Self::NodePathIsGroup { .. } => "RESOLVE_NODE_IS_GROUP",
        }
    }
}

impl From<ResolveError> for SceneplayError {
    fn from(error: ResolveError) -> Self {
        SceneplayError::new(error.code(), error.to_string())
    }
}

pub fn resolve<'a>(tree: &'a NodeTree, path: &str) -> Result<&'a [Step], ResolveError> {
    let mut current = tree;
    let mut reached: Vec<&str> = Vec::new();

    for segment in path.split(PATH_SEPARATOR) {
        let child = match current {
            NodeTree::Group(children) => children.get(segment),
            NodeTree::Leaf(_) => None,
        };
        let Some(child) = child else {
            return Err(ResolveError::NodeNotFound {
                path: path.to_string(),
                reached: reached.join("."),
            });
        };
        reached.push(segment);
        current = child;
    }

    match current {
        NodeTree::Leaf(steps) => Ok(steps),
        NodeTree::Group(_) => Err(ResolveError::NodePathIsGroup {
            path: path.to_string(),
        }),
    }
}

/// Every leaf with its dotted path, depth-first in key order.
pub fn leaves(tree: &NodeTree) -> Vec<(String, &[Step])> {
    let mut out = Vec::new();
    if let NodeTree::Group(children) = tree {
        for (name, child) in children {
            collect_leaves(child, name.clone(), &mut out);
        }
    }
    out
}

fn collect_leaves<'a>(tree: &'a NodeTree, path: String, out: &mut Vec<(String, &'a [Step])>) {
    match tree {
        NodeTree::Leaf(steps) => out.push((path, steps.as_slice())),
        NodeTree::Group(children) => {
            for (name, child) in children {
                collect_leaves(child, format!("{}{}{}", path, PATH_SEPARATOR, name), out);
            }
        }
    }
}

pub fn collect_leaf_paths(tree: &NodeTree) -> Vec<String> {
    leaves(tree).into_iter().map(|(path, _)| path).collect()
}
