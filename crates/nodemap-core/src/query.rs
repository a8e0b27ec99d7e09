//! Query paths and their compiled tree form

use crate::error::{Error, Result};
use crate::label::Label;
use serde::{Deserialize, Serialize};

/// One element of a query path
///
/// In JSON a string is a hop and a nested array is a branch:
/// `["Contact", ["PersonName"], ["Academy", "Director"]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathStep {
    /// Follow one edge-type and continue from the reached instances
    Hop(Label),
    /// A sub-path rooted at the current position; the position is kept for
    /// whatever follows the branch
    Branch(Vec<PathStep>),
}

impl PathStep {
    pub fn hop(label: impl Into<Label>) -> Self {
        Self::Hop(label.into())
    }

    /// A branch made of a linear run of hops
    pub fn chain<L: Into<Label>>(labels: impl IntoIterator<Item = L>) -> Self {
        Self::Branch(labels.into_iter().map(|l| Self::hop(l)).collect())
    }
}

impl From<&str> for PathStep {
    fn from(s: &str) -> Self {
        Self::hop(s)
    }
}

/// Declarative path specification; the first step names the root type label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryPath {
    pub steps: Vec<PathStep>,
}

impl QueryPath {
    /// Start a path at every instance of `label`
    pub fn root(label: impl Into<Label>) -> Self {
        Self {
            steps: vec![PathStep::hop(label)],
        }
    }

    pub fn from_steps(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    /// Parse the JSON form, e.g. `["Contact", "Academy", ["Director"]]`
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn hop(mut self, label: impl Into<Label>) -> Self {
        self.steps.push(PathStep::hop(label));
        self
    }

    pub fn branch(mut self, steps: Vec<PathStep>) -> Self {
        self.steps.push(PathStep::Branch(steps));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<S: Into<PathStep>> FromIterator<S> for QueryPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Compiled query: each node holds an edge-type label (the root holds the
/// root type label) and the hops that follow it, in path order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryTree {
    pub label: Label,
    pub children: Vec<QueryTree>,
}

impl QueryTree {
    pub fn new(label: impl Into<Label>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Compile a path into a traversal tree. Pure; never touches a store.
    pub fn compile(path: &QueryPath) -> Result<Self> {
        let Some((first, rest)) = path.steps.split_first() else {
            return Err(Error::EmptyQuery);
        };
        let PathStep::Hop(root_label) = first else {
            return Err(Error::InvalidQuery(
                "path must start with a root type label".to_string(),
            ));
        };

        let mut root = Self::new(root_label.clone());
        Self::attach(&mut root, rest)?;

        tracing::trace!("Compiled query rooted at {} (depth {})", root.label, root.depth());
        Ok(root)
    }

    fn attach(node: &mut QueryTree, steps: &[PathStep]) -> Result<()> {
        let Some((step, rest)) = steps.split_first() else {
            return Ok(());
        };
        match step {
            PathStep::Hop(label) => {
                let mut child = Self::new(label.clone());
                Self::attach(&mut child, rest)?;
                node.children.push(child);
            }
            PathStep::Branch(sub) => {
                if sub.is_empty() {
                    return Err(Error::InvalidQuery(format!(
                        "empty branch after '{}'",
                        node.label
                    )));
                }
                Self::attach(node, sub)?;
                Self::attach(node, rest)?;
            }
        }
        Ok(())
    }

    /// Number of hops along the longest root-to-leaf chain
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(nodes: &[QueryTree]) -> Vec<&str> {
        nodes.iter().map(|n| n.label.as_str()).collect()
    }

    #[test]
    fn test_empty_path_rejected() {
        let err = QueryTree::compile(&QueryPath::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyQuery));
    }

    #[test]
    fn test_branch_as_root_rejected() {
        let path = QueryPath::from_steps(vec![PathStep::chain(["Contact"])]);
        assert!(matches!(
            QueryTree::compile(&path),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_empty_branch_rejected() {
        let path = QueryPath::root("Contact").branch(vec![]);
        assert!(matches!(
            QueryTree::compile(&path),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_linear_path_compiles_to_chain() {
        let path: QueryPath = ["Contact", "Academy", "Director", "PersonName"]
            .into_iter()
            .collect();
        let tree = QueryTree::compile(&path).unwrap();

        assert_eq!(tree.label.as_str(), "Contact");
        assert_eq!(tree.depth(), 3);
        let academy = &tree.children[0];
        assert_eq!(labels(&tree.children), vec!["Academy"]);
        assert_eq!(labels(&academy.children), vec!["Director"]);
        assert_eq!(labels(&academy.children[0].children), vec!["PersonName"]);
        assert!(academy.children[0].children[0].is_leaf());
    }

    #[test]
    fn test_branches_become_siblings() {
        let path = QueryPath::root("Contact")
            .branch(vec![PathStep::hop("PersonName")])
            .branch(vec![PathStep::hop("PersonLastname")])
            .branch(vec![
                PathStep::hop("Academy"),
                PathStep::chain(["WebSiteURL"]),
                PathStep::chain(["Director", "PersonName"]),
            ]);
        let tree = QueryTree::compile(&path).unwrap();

        assert_eq!(
            labels(&tree.children),
            vec!["PersonName", "PersonLastname", "Academy"]
        );
        let academy = &tree.children[2];
        assert_eq!(labels(&academy.children), vec!["WebSiteURL", "Director"]);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_hop_after_branch_continues_at_branch_point() {
        let path = QueryPath::root("Academy")
            .branch(vec![PathStep::hop("WebSiteURL")])
            .hop("Director")
            .hop("PersonName");
        let tree = QueryTree::compile(&path).unwrap();

        assert_eq!(labels(&tree.children), vec!["WebSiteURL", "Director"]);
        assert_eq!(labels(&tree.children[1].children), vec!["PersonName"]);
    }

    #[test]
    fn test_path_from_json() {
        let path =
            QueryPath::from_json(r#"["Contact", "PersonName", ["Academy", "Director"]]"#).unwrap();

        assert_eq!(
            path.steps,
            vec![
                PathStep::hop("Contact"),
                PathStep::hop("PersonName"),
                PathStep::chain(["Academy", "Director"]),
            ]
        );
        assert!(QueryPath::from_json(r#"{"root": "Contact"}"#).is_err());
    }
}
