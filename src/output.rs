//! Output-element tree used to describe a projection.
//!
//! Callers that shape rows into nested documents describe the target layout
//! as a tree of groups and leaves, where each leaf carries the field path it
//! pulls from a row. [`flatten`] walks that tree depth-first and returns the
//! ordered path list that [`crate::Bridge::execute_with`] consumes.

/// One node of a projection layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputElement {
    /// Terminal node bound to a field path such as `result.items[0].name`.
    Leaf(String),
    /// Container node holding nested elements.
    Group(Vec<OutputElement>),
}

impl OutputElement {
    /// Convenience constructor for a leaf from any string-ish path.
    pub fn leaf(path: impl Into<String>) -> Self {
        Self::Leaf(path.into())
    }
}

/// Flattens a projection tree into its leaf paths, depth-first, preserving
/// declaration order.
pub fn flatten(elements: &[OutputElement]) -> Vec<String> {
    let mut paths = Vec::new();
    collect(elements, &mut paths);
    paths
}

fn collect(elements: &[OutputElement], paths: &mut Vec<String>) {
    for element in elements {
        match element {
            OutputElement::Leaf(path) => paths.push(path.clone()),
            OutputElement::Group(children) => collect(children, paths),
        }
    }
}
