use std::collections::BTreeMap;

use crate::constants::CLASS_FIELD;

use super::{NxNode, NxValue};

/// An owned, in-memory node of the hierarchical file tree.
///
/// Groups are built with [`MemNode::group`], fields with [`MemNode::field`]. A field's
/// dimensions default to `[len]` of its value; multi-dimensional fields declare their
/// shape with [`MemNode::with_dims`].
///
/// ```rust
/// use nexingest::node::{MemNode, NxNode};
///
/// let data = MemNode::group("data", "NXdata")
///     .with_child(MemNode::field("time_of_flight", vec![1.0, 2.0, 3.0]).with_attr("axis", 1))
///     .with_child(
///         MemNode::field("data", vec![0.0; 6])
///             .with_dims([2, 3])
///             .with_attr("signal", 1),
///     );
///
/// assert_eq!(data.child_by_name("data").unwrap().dimensions(), &[2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemNode {
    name: String,
    class: String,
    attributes: BTreeMap<String, NxValue>,
    children: Vec<MemNode>,
    dims: Vec<usize>,
    value: Option<NxValue>,
}

impl MemNode {
    /// Create a group node with the given class label.
    pub fn group(name: impl Into<String>, class: impl Into<String>) -> Self {
        MemNode {
            name: name.into(),
            class: class.into(),
            ..Default::default()
        }
    }

    /// Create a field node holding `value`.
    pub fn field(name: impl Into<String>, value: impl Into<NxValue>) -> Self {
        let value = value.into();
        MemNode {
            name: name.into(),
            class: CLASS_FIELD.to_string(),
            dims: vec![value.len()],
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<NxValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: MemNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = MemNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_dims(mut self, dims: impl IntoIterator<Item = usize>) -> Self {
        self.dims = dims.into_iter().collect();
        self
    }

    pub fn push_child(&mut self, child: MemNode) {
        self.children.push(child);
    }
}

impl NxNode for MemNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> &str {
        &self.class
    }

    fn attribute(&self, name: &str) -> Option<&NxValue> {
        self.attributes.get(name)
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child(&self, index: usize) -> Option<&Self> {
        self.children.get(index)
    }

    fn dimensions(&self) -> &[usize] {
        &self.dims
    }

    fn value(&self) -> Option<&NxValue> {
        self.value.as_ref()
    }
}
