//! # Node interface
//!
//! The ingestion pipeline never reads bytes from a container file. It walks an
//! already-materialized tree through the [`NxNode`] trait, which exposes for each
//! element of the tree:
//!
//! - its **name** and **class** label (`NXentry`, `NXdata`, `NXdetector`, `SDS`, ...),
//! - its **attributes** as typed [`NxValue`]s,
//! - its **children**, by index or by name (first match wins),
//! - its **dimensions** and raw **value** when it is a field.
//!
//! [`MemNode`] is an owned in-memory implementation with a builder API, used by
//! the tests and by hosts that assemble trees programmatically. A reader for an
//! actual container format implements [`NxNode`] over its own handles.
//!
//! The provided helpers (`field_f64s`, `text_attribute`, ...) mirror the lookup
//! utilities every reader ends up writing: they return `None` as soon as one
//! step of the lookup is missing.
pub mod mem_node;
pub mod nx_value;

pub use mem_node::MemNode;
pub use nx_value::NxValue;

/// Read access to one element of the hierarchical file tree.
pub trait NxNode {
    fn name(&self) -> &str;

    fn class(&self) -> &str;

    fn attribute(&self, name: &str) -> Option<&NxValue>;

    fn child_count(&self) -> usize;

    fn child(&self, index: usize) -> Option<&Self>;

    /// Shape of the field; empty for groups.
    fn dimensions(&self) -> &[usize];

    /// Raw value of the field; `None` for groups.
    fn value(&self) -> Option<&NxValue>;

    /// Iterate over the children in declaration order.
    fn children(&self) -> Children<'_, Self>
    where
        Self: Sized,
    {
        Children {
            node: self,
            next: 0,
        }
    }

    /// First child named `name`.
    fn child_by_name(&self, name: &str) -> Option<&Self>
    where
        Self: Sized,
    {
        let name = name.trim();
        self.children().find(|child| child.name() == name)
    }

    /// First child whose class label is `class`.
    fn child_by_class(&self, class: &str) -> Option<&Self>
    where
        Self: Sized,
    {
        self.children().find(|child| child.class() == class)
    }

    fn text_attribute(&self, name: &str) -> Option<String> {
        self.attribute(name).and_then(NxValue::to_text)
    }

    fn int_attribute(&self, name: &str) -> Option<i64> {
        self.attribute(name).and_then(NxValue::as_i64)
    }

    fn f64_attribute(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(NxValue::as_f64)
    }

    /// Values of the child field `field` as floats.
    fn field_f64s(&self, field: &str) -> Option<Vec<f64>>
    where
        Self: Sized,
    {
        self.child_by_name(field)?.value()?.to_f64_vec()
    }

    /// Values of the child field `field` as integers.
    fn field_i64s(&self, field: &str) -> Option<Vec<i64>>
    where
        Self: Sized,
    {
        self.child_by_name(field)?.value()?.to_i64_vec()
    }

    fn field_f64(&self, field: &str) -> Option<f64>
    where
        Self: Sized,
    {
        self.child_by_name(field)?.value()?.as_f64()
    }

    fn field_text(&self, field: &str) -> Option<String>
    where
        Self: Sized,
    {
        self.child_by_name(field)?.value()?.to_text()
    }
}

/// Iterator over the children of a node, see [`NxNode::children`].
#[derive(Debug)]
pub struct Children<'a, N> {
    node: &'a N,
    next: usize,
}

impl<'a, N: NxNode> Iterator for Children<'a, N> {
    type Item = &'a N;

    fn next(&mut self) -> Option<Self::Item> {
        let child = self.node.child(self.next)?;
        self.next += 1;
        Some(child)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.node.child_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

/// Slash-separated path of a child below `parent` (`"/entry"` + `"data"` → `"/entry/data"`).
pub fn join_path(parent: &str, name: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), name.trim())
}
