//! # Marks
//!
//! Inline formatting values attached to text nodes.
//!
//! A [`MarkSet`] never holds two equal marks. Adding a mark drops every mark
//! whose type the new mark's type excludes.
//!
//! Attribute equality compares `serde_json::Value`s structurally, so nested
//! objects with equal contents are equal marks.

use std::fmt;
use std::sync::Arc;

use crate::json::MarkJson;
use crate::schema::{Attrs, MarkType, Schema};
use crate::ModelResult;

/// A mark instance: a type plus attributes
#[derive(Clone)]
pub struct Mark {
    mark_type: MarkType,
    attrs: Attrs,
}

impl Mark {
    pub(crate) fn new(mark_type: MarkType, attrs: Attrs) -> Self {
        Self { mark_type, attrs }
    }

    pub fn mark_type(&self) -> &MarkType {
        &self.mark_type
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn is_in_set(&self, set: &MarkSet) -> bool {
        set.iter().any(|mark| mark == self)
    }

    /// Add this mark to `set`.
    ///
    /// Returns `set` itself (same allocation) when the mark is already there.
    pub fn add_to_set(&self, set: &MarkSet) -> MarkSet {
        if self.is_in_set(set) {
            return set.clone();
        }
        let mut marks: Vec<Mark> = set
            .iter()
            .filter(|mark| !self.mark_type.excludes(mark.mark_type()))
            .cloned()
            .collect();
        marks.push(self.clone());
        MarkSet::from(marks)
    }

    pub fn remove_from_set(&self, set: &MarkSet) -> MarkSet {
        if !self.is_in_set(set) {
            return set.clone();
        }
        set.iter().filter(|mark| *mark != self).cloned().collect()
    }

    pub fn to_json(&self) -> MarkJson {
        MarkJson {
            mark_type: self.mark_type.name().to_string(),
            attrs: self.attrs.clone(),
        }
    }

    pub fn from_json(schema: &Schema, json: &MarkJson) -> ModelResult<Mark> {
        schema.mark_type(&json.mark_type)?.create(json.attrs.clone())
    }
}

impl PartialEq for Mark {
    fn eq(&self, other: &Self) -> bool {
        self.mark_type == other.mark_type && self.attrs == other.attrs
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attrs.is_empty() {
            write!(f, "{}", self.mark_type.name())
        } else {
            write!(f, "{}{:?}", self.mark_type.name(), self.attrs)
        }
    }
}

/// Ordered set of marks with no duplicates
#[derive(Clone)]
pub struct MarkSet(Arc<[Mark]>);

impl MarkSet {
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mark> {
        self.0.iter()
    }

    /// True if both sets share the same allocation
    pub fn ptr_eq(&self, other: &MarkSet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn contains_type(&self, mark_type: &MarkType) -> bool {
        mark_type.is_in_set(self).is_some()
    }

    /// Remove every mark of the given type
    pub fn without_type(&self, mark_type: &MarkType) -> MarkSet {
        if !self.contains_type(mark_type) {
            return self.clone();
        }
        self.iter()
            .filter(|mark| mark.mark_type() != mark_type)
            .cloned()
            .collect()
    }

    pub fn to_json(&self) -> Vec<MarkJson> {
        self.iter().map(Mark::to_json).collect()
    }

    /// Build a set from JSON, applying exclusion rules as marks are added
    pub fn from_json(schema: &Schema, json: &[MarkJson]) -> ModelResult<MarkSet> {
        json.iter().try_fold(MarkSet::empty(), |set, mark_json| {
            Ok(Mark::from_json(schema, mark_json)?.add_to_set(&set))
        })
    }
}

impl Default for MarkSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for MarkSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Debug for MarkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        Self(marks.into())
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
