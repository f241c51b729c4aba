//! Core data model types for ingestion.
//!
//! Every ingestion path produces (or mutates) a [`DataContainer`]: a shared handle to a node that
//! holds either a flat sequence of [`Scalar`]s (a *leaf*) or an ordered list of child containers
//! (a *branch*). Children keep a non-owning back-reference to their parent.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use serde::{Serialize, Serializer};

use crate::error::{IngestionError, IngestionResult};

/// A single value stored in a leaf container.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Missing value (ragged CSV rows, JSON `null`, absent record keys).
    Null,
    /// 64-bit float.
    Number(f64),
    /// Exact integer, as written in a JSON source.
    Integer(i64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 text, kept exactly as it appeared in the source.
    Text(String),
}

impl Scalar {
    /// Returns the numeric value of a [`Scalar::Number`] or [`Scalar::Integer`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the exact value, if this is a [`Scalar::Integer`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text, if this is a [`Scalar::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn parse_number(&self) -> Option<Self> {
        match self {
            Self::Null | Self::Number(_) | Self::Integer(_) => Some(self.clone()),
            Self::Text(s) => s.trim().parse::<f64>().ok().map(Self::Number),
            Self::Bool(_) => None,
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// The content of a container: either scalars (leaf) or children (branch).
#[derive(Debug, Clone)]
pub enum Payload {
    /// Flat ordered sequence of scalars.
    Values(Vec<Scalar>),
    /// Ordered sequence of child containers.
    Children(Vec<DataContainer>),
}

impl Default for Payload {
    fn default() -> Self {
        Self::Values(Vec::new())
    }
}

impl From<Vec<Scalar>> for Payload {
    fn from(v: Vec<Scalar>) -> Self {
        Self::Values(v)
    }
}

impl From<Vec<f64>> for Payload {
    fn from(v: Vec<f64>) -> Self {
        Self::Values(v.into_iter().map(Scalar::Number).collect())
    }
}

impl From<Vec<f32>> for Payload {
    fn from(v: Vec<f32>) -> Self {
        Self::Values(v.into_iter().map(Scalar::from).collect())
    }
}

impl From<&[f32]> for Payload {
    fn from(v: &[f32]) -> Self {
        Self::Values(v.iter().copied().map(Scalar::from).collect())
    }
}

impl From<String> for Payload {
    fn from(v: String) -> Self {
        Self::Values(vec![Scalar::Text(v)])
    }
}

impl From<Vec<DataContainer>> for Payload {
    fn from(v: Vec<DataContainer>) -> Self {
        Self::Children(v)
    }
}

#[derive(Debug, Default)]
struct Node {
    payload: Payload,
    label: Option<String>,
    parent: Weak<RwLock<Node>>,
    block_width: Option<usize>,
}

/// Hierarchical numeric/label container.
///
/// `DataContainer` is a cheap, clonable handle: clones refer to the same node, and
/// [`DataContainer::ptr_eq`] tells whether two handles are the same container. Mutating methods
/// take `&self` and return `&Self` so calls can be chained:
///
/// ```rust
/// use datatree_ingest::types::{DataContainer, Scalar};
///
/// let c = DataContainer::new();
/// c.set(vec![0.0_f64, 0.5, 1.0, 0.25]).with_label("brightness").with_block_width(2);
///
/// assert_eq!(c.len(), 4);
/// assert_eq!(c.rows().unwrap()[1], vec![Scalar::Number(1.0), Scalar::Number(0.25)]);
/// ```
#[derive(Clone, Default)]
pub struct DataContainer {
    node: Arc<RwLock<Node>>,
}

impl DataContainer {
    /// Create an empty leaf container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a leaf container holding `values`.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        let c = Self::new();
        c.set(values.into_iter().map(Into::into).collect::<Vec<Scalar>>());
        c
    }

    /// Create a branch container owning `children` (their parent is set to the new branch).
    pub fn branch(children: Vec<DataContainer>) -> Self {
        let c = Self::new();
        c.set(children);
        c
    }

    fn read(&self) -> RwLockReadGuard<'_, Node> {
        self.node.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Node> {
        self.node.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the whole payload.
    ///
    /// When the payload holds children, each child is re-parented to `self` (and removed from
    /// any other branch that listed it). Children dropped from the previous payload lose their
    /// parent link.
    pub fn set(&self, payload: impl Into<Payload>) -> &Self {
        let payload = payload.into();

        if let Payload::Children(children) = &payload {
            for child in children {
                if let Some(previous) = child.parent() {
                    if !previous.ptr_eq(self) {
                        previous.detach(child);
                    }
                }
                child.write().parent = Arc::downgrade(&self.node);
            }
        }

        let old = std::mem::replace(&mut self.write().payload, payload);

        if let Payload::Children(old_children) = old {
            for child in old_children {
                if !self.contains_child(&child) && child.is_child_of(self) {
                    child.write().parent = Weak::new();
                }
            }
        }
        self
    }

    /// Move the payload, label and block width of `source` into `self`.
    ///
    /// Children of `source` are re-parented to `self`. Used to populate a container that was
    /// handed out before its content was available.
    pub fn adopt(&self, source: &DataContainer) -> &Self {
        if source.ptr_eq(self) {
            return self;
        }
        let (payload, label, block_width) = {
            let mut node = source.write();
            (
                std::mem::take(&mut node.payload),
                node.label.take(),
                node.block_width.take(),
            )
        };
        self.set(payload);
        let mut node = self.write();
        node.label = label;
        node.block_width = block_width;
        drop(node);
        self
    }

    fn detach(&self, child: &DataContainer) {
        if let Payload::Children(list) = &mut self.write().payload {
            list.retain(|c| !c.ptr_eq(child));
        }
    }

    fn contains_child(&self, child: &DataContainer) -> bool {
        match &self.read().payload {
            Payload::Children(list) => list.iter().any(|c| c.ptr_eq(child)),
            Payload::Values(_) => false,
        }
    }

    fn is_child_of(&self, parent: &DataContainer) -> bool {
        std::ptr::eq(self.read().parent.as_ptr(), Arc::as_ptr(&parent.node))
    }

    /// Set the label.
    pub fn with_label(&self, label: impl Into<String>) -> &Self {
        self.write().label = Some(label.into());
        self
    }

    /// Point the parent link at `parent`.
    ///
    /// This is navigational only: `parent`'s payload is not touched. Use [`DataContainer::set`]
    /// on the branch to actually adopt a child.
    pub fn with_parent(&self, parent: &DataContainer) -> &Self {
        self.write().parent = Arc::downgrade(&parent.node);
        self
    }

    /// Set the row width used by [`DataContainer::rows`].
    pub fn with_block_width(&self, width: usize) -> &Self {
        self.write().block_width = Some(width);
        self
    }

    pub fn label(&self) -> Option<String> {
        self.read().label.clone()
    }

    /// The enclosing branch, if it is still alive.
    pub fn parent(&self) -> Option<DataContainer> {
        self.read().parent.upgrade().map(|node| DataContainer { node })
    }

    pub fn block_width(&self) -> Option<usize> {
        self.read().block_width
    }

    /// Returns `true` if both handles refer to the same container.
    pub fn ptr_eq(&self, other: &DataContainer) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.read().payload, Payload::Values(_))
    }

    pub fn is_branch(&self) -> bool {
        !self.is_leaf()
    }

    /// Number of scalars (leaf) or children (branch).
    pub fn len(&self) -> usize {
        match &self.read().payload {
            Payload::Values(v) => v.len(),
            Payload::Children(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone of the current payload.
    pub fn payload(&self) -> Payload {
        self.read().payload.clone()
    }

    /// Snapshot of the scalars, or `None` for a branch.
    pub fn values(&self) -> Option<Vec<Scalar>> {
        self.read_values(<[Scalar]>::to_vec)
    }

    /// Run `f` against the scalars without cloning them. Returns `None` for a branch.
    pub fn read_values<R>(&self, f: impl FnOnce(&[Scalar]) -> R) -> Option<R> {
        match &self.read().payload {
            Payload::Values(v) => Some(f(v)),
            Payload::Children(_) => None,
        }
    }

    /// Snapshot of the children (empty for a leaf).
    pub fn children(&self) -> Vec<DataContainer> {
        match &self.read().payload {
            Payload::Children(c) => c.clone(),
            Payload::Values(_) => Vec::new(),
        }
    }

    /// First child whose label equals `label`.
    pub fn child(&self, label: &str) -> Option<DataContainer> {
        self.children()
            .into_iter()
            .find(|c| c.label().as_deref() == Some(label))
    }

    /// Leaf values split into rows of `block_width` (a single row when no width is set).
    ///
    /// Returns `None` for a branch.
    pub fn rows(&self) -> Option<Vec<Vec<Scalar>>> {
        let node = self.read();
        let Payload::Values(values) = &node.payload else {
            return None;
        };
        match node.block_width {
            Some(w) if w > 0 => Some(values.chunks(w).map(<[Scalar]>::to_vec).collect()),
            _ => Some(vec![values.clone()]),
        }
    }

    /// Returns `true` if every scalar (recursively, for a branch) is a number, null, or text that
    /// parses as a number.
    pub fn is_numeric_parsable(&self) -> bool {
        match &self.read().payload {
            Payload::Values(v) => v.iter().all(|s| s.parse_number().is_some()),
            Payload::Children(c) => c.iter().all(DataContainer::is_numeric_parsable),
        }
    }

    /// Convert textual scalars to numbers in place (recursively for a branch).
    ///
    /// Parsing never happens implicitly during ingestion; callers opt in here. Nothing is
    /// modified if any value cannot be parsed.
    pub fn coerce_numeric(&self) -> IngestionResult<&Self> {
        if !self.is_numeric_parsable() {
            return Err(IngestionError::type_mismatch(format!(
                "container '{}' holds values that do not parse as numbers",
                self.label().unwrap_or_default()
            )));
        }
        self.coerce_unchecked();
        Ok(self)
    }

    fn coerce_unchecked(&self) {
        let children = {
            let mut node = self.write();
            match &mut node.payload {
                Payload::Values(values) => {
                    for v in values.iter_mut() {
                        if let Some(n) = v.parse_number() {
                            *v = n;
                        }
                    }
                    return;
                }
                Payload::Children(c) => c.clone(),
            }
        };
        for child in &children {
            child.coerce_unchecked();
        }
    }

    /// JSON snapshot of the container tree (labels, block widths, values/children).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Serialize)]
struct Snapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_width: Option<usize>,
    #[serde(flatten)]
    payload: SnapshotPayload,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum SnapshotPayload {
    Values(Vec<Scalar>),
    Children(Vec<Snapshot>),
}

impl DataContainer {
    fn snapshot(&self) -> Snapshot {
        let node = self.read();
        let payload = match &node.payload {
            Payload::Values(v) => SnapshotPayload::Values(v.clone()),
            Payload::Children(c) => SnapshotPayload::Children(c.iter().map(DataContainer::snapshot).collect()),
        };
        Snapshot {
            label: node.label.clone(),
            block_width: node.block_width,
            payload,
        }
    }
}

impl Serialize for DataContainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl fmt::Debug for DataContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.read();
        f.debug_struct("DataContainer")
            .field("label", &node.label)
            .field("block_width", &node.block_width)
            .field("payload", &node.payload)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{DataContainer, Payload, Scalar};
    use crate::error::ErrorKind;

    fn text_leaf(label: &str, values: &[&str]) -> DataContainer {
        let c = DataContainer::from_values(values.iter().copied());
        c.with_label(label);
        c
    }

    #[test]
    fn set_links_children_to_branch() {
        let a = text_leaf("a", &["1", "3"]);
        let b = text_leaf("b", &["2", "4"]);
        let top = DataContainer::new();
        top.set(vec![a.clone(), b.clone()]);

        assert!(top.is_branch());
        assert_eq!(top.len(), 2);
        assert!(a.parent().unwrap().ptr_eq(&top));
        assert!(b.parent().unwrap().ptr_eq(&top));
        assert!(top.child("b").unwrap().ptr_eq(&b));
        assert!(top.child("missing").is_none());
    }

    #[test]
    fn setting_child_under_new_owner_repoints_and_detaches() {
        let a = text_leaf("a", &["x"]);
        let first = DataContainer::branch(vec![a.clone()]);
        let second = DataContainer::branch(vec![a.clone()]);

        assert!(a.parent().unwrap().ptr_eq(&second));
        assert!(first.is_empty());
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn replacing_payload_clears_dropped_children() {
        let a = text_leaf("a", &["x"]);
        let top = DataContainer::branch(vec![a.clone()]);
        top.set(vec![1.0_f64, 2.0]);

        assert!(top.is_leaf());
        assert!(a.parent().is_none());
    }

    #[test]
    fn fluent_setters_chain_and_return_same_container() {
        let c = DataContainer::new();
        let same = c.set(vec![1.0_f64]).with_label("x").with_block_width(1);
        assert!(same.ptr_eq(&c));
        assert_eq!(c.label().as_deref(), Some("x"));
        assert_eq!(c.block_width(), Some(1));
    }

    #[test]
    fn rows_respect_block_width() {
        let c = DataContainer::from_values([1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(c.rows().unwrap().len(), 1);
        c.with_block_width(3);
        let rows = c.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], Scalar::Number(4.0));
        assert!(DataContainer::branch(vec![]).rows().is_none());
    }

    #[test]
    fn coerce_numeric_is_explicit_and_all_or_nothing() {
        let ok = text_leaf("a", &["1", " 2.5 "]);
        assert_eq!(ok.values().unwrap()[0], Scalar::Text("1".to_string()));
        ok.coerce_numeric().unwrap();
        assert_eq!(ok.values().unwrap(), vec![Scalar::Number(1.0), Scalar::Number(2.5)]);

        let bad = text_leaf("b", &["1", "two"]);
        let top = DataContainer::branch(vec![text_leaf("c", &["3"]), bad.clone()]);
        let err = top.coerce_numeric().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        // Nothing was converted.
        assert_eq!(top.child("c").unwrap().values().unwrap()[0], Scalar::Text("3".to_string()));
    }

    #[test]
    fn adopt_moves_content_into_existing_handle() {
        let target = DataContainer::new();
        let parsed = DataContainer::branch(vec![text_leaf("a", &["1"])]);
        parsed.with_label("top");

        target.adopt(&parsed);
        assert_eq!(target.label().as_deref(), Some("top"));
        assert!(target.child("a").unwrap().parent().unwrap().ptr_eq(&target));
        assert!(parsed.is_empty());
    }

    #[test]
    fn to_json_snapshot_shape() {
        let top = DataContainer::branch(vec![text_leaf("a", &["1"])]);
        let json = top.to_json();
        assert_eq!(json["children"][0]["label"], "a");
        assert_eq!(json["children"][0]["values"][0], "1");

        let empty = DataContainer::new();
        assert!(matches!(empty.payload(), Payload::Values(v) if v.is_empty()));
    }
}
