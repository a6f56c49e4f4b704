//! One field within a [`crate::dataset::Dataset`].

use std::sync::OnceLock;

use crate::registry::DatasetHandle;
use crate::types::PrimitiveType;

/// What kind of value an [`Element`] holds: one of the sixteen
/// primitive types, or a reference to another dataset by its
/// declared id. An explicit sum type, replacing the original source's
/// numeric-tag-threshold trick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Primitive(PrimitiveType),
    Dataset(u32),
}

/// An element's declared repeat count: a fixed number, or the
/// variable-length sentinel whose actual count is read from the
/// previous element at walk time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    Fixed(u32),
    Variable,
}

/// One field of a dataset: its kind, its declared count, and (for a
/// dataset reference) a write-once cache of the resolved
/// [`DatasetHandle`], populated eagerly by [`crate::registry::Registry::new`].
#[derive(Debug)]
pub struct Element {
    pub kind: ElementKind,
    pub count: Count,
    resolved: OnceLock<DatasetHandle>,
}

impl Element {
    /// A primitive-typed element with a fixed repeat count.
    pub fn primitive(ty: PrimitiveType, count: u32) -> Self {
        Self {
            kind: ElementKind::Primitive(ty),
            count: Count::Fixed(count),
            resolved: OnceLock::new(),
        }
    }

    /// A primitive-typed element whose repeat count is taken from the
    /// immediately preceding small unsigned-integer element.
    pub fn primitive_variable(ty: PrimitiveType) -> Self {
        Self {
            kind: ElementKind::Primitive(ty),
            count: Count::Variable,
            resolved: OnceLock::new(),
        }
    }

    /// An element referencing another dataset, repeated `count` times.
    pub fn dataset_ref(dataset_id: u32, count: u32) -> Self {
        Self {
            kind: ElementKind::Dataset(dataset_id),
            count: Count::Fixed(count),
            resolved: OnceLock::new(),
        }
    }

    /// The cached resolved handle, if this element has been resolved.
    /// `None` for a primitive element, or for a dataset-reference
    /// element before `Registry::new` has run.
    pub(crate) fn resolved(&self) -> Option<DatasetHandle> {
        self.resolved.get().copied()
    }

    /// Bind the resolved handle. Idempotent: resolving the same
    /// element twice with the same handle is a no-op; resolving it
    /// twice with *different* handles is a logic error in the
    /// registry (it would mean the dataset table changed under an
    /// already-built `Registry`, which the API makes impossible) and
    /// panics rather than silently picking one.
    pub(crate) fn set_resolved(&self, handle: DatasetHandle) {
        if self.resolved.set(handle).is_err() {
            let existing = *self
                .resolved
                .get()
                .expect("set() just failed, so a value is already present");
            assert_eq!(
                existing, handle,
                "dataset-reference element resolved to two different datasets"
            );
        }
    }
}
