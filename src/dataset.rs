//! A uniquely-identified schema: an ordered list of [`Element`]s.

use crate::element::Element;

/// One message's field layout.
///
/// Datasets are supplied by the caller and owned by the
/// [`crate::registry::Registry`] built from them; nothing outside
/// this crate can mutate a `Dataset` once it has been handed to
/// [`crate::registry::Registry::new`].
#[derive(Debug)]
pub struct Dataset {
    pub id: u32,
    pub elements: Vec<Element>,
}

impl Dataset {
    pub fn new(id: u32, elements: Vec<Element>) -> Self {
        Self { id, elements }
    }
}
