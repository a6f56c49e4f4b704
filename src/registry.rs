//! Process-wide marshalling state: the sorted ComId→DatasetId table,
//! the sorted DatasetId→Dataset table, and lookup by either key.
//!
//! Grounded on `tau_marshall.c`'s `findDs`/`findDSFromComId` binary
//! searches over `vos_qsort`-sorted arrays (original source); here
//! the `Registry` owns its tables outright instead of holding raw
//! pointers into caller-owned global arrays.

use crate::dataset::Dataset;
use crate::element::ElementKind;
use crate::error::MarshalError;
use crate::types::PrimitiveType;

/// One ComId→DatasetId mapping entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComIdEntry {
    pub com_id: u32,
    pub dataset_id: u32,
}

impl ComIdEntry {
    pub fn new(com_id: u32, dataset_id: u32) -> Self {
        Self { com_id, dataset_id }
    }
}

/// A caller-opaque, `Copy` index into a [`Registry`]'s dataset table.
///
/// Stands in for the original source's `TRDP_DATASET_T *pCachedDS`
/// out-parameter: an index is just as cheap to stash and compare, and
/// cannot dangle or alias the way a raw pointer into a C array can.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetHandle(usize);

/// The immutable, process-wide marshalling configuration: every
/// registered dataset and the ComId table that names the top-level
/// ones. Built once via [`Registry::new`]; every codec entry point in
/// [`crate`] is a method on an existing `Registry`.
#[derive(Debug)]
pub struct Registry {
    com_ids: Vec<ComIdEntry>,
    datasets: Vec<Dataset>,
}

impl Registry {
    /// Build a registry from a caller-supplied ComId map and dataset
    /// list. Sorts both tables, then eagerly resolves every
    /// dataset-reference element against the dataset table, eliminating
    /// lazy-write races entirely.
    ///
    /// Fails with [`MarshalError::Parameter`] if either input is
    /// empty, if a ComId or dataset id is duplicated, if a
    /// dataset-reference element cannot be resolved, or if a
    /// variable-length element is not preceded by a qualifying
    /// unsigned small-integer element.
    pub fn new(com_ids: Vec<ComIdEntry>, datasets: Vec<Dataset>) -> Result<Self, MarshalError> {
        if com_ids.is_empty() {
            return Err(MarshalError::Parameter("ComId map is empty".into()));
        }
        if datasets.is_empty() {
            return Err(MarshalError::Parameter("dataset list is empty".into()));
        }

        let mut com_ids = com_ids;
        com_ids.sort_by_key(|e| e.com_id);
        for pair in com_ids.windows(2) {
            if pair[0].com_id == pair[1].com_id {
                return Err(MarshalError::Parameter(format!(
                    "duplicate ComId {}",
                    pair[0].com_id
                )));
            }
        }

        let mut datasets = datasets;
        datasets.sort_by_key(|d| d.id);
        for pair in datasets.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(MarshalError::Parameter(format!(
                    "duplicate dataset id {}",
                    pair[0].id
                )));
            }
        }

        let registry = Registry { com_ids, datasets };
        registry.resolve_all()?;
        Ok(registry)
    }

    fn dataset_index_by_id(&self, id: u32) -> Option<usize> {
        self.datasets.binary_search_by_key(&id, |d| d.id).ok()
    }

    fn resolve_all(&self) -> Result<(), MarshalError> {
        for dataset in &self.datasets {
            for (index, element) in dataset.elements.iter().enumerate() {
                if let ElementKind::Dataset(target_id) = element.kind {
                    let target_index = self.dataset_index_by_id(target_id).ok_or_else(|| {
                        MarshalError::Parameter(format!(
                            "dataset {} references unknown dataset {target_id}",
                            dataset.id
                        ))
                    })?;
                    element.set_resolved(DatasetHandle(target_index));
                }

                if matches!(element.count, crate::element::Count::Variable) {
                    let preceding_counter = index
                        .checked_sub(1)
                        .and_then(|prev| dataset.elements.get(prev))
                        .and_then(|prev| match prev.kind {
                            ElementKind::Primitive(p) if p.is_variable_length_counter() => Some(()),
                            _ => None,
                        });
                    if preceding_counter.is_none() {
                        return Err(MarshalError::Parameter(format!(
                            "dataset {} element {index} is variable-length but is not preceded by an unsigned 1-/2-/4-byte counter element",
                            dataset.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Look up a dataset by the ComId used to publish it.
    pub fn dataset_by_com_id(&self, com_id: u32) -> Option<&Dataset> {
        let entry = self
            .com_ids
            .binary_search_by_key(&com_id, |e| e.com_id)
            .ok()
            .map(|idx| self.com_ids[idx])?;
        self.dataset_by_id(entry.dataset_id)
    }

    /// Look up a dataset directly by its own id.
    pub fn dataset_by_id(&self, dataset_id: u32) -> Option<&Dataset> {
        self.dataset_index_by_id(dataset_id)
            .map(|idx| &self.datasets[idx])
    }

    pub(crate) fn resolve_handle(&self, handle: DatasetHandle) -> &Dataset {
        &self.datasets[handle.0]
    }

    fn handle_for_id(&self, dataset_id: u32) -> Option<DatasetHandle> {
        self.dataset_index_by_id(dataset_id).map(DatasetHandle)
    }

    /// Resolve a dataset by ComId into a cache-friendly handle,
    /// reusing `cache` if it is already populated. Backs the optional
    /// "dataset-pointer cache slot" parameter of the codec entry points.
    pub(crate) fn dataset_handle_by_com_id(
        &self,
        com_id: u32,
        cache: Option<&mut Option<DatasetHandle>>,
    ) -> Result<DatasetHandle, MarshalError> {
        if let Some(slot) = cache {
            if let Some(handle) = *slot {
                return Ok(handle);
            }
            let entry = self
                .com_ids
                .binary_search_by_key(&com_id, |e| e.com_id)
                .ok()
                .map(|idx| self.com_ids[idx])
                .ok_or(MarshalError::UnknownDataset(com_id))?;
            let handle = self
                .handle_for_id(entry.dataset_id)
                .ok_or(MarshalError::UnknownDataset(com_id))?;
            *slot = Some(handle);
            Ok(handle)
        } else {
            let entry = self
                .com_ids
                .binary_search_by_key(&com_id, |e| e.com_id)
                .ok()
                .map(|idx| self.com_ids[idx])
                .ok_or(MarshalError::UnknownDataset(com_id))?;
            self.handle_for_id(entry.dataset_id)
                .ok_or(MarshalError::UnknownDataset(com_id))
        }
    }

    /// Resolve a dataset by its own id into a cache-friendly handle,
    /// reusing `cache` if it is already populated.
    pub(crate) fn dataset_handle_by_id(
        &self,
        dataset_id: u32,
        cache: Option<&mut Option<DatasetHandle>>,
    ) -> Result<DatasetHandle, MarshalError> {
        if let Some(slot) = cache {
            if let Some(handle) = *slot {
                return Ok(handle);
            }
            let handle = self
                .handle_for_id(dataset_id)
                .ok_or(MarshalError::UnknownDataset(dataset_id))?;
            *slot = Some(handle);
            Ok(handle)
        } else {
            self.handle_for_id(dataset_id)
                .ok_or(MarshalError::UnknownDataset(dataset_id))
        }
    }

    /// The struct alignment of a dataset: the maximum host alignment
    /// of any of its members, recursing through dataset references.
    /// Every dataset-reference element it recurses through is
    /// guaranteed resolved, since `Registry::new` resolves every one
    /// eagerly.
    pub(crate) fn struct_alignment(&self, dataset: &Dataset) -> usize {
        let mut max_align = 1usize;
        for element in &dataset.elements {
            let align = match element.kind {
                ElementKind::Primitive(p) => p.host_align(),
                ElementKind::Dataset(_) => {
                    let handle = element
                        .resolved()
                        .expect("dataset references are resolved eagerly in Registry::new");
                    self.struct_alignment(self.resolve_handle(handle))
                }
            };
            max_align = max_align.max(align);
        }
        max_align
    }
}

const _: () = {
    // Ensure the four alignment values this crate relies on all stay
    // powers of two, since `align_up` assumes that.
    const fn is_pow2(v: usize) -> bool {
        v != 0 && (v & (v - 1)) == 0
    }
    assert!(is_pow2(PrimitiveType::Bool8.host_align()));
    assert!(is_pow2(PrimitiveType::Uint64.host_align()));
    assert!(is_pow2(PrimitiveType::TimeDate48.host_align()));
};
