//! Marshalling/unmarshalling engine for a train-network real-time
//! data protocol: converts in-memory application structures to and
//! from a portable, big-endian, densely packed wire form described by
//! a registry of named datasets.
//!
//! The registry ([`Registry`]) is built once from a caller-supplied
//! ComId→DatasetId map and a list of [`Dataset`]s, then threaded
//! through every codec call. There is no global or process-wide
//! state: a `Registry` is an ordinary owned value.
#![forbid(unsafe_code)]

mod align;
mod dataset;
mod decode;
mod element;
mod encode;
mod error;
mod host;
mod registry;
mod size;
mod types;
mod wire;

pub use dataset::Dataset;
pub use element::{Count, Element, ElementKind};
pub use error::MarshalError;
pub use registry::{ComIdEntry, DatasetHandle, Registry};
pub use types::PrimitiveType;

/// Maximum dataset-reference nesting depth a walk may recurse
/// through before failing with [`MarshalError::RecursionLimit`].
pub const MAX_RECURSION_DEPTH: u8 = 5;

impl Registry {
    /// Encode the dataset published under `com_id`, reading fields
    /// from `host` and writing packed big-endian bytes to `wire`.
    /// Returns the number of bytes written to `wire`.
    pub fn encode_com_id(
        &self,
        com_id: u32,
        host: &[u8],
        wire: &mut [u8],
        cache: Option<&mut Option<DatasetHandle>>,
    ) -> Result<usize, MarshalError> {
        let handle = self.dataset_handle_by_com_id(com_id, cache)?;
        self.encode_handle(handle, host, wire)
    }

    /// Encode the dataset identified by `dataset_id` directly.
    pub fn encode_dataset_id(
        &self,
        dataset_id: u32,
        host: &[u8],
        wire: &mut [u8],
        cache: Option<&mut Option<DatasetHandle>>,
    ) -> Result<usize, MarshalError> {
        let handle = self.dataset_handle_by_id(dataset_id, cache)?;
        self.encode_handle(handle, host, wire)
    }

    fn encode_handle(
        &self,
        handle: DatasetHandle,
        host: &[u8],
        wire: &mut [u8],
    ) -> Result<usize, MarshalError> {
        let dataset = self.resolve_handle(handle);
        let mut host_pos = 0;
        let mut wire_pos = 0;
        encode::encode_dataset(self, dataset, host, &mut host_pos, wire, &mut wire_pos, 0)?;
        Ok(wire_pos)
    }

    /// Decode the dataset published under `com_id`, reading packed
    /// big-endian bytes from `wire` and writing host-aligned fields to
    /// `host`. Returns the number of bytes written to `host`.
    pub fn decode_com_id(
        &self,
        com_id: u32,
        wire: &[u8],
        host: &mut [u8],
        cache: Option<&mut Option<DatasetHandle>>,
    ) -> Result<usize, MarshalError> {
        let handle = self.dataset_handle_by_com_id(com_id, cache)?;
        self.decode_handle(handle, wire, host)
    }

    /// Decode the dataset identified by `dataset_id` directly.
    pub fn decode_dataset_id(
        &self,
        dataset_id: u32,
        wire: &[u8],
        host: &mut [u8],
        cache: Option<&mut Option<DatasetHandle>>,
    ) -> Result<usize, MarshalError> {
        let handle = self.dataset_handle_by_id(dataset_id, cache)?;
        self.decode_handle(handle, wire, host)
    }

    fn decode_handle(
        &self,
        handle: DatasetHandle,
        wire: &[u8],
        host: &mut [u8],
    ) -> Result<usize, MarshalError> {
        let dataset = self.resolve_handle(handle);
        let mut wire_pos = 0;
        let mut host_pos = 0;
        decode::decode_dataset(self, dataset, wire, &mut wire_pos, host, &mut host_pos, 0)?;
        Ok(host_pos)
    }

    /// Compute the host buffer size that decoding the dataset
    /// published under `com_id` from `wire` would produce, without
    /// writing any host output.
    pub fn size_for_com_id(
        &self,
        com_id: u32,
        wire: &[u8],
        cache: Option<&mut Option<DatasetHandle>>,
    ) -> Result<usize, MarshalError> {
        let handle = self.dataset_handle_by_com_id(com_id, cache)?;
        self.size_for_handle(handle, wire)
    }

    /// Compute the host buffer size for the dataset identified by
    /// `dataset_id` directly.
    pub fn size_for_dataset_id(
        &self,
        dataset_id: u32,
        wire: &[u8],
        cache: Option<&mut Option<DatasetHandle>>,
    ) -> Result<usize, MarshalError> {
        let handle = self.dataset_handle_by_id(dataset_id, cache)?;
        self.size_for_handle(handle, wire)
    }

    fn size_for_handle(&self, handle: DatasetHandle, wire: &[u8]) -> Result<usize, MarshalError> {
        let dataset = self.resolve_handle(handle);
        let mut wire_pos = 0;
        let mut host_size = 0;
        size::size_dataset(self, dataset, wire, &mut wire_pos, &mut host_size, 0)?;
        Ok(host_size)
    }
}

#[cfg(test)]
mod scenario_tests {
    //! End-to-end tests covering primitive round-trips, nested datasets,
    //! variable-length arrays, recursion limits, and registry validation.
    use super::*;
    use rstest::rstest;

    fn leaf_dataset() -> Dataset {
        Dataset::new(
            1,
            vec![
                Element::primitive(PrimitiveType::Uint8, 1),
                Element::primitive(PrimitiveType::Uint16, 1),
                Element::primitive(PrimitiveType::Uint32, 1),
            ],
        )
    }

    #[test]
    fn primitive_roundtrip() {
        let registry = Registry::new(vec![ComIdEntry::new(100, 1)], vec![leaf_dataset()]).unwrap();

        let mut host = [0u8; 8];
        host::write_native(&mut host, 0, 1, 0x12).unwrap();
        host::write_native(&mut host, 2, 2, 0x1234).unwrap();
        host::write_native(&mut host, 4, 4, 0x1234_5678).unwrap();

        let mut wire = [0u8; 7];
        let written = registry.encode_com_id(100, &host, &mut wire, None).unwrap();
        assert_eq!(written, 7);
        assert_eq!(wire, [0x12, 0x12, 0x34, 0x12, 0x34, 0x56, 0x78]);

        let mut decoded_host = [0u8; 8];
        let read = registry
            .decode_com_id(100, &wire, &mut decoded_host, None)
            .unwrap();
        assert_eq!(read, 8);
        assert_eq!(decoded_host, host);
    }

    #[test]
    fn timedate48_pads_to_struct_alignment() {
        let dataset = Dataset::new(2, vec![Element::primitive(PrimitiveType::TimeDate48, 1)]);
        let registry = Registry::new(vec![ComIdEntry::new(200, 2)], vec![dataset]).unwrap();

        let mut host = [0u8; 8];
        host::write_native(&mut host, 0, 4, 0x1234_5678).unwrap();
        host::write_native(&mut host, 4, 2, 0x9ABC).unwrap();

        let mut wire = [0u8; 6];
        let written = registry.encode_com_id(200, &host, &mut wire, None).unwrap();
        assert_eq!(written, 6);
        assert_eq!(wire, [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC]);

        let size = registry.size_for_com_id(200, &wire, None).unwrap();
        assert_eq!(size, 8);

        let mut decoded_host = [0u8; 8];
        registry
            .decode_com_id(200, &wire, &mut decoded_host, None)
            .unwrap();
        assert_eq!(decoded_host, host);
    }

    #[test]
    fn timedate64_has_no_internal_pad() {
        let dataset = Dataset::new(3, vec![Element::primitive(PrimitiveType::TimeDate64, 1)]);
        let registry = Registry::new(vec![ComIdEntry::new(300, 3)], vec![dataset]).unwrap();

        let mut host = [0u8; 8];
        host::write_native(&mut host, 0, 4, 0x1111_2222).unwrap();
        host::write_native(&mut host, 4, 4, 0x3333_4444).unwrap();

        let mut wire = [0u8; 8];
        let written = registry.encode_com_id(300, &host, &mut wire, None).unwrap();
        assert_eq!(written, 8);
        assert_eq!(
            wire,
            [0x11, 0x11, 0x22, 0x22, 0x33, 0x33, 0x44, 0x44]
        );
        assert_eq!(registry.size_for_com_id(300, &wire, None).unwrap(), 8);
    }

    #[test]
    fn nested_datasets_to_depth_four() {
        let innermost = Dataset::new(
            1990,
            vec![
                Element::primitive(PrimitiveType::Uint8, 1),
                Element::primitive(PrimitiveType::Char8, 16),
            ],
        );
        let level3 = Dataset::new(
            1991,
            vec![
                Element::primitive(PrimitiveType::Uint8, 1),
                Element::dataset_ref(1990, 1),
            ],
        );
        let level2 = Dataset::new(
            1992,
            vec![
                Element::primitive(PrimitiveType::Uint8, 1),
                Element::dataset_ref(1991, 1),
            ],
        );
        let level1 = Dataset::new(
            1993,
            vec![
                Element::primitive(PrimitiveType::Uint8, 1),
                Element::dataset_ref(1992, 1),
            ],
        );

        let registry = Registry::new(
            vec![ComIdEntry::new(400, 1993)],
            vec![level1, level2, level3, innermost],
        )
        .unwrap();

        let mut host = [0u8; 20];
        host[0] = 1;
        host[1] = 2;
        host[2] = 3;
        host[3] = 4;
        host[4..20].copy_from_slice(b"Nested Datasets\0");

        let mut wire = [0u8; 20];
        let written = registry.encode_com_id(400, &host, &mut wire, None).unwrap();
        assert_eq!(written, 20);
        let mut expected = vec![1u8, 2, 3, 4];
        expected.extend_from_slice(b"Nested Datasets\0");
        assert_eq!(&wire[..], &expected[..]);

        let mut decoded_host = [0u8; 20];
        registry
            .decode_com_id(400, &wire, &mut decoded_host, None)
            .unwrap();
        assert_eq!(decoded_host, host);
    }

    #[test]
    fn variable_length_array_capture() {
        let dataset = Dataset::new(
            4,
            vec![
                Element::primitive(PrimitiveType::Uint16, 1),
                Element::primitive_variable(PrimitiveType::Uint8),
            ],
        );
        let registry = Registry::new(vec![ComIdEntry::new(500, 4)], vec![dataset]).unwrap();

        let mut host = [0u8; 6];
        host::write_native(&mut host, 0, 2, 4).unwrap();
        host[2..6].copy_from_slice(&[1, 0, 1, 0]);

        let mut wire = [0u8; 6];
        let written = registry.encode_com_id(500, &host, &mut wire, None).unwrap();
        assert_eq!(written, 6);
        assert_eq!(wire, [0x00, 0x04, 1, 0, 1, 0]);

        let mut decoded_host = [0u8; 6];
        registry
            .decode_com_id(500, &wire, &mut decoded_host, None)
            .unwrap();
        assert_eq!(decoded_host, host);
    }

    #[test]
    fn depth_violation_fails_with_recursion_limit() {
        let mut datasets = Vec::new();
        let leaf_id = 9000u32;
        datasets.push(Dataset::new(
            leaf_id,
            vec![Element::primitive(PrimitiveType::Uint8, 1)],
        ));
        for level in 0..6u32 {
            let id = 9001 + level;
            let child = if level == 0 { leaf_id } else { 9000 + level };
            datasets.push(Dataset::new(
                id,
                vec![
                    Element::primitive(PrimitiveType::Uint8, 1),
                    Element::dataset_ref(child, 1),
                ],
            ));
        }
        let top_id = 9001 + 5;
        let registry =
            Registry::new(vec![ComIdEntry::new(600, top_id)], datasets).unwrap();

        let host = [0u8; 16];
        let mut wire = [0u8; 16];
        let err = registry
            .encode_com_id(600, &host, &mut wire, None)
            .unwrap_err();
        assert!(matches!(err, MarshalError::RecursionLimit(MAX_RECURSION_DEPTH)));
    }

    #[test]
    fn unknown_com_id_writes_nothing() {
        let registry = Registry::new(vec![ComIdEntry::new(100, 1)], vec![leaf_dataset()]).unwrap();
        let host = [0u8; 8];
        let mut wire = [0xFFu8; 7];
        let err = registry
            .encode_com_id(9999, &host, &mut wire, None)
            .unwrap_err();
        assert!(matches!(err, MarshalError::UnknownDataset(9999)));
        assert_eq!(wire, [0xFFu8; 7]);
    }

    #[test]
    fn duplicate_ids_are_rejected_at_init() {
        let a = Dataset::new(1, vec![Element::primitive(PrimitiveType::Uint8, 1)]);
        let b = Dataset::new(1, vec![Element::primitive(PrimitiveType::Uint8, 1)]);
        assert!(Registry::new(vec![ComIdEntry::new(1, 1)], vec![a, b]).is_err());
    }

    #[test]
    fn unresolvable_reference_is_rejected_at_init() {
        let outer = Dataset::new(1, vec![Element::dataset_ref(404, 1)]);
        assert!(Registry::new(vec![ComIdEntry::new(1, 1)], vec![outer]).is_err());
    }

    #[rstest]
    #[case(100u32)]
    #[case(777u32)]
    fn size_for_com_id_matches_size_for_dataset_id(#[case] com_id: u32) {
        let registry =
            Registry::new(vec![ComIdEntry::new(com_id, 1)], vec![leaf_dataset()]).unwrap();
        let wire = [0x12, 0x12, 0x34, 0x12, 0x34, 0x56, 0x78];
        let via_com_id = registry.size_for_com_id(com_id, &wire, None).unwrap();
        let via_dataset_id = registry.size_for_dataset_id(1, &wire, None).unwrap();
        assert_eq!(via_com_id, via_dataset_id);
    }
}
