//! Compute the host byte length a decode would produce, without
//! writing any output. Grounded on `tau_marshall.c`'s `size_unmarshall`
//! (original source), but tracked as a plain relative `usize` offset
//! from zero rather than reusing the wire-source pointer as a stand-in
//! host address, which sidesteps the fragility of the original's
//! address-reuse trick (see `DESIGN.md`).

use crate::align::align_up;
use crate::dataset::Dataset;
use crate::element::{Count, ElementKind};
use crate::error::MarshalError;
use crate::registry::Registry;
use crate::types::PrimitiveType;
use crate::wire;
use crate::MAX_RECURSION_DEPTH;

/// Walk `dataset` against `wire[*wire_pos..]`, advancing `wire_pos`
/// and `host_size` (the running host byte count) without touching any
/// host buffer.
pub(crate) fn size_dataset(
    registry: &Registry,
    dataset: &Dataset,
    wire: &[u8],
    wire_pos: &mut usize,
    host_size: &mut usize,
    depth: u8,
) -> Result<(), MarshalError> {
    let depth = depth + 1;
    if depth > MAX_RECURSION_DEPTH {
        return Err(MarshalError::RecursionLimit(MAX_RECURSION_DEPTH));
    }

    *host_size = align_up(*host_size, registry.struct_alignment(dataset));

    let mut var_count: u32 = 0;

    for element in &dataset.elements {
        if *wire_pos >= wire.len() {
            break;
        }

        let count = match element.count {
            Count::Fixed(n) => n,
            Count::Variable => var_count,
        };

        match element.kind {
            ElementKind::Dataset(target_id) => {
                let handle = element.resolved().ok_or(MarshalError::UnknownDataset(target_id))?;
                let nested = registry.resolve_handle(handle);
                for _ in 0..count {
                    size_dataset(registry, nested, wire, wire_pos, host_size, depth)?;
                }
            }
            ElementKind::Primitive(ty) => {
                size_primitive(ty, count, wire, wire_pos, host_size, &mut var_count)?;
            }
        }
    }

    *host_size = align_up(*host_size, registry.struct_alignment(dataset));

    if *wire_pos > wire.len() {
        return Err(MarshalError::Marshalling);
    }

    Ok(())
}

fn size_primitive(
    ty: PrimitiveType,
    count: u32,
    wire: &[u8],
    wire_pos: &mut usize,
    host_size: &mut usize,
    var_count: &mut u32,
) -> Result<(), MarshalError> {
    match ty {
        PrimitiveType::TimeDate48 => {
            for _ in 0..count {
                *host_size = align_up(*host_size, ty.host_align());
                read_wire(wire, wire_pos, 4)?;
                read_wire(wire, wire_pos, 2)?;
                *host_size += 6;
                *host_size = align_up(*host_size, ty.host_align());
            }
        }
        PrimitiveType::TimeDate64 => {
            for _ in 0..count {
                *host_size = align_up(*host_size, ty.host_align());
                read_wire(wire, wire_pos, 4)?;
                read_wire(wire, wire_pos, 4)?;
                *host_size += 8;
            }
        }
        _ => {
            let width = ty.wire_size();
            let is_counter = ty.is_variable_length_counter();
            for _ in 0..count {
                *host_size = align_up(*host_size, ty.host_align());
                let value = read_wire(wire, wire_pos, width)?;
                *host_size += ty.host_size();
                if is_counter {
                    *var_count = value as u32;
                }
            }
        }
    }
    Ok(())
}

fn read_wire(wire: &[u8], wire_pos: &mut usize, width: usize) -> Result<u64, MarshalError> {
    let value = wire::read_be(wire, *wire_pos, width).ok_or(MarshalError::Marshalling)?;
    *wire_pos += width;
    Ok(value)
}
