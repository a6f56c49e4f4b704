//! The unmarshalling walk: read big-endian packed wire bytes, write
//! host-aligned fields. Grounded on `tau_marshall.c`'s `unmarshallDs`
//! (original source).

use crate::align::align_up;
use crate::dataset::Dataset;
use crate::element::{Count, ElementKind};
use crate::error::MarshalError;
use crate::host;
use crate::registry::Registry;
use crate::types::PrimitiveType;
use crate::wire;
use crate::MAX_RECURSION_DEPTH;

/// Decode `dataset`, reading from `wire[*wire_pos..]` and writing to
/// `host[*host_pos..]`, advancing both cursors in place.
pub(crate) fn decode_dataset(
    registry: &Registry,
    dataset: &Dataset,
    wire: &[u8],
    wire_pos: &mut usize,
    host: &mut [u8],
    host_pos: &mut usize,
    depth: u8,
) -> Result<(), MarshalError> {
    let depth = depth + 1;
    if depth > MAX_RECURSION_DEPTH {
        return Err(MarshalError::RecursionLimit(MAX_RECURSION_DEPTH));
    }

    *host_pos = align_up(*host_pos, registry.struct_alignment(dataset));

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
                    decode_dataset(registry, nested, wire, wire_pos, host, host_pos, depth)?;
                }
            }
            ElementKind::Primitive(ty) => {
                decode_primitive(ty, count, wire, wire_pos, host, host_pos, &mut var_count)?;
            }
        }
    }

    *host_pos = align_up(*host_pos, registry.struct_alignment(dataset));

    if *wire_pos > wire.len() {
        return Err(MarshalError::Marshalling);
    }

    Ok(())
}

fn decode_primitive(
    ty: PrimitiveType,
    count: u32,
    wire: &[u8],
    wire_pos: &mut usize,
    host: &mut [u8],
    host_pos: &mut usize,
    var_count: &mut u32,
) -> Result<(), MarshalError> {
    match ty {
        PrimitiveType::TimeDate48 => {
            for _ in 0..count {
                *host_pos = align_up(*host_pos, ty.host_align());
                let seconds = read_wire(wire, wire_pos, 4)?;
                let ticks = read_wire(wire, wire_pos, 2)?;
                write_host(host, host_pos, 4, seconds)?;
                write_host(host, host_pos, 2, ticks)?;
                *host_pos = align_up(*host_pos, ty.host_align());
            }
        }
        PrimitiveType::TimeDate64 => {
            for _ in 0..count {
                *host_pos = align_up(*host_pos, ty.host_align());
                let seconds = read_wire(wire, wire_pos, 4)?;
                let ticks = read_wire(wire, wire_pos, 4)?;
                write_host(host, host_pos, 4, seconds)?;
                write_host(host, host_pos, 4, ticks)?;
            }
        }
        _ => {
            let width = ty.wire_size();
            let is_counter = ty.is_variable_length_counter();
            for _ in 0..count {
                *host_pos = align_up(*host_pos, ty.host_align());
                let value = read_wire(wire, wire_pos, width)?;
                write_host(host, host_pos, width, value)?;
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

fn write_host(
    host: &mut [u8],
    host_pos: &mut usize,
    width: usize,
    value: u64,
) -> Result<(), MarshalError> {
    host::write_native(host, *host_pos, width, value).ok_or_else(|| {
        MarshalError::Parameter(format!(
            "destination buffer too small to write {width} bytes at offset {}",
            *host_pos
        ))
    })?;
    *host_pos += width;
    Ok(())
}
