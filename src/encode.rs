//! The marshalling walk: read host-aligned fields, write big-endian
//! packed wire bytes. Grounded on `tau_marshall.c`'s `marshallDs`
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

/// Encode `dataset`, reading from `host[*host_pos..]` and writing to
/// `wire[*wire_pos..]`, advancing both cursors in place.
pub(crate) fn encode_dataset(
    registry: &Registry,
    dataset: &Dataset,
    host: &[u8],
    host_pos: &mut usize,
    wire: &mut [u8],
    wire_pos: &mut usize,
    depth: u8,
) -> Result<(), MarshalError> {
    let depth = depth + 1;
    if depth > MAX_RECURSION_DEPTH {
        return Err(MarshalError::RecursionLimit(MAX_RECURSION_DEPTH));
    }

    let alignment = registry.struct_alignment(dataset);
    *host_pos = align_up(*host_pos, alignment);

    let mut var_count: u32 = 0;

    for element in &dataset.elements {
        if *host_pos >= host.len() {
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
                    encode_dataset(registry, nested, host, host_pos, wire, wire_pos, depth)?;
                }
            }
            ElementKind::Primitive(ty) => {
                encode_primitive(ty, count, host, host_pos, wire, wire_pos, &mut var_count)?;
            }
        }
    }

    let alignment = registry.struct_alignment(dataset);
    *host_pos = align_up(*host_pos, alignment);

    if host_pos.saturating_sub(host.len()) > alignment {
        log::warn!(
            "marshalling read beyond source area for dataset {}: wrong dataset size provided?",
            dataset.id
        );
    }

    Ok(())
}

fn encode_primitive(
    ty: PrimitiveType,
    count: u32,
    host: &[u8],
    host_pos: &mut usize,
    wire: &mut [u8],
    wire_pos: &mut usize,
    var_count: &mut u32,
) -> Result<(), MarshalError> {
    match ty {
        PrimitiveType::TimeDate48 => {
            for _ in 0..count {
                *host_pos = align_up(*host_pos, ty.host_align());
                let seconds = read_host(host, host_pos, 4)?;
                let ticks = read_host(host, host_pos, 2)?;
                *host_pos = align_up(*host_pos, ty.host_align());
                write_wire(wire, wire_pos, 4, seconds)?;
                write_wire(wire, wire_pos, 2, ticks)?;
            }
        }
        PrimitiveType::TimeDate64 => {
            for _ in 0..count {
                *host_pos = align_up(*host_pos, ty.host_align());
                let seconds = read_host(host, host_pos, 4)?;
                let ticks = read_host(host, host_pos, 4)?;
                write_wire(wire, wire_pos, 4, seconds)?;
                write_wire(wire, wire_pos, 4, ticks)?;
            }
        }
        _ => {
            let width = ty.wire_size();
            let is_counter = ty.is_variable_length_counter();
            let mut captured = false;
            for _ in 0..count {
                *host_pos = align_up(*host_pos, ty.host_align());
                let value = read_host(host, host_pos, width)?;
                if is_counter && !captured {
                    *var_count = value as u32;
                    captured = true;
                }
                write_wire(wire, wire_pos, width, value)?;
            }
        }
    }
    Ok(())
}

fn read_host(host: &[u8], host_pos: &mut usize, width: usize) -> Result<u64, MarshalError> {
    let value = host::read_native(host, *host_pos, width).ok_or_else(|| {
        MarshalError::Parameter(format!(
            "source buffer too small to read {width} bytes at offset {}",
            *host_pos
        ))
    })?;
    *host_pos += width;
    Ok(value)
}

fn write_wire(
    wire: &mut [u8],
    wire_pos: &mut usize,
    width: usize,
    value: u64,
) -> Result<(), MarshalError> {
    wire::write_be(wire, *wire_pos, width, value).ok_or_else(|| {
        MarshalError::Parameter(format!(
            "destination buffer too small to write {width} bytes at offset {}",
            *wire_pos
        ))
    })?;
    *wire_pos += width;
    Ok(())
}
