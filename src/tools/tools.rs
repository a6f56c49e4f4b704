//! `tau-marshal-demo`: builds a small two-level dataset, encodes a
//! sample host struct, decodes it back, and prints both forms. Not
//! part of the library's public contract, a runnable illustration of
//! the registry/encode/decode API, in the spirit of the original
//! source's `receiveHello.c` minus the session/socket half.

use anyhow::Result;
use clap::Parser;
use tau_marshal::{ComIdEntry, Dataset, Element, MarshalError, PrimitiveType, Registry};

const WAYSIDE_COM_ID: u32 = 1001;
const WAYSIDE_DATASET_ID: u32 = 2001;
const HEADER_DATASET_ID: u32 = 2000;

/// Print the registry's toy wayside-status dataset round-tripped
/// through encode and decode.
#[derive(Debug, Parser)]
struct Args {
    /// also print the size estimator's result before decoding
    #[arg(long)]
    show_size: bool,
}

fn build_registry() -> Result<Registry, MarshalError> {
    let header = Dataset::new(
        HEADER_DATASET_ID,
        vec![
            Element::primitive(PrimitiveType::Uint32, 1), // sequence counter
            Element::primitive(PrimitiveType::Uint8, 1),  // status flags
        ],
    );
    let wayside_status = Dataset::new(
        WAYSIDE_DATASET_ID,
        vec![
            Element::dataset_ref(HEADER_DATASET_ID, 1),
            Element::primitive(PrimitiveType::Uint16, 1), // reading count
            Element::primitive_variable(PrimitiveType::Int32), // readings[]
        ],
    );

    Registry::new(
        vec![ComIdEntry::new(WAYSIDE_COM_ID, WAYSIDE_DATASET_ID)],
        vec![header, wayside_status],
    )
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let registry = build_registry()?;

    // Host layout follows the engine's own alignment rules: the header
    // sub-dataset pads out to its 4-byte struct alignment before the
    // reading count, which in turn pads to 4 bytes before the first
    // i32 reading.
    //
    //   [0..4)   header.sequence  (u32)
    //   [4)      header.flags     (u8)
    //   [5..8)   padding to the header's struct alignment
    //   [8..10)  reading_count    (u16)
    //   [10..12) padding to the i32 array's alignment
    //   [12..24) readings[3]      (i32 each)
    //
    // {sequence=7, flags=0x01, reading_count=3, readings=[10, -5, 42]}
    let mut host = vec![0u8; 24];
    host[0..4].copy_from_slice(&7u32.to_ne_bytes());
    host[4] = 0x01;
    host[8..10].copy_from_slice(&3u16.to_ne_bytes());
    host[12..16].copy_from_slice(&10i32.to_ne_bytes());
    host[16..20].copy_from_slice(&(-5i32).to_ne_bytes());
    host[20..24].copy_from_slice(&42i32.to_ne_bytes());

    // Wire is packed: 4+1 (header) + 2 (reading_count) + 3*4 (readings) = 19 bytes.
    let mut wire = vec![0u8; 19];
    let wire_used = registry.encode_com_id(WAYSIDE_COM_ID, &host, &mut wire, None)?;
    wire.truncate(wire_used);
    println!("host  ({:>2} bytes): {host:02x?}", host.len());
    println!("wire  ({:>2} bytes): {wire:02x?}", wire.len());

    if args.show_size {
        let size = registry.size_for_com_id(WAYSIDE_COM_ID, &wire, None)?;
        println!("size estimate for this wire buffer: {size} bytes");
    }

    let mut decoded = vec![0u8; host.len()];
    registry.decode_com_id(WAYSIDE_COM_ID, &wire, &mut decoded, None)?;
    println!("decoded      : {decoded:02x?}");
    println!("round-trip ok: {}", decoded == host);

    Ok(())
}
