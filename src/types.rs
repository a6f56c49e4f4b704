//! The closed repertoire of primitive wire types and their byte
//! geometry, both on the wire (always big-endian, packed) and on the
//! host (native-endian, naturally aligned).

/// One primitive type from the fixed repertoire.
///
/// `TIMEDATE48` and `TIMEDATE64` are not base machine types but small
/// structures; their host alignment and host size follow the struct
/// layout rules of the originating host compiler (see
/// [`PrimitiveType::host_align`] / [`PrimitiveType::host_size`]),
/// not their raw wire width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool8,
    Char8,
    Int8,
    Uint8,
    Utf16,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Real32,
    TimeDate32,
    Int64,
    Uint64,
    Real64,
    TimeDate48,
    TimeDate64,
}

impl PrimitiveType {
    /// Number of bytes this type occupies on the wire, packed.
    pub const fn wire_size(self) -> usize {
        use PrimitiveType::*;
        match self {
            Bool8 | Char8 | Int8 | Uint8 => 1,
            Utf16 | Int16 | Uint16 => 2,
            Int32 | Uint32 | Real32 | TimeDate32 => 4,
            Int64 | Uint64 | Real64 => 8,
            TimeDate48 => 6,
            TimeDate64 => 8,
        }
    }

    /// Natural host alignment, in bytes: the offset at which the host
    /// compiler would have placed a member of this type.
    pub const fn host_align(self) -> usize {
        use PrimitiveType::*;
        match self {
            Bool8 | Char8 | Int8 | Uint8 => 1,
            Utf16 | Int16 | Uint16 => 2,
            Int32 | Uint32 | Real32 | TimeDate32 => 4,
            Int64 | Uint64 | Real64 => 8,
            // {u32, u16} and {u32, u32} both align as their strictest
            // (4-byte) member.
            TimeDate48 | TimeDate64 => 4,
        }
    }

    /// Number of bytes this type occupies in the host buffer,
    /// including any trailing struct padding (distinct from
    /// [`PrimitiveType::wire_size`] for the `TIMEDATE*` types).
    pub const fn host_size(self) -> usize {
        use PrimitiveType::*;
        match self {
            Bool8 | Char8 | Int8 | Uint8 => 1,
            Utf16 | Int16 | Uint16 => 2,
            Int32 | Uint32 | Real32 | TimeDate32 => 4,
            Int64 | Uint64 | Real64 => 8,
            // u32 + u16, padded up to the 4-byte struct alignment.
            TimeDate48 => 8,
            // u32 + u32, no internal padding.
            TimeDate64 => 8,
        }
    }

    /// True for the unsigned, 1-/2-/4-byte integer types that may
    /// legally precede a variable-length element and supply its
    /// runtime count.
    pub const fn is_variable_length_counter(self) -> bool {
        matches!(
            self,
            PrimitiveType::Uint8 | PrimitiveType::Uint16 | PrimitiveType::Uint32
        )
    }
}
