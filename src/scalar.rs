//! Little-endian typed scalar codec: the `0xB0..=0xBB` tag table and the
//! fixed-width pack/unpack routines behind it.
//!
//! Everything multi-byte is little-endian on the wire regardless of host
//! byte order.

use crate::io::{Read, Result, Write};
use half::f16;

/// Scalar and typed-array element types, one per tag in `0xB0..=0xBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElemType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F16,
    F32,
    F64,
    /// SLEB128-encoded integer, variable width.
    Varint,
}

impl ElemType {
    /// Maps a wire tag to its element type.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0xB0 => Some(ElemType::I8),
            0xB1 => Some(ElemType::I16),
            0xB2 => Some(ElemType::I32),
            0xB3 => Some(ElemType::I64),
            0xB4 => Some(ElemType::U8),
            0xB5 => Some(ElemType::U16),
            0xB6 => Some(ElemType::U32),
            0xB7 => Some(ElemType::U64),
            0xB8 => Some(ElemType::F16),
            0xB9 => Some(ElemType::F32),
            0xBA => Some(ElemType::F64),
            0xBB => Some(ElemType::Varint),
            _ => None,
        }
    }

    /// The wire tag for this element type.
    pub const fn tag(self) -> u8 {
        match self {
            ElemType::I8 => 0xB0,
            ElemType::I16 => 0xB1,
            ElemType::I32 => 0xB2,
            ElemType::I64 => 0xB3,
            ElemType::U8 => 0xB4,
            ElemType::U16 => 0xB5,
            ElemType::U32 => 0xB6,
            ElemType::U64 => 0xB7,
            ElemType::F16 => 0xB8,
            ElemType::F32 => 0xB9,
            ElemType::F64 => 0xBA,
            ElemType::Varint => 0xBB,
        }
    }

    /// Fixed wire width in bytes; `None` for the variable-width
    /// [`ElemType::Varint`].
    pub const fn width(self) -> Option<usize> {
        match self {
            ElemType::I8 | ElemType::U8 => Some(1),
            ElemType::I16 | ElemType::U16 | ElemType::F16 => Some(2),
            ElemType::I32 | ElemType::U32 | ElemType::F32 => Some(4),
            ElemType::I64 | ElemType::U64 | ElemType::F64 => Some(8),
            ElemType::Varint => None,
        }
    }
}

/// A fixed-width scalar that packs to and unpacks from little-endian bytes.
pub trait Scalar: Sized {
    /// The element type this scalar encodes under.
    const TYPE: ElemType;

    /// Writes the little-endian bytes of `self`, returning the byte count.
    fn put(&self, writer: &mut impl Write) -> Result<usize>;

    /// Reads `size_of::<Self>()` little-endian bytes into a value.
    fn take(reader: &mut impl Read) -> Result<Self>;
}

macro_rules! impl_scalar_le {
    ($($t:ty => $variant:ident),+ $(,)?) => {
        $(
            impl Scalar for $t {
                const TYPE: ElemType = ElemType::$variant;

                #[inline(always)]
                fn put(&self, writer: &mut impl Write) -> Result<usize> {
                    writer.write_all(&endian_cast::Endianness::le_bytes(self))
                }

                fn take(reader: &mut impl Read) -> Result<Self> {
                    let mut buf = [0u8; core::mem::size_of::<$t>()];
                    reader.read_exact(&mut buf)?;
                    Ok(<$t>::from_le_bytes(buf))
                }
            }
        )+
    };
}

impl_scalar_le!(
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
    f32 => F32, f64 => F64,
);

impl Scalar for f16 {
    const TYPE: ElemType = ElemType::F16;

    #[inline(always)]
    fn put(&self, writer: &mut impl Write) -> Result<usize> {
        writer.write_all(&self.to_le_bytes())
    }

    fn take(reader: &mut impl Read) -> Result<Self> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(f16::from_le_bytes(buf))
    }
}
