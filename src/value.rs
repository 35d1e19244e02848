//! The in-memory value tree the codec reads and writes.

use crate::leb128::{Sleb, WideInt};
use crate::scalar::ElemType;
use half::f16;
use hashbrown::DefaultHashBuilder;
use indexmap::IndexMap;

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

/// Ordered string-keyed mapping. Key insertion order is part of the data
/// model and survives a round trip.
pub type Map = IndexMap<String, Value, DefaultHashBuilder>;

/// A MuON value.
///
/// Integers are one logical type narrowed to the smallest wire width when
/// written; values wider than `i128` survive as [`Value::Wide`]. Float widths
/// read from the wire are kept (`F16`/`F32`/`F64`), and every non-finite
/// float encodes through the dedicated NaN/infinity tags.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i128),
    Wide(WideInt),
    F16(f16),
    F32(f32),
    F64(f64),
    Str(String),
    List(Vec<Value>),
    Dict(Map),
    Array(TypedArray),
}

impl Value {
    /// Borrows the string when this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer when this is a [`Value::Int`].
    pub const fn as_int(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<Sleb> for Value {
    fn from(sleb: Sleb) -> Self {
        match sleb {
            Sleb::Int(v) => Value::Int(v),
            Sleb::Wide(w) => Value::Wide(w),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v.into())
    }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Int(v.into())
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::Dict(v)
    }
}

impl From<TypedArray> for Value {
    fn from(v: TypedArray) -> Self {
        Value::Array(v)
    }
}

/// A homogeneous vector with a fixed element type.
///
/// On the wire this is an element tag plus either one count-prefixed payload
/// block or a sequence of (count, payload) chunks ended by a zero count.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F16(Vec<f16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    /// SLEB128-encoded elements.
    Varint(Vec<i128>),
}

impl TypedArray {
    /// The element type of this array.
    pub const fn elem_type(&self) -> ElemType {
        match self {
            TypedArray::I8(_) => ElemType::I8,
            TypedArray::I16(_) => ElemType::I16,
            TypedArray::I32(_) => ElemType::I32,
            TypedArray::I64(_) => ElemType::I64,
            TypedArray::U8(_) => ElemType::U8,
            TypedArray::U16(_) => ElemType::U16,
            TypedArray::U32(_) => ElemType::U32,
            TypedArray::U64(_) => ElemType::U64,
            TypedArray::F16(_) => ElemType::F16,
            TypedArray::F32(_) => ElemType::F32,
            TypedArray::F64(_) => ElemType::F64,
            TypedArray::Varint(_) => ElemType::Varint,
        }
    }

    /// An empty array of the given element type.
    pub fn empty(ty: ElemType) -> Self {
        match ty {
            ElemType::I8 => TypedArray::I8(Vec::new()),
            ElemType::I16 => TypedArray::I16(Vec::new()),
            ElemType::I32 => TypedArray::I32(Vec::new()),
            ElemType::I64 => TypedArray::I64(Vec::new()),
            ElemType::U8 => TypedArray::U8(Vec::new()),
            ElemType::U16 => TypedArray::U16(Vec::new()),
            ElemType::U32 => TypedArray::U32(Vec::new()),
            ElemType::U64 => TypedArray::U64(Vec::new()),
            ElemType::F16 => TypedArray::F16(Vec::new()),
            ElemType::F32 => TypedArray::F32(Vec::new()),
            ElemType::F64 => TypedArray::F64(Vec::new()),
            ElemType::Varint => TypedArray::Varint(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TypedArray::I8(v) => v.len(),
            TypedArray::I16(v) => v.len(),
            TypedArray::I32(v) => v.len(),
            TypedArray::I64(v) => v.len(),
            TypedArray::U8(v) => v.len(),
            TypedArray::U16(v) => v.len(),
            TypedArray::U32(v) => v.len(),
            TypedArray::U64(v) => v.len(),
            TypedArray::F16(v) => v.len(),
            TypedArray::F32(v) => v.len(),
            TypedArray::F64(v) => v.len(),
            TypedArray::Varint(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
