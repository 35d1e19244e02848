//! Grammar writer: tag dispatch, value encoding, and the string-compression
//! protocol on the way out.

use crate::io::{Error, Result, Write};
use crate::leb128::{sleb128_encode, uleb128_encode};
use crate::lru::{LruWindow, WINDOW_CAP};
use crate::scalar::Scalar;
use crate::value::{TypedArray, Value};
use crate::{MUON_MAGIC, tags};

#[cfg(not(feature = "std"))]
use alloc::{string::String, string::ToString, vec::Vec};

/// Strings at least this long take the sized form even without a NUL byte.
const SIZED_STRING_MIN: usize = 512;

/// Options for [`write_value`](crate::write_value).
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Emit typed-array framing for [`Value::Array`]. When off, arrays are
    /// lowered to plain lists of scalars.
    pub detect_arrays: bool,
    /// Static dictionary to use instead of running the builder.
    pub static_dict: Option<Vec<String>>,
    /// Entry cap handed to the builder when `static_dict` is `None`.
    pub static_dict_cap: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            detect_arrays: true,
            static_dict: None,
            static_dict_cap: WINDOW_CAP,
        }
    }
}

/// Streaming encoder for one MuON stream.
///
/// Holds the two string windows: `lru_static` mirrors the reader's window
/// and is what back-references index into; `lru_dynamic` stages candidate
/// strings that are promoted (and marked with the LRU directive) the first
/// time they are actually written.
pub struct Writer<W: Write> {
    out: W,
    lru_static: LruWindow,
    lru_dynamic: LruWindow,
    detect_arrays: bool,
}

impl<W: Write> Writer<W> {
    pub fn new(out: W) -> Self {
        Writer {
            out,
            lru_static: LruWindow::new(WINDOW_CAP),
            lru_dynamic: LruWindow::new(WINDOW_CAP),
            detect_arrays: true,
        }
    }

    /// Sets whether [`Value::Array`] gets typed-array framing.
    pub fn detect_arrays(mut self, on: bool) -> Self {
        self.detect_arrays = on;
        self
    }

    /// Consumes the writer, returning the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()
    }

    /// Emits the four-byte stream magic.
    pub fn tag_muon(&mut self) -> Result<usize> {
        self.put(&MUON_MAGIC)
    }

    /// Stages `table` for on-reuse promotion. Emits nothing.
    pub fn add_lru_dynamic(&mut self, table: &[String]) {
        self.lru_dynamic.extend(table.iter().cloned());
    }

    /// Emits `table` as a self-contained static-dictionary preamble and
    /// seeds the static window with it.
    pub fn add_lru_list(&mut self, table: &[String]) -> Result<usize> {
        if table.iter().any(|s| s.as_bytes().contains(&0)) {
            // entries are framed with a NUL terminator below
            return Err(Error::InvariantViolation(
                "static table entry contains a NUL byte",
            ));
        }
        self.lru_static.extend(table.iter().cloned());

        let mut n = self.put(&[tags::LRU, tags::LIST_START])?;
        for s in table {
            n += self.put(s.as_bytes())?;
            n += self.put(&[tags::STR_TERM])?;
        }
        n += self.put(&[tags::LIST_END])?;
        Ok(n)
    }

    /// Encodes one value, dispatching on its variant. Returns the number of
    /// bytes emitted.
    pub fn add(&mut self, value: &Value) -> Result<usize> {
        match value {
            Value::Null => self.put(&[tags::NULL]),
            Value::Bool(true) => self.put(&[tags::TRUE]),
            Value::Bool(false) => self.put(&[tags::FALSE]),
            Value::Int(v) => self.add_int(*v),
            Value::Wide(w) => {
                let mut n = self.put(&[tags::SLEB])?;
                n += self.put(w.as_sleb128())?;
                Ok(n)
            }
            Value::F16(h) => self.add_f16(*h),
            Value::F32(f) => self.add_f32(*f),
            Value::F64(f) => self.add_f64(*f),
            Value::Str(s) => self.add_str(s),
            Value::List(items) => {
                let mut n = self.put(&[tags::LIST_START])?;
                for item in items {
                    n += self.add(item)?;
                }
                n += self.put(&[tags::LIST_END])?;
                Ok(n)
            }
            Value::Dict(map) => {
                let mut n = self.put(&[tags::DICT_START])?;
                for (key, val) in map {
                    n += self.add_str(key)?;
                    n += self.add(val)?;
                }
                n += self.put(&[tags::DICT_END])?;
                Ok(n)
            }
            Value::Array(arr) => {
                if self.detect_arrays {
                    self.add_array(arr)
                } else {
                    self.add_array_as_list(arr)
                }
            }
        }
    }

    /// Emits `chunks` as one chunked typed array: marker, element tag, each
    /// non-empty chunk as (count, payload), then the zero-count terminator.
    ///
    /// All chunks must share one element type.
    pub fn add_chunked(&mut self, chunks: &[TypedArray]) -> Result<usize> {
        let Some(first) = chunks.first() else {
            return Err(Error::InvariantViolation(
                "chunked array needs at least one chunk",
            ));
        };
        let ty = first.elem_type();
        if chunks.iter().any(|c| c.elem_type() != ty) {
            return Err(Error::InvariantViolation(
                "chunked array mixes element types",
            ));
        }

        let mut n = self.put(&[tags::ARRAY_CHUNKED, ty.tag()])?;
        for chunk in chunks {
            // an interior zero count would read as the terminator
            if chunk.is_empty() {
                continue;
            }
            n += self.add_chunk(chunk)?;
        }
        n += self.put(&uleb128_encode(0))?;
        Ok(n)
    }

    fn add_int(&mut self, v: i128) -> Result<usize> {
        if (0..=9).contains(&v) {
            return self.put(&[tags::SMALL_INT + v as u8]);
        }

        let enc = sleb128_encode(v);
        let lenc = enc.len();
        // The length guards keep the fixed-width form from losing to the
        // SLEB128 form it replaces.
        if v < 0 {
            if v >= -0x80 {
                self.put_scalar(&(v as i8))
            } else if v >= -0x8000 && lenc >= 2 {
                self.put_scalar(&(v as i16))
            } else if v >= -0x8000_0000 && lenc >= 4 {
                self.put_scalar(&(v as i32))
            } else if v >= -0x8000_0000_0000_0000 && lenc >= 8 {
                self.put_scalar(&(v as i64))
            } else {
                let mut n = self.put(&[tags::SLEB])?;
                n += self.put(&enc)?;
                Ok(n)
            }
        } else if v < 0x80 {
            self.put_scalar(&(v as u8))
        } else if v < 0x8000 && lenc >= 2 {
            self.put_scalar(&(v as u16))
        } else if v < 0x8000_0000 && lenc >= 4 {
            self.put_scalar(&(v as u32))
        } else if v <= u64::MAX as i128 && lenc >= 8 {
            self.put_scalar(&(v as u64))
        } else {
            let mut n = self.put(&[tags::SLEB])?;
            n += self.put(&enc)?;
            Ok(n)
        }
    }

    fn add_f64(&mut self, f: f64) -> Result<usize> {
        if f.is_nan() {
            return self.put(&[tags::NAN]);
        }
        if f.is_infinite() {
            let b = if f < 0.0 { tags::NEG_INF } else { tags::POS_INF };
            return self.put(&[b]);
        }
        self.put_scalar(&f)
    }

    fn add_f32(&mut self, f: f32) -> Result<usize> {
        if f.is_nan() {
            return self.put(&[tags::NAN]);
        }
        if f.is_infinite() {
            let b = if f < 0.0 { tags::NEG_INF } else { tags::POS_INF };
            return self.put(&[b]);
        }
        self.put_scalar(&f)
    }

    fn add_f16(&mut self, h: half::f16) -> Result<usize> {
        if h.is_nan() {
            return self.put(&[tags::NAN]);
        }
        if h.is_infinite() {
            let b = if h.is_sign_negative() {
                tags::NEG_INF
            } else {
                tags::POS_INF
            };
            return self.put(&[b]);
        }
        self.put_scalar(&h)
    }

    /// Encodes one string through the window protocol: a back-reference when
    /// the static window already holds it, otherwise a literal, preceded by
    /// the promotion marker when the string was staged in the dynamic window.
    fn add_str(&mut self, val: &str) -> Result<usize> {
        if let Some(i) = self.lru_static.find_index(val) {
            let dist = self.lru_static.len() - i - 1;
            let mut n = self.put(&[tags::STR_BACKREF])?;
            n += self.put(&uleb128_encode(dist as u64))?;
            return Ok(n);
        }

        let mut n = 0;
        if self.lru_dynamic.contains(val) {
            self.lru_static.append(val.to_string());
            self.lru_dynamic.remove(val)?;
            n += self.put(&[tags::LRU])?;
        }

        let bytes = val.as_bytes();
        if bytes.contains(&0) || bytes.len() >= SIZED_STRING_MIN {
            n += self.put(&[tags::STR_SIZED])?;
            n += self.put(&uleb128_encode(bytes.len() as u64))?;
            n += self.put(bytes)?;
        } else {
            n += self.put(bytes)?;
            n += self.put(&[tags::STR_TERM])?;
        }
        Ok(n)
    }

    fn add_array(&mut self, arr: &TypedArray) -> Result<usize> {
        let mut n = self.put(&[tags::ARRAY, arr.elem_type().tag()])?;
        n += self.add_chunk(arr)?;
        Ok(n)
    }

    /// One (count, payload) block.
    fn add_chunk(&mut self, arr: &TypedArray) -> Result<usize> {
        let mut n = self.put(&uleb128_encode(arr.len() as u64))?;
        match arr {
            TypedArray::I8(v) => {
                for e in v {
                    n += e.put(&mut self.out)?;
                }
            }
            TypedArray::I16(v) => {
                for e in v {
                    n += e.put(&mut self.out)?;
                }
            }
            TypedArray::I32(v) => {
                for e in v {
                    n += e.put(&mut self.out)?;
                }
            }
            TypedArray::I64(v) => {
                for e in v {
                    n += e.put(&mut self.out)?;
                }
            }
            TypedArray::U8(v) => {
                n += self.put(v)?;
            }
            TypedArray::U16(v) => {
                for e in v {
                    n += e.put(&mut self.out)?;
                }
            }
            TypedArray::U32(v) => {
                for e in v {
                    n += e.put(&mut self.out)?;
                }
            }
            TypedArray::U64(v) => {
                for e in v {
                    n += e.put(&mut self.out)?;
                }
            }
            TypedArray::F16(v) => {
                for e in v {
                    n += e.put(&mut self.out)?;
                }
            }
            TypedArray::F32(v) => {
                for e in v {
                    n += e.put(&mut self.out)?;
                }
            }
            TypedArray::F64(v) => {
                for e in v {
                    n += e.put(&mut self.out)?;
                }
            }
            TypedArray::Varint(v) => {
                for &e in v {
                    n += self.put(&sleb128_encode(e))?;
                }
            }
        }
        Ok(n)
    }

    /// Lowers a typed array to list framing with one scalar per element.
    fn add_array_as_list(&mut self, arr: &TypedArray) -> Result<usize> {
        let mut n = self.put(&[tags::LIST_START])?;
        match arr {
            TypedArray::I8(v) => {
                for &e in v {
                    n += self.add_int(e.into())?;
                }
            }
            TypedArray::I16(v) => {
                for &e in v {
                    n += self.add_int(e.into())?;
                }
            }
            TypedArray::I32(v) => {
                for &e in v {
                    n += self.add_int(e.into())?;
                }
            }
            TypedArray::I64(v) => {
                for &e in v {
                    n += self.add_int(e.into())?;
                }
            }
            TypedArray::U8(v) => {
                for &e in v {
                    n += self.add_int(e.into())?;
                }
            }
            TypedArray::U16(v) => {
                for &e in v {
                    n += self.add_int(e.into())?;
                }
            }
            TypedArray::U32(v) => {
                for &e in v {
                    n += self.add_int(e.into())?;
                }
            }
            TypedArray::U64(v) => {
                for &e in v {
                    n += self.add_int(e.into())?;
                }
            }
            TypedArray::F16(v) => {
                for &e in v {
                    n += self.add_f16(e)?;
                }
            }
            TypedArray::F32(v) => {
                for &e in v {
                    n += self.add_f32(e)?;
                }
            }
            TypedArray::F64(v) => {
                for &e in v {
                    n += self.add_f64(e)?;
                }
            }
            TypedArray::Varint(v) => {
                for &e in v {
                    n += self.add_int(e)?;
                }
            }
        }
        n += self.put(&[tags::LIST_END])?;
        Ok(n)
    }

    fn put_scalar<S: Scalar>(&mut self, value: &S) -> Result<usize> {
        let mut n = self.put(&[S::TYPE.tag()])?;
        n += value.put(&mut self.out)?;
        Ok(n)
    }

    fn put(&mut self, buf: &[u8]) -> Result<usize> {
        self.out.write_all(buf)
    }
}
