//! Grammar reader: tag dispatch, value decoding, and the string-compression
//! protocol on the way back in.

use crate::io::{Error, Read, Result};
use crate::leb128::{self, Sleb};
use crate::lru::{LruWindow, WINDOW_CAP};
use crate::scalar::{ElemType, Scalar};
use crate::value::{Map, TypedArray, Value};
use crate::{MUON_MAGIC, tags};

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};
use half::f16;

/// Sized strings are pulled in at most this many bytes at a time, so a bogus
/// length claims no more memory than the stream actually backs.
const READ_CHUNK: usize = 4096;

/// Streaming decoder for one MuON stream.
///
/// Owns the single LRU window: the static-table preamble seeds it and
/// promoted strings extend it, exactly mirroring the writer's static window,
/// which is what makes back-reference distances line up.
pub struct Reader<R: Read> {
    inp: R,
    lru: LruWindow,
    peeked: Option<u8>,
    consumed: usize,
}

impl<R: Read> Read for Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(b) = self.peeked.take() {
            buf[0] = b;
            self.consumed += 1;
            return Ok(1);
        }
        let n = self.inp.read(buf)?;
        self.consumed += n;
        Ok(n)
    }
}

impl<R: Read> Reader<R> {
    pub fn new(inp: R) -> Self {
        Reader {
            inp,
            lru: LruWindow::new(WINDOW_CAP),
            peeked: None,
            consumed: 0,
        }
    }

    /// Bytes consumed from the source so far.
    pub const fn offset(&self) -> usize {
        self.consumed
    }

    /// Consumes the reader, returning the source.
    pub fn into_inner(self) -> R {
        self.inp
    }

    /// Decodes the next value from the stream.
    ///
    /// Padding bytes and count/size annotations before the value are
    /// skipped; a magic lead-in is verified and skipped.
    pub fn read_object(&mut self) -> Result<Value> {
        let mut nxt = self.peek_byte()?;
        while nxt == tags::PADDING {
            self.next_byte()?;
            nxt = self.peek_byte()?;
        }

        if !(0x83..=0xC1).contains(&nxt) {
            return self.read_string().map(Value::Str);
        }
        match nxt {
            tags::ARRAY | tags::ARRAY_CHUNKED => self.read_typed_array(),
            tags::COUNT_NOTE | tags::SIZE_NOTE => {
                self.next_byte()?;
                let _ = self.read_uleb()?;
                self.read_object()
            }
            tags::LRU => {
                self.next_byte()?;
                if self.peek_byte()? == tags::LIST_START {
                    let table = self.read_list()?;
                    let mut strings = Vec::with_capacity(table.len());
                    for entry in table {
                        match entry {
                            Value::Str(s) => strings.push(s),
                            _ => return Err(self.malformed("LRU table entry is not a string")),
                        }
                    }
                    self.lru.extend(strings);
                    self.read_object()
                } else {
                    let s = self.read_string()?;
                    self.lru.append(s.clone());
                    Ok(Value::Str(s))
                }
            }
            tags::MAGIC_LEAD => {
                let mut magic = [0u8; 4];
                self.read_exact(&mut magic)?;
                if magic != MUON_MAGIC {
                    return Err(Error::InvalidMagic);
                }
                self.read_object()
            }
            tags::LIST_START => self.read_list().map(Value::List),
            tags::DICT_START => self.read_dict(),
            0xA0..=0xAF => self.read_special(),
            0xB0..=0xBB => self.read_typed_value(),
            _ => Err(self.malformed("unrecognized tag")),
        }
    }

    fn read_special(&mut self) -> Result<Value> {
        let at = self.consumed;
        match self.next_byte()? {
            tags::FALSE => Ok(Value::Bool(false)),
            tags::TRUE => Ok(Value::Bool(true)),
            tags::NULL => Ok(Value::Null),
            tags::NAN => Ok(Value::F64(f64::NAN)),
            tags::NEG_INF => Ok(Value::F64(f64::NEG_INFINITY)),
            tags::POS_INF => Ok(Value::F64(f64::INFINITY)),
            b @ 0xA0..=0xA9 => Ok(Value::Int(i128::from(b - tags::SMALL_INT))),
            _ => Err(Error::MalformedStream {
                reason: "unrecognized special tag",
                offset: Some(at),
            }),
        }
    }

    fn read_typed_value(&mut self) -> Result<Value> {
        let at = self.consumed;
        let tag = self.next_byte()?;
        let Some(ty) = ElemType::from_tag(tag) else {
            return Err(Error::MalformedStream {
                reason: "unrecognized scalar tag",
                offset: Some(at),
            });
        };
        match ty {
            ElemType::I8 => Ok(Value::Int(i8::take(&mut *self)?.into())),
            ElemType::I16 => Ok(Value::Int(i16::take(&mut *self)?.into())),
            ElemType::I32 => Ok(Value::Int(i32::take(&mut *self)?.into())),
            ElemType::I64 => Ok(Value::Int(i64::take(&mut *self)?.into())),
            ElemType::U8 => Ok(Value::Int(u8::take(&mut *self)?.into())),
            ElemType::U16 => Ok(Value::Int(u16::take(&mut *self)?.into())),
            ElemType::U32 => Ok(Value::Int(u32::take(&mut *self)?.into())),
            ElemType::U64 => Ok(Value::Int(u64::take(&mut *self)?.into())),
            ElemType::F16 => Ok(Value::F16(f16::take(&mut *self)?)),
            ElemType::F32 => Ok(Value::F32(f32::take(&mut *self)?)),
            ElemType::F64 => Ok(Value::F64(f64::take(&mut *self)?)),
            ElemType::Varint => Ok(self.read_sleb()?.into()),
        }
    }

    /// Decodes one string in any of its three forms: back-reference, sized,
    /// or NUL-terminated.
    fn read_string(&mut self) -> Result<String> {
        let at = self.consumed;
        let head = self.next_byte()?;
        match head {
            tags::STR_BACKREF => {
                let dist = self.read_uleb()?;
                if dist >= self.lru.len() as u64 {
                    return Err(Error::MalformedStream {
                        reason: "string back-reference beyond the window",
                        offset: Some(at),
                    });
                }
                match self.lru.get(-(dist as isize)) {
                    Some(s) => Ok(s.into()),
                    None => Err(Error::MalformedStream {
                        reason: "string back-reference beyond the window",
                        offset: Some(at),
                    }),
                }
            }
            tags::STR_SIZED => {
                let len = self.read_uleb()? as usize;
                let mut buf = Vec::with_capacity(len.min(READ_CHUNK));
                while buf.len() < len {
                    let take = (len - buf.len()).min(READ_CHUNK);
                    let start = buf.len();
                    buf.resize(start + take, 0);
                    self.read_exact(&mut buf[start..])?;
                }
                String::from_utf8(buf).map_err(|_| Error::Unsupported("string is not valid UTF-8"))
            }
            _ => {
                let mut buf = Vec::new();
                let mut c = head;
                while c != tags::STR_TERM {
                    buf.push(c);
                    c = self.next_byte()?;
                }
                String::from_utf8(buf).map_err(|_| Error::Unsupported("string is not valid UTF-8"))
            }
        }
    }

    fn read_list(&mut self) -> Result<Vec<Value>> {
        let at = self.consumed;
        if self.next_byte()? != tags::LIST_START {
            return Err(Error::MalformedStream {
                reason: "expected a list start",
                offset: Some(at),
            });
        }
        let mut items = Vec::new();
        while self.peek_byte()? != tags::LIST_END {
            items.push(self.read_object()?);
        }
        self.next_byte()?;
        Ok(items)
    }

    fn read_dict(&mut self) -> Result<Value> {
        let at = self.consumed;
        if self.next_byte()? != tags::DICT_START {
            return Err(Error::MalformedStream {
                reason: "expected a dict start",
                offset: Some(at),
            });
        }
        let mut map = Map::default();
        while self.peek_byte()? != tags::DICT_END {
            let at = self.consumed;
            let key = match self.read_object()? {
                Value::Str(s) => s,
                _ => {
                    return Err(Error::MalformedStream {
                        reason: "dict key is not a string",
                        offset: Some(at),
                    });
                }
            };
            let val = self.read_object()?;
            map.insert(key, val);
        }
        self.next_byte()?;
        Ok(Value::Dict(map))
    }

    /// One typed array, either form. The non-chunked form stops after its
    /// single block; the chunked form accumulates until a zero count.
    fn read_typed_array(&mut self) -> Result<Value> {
        let chunked = self.next_byte()? == tags::ARRAY_CHUNKED;
        let at = self.consumed;
        let tag = self.next_byte()?;
        let Some(ty) = ElemType::from_tag(tag) else {
            return Err(Error::MalformedStream {
                reason: "unrecognized array element type",
                offset: Some(at),
            });
        };

        let mut arr = TypedArray::empty(ty);
        loop {
            let count = self.read_uleb()? as usize;
            if count == 0 {
                break;
            }
            self.read_chunk(count, &mut arr)?;
            if !chunked {
                break;
            }
        }
        Ok(Value::Array(arr))
    }

    fn read_chunk(&mut self, count: usize, arr: &mut TypedArray) -> Result<()> {
        match arr {
            TypedArray::I8(v) => {
                for _ in 0..count {
                    v.push(i8::take(&mut *self)?);
                }
            }
            TypedArray::I16(v) => {
                for _ in 0..count {
                    v.push(i16::take(&mut *self)?);
                }
            }
            TypedArray::I32(v) => {
                for _ in 0..count {
                    v.push(i32::take(&mut *self)?);
                }
            }
            TypedArray::I64(v) => {
                for _ in 0..count {
                    v.push(i64::take(&mut *self)?);
                }
            }
            TypedArray::U8(v) => {
                for _ in 0..count {
                    v.push(u8::take(&mut *self)?);
                }
            }
            TypedArray::U16(v) => {
                for _ in 0..count {
                    v.push(u16::take(&mut *self)?);
                }
            }
            TypedArray::U32(v) => {
                for _ in 0..count {
                    v.push(u32::take(&mut *self)?);
                }
            }
            TypedArray::U64(v) => {
                for _ in 0..count {
                    v.push(u64::take(&mut *self)?);
                }
            }
            TypedArray::F16(v) => {
                for _ in 0..count {
                    v.push(f16::take(&mut *self)?);
                }
            }
            TypedArray::F32(v) => {
                for _ in 0..count {
                    v.push(f32::take(&mut *self)?);
                }
            }
            TypedArray::F64(v) => {
                for _ in 0..count {
                    v.push(f64::take(&mut *self)?);
                }
            }
            TypedArray::Varint(v) => {
                for _ in 0..count {
                    let at = self.consumed;
                    match leb128::sleb128_read(&mut *self).map_err(|e| at_offset(e, at))? {
                        Sleb::Int(e) => v.push(e),
                        Sleb::Wide(_) => {
                            return Err(Error::Unsupported(
                                "varint array element exceeds 128 bits",
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn read_uleb(&mut self) -> Result<u64> {
        let at = self.consumed;
        leb128::uleb128_read(&mut *self).map_err(|e| at_offset(e, at))
    }

    fn read_sleb(&mut self) -> Result<Sleb> {
        let at = self.consumed;
        leb128::sleb128_read(&mut *self).map_err(|e| at_offset(e, at))
    }

    fn peek_byte(&mut self) -> Result<u8> {
        if let Some(b) = self.peeked {
            return Ok(b);
        }
        let mut buf = [0u8; 1];
        self.inp.read_exact(&mut buf)?;
        self.peeked = Some(buf[0]);
        Ok(buf[0])
    }

    fn next_byte(&mut self) -> Result<u8> {
        if let Some(b) = self.peeked.take() {
            self.consumed += 1;
            return Ok(b);
        }
        let mut buf = [0u8; 1];
        self.inp.read_exact(&mut buf)?;
        self.consumed += 1;
        Ok(buf[0])
    }

    fn malformed(&self, reason: &'static str) -> Error {
        Error::MalformedStream {
            reason,
            offset: Some(self.consumed),
        }
    }
}

/// Pins the offset of a location-free error to where the read started.
fn at_offset(err: Error, at: usize) -> Error {
    match err {
        Error::MalformedStream {
            reason,
            offset: None,
        } => Error::MalformedStream {
            reason,
            offset: Some(at),
        },
        other => other,
    }
}
