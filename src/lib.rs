//! Encoder and decoder for the MuON binary object notation: a self-describing,
//! schema-less serialization of JSON-shaped values (null, booleans, integers,
//! floats, strings, lists, dictionaries, and homogeneous typed arrays).
//!
//! Document-shaped data compresses well because repeated strings are written
//! once and then back-referenced through a bounded window: a static dictionary
//! emitted at the head of the stream, plus strings promoted on reuse while
//! writing. See [`write_value`]/[`read_value`] for the one-shot API and
//! [`Writer`]/[`Reader`] for streaming use.
#![cfg_attr(not(any(feature = "std", test)), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod dict;
pub mod io;
pub mod leb128;
pub mod lru;
pub mod reader;
pub mod scalar;
pub mod value;
pub mod writer;

pub mod prelude {
    pub use crate::dict::DictBuilder;
    pub use crate::io::*;
    pub use crate::leb128::{Sleb, WideInt};
    pub use crate::lru::LruWindow;
    pub use crate::reader::Reader;
    pub use crate::scalar::{ElemType, Scalar};
    pub use crate::value::{Map, TypedArray, Value};
    pub use crate::writer::{WriteOptions, Writer};
    pub use crate::{MUON_MAGIC, build_static_dict, read_value, write_value};
}

use prelude::*;

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

/// Four-byte prefix identifying a MuON stream.
pub const MUON_MAGIC: [u8; 4] = [0x8F, 0xB5, 0x30, 0x31];

/// Wire tag bytes. The whole allocation; everything else is either a string
/// head byte or malformed.
pub mod tags {
    /// Terminates the plain (non-sized) string form.
    pub const STR_TERM: u8 = 0x00;
    /// String back-reference into the LRU window.
    pub const STR_BACKREF: u8 = 0x81;
    /// Length-prefixed string form.
    pub const STR_SIZED: u8 = 0x82;
    /// Typed array, single count + payload block.
    pub const ARRAY: u8 = 0x84;
    /// Typed array, (count, payload) chunks ended by a zero count.
    pub const ARRAY_CHUNKED: u8 = 0x85;
    /// Item-count annotation; informational, skipped on read.
    pub const COUNT_NOTE: u8 = 0x8A;
    /// Byte-size annotation; informational, skipped on read.
    pub const SIZE_NOTE: u8 = 0x8B;
    /// LRU directive: a table preamble or a single promoted string.
    pub const LRU: u8 = 0x8C;
    /// First byte of the stream magic.
    pub const MAGIC_LEAD: u8 = 0x8F;
    pub const LIST_START: u8 = 0x90;
    pub const LIST_END: u8 = 0x91;
    pub const DICT_START: u8 = 0x92;
    pub const DICT_END: u8 = 0x93;
    /// Base of the small-integer fast path; covers `0xA0..=0xA9`.
    pub const SMALL_INT: u8 = 0xA0;
    pub const FALSE: u8 = 0xAA;
    pub const TRUE: u8 = 0xAB;
    pub const NULL: u8 = 0xAC;
    pub const NAN: u8 = 0xAD;
    pub const NEG_INF: u8 = 0xAE;
    pub const POS_INF: u8 = 0xAF;
    /// SLEB128 integer scalar.
    pub const SLEB: u8 = 0xBB;
    /// Explicit padding, skipped wherever a value may start.
    pub const PADDING: u8 = 0xFF;
}

/// Static tables at most this long are staged for on-reuse promotion instead
/// of being written as a preamble.
const DYNAMIC_STAGE_MAX: usize = 128;

/// Runs the [`DictBuilder`] over `value` and returns the selected static
/// dictionary, at most `cap` entries.
pub fn build_static_dict(value: &Value, cap: usize) -> Vec<String> {
    let mut builder = DictBuilder::new();
    builder.add(value);
    builder.get_dict(cap)
}

/// Encodes `value` into `sink` as a complete MuON stream: magic, string-table
/// preamble (when one is worth writing), then the value tree.
///
/// Small string tables are staged dynamically so only strings that actually
/// repeat pay the promotion byte; larger tables are written up front in
/// reverse score order, which lands the hottest strings nearest the tail of
/// the window where back-references are shortest.
///
/// Returns the number of bytes written.
pub fn write_value<W: Write>(sink: W, value: &Value, options: &WriteOptions) -> Result<usize> {
    let mut writer = Writer::new(sink).detect_arrays(options.detect_arrays);
    let mut written = writer.tag_muon()?;

    let table = match &options.static_dict {
        Some(table) => table.clone(),
        None => build_static_dict(value, options.static_dict_cap),
    };
    if table.len() > DYNAMIC_STAGE_MAX {
        let mut table = table;
        table.reverse();
        written += writer.add_lru_list(&table)?;
    } else {
        writer.add_lru_dynamic(&table);
    }

    written += writer.add(value)?;
    writer.flush()?;
    Ok(written)
}

/// Decodes a single value from `source`.
///
/// A leading magic, `0xFF` padding, and count/size annotations are all
/// accepted and skipped; the magic, when present, is verified.
pub fn read_value<R: Read>(source: R) -> Result<Value> {
    Reader::new(source).read_object()
}
