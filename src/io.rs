//! Lightweight, no-std compatible I/O traits and adapters used by the codec.
mod cursor;

pub use cursor::*;

/// Error type returned by encoding/decoding and I/O adapters.
#[derive(Debug)]
pub enum Error {
    /// The source ran out of bytes in the middle of a value or varint.
    UnexpectedEof,
    /// The sink had insufficient capacity to accept all bytes.
    SinkFull,
    /// A byte sequence no grammar rule accepts. The offset is the position of
    /// the offending byte when the source exposes one.
    MalformedStream {
        reason: &'static str,
        offset: Option<usize>,
    },
    /// The stream carries a magic lead-in that is not the MuON magic.
    InvalidMagic,
    /// A value the format (or this host) cannot represent.
    Unsupported(&'static str),
    /// A caller-side contract violation, not an input fault.
    InvariantViolation(&'static str),
    #[cfg(feature = "std")]
    /// Wrapped `std::io::Error` when using the `std` feature.
    StdIo(std::io::Error),
    #[cfg(not(feature = "std"))]
    /// Placeholder for `std::io::Error` when `std` is unavailable.
    StdIo(StdIoShim),
}

#[cfg(not(feature = "std"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Empty stand-in used as a no-std substitute for `std::io::Error`.
pub enum StdIoShim {}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::UnexpectedEof => write!(f, "Unexpected end of stream inside a value"),
            Error::SinkFull => write!(f, "Tried to write past the capacity of the sink"),
            Error::MalformedStream {
                reason,
                offset: Some(offset),
            } => {
                write!(f, "Malformed stream at byte {offset}: {reason}")
            }
            Error::MalformedStream {
                reason,
                offset: None,
            } => write!(f, "Malformed stream: {reason}"),
            Error::InvalidMagic => write!(f, "Stream does not carry the MuON magic"),
            Error::Unsupported(what) => write!(f, "Unsupported encoding: {what}"),
            Error::InvariantViolation(what) => write!(f, "Invariant violation: {what}"),
            #[cfg(feature = "std")]
            Error::StdIo(e) => write!(f, "IO error: {e}"),
            #[cfg(not(feature = "std"))]
            Error::StdIo(_) => write!(f, "IO error (shimmed)"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    #[inline(always)]
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::StdIo(err)
        }
    }
}

#[cfg(feature = "std")]
impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::UnexpectedEof => {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "End of data")
            }
            Error::SinkFull => std::io::Error::new(std::io::ErrorKind::WriteZero, "Write short"),
            Error::MalformedStream { .. } | Error::InvalidMagic => {
                std::io::Error::new(std::io::ErrorKind::InvalidData, "Invalid data")
            }
            Error::Unsupported(what) => std::io::Error::new(std::io::ErrorKind::Unsupported, what),
            Error::InvariantViolation(what) => std::io::Error::other(what),
            Error::StdIo(e) => e,
        }
    }
}

/// Minimal read abstraction used by this crate in both std and no-std modes.
pub trait Read {
    /// Fills `buf` with bytes from the underlying source, returning the number
    /// of bytes read or an error if no data is available.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Fills all of `buf`, failing with [`Error::UnexpectedEof`] on a short
    /// read.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..])? {
                0 => return Err(Error::UnexpectedEof),
                n => filled += n,
            }
        }
        Ok(())
    }
}

/// Minimal write abstraction used by this crate in both std and no-std modes.
pub trait Write {
    /// Writes the entire `buf` into the underlying sink when possible and
    /// returns the number of bytes written.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Flushes any internal buffers, if applicable.
    fn flush(&mut self) -> Result<()>;

    /// Writes all of `buf`, failing with [`Error::SinkFull`] on a short write.
    fn write_all(&mut self, buf: &[u8]) -> Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            match self.write(&buf[written..])? {
                0 => return Err(Error::SinkFull),
                n => written += n,
            }
        }
        Ok(written)
    }
}

impl<T: Read + ?Sized> Read for &mut T {
    #[inline(always)]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
}

impl<T: Write + ?Sized> Write for &mut T {
    #[inline(always)]
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

impl Write for Vec<u8> {
    #[inline(always)]
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<()> {
        // No-op for Vec, as it doesn't have an underlying buffer to flush
        Ok(())
    }
}

impl Read for &[u8] {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.is_empty() {
            return Err(Error::UnexpectedEof);
        }
        let n = buf.len().min(self.len());
        let (head, tail) = self.split_at(n);
        buf[..n].copy_from_slice(head);
        *self = tail;
        Ok(n)
    }
}

/// Bridges any [`std::io::Read`] into this crate's [`Read`].
#[cfg(feature = "std")]
pub struct IoReader<R>(pub R);

#[cfg(feature = "std")]
impl<R: std::io::Read> Read for IoReader<R> {
    #[inline(always)]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.0.read(buf).map_err(Error::from)
    }
}

/// Bridges any [`std::io::Write`] into this crate's [`Write`].
#[cfg(feature = "std")]
pub struct IoWriter<W>(pub W);

#[cfg(feature = "std")]
impl<W: std::io::Write> Write for IoWriter<W> {
    #[inline(always)]
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.0.write(buf).map_err(Error::from)
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<()> {
        self.0.flush().map_err(Error::from)
    }
}

#[test]
fn test_write_vec() {
    let mut my_vec = Vec::new();
    let data = b"Hello, world!";

    assert_eq!(Write::write(&mut my_vec, data).unwrap(), data.len());
    assert_eq!(my_vec, data);
}

#[test]
fn test_read_exact_short_input() {
    let data = [0x01u8, 0x02];
    let mut cursor = Cursor::new(&data[..]);
    let mut buf = [0u8; 4];
    assert!(matches!(
        cursor.read_exact(&mut buf),
        Err(Error::UnexpectedEof)
    ));
}

#[test]
fn test_slice_reader() {
    let mut source: &[u8] = &[1, 2, 3];
    let mut buf = [0u8; 2];
    assert_eq!(source.read(&mut buf).unwrap(), 2);
    assert_eq!(buf, [1, 2]);
    assert_eq!(source.read(&mut buf).unwrap(), 1);
    assert!(matches!(source.read(&mut buf), Err(Error::UnexpectedEof)));
}

#[cfg(feature = "std")]
#[test]
fn test_std_adapters() {
    let mut sink = IoWriter(Vec::new());
    sink.write_all(&[0xAA, 0xBB]).unwrap();
    sink.flush().unwrap();
    assert_eq!(sink.0, vec![0xAA, 0xBB]);

    let mut source = IoReader(std::io::Cursor::new(vec![0x01u8]));
    let mut buf = [0u8; 1];
    source.read_exact(&mut buf).unwrap();
    assert_eq!(buf, [0x01]);
}
