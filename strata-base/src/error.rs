// We want a few things here:
// 1. A way to create a new error with a backtrace
// 2. A way to centralize setting a breakpoint to trap any error in the system fairly soon
//    after it's created (or at least when it's propagated from a library we use back to us)
// 3. Same but for logging / emitting error messages into the tracing/logging system
// 4. A small closed taxonomy callers can match on, without exposing the backtrace machinery.

use std::borrow::Cow;
use std::fmt;

use backtrace_error::DynBacktraceError;
use tracing::error;

#[cfg(test)]
use test_log::test;

/// Coarse classification callers can match on. `NumericOverflow` never reaches
/// a caller: codecs recover from it locally by falling back to verbatim mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OutOfMemory,
    InvalidArgument,
    CorruptEncoding,
    NumericOverflow,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::OutOfMemory => "out of memory",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::CorruptEncoding => "corrupt encoding",
            ErrorKind::NumericOverflow => "numeric overflow",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
#[allow(dead_code)]
pub struct Error {
    kind: ErrorKind,
    inner: DynBacktraceError,
}
pub type Result<T> = std::result::Result<T, Error>;

struct KindErr(ErrorKind, Cow<'static, str>);
impl fmt::Debug for KindErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.0, self.1)
    }
}
impl fmt::Display for KindErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.0, self.1)
    }
}
impl std::error::Error for KindErr {
    fn description(&self) -> &str {
        &self.1
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<E> for Error {
    fn from(err: E) -> Error {
        Error::new(ErrorKind::InvalidArgument, err)
    }
}

impl Error {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(kind: ErrorKind, err: E) -> Error {
        error!(target: "strata", kind = %kind, "{:?}", err);
        Error {
            kind,
            inner: DynBacktraceError::from(err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn out_of_memory(msg: impl Into<Cow<'static, str>>) -> Error {
        Error::new(ErrorKind::OutOfMemory, KindErr(ErrorKind::OutOfMemory, msg.into()))
    }

    pub fn invalid_argument(msg: impl Into<Cow<'static, str>>) -> Error {
        Error::new(
            ErrorKind::InvalidArgument,
            KindErr(ErrorKind::InvalidArgument, msg.into()),
        )
    }

    pub fn corrupt_encoding(msg: impl Into<Cow<'static, str>>) -> Error {
        Error::new(
            ErrorKind::CorruptEncoding,
            KindErr(ErrorKind::CorruptEncoding, msg.into()),
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Untyped convenience constructor, kept for parity with call sites that don't
/// care which bucket an error lands in. Prefer the `Error::{kind}` constructors
/// in new code.
pub fn err(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::invalid_argument(msg)
}

#[test]
fn test_error() {
    let e = err("test error");
    assert_eq!(e.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_error_kinds() {
    assert_eq!(Error::out_of_memory("oom").kind(), ErrorKind::OutOfMemory);
    assert_eq!(
        Error::corrupt_encoding("bad selector").kind(),
        ErrorKind::CorruptEncoding
    );
}
