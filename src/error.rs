//! Crate-local error type, modeled on the `Error`/`Errno` pair used
//! throughout the teacher crate's storage layer.

use core::fmt;

/// Coarse error classes surfaced by the GC core and its collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Errno {
    /// A summary page, node page or data page could not be read.
    IoError,
    /// A caller-supplied argument was out of range or otherwise invalid.
    InvalidArgs,
    /// A requested segment, nid or inode was not found.
    NotFound,
    /// A checkpoint transaction was aborted.
    Aborted,
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Errno::IoError => "I/O error",
            Errno::InvalidArgs => "invalid arguments",
            Errno::NotFound => "not found",
            Errno::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug)]
pub struct Error {
    errno: Errno,
    msg: Option<&'static str>,
}

impl Error {
    pub fn new(errno: Errno) -> Self {
        Self { errno, msg: None }
    }

    pub fn with_msg(errno: Errno, msg: &'static str) -> Self {
        Self {
            errno,
            msg: Some(msg),
        }
    }

    pub fn errno(&self) -> Errno {
        self.errno
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.msg {
            Some(msg) => write!(f, "{}: {}", self.errno, msg),
            None => write!(f, "{}", self.errno),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;

/// Build and return an `Err(Error::with_msg(..))`, mirroring the teacher's
/// `return_errno_with_msg!` macro.
#[macro_export]
macro_rules! return_errno_with_msg {
    ($errno:expr, $msg:expr) => {
        return Err($crate::error::Error::with_msg($errno, $msg))
    };
}
