//! Property Backends
//!
//! The low-level side of property access: fetching and storing raw byte
//! buffers on a window, and resolving atoms and window ids for the codec.

pub mod memory;
pub mod x11;

use std::fmt;

use thiserror::Error;

use crate::prop::types::{Format, WireType};

/// Opaque reference to a window on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowRef(u32);

impl WindowRef {
    /// Wrap a raw window id without checking that it exists.
    ///
    /// Backends hand out checked references through
    /// [`PropertyBackend::window_handle`]; this is for ids that are already
    /// known to be live (the root window, ids taken from a record).
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// X11 window id
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WindowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Untyped property contents: type atom name, format and bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProperty {
    pub type_name: String,
    pub format: Format,
    pub data: Vec<u8>,
}

impl RawProperty {
    pub fn new(type_name: impl Into<String>, format: Format, data: Vec<u8>) -> Self {
        Self {
            type_name: type_name.into(),
            format,
            data,
        }
    }
}

/// Failure classes of a property fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("no such property")]
    NoSuchProperty,

    #[error("bad property type: requested {requested}, stored {stored}")]
    BadPropertyType { requested: String, stored: String },

    #[error("property larger than the {limit} byte transfer limit")]
    PropertyOverflow { limit: usize },

    /// Anything else the transport reported, such as a destroyed window.
    #[error("property error: {0}")]
    Transport(String),
}

/// Errors from the backend outside of the fetch path.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("X11 connection error: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    #[error("X11 request failed: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),

    #[error("unknown atom {0}")]
    UnknownAtom(u32),

    #[error("bad window 0x{0:x}")]
    BadWindow(u32),

    #[error("{len} bytes is not a whole number of {format}-bit units")]
    BadLength { format: u8, len: usize },
}

/// Low-level property access against a display.
///
/// `fetch` is synchronized: it returns only once the server answered.
/// `store` and `delete` are not: they queue the request and return, and any
/// error the server raises later is delivered through the backend's own error
/// channel rather than through the call.
pub trait PropertyBackend {
    fn fetch(&self, target: WindowRef, key: &str, wire_type: WireType) -> Result<Vec<u8>, FetchError>;

    fn store(&self, target: WindowRef, key: &str, raw: RawProperty) -> Result<(), BackendError>;

    fn delete(&self, target: WindowRef, key: &str) -> Result<(), BackendError>;

    /// Intern `name`, creating the atom if needed.
    fn atom_id(&self, name: &str) -> Result<u32, BackendError>;

    fn atom_name(&self, id: u32) -> Result<String, BackendError>;

    /// Resolve a window id read off the wire into a handle.
    fn window_handle(&self, id: u32) -> Result<WindowRef, BackendError>;
}
