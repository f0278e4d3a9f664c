//! Area Props
//!
//! Typed access to X11 window properties. Windows carry untyped byte buffers
//! tagged with a type atom and a format (8/16/32); this crate converts them to
//! and from typed values following the ICCCM and EWMH conventions.
//!
//! The entry point is [`PropertyStore`], which pairs the codec with a
//! [`PropertyBackend`]: either a live X server ([`X11Backend`]) or an
//! in-memory property table ([`MemoryBackend`]).

pub mod backend;
pub mod config;
pub mod prop;

pub use backend::memory::MemoryBackend;
pub use backend::x11::X11Backend;
pub use backend::{BackendError, FetchError, PropertyBackend, RawProperty, WindowRef};
pub use config::Config;
pub use prop::error::{DecodeError, EncodeError, PropError};
pub use prop::hints::{SizeHints, WmHints};
pub use prop::icons::Icon;
pub use prop::strut::Strut;
pub use prop::types::{Format, ListJoin, PropType, TypeDescriptor, TypeRegistry, TypeSpec, WireType, REGISTRY};
pub use prop::value::{PropValue, PropertyValue, ValueKind};
pub use prop::PropertyStore;
