use thiserror::Error;

use crate::backend::BackendError;
use crate::prop::types::{PropType, TypeSpec};
use crate::prop::value::ValueKind;

/// The stored bytes could not be turned into a value of the requested type.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected {expected} bytes, got {len}")]
    BadLength { expected: usize, len: usize },

    #[error("{len} bytes is not a whole number of {unit} byte elements")]
    RaggedList { unit: usize, len: usize },

    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("list element {index} decoded to nothing")]
    MissingElement { index: usize },

    #[error("{prop_type} decoded to a {found:?} value")]
    KindMismatch { prop_type: PropType, found: ValueKind },

    #[error("{prop_type} cannot be read as a list")]
    NotListCapable { prop_type: PropType },

    #[error("aspect ratio {num}/{den} has a zero denominator")]
    ZeroAspectDenominator { num: u32, den: u32 },

    #[error("could not resolve value: {0}")]
    Resolve(#[from] BackendError),
}

/// A value could not be written as the requested type. These are caller
/// errors: the value or the type was wrong, not the data on the server.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("{prop_type} does not accept a {found:?} value")]
    KindMismatch { prop_type: PropType, found: ValueKind },

    #[error("{prop_type} is decode-only")]
    Unsupported { prop_type: PropType },

    #[error("{prop_type} cannot be written as a list")]
    NotListCapable { prop_type: PropType },

    /// A list value for a scalar spec, or the other way round.
    #[error("value shape does not match {spec}")]
    ShapeMismatch { spec: TypeSpec },

    #[error("character {0:?} is not representable in Latin-1")]
    NotLatin1(char),

    #[error("could not resolve value: {0}")]
    Resolve(#[from] BackendError),
}

/// Errors surfaced by [`PropertyStore`](crate::prop::PropertyStore).
///
/// Expected conditions (missing property, type mismatch, vanished window)
/// are not errors; `get` reports them as `Ok(None)`.
#[derive(Debug, Error)]
pub enum PropError {
    #[error("property {key} exceeds the {limit} byte transfer limit")]
    Overflow { key: String, limit: usize },

    #[error("failed to decode property {key} as {spec}: {source}")]
    Decode {
        key: String,
        spec: TypeSpec,
        #[source]
        source: DecodeError,
    },

    #[error("failed to encode property {key} as {spec}: {source}")]
    Encode {
        key: String,
        spec: TypeSpec,
        #[source]
        source: EncodeError,
    },

    #[error("property backend error: {0}")]
    Backend(#[from] BackendError),
}
