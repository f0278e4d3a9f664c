//! Property Type Registry
//!
//! Maps each semantic property type to its wire contract: the type atom, the
//! format, the list convention and the encoder/decoder pair.

use std::fmt;
use std::str::FromStr;

use crate::backend::PropertyBackend;
use crate::prop::codec;
use crate::prop::error::{DecodeError, EncodeError};
use crate::prop::hints;
use crate::prop::icons;
use crate::prop::strut;
use crate::prop::value::{PropValue, ValueKind};

/// Property format: the size of one storage unit in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Eight = 8,
    Sixteen = 16,
    ThirtyTwo = 32,
}

impl Format {
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Width of one storage unit in bytes
    pub fn unit_bytes(self) -> usize {
        self as usize / 8
    }
}

/// Type atom requested on fetch / written on store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// AnyPropertyType: accept whatever type is stored.
    Any,
    Named(&'static str),
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireType::Any => f.write_str("AnyPropertyType"),
            WireType::Named(name) => f.write_str(name),
        }
    }
}

/// How the elements of a list property are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListJoin {
    /// Elements separated (not terminated) by a byte sequence, ICCCM 2.7.1.
    Separated(&'static [u8]),
    /// Fixed-width elements back to back.
    Packed,
    /// Single-record types.
    Unsupported,
}

/// Semantic property types understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropType {
    Utf8,
    Latin1,
    Atom,
    U32,
    Window,
    WmSizeHints,
    WmHints,
    Strut,
    StrutPartial,
    Icon,
    /// Raw CARDINAL bytes, used to upload hand-built records.
    DebugCardinal,
    /// Atom pairs of a MULTIPLE selection conversion, fetched with any type.
    MultipleConversion,
}

impl PropType {
    pub const ALL: [PropType; 12] = [
        PropType::Utf8,
        PropType::Latin1,
        PropType::Atom,
        PropType::U32,
        PropType::Window,
        PropType::WmSizeHints,
        PropType::WmHints,
        PropType::Strut,
        PropType::StrutPartial,
        PropType::Icon,
        PropType::DebugCardinal,
        PropType::MultipleConversion,
    ];

    pub fn name(self) -> &'static str {
        REGISTRY.descriptor(self).name
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for PropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A requested property shape: one value, or a list of values of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    Scalar(PropType),
    List(PropType),
}

impl TypeSpec {
    pub fn prop_type(self) -> PropType {
        match self {
            TypeSpec::Scalar(t) | TypeSpec::List(t) => t,
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, TypeSpec::List(_))
    }
}

impl From<PropType> for TypeSpec {
    fn from(t: PropType) -> Self {
        TypeSpec::Scalar(t)
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Scalar(t) => write!(f, "{}", t),
            TypeSpec::List(t) => write!(f, "[{}]", t),
        }
    }
}

/// `utf8` parses as a scalar, `[utf8]` as a list.
impl FromStr for TypeSpec {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (inner, list) = match s.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            Some(inner) => (inner.trim(), true),
            None => (s, false),
        };
        let t = PropType::from_name(inner).ok_or_else(|| UnknownType(s.to_string()))?;
        Ok(if list { TypeSpec::List(t) } else { TypeSpec::Scalar(t) })
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown property type '{0}'")]
pub struct UnknownType(pub String);

pub type EncodeFn = fn(&dyn PropertyBackend, &PropValue) -> Result<Vec<u8>, EncodeError>;
pub type DecodeFn = fn(&dyn PropertyBackend, &[u8]) -> Result<Option<PropValue>, DecodeError>;

/// Wire contract of one property type
#[derive(Debug)]
pub struct TypeDescriptor {
    pub prop_type: PropType,
    pub name: &'static str,
    pub accepts: &'static [ValueKind],
    pub wire_type: WireType,
    pub format: Format,
    /// `None` for decode-only types.
    pub encode: Option<EncodeFn>,
    pub decode: DecodeFn,
    pub join: ListJoin,
}

impl TypeDescriptor {
    pub fn accepts(&self, kind: ValueKind) -> bool {
        self.accepts.contains(&kind)
    }
}

/// Immutable table of every [`TypeDescriptor`], indexed by [`PropType`].
#[derive(Debug)]
pub struct TypeRegistry {
    descriptors: [TypeDescriptor; PropType::ALL.len()],
}

impl TypeRegistry {
    pub fn descriptor(&self, prop_type: PropType) -> &TypeDescriptor {
        &self.descriptors[prop_type as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.descriptors.iter()
    }
}

const NUL: &[u8] = b"\0";

/// The process-wide registry. Entries are in `PropType` declaration order.
pub static REGISTRY: TypeRegistry = TypeRegistry {
    descriptors: [
        TypeDescriptor {
            prop_type: PropType::Utf8,
            name: "utf8",
            accepts: &[ValueKind::Text],
            wire_type: WireType::Named("UTF8_STRING"),
            format: Format::Eight,
            encode: Some(codec::encode_utf8),
            decode: codec::decode_utf8,
            join: ListJoin::Separated(NUL),
        },
        TypeDescriptor {
            prop_type: PropType::Latin1,
            name: "latin1",
            accepts: &[ValueKind::Text],
            wire_type: WireType::Named("STRING"),
            format: Format::Eight,
            encode: Some(codec::encode_latin1),
            decode: codec::decode_latin1,
            join: ListJoin::Separated(NUL),
        },
        TypeDescriptor {
            prop_type: PropType::Atom,
            name: "atom",
            accepts: &[ValueKind::Text],
            wire_type: WireType::Named("ATOM"),
            format: Format::ThirtyTwo,
            encode: Some(codec::encode_atom),
            decode: codec::decode_atom,
            join: ListJoin::Packed,
        },
        TypeDescriptor {
            prop_type: PropType::U32,
            name: "u32",
            accepts: &[ValueKind::Cardinal],
            wire_type: WireType::Named("CARDINAL"),
            format: Format::ThirtyTwo,
            encode: Some(codec::encode_cardinal),
            decode: codec::decode_cardinal,
            join: ListJoin::Packed,
        },
        TypeDescriptor {
            prop_type: PropType::Window,
            name: "window",
            accepts: &[ValueKind::Window],
            wire_type: WireType::Named("WINDOW"),
            format: Format::ThirtyTwo,
            encode: Some(codec::encode_window),
            decode: codec::decode_window,
            join: ListJoin::Packed,
        },
        TypeDescriptor {
            prop_type: PropType::WmSizeHints,
            name: "wm-size-hints",
            accepts: &[ValueKind::SizeHints],
            wire_type: WireType::Named("WM_SIZE_HINTS"),
            format: Format::ThirtyTwo,
            encode: None,
            decode: hints::decode_size_hints,
            join: ListJoin::Unsupported,
        },
        TypeDescriptor {
            prop_type: PropType::WmHints,
            name: "wm-hints",
            accepts: &[ValueKind::WmHints],
            wire_type: WireType::Named("WM_HINTS"),
            format: Format::ThirtyTwo,
            encode: None,
            decode: hints::decode_wm_hints,
            join: ListJoin::Unsupported,
        },
        TypeDescriptor {
            prop_type: PropType::Strut,
            name: "strut",
            accepts: &[ValueKind::Strut],
            wire_type: WireType::Named("CARDINAL"),
            format: Format::ThirtyTwo,
            encode: None,
            decode: strut::decode_strut,
            join: ListJoin::Unsupported,
        },
        TypeDescriptor {
            prop_type: PropType::StrutPartial,
            name: "strut-partial",
            accepts: &[ValueKind::Strut],
            wire_type: WireType::Named("CARDINAL"),
            format: Format::ThirtyTwo,
            encode: None,
            decode: strut::decode_strut,
            join: ListJoin::Unsupported,
        },
        TypeDescriptor {
            prop_type: PropType::Icon,
            name: "icon",
            accepts: &[ValueKind::Icon],
            wire_type: WireType::Named("CARDINAL"),
            format: Format::ThirtyTwo,
            encode: None,
            decode: icons::decode_icons,
            join: ListJoin::Unsupported,
        },
        TypeDescriptor {
            prop_type: PropType::DebugCardinal,
            name: "debug-CARDINAL",
            accepts: &[ValueKind::Bytes],
            wire_type: WireType::Named("CARDINAL"),
            format: Format::ThirtyTwo,
            encode: Some(codec::encode_bytes),
            decode: codec::decode_bytes,
            join: ListJoin::Unsupported,
        },
        TypeDescriptor {
            prop_type: PropType::MultipleConversion,
            name: "multiple-conversion",
            accepts: &[ValueKind::Text],
            wire_type: WireType::Any,
            format: Format::ThirtyTwo,
            encode: None,
            decode: codec::decode_atom,
            join: ListJoin::Packed,
        },
    ],
};
