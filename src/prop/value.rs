//! Decoded property values

use std::fmt;

use crate::backend::WindowRef;
use crate::prop::hints::{SizeHints, WmHints};
use crate::prop::icons::Icon;
use crate::prop::strut::Strut;

/// Native kind of a [`PropValue`], checked against a descriptor on both
/// encode and decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Cardinal,
    Window,
    SizeHints,
    WmHints,
    Strut,
    Icon,
    Bytes,
}

/// One typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// UTF-8 or Latin-1 text, or an atom name
    Text(String),
    Cardinal(u32),
    Window(WindowRef),
    SizeHints(SizeHints),
    WmHints(WmHints),
    Strut(Strut),
    Icon(Icon),
    Bytes(Vec<u8>),
}

impl PropValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            PropValue::Text(_) => ValueKind::Text,
            PropValue::Cardinal(_) => ValueKind::Cardinal,
            PropValue::Window(_) => ValueKind::Window,
            PropValue::SizeHints(_) => ValueKind::SizeHints,
            PropValue::WmHints(_) => ValueKind::WmHints,
            PropValue::Strut(_) => ValueKind::Strut,
            PropValue::Icon(_) => ValueKind::Icon,
            PropValue::Bytes(_) => ValueKind::Bytes,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_cardinal(&self) -> Option<u32> {
        match self {
            PropValue::Cardinal(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_window(&self) -> Option<WindowRef> {
        match self {
            PropValue::Window(w) => Some(*w),
            _ => None,
        }
    }

    pub fn as_size_hints(&self) -> Option<&SizeHints> {
        match self {
            PropValue::SizeHints(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_wm_hints(&self) -> Option<&WmHints> {
        match self {
            PropValue::WmHints(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_strut(&self) -> Option<&Strut> {
        match self {
            PropValue::Strut(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_icon(&self) -> Option<&Icon> {
        match self {
            PropValue::Icon(i) => Some(i),
            _ => None,
        }
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Text(s)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Text(s.to_string())
    }
}

impl From<u32> for PropValue {
    fn from(c: u32) -> Self {
        PropValue::Cardinal(c)
    }
}

impl From<WindowRef> for PropValue {
    fn from(w: WindowRef) -> Self {
        PropValue::Window(w)
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Text(s) => write!(f, "{:?}", s),
            PropValue::Cardinal(c) => write!(f, "{}", c),
            PropValue::Window(w) => write!(f, "window {}", w),
            PropValue::SizeHints(h) => write!(f, "{:?}", h),
            PropValue::WmHints(h) => write!(f, "{:?}", h),
            PropValue::Strut(s) => write!(f, "{:?}", s),
            PropValue::Icon(i) => write!(f, "icon {}x{}", i.width, i.height),
            PropValue::Bytes(b) => write!(f, "{} bytes", b.len()),
        }
    }
}

/// Result of a property read: a scalar or a list, following the
/// [`TypeSpec`](crate::prop::types::TypeSpec) it was requested with.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(PropValue),
    List(Vec<PropValue>),
}

impl PropertyValue {
    pub fn as_scalar(&self) -> Option<&PropValue> {
        match self {
            PropertyValue::Scalar(v) => Some(v),
            PropertyValue::List(_) => None,
        }
    }

    pub fn into_scalar(self) -> Option<PropValue> {
        match self {
            PropertyValue::Scalar(v) => Some(v),
            PropertyValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropValue]> {
        match self {
            PropertyValue::Scalar(_) => None,
            PropertyValue::List(values) => Some(values),
        }
    }

    pub fn into_list(self) -> Option<Vec<PropValue>> {
        match self {
            PropertyValue::Scalar(_) => None,
            PropertyValue::List(values) => Some(values),
        }
    }
}

impl From<PropValue> for PropertyValue {
    fn from(v: PropValue) -> Self {
        PropertyValue::Scalar(v)
    }
}

impl From<Vec<PropValue>> for PropertyValue {
    fn from(values: Vec<PropValue>) -> Self {
        PropertyValue::List(values)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Scalar(v) => write!(f, "{}", v),
            PropertyValue::List(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
        }
    }
}
