//! Scalar and list codecs
//!
//! Scalars go through the per-type encoder/decoder from the registry. Lists
//! are either separator-joined (text) or packed fixed-width elements.

use tracing::warn;

use crate::backend::{PropertyBackend, RawProperty};
use crate::prop::error::{DecodeError, EncodeError};
use crate::prop::types::{ListJoin, PropType, TypeDescriptor, TypeSpec, WireType, REGISTRY};
use crate::prop::value::{PropValue, PropertyValue};

/// Encode `value` according to `spec`, ready to hand to the backend.
pub fn encode(
    backend: &dyn PropertyBackend,
    spec: TypeSpec,
    value: &PropertyValue,
) -> Result<RawProperty, EncodeError> {
    let descriptor = REGISTRY.descriptor(spec.prop_type());
    if descriptor.encode.is_none() {
        return Err(EncodeError::Unsupported {
            prop_type: descriptor.prop_type,
        });
    }
    let data = match (spec, value) {
        (TypeSpec::Scalar(_), PropertyValue::Scalar(v)) => encode_scalar(backend, descriptor, v)?,
        (TypeSpec::List(_), PropertyValue::List(values)) => encode_list(backend, descriptor, values)?,
        _ => return Err(EncodeError::ShapeMismatch { spec }),
    };
    let type_name = match descriptor.wire_type {
        WireType::Named(name) => name,
        // Nothing can be stored as AnyPropertyType.
        WireType::Any => return Err(EncodeError::Unsupported { prop_type: descriptor.prop_type }),
    };
    Ok(RawProperty::new(type_name, descriptor.format, data))
}

/// Decode fetched bytes according to `spec`.
///
/// `Ok(None)` means the data held no value (an icon stream without images).
pub fn decode(
    backend: &dyn PropertyBackend,
    spec: TypeSpec,
    data: &[u8],
) -> Result<Option<PropertyValue>, DecodeError> {
    let descriptor = REGISTRY.descriptor(spec.prop_type());
    match spec {
        TypeSpec::Scalar(_) => Ok(decode_scalar(backend, descriptor, data)?.map(PropertyValue::Scalar)),
        TypeSpec::List(_) => Ok(Some(PropertyValue::List(decode_list(backend, descriptor, data)?))),
    }
}

pub fn encode_scalar(
    backend: &dyn PropertyBackend,
    descriptor: &TypeDescriptor,
    value: &PropValue,
) -> Result<Vec<u8>, EncodeError> {
    let encode = descriptor.encode.ok_or(EncodeError::Unsupported {
        prop_type: descriptor.prop_type,
    })?;
    if !descriptor.accepts(value.kind()) {
        return Err(EncodeError::KindMismatch {
            prop_type: descriptor.prop_type,
            found: value.kind(),
        });
    }
    encode(backend, value)
}

pub fn decode_scalar(
    backend: &dyn PropertyBackend,
    descriptor: &TypeDescriptor,
    data: &[u8],
) -> Result<Option<PropValue>, DecodeError> {
    let value = (descriptor.decode)(backend, data)?;
    if let Some(v) = &value {
        if !descriptor.accepts(v.kind()) {
            return Err(DecodeError::KindMismatch {
                prop_type: descriptor.prop_type,
                found: v.kind(),
            });
        }
    }
    Ok(value)
}

pub fn encode_list(
    backend: &dyn PropertyBackend,
    descriptor: &TypeDescriptor,
    values: &[PropValue],
) -> Result<Vec<u8>, EncodeError> {
    let separator: &[u8] = match descriptor.join {
        ListJoin::Separated(sep) => sep,
        ListJoin::Packed => &[],
        ListJoin::Unsupported => {
            return Err(EncodeError::NotListCapable {
                prop_type: descriptor.prop_type,
            });
        }
    };

    let mut out = Vec::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(separator);
        }
        out.extend(encode_scalar(backend, descriptor, value)?);
    }
    Ok(out)
}

pub fn decode_list(
    backend: &dyn PropertyBackend,
    descriptor: &TypeDescriptor,
    data: &[u8],
) -> Result<Vec<PropValue>, DecodeError> {
    let chunks: Vec<&[u8]> = match descriptor.join {
        // An empty property is an empty list, so `[""]` reads back as `[]`.
        ListJoin::Separated(_) if data.is_empty() => Vec::new(),
        ListJoin::Separated(sep) => split_on(data, sep),
        ListJoin::Packed => {
            let unit = descriptor.format.unit_bytes();
            if data.len() % unit != 0 {
                return Err(DecodeError::RaggedList { unit, len: data.len() });
            }
            data.chunks_exact(unit).collect()
        }
        ListJoin::Unsupported => {
            return Err(DecodeError::NotListCapable {
                prop_type: descriptor.prop_type,
            });
        }
    };

    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            decode_scalar(backend, descriptor, chunk)?.ok_or(DecodeError::MissingElement { index })
        })
        .collect()
}

fn split_on<'a>(data: &'a [u8], sep: &[u8]) -> Vec<&'a [u8]> {
    if sep.is_empty() {
        return vec![data];
    }
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + sep.len() <= data.len() {
        if &data[i..i + sep.len()] == sep {
            parts.push(&data[start..i]);
            i += sep.len();
            start = i;
        } else {
            i += 1;
        }
    }
    parts.push(&data[start..]);
    parts
}

/// Read one native-endian 32-bit unit; `data` must be exactly 4 bytes.
pub(crate) fn read_u32(data: &[u8]) -> Result<u32, DecodeError> {
    if data.len() != 4 {
        return Err(DecodeError::BadLength {
            expected: 4,
            len: data.len(),
        });
    }
    Ok(bytemuck::pod_read_unaligned(data))
}

/// Read a fixed-size record of `N` native-endian 32-bit words.
///
/// Short data is zero-padded and long data truncated, so legacy and sloppy
/// writers still decode; any length mismatch is logged.
pub(crate) fn read_record<const N: usize>(what: &str, data: &[u8]) -> [u32; N] {
    let expected = N * 4;
    if data.len() != expected {
        warn!(
            "Odd-lengthed {} property: wanted {} bytes, got {}: {:02x?}",
            what,
            expected,
            data.len(),
            &data[..data.len().min(expected)]
        );
    }
    let mut words = [0u32; N];
    let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut words[..]);
    let len = data.len().min(expected);
    bytes[..len].copy_from_slice(&data[..len]);
    words
}

fn kind_mismatch(prop_type: PropType, value: &PropValue) -> EncodeError {
    EncodeError::KindMismatch {
        prop_type,
        found: value.kind(),
    }
}

pub(crate) fn encode_utf8(_: &dyn PropertyBackend, value: &PropValue) -> Result<Vec<u8>, EncodeError> {
    match value {
        PropValue::Text(s) => Ok(s.as_bytes().to_vec()),
        other => Err(kind_mismatch(PropType::Utf8, other)),
    }
}

pub(crate) fn decode_utf8(_: &dyn PropertyBackend, data: &[u8]) -> Result<Option<PropValue>, DecodeError> {
    Ok(Some(PropValue::Text(String::from_utf8(data.to_vec())?)))
}

pub(crate) fn encode_latin1(_: &dyn PropertyBackend, value: &PropValue) -> Result<Vec<u8>, EncodeError> {
    match value {
        PropValue::Text(s) => s
            .chars()
            .map(|c| u8::try_from(u32::from(c)).map_err(|_| EncodeError::NotLatin1(c)))
            .collect(),
        other => Err(kind_mismatch(PropType::Latin1, other)),
    }
}

pub(crate) fn decode_latin1(_: &dyn PropertyBackend, data: &[u8]) -> Result<Option<PropValue>, DecodeError> {
    Ok(Some(PropValue::Text(data.iter().map(|&b| char::from(b)).collect())))
}

pub(crate) fn encode_atom(backend: &dyn PropertyBackend, value: &PropValue) -> Result<Vec<u8>, EncodeError> {
    match value {
        PropValue::Text(name) => {
            let atom = backend.atom_id(name)?;
            Ok(bytemuck::bytes_of(&atom).to_vec())
        }
        other => Err(kind_mismatch(PropType::Atom, other)),
    }
}

pub(crate) fn decode_atom(backend: &dyn PropertyBackend, data: &[u8]) -> Result<Option<PropValue>, DecodeError> {
    let atom = read_u32(data)?;
    Ok(Some(PropValue::Text(backend.atom_name(atom)?)))
}

pub(crate) fn encode_cardinal(_: &dyn PropertyBackend, value: &PropValue) -> Result<Vec<u8>, EncodeError> {
    match value {
        PropValue::Cardinal(c) => Ok(bytemuck::bytes_of(c).to_vec()),
        other => Err(kind_mismatch(PropType::U32, other)),
    }
}

pub(crate) fn decode_cardinal(_: &dyn PropertyBackend, data: &[u8]) -> Result<Option<PropValue>, DecodeError> {
    Ok(Some(PropValue::Cardinal(read_u32(data)?)))
}

pub(crate) fn encode_window(_: &dyn PropertyBackend, value: &PropValue) -> Result<Vec<u8>, EncodeError> {
    match value {
        PropValue::Window(w) => Ok(bytemuck::bytes_of(&w.id()).to_vec()),
        other => Err(kind_mismatch(PropType::Window, other)),
    }
}

pub(crate) fn decode_window(backend: &dyn PropertyBackend, data: &[u8]) -> Result<Option<PropValue>, DecodeError> {
    let id = read_u32(data)?;
    // None, as in _NET_ACTIVE_WINDOW with nothing focused.
    if id == 0 {
        return Ok(None);
    }
    Ok(Some(PropValue::Window(backend.window_handle(id)?)))
}

pub(crate) fn encode_bytes(_: &dyn PropertyBackend, value: &PropValue) -> Result<Vec<u8>, EncodeError> {
    match value {
        PropValue::Bytes(b) => Ok(b.clone()),
        other => Err(kind_mismatch(PropType::DebugCardinal, other)),
    }
}

pub(crate) fn decode_bytes(_: &dyn PropertyBackend, data: &[u8]) -> Result<Option<PropValue>, DecodeError> {
    Ok(Some(PropValue::Bytes(data.to_vec())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::prop::types::Format;

    fn text_list(items: &[&str]) -> PropertyValue {
        PropertyValue::List(items.iter().map(|s| PropValue::from(*s)).collect())
    }

    #[test]
    fn test_text_list_is_nul_separated() {
        let backend = MemoryBackend::new();
        let spec = TypeSpec::List(PropType::Utf8);

        let raw = encode(&backend, spec, &text_list(&["a", "b", "c"])).unwrap();
        assert_eq!(raw.data, b"a\0b\0c");
        assert_eq!(raw.type_name, "UTF8_STRING");
        assert_eq!(raw.format, Format::Eight);

        let decoded = decode(&backend, spec, &raw.data).unwrap().unwrap();
        assert_eq!(decoded, text_list(&["a", "b", "c"]));
    }

    #[test]
    fn test_cardinal_list_is_packed() {
        let backend = MemoryBackend::new();
        let spec = TypeSpec::List(PropType::U32);
        let value = PropertyValue::List(vec![1u32.into(), 0xdead_beefu32.into(), 7u32.into()]);

        let raw = encode(&backend, spec, &value).unwrap();
        assert_eq!(raw.data.len(), 12);
        assert_eq!(raw.type_name, "CARDINAL");
        assert_eq!(&raw.data[4..8], &0xdead_beefu32.to_ne_bytes());

        assert_eq!(decode(&backend, spec, &raw.data).unwrap(), Some(value));
    }

    #[test]
    fn test_ragged_packed_list_fails() {
        let backend = MemoryBackend::new();
        let err = decode(&backend, TypeSpec::List(PropType::U32), &[0u8; 10]).unwrap_err();
        assert!(matches!(err, DecodeError::RaggedList { unit: 4, len: 10 }));
    }

    #[test]
    fn test_scalar_cardinal_needs_exact_width() {
        let backend = MemoryBackend::new();
        let err = decode(&backend, TypeSpec::Scalar(PropType::U32), &[0u8; 8]).unwrap_err();
        assert!(matches!(err, DecodeError::BadLength { expected: 4, len: 8 }));
    }

    #[test]
    fn test_scalar_round_trips() {
        let backend = MemoryBackend::new();
        let window = backend.create_window();
        let cases = [
            (PropType::Utf8, PropValue::from("grüße \u{1F600}")),
            (PropType::Utf8, PropValue::from("")),
            (PropType::Latin1, PropValue::from("café")),
            (PropType::Atom, PropValue::from("_NET_WM_STATE_ABOVE")),
            (PropType::U32, PropValue::Cardinal(u32::MAX)),
            (PropType::Window, PropValue::Window(window)),
            (PropType::DebugCardinal, PropValue::Bytes(vec![1, 2, 3, 4, 5, 6, 7, 8])),
        ];
        for (prop_type, value) in cases {
            let spec = TypeSpec::Scalar(prop_type);
            let raw = encode(&backend, spec, &PropertyValue::Scalar(value.clone())).unwrap();
            let decoded = decode(&backend, spec, &raw.data).unwrap();
            assert_eq!(decoded, Some(PropertyValue::Scalar(value)), "{}", prop_type);
        }
    }

    #[test]
    fn test_list_round_trips() {
        let backend = MemoryBackend::new();
        let a = backend.create_window();
        let b = backend.create_window();
        let cases = [
            (PropType::Latin1, text_list(&["one", "", "three"])),
            (PropType::Atom, text_list(&["WM_DELETE_WINDOW", "WM_TAKE_FOCUS"])),
            (PropType::Window, PropertyValue::List(vec![a.into(), b.into()])),
            (PropType::U32, PropertyValue::List(Vec::new())),
            (PropType::Utf8, PropertyValue::List(Vec::new())),
        ];
        for (prop_type, value) in cases {
            let spec = TypeSpec::List(prop_type);
            let raw = encode(&backend, spec, &value).unwrap();
            assert_eq!(decode(&backend, spec, &raw.data).unwrap(), Some(value), "{}", spec);
        }
    }

    #[test]
    fn test_trailing_separator_yields_empty_element() {
        let backend = MemoryBackend::new();
        let decoded = decode(&backend, TypeSpec::List(PropType::Utf8), b"one\0two\0").unwrap();
        assert_eq!(decoded, Some(text_list(&["one", "two", ""])));
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let backend = MemoryBackend::new();
        let err = decode(&backend, TypeSpec::Scalar(PropType::Utf8), &[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, DecodeError::Utf8(_)));
    }

    #[test]
    fn test_latin1_rejects_wide_chars() {
        let backend = MemoryBackend::new();
        let err = encode(
            &backend,
            TypeSpec::Scalar(PropType::Latin1),
            &PropertyValue::Scalar("snow ☃".into()),
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::NotLatin1('☃')));
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        let backend = MemoryBackend::new();
        let err = encode(
            &backend,
            TypeSpec::Scalar(PropType::U32),
            &PropertyValue::Scalar("12".into()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EncodeError::KindMismatch {
                prop_type: PropType::U32,
                ..
            }
        ));
    }

    #[test]
    fn test_composites_cannot_be_encoded() {
        let backend = MemoryBackend::new();
        let value = PropertyValue::Scalar(PropValue::Bytes(vec![0; 48]));
        for prop_type in [PropType::Strut, PropType::Icon, PropType::WmHints] {
            let err = encode(&backend, TypeSpec::Scalar(prop_type), &value).unwrap_err();
            assert!(matches!(err, EncodeError::Unsupported { .. }), "{}", prop_type);
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let backend = MemoryBackend::new();
        let err = encode(
            &backend,
            TypeSpec::List(PropType::Utf8),
            &PropertyValue::Scalar("x".into()),
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_composite_list_is_rejected() {
        let backend = MemoryBackend::new();
        let err = decode(&backend, TypeSpec::List(PropType::Strut), &[0u8; 48]).unwrap_err();
        assert!(matches!(err, DecodeError::NotListCapable { .. }));
    }

    #[test]
    fn test_unknown_atom_fails_decode() {
        let backend = MemoryBackend::new();
        let err = decode(&backend, TypeSpec::Scalar(PropType::Atom), &9999u32.to_ne_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Resolve(_)));
    }

    #[test]
    fn test_empty_icon_stream_is_absent() {
        let backend = MemoryBackend::new();
        assert_eq!(decode(&backend, TypeSpec::Scalar(PropType::Icon), &[]).unwrap(), None);
    }

    #[test]
    fn test_single_empty_string_reads_back_empty() {
        let backend = MemoryBackend::new();
        let spec = TypeSpec::List(PropType::Utf8);
        let raw = encode(&backend, spec, &text_list(&[""])).unwrap();
        assert!(raw.data.is_empty());
        assert_eq!(decode(&backend, spec, &raw.data).unwrap(), Some(text_list(&[])));
    }

    #[test]
    fn test_byte_lists_are_rejected() {
        let backend = MemoryBackend::new();
        let spec = TypeSpec::List(PropType::DebugCardinal);
        let value = PropertyValue::List(vec![PropValue::Bytes(vec![1, 2, 3, 4, 5, 6, 7, 8])]);
        let err = encode(&backend, spec, &value).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::NotListCapable {
                prop_type: PropType::DebugCardinal
            }
        ));
        let err = decode(&backend, spec, &[0u8; 8]).unwrap_err();
        assert!(matches!(err, DecodeError::NotListCapable { .. }));
    }

    #[test]
    fn test_window_none_is_absent() {
        let backend = MemoryBackend::new();
        let zero = 0u32.to_ne_bytes();
        assert_eq!(decode(&backend, TypeSpec::Scalar(PropType::Window), &zero).unwrap(), None);
        let err = decode(&backend, TypeSpec::List(PropType::Window), &zero).unwrap_err();
        assert!(matches!(err, DecodeError::MissingElement { index: 0 }));
    }

    #[test]
    fn test_split_on() {
        assert_eq!(split_on(b"a\0b", b"\0"), vec![&b"a"[..], &b"b"[..]]);
        assert_eq!(split_on(b"a::b::", b"::"), vec![&b"a"[..], &b"b"[..], &b""[..]]);
        assert_eq!(split_on(b"abc", b"\0"), vec![&b"abc"[..]]);
    }
}
