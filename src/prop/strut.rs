//! _NET_WM_STRUT / _NET_WM_STRUT_PARTIAL

use crate::backend::PropertyBackend;
use crate::prop::codec::read_record;
use crate::prop::error::DecodeError;
use crate::prop::value::PropValue;

/// Reserved screen edges of a panel or dock.
///
/// `_NET_WM_STRUT` is defined as a `_NET_WM_STRUT_PARTIAL` whose span fields
/// are zero, so both decode through the 12-word layout and a 4-word strut
/// simply comes back with zero spans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Strut {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
    pub left_start_y: u32,
    pub left_end_y: u32,
    pub right_start_y: u32,
    pub right_end_y: u32,
    pub top_start_x: u32,
    pub top_end_x: u32,
    pub bottom_start_x: u32,
    pub bottom_end_x: u32,
}

impl Strut {
    pub fn parse(data: &[u8]) -> Self {
        let [
            left,
            right,
            top,
            bottom,
            left_start_y,
            left_end_y,
            right_start_y,
            right_end_y,
            top_start_x,
            top_end_x,
            bottom_start_x,
            bottom_end_x,
        ] = read_record::<12>("_NET_WM_STRUT_PARTIAL", data);

        Self {
            left,
            right,
            top,
            bottom,
            left_start_y,
            left_end_y,
            right_start_y,
            right_end_y,
            top_start_x,
            top_end_x,
            bottom_start_x,
            bottom_end_x,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left == 0 && self.right == 0 && self.top == 0 && self.bottom == 0
    }
}

pub(crate) fn decode_strut(_: &dyn PropertyBackend, data: &[u8]) -> Result<Option<PropValue>, DecodeError> {
    Ok(Some(PropValue::Strut(Strut::parse(data))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_ne_bytes()).collect()
    }

    #[test]
    fn test_legacy_strut_is_zero_extended() {
        let strut = Strut::parse(&record(&[0, 0, 32, 0]));
        assert_eq!(
            strut,
            Strut {
                top: 32,
                ..Strut::default()
            }
        );
        assert!(!strut.is_empty());
    }

    #[test]
    fn test_partial_strut() {
        let strut = Strut::parse(&record(&[0, 0, 0, 40, 0, 0, 0, 0, 0, 0, 100, 1819]));
        assert_eq!(strut.bottom, 40);
        assert_eq!(strut.bottom_start_x, 100);
        assert_eq!(strut.bottom_end_x, 1819);
        assert_eq!(strut.top_end_x, 0);
    }

    #[test]
    fn test_long_strut_is_truncated() {
        let mut words = vec![1u32; 12];
        words.push(99);
        let strut = Strut::parse(&record(&words));
        assert_eq!(strut.bottom_end_x, 1);
    }

    #[test]
    fn test_empty_strut() {
        assert!(Strut::parse(&[]).is_empty());
    }
}
