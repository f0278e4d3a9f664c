//! Hints Module
//!
//! WM_NORMAL_HINTS (XSizeHints) and WM_HINTS (XWMHints) records, ICCCM 4.1.2.3
//! and 4.1.2.4. Fields whose flag bit is clear are reported as `None` no
//! matter what the record holds in their slot.

use bitflags::bitflags;

use crate::backend::{PropertyBackend, WindowRef};
use crate::prop::codec::read_record;
use crate::prop::error::DecodeError;
use crate::prop::value::PropValue;

bitflags! {
    /// XSizeHints flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SizeHintsFlags: u32 {
        const US_POSITION   = 1 << 0;
        const US_SIZE       = 1 << 1;
        const P_POSITION    = 1 << 2;
        const P_SIZE        = 1 << 3;
        const P_MIN_SIZE    = 1 << 4;
        const P_MAX_SIZE    = 1 << 5;
        const P_RESIZE_INC  = 1 << 6;
        const P_ASPECT      = 1 << 7;
        const P_BASE_SIZE   = 1 << 8;
        const P_WIN_GRAVITY = 1 << 9;
    }
}

bitflags! {
    /// XWMHints flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WmHintsFlags: u32 {
        const INPUT         = 1 << 0;
        const STATE         = 1 << 1;
        const ICON_PIXMAP   = 1 << 2;
        const ICON_WINDOW   = 1 << 3;
        const ICON_POSITION = 1 << 4;
        const ICON_MASK     = 1 << 5;
        const WINDOW_GROUP  = 1 << 6;
        const URGENCY       = 1 << 8;
    }
}

/// WM_STATE value for a window that starts iconified.
pub const ICONIC_STATE: u32 = 3;

const SIZE_HINTS_WORDS: usize = 18;
const WM_HINTS_WORDS: usize = 9;

/// Size hints (XSizeHints equivalent)
#[derive(Debug, Clone, PartialEq)]
pub struct SizeHints {
    pub flags: SizeHintsFlags,
    pub min_size: Option<(u32, u32)>,
    pub max_size: Option<(u32, u32)>,
    pub base_size: Option<(u32, u32)>,
    pub resize_inc: Option<(u32, u32)>,
    pub min_aspect: Option<f64>,
    pub max_aspect: Option<f64>,
    /// Exact min aspect as (numerator, denominator)
    pub min_aspect_ratio: Option<(u32, u32)>,
    /// Exact max aspect as (numerator, denominator)
    pub max_aspect_ratio: Option<(u32, u32)>,
    pub win_gravity: Option<u32>,
}

impl SizeHints {
    /// Parse an XSizeHints record.
    ///
    /// Layout: flags, four obsolete x/y/width/height words, min w/h, max w/h,
    /// increment w/h, min aspect num/den, max aspect num/den, base w/h,
    /// gravity.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        let w: [u32; SIZE_HINTS_WORDS] = read_record("WM_SIZE_HINTS", data);
        let flags = SizeHintsFlags::from_bits_retain(w[0]);
        let pair = |bit: SizeHintsFlags, a: usize, b: usize| flags.contains(bit).then_some((w[a], w[b]));

        let (min_aspect_ratio, max_aspect_ratio, min_aspect, max_aspect) = if flags.contains(SizeHintsFlags::P_ASPECT) {
            let min = (w[11], w[12]);
            let max = (w[13], w[14]);
            (Some(min), Some(max), Some(aspect(min)?), Some(aspect(max)?))
        } else {
            (None, None, None, None)
        };

        Ok(Self {
            flags,
            min_size: pair(SizeHintsFlags::P_MIN_SIZE, 5, 6),
            max_size: pair(SizeHintsFlags::P_MAX_SIZE, 7, 8),
            resize_inc: pair(SizeHintsFlags::P_RESIZE_INC, 9, 10),
            base_size: pair(SizeHintsFlags::P_BASE_SIZE, 15, 16),
            min_aspect,
            max_aspect,
            min_aspect_ratio,
            max_aspect_ratio,
            win_gravity: flags.contains(SizeHintsFlags::P_WIN_GRAVITY).then_some(w[17]),
        })
    }
}

fn aspect((num, den): (u32, u32)) -> Result<f64, DecodeError> {
    if den == 0 {
        return Err(DecodeError::ZeroAspectDenominator { num, den });
    }
    Ok(f64::from(num) / f64::from(den))
}

/// WM hints (XWMHints equivalent)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WmHints {
    pub flags: WmHintsFlags,
    /// Urgency is a flag of its own and always present.
    pub urgency: bool,
    pub input: Option<bool>,
    pub start_iconic: Option<bool>,
    pub icon_pixmap: Option<u32>,
    pub icon_window: Option<WindowRef>,
    pub icon_position: Option<(i32, i32)>,
    pub icon_mask: Option<u32>,
    pub group_leader: Option<WindowRef>,
}

impl WmHints {
    /// Parse an XWMHints record.
    ///
    /// Layout: flags, input, initial state, icon pixmap, icon window, icon
    /// x/y, icon mask, window group. Some ICCCM revisions omit the trailing
    /// window group from the table; older clients may write only 8 words.
    pub fn parse(data: &[u8]) -> Self {
        let w: [u32; WM_HINTS_WORDS] = read_record("WM_HINTS", data);
        let flags = WmHintsFlags::from_bits_retain(w[0]);
        let has = |bit| flags.contains(bit);

        Self {
            flags,
            urgency: has(WmHintsFlags::URGENCY),
            input: has(WmHintsFlags::INPUT).then_some(w[1] != 0),
            start_iconic: has(WmHintsFlags::STATE).then_some(w[2] == ICONIC_STATE),
            icon_pixmap: has(WmHintsFlags::ICON_PIXMAP).then_some(w[3]),
            icon_window: has(WmHintsFlags::ICON_WINDOW).then_some(WindowRef::from_raw(w[4])),
            icon_position: has(WmHintsFlags::ICON_POSITION).then_some((w[5] as i32, w[6] as i32)),
            icon_mask: has(WmHintsFlags::ICON_MASK).then_some(w[7]),
            group_leader: has(WmHintsFlags::WINDOW_GROUP).then_some(WindowRef::from_raw(w[8])),
        }
    }
}

pub(crate) fn decode_size_hints(_: &dyn PropertyBackend, data: &[u8]) -> Result<Option<PropValue>, DecodeError> {
    Ok(Some(PropValue::SizeHints(SizeHints::parse(data)?)))
}

pub(crate) fn decode_wm_hints(_: &dyn PropertyBackend, data: &[u8]) -> Result<Option<PropValue>, DecodeError> {
    Ok(Some(PropValue::WmHints(WmHints::parse(data))))
}
