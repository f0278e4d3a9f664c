//! Icons Module
//!
//! _NET_WM_ICON decoding. The property is a sequence of images, each a
//! width and height followed by width*height ARGB32 pixels; we keep the
//! largest one.

use tracing::{debug, warn};

use crate::backend::PropertyBackend;
use crate::prop::error::DecodeError;
use crate::prop::value::PropValue;

/// Icon data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    /// Icon width
    pub width: u32,
    /// Icon height
    pub height: u32,
    /// Icon pixels (premultiplied ARGB32, native endian)
    pub pixels: Vec<u32>,
}

impl Icon {
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Pixels as raw bytes, e.g. for uploading to a texture.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// Scale the colour channels of a non-premultiplied ARGB32 pixel by its alpha.
pub fn premultiply(argb: u32) -> u32 {
    let a = argb >> 24;
    match a {
        0 => 0,
        0xff => argb,
        _ => {
            let scale = |shift: u32| ((((argb >> shift) & 0xff) * a + 127) / 255) << shift;
            (a << 24) | scale(16) | scale(8) | scale(0)
        }
    }
}

/// Read the next image off the front of `stream`, advancing it.
///
/// Returns `None` at the end of the stream or when the rest of it is not a
/// complete image; the remainder is then discarded.
fn read_image(stream: &mut &[u8]) -> Option<Icon> {
    if stream.is_empty() {
        return None;
    }
    if stream.len() < 8 {
        warn!("Weird corruption in _NET_WM_ICON: {} byte header", stream.len());
        return None;
    }
    let width: u32 = bytemuck::pod_read_unaligned(&stream[0..4]);
    let height: u32 = bytemuck::pod_read_unaligned(&stream[4..8]);

    let needed = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4));
    let needed = match needed {
        Some(n) if n <= stream.len() - 8 => n,
        _ => {
            warn!(
                "Corrupt _NET_WM_ICON: {}x{} image with only {} bytes left",
                width,
                height,
                stream.len() - 8
            );
            return None;
        }
    };

    let pixels = stream[8..8 + needed]
        .chunks_exact(4)
        .map(|px| premultiply(bytemuck::pod_read_unaligned(px)))
        .collect();
    *stream = &stream[8 + needed..];

    Some(Icon { width, height, pixels })
}

/// Decode every image in an icon stream and return the largest.
pub fn largest_icon(data: &[u8]) -> Option<Icon> {
    let mut stream = data;
    let mut best: Option<Icon> = None;
    while let Some(icon) = read_image(&mut stream) {
        debug!("_NET_WM_ICON entry {}x{}", icon.width, icon.height);
        // Zero-area images are never picked, and on equal area the first one stays.
        if icon.pixel_count() == 0 {
            continue;
        }
        if best.as_ref().is_none_or(|b| icon.pixel_count() > b.pixel_count()) {
            best = Some(icon);
        }
    }
    best
}

pub(crate) fn decode_icons(_: &dyn PropertyBackend, data: &[u8]) -> Result<Option<PropValue>, DecodeError> {
    Ok(largest_icon(data).map(PropValue::Icon))
}
