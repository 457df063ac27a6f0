//! Raster bit images (`GS v 0`).
//!
//! ## Layout
//!
//! ```text
//! 1D 76 30 m  xL xH  yL yH  d1 ... dk
//! │        │  └─┬─┘  └─┬─┘
//! │        │    │      └── height in dots
//! │        │    └── width in bytes (dots / 8)
//! │        └── mode (0 = normal density)
//! └── GS v 0
//! ```
//!
//! Rows are stored top to bottom, each `width / 8` bytes. Within a byte,
//! bit 7 is the leftmost dot; a set bit prints black.

use crate::error::{Error, Result};
use crate::protocol::commands::GS;

/// Length of the `GS v 0` header.
pub const HEADER_LEN: usize = 8;

/// Normal density raster mode.
pub const MODE_NORMAL: u8 = 0x00;

/// A packed monochrome bitmap ready for `GS v 0`.
///
/// The width is always a positive multiple of 8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u16,
    height: u16,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wrap packed row data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the width is zero or not a
    /// multiple of 8, or if `data` is not exactly `width / 8 × height` bytes.
    pub fn new(width: u16, height: u16, data: Vec<u8>) -> Result<Self> {
        if width == 0 || width % 8 != 0 {
            return Err(Error::InvalidParameter {
                name: "width".to_string(),
                value: width.to_string(),
            });
        }
        let expected = usize::from(width / 8) * usize::from(height);
        if data.len() != expected {
            return Err(Error::InvalidParameter {
                name: "data.len".to_string(),
                value: format!("{} (expected {})", data.len(), expected),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in dots.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height in dots.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Bytes per row.
    pub fn width_bytes(&self) -> u16 {
        self.width / 8
    }

    /// Packed rows, without header.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The 8-byte `GS v 0` header.
    pub fn header(&self) -> [u8; HEADER_LEN] {
        let [wl, wh] = split_u16(self.width_bytes());
        let [hl, hh] = split_u16(self.height);
        [GS, b'v', b'0', MODE_NORMAL, wl, wh, hl, hh]
    }

    /// Header followed by the packed rows.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.data.len());
        out.extend_from_slice(&self.header());
        out.extend_from_slice(&self.data);
        out
    }
}

/// Split into `[value mod 256, value / 256]`.
#[inline]
fn split_u16(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

/// Pack dark/light flags into bytes, most significant bit first.
///
/// `dark` is indexed `y * width + x` with `width` a multiple of 8, so rows
/// never share a byte.
pub fn pack_rows(dark: &[bool]) -> Vec<u8> {
    dark.chunks(8)
        .map(|bits| {
            bits.iter()
                .enumerate()
                .fold(0u8, |byte, (i, &on)| if on { byte | (0x80 >> i) } else { byte })
        })
        .collect()
}
