//! ESC/POS command sequences.
//!
//! Every command is a short byte sequence prefixed by `ESC` (0x1B) or
//! `GS` (0x1D). Text between commands is sent as plain ASCII.
//!
//! | Command | Bytes | Purpose |
//! |---------|-------|---------|
//! | `ESC @` | `1B 40` | Initialize printer |
//! | `ESC a n` | `1B 61 n` | Justification (0 left, 1 center, 2 right) |
//! | `ESC E n` | `1B 45 n` | Emphasis on/off |
//! | `ESC d n` | `1B 64 n` | Print and feed `n` lines |
//! | `ESC p m t1 t2` | `1B 70 00 19 FA` | Drawer kick pulse on pin 2 |
//! | `GS V m` | `1D 56 01` | Partial cut |
//! | `GS v 0` | `1D 76 30 00 ...` | Raster bit image |

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::raster::RasterImage;

/// ESC (Escape) command prefix.
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) extended command prefix.
pub const GS: u8 = 0x1D;

/// LF (Line Feed): print the line buffer and advance one line.
pub const LF: u8 = 0x0A;

/// Lines fed before the cutter so the last printed line clears the blade.
pub const CUT_FEED_LINES: u8 = 4;

/// Text justification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Align {
    /// Flush left.
    #[default]
    Left = 0,
    /// Centered.
    Center = 1,
    /// Flush right.
    Right = 2,
}

impl Align {
    /// Create from the `n` parameter of `ESC a n`.
    ///
    /// Both the numeric (0-2) and ASCII ('0'-'2') forms are accepted.
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 | b'0' => Some(Self::Left),
            1 | b'1' => Some(Self::Center),
            2 | b'2' => Some(Self::Right),
            _ => None,
        }
    }
}

/// Initialize printer (`ESC @`).
#[inline]
pub fn init() -> [u8; 2] {
    [ESC, b'@']
}

/// Set justification (`ESC a n`).
#[inline]
pub fn align(align: Align) -> [u8; 3] {
    [ESC, b'a', align as u8]
}

/// Emphasis on or off (`ESC E n`).
#[inline]
pub fn bold(on: bool) -> [u8; 3] {
    [ESC, b'E', u8::from(on)]
}

/// Print and feed `lines` lines (`ESC d n`).
#[inline]
pub fn feed(lines: u8) -> [u8; 3] {
    [ESC, b'd', lines]
}

/// Pulse the cash drawer on connector pin 2 (`ESC p 0 25 250`).
///
/// On time is 25 × 2 ms, off time 250 × 2 ms.
#[inline]
pub fn drawer_kick() -> [u8; 5] {
    [ESC, b'p', 0x00, 0x19, 0xFA]
}

/// Partial cut (`GS V 1`).
#[inline]
pub fn cut() -> [u8; 3] {
    [GS, b'V', 0x01]
}

/// Feed past the cutter, then cut.
pub fn feed_and_cut() -> Vec<u8> {
    let mut out = Vec::with_capacity(6);
    out.extend_from_slice(&feed(CUT_FEED_LINES));
    out.extend_from_slice(&cut());
    out
}

/// Builder for an ordered ESC/POS byte stream.
///
/// ## Example
///
/// ```
/// use thermal_printer_ble::protocol::commands::{Align, CommandStream};
///
/// let mut stream = CommandStream::new();
/// stream.init().align(Align::Center).bold(true).line("HELLO").bold(false);
/// let bytes = stream.freeze();
/// assert_eq!(&bytes[..2], &[0x1B, 0x40]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandStream {
    buf: BytesMut,
}

impl CommandStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(512),
        }
    }

    /// Append raw bytes.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    /// Append `ESC @`.
    pub fn init(&mut self) -> &mut Self {
        self.raw(&init())
    }

    /// Append a justification change.
    pub fn align(&mut self, align: Align) -> &mut Self {
        self.raw(&self::align(align))
    }

    /// Toggle emphasis.
    pub fn bold(&mut self, on: bool) -> &mut Self {
        self.raw(&self::bold(on))
    }

    /// Append the drawer kick pulse.
    pub fn drawer_kick(&mut self) -> &mut Self {
        self.raw(&drawer_kick())
    }

    /// Feed `lines` lines.
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.raw(&feed(lines))
    }

    /// Feed past the cutter and cut.
    pub fn feed_and_cut(&mut self) -> &mut Self {
        self.raw(&feed_and_cut())
    }

    /// Append a raster image block.
    pub fn raster(&mut self, image: &RasterImage) -> &mut Self {
        self.raw(&image.to_bytes())
    }

    /// Append text followed by a line feed.
    ///
    /// The text must already be printable ASCII.
    pub fn line(&mut self, text: &str) -> &mut Self {
        self.buf.put_slice(text.as_bytes());
        self.buf.put_u8(LF);
        self
    }

    /// Append an empty line.
    pub fn blank(&mut self) -> &mut Self {
        self.buf.put_u8(LF);
        self
    }

    /// Append a bold line and switch emphasis back off.
    pub fn bold_line(&mut self, text: &str) -> &mut Self {
        self.bold(true).line(text).bold(false)
    }

    /// Number of bytes in the stream.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Finish the stream.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}
