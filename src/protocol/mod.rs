//! ESC/POS protocol module.
//!
//! This module contains the implementations for:
//! - ESC/POS command sequences and the [`CommandStream`] builder
//! - `GS v 0` raster images
//! - Receipt layout
//! - Decoding streams back into readable transcripts

pub mod commands;
pub mod raster;
pub mod receipt;
pub mod transcript;

pub use commands::{Align, CommandStream};
pub use raster::RasterImage;
pub use receipt::ReceiptLayout;
pub use transcript::{plain_text, render_transcript};
