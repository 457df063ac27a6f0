//! Host-side decoding of ESC/POS streams.
//!
//! Used when no printer is connected: the command stream is reconstructed as
//! readable text so the receipt can still be shown to the operator.

use crate::protocol::commands::{Align, ESC, GS, LF};
use crate::protocol::raster::HEADER_LEN;

/// One decoded element of a command stream.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    NewLines(usize),
    Align(Align),
    Bold(bool),
    Image { width: usize, height: usize },
    DrawerKick,
    Cut,
}

/// Decode a stream into tokens, dropping anything unrecognized.
fn tokenize(bytes: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    let flush = |text: &mut String, tokens: &mut Vec<Token>| {
        if !text.is_empty() {
            tokens.push(Token::Text(std::mem::take(text)));
        }
    };

    while i < bytes.len() {
        let byte = bytes[i];
        match (byte, bytes.get(i + 1).copied()) {
            (ESC, Some(b'@')) => i += 2,
            (ESC, Some(b'a')) => {
                flush(&mut text, &mut tokens);
                if let Some(align) = bytes.get(i + 2).copied().and_then(Align::from_raw) {
                    tokens.push(Token::Align(align));
                }
                i += 3;
            }
            (ESC, Some(b'E')) => {
                flush(&mut text, &mut tokens);
                let on = bytes.get(i + 2).map(|n| n & 0x01 == 1).unwrap_or(false);
                tokens.push(Token::Bold(on));
                i += 3;
            }
            (ESC, Some(b'd')) => {
                flush(&mut text, &mut tokens);
                let lines = bytes.get(i + 2).copied().unwrap_or(1);
                tokens.push(Token::NewLines(usize::from(lines)));
                i += 3;
            }
            (ESC, Some(b'p')) => {
                flush(&mut text, &mut tokens);
                tokens.push(Token::DrawerKick);
                i += 5;
            }
            (GS, Some(b'V')) => {
                flush(&mut text, &mut tokens);
                tokens.push(Token::Cut);
                // Function B (`GS V 65/66 n`) carries an extra feed parameter.
                let function_b = matches!(bytes.get(i + 2), Some(65) | Some(66));
                i += if function_b { 4 } else { 3 };
            }
            (GS, Some(b'v')) if i + HEADER_LEN <= bytes.len() => {
                flush(&mut text, &mut tokens);
                let header = &bytes[i..i + HEADER_LEN];
                let width_bytes = usize::from(u16::from_le_bytes([header[4], header[5]]));
                let height = usize::from(u16::from_le_bytes([header[6], header[7]]));
                tokens.push(Token::Image {
                    width: width_bytes * 8,
                    height,
                });
                i += HEADER_LEN + width_bytes * height;
            }
            (ESC, _) | (GS, _) => i += 2,
            (LF, _) => {
                flush(&mut text, &mut tokens);
                tokens.push(Token::NewLines(1));
                i += 1;
            }
            (b, _) if b.is_ascii_graphic() || b == b' ' => {
                text.push(char::from(b));
                i += 1;
            }
            _ => i += 1,
        }
    }
    flush(&mut text, &mut tokens);
    tokens
}

/// Printable text only, with every command stripped.
pub fn plain_text(bytes: &[u8]) -> String {
    let mut out = String::new();
    for token in tokenize(bytes) {
        match token {
            Token::Text(text) => out.push_str(&text),
            Token::NewLines(n) => out.extend(std::iter::repeat('\n').take(n)),
            _ => {}
        }
    }
    out
}

/// A readable reconstruction of a receipt.
///
/// Each printed line is prefixed with its alignment (`[L]`, `[C]`, `[R]`)
/// and bold runs are wrapped in `**`. Images, drawer kicks and cuts appear
/// as bracketed markers on their own line.
pub fn render_transcript(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut align = Align::Left;
    let mut bold = false;
    let mut line = String::new();

    let marker = |align: Align| match align {
        Align::Left => "[L] ",
        Align::Center => "[C] ",
        Align::Right => "[R] ",
    };

    fn end_line(out: &mut String, line: &mut String) {
        out.push_str(line.trim_end());
        out.push('\n');
        line.clear();
    }

    // Text not yet terminated by a feed still belongs before the next marker.
    fn flush(out: &mut String, line: &mut String) {
        if !line.is_empty() {
            end_line(out, line);
        }
    }

    for token in tokenize(bytes) {
        match token {
            Token::Text(text) => {
                if line.is_empty() {
                    line.push_str(marker(align));
                }
                if bold {
                    line.push_str("**");
                    line.push_str(&text);
                    line.push_str("**");
                } else {
                    line.push_str(&text);
                }
            }
            Token::NewLines(n) => {
                for _ in 0..n {
                    end_line(&mut out, &mut line);
                }
            }
            Token::Align(a) => align = a,
            Token::Bold(on) => bold = on,
            Token::Image { width, height } => {
                flush(&mut out, &mut line);
                out.push_str(&format!("[IMAGE {}x{}]\n", width, height));
            }
            Token::DrawerKick => {
                flush(&mut out, &mut line);
                out.push_str("[DRAWER KICK]\n");
            }
            Token::Cut => {
                flush(&mut out, &mut line);
                out.push_str("[CUT]\n");
            }
        }
    }
    flush(&mut out, &mut line);
    out
}
