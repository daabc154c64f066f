//! UU-encoding as used by embedded script attachments
//!
//! Attachments in `[Graphics]` and `[Fonts]` sections use the SSA flavour of
//! uuencoding: every 6-bit group is stored as a printable character offset by
//! 33, there is no per-line length prefix, and lines are wrapped every 80
//! characters. A trailing partial group of `n` bytes is written as `n + 1`
//! characters.

use crate::utils::OverlayError;

/// Character offset applied to every 6-bit group
const UU_OFFSET: u8 = 33;

/// Encoded characters per line before a line break is inserted
pub const UU_LINE_LENGTH: usize = 80;

/// Encode binary data, wrapping lines every [`UU_LINE_LENGTH`] characters
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 4).div_ceil(3) + data.len() / 60 + 1);
    let mut written = 0;

    for (index, chunk) in data.chunks(3).enumerate() {
        let mut src = [0u8; 3];
        src[..chunk.len()].copy_from_slice(chunk);

        let groups = [
            src[0] >> 2,
            ((src[0] & 0x03) << 4) | (src[1] >> 4),
            ((src[1] & 0x0F) << 2) | (src[2] >> 6),
            src[2] & 0x3F,
        ];

        let more_input = (index + 1) * 3 < data.len();
        for &group in &groups[..chunk.len() + 1] {
            out.push(char::from(group + UU_OFFSET));
            written += 1;
            if written == UU_LINE_LENGTH && more_input {
                written = 0;
                out.push('\n');
            }
        }
    }

    out
}

/// Decode an attachment body back to binary data
///
/// Line breaks and other ASCII whitespace are ignored. A trailing group of a
/// single character carries no complete byte and is dropped.
///
/// # Errors
///
/// Returns an error if a character falls outside the encoded alphabet.
pub fn decode(body: &str) -> Result<Vec<u8>, OverlayError> {
    let mut result = Vec::with_capacity(body.len() * 3 / 4);
    let mut group = [0u8; 4];
    let mut filled = 0;

    for byte in body.bytes() {
        if byte.is_ascii_whitespace() || byte == 0 {
            continue;
        }

        let value = byte.wrapping_sub(UU_OFFSET);
        if value > 0x3F {
            return Err(OverlayError::AttachmentData(format!(
                "invalid uuencoded character 0x{byte:02x}"
            )));
        }

        group[filled] = value;
        filled += 1;
        if filled == 4 {
            push_group(&mut result, &group, 4);
            filled = 0;
        }
    }

    if filled > 0 {
        group[filled..].fill(0);
        push_group(&mut result, &group, filled);
    }

    Ok(result)
}

/// Expand `count` 6-bit values into `count - 1` bytes
fn push_group(out: &mut Vec<u8>, group: &[u8; 4], count: usize) {
    let [c1, c2, c3, c4] = *group;

    if count > 1 {
        out.push((c1 << 2) | (c2 >> 4));
    }
    if count > 2 {
        out.push(((c2 & 0x0F) << 4) | (c3 >> 2));
    }
    if count > 3 {
        out.push(((c3 & 0x03) << 6) | c4);
    }
}
