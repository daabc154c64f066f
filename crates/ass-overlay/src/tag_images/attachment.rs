//! Embedded file attachments carrying tag images
//!
//! An attachment entry is stored the way scripts carry it: a
//! `filename: <name>` header line followed by a uuencoded body.

use crate::tag_images::decode::{decode_bytes, ImageDecoder};
use crate::tag_images::{TagImage, TagImageFormat};
use crate::utils::text::starts_with_ignore_case;
use crate::utils::{uuencode, OverlayError};

const FILENAME_KEY: &str = "filename:";

/// Script section an attachment was stored under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttachmentGroup {
    /// `[Fonts]`
    Fonts,
    /// `[Graphics]`, the only group scanned for tag images
    Graphics,
}

/// One attachment entry handed over by the host's attachment store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    entry_data: String,
    group: AttachmentGroup,
}

impl Attachment {
    /// Wrap raw entry text (header line plus uuencoded body)
    pub fn new(entry_data: impl Into<String>, group: AttachmentGroup) -> Self {
        Self {
            entry_data: entry_data.into(),
            group,
        }
    }

    /// Build a well-formed graphic entry from a filename and file contents
    pub fn graphic(filename: &str, contents: &[u8]) -> Self {
        let body = uuencode::encode(contents);
        let mut entry = String::with_capacity(FILENAME_KEY.len() + filename.len() + body.len() + 2);
        entry.push_str(FILENAME_KEY);
        entry.push(' ');
        entry.push_str(filename);
        entry.push('\n');
        entry.push_str(&body);
        Self::new(entry, AttachmentGroup::Graphics)
    }

    /// Raw entry text
    pub fn entry_data(&self) -> &str {
        &self.entry_data
    }

    /// Group the entry belongs to
    pub fn group(&self) -> AttachmentGroup {
        self.group
    }

    /// Whether this entry can carry a tag image
    pub fn is_graphic(&self) -> bool {
        self.group == AttachmentGroup::Graphics
    }

    /// Filename declared by the header line, trimmed
    pub fn filename(&self) -> Result<&str, OverlayError> {
        let (header, _) = self.split_header()?;
        Ok(header)
    }

    fn split_header(&self) -> Result<(&str, &str), OverlayError> {
        let (header, body) = self
            .entry_data
            .split_once('\n')
            .ok_or_else(|| OverlayError::AttachmentHeader("missing header line".into()))?;

        let header = header.trim();
        if !starts_with_ignore_case(header.as_bytes(), FILENAME_KEY.as_bytes()) {
            return Err(OverlayError::AttachmentHeader(format!(
                "expected `{FILENAME_KEY}` header, found {header:?}"
            )));
        }

        let name = header[FILENAME_KEY.len()..].trim();
        if name.is_empty() {
            return Err(OverlayError::AttachmentHeader("empty filename".into()));
        }
        Ok((name, body))
    }

    /// Decode the attachment into a tag image keyed by its filename
    ///
    /// The filename's extension is checked before any decoding happens.
    pub fn decode_image(&self, decoder: &dyn ImageDecoder) -> Result<TagImage, OverlayError> {
        let (name, body) = self.split_header()?;
        let format = TagImageFormat::from_path(name)
            .ok_or_else(|| OverlayError::UnsupportedFormat(name.to_owned()))?;

        let data = uuencode::decode(body)?;
        if data.is_empty() {
            return Err(OverlayError::AttachmentData(format!("{name}: empty body")));
        }
        decode_bytes(decoder, name, format, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag_images::decode::DecodedImage;

    /// Accepts any non-empty blob as a 1x1 white pixel
    struct SolidDecoder;

    impl ImageDecoder for SolidDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, OverlayError> {
            if bytes == b"broken" {
                return Err(OverlayError::ImageDecode("broken".into()));
            }
            Ok(DecodedImage {
                width: 1,
                height: 1,
                rgba: vec![255; 4],
            })
        }
    }

    #[test]
    fn graphic_entry_round_trips() {
        let attachment = Attachment::graphic("Logo.PNG", b"any image bytes");
        assert!(attachment.entry_data().starts_with("filename: Logo.PNG\n"));
        assert!(attachment.is_graphic());
        assert_eq!(attachment.filename().unwrap(), "Logo.PNG");

        let image = attachment.decode_image(&SolidDecoder).unwrap();
        assert_eq!(image.key(), "Logo.PNG");
        assert_eq!(image.basename_lower(), "logo.png");
        assert_eq!(image.format(), TagImageFormat::Png);
    }

    #[test]
    fn header_key_is_case_insensitive_and_trimmed() {
        let body = uuencode::encode(b"x");
        let attachment = Attachment::new(
            format!("  FileName:\t pic.webp  \n{body}"),
            AttachmentGroup::Graphics,
        );
        assert_eq!(attachment.filename().unwrap(), "pic.webp");
        assert_eq!(
            attachment.decode_image(&SolidDecoder).unwrap().format(),
            TagImageFormat::Webp
        );
    }

    #[test]
    fn bad_headers_are_rejected() {
        let missing_newline = Attachment::new("filename: a.png", AttachmentGroup::Graphics);
        let wrong_key = Attachment::new("name: a.png\n1Q", AttachmentGroup::Graphics);
        let empty_name = Attachment::new("filename:   \n1Q", AttachmentGroup::Graphics);

        for attachment in [missing_newline, wrong_key, empty_name] {
            assert!(matches!(
                attachment.decode_image(&SolidDecoder),
                Err(OverlayError::AttachmentHeader(_))
            ));
        }
    }

    #[test]
    fn unsupported_extension_is_rejected_before_decode() {
        let attachment = Attachment::graphic("anim.gif", b"broken");
        assert!(matches!(
            attachment.decode_image(&SolidDecoder),
            Err(OverlayError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn empty_or_undecodable_bodies_fail() {
        let empty = Attachment::new("filename: a.png\n", AttachmentGroup::Graphics);
        assert!(matches!(
            empty.decode_image(&SolidDecoder),
            Err(OverlayError::AttachmentData(_))
        ));

        let broken = Attachment::graphic("a.png", b"broken");
        assert!(matches!(
            broken.decode_image(&SolidDecoder),
            Err(OverlayError::ImageDecode(_))
        ));
    }
}
