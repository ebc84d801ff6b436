use image::ImageFormat;
use tessel_config::ocr::OcrConfig;
use tessel_types::{MediaType, SelectedImage};

use crate::OcrError;

/// Sniff the media type from the content's magic bytes
pub fn detect_media_type(bytes: &[u8]) -> Option<MediaType> {
    let format = image::guess_format(bytes).ok()?;
    let media_type = match format {
        ImageFormat::Png => MediaType::Png,
        ImageFormat::Jpeg => MediaType::Jpeg,
        other => MediaType::Other(other.to_mime_type().to_string()),
    };
    Some(media_type)
}

/// Which images may be submitted
#[derive(Debug, Clone)]
pub struct MediaPolicy {
    strict: bool,
    accepted: Vec<MediaType>,
}

impl MediaPolicy {
    /// PNG and JPEG only
    pub fn strict() -> Self {
        Self {
            strict: true,
            accepted: vec![MediaType::Png, MediaType::Jpeg],
        }
    }

    /// Anything that sniffs as an image
    pub fn unrestricted() -> Self {
        Self {
            strict: false,
            accepted: Vec::new(),
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            strict: config.strict_media_types,
            accepted: config.accepted_media_types.clone(),
        }
    }

    pub fn validate(&self, image: &SelectedImage) -> Result<(), OcrError> {
        if image.is_empty() {
            return Err(OcrError::EmptyImage);
        }

        if self.strict && !self.accepted.contains(&image.media_type) {
            return Err(OcrError::UnsupportedMediaType(image.media_type.to_string()));
        }

        let sniffed = detect_media_type(&image.bytes).ok_or(OcrError::Unrecognized)?;

        // The content must be an accepted type too, whatever was declared
        if self.strict && !self.accepted.contains(&sniffed) {
            return Err(OcrError::UnsupportedMediaType(sniffed.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
    const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00";

    #[test]
    fn sniffs_png_and_jpeg() {
        assert_eq!(detect_media_type(PNG), Some(MediaType::Png));
        assert_eq!(detect_media_type(JPEG), Some(MediaType::Jpeg));
        assert_eq!(detect_media_type(b"plain text, not an image"), None);
    }

    #[test]
    fn strict_policy_rejects_other_images() {
        let policy = MediaPolicy::strict();
        let gif = SelectedImage::new(GIF, detect_media_type(GIF).unwrap());

        let err = policy.validate(&gif).unwrap_err();
        assert!(matches!(err, OcrError::UnsupportedMediaType(ref mime) if mime == "image/gif"));
        assert!(err.is_rejection());

        assert!(policy.validate(&SelectedImage::new(PNG, MediaType::Png)).is_ok());
        assert!(policy.validate(&SelectedImage::new(JPEG, MediaType::Jpeg)).is_ok());
    }

    #[test]
    fn strict_policy_checks_content_not_just_label() {
        let policy = MediaPolicy::strict();
        let disguised = SelectedImage::new(GIF, MediaType::Png).with_name("anim.png");

        let err = policy.validate(&disguised).unwrap_err();
        assert!(matches!(err, OcrError::UnsupportedMediaType(ref mime) if mime == "image/gif"));

        // Declared JPEG holding PNG bytes is still an accepted image
        assert!(policy.validate(&SelectedImage::new(PNG, MediaType::Jpeg)).is_ok());
    }

    #[test]
    fn unrestricted_policy_accepts_any_image() {
        let policy = MediaPolicy::unrestricted();
        let gif = SelectedImage::new(GIF, MediaType::Other("image/gif".into()));
        assert!(policy.validate(&gif).is_ok());

        let text = SelectedImage::new(&b"hello"[..], MediaType::Other("text/plain".into()));
        assert!(matches!(policy.validate(&text), Err(OcrError::Unrecognized)));
    }

    #[test]
    fn empty_image_is_rejected() {
        let empty = SelectedImage::new(Vec::new(), MediaType::Png);
        assert!(matches!(
            MediaPolicy::strict().validate(&empty),
            Err(OcrError::EmptyImage)
        ));
    }
}
