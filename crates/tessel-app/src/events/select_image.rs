use std::path::Path;

use kanal::AsyncSender;
use tessel_core::OrchestratorError;
use tessel_ocr::detect_media_type;
use tessel_types::{AppEvent, MediaType, PassId, SelectedImage};

use crate::state::AppState;

/// Read the selected file and submit it.
///
/// Returns the started pass, or None when the file was refused.
pub async fn handle_select_image(
    state: &AppState,
    path: &Path,
    app_to_ui_tx: &AsyncSender<AppEvent>,
) -> anyhow::Result<Option<PassId>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            let _ = app_to_ui_tx
                .send(AppEvent::Rejected {
                    reason: format!("cannot read {}: {e}", path.display()),
                })
                .await;
            return Ok(None);
        }
    };

    // Declared like a browser would: by extension first, content second
    let media_type = media_type_from_extension(path)
        .or_else(|| detect_media_type(&bytes))
        .unwrap_or_else(|| MediaType::Other("application/octet-stream".to_string()));

    let mut image = SelectedImage::new(bytes, media_type);
    if let Some(name) = path.file_name() {
        image = image.with_name(name.to_string_lossy());
    }

    match state.orchestrator.submit(image).await {
        Ok(pass) => {
            tracing::debug!(">>> [OCR] Submitted {} as pass {}", path.display(), pass);
            Ok(Some(pass))
        }
        Err(OrchestratorError::Rejected(e)) => {
            // The view was already notified
            tracing::debug!("{} rejected: {}", path.display(), e);
            Ok(None)
        }
        Err(OrchestratorError::Closed) => {
            tracing::debug!("Ignoring {}, shutting down", path.display());
            Ok(None)
        }
    }
}

fn media_type_from_extension(path: &Path) -> Option<MediaType> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let media_type = match extension.as_str() {
        "png" => MediaType::Png,
        "jpg" | "jpeg" | "jfif" => MediaType::Jpeg,
        "gif" => MediaType::Other("image/gif".to_string()),
        "webp" => MediaType::Other("image/webp".to_string()),
        "bmp" => MediaType::Other("image/bmp".to_string()),
        "tif" | "tiff" => MediaType::Other("image/tiff".to_string()),
        _ => return None,
    };
    Some(media_type)
}
