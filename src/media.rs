use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::constants::IMAGE_EXTENSIONS;
use crate::error::{HttpError, TypeError};

pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Parses a `data:image/<fmt>;base64,<payload>` url into raw image bytes.
pub fn decode_base64_image(data: &str) -> Result<DecodedImage, TypeError> {
    let rest = data
        .strip_prefix("data:image/")
        .ok_or_else(|| TypeError::new("Image must be a base64 data url"))?;

    let (format, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| TypeError::new("Image must be base64 encoded"))?;

    let extension = format.to_ascii_lowercase();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(TypeError::new("Unsupported image format"));
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_e| TypeError::new("Invalid base64 image payload"))?;

    if bytes.is_empty() {
        return Err(TypeError::new("Empty image payload"));
    }

    Ok(DecodedImage { extension, bytes })
}

/// Writes the image under `<media_root>/recipe/images/` with a random name
/// and returns the public `/media/...` path stored on the recipe.
pub async fn store_image(
    image: &DecodedImage,
    media_root: &Path,
) -> Result<String, crate::error::Error> {
    let name: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();

    let relative = format!("recipe/images/{name}.{}", image.extension);
    let path = media_root.join(&relative);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| HttpError::InternalServerError.new(&format!("{e}")))?;
    }
    tokio::fs::write(&path, &image.bytes)
        .await
        .map_err(|e| HttpError::InternalServerError.new(&format!("{e}")))?;

    Ok(format!("/media/{relative}"))
}

/// Deletes a previously stored image given its public `/media/...` path.
/// Missing files are only logged; callers use this for cleanup.
pub async fn remove_image(public_path: &str, media_root: &Path) {
    let Some(relative) = public_path.strip_prefix("/media/") else {
        return;
    };

    let path = media_root.join(relative);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!(%public_path, "failed to remove stored image: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_data_url() {
        let encoded = STANDARD.encode([0x89, b'P', b'N', b'G']);
        let image = decode_base64_image(&format!("data:image/png;base64,{encoded}")).unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(image.bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn rejects_plain_strings() {
        assert!(decode_base64_image("not-an-image").is_err());
        assert!(decode_base64_image("data:image/png,raw-payload").is_err());
    }

    #[test]
    fn rejects_unknown_formats() {
        let encoded = STANDARD.encode(b"<svg/>");
        let result = decode_base64_image(&format!("data:image/svg+xml;base64,{encoded}"));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(decode_base64_image("data:image/png;base64,!!!").is_err());
    }

    #[tokio::test]
    async fn stored_images_can_be_removed() {
        let root = std::env::temp_dir().join("media-remove-test");
        let image = DecodedImage {
            extension: String::from("png"),
            bytes: vec![1, 2, 3],
        };

        let public = store_image(&image, &root).await.unwrap();
        let relative = public.strip_prefix("/media/").unwrap();
        assert!(root.join(relative).exists());

        remove_image(&public, &root).await;
        assert!(!root.join(relative).exists());
    }
}
