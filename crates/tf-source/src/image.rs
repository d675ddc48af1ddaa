use std::path::Path;

use anyhow::{Context, Result};
use image::DynamicImage;
use tf_core::frame::FrameBuffer;

/// Extensions décodées par le crate `image` (features du workspace).
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];
/// Conteneurs courants confiés à ffmpeg.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "mov", "avi", "m4v", "mpg", "mpeg", "ogv"];

/// Image ou vidéo, d'après l'extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
}

/// Classe un chemin en image ou vidéo d'après son extension.
///
/// # Example
/// ```
/// use tf_source::image::{classify_media, MediaType};
/// use std::path::Path;
/// assert_eq!(classify_media(Path::new("a.PNG")), Some(MediaType::Image));
/// assert_eq!(classify_media(Path::new("clip.webm")), Some(MediaType::Video));
/// assert_eq!(classify_media(Path::new("notes.txt")), None);
/// ```
#[must_use]
pub fn classify_media(path: &Path) -> Option<MediaType> {
    let ext = path.extension()?.to_str()?;
    if IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)) {
        Some(MediaType::Image)
    } else if VIDEO_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)) {
        Some(MediaType::Video)
    } else {
        None
    }
}

/// Décode une image depuis le disque en RGBA8.
///
/// Pour un GIF animé, seule la première frame est retenue.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
///
/// # Example
/// ```no_run
/// use tf_source::image::load_image;
/// let frame = load_image("photo.png".as_ref()).unwrap();
/// ```
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    let img = image::open(path).with_context(|| format!("Impossible de charger {}", path.display()))?;
    let frame = to_frame(&img);
    log::info!(
        "Image chargée : {} ({}x{})",
        path.display(),
        frame.width,
        frame.height
    );
    Ok(frame)
}

/// Décode une image déjà en mémoire (format deviné d'après les octets).
///
/// # Errors
/// Returns an error if the bytes are not a supported image.
pub fn decode_image(bytes: &[u8]) -> Result<FrameBuffer> {
    let img = image::load_from_memory(bytes).context("Format d'image non reconnu")?;
    Ok(to_frame(&img))
}

/// Toute image décodée passe en RGBA8, seul format que lit le Sampler.
fn to_frame(img: &DynamicImage) -> FrameBuffer {
    let (width, height) = (img.width(), img.height());
    FrameBuffer {
        data: img.to_rgba8().into_raw(),
        width,
        height,
    }
}
