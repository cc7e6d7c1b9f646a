use std::io;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Width every processed image is resampled to.
pub const TARGET_WIDTH: u32 = 720;

/// Extensions the media batch picks up, compared case-insensitively.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

#[derive(Debug, Error)]
pub enum MediaError {
    /// The source file could not be decoded as a raster image.
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    /// Reading the source or writing the destination failed.
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// Resize one image to the target width and write it under
/// `<output_dir>/media`, keeping the original filename.
///
/// Height preserves the aspect ratio, rounded to the nearest pixel. An
/// image carrying an alpha channel headed for a `.jpg`/`.jpeg`
/// destination is converted to RGB first, since JPEG cannot encode
/// alpha. Returns the relative reference (`./media/<name>`) rendered
/// pages use.
pub fn process_image(path: &Path, output_dir: &Path) -> Result<String, MediaError> {
    debug!("processing image: {}", path.display());

    let media_dir = output_dir.join("media");
    std::fs::create_dir_all(&media_dir).map_err(|source| MediaError::Io {
        path: media_dir.clone(),
        source,
    })?;
    debug!("output media directory: {}", media_dir.display());

    // Sniff the real format before decoding: the extension only decides
    // which encoder writes the result.
    let img = ImageReader::open(path)
        .map_err(|source| MediaError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .with_guessed_format()
        .map_err(|source| MediaError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .decode()
        .map_err(|source| MediaError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let (width, height) = (img.width(), img.height());
    let new_height = (height as f64 * (TARGET_WIDTH as f64 / width as f64)).round() as u32;
    debug!("image size: {width}x{height}, resized: {TARGET_WIDTH}x{new_height}");

    let mut resized = img.resize_exact(TARGET_WIDTH, new_height, FilterType::Lanczos3);

    if resized.color().has_alpha() && is_jpeg(path) {
        debug!("dropping alpha channel for JPEG output");
        resized = DynamicImage::ImageRgb8(resized.to_rgb8());
    }

    let file_name = path.file_name().ok_or_else(|| MediaError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "image path has no file name"),
    })?;
    let output_path = media_dir.join(file_name);
    resized
        .save(&output_path)
        .map_err(|err| save_error(&output_path, err))?;
    debug!("image saved: {}", output_path.display());

    let relative = format!("./media/{}", file_name.to_string_lossy());
    info!("image processed: {} -> {}", path.display(), relative);
    Ok(relative)
}

/// Resize every image directly under `<content_dir>/media`.
///
/// A missing media directory is not an error, media is optional. Files
/// are taken in directory enumeration order and the first failure aborts
/// the batch.
pub fn process_media(content_dir: &Path, output_dir: &Path) -> Result<(), MediaError> {
    let media_dir = content_dir.join("media");
    if !media_dir.is_dir() {
        info!("no media directory, skipping images: {}", media_dir.display());
        return Ok(());
    }

    info!("processing media directory: {}", media_dir.display());

    let mut image_files = Vec::new();
    for entry in WalkDir::new(&media_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|err| walk_error(&media_dir, err))?;
        let path = entry.path();
        if path.is_file() && has_image_extension(path) {
            image_files.push(path.to_path_buf());
        }
    }

    info!("found {} image files", image_files.len());
    for image_file in &image_files {
        debug!("  - {}", image_file.display());
        process_image(image_file, output_dir)?;
    }

    info!("media directory processed: {}", media_dir.display());
    Ok(())
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

// Encoder failures mean the destination was not written, whatever the
// encoder's reason.
fn save_error(path: &Path, err: image::ImageError) -> MediaError {
    let path = path.to_path_buf();
    match err {
        image::ImageError::IoError(source) => MediaError::Io { path, source },
        other => MediaError::Io {
            path,
            source: io::Error::other(other),
        },
    }
}

fn walk_error(dir: &Path, err: walkdir::Error) -> MediaError {
    let msg = err.to_string();
    MediaError::Io {
        path: dir.to_path_buf(),
        source: err.into_io_error().unwrap_or_else(|| io::Error::other(msg)),
    }
}
