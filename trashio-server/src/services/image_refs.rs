//! Mapping stored image references to scoring inputs
//!
//! Reports store image URLs as the browser sees them. Files under
//! `/uploads/` live in the upload directory and are handed to the scorer as
//! local paths; absolute http(s) URLs are passed through.

use std::path::{Component, Path, PathBuf};

const UPLOADS_PREFIX: &str = "/uploads/";

/// How the scorer should read an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Path(PathBuf),
    Url(String),
    /// Neither form applies; the scorer will refuse it
    Unresolvable,
}

impl ImageRef {
    /// `(image_path, image_url)` pair for a scoring request
    pub fn into_parts(self) -> (Option<String>, Option<String>) {
        match self {
            ImageRef::Path(path) => (Some(path.to_string_lossy().into_owned()), None),
            ImageRef::Url(url) => (None, Some(url)),
            ImageRef::Unresolvable => (None, None),
        }
    }
}

pub fn resolve_image_ref(reference: &str, upload_dir: &Path) -> ImageRef {
    let reference = reference.trim();

    if let Some(file) = reference.strip_prefix(UPLOADS_PREFIX) {
        let relative = Path::new(file);
        let stays_inside = !file.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        return if stays_inside {
            ImageRef::Path(upload_dir.join(relative))
        } else {
            ImageRef::Unresolvable
        };
    }

    if reference.starts_with("http://") || reference.starts_with("https://") {
        return ImageRef::Url(reference.to_string());
    }

    ImageRef::Unresolvable
}
