//! Reference images loaded from the resources folders.

use anyhow::{Context, Result, anyhow};
use image::GrayImage;
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions accepted as template images.
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// An immutable reference image, identified by its file name.
#[derive(Debug, Clone)]
pub struct Template {
    id: String,
    image: GrayImage,
}

impl Template {
    /// Builds a template from an in-memory grayscale image.
    pub fn from_image(id: impl Into<String>, image: GrayImage) -> Self {
        Self {
            id: id.into(),
            image,
        }
    }

    /// Loads a template from disk. The identifier is the file name.
    pub fn load(path: &Path) -> Result<Self> {
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Template path has no file name: {}", path.display()))?;

        let image = image::open(path)
            .with_context(|| format!("Failed to load template {}", path.display()))?
            .to_luma8();

        Ok(Self { id, image })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Recursively collects image files below `dir`.
fn collect_image_files(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read template folder {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_image_files(&path, found)?;
        } else if is_image_file(&path) {
            found.push(path);
        } else {
            tracing::debug!("Skipping non-image file {}", path.display());
        }
    }

    Ok(())
}

/// Loads every template image under `dir`, searched recursively.
///
/// Templates come back sorted by path so the enumeration order is the same
/// on every platform and every run.
pub fn load_template_dir(dir: &Path) -> Result<Vec<Template>> {
    let mut paths = Vec::new();
    collect_image_files(dir, &mut paths)?;
    paths.sort();

    let templates = paths
        .iter()
        .map(|path| Template::load(path))
        .collect::<Result<Vec<_>>>()?;

    tracing::info!("Loaded {} templates from {}", templates.len(), dir.display());
    Ok(templates)
}
