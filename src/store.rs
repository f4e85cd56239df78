//! Image storage behind the editor: list saved images, upload new ones.
//!
//! [`DirImageStore`] keeps files on disk as `<root>/images/<id>/<name>` with a
//! JSON index at `<root>/index.json`.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};

const INDEX_FILE: &str = "index.json";
const FALLBACK_NAME: &str = "image.png";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub id: u64,
    pub name: String,
    pub path: PathBuf,
}

pub trait ImageStore: Send + Sync {
    /// Stored images, most recent first.
    fn list(&self) -> Result<Vec<StoredImage>>;

    fn upload(&self, name: &str, bytes: &[u8]) -> Result<StoredImage>;

    fn load(&self, image: &StoredImage) -> Result<RgbaImage> {
        load_image(&image.path)
    }
}

/// Decodes any format the `image` crate understands into RGBA.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    if !path.exists() {
        return Err(Error::ImageNotFound(path.to_path_buf()));
    }
    Ok(image::open(path)?.to_rgba8())
}

#[derive(Default, Serialize, Deserialize)]
struct Index {
    next_id: u64,
    /// Upload order; paths are relative to the store root.
    images: Vec<StoredImage>,
}

#[derive(Debug)]
pub struct DirImageStore {
    root: PathBuf,
    // Serializes index read-modify-write between the UI and upload threads.
    lock: Mutex<()>,
}

impl DirImageStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        log::info!("Image store at {}", root.display());
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    fn read_index(&self) -> Result<Index> {
        let path = self.root.join(INDEX_FILE);
        if !path.exists() {
            return Ok(Index::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn write_index(&self, index: &Index) -> Result<()> {
        let tmp = self.root.join(format!("{INDEX_FILE}.tmp"));
        std::fs::write(&tmp, serde_json::to_string_pretty(index)?)?;
        std::fs::rename(tmp, self.root.join(INDEX_FILE))?;
        Ok(())
    }

    fn resolve(&self, image: &StoredImage) -> StoredImage {
        StoredImage {
            path: self.root.join(&image.path),
            ..image.clone()
        }
    }
}

impl ImageStore for DirImageStore {
    fn list(&self) -> Result<Vec<StoredImage>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let index = self.read_index()?;
        Ok(index.images.iter().rev().map(|img| self.resolve(img)).collect())
    }

    fn upload(&self, name: &str, bytes: &[u8]) -> Result<StoredImage> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut index = self.read_index()?;

        let file_name = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(FALLBACK_NAME)
            .to_string();
        let id = index.next_id;
        let relative = Path::new("images").join(id.to_string()).join(&file_name);
        let absolute = self.root.join(&relative);
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&absolute, bytes)?;

        let entry = StoredImage {
            id,
            name: file_name,
            path: relative,
        };
        index.next_id += 1;
        index.images.push(entry.clone());
        self.write_index(&index)?;
        log::info!("Stored {} ({} bytes) as #{id}", entry.name, bytes.len());
        Ok(self.resolve(&entry))
    }
}
