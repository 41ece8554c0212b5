use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{imageops::FilterType, RgbaImage};

use crate::error::{Error, Result};

/// SRV slot 0 is never handed to textures, so texture `i` lives in slot `i + 1`.
pub const SRV_INDEX_TOP: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureMetadata {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
}

pub struct MipChain {
    metadata: TextureMetadata,
    levels: Vec<RgbaImage>,
}

impl MipChain {
    /// Builds the full chain down to 1x1, halving each dimension per level.
    pub fn generate(base: RgbaImage) -> Result<Self> {
        let (width, height) = base.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::ZeroSize);
        }

        let mut levels = vec![base];
        loop {
            let (w, h) = levels[levels.len() - 1].dimensions();
            if w == 1 && h == 1 {
                break;
            }
            let next = image::imageops::resize(
                &levels[levels.len() - 1],
                (w / 2).max(1),
                (h / 2).max(1),
                FilterType::Triangle,
            );
            levels.push(next);
        }

        Ok(Self {
            metadata: TextureMetadata {
                width,
                height,
                mip_levels: levels.len() as u32,
            },
            levels,
        })
    }

    pub fn metadata(&self) -> TextureMetadata {
        self.metadata
    }

    pub fn levels(&self) -> &[RgbaImage] {
        &self.levels
    }
}

pub fn decode(path: &Path) -> Result<RgbaImage> {
    Ok(image::open(path)?.to_rgba8())
}

pub struct TextureEntry<T> {
    pub path: PathBuf,
    pub metadata: TextureMetadata,
    pub payload: T,
}

/// Path-keyed list of loaded textures. Indices are stable for the lifetime of
/// the registry.
pub struct TextureRegistry<T> {
    entries: Vec<TextureEntry<T>>,
    by_path: HashMap<PathBuf, usize>,
    capacity: usize,
}

impl<T> TextureRegistry<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            by_path: HashMap::new(),
            capacity,
        }
    }

    pub fn find(&self, path: &Path) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    pub fn index_of(&self, path: &Path) -> Result<usize> {
        self.find(path)
            .ok_or_else(|| Error::TextureNotLoaded(path.to_path_buf()))
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn insert(&mut self, path: &Path, metadata: TextureMetadata, payload: T) -> Result<usize> {
        if let Some(index) = self.find(path) {
            return Ok(index);
        }
        if self.is_full() {
            return Err(Error::DescriptorHeapFull {
                name: "textures".into(),
                capacity: self.capacity as u32,
            });
        }

        let index = self.entries.len();
        self.entries.push(TextureEntry {
            path: path.to_path_buf(),
            metadata,
            payload,
        });
        self.by_path.insert(path.to_path_buf(), index);
        Ok(index)
    }

    pub fn get(&self, index: usize) -> Result<&TextureEntry<T>> {
        self.entries
            .get(index)
            .ok_or(Error::TextureIndexOutOfRange {
                index,
                count: self.entries.len(),
            })
    }

    pub fn metadata(&self, index: usize) -> Result<TextureMetadata> {
        self.get(index).map(|e| e.metadata)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
