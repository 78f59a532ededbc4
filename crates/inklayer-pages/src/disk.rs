//! On-disk bitmap cache keyed by (page index, dpi).
//!
//! Rendered bitmaps persist as PNG files so reopening a document skips
//! re-rendering. A miss is not an error, and a corrupt entry is deleted and
//! treated as a miss.

use crate::bitmap::{Dpi, PageBitmap};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use thiserror::Error;

/// Disk cache failure. Only writes surface errors; reads degrade to misses.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("PNG encoding error: {0}")]
    Encode(String),
}

/// PNG-backed bitmap cache under a directory.
pub struct DiskBitmapCache {
    dir: PathBuf,
}

impl DiskBitmapCache {
    /// Create a cache at the given directory, creating it if needed.
    pub fn new(dir: PathBuf) -> Result<Self, CacheError> {
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .map_err(|e| CacheError::Io(format!("failed to create cache directory: {e}")))?;
        }
        Ok(Self { dir })
    }

    /// Create a cache in the platform's cache directory.
    pub fn default_location() -> Result<Self, CacheError> {
        let base = dirs::cache_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| CacheError::Io("could not determine cache directory".to_string()))?;
        Self::new(base.join("inklayer").join("pages"))
    }

    fn entry_path(&self, page: usize, dpi: Dpi) -> PathBuf {
        self.dir.join(format!("page{page:04}_{dpi}.png"))
    }

    /// Store a rendered bitmap.
    pub fn store(&self, page: usize, dpi: Dpi, bitmap: &PageBitmap) -> Result<(), CacheError> {
        let path = self.entry_path(page, dpi);
        let file = fs::File::create(&path)
            .map_err(|e| CacheError::Io(format!("failed to create {}: {e}", path.display())))?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), bitmap.width, bitmap.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| CacheError::Encode(e.to_string()))?;
        writer
            .write_image_data(&bitmap.data)
            .map_err(|e| CacheError::Encode(e.to_string()))?;
        Ok(())
    }

    /// Load a cached bitmap. Missing and corrupt entries both come back as
    /// `None`; a corrupt entry is deleted so the next store replaces it.
    pub fn load(&self, page: usize, dpi: Dpi) -> Option<PageBitmap> {
        let path = self.entry_path(page, dpi);
        let file = fs::File::open(&path).ok()?;
        match decode_png(BufReader::new(file)) {
            Ok(bitmap) => Some(bitmap),
            Err(err) => {
                log::warn!(
                    "discarding corrupt cache entry {}: {err}",
                    path.display()
                );
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Drop every cached resolution of a page.
    pub fn remove(&self, page: usize) {
        let prefix = format!("page{page:04}_");
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(&prefix) {
                let _ = fs::remove_file(entry.path());
            }
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

fn decode_png(reader: impl std::io::Read) -> Result<PageBitmap, String> {
    let decoder = png::Decoder::new(reader);
    let mut reader = decoder.read_info().map_err(|e| e.to_string())?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(|e| e.to_string())?;
    if info.color_type != png::ColorType::Rgba || info.bit_depth != png::BitDepth::Eight {
        return Err(format!(
            "unexpected pixel format {:?}/{:?}",
            info.color_type, info.bit_depth
        ));
    }
    buf.truncate(info.buffer_size());
    Ok(PageBitmap::new(info.width, info.height, buf))
}
