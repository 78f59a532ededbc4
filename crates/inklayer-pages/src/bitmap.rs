//! Bitmap handle and render resolution types.

use std::fmt;

/// Render resolution in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dpi(pub u32);

impl fmt::Display for Dpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An RGBA8 page bitmap produced by the rasterizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBitmap {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixel data, row-major, `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl PageBitmap {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * 4,
            "bitmap data length does not match dimensions"
        );
        Self {
            width,
            height,
            data,
        }
    }

    /// A uniformly colored bitmap.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * 4)
            .collect();
        Self::new(width, height, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_fill() {
        let bitmap = PageBitmap::solid(2, 2, [1, 2, 3, 4]);
        assert_eq!(bitmap.data.len(), 16);
        assert_eq!(&bitmap.data[4..8], &[1, 2, 3, 4]);
    }

    #[test]
    #[should_panic]
    fn test_mismatched_length_panics() {
        PageBitmap::new(2, 2, vec![0; 3]);
    }
}
