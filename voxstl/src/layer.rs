use std::path::Path;

use image::GrayImage;

use crate::{Error, Result};

/// One cross-section of the voxel stack as a dense byte raster.
///
/// Pixel value 0 is off, 0xff is on. Anything else is an input anomaly
/// that the extractors treat as on. The raster is immutable once
/// decoded and is shared read-only between the main thread and the
/// workers of up to two jobs.
#[derive(Debug, Clone)]
pub struct Layer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Layer {
    /// Decode the image at `path` to an 8-bit luma raster.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| Error::ImageLoad {
            path: path.display().to_string(),
            source,
        })?;

        Ok(Self::from_gray(img.to_luma8()))
    }

    pub fn from_gray(img: GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Layer {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Build a layer from a raw row-major byte raster.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(pixels.len(), width as usize * height as usize);
        Layer {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the raster has no pixels at all, which happens when
    /// either dimension is 0.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Whether the voxel at (x, y) is present.
    pub fn on(&self, x: u32, y: u32) -> bool {
        self.get(x, y) != 0
    }

    /// The row `y` as a byte slice of length `width`.
    pub fn row(&self, y: u32) -> &[u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.pixels[start..start + w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_access() {
        let layer = Layer::from_raw(2, 2, vec![0xff, 0x00, 0x00, 0xff]);

        assert_eq!(layer.dimensions(), (2, 2));
        assert!(layer.on(0, 0));
        assert!(!layer.on(1, 0));
        assert!(!layer.on(0, 1));
        assert!(layer.on(1, 1));

        assert_eq!(layer.row(0), &[0xff, 0x00]);
        assert_eq!(layer.row(1), &[0x00, 0xff]);
    }

    #[test]
    fn test_zero_sized_rasters() {
        assert!(Layer::from_raw(0, 4, vec![]).is_empty());
        assert!(Layer::from_raw(4, 0, vec![]).is_empty());
        assert!(!Layer::from_raw(1, 1, vec![0]).is_empty());
    }

    #[test]
    fn test_anomalous_values_count_as_on() {
        let layer = Layer::from_raw(2, 1, vec![0x7f, 0x00]);
        assert!(layer.on(0, 0));
        assert_eq!(layer.get(0, 0), 0x7f);
    }
}
