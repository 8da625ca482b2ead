//! The canonical binary canvas every extractor works on.

use image::{GrayImage, Luma};

use crate::{ExtractError, Result};

/// Side length of the square canvas in pixels.
pub const CANVAS_SIZE: u32 = 1000;

/// Pixel value of drawing (ink) pixels.
pub const FOREGROUND: u8 = 255;

/// Pixel value of empty paper.
pub const BACKGROUND: u8 = 0;

/// A `CANVAS_SIZE` x `CANVAS_SIZE` single-channel image holding only
/// [`FOREGROUND`] and [`BACKGROUND`] values.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    image: GrayImage,
}

impl Canvas {
    /// An all-background canvas.
    pub fn blank() -> Self {
        Self {
            image: GrayImage::new(CANVAS_SIZE, CANVAS_SIZE),
        }
    }

    /// Wrap a grayscale image that already has canvas dimensions.
    ///
    /// Any non-zero pixel becomes foreground.
    pub fn from_gray(image: GrayImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width != CANVAS_SIZE || height != CANVAS_SIZE {
            return Err(ExtractError::CanvasSize {
                expected: CANVAS_SIZE,
                width,
                height,
            });
        }
        Ok(Self::rebinarize(image))
    }

    /// Snap every pixel to foreground or background. Callers guarantee the size.
    pub(crate) fn rebinarize(mut image: GrayImage) -> Self {
        debug_assert_eq!(image.dimensions(), (CANVAS_SIZE, CANVAS_SIZE));
        for px in image.pixels_mut() {
            px.0[0] = if px.0[0] == BACKGROUND { BACKGROUND } else { FOREGROUND };
        }
        Self { image }
    }

    /// Mark a single pixel as foreground. Out-of-range coordinates are ignored.
    pub fn set_foreground(&mut self, x: u32, y: u32) {
        if x < CANVAS_SIZE && y < CANVAS_SIZE {
            self.image.put_pixel(x, y, Luma([FOREGROUND]));
        }
    }

    /// Fill the inclusive rectangle `(x0, y0)..=(x1, y1)`, clipped to the canvas.
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) {
        let last = CANVAS_SIZE - 1;
        for y in y0.min(last)..=y1.min(last) {
            for x in x0.min(last)..=x1.min(last) {
                self.image.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        x < CANVAS_SIZE && y < CANVAS_SIZE && self.image.get_pixel(x, y).0[0] == FOREGROUND
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.image.pixels().filter(|px| px.0[0] == FOREGROUND).count()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_gray(self) -> GrayImage {
        self.image
    }

    /// Geometric center of the canvas in canvas space.
    pub fn center() -> (f64, f64) {
        let half = f64::from(CANVAS_SIZE) / 2.0;
        (half, half)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::blank()
    }
}
