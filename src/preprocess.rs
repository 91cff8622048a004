use image::{imageops, GrayImage, RgbImage};
use imageproc::{
    contrast::{otsu_level, threshold},
    filter::gaussian_blur_f32,
};
use log::debug;
use logging_timer::time;

use crate::image_utils::{kernel_size_to_sigma, ratio, BLACK, WHITE};

pub const DEFAULT_BLUR_KERNEL_SIZE: u32 = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PreprocessOptions {
    /// Gaussian smoothing kernel size. 0 or 1 disables smoothing.
    pub blur_kernel_size: u32,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            blur_kernel_size: DEFAULT_BLUR_KERNEL_SIZE,
        }
    }
}

/// Foreground/background mask of a sheet image. Ink is foreground.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    /// Builds a mask where every non-zero pixel is foreground.
    pub fn from_luma(img: GrayImage) -> Self {
        let mut img = img;
        for pixel in img.pixels_mut() {
            *pixel = if pixel.0[0] > 0 { WHITE } else { BLACK };
        }
        Self(img)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y).0[0] > 0
    }

    /// Fraction of the mask that is foreground.
    pub fn coverage(&self) -> f32 {
        ratio(&self.0, &WHITE)
    }

    pub fn as_luma(&self) -> &GrayImage {
        &self.0
    }
}

/// Smooths a grayscale image with a Gaussian of the given kernel size.
pub fn smooth(gray: &GrayImage, kernel_size: u32) -> GrayImage {
    if kernel_size <= 1 {
        return gray.clone();
    }
    gaussian_blur_f32(gray, kernel_size_to_sigma(kernel_size))
}

/// Converts a color sheet image into an ink mask: desaturate, smooth, then
/// binarize at the Otsu level with dark pixels as foreground.
#[time]
pub fn preprocess_image(img: &RgbImage, options: &PreprocessOptions) -> BinaryMask {
    let gray = imageops::grayscale(img);
    let smoothed = smooth(&gray, options.blur_kernel_size);
    let level = otsu_level(&smoothed);

    // `threshold` maps pixels at or below the level to black; invert so ink is white.
    let mut binary = threshold(&smoothed, level);
    imageops::invert(&mut binary);

    let mask = BinaryMask(binary);
    debug!(
        "binarized {}x{} image at otsu level {} ({:.3} foreground)",
        img.width(),
        img.height(),
        level,
        mask.coverage()
    );
    mask
}
