use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use log::{debug, warn};

use crate::{
    bubbles::BubbleRegion,
    fill::FillDecision,
    image_utils::{GREEN, PINK, RAINBOW, RED},
};

/// Creates a path for a debug image.
pub fn debug_image_path(base: &Path, label: &str) -> PathBuf {
    let mut result = PathBuf::from(base);
    result.set_file_name(format!(
        "{}_debug_{}.png",
        base.file_stem().unwrap_or_default().to_string_lossy(),
        label
    ));
    result
}

/// Writes annotated copies of an input image next to it, or does nothing
/// when disabled.
#[derive(Debug, Clone)]
pub struct ImageDebugWriter {
    input_path: PathBuf,
    input_image: Option<RgbImage>,
}

impl ImageDebugWriter {
    pub fn new(input_path: PathBuf, input_image: RgbImage) -> Self {
        Self {
            input_path,
            input_image: Some(input_image),
        }
    }

    pub fn disabled() -> Self {
        Self {
            input_path: PathBuf::new(),
            input_image: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.input_image.is_some()
    }

    /// Draws on a copy of the input image and saves it under `label`.
    /// Returns the written path.
    pub fn write(&self, label: &str, draw: impl FnOnce(&mut RgbImage)) -> Option<PathBuf> {
        let mut canvas = self.input_image.as_ref()?.clone();
        draw(&mut canvas);

        let path = debug_image_path(&self.input_path, label);
        match canvas.save(&path) {
            Ok(()) => {
                debug!("wrote debug image {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("could not write debug image {}: {}", path.display(), e);
                None
            }
        }
    }
}

fn draw_thick_rect_mut(canvas: &mut RgbImage, rect: Rect, color: Rgb<u8>) {
    draw_hollow_rect_mut(canvas, rect, color);
    let outer =
        Rect::at(rect.left() - 1, rect.top() - 1).of_size(rect.width() + 2, rect.height() + 2);
    draw_hollow_rect_mut(canvas, outer, color);
}

/// Outlines every bubble candidate, cycling colors per question.
pub fn draw_bubble_candidates_debug_image_mut(
    canvas: &mut RgbImage,
    regions: &[BubbleRegion],
    options_per_question: usize,
) {
    for (i, region) in regions.iter().enumerate() {
        let question = i / options_per_question.max(1);
        draw_thick_rect_mut(canvas, region.bounds(), RAINBOW[question % RAINBOW.len()]);
    }
}

/// Outlines filled bubbles in green and unfilled ones in red. Regions with no
/// decision were dropped from a partial question and are outlined in pink.
pub fn draw_fill_decisions_debug_image_mut(
    canvas: &mut RgbImage,
    regions: &[BubbleRegion],
    decisions: &[FillDecision],
) {
    for (i, region) in regions.iter().enumerate() {
        let color = match decisions.get(i) {
            Some(decision) if decision.filled => GREEN,
            Some(_) => RED,
            None => PINK,
        };
        draw_thick_rect_mut(canvas, region.bounds(), color);
    }
}
