use std::path::{Path, PathBuf};

use image::RgbImage;
use log::{info, warn};
use logging_timer::time;
use rayon::prelude::*;
use thiserror::Error;

use crate::answer_key::AnswerKey;
use crate::answers::{
    map_bubbles_to_answers, DEFAULT_OPTIONS_PER_QUESTION, MAX_OPTIONS_PER_QUESTION,
};
use crate::bubbles::{find_bubble_regions, BubbleShapeOptions};
use crate::debug::{
    draw_bubble_candidates_debug_image_mut, draw_fill_decisions_debug_image_mut, ImageDebugWriter,
};
use crate::fill::DEFAULT_FILL_THRESHOLD;
use crate::preprocess::{preprocess_image, PreprocessOptions};
use crate::scoring::{score_answers, ScoreSheet};
use crate::types::AnswerRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct InterpretOptions {
    pub debug: bool,
    pub preprocess: PreprocessOptions,
    pub bubble_shape: BubbleShapeOptions,
    pub fill_threshold: f32,
    pub options_per_question: usize,
}

impl Default for InterpretOptions {
    fn default() -> Self {
        Self {
            debug: false,
            preprocess: PreprocessOptions::default(),
            bubble_shape: BubbleShapeOptions::default(),
            fill_threshold: DEFAULT_FILL_THRESHOLD,
            options_per_question: DEFAULT_OPTIONS_PER_QUESTION,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum OptionsError {
    #[error("options per question must be between 1 and 26, got {0}")]
    OptionsPerQuestion(usize),

    #[error("bubble area range {0}..{1} is empty")]
    AreaRange(u32, u32),

    #[error("bubble aspect ratio range {0}..={1} is empty or not positive")]
    AspectRatioRange(f32, f32),

    #[error("fill threshold must be between 0 and 1, got {0}")]
    FillThreshold(f32),
}

impl InterpretOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !(1..=MAX_OPTIONS_PER_QUESTION).contains(&self.options_per_question) {
            return Err(OptionsError::OptionsPerQuestion(self.options_per_question));
        }

        let shape = &self.bubble_shape;
        // Both bounds are exclusive, so at least one integer must fit between them.
        if shape.min_area.saturating_add(1) >= shape.max_area {
            return Err(OptionsError::AreaRange(shape.min_area, shape.max_area));
        }
        if !(shape.min_aspect_ratio > 0.0 && shape.min_aspect_ratio <= shape.max_aspect_ratio) {
            return Err(OptionsError::AspectRatioRange(
                shape.min_aspect_ratio,
                shape.max_aspect_ratio,
            ));
        }

        if !(0.0..=1.0).contains(&self.fill_threshold) {
            return Err(OptionsError::FillThreshold(self.fill_threshold));
        }

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum InterpretSheetError {
    #[error("could not open image {}: {source}", .path.display())]
    ImageOpen {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("could not decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
}

/// What was read from one sheet and how it scored.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretedSheet {
    pub answers: AnswerRecord,
    pub scores: ScoreSheet,
    pub bubble_count: usize,
    /// Bubbles left over after the last complete question.
    pub discarded_bubbles: usize,
}

pub fn load_sheet_image(image_path: &Path) -> Result<RgbImage, InterpretSheetError> {
    match image::open(image_path) {
        Ok(img) => Ok(img.into_rgb8()),
        Err(source) => Err(InterpretSheetError::ImageOpen {
            path: image_path.to_path_buf(),
            source,
        }),
    }
}

/// Decodes an encoded (PNG, JPEG, …) sheet image held in memory.
pub fn decode_sheet_image(bytes: &[u8]) -> Result<RgbImage, InterpretSheetError> {
    Ok(image::load_from_memory(bytes)?.into_rgb8())
}

/// Runs the whole pipeline on a decoded sheet image.
#[time]
pub fn interpret_sheet(
    img: &RgbImage,
    answer_key: &AnswerKey,
    options: &InterpretOptions,
    debug: &ImageDebugWriter,
) -> InterpretedSheet {
    let mask = preprocess_image(img, &options.preprocess);
    let bubbles = find_bubble_regions(&mask, &options.bubble_shape);
    if bubbles.is_empty() {
        warn!("no bubbles found on {}x{} image", img.width(), img.height());
    }

    let mapped = map_bubbles_to_answers(
        &bubbles,
        &mask,
        options.options_per_question,
        options.fill_threshold,
    );
    let scores = score_answers(&mapped.record, answer_key);

    if debug.is_enabled() {
        debug.write("candidates", |canvas| {
            draw_bubble_candidates_debug_image_mut(canvas, &bubbles, options.options_per_question)
        });
        debug.write("fill", |canvas| {
            draw_fill_decisions_debug_image_mut(canvas, &bubbles, &mapped.decisions)
        });
    }

    InterpretedSheet {
        answers: mapped.record,
        scores,
        bubble_count: bubbles.len(),
        discarded_bubbles: mapped.discarded_regions,
    }
}

#[time]
pub fn interpret_sheet_image(
    image_path: &Path,
    answer_key: &AnswerKey,
    options: &InterpretOptions,
) -> Result<InterpretedSheet, InterpretSheetError> {
    let img = load_sheet_image(image_path)?;

    let debug = if options.debug {
        ImageDebugWriter::new(image_path.to_path_buf(), img.clone())
    } else {
        ImageDebugWriter::disabled()
    };

    let sheet = interpret_sheet(&img, answer_key, options, &debug);
    info!(
        "{}: {} question(s), total score {}",
        image_path.display(),
        sheet.answers.len(),
        sheet.scores.total
    );
    Ok(sheet)
}

/// Interprets many sheets in parallel. Results are in the same order as
/// `image_paths`; a failed image does not affect the others.
#[time]
pub fn interpret_sheet_images(
    image_paths: &[PathBuf],
    answer_key: &AnswerKey,
    options: &InterpretOptions,
) -> Vec<Result<InterpretedSheet, InterpretSheetError>> {
    image_paths
        .par_iter()
        .map(|image_path| interpret_sheet_image(image_path, answer_key, options))
        .collect()
}
