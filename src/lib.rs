//! Reads and scores photographed or scanned bubble-sheet exams.
//!
//! A sheet image goes through a fixed pipeline: it is binarized
//! ([`preprocess`]), bubble-shaped ink regions are found and put in reading
//! order ([`bubbles`]), each region is judged filled or not ([`fill`]), runs
//! of regions are grouped into questions ([`answers`]), and the resulting
//! answers are scored against an [`answer_key::AnswerKey`] ([`scoring`]).
//! [`interpret`] ties the stages together and runs batches in parallel.

pub mod answer_key;
pub mod answers;
pub mod bubbles;
pub mod debug;
pub mod fill;
pub mod image_utils;
pub mod interpret;
pub mod preprocess;
pub mod report;
pub mod scoring;
pub mod types;
