use log::{debug, warn};
use logging_timer::time;

use crate::bubbles::BubbleRegion;
use crate::fill::{classify_fill, FillDecision};
use crate::preprocess::BinaryMask;
use crate::types::{Answer, AnswerRecord, QuestionId};

pub const DEFAULT_OPTIONS_PER_QUESTION: usize = 4;

/// The most options a question can have, `A` through `Z`.
pub const MAX_OPTIONS_PER_QUESTION: usize = 26;

#[derive(Clone, Debug, PartialEq)]
pub struct MappedAnswers {
    pub record: AnswerRecord,
    /// Fill decision for each region that was assigned to a question, in
    /// region order.
    pub decisions: Vec<FillDecision>,
    /// Trailing regions that did not make up a whole question.
    pub discarded_regions: usize,
}

/// The option letter for a position within a question: 0 is `A`.
pub fn option_letter(position: usize) -> char {
    u32::try_from(position)
        .ok()
        .and_then(|offset| ('A' as u32).checked_add(offset))
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Groups ordered bubble regions into questions of `options_per_question`
/// consecutive regions and reads the marked options of each.
#[time]
pub fn map_bubbles_to_answers(
    regions: &[BubbleRegion],
    mask: &BinaryMask,
    options_per_question: usize,
    fill_threshold: f32,
) -> MappedAnswers {
    if options_per_question == 0 {
        warn!("cannot group {} bubbles into empty questions", regions.len());
        return MappedAnswers {
            record: AnswerRecord::new(),
            decisions: Vec::new(),
            discarded_regions: regions.len(),
        };
    }

    let mut record = AnswerRecord::new();
    let mut decisions = Vec::with_capacity(regions.len());
    let chunks = regions.chunks_exact(options_per_question);
    let discarded_regions = chunks.remainder().len();

    for (question_index, chunk) in chunks.enumerate() {
        let mut marked = Vec::new();
        for (position, region) in chunk.iter().enumerate() {
            let decision = classify_fill(mask, region, fill_threshold);
            if decision.filled {
                marked.push(option_letter(position));
            }
            decisions.push(decision);
        }

        let question = QuestionId::from_index(question_index);
        let answer = Answer::from_marked(marked);
        debug!("{}: {}", question, answer);
        record.insert(question, answer);
    }

    if discarded_regions > 0 {
        warn!(
            "dropped {} trailing bubble(s) that do not form a complete question of {} options",
            discarded_regions, options_per_question
        );
    }

    MappedAnswers {
        record,
        decisions,
        discarded_regions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubbles::{find_bubble_regions, BubbleShapeOptions};
    use crate::image_utils::WHITE;
    use image::GrayImage;
    use imageproc::{
        drawing::{draw_filled_rect_mut, draw_hollow_rect_mut},
        rect::Rect,
    };
    use proptest::prelude::*;

    const BUBBLE_SIZE: u32 = 30;
    const PITCH: u32 = 50;

    /// Draws one row per question. `marks[q]` lists the filled positions.
    fn draw_sheet(marks: &[Vec<usize>], options: usize) -> BinaryMask {
        let width = PITCH * options as u32 + 20;
        let height = PITCH * marks.len() as u32 + 20;
        let mut img = GrayImage::new(width, height);
        for (q, filled) in marks.iter().enumerate() {
            for position in 0..options {
                let x = 20 + PITCH * position as u32;
                let y = 20 + PITCH * q as u32;
                if filled.contains(&position) {
                    draw_filled_rect_mut(
                        &mut img,
                        Rect::at(x as i32, y as i32).of_size(BUBBLE_SIZE, BUBBLE_SIZE),
                        WHITE,
                    );
                } else {
                    for t in 0..3 {
                        draw_hollow_rect_mut(
                            &mut img,
                            Rect::at((x + t) as i32, (y + t) as i32)
                                .of_size(BUBBLE_SIZE - 2 * t, BUBBLE_SIZE - 2 * t),
                            WHITE,
                        );
                    }
                }
            }
        }
        BinaryMask::from_luma(img)
    }

    fn read_sheet(mask: &BinaryMask, options: usize) -> MappedAnswers {
        let regions = find_bubble_regions(mask, &BubbleShapeOptions::default());
        map_bubbles_to_answers(&regions, mask, options, 0.5)
    }

    fn token(mapped: &MappedAnswers, question: u32) -> String {
        mapped.record[&QuestionId::new(question).unwrap()].to_string()
    }

    #[test]
    fn test_option_letters() {
        assert_eq!(option_letter(0), 'A');
        assert_eq!(option_letter(3), 'D');
        assert_eq!(option_letter(25), 'Z');
    }

    #[test]
    fn test_blank_single_and_multiple_marks() {
        let mask = draw_sheet(&[vec![], vec![1], vec![3, 0]], 4);
        let mapped = read_sheet(&mask, 4);

        assert_eq!(mapped.record.len(), 3);
        assert_eq!(token(&mapped, 1), "-");
        assert_eq!(token(&mapped, 2), "B");
        assert_eq!(token(&mapped, 3), "A,D");
        assert_eq!(mapped.discarded_regions, 0);
        assert_eq!(mapped.decisions.len(), 12);
        assert_eq!(mapped.decisions.iter().filter(|d| d.filled).count(), 3);
    }

    #[test]
    fn test_no_regions_gives_empty_record() {
        let mask = BinaryMask::from_luma(GrayImage::new(10, 10));
        let mapped = map_bubbles_to_answers(&[], &mask, 4, 0.5);
        assert!(mapped.record.is_empty());
        assert_eq!(mapped.discarded_regions, 0);
    }

    #[test]
    fn test_trailing_partial_question_is_dropped() {
        let mask = draw_sheet(&[vec![0], vec![2]], 5);
        // 10 bubbles read as questions of 4: two full questions, two left over.
        let mapped = read_sheet(&mask, 4);
        assert_eq!(mapped.record.len(), 2);
        assert_eq!(mapped.discarded_regions, 2);
        assert_eq!(token(&mapped, 1), "A");
        // Second chunk: row 1 position 4, then row 2 positions 0 to 2.
        // The row 2 mark at position 2 is the chunk's fourth bubble.
        assert_eq!(token(&mapped, 2), "D");
    }

    #[test]
    fn test_zero_options_discards_everything() {
        let regions = vec![BubbleRegion::solid(Rect::at(0, 0).of_size(3, 3))];
        let mask = BinaryMask::from_luma(GrayImage::new(5, 5));
        let mapped = map_bubbles_to_answers(&regions, &mask, 0, 0.5);
        assert!(mapped.record.is_empty());
        assert_eq!(mapped.discarded_regions, 1);
    }

    proptest! {
        #[test]
        fn test_single_mark_reads_its_position(choices in prop::collection::vec(0usize..4, 1..8)) {
            let marks = choices.iter().map(|c| vec![*c]).collect::<Vec<_>>();
            let mapped = read_sheet(&draw_sheet(&marks, 4), 4);

            prop_assert_eq!(mapped.record.len(), choices.len());
            for (i, choice) in choices.iter().enumerate() {
                prop_assert_eq!(
                    &mapped.record[&QuestionId::from_index(i)],
                    &Answer::Single(option_letter(*choice))
                );
            }
        }

        #[test]
        fn test_record_has_one_entry_per_whole_chunk(count in 0usize..40, options in 1usize..7) {
            let regions = (0..count)
                .map(|i| BubbleRegion::solid(Rect::at(i as i32 * 4, 0).of_size(3, 3)))
                .collect::<Vec<_>>();
            let mask = BinaryMask::from_luma(GrayImage::new(4 * count as u32 + 4, 4));
            let mapped = map_bubbles_to_answers(&regions, &mask, options, 0.5);

            prop_assert_eq!(mapped.record.len(), count / options);
            prop_assert_eq!(mapped.discarded_regions, count % options);
            prop_assert!(mapped.record.values().all(|a| a.is_blank()));
        }
    }
}
