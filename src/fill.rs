use crate::bubbles::BubbleRegion;
use crate::preprocess::BinaryMask;

pub const DEFAULT_FILL_THRESHOLD: f32 = 0.5;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FillDecision {
    pub filled: bool,
    /// Fraction of the region's pixels that are ink, in `[0, 1]`.
    pub fill_ratio: f32,
}

/// Counts the ink inside a region's filled interior.
pub fn fill_ratio(mask: &BinaryMask, region: &BubbleRegion) -> f32 {
    let total = region.pixel_count();
    if total == 0 {
        return 0.0;
    }

    let (width, height) = mask.dimensions();
    let inked = region
        .pixels()
        .filter(|(x, y)| *x < width && *y < height && mask.is_foreground(*x, *y))
        .count();
    inked as f32 / total as f32
}

/// A region is filled when strictly more than `threshold` of it is ink.
/// Regions without pixels are never filled.
pub fn classify_fill(mask: &BinaryMask, region: &BubbleRegion, threshold: f32) -> FillDecision {
    let fill_ratio = fill_ratio(mask, region);
    FillDecision {
        filled: region.pixel_count() > 0 && fill_ratio > threshold,
        fill_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_utils::WHITE;
    use image::GrayImage;
    use crate::bubbles::find_outer_regions;
    use imageproc::{
        drawing::{draw_filled_rect_mut, draw_hollow_rect_mut},
        rect::Rect,
    };

    fn mask_with_inked_rows(rows: u32) -> BinaryMask {
        let mut img = GrayImage::new(20, 20);
        if rows > 0 {
            draw_filled_rect_mut(&mut img, Rect::at(0, 0).of_size(10, rows), WHITE);
        }
        BinaryMask::from_luma(img)
    }

    fn ten_by_ten() -> BubbleRegion {
        BubbleRegion::solid(Rect::at(0, 0).of_size(10, 10))
    }

    #[test]
    fn test_fully_inked_region_is_filled() {
        let decision = classify_fill(&mask_with_inked_rows(10), &ten_by_ten(), 0.5);
        assert!(decision.filled);
        assert_eq!(decision.fill_ratio, 1.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mask = mask_with_inked_rows(5);
        let decision = classify_fill(&mask, &ten_by_ten(), 0.5);
        assert_eq!(decision.fill_ratio, 0.5);
        assert!(!decision.filled);

        let decision = classify_fill(&mask, &ten_by_ten(), 0.49);
        assert!(decision.filled);
    }

    #[test]
    fn test_empty_region_is_unfilled() {
        let region = BubbleRegion::new(Rect::at(0, 0).of_size(4, 4), vec![false; 16]);
        let decision = classify_fill(&mask_with_inked_rows(10), &region, 0.0);
        assert!(!decision.filled);
        assert_eq!(decision.fill_ratio, 0.0);
    }

    #[test]
    fn test_only_member_pixels_count() {
        // Left half of the region is a member; only that half is inked.
        let mut membership = vec![false; 100];
        for y in 0..10 {
            for x in 0..5 {
                membership[y * 10 + x] = true;
            }
        }
        let region = BubbleRegion::new(Rect::at(0, 0).of_size(10, 10), membership);
        let mut img = GrayImage::new(20, 20);
        draw_filled_rect_mut(&mut img, Rect::at(0, 0).of_size(5, 10), WHITE);

        let decision = classify_fill(&BinaryMask::from_luma(img), &region, 0.5);
        assert_eq!(decision.fill_ratio, 1.0);
        assert!(decision.filled);
    }

    #[test]
    fn test_ink_inside_the_hole_counts() {
        // A 30x30 ring, 3 pixels thick, with a separate printed block inside.
        let mut img = GrayImage::new(40, 40);
        for t in 0..3 {
            draw_hollow_rect_mut(
                &mut img,
                Rect::at(t, t).of_size(30 - 2 * t as u32, 30 - 2 * t as u32),
                WHITE,
            );
        }
        draw_filled_rect_mut(&mut img, Rect::at(7, 7).of_size(16, 16), WHITE);
        let mask = BinaryMask::from_luma(img);

        let regions = find_outer_regions(&mask);
        assert_eq!(regions.len(), 1);
        let decision = classify_fill(&mask, &regions[0], 0.5);
        assert_eq!(regions[0].pixel_count(), 900);
        // 324 ring pixels plus the 256 pixel block.
        assert_eq!(decision.fill_ratio, 580.0 / 900.0);
        assert!(decision.filled);
    }
}
