use image::{imageops, GrayImage, ImageBuffer, Luma};
use imageproc::{
    contours::{find_contours, BorderType, Contour},
    rect::Rect,
    region_labelling::{connected_components, Connectivity},
};
use log::debug;
use logging_timer::time;

use crate::image_utils::{BLACK, WHITE};
use crate::preprocess::BinaryMask;

pub const DEFAULT_MIN_BUBBLE_AREA: u32 = 400;
pub const DEFAULT_MAX_BUBBLE_AREA: u32 = 2500;
pub const DEFAULT_MIN_ASPECT_RATIO: f32 = 0.8;
pub const DEFAULT_MAX_ASPECT_RATIO: f32 = 1.2;

/// Shape limits a connected component must meet to count as a bubble.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BubbleShapeOptions {
    /// Exclusive lower bound on bounding-box area.
    pub min_area: u32,
    /// Exclusive upper bound on bounding-box area.
    pub max_area: u32,
    /// Inclusive lower bound on width / height.
    pub min_aspect_ratio: f32,
    /// Inclusive upper bound on width / height.
    pub max_aspect_ratio: f32,
}

impl Default for BubbleShapeOptions {
    fn default() -> Self {
        Self {
            min_area: DEFAULT_MIN_BUBBLE_AREA,
            max_area: DEFAULT_MAX_BUBBLE_AREA,
            min_aspect_ratio: DEFAULT_MIN_ASPECT_RATIO,
            max_aspect_ratio: DEFAULT_MAX_ASPECT_RATIO,
        }
    }
}

/// A candidate bubble: an outermost ink component together with the holes it
/// encloses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BubbleRegion {
    bounds: Rect,
    /// Row-major over `bounds`.
    membership: Vec<bool>,
    pixel_count: u32,
}

impl BubbleRegion {
    pub(crate) fn new(bounds: Rect, membership: Vec<bool>) -> Self {
        assert_eq!(
            membership.len(),
            (bounds.width() * bounds.height()) as usize,
            "membership must cover the bounds exactly"
        );
        let pixel_count = membership.iter().filter(|m| **m).count() as u32;
        Self {
            bounds,
            membership,
            pixel_count,
        }
    }

    /// A region covering every pixel of `bounds`.
    pub fn solid(bounds: Rect) -> Self {
        Self::new(bounds, vec![true; (bounds.width() * bounds.height()) as usize])
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn area(&self) -> u32 {
        self.bounds.width() * self.bounds.height()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.bounds.width() as f32 / self.bounds.height() as f32
    }

    pub fn pixel_count(&self) -> u32 {
        self.pixel_count
    }

    /// Reading-order key: top edge first, then left edge.
    pub fn sort_key(&self) -> (i32, i32) {
        (self.bounds.top(), self.bounds.left())
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        let (left, top) = (self.bounds.left() as u32, self.bounds.top() as u32);
        if x < left || y < top {
            return false;
        }
        let (dx, dy) = (x - left, y - top);
        if dx >= self.bounds.width() || dy >= self.bounds.height() {
            return false;
        }
        self.membership[(dy * self.bounds.width() + dx) as usize]
    }

    /// Image coordinates of every member pixel.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.bounds.width();
        let (left, top) = (self.bounds.left() as u32, self.bounds.top() as u32);
        self.membership
            .iter()
            .enumerate()
            .filter(|(_, member)| **member)
            .map(move |(i, _)| (left + i as u32 % width, top + i as u32 / width))
    }
}

/// Determines whether a region's bounding box looks like a bubble.
pub fn region_could_be_bubble(options: &BubbleShapeOptions, region: &BubbleRegion) -> bool {
    let area = region.area();
    let aspect_ratio = region.aspect_ratio();
    area > options.min_area
        && area < options.max_area
        && aspect_ratio >= options.min_aspect_ratio
        && aspect_ratio <= options.max_aspect_ratio
}

/// Bounding box of the pixels on a contour.
fn contour_bounds(contour: &Contour<u32>) -> Option<Rect> {
    let min_x = contour.points.iter().map(|p| p.x).min()?;
    let min_y = contour.points.iter().map(|p| p.y).min()?;
    let max_x = contour.points.iter().map(|p| p.x).max()?;
    let max_y = contour.points.iter().map(|p| p.y).max()?;
    Some(Rect::at(min_x as i32, min_y as i32).of_size(max_x - min_x + 1, max_y - min_y + 1))
}

/// Takes the pixels of component `label` within `bounds` along with every hole
/// they enclose.
fn fill_component(
    labels: &ImageBuffer<Luma<u32>, Vec<u32>>,
    label: u32,
    bounds: Rect,
) -> BubbleRegion {
    let (width, height) = (bounds.width(), bounds.height());
    let (left, top) = (bounds.left() as u32, bounds.top() as u32);

    // Padded by one pixel so everything outside the component is one gap.
    let mut own = GrayImage::new(width + 2, height + 2);
    for y in 0..height {
        for x in 0..width {
            if labels.get_pixel(left + x, top + y)[0] == label {
                own.put_pixel(x + 1, y + 1, WHITE);
            }
        }
    }

    let gaps = connected_components(&own, Connectivity::Four, WHITE);
    let outside = gaps.get_pixel(0, 0)[0];
    let mut membership = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            membership.push(gaps.get_pixel(x + 1, y + 1)[0] != outside);
        }
    }

    BubbleRegion::new(bounds, membership)
}

/// Fills every outermost ink component. Components inside another's hole are
/// left out.
pub fn find_outer_regions(mask: &BinaryMask) -> Vec<BubbleRegion> {
    let (width, height) = mask.dimensions();

    // Border following needs a background frame around the image.
    let mut framed = GrayImage::new(width + 2, height + 2);
    imageops::replace(&mut framed, mask.as_luma(), 1, 1);
    let contours = find_contours::<u32>(&framed);
    let labels = connected_components(mask.as_luma(), Connectivity::Eight, BLACK);

    contours
        .iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter_map(|contour| {
            let framed_bounds = contour_bounds(contour)?;
            let bounds = Rect::at(framed_bounds.left() - 1, framed_bounds.top() - 1)
                .of_size(framed_bounds.width(), framed_bounds.height());
            let start = contour.points.first()?;
            let label = labels.get_pixel(start.x - 1, start.y - 1)[0];
            Some(fill_component(&labels, label, bounds))
        })
        .collect()
}

/// Finds bubble-shaped regions and orders them top-to-bottom, then
/// left-to-right.
#[time]
pub fn find_bubble_regions(mask: &BinaryMask, options: &BubbleShapeOptions) -> Vec<BubbleRegion> {
    let outer_regions = find_outer_regions(mask);
    let outer_region_count = outer_regions.len();

    let mut bubbles = outer_regions
        .into_iter()
        .filter(|region| region_could_be_bubble(options, region))
        .collect::<Vec<BubbleRegion>>();
    bubbles.sort_by_key(|region| region.sort_key());

    debug!(
        "kept {} of {} outer regions as bubble candidates",
        bubbles.len(),
        outer_region_count
    );
    bubbles
}
