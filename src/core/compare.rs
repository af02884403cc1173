//! Change detection between two preprocessed frames.
//!
//! The frames are differenced, thresholded and dilated into a binary change
//! mask. Outer contours of the changed regions are traced and the areas of
//! the significant ones are summed into a single score: zero for identical
//! frames, growing with the amount of changed surface.

use super::preprocess::Frame;
use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use imageproc::point::Point;
use thiserror::Error;

/// A pixel counts as changed when the frames differ by more than this.
pub const DIFF_THRESHOLD: u8 = 45;

/// Passes of 3x3 dilation applied to the change mask.
pub const DILATE_ITERATIONS: usize = 2;

#[derive(Debug, Error, PartialEq)]
pub enum CompareError {
    #[error("Frame dimensions differ: {left:?} vs {right:?}")]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },

    #[error("Minimum contour area must be a non-negative number, got {0}")]
    InvalidMinArea(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Closed boundary, with straight runs collapsed to their end points.
    pub points: Vec<Point<i32>>,
    pub area: f64,
}

#[derive(Debug, Clone)]
pub struct Comparison {
    /// Sum of retained contour areas. Higher means more different.
    pub score: f64,
    pub contours: Vec<Contour>,
    /// Post-dilation change mask, 255 where changed.
    pub mask: GrayImage,
}

pub fn compare_frames(
    a: &Frame,
    b: &Frame,
    min_contour_area: f64,
) -> Result<Comparison, CompareError> {
    if a.dimensions() != b.dimensions() {
        return Err(CompareError::DimensionMismatch {
            left: a.dimensions(),
            right: b.dimensions(),
        });
    }
    if min_contour_area.is_nan() || min_contour_area < 0.0 {
        return Err(CompareError::InvalidMinArea(min_contour_area));
    }

    let mut mask = difference_mask(a.as_image(), b.as_image(), DIFF_THRESHOLD);
    for _ in 0..DILATE_ITERATIONS {
        mask = dilate(&mask, Norm::LInf, 1);
    }

    let contours: Vec<Contour> = external_contours(&mask)
        .into_iter()
        .filter(|contour| contour.area >= min_contour_area)
        .collect();
    let score = contours.iter().map(|c| c.area).sum();

    Ok(Comparison {
        score,
        contours,
        mask,
    })
}

/// Binary image marking pixels whose absolute difference exceeds `threshold`.
/// Both images must have the same dimensions.
pub fn difference_mask(a: &GrayImage, b: &GrayImage, threshold: u8) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        let diff = a.get_pixel(x, y).0[0].abs_diff(b.get_pixel(x, y).0[0]);
        Luma([if diff > threshold { 255 } else { 0 }])
    })
}

/// Outermost contours of the foreground in `mask`, in tracing order.
/// Holes, and anything nested inside a hole, are ignored.
pub fn external_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            let points = simplify(&c.points);
            let area = polygon_area(&points);
            Contour { points, area }
        })
        .collect()
}

/// Drop every point that sits in the middle of a straight horizontal,
/// vertical or diagonal run of the closed chain.
fn simplify(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut points = points.to_vec();
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    let n = points.len();
    if n <= 2 {
        return points;
    }

    let step = |from: Point<i32>, to: Point<i32>| {
        ((to.x - from.x).signum(), (to.y - from.y).signum())
    };
    let kept: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            let incoming = step(prev, points[i]);
            incoming != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();

    if kept.is_empty() { points } else { kept }
}

/// Shoelace area of a closed polygon.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}
