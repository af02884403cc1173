use image::{ImageBuffer, Pixel};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MaskError {
    #[error("Invalid border spec: {message}")]
    InvalidBorder { message: String },
}

/// Percentages of width (left/right) and height (top/bottom) blanked out
/// before two frames are compared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderSpec {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl BorderSpec {
    pub const NONE: BorderSpec = BorderSpec {
        left: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
    };

    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Result<Self, MaskError> {
        for (side, value) in [
            ("left", left),
            ("top", top),
            ("right", right),
            ("bottom", bottom),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(MaskError::InvalidBorder {
                    message: format!("{side} must be within 0..=100, got {value}"),
                });
            }
        }
        if left + right >= 100.0 {
            return Err(MaskError::InvalidBorder {
                message: format!("left + right must stay below 100, got {}", left + right),
            });
        }
        if top + bottom >= 100.0 {
            return Err(MaskError::InvalidBorder {
                message: format!("top + bottom must stay below 100, got {}", top + bottom),
            });
        }

        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    pub fn left(&self) -> f32 {
        self.left
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn right(&self) -> f32 {
        self.right
    }

    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    /// Pixel rectangles `(x, y, width, height)` painted for an image of the
    /// given size, in paint order: left, top, right, bottom. Empty bands are
    /// left out.
    pub fn bands(&self, width: u32, height: u32) -> Vec<(u32, u32, u32, u32)> {
        let left = band_extent(width, self.left);
        let top = band_extent(height, self.top);
        let right = band_extent(width, self.right);
        let bottom = band_extent(height, self.bottom);

        [
            (0, 0, left, height),
            (0, 0, width, top),
            (width - right, 0, right, height),
            (0, height - bottom, width, bottom),
        ]
        .into_iter()
        .filter(|&(_, _, w, h)| w > 0 && h > 0)
        .collect()
    }
}

impl Default for BorderSpec {
    /// Left 5%, top 10%, right 5%, bottom 0%.
    fn default() -> Self {
        Self {
            left: 5.0,
            top: 10.0,
            right: 5.0,
            bottom: 0.0,
        }
    }
}

impl fmt::Display for BorderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.top, self.right, self.bottom)
    }
}

/// Parses `left,top,right,bottom`.
impl FromStr for BorderSpec {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MaskError::InvalidBorder {
                message: format!("{s:?}: {e}"),
            })?;

        match values.as_slice() {
            &[left, top, right, bottom] => Self::new(left, top, right, bottom),
            _ => Err(MaskError::InvalidBorder {
                message: format!("expected four comma-separated values, got {s:?}"),
            }),
        }
    }
}

// Truncates toward zero, so a 5% band on a 630px-wide image is 31px.
fn band_extent(extent: u32, percent: f32) -> u32 {
    ((extent as f64 * percent as f64) / 100.0) as u32
}

/// Overwrite the border bands of `image` with `fill`.
///
/// Bands are painted left, top, right, bottom. Corners covered by two bands
/// are simply painted twice; nothing is blended.
pub fn mask_borders_mut<P>(
    image: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    border: BorderSpec,
    fill: P,
) where
    P: Pixel + 'static,
{
    let (width, height) = image.dimensions();
    for (x, y, w, h) in border.bands(width, height) {
        let rect = Rect::at(x as i32, y as i32).of_size(w, h);
        draw_filled_rect_mut(image, rect, fill);
    }
}

pub fn mask_borders<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    border: BorderSpec,
    fill: P,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
{
    let mut masked = image.clone();
    mask_borders_mut(&mut masked, border, fill);
    masked
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([((x * 7 + y * 13) % 251) as u8 + 1]))
    }

    #[test]
    fn test_zero_border_is_identity() {
        let image = gradient(64, 48);
        let masked = mask_borders(&image, BorderSpec::NONE, Luma([0]));
        assert_eq!(masked, image);
    }

    #[test]
    fn test_masking_is_idempotent() {
        let image = gradient(97, 61);
        let border = BorderSpec::new(12.5, 7.0, 3.0, 20.0).unwrap();

        let once = mask_borders(&image, border, Luma([9]));
        let twice = mask_borders(&once, border, Luma([9]));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_default_bands_on_640x480() {
        let bands = BorderSpec::default().bands(640, 480);
        assert_eq!(
            bands,
            vec![(0, 0, 32, 480), (0, 0, 640, 48), (608, 0, 32, 480)]
        );
    }

    #[test]
    fn test_band_widths_truncate() {
        // 5% of 630 is 31.5
        let border = BorderSpec::new(5.0, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(border.bands(630, 10), vec![(0, 0, 31, 10)]);
    }

    #[test]
    fn test_masked_pixels_take_fill_and_inner_pixels_survive() {
        let image = gradient(100, 50);
        let border = BorderSpec::new(10.0, 20.0, 10.0, 20.0).unwrap();
        let masked = mask_borders(&image, border, Luma([0]));

        assert_eq!(masked.dimensions(), image.dimensions());
        for (x, y, pixel) in masked.enumerate_pixels() {
            let in_band = x < 10 || x >= 90 || y < 10 || y >= 40;
            if in_band {
                assert_eq!(pixel.0[0], 0, "({x}, {y}) should be masked");
            } else {
                assert_eq!(pixel, image.get_pixel(x, y), "({x}, {y}) should be untouched");
            }
        }
    }

    #[test]
    fn test_custom_fill_on_color_image_covers_corners() {
        let image = RgbImage::from_pixel(40, 40, Rgb([10, 20, 30]));
        let border = BorderSpec::new(25.0, 25.0, 25.0, 25.0).unwrap();
        let masked = mask_borders(&image, border, Rgb([255, 0, 0]));

        for corner in [(0, 0), (39, 0), (0, 39), (39, 39)] {
            assert_eq!(*masked.get_pixel(corner.0, corner.1), Rgb([255, 0, 0]));
        }
        assert_eq!(*masked.get_pixel(20, 20), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_rejects_out_of_range_borders() {
        assert!(BorderSpec::new(-1.0, 0.0, 0.0, 0.0).is_err());
        assert!(BorderSpec::new(0.0, 101.0, 0.0, 0.0).is_err());
        assert!(BorderSpec::new(f32::NAN, 0.0, 0.0, 0.0).is_err());
        assert!(BorderSpec::new(50.0, 0.0, 50.0, 0.0).is_err());
        assert!(BorderSpec::new(0.0, 60.0, 0.0, 40.0).is_err());
        assert!(BorderSpec::new(49.0, 0.0, 50.0, 99.0).is_ok());
    }

    #[test]
    fn test_parse_border_spec() {
        let border: BorderSpec = "5, 10,5,0".parse().unwrap();
        assert_eq!(border, BorderSpec::default());
        assert_eq!(border.to_string().parse::<BorderSpec>().unwrap(), border);

        assert!("5,10,5".parse::<BorderSpec>().is_err());
        assert!("a,b,c,d".parse::<BorderSpec>().is_err());
    }
}
