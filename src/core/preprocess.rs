use super::mask::{BorderSpec, mask_borders_mut};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::separable_filter_equal;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PreprocessError {
    #[error("Blur kernel size must be odd and positive, got {0}")]
    InvalidBlurKernel(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessSettings {
    /// Square Gaussian kernel sizes, applied in order. Empty means no blur.
    pub blur_kernels: Vec<u32>,
    pub border: BorderSpec,
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        Self {
            blur_kernels: Vec::new(),
            border: BorderSpec::default(),
        }
    }
}

impl PreprocessSettings {
    pub fn validate(&self) -> Result<(), PreprocessError> {
        match self.blur_kernels.iter().find(|&&k| k == 0 || k % 2 == 0) {
            Some(&k) => Err(PreprocessError::InvalidBlurKernel(k)),
            None => Ok(()),
        }
    }
}

/// Grayscale, blurred and masked image; the unit two pictures are compared by.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame(GrayImage);

impl Frame {
    pub fn from_gray(image: GrayImage) -> Self {
        Self(image)
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

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_image(self) -> GrayImage {
        self.0
    }
}

/// Sigma a Gaussian of the given kernel size gets when none is specified.
pub fn gaussian_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalised 1-D Gaussian with exactly `size` taps, centred on `size / 2`.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = gaussian_sigma(size);
    let center = (size / 2) as f32;
    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - center;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

pub fn preprocess(
    image: &DynamicImage,
    settings: &PreprocessSettings,
) -> Result<Frame, PreprocessError> {
    settings.validate()?;

    let mut gray = image.to_luma8();
    for &kernel in &settings.blur_kernels {
        // k x k Gaussian as two k-tap passes
        gray = separable_filter_equal(&gray, &gaussian_kernel(kernel));
    }
    mask_borders_mut(&mut gray, settings.border, Luma([0]));

    Ok(Frame(gray))
}
