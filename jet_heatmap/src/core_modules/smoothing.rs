// THEORY:
// The smoothing pass turns the hard-edged block mosaic painted by the accumulator
// into a continuous-looking heatmap. It is a separable Gaussian blur: one 1D kernel
// runs along rows, a second along columns, which costs `kx + ky` taps per pixel
// instead of `kx * ky`.
//
// Parameter rules follow the widely used imaging convention callers already tune
// against:
// 1.  Kernel sizes must be odd. A size of 0 means "derive it from sigma" as
//     `round(sigma * 6 + 1) | 1`.
// 2.  A non-positive sigma means "derive it from the kernel size" as
//     `0.3 * ((size - 1) * 0.5 - 1) + 0.8`; small kernels (1, 3, 5, 7) then use
//     fixed binomial-like tables.
// 3.  A vertical sigma of 0 reuses the horizontal sigma.
// 4.  Borders reflect without repeating the edge pixel (`dcb|abcd|cba`).
//
// With the `opencv` feature the blur itself is `cv::GaussianBlur`, which applies the
// same rules. The separable loops below run when the feature is off, or when OpenCV
// reports an error.
//
// The destination is always a freshly allocated image of the source's size; the
// source canvas is left untouched.

use crate::error::{HeatmapError, Result};
use image::{Rgb, RgbImage};

const CHANNELS: usize = 3;

/// Largest kernel size accepted along either axis.
pub const MAX_KERNEL_SIZE: u32 = 1023;

/// Taps for the small kernels used when sigma is derived from the size.
const SMALL_KERNELS: [&[f64]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[
        0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
    ],
];

/// Raw blur parameters as supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurParams {
    pub kernel_x: u32,
    pub kernel_y: u32,
    pub sigma_x: f64,
    pub sigma_y: f64,
}

impl BlurParams {
    /// Applies the derivation rules and builds both 1D kernels.
    pub fn resolve(&self) -> Result<GaussianBlur> {
        let invalid = |reason: &'static str| HeatmapError::InvalidKernel {
            width: self.kernel_x,
            height: self.kernel_y,
            sigma_x: self.sigma_x,
            sigma_y: self.sigma_y,
            reason,
        };

        if !self.sigma_x.is_finite() || !self.sigma_y.is_finite() {
            return Err(invalid("sigma must be finite"));
        }

        let sigma_x = self.sigma_x;
        let sigma_y = if self.sigma_y <= 0.0 { sigma_x } else { self.sigma_y };

        let size_x = derive_size(self.kernel_x, sigma_x);
        let size_y = derive_size(self.kernel_y, sigma_y);

        if size_x == 0 || size_y == 0 {
            return Err(invalid("kernel size and sigma cannot both be zero"));
        }
        if size_x % 2 == 0 || size_y % 2 == 0 {
            return Err(invalid("kernel sizes must be odd"));
        }
        if size_x > MAX_KERNEL_SIZE || size_y > MAX_KERNEL_SIZE {
            return Err(invalid("kernel sizes must not exceed 1023"));
        }

        Ok(GaussianBlur {
            horizontal: gaussian_kernel(size_x as usize, sigma_x.max(0.0)),
            vertical: gaussian_kernel(size_y as usize, sigma_y.max(0.0)),
            sigma_x: self.sigma_x,
            sigma_y: self.sigma_y,
        })
    }
}

fn derive_size(size: u32, sigma: f64) -> u32 {
    if size == 0 && sigma > 0.0 {
        // `as` saturates, so a huge sigma lands above the size cap.
        ((sigma * 6.0 + 1.0).round() as u32) | 1
    } else {
        size
    }
}

/// Normalized 1D Gaussian of `size` taps. `sigma <= 0` derives sigma from size.
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 && size % 2 == 1 && size <= 7 {
        return SMALL_KERNELS[size / 2].to_vec();
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        ((size as f64 - 1.0) * 0.5 - 1.0) * 0.3 + 0.8
    };
    let scale = -0.5 / (sigma * sigma);
    let center = (size as f64 - 1.0) * 0.5;

    let mut weights: Vec<f64> = (0..size)
        .map(|i| {
            let x = i as f64 - center;
            (scale * x * x).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    for weight in &mut weights {
        *weight /= sum;
    }
    weights
}

/// Reflect-101 border handling: maps any index onto `0..len`.
fn reflect_101(index: i64, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as i64 - 1);
    let mut i = index.rem_euclid(period);
    if i >= len as i64 {
        i = period - i;
    }
    i as usize
}

/// A resolved separable Gaussian blur.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianBlur {
    horizontal: Vec<f64>,
    vertical: Vec<f64>,
    // As supplied, for backends that derive them themselves.
    #[cfg_attr(not(feature = "opencv"), allow(dead_code))]
    sigma_x: f64,
    #[cfg_attr(not(feature = "opencv"), allow(dead_code))]
    sigma_y: f64,
}

impl GaussianBlur {
    pub fn kernel_width(&self) -> usize {
        self.horizontal.len()
    }

    pub fn kernel_height(&self) -> usize {
        self.vertical.len()
    }

    /// Blurs `src` into a new image of the same size.
    pub fn apply(&self, src: &RgbImage) -> RgbImage {
        #[cfg(feature = "opencv")]
        {
            use crate::core_modules::utils::opencv_bridge;

            match opencv_bridge::blur_rgb(
                src,
                self.kernel_width() as u32,
                self.kernel_height() as u32,
                self.sigma_x,
                self.sigma_y,
            ) {
                Ok(dst) => return dst,
                Err(err) => tracing::warn!("OpenCV blur failed, using the separable blur: {err}"),
            }
        }

        self.apply_separable(src)
    }

    /// The built-in blur: one horizontal and one vertical pass in `f64`.
    pub fn apply_separable(&self, src: &RgbImage) -> RgbImage {
        let (width, height) = (src.width() as usize, src.height() as usize);
        let mut dst = RgbImage::new(src.width(), src.height());
        if width == 0 || height == 0 {
            return dst;
        }

        let radius_x = (self.horizontal.len() / 2) as i64;
        let radius_y = (self.vertical.len() / 2) as i64;
        let raw = src.as_raw();

        // --- Horizontal pass into a floating-point buffer ---
        let mut rows = vec![0.0f64; width * height * CHANNELS];
        for y in 0..height {
            let row_start = y * width;
            for x in 0..width {
                let mut acc = [0.0f64; CHANNELS];
                for (tap, weight) in self.horizontal.iter().enumerate() {
                    let sx = reflect_101(x as i64 + tap as i64 - radius_x, width);
                    let offset = (row_start + sx) * CHANNELS;
                    for c in 0..CHANNELS {
                        acc[c] += weight * raw[offset + c] as f64;
                    }
                }
                rows[(row_start + x) * CHANNELS..][..CHANNELS].copy_from_slice(&acc);
            }
        }

        // --- Vertical pass, rounded back to bytes ---
        for y in 0..height {
            for x in 0..width {
                let mut acc = [0.0f64; CHANNELS];
                for (tap, weight) in self.vertical.iter().enumerate() {
                    let sy = reflect_101(y as i64 + tap as i64 - radius_y, height);
                    let offset = (sy * width + x) * CHANNELS;
                    for c in 0..CHANNELS {
                        acc[c] += weight * rows[offset + c];
                    }
                }
                let pixel = acc.map(|v| v.round().clamp(0.0, 255.0) as u8);
                dst.put_pixel(x as u32, y as u32, Rgb(pixel));
            }
        }

        dst
    }
}

/// One-shot blur of `src` with the given kernel sizes and sigmas.
pub fn gaussian_blur(
    src: &RgbImage,
    kernel_width: u32,
    kernel_height: u32,
    sigma_x: f64,
    sigma_y: f64,
) -> Result<RgbImage> {
    let blur = BlurParams {
        kernel_x: kernel_width,
        kernel_y: kernel_height,
        sigma_x,
        sigma_y,
    }
    .resolve()?;
    Ok(blur.apply(src))
}
