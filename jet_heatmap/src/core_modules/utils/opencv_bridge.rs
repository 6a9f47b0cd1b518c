// Moves images between `image::RgbImage` and OpenCV `Mat`s. Only compiled with the
// `opencv` feature. Pixel bytes are copied as-is; a `Mat` built here holds RGB, not
// OpenCV's usual BGR, so anything shown on screen goes through `rgb_to_bgr` first.
//
// Canvas sizes are capped by `GridLayout`, so dimensions always fit OpenCV's `i32`.

use image::RgbImage;
use opencv::{
    core::{self, Mat, Scalar},
    imgproc,
    prelude::*,
};

pub fn rgb_to_mat(image: &RgbImage) -> opencv::Result<Mat> {
    let mut mat = Mat::new_size_with_default(
        core::Size::new(image.width() as i32, image.height() as i32),
        core::CV_8UC3,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(image.as_raw());
    Ok(mat)
}

pub fn mat_to_rgb(mat: &Mat) -> opencv::Result<RgbImage> {
    let size = mat.size()?;
    let bytes: Vec<u8> = mat.data_bytes()?.to_vec();
    RgbImage::from_raw(size.width as u32, size.height as u32, bytes).ok_or_else(|| {
        opencv::Error::new(core::StsUnmatchedSizes, "Mat is not a packed 8-bit RGB image")
    })
}

pub fn rgb_to_bgr(rgb: &Mat) -> opencv::Result<Mat> {
    let mut bgr = Mat::default();
    imgproc::cvt_color(rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)?;
    Ok(bgr)
}

/// `cv::GaussianBlur` with the default (reflect-101) border.
pub fn blur_rgb(
    src: &RgbImage,
    kernel_width: u32,
    kernel_height: u32,
    sigma_x: f64,
    sigma_y: f64,
) -> opencv::Result<RgbImage> {
    let input = rgb_to_mat(src)?;
    let mut output = Mat::default();
    imgproc::gaussian_blur(
        &input,
        &mut output,
        core::Size::new(kernel_width as i32, kernel_height as i32),
        sigma_x,
        sigma_y,
        core::BORDER_DEFAULT,
    )?;
    mat_to_rgb(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn mats_round_trip_pixels() {
        let mut image = RgbImage::new(5, 3);
        image.put_pixel(4, 2, Rgb([1, 2, 3]));
        let mat = rgb_to_mat(&image).unwrap();
        assert_eq!(mat_to_rgb(&mat).unwrap(), image);
    }

    #[test]
    fn bgr_swaps_the_outer_channels() {
        let image = RgbImage::from_pixel(2, 2, Rgb([10, 20, 30]));
        let bgr = rgb_to_bgr(&rgb_to_mat(&image).unwrap()).unwrap();
        assert_eq!(&bgr.data_bytes().unwrap()[..3], &[30, 20, 10]);
    }
}
