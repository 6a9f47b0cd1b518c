// THEORY:
// A finished heatmap leaves the library through two sinks: a display and a file.
// The file sink is fixed (`utils::image_helper::save`); the display is a trait so
// each host decides what "show" means. With the `opencv` feature a host can open a
// `highgui` window; otherwise the tester binary draws a coarse preview in the
// terminal, and a headless host does nothing.
//
// Display is best-effort. A failing display is logged by the session and never
// changes the outcome of the cell that completed the heatmap.

use crate::error::Result;
use image::RgbImage;

/// Window title used when a finished heatmap is shown.
pub const OUTPUT_WINDOW_TITLE: &str = "Output";

/// Receives every finished heatmap.
pub trait DisplaySink: Send {
    fn show(&mut self, title: &str, image: &RgbImage) -> Result<()>;
}

/// Headless display: discards the image.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn show(&mut self, _title: &str, _image: &RgbImage) -> Result<()> {
        Ok(())
    }
}

/// Logs a one-line summary of each heatmap at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDisplay;

impl DisplaySink for TracingDisplay {
    fn show(&mut self, title: &str, image: &RgbImage) -> Result<()> {
        let [red, green, blue] = mean_color(image);
        tracing::info!(
            title,
            width = image.width(),
            height = image.height(),
            mean_red = red,
            mean_green = green,
            mean_blue = blue,
            "heatmap ready"
        );
        Ok(())
    }
}

/// Shows each heatmap in an OpenCV `highgui` window.
///
/// `wait_ms` is passed to `waitKey` after every `imshow`: a small value lets the
/// window repaint and returns, 0 blocks until a key is pressed.
#[cfg(feature = "opencv")]
#[derive(Debug, Clone, Copy)]
pub struct HighGuiDisplay {
    pub wait_ms: i32,
}

#[cfg(feature = "opencv")]
impl HighGuiDisplay {
    pub fn new(wait_ms: i32) -> Self {
        Self { wait_ms }
    }
}

#[cfg(feature = "opencv")]
impl DisplaySink for HighGuiDisplay {
    fn show(&mut self, title: &str, image: &RgbImage) -> Result<()> {
        use crate::core_modules::utils::opencv_bridge::{rgb_to_bgr, rgb_to_mat};
        use opencv::highgui;

        let frame = rgb_to_bgr(&rgb_to_mat(image)?)?;
        highgui::imshow(title, &frame)?;
        highgui::wait_key(self.wait_ms)?;
        Ok(())
    }
}

/// Average (red, green, blue) of an image; black for an empty image.
pub fn mean_color(image: &RgbImage) -> [u8; 3] {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return [0, 0, 0];
    }

    let mut sums = [0u64; 3];
    for pixel in image.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += channel as u64;
        }
    }
    sums.map(|sum| (sum / count) as u8)
}

impl<T: DisplaySink + ?Sized> DisplaySink for Box<T> {
    fn show(&mut self, title: &str, image: &RgbImage) -> Result<()> {
        (**self).show(title, image)
    }
}
