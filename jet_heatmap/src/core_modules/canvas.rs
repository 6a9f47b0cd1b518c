// THEORY:
// The `Canvas` is the raster the accumulator paints into. Every cell of the grid
// becomes a solid rectangle of one color; nothing is blended or anti-aliased. The
// smoothing pass that turns those hard-edged blocks into a heatmap happens later,
// on a separate destination image.
//
// Key architectural principles:
// 1.  **Dumb container**: The canvas knows how to fill a rectangle and report its
//     size. It has no notion of grids, origins or completion.
// 2.  **Clipping, not panicking**: Step sizes are rounded up, so the last column or
//     row of rectangles can hang over the edge of the canvas. Any part of a rectangle
//     outside the canvas is dropped silently.
// 3.  **Backed by `image`**: The pixels live in an `image::RgbImage`, so the file sink
//     and the smoothing pass work on the buffer without copies.

pub mod canvas {
    use crate::core_modules::color::color::Color;
    use image::{Rgb, RgbImage};

    /// A rectangle in canvas pixel coordinates. `x`/`y` may be negative or past
    /// the canvas edge; painting clips it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CellRect {
        pub x: i64,
        pub y: i64,
        pub width: u32,
        pub height: u32,
    }

    impl CellRect {
        pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
            Self {
                x,
                y,
                width,
                height,
            }
        }

        /// Half-open containment test: `[x, x + width) × [y, y + height)`.
        pub fn contains(&self, px: i64, py: i64) -> bool {
            px >= self.x
                && px < self.x + self.width as i64
                && py >= self.y
                && py < self.y + self.height as i64
        }
    }

    /// An RGB raster of fixed size.
    #[derive(Debug, Clone)]
    pub struct Canvas {
        image: RgbImage,
    }

    impl Canvas {
        /// Allocates a `width × height` canvas filled with `fill`.
        pub fn new(width: u32, height: u32, fill: Color) -> Self {
            Self {
                image: RgbImage::from_pixel(width, height, Rgb(fill.to_bytes())),
            }
        }

        pub fn width(&self) -> u32 {
            self.image.width()
        }

        pub fn height(&self) -> u32 {
            self.image.height()
        }

        /// Fills `rect` with `color`, clipped to the canvas.
        /// Returns the number of pixels actually written.
        pub fn fill_rect(&mut self, rect: CellRect, color: Color) -> u64 {
            let x_start = rect.x.max(0);
            let y_start = rect.y.max(0);
            let x_end = (rect.x + rect.width as i64).min(self.width() as i64);
            let y_end = (rect.y + rect.height as i64).min(self.height() as i64);

            if x_start >= x_end || y_start >= y_end {
                return 0;
            }

            let pixel = Rgb(color.to_bytes());
            for y in y_start..y_end {
                for x in x_start..x_end {
                    self.image.put_pixel(x as u32, y as u32, pixel);
                }
            }

            ((x_end - x_start) * (y_end - y_start)) as u64
        }

        /// The (red, green, blue) bytes at `(x, y)`, or `None` outside the canvas.
        pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
            self.image.get_pixel_checked(x, y).map(|p| p.0)
        }

        pub fn as_image(&self) -> &RgbImage {
            &self.image
        }

        pub fn into_image(self) -> RgbImage {
            self.image
        }
    }
}

#[cfg(test)]
mod tests {
    use super::canvas::*;
    use crate::core_modules::color::color::Color;

    #[test]
    fn new_canvas_is_uniform() {
        let canvas = Canvas::new(4, 3, Color::BLACK);
        assert_eq!((canvas.width(), canvas.height()), (4, 3));
        assert!(canvas.as_image().pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn fill_paints_only_the_rectangle() {
        let mut canvas = Canvas::new(10, 10, Color::BLACK);
        let red = Color::new(1.0, 0.0, 0.0);
        let rect = CellRect::new(2, 3, 4, 5);

        assert_eq!(canvas.fill_rect(rect, red), 20);

        for y in 0..10u32 {
            for x in 0..10u32 {
                let expected = if rect.contains(x as i64, y as i64) {
                    [255, 0, 0]
                } else {
                    [0, 0, 0]
                };
                assert_eq!(canvas.pixel(x, y), Some(expected), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn fill_clips_overhanging_rectangles() {
        let mut canvas = Canvas::new(10, 10, Color::BLACK);
        let white = Color::new(1.0, 1.0, 1.0);

        assert_eq!(canvas.fill_rect(CellRect::new(8, 8, 4, 4), white), 4);
        assert_eq!(canvas.fill_rect(CellRect::new(-2, -2, 3, 3), white), 1);
        assert_eq!(canvas.fill_rect(CellRect::new(20, 0, 3, 3), white), 0);
        assert_eq!(canvas.pixel(9, 9), Some([255, 255, 255]));
        assert_eq!(canvas.pixel(0, 0), Some([255, 255, 255]));
        assert_eq!(canvas.pixel(10, 0), None);
    }
}
