// The file sink. The output format is picked from the path's extension; a path
// without a recognised extension is written as PNG.

pub mod image_helper {
    use image::{ImageEncoder, ImageFormat, RgbImage};
    use std::path::Path;

    pub fn save(path: &Path, image: &RgbImage) -> Result<(), image::error::ImageError> {
        match ImageFormat::from_path(path) {
            Ok(format) => image.save_with_format(path, format),
            Err(_) => save_png(path, image.width(), image.height(), image.as_raw()),
        }
    }

    /// Encodes a tightly packed RGB8 buffer as PNG, whatever the path says.
    pub fn save_png(
        path: &Path,
        width: u32,
        height: u32,
        buffer: &[u8],
    ) -> Result<(), image::error::ImageError> {
        let output = std::io::BufWriter::new(std::fs::File::create(path)?);
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(buffer, width, height, image::ExtendedColorType::Rgb8)?;

        Ok(())
    }
}
