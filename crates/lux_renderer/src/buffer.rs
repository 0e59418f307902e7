//! Floating-point image buffer.

use lux_math::Vec3;

/// Clamp to `[0, 1]` and quantize to 8 bits.
#[inline]
pub fn color_to_rgb8(color: Vec3) -> [u8; 3] {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8]
}

/// RGB buffer, row-major with row 0 at the top of the image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec3>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec3::ZERO; width as usize * height as usize],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Vec3) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// Pixels of row `y`.
    pub fn row(&self, y: u32) -> &[Vec3] {
        let start = self.index(0, y);
        &self.pixels[start..start + self.width as usize]
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }

    /// Convert to an 8-bit image for writing. Values are clipped to `[0, 1]`.
    pub fn to_rgb8(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width, self.height, |x, y| {
            image::Rgb(color_to_rgb8(self.get(x, y)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_buffer_get_set() {
        let mut image = ImageBuffer::new(4, 3);
        assert_eq!(image.pixels.len(), 12);
        assert_eq!(image.get(3, 2), Vec3::ZERO);

        image.set(1, 2, Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(image.get(1, 2), Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(image.pixels[2 * 4 + 1], Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(image.row(2)[1], Vec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_color_to_rgb8_clips() {
        assert_eq!(color_to_rgb8(Vec3::new(-1.0, 0.5, 7.0)), [0, 128, 255]);
        assert_eq!(color_to_rgb8(Vec3::ONE), [255, 255, 255]);
    }

    #[test]
    fn test_to_rgb8_keeps_orientation() {
        let mut image = ImageBuffer::new(2, 2);
        image.set(0, 0, Vec3::X);
        image.set(1, 1, Vec3::Z);

        let rgb = image.to_rgb8();
        assert_eq!(rgb.dimensions(), (2, 2));
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(rgb.get_pixel(1, 1).0, [0, 0, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_empty_image() {
        let image = ImageBuffer::new(0, 5);
        assert!(image.is_empty());
        assert_eq!(image.to_rgb8().dimensions(), (0, 5));
    }
}
