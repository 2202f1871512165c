//! Horizontal color ramp used as the arc tube's surface map

use image::{Rgba, RgbaImage};

use crate::color::Rgb;

/// Rows in the ramp; every row is identical
const GRADIENT_ROWS: u32 = 2;

/// Immutable start-to-end color ramp
#[derive(Debug, Clone)]
pub struct GradientTexture {
    image: RgbaImage,
    start: Rgb,
    end: Rgb,
}

impl GradientTexture {
    /// Build a `width` x 2 ramp from `start` (left) to `end` (right)
    ///
    /// Colors are interpolated linearly in sRGB byte space. `width` must be
    /// at least 2 so both endpoints appear as texels.
    pub fn new(start: Rgb, end: Rgb, width: u32) -> Self {
        let width = width.max(2);
        let last = (width - 1) as f32;
        let image = RgbaImage::from_fn(width, GRADIENT_ROWS, |x, _| {
            Rgba(start.lerp(end, x as f32 / last).to_rgba8())
        });
        Self { image, start, end }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn start(&self) -> Rgb {
        self.start
    }

    pub fn end(&self) -> Rgb {
        self.end
    }

    /// Color of the texel column at `x`
    pub fn color_at(&self, x: u32) -> Rgb {
        let Rgba([r, g, b, _]) = *self.image.get_pixel(x.min(self.width() - 1), 0);
        Rgb::new(r, g, b)
    }
}
