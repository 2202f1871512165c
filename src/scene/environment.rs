//! Environment cube map
//!
//! The six faces are drawn as the sky behind everything else. Lit materials
//! also take ambient light from them through an ambient cube: the mean
//! linear color of each face, blended by the squared surface normal.

use image::RgbaImage;

use crate::color::Rgb;

#[derive(Debug, Clone)]
pub struct Environment {
    /// +X, -X, +Y, -Y, +Z, -Z
    pub faces: [RgbaImage; 6],
    /// Scale applied to the ambient cube
    pub intensity: f32,
}

impl Environment {
    pub fn new(faces: [RgbaImage; 6], intensity: f32) -> Self {
        Self { faces, intensity }
    }

    /// Edge length shared by every face, or `None` if the faces cannot form a cube
    pub fn face_size(&self) -> Option<u32> {
        let size = self.faces[0].width();
        let square = self.faces.iter().all(|f| f.dimensions() == (size, size));
        (square && size > 0).then_some(size)
    }

    /// Mean linear color of each face times `intensity`, in face order
    pub fn ambient_cube(&self) -> [[f32; 3]; 6] {
        let mut cube = [[0.0; 3]; 6];
        for (out, face) in cube.iter_mut().zip(&self.faces) {
            let [r, g, b] = mean_linear(face);
            *out = [r * self.intensity, g * self.intensity, b * self.intensity];
        }
        cube
    }
}

fn mean_linear(image: &RgbaImage) -> [f32; 3] {
    let count = image.width() as usize * image.height() as usize;
    if count == 0 {
        return [0.0; 3];
    }
    let sum = image.pixels().fold([0.0f32; 3], |acc, p| {
        let [r, g, b] = Rgb::new(p[0], p[1], p[2]).to_linear();
        [acc[0] + r, acc[1] + g, acc[2] + b]
    });
    sum.map(|c| c / count as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(size: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    #[test]
    fn test_ambient_cube_is_face_mean() {
        let mut faces: [RgbaImage; 6] = std::array::from_fn(|_| solid(4, [0, 0, 0]));
        faces[2] = solid(4, [255, 255, 255]);
        // Half white, half black averages in linear light
        faces[0] = RgbaImage::from_fn(4, 4, |x, _| {
            if x < 2 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });

        let cube = Environment::new(faces, 0.5).ambient_cube();
        assert!(cube[2].iter().all(|c| (c - 0.5).abs() < 1e-6));
        assert!(cube[0].iter().all(|c| (c - 0.25).abs() < 1e-6));
        assert_eq!(cube[3], [0.0; 3]);
    }

    #[test]
    fn test_face_size_requires_matching_squares() {
        let faces: [RgbaImage; 6] = std::array::from_fn(|_| solid(8, [1, 2, 3]));
        let mut env = Environment::new(faces, 1.0);
        assert_eq!(env.face_size(), Some(8));

        env.faces[5] = RgbaImage::new(8, 4);
        assert_eq!(env.face_size(), None);
    }
}
