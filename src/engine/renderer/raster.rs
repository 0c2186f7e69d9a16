// Software surface backed by an RGBA image

use glam::{Affine2, Vec2};
use image::{ImageResult, Rgba, RgbaImage};

use super::{Color, Path, Surface};

/// Spacing between stroke stamps along a segment, in pixels
const STROKE_STEP: f32 = 0.5;

/// CPU canvas with a transform stack, even-odd fills and stamped strokes
///
/// Lets native hosts and tools get frames out of the sandbox without a GPU or
/// windowing stack.
pub struct RasterSurface {
    image: RgbaImage,
    background: Color,
    transform: Affine2,
    stack: Vec<Affine2>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            background: Color::TRANSPARENT,
            transform: Affine2::IDENTITY,
            stack: Vec::new(),
        }
    }

    /// Color written by `clear_rect`
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Replace the backing image; the next render sees the new size
    pub fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Color at a device pixel, `None` outside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.image.width() || y >= self.image.height() {
            return None;
        }
        let Rgba([r, g, b, a]) = *self.image.get_pixel(x, y);
        Some(Color::rgba(r, g, b, a))
    }

    /// Write the current frame as a PNG
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> ImageResult<()> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
    }

    fn to_device(&self, loops: &[Vec<Vec2>]) -> Vec<Vec<Vec2>> {
        loops
            .iter()
            .map(|points| {
                points
                    .iter()
                    .map(|&p| self.transform.transform_point2(p))
                    .collect()
            })
            .collect()
    }

    fn rect_loop(x: f32, y: f32, width: f32, height: f32) -> Vec<Vec<Vec2>> {
        vec![vec![
            Vec2::new(x, y),
            Vec2::new(x + width, y),
            Vec2::new(x + width, y + height),
            Vec2::new(x, y + height),
        ]]
    }

    /// Even-odd scanline fill of device-space loops, sampling pixel centres
    fn fill_device(&mut self, loops: &[Vec<Vec2>], color: Color, replace: bool) {
        let (width, height) = self.image.dimensions();

        let edges: Vec<(Vec2, Vec2)> = loops
            .iter()
            .filter(|points| points.len() >= 2)
            .flat_map(|points| {
                let n = points.len();
                (0..n).map(move |i| (points[i], points[(i + 1) % n]))
            })
            .collect();
        if edges.is_empty() {
            return;
        }

        let (min_y, max_y) = edges.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), (a, b)| {
            (lo.min(a.y).min(b.y), hi.max(a.y).max(b.y))
        });
        let first_row = min_y.floor().clamp(0.0, height as f32) as u32;
        let last_row = max_y.ceil().clamp(0.0, height as f32) as u32;

        let mut crossings: Vec<f32> = Vec::new();
        for row in first_row..last_row {
            let sample_y = row as f32 + 0.5;
            crossings.clear();
            for (a, b) in &edges {
                if (a.y <= sample_y) != (b.y <= sample_y) {
                    let t = (sample_y - a.y) / (b.y - a.y);
                    crossings.push(a.x + t * (b.x - a.x));
                }
            }
            crossings.sort_by(f32::total_cmp);

            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil().clamp(0.0, width as f32) as u32;
                let end = (span[1] - 0.5).ceil().clamp(0.0, width as f32) as u32;
                for column in start..end {
                    self.put(column, row, color, replace);
                }
            }
        }
    }

    fn put(&mut self, x: u32, y: u32, color: Color, replace: bool) {
        let pixel = self.image.get_pixel_mut(x, y);
        if replace || color.a == 255 {
            *pixel = Rgba(color.to_bytes());
            return;
        }
        if color.a == 0 {
            return;
        }

        // Source-over with straight alpha
        let src_a = color.a as f32 / 255.0;
        let dst_a = pixel.0[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        let src = [color.r, color.g, color.b];
        for (channel, &s) in pixel.0.iter_mut().take(3).zip(&src) {
            let blended = (s as f32 * src_a + *channel as f32 * dst_a * (1.0 - src_a)) / out_a;
            *channel = blended.round().clamp(0.0, 255.0) as u8;
        }
        pixel.0[3] = (out_a * 255.0).round() as u8;
    }

    fn stamp(&mut self, center: Vec2, radius: f32, color: Color) {
        let (width, height) = self.image.dimensions();
        let x0 = (center.x - radius).floor().clamp(0.0, width as f32) as u32;
        let x1 = (center.x + radius).ceil().clamp(0.0, width as f32) as u32;
        let y0 = (center.y - radius).floor().clamp(0.0, height as f32) as u32;
        let y1 = (center.y + radius).ceil().clamp(0.0, height as f32) as u32;
        for y in y0..y1 {
            for x in x0..x1 {
                self.put(x, y, color, false);
            }
        }
    }
}

impl Surface for RasterSurface {
    fn width(&self) -> f32 {
        self.image.width() as f32
    }

    fn height(&self) -> f32 {
        self.image.height() as f32
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let loops = self.to_device(&Self::rect_loop(x, y, width, height));
        let background = self.background;
        self.fill_device(&loops, background, true);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let loops = self.to_device(&Self::rect_loop(x, y, width, height));
        self.fill_device(&loops, color, false);
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(transform) = self.stack.pop() {
            self.transform = transform;
        }
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.transform = self.transform * Affine2::from_translation(Vec2::new(x, y));
    }

    fn rotate(&mut self, angle: f32) {
        self.transform = self.transform * Affine2::from_angle(angle);
    }

    fn fill_path(&mut self, path: &Path, color: Color) {
        let loops = self.to_device(&path.subpaths);
        self.fill_device(&loops, color, false);
    }

    fn stroke_path(&mut self, path: &Path, color: Color, line_width: f32) {
        let radius = (line_width * 0.5).max(0.5);
        for points in self.to_device(&path.subpaths) {
            let n = points.len();
            for i in 0..n {
                let (a, b) = (points[i], points[(i + 1) % n]);
                let steps = ((b - a).length() / STROKE_STEP).ceil().max(1.0) as u32;
                for s in 0..=steps {
                    self.stamp(a.lerp(b, s as f32 / steps as f32), radius, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SandboxConfig;
    use crate::engine::geometry::Outline;
    use crate::engine::renderer::{render, StylePatch};
    use crate::engine::world::World;

    const RED: Color = Color::rgb(255, 0, 0);

    fn square_path(origin: Vec2, size: f32) -> Vec<Vec2> {
        vec![
            origin,
            origin + Vec2::new(size, 0.0),
            origin + Vec2::new(size, size),
            origin + Vec2::new(0.0, size),
        ]
    }

    #[test]
    fn test_fill_rect_covers_pixels() {
        let mut surface = RasterSurface::new(20, 20);
        surface.fill_rect(5.0, 5.0, 10.0, 10.0, RED);

        assert_eq!(surface.pixel(5, 5), Some(RED));
        assert_eq!(surface.pixel(14, 14), Some(RED));
        assert_eq!(surface.pixel(4, 5), Some(Color::TRANSPARENT));
        assert_eq!(surface.pixel(15, 15), Some(Color::TRANSPARENT));
        assert_eq!(surface.pixel(20, 0), None);
    }

    #[test]
    fn test_even_odd_hole() {
        let mut surface = RasterSurface::new(40, 40);
        let mut path = Path::new();
        path.add_loop(&square_path(Vec2::new(0.0, 0.0), 30.0));
        path.add_loop(&square_path(Vec2::new(10.0, 10.0), 10.0));
        surface.fill_path(&path, RED);

        assert_eq!(surface.pixel(5, 5), Some(RED));
        assert_eq!(surface.pixel(15, 15), Some(Color::TRANSPARENT));
        assert_eq!(surface.pixel(25, 25), Some(RED));
    }

    #[test]
    fn test_transform_stack() {
        let mut surface = RasterSurface::new(40, 40);
        surface.save();
        surface.translate(20.0, 20.0);
        surface.rotate(std::f32::consts::FRAC_PI_2);
        // Unit square along +x lands along +y after a quarter turn
        surface.fill_rect(0.0, -1.0, 10.0, 2.0, RED);
        surface.restore();

        assert_eq!(surface.pixel(20, 25), Some(RED));
        assert_eq!(surface.pixel(25, 20), Some(Color::TRANSPARENT));

        // Restored transform is the identity again
        surface.fill_rect(0.0, 0.0, 2.0, 2.0, Color::WHITE);
        assert_eq!(surface.pixel(0, 0), Some(Color::WHITE));
    }

    #[test]
    fn test_clear_rect_replaces() {
        let mut surface = RasterSurface::new(10, 10).with_background(Color::WHITE);
        surface.fill_rect(0.0, 0.0, 10.0, 10.0, RED);
        surface.clear_rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(surface.pixel(3, 3), Some(Color::WHITE));
    }

    #[test]
    fn test_stroke_outline() {
        let mut surface = RasterSurface::new(40, 40);
        let mut path = Path::new();
        path.add_loop(&square_path(Vec2::new(10.0, 10.0), 20.0));
        surface.stroke_path(&path, RED, 2.0);

        assert_eq!(surface.pixel(20, 10), Some(RED));
        assert_eq!(surface.pixel(20, 20), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_translucent_blend() {
        let mut surface = RasterSurface::new(4, 4).with_background(Color::WHITE);
        surface.clear_rect(0.0, 0.0, 4.0, 4.0);
        surface.fill_rect(0.0, 0.0, 4.0, 4.0, Color::rgba(0, 0, 0, 128));

        let pixel = surface.pixel(1, 1).unwrap();
        assert_eq!(pixel.a, 255);
        assert!(pixel.r > 120 && pixel.r < 135);
    }

    #[test]
    fn test_render_world_to_pixels() {
        let mut world = World::with_config(100.0, 100.0, SandboxConfig::new().paused());
        world.import_shapes(&[Outline::rect(Vec2::new(40.0, 40.0), Vec2::new(20.0, 20.0))]);
        world.set_style(StylePatch::new().stroke(false).fill_color(RED));

        let mut surface = RasterSurface::new(100, 100).with_background(Color::WHITE);
        render(&world, &mut surface);

        // Frame band along the top edge
        assert_eq!(surface.pixel(50, 2), Some(Color::GRAY));
        assert_eq!(surface.pixel(50, 20), Some(Color::WHITE));
        assert_eq!(surface.pixel(50, 50), Some(RED));
    }
}
