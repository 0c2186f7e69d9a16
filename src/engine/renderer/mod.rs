// Rendering: paints world state onto a host-supplied drawing surface

mod raster;
mod recording;
mod style;

pub use raster::RasterSurface;
pub use recording::{DrawCommand, RecordingSurface};
pub use style::{Color, Style, StylePatch};

use glam::Vec2;

use crate::engine::world::World;

/// Closed loops filled with the even-odd rule, so nested loops cut holes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    pub subpaths: Vec<Vec<Vec2>>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a closed loop
    pub fn add_loop(&mut self, points: &[Vec2]) {
        self.subpaths.push(points.to_vec());
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.iter().all(Vec::is_empty)
    }
}

/// Drawing capability implemented once per host platform
///
/// Pixel coordinates, origin top-left, y pointing down. Transforms (`translate`,
/// `rotate`) compose with the current transform and are scoped by `save`/`restore`.
pub trait Surface {
    /// Current drawable width; may change between frames
    fn width(&self) -> f32;

    /// Current drawable height; may change between frames
    fn height(&self) -> f32;

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color);

    fn save(&mut self);

    fn restore(&mut self);

    fn translate(&mut self, x: f32, y: f32);

    fn rotate(&mut self, angle: f32);

    /// Fill with the even-odd rule
    fn fill_path(&mut self, path: &Path, color: Color);

    fn stroke_path(&mut self, path: &Path, color: Color, line_width: f32);
}

/// Paint one frame of `world` onto `surface`
///
/// Clears once, draws the four boundary rectangles centred on the surface edges,
/// then every shape in insertion order with the current style.
pub fn render<S: Surface + ?Sized>(world: &World, surface: &mut S) {
    let width = surface.width();
    let height = surface.height();
    let style = world.style();

    surface.clear_rect(0.0, 0.0, width, height);
    draw_frame(surface, width, height, world.config().wall_thickness, style.frame_color);

    if !style.fill && !style.stroke {
        return;
    }

    for shape in world.shapes() {
        let outline = shape.outline();
        let mut path = Path::new();
        path.add_loop(&outline.vertices);
        for hole in &outline.holes {
            path.add_loop(hole);
        }

        let position = shape.position();
        surface.save();
        surface.translate(position.x, position.y);
        surface.rotate(shape.angle());
        if style.fill {
            surface.fill_path(&path, style.fill_color);
        }
        if style.stroke {
            surface.stroke_path(&path, style.stroke_color, style.line_width);
        }
        surface.restore();
    }
}

/// Four wall rectangles, half of each thickness outside the drawable area
fn draw_frame<S: Surface + ?Sized>(surface: &mut S, width: f32, height: f32, depth: f32, color: Color) {
    let half = depth / 2.0;
    surface.fill_rect(0.0, -half, width, depth, color);
    surface.fill_rect(0.0, height - half, width, depth, color);
    surface.fill_rect(-half, 0.0, depth, height, color);
    surface.fill_rect(width - half, 0.0, depth, height, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SandboxConfig;
    use crate::engine::geometry::Outline;

    fn paused_world() -> World {
        World::with_config(200.0, 200.0, SandboxConfig::new().paused())
    }

    fn count(surface: &RecordingSurface, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        surface.commands().iter().filter(|c| pred(c)).count()
    }

    #[test]
    fn test_empty_world_draws_only_frame() {
        let world = paused_world();
        let mut surface = RecordingSurface::new(200.0, 200.0);
        render(&world, &mut surface);

        assert_eq!(surface.commands().len(), 5);
        assert!(matches!(surface.commands()[0], DrawCommand::ClearRect { .. }));
        assert_eq!(count(&surface, |c| matches!(c, DrawCommand::ClearRect { .. })), 1);
        assert_eq!(count(&surface, |c| matches!(c, DrawCommand::FillRect { .. })), 4);
    }

    #[test]
    fn test_frame_straddles_edges() {
        let world = paused_world();
        let mut surface = RecordingSurface::new(300.0, 100.0);
        render(&world, &mut surface);

        let rects: Vec<_> = surface
            .commands()
            .iter()
            .filter_map(|c| match *c {
                DrawCommand::FillRect { x, y, width, height, .. } => Some((x, y, width, height)),
                _ => None,
            })
            .collect();

        assert_eq!(
            rects,
            vec![
                (0.0, -5.0, 300.0, 10.0),
                (0.0, 95.0, 300.0, 10.0),
                (-5.0, 0.0, 10.0, 100.0),
                (295.0, 0.0, 10.0, 100.0),
            ]
        );
    }

    #[test]
    fn test_surface_size_read_each_render() {
        let world = paused_world();
        let mut surface = RecordingSurface::new(200.0, 200.0);
        render(&world, &mut surface);

        surface.resize(400.0, 50.0);
        surface.clear_commands();
        render(&world, &mut surface);

        assert_eq!(
            surface.commands()[0],
            DrawCommand::ClearRect {
                x: 0.0,
                y: 0.0,
                width: 400.0,
                height: 50.0
            }
        );
    }

    #[test]
    fn test_shapes_drawn_in_insertion_order() {
        let mut world = paused_world();
        let first = Outline::rect(Vec2::new(20.0, 20.0), Vec2::new(10.0, 10.0));
        let second = Outline::rect(Vec2::new(100.0, 20.0), Vec2::new(20.0, 20.0))
            .with_hole(vec![Vec2::new(105.0, 25.0), Vec2::new(105.0, 35.0), Vec2::new(115.0, 30.0)]);
        world.import_shapes(&[first, second]);

        let mut surface = RecordingSurface::new(200.0, 200.0);
        render(&world, &mut surface);

        let translations: Vec<_> = surface
            .commands()
            .iter()
            .filter_map(|c| match *c {
                DrawCommand::Translate { x, y } => Some((x, y)),
                _ => None,
            })
            .collect();
        assert_eq!(translations.len(), 2);
        assert!((translations[0].0 - 25.0).abs() < 1e-3);
        assert!((translations[1].0 - 110.0).abs() < 1e-2);

        let fills: Vec<_> = surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillPath { path, .. } => Some(path.subpaths.len()),
                _ => None,
            })
            .collect();
        assert_eq!(fills, vec![1, 2]);

        assert_eq!(count(&surface, |c| matches!(c, DrawCommand::StrokePath { .. })), 2);
        assert_eq!(
            count(&surface, |c| matches!(c, DrawCommand::Save)),
            count(&surface, |c| matches!(c, DrawCommand::Restore))
        );
    }

    #[test]
    fn test_style_changes_apply_to_next_render() {
        let mut world = paused_world();
        world.import_shapes(&[Outline::rect(Vec2::new(20.0, 20.0), Vec2::new(10.0, 10.0))]);
        world.set_style(StylePatch::new().stroke(false).fill_color(Color::WHITE));

        let mut surface = RecordingSurface::new(200.0, 200.0);
        render(&world, &mut surface);

        assert_eq!(count(&surface, |c| matches!(c, DrawCommand::StrokePath { .. })), 0);
        assert_eq!(
            count(&surface, |c| matches!(
                c,
                DrawCommand::FillPath { color, .. } if *color == Color::WHITE
            )),
            1
        );
    }
}
