// Colors and fill/stroke style

/// 8-bit RGBA color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Raw bytes in RGBA order
    pub fn to_bytes(self) -> [u8; 4] {
        bytemuck::cast(self)
    }
}

/// How shapes and the boundary frame are painted
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub fill: bool,
    pub fill_color: Color,
    pub stroke: bool,
    pub stroke_color: Color,
    pub line_width: f32,
    pub frame_color: Color,
}

impl Style {
    /// Shallow-merge a patch: every field the patch sets replaces ours
    pub fn merge(&mut self, patch: &StylePatch) {
        if let Some(fill) = patch.fill {
            self.fill = fill;
        }
        if let Some(color) = patch.fill_color {
            self.fill_color = color;
        }
        if let Some(stroke) = patch.stroke {
            self.stroke = stroke;
        }
        if let Some(color) = patch.stroke_color {
            self.stroke_color = color;
        }
        if let Some(width) = patch.line_width {
            self.line_width = width;
        }
        if let Some(color) = patch.frame_color {
            self.frame_color = color;
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: true,
            fill_color: Color::GRAY,
            stroke: true,
            stroke_color: Color::YELLOW,
            line_width: 1.0,
            frame_color: Color::GRAY,
        }
    }
}

/// Partial style; unset fields leave the current style alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StylePatch {
    pub fill: Option<bool>,
    pub fill_color: Option<Color>,
    pub stroke: Option<bool>,
    pub stroke_color: Option<Color>,
    pub line_width: Option<f32>,
    pub frame_color: Option<Color>,
}

impl StylePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(mut self, fill: bool) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill_color = Some(color);
        self
    }

    pub fn stroke(mut self, stroke: bool) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn stroke_color(mut self, color: Color) -> Self {
        self.stroke_color = Some(color);
        self
    }

    pub fn line_width(mut self, width: f32) -> Self {
        self.line_width = Some(width);
        self
    }

    pub fn frame_color(mut self, color: Color) -> Self {
        self.frame_color = Some(color);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_bytes() {
        assert_eq!(Color::rgba(1, 2, 3, 4).to_bytes(), [1, 2, 3, 4]);
        assert_eq!(Color::YELLOW.to_bytes(), [255, 255, 0, 255]);
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut style = Style::default();
        style.merge(&StylePatch::new().stroke(false).fill_color(Color::WHITE));

        assert!(!style.stroke);
        assert_eq!(style.fill_color, Color::WHITE);
        // Untouched fields keep their values
        assert!(style.fill);
        assert_eq!(style.stroke_color, Color::YELLOW);
        assert_eq!(style.frame_color, Color::GRAY);
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let mut style = Style::default();
        style.merge(&StylePatch::default());
        assert_eq!(style, Style::default());
    }
}
