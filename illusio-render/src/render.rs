use crate::text::render_text_pixmap;
use ab_glyph::FontVec;
use anyhow::{anyhow, Result};
use illusio_core::Stimulus;
use std::collections::HashMap;
use tiny_skia::{
    Color, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

/// Geometry of the stimulus screens, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Vertical distance of each figure from the screen centre.
    pub row_offset: f32,
    pub wing_length: f32,
    pub shaft_width: f32,
    pub wing_width: f32,
    pub bar_width: f32,
    pub frame_width: f32,
    /// Horizontal half-spread of the Ponzo frame at the bottom and the top.
    pub frame_spread: (f32, f32),
    /// y coordinate where the Ponzo frame lines end.
    pub frame_top: f32,
    pub fixation_size: f32,
    pub line_spacing: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            row_offset: 80.0,
            wing_length: 40.0,
            shaft_width: 3.0,
            wing_width: 2.0,
            bar_width: 4.0,
            frame_width: 3.0,
            frame_spread: (250.0, 40.0),
            frame_top: 150.0,
            fixation_size: 40.0,
            line_spacing: 1.4,
        }
    }
}

const BACKGROUND: Color = Color::BLACK;
const FOREGROUND: [u8; 3] = [255, 255, 255];
const REFERENCE: [u8; 3] = [120, 120, 120];
const FRAME: [u8; 3] = [200, 200, 200];

/// Draws every screen of an illusion session onto an offscreen canvas.
pub struct SkiaRenderer {
    height: u32,
    center: (f32, f32),
    layout: Layout,
    font: Option<FontVec>,
    canvas: Pixmap,
    // (line, size bits) -> rasterised text
    text_cache: HashMap<(String, u32), Pixmap>,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, font: Option<FontVec>) -> Result<Self> {
        let canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("cannot allocate {width}x{height} canvas"))?;
        if font.is_none() {
            tracing::warn!("no font available, text screens will be blank");
        }
        Ok(Self {
            height,
            center: (width as f32 / 2.0, height as f32 / 2.0),
            layout: Layout::default(),
            font,
            canvas,
            text_cache: HashMap::new(),
        })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    /// Clears the canvas and draws one full screen.
    pub fn render(&mut self, stimulus: &Stimulus) -> Result<&Pixmap> {
        self.canvas.fill(BACKGROUND);
        match stimulus {
            Stimulus::Fixation => self.draw_fixation()?,
            Stimulus::Text { content, size } => self.draw_text(content, *size),
            Stimulus::MullerLyer {
                angle_deg,
                reference_length,
                test_length,
            } => {
                let (cx, cy) = self.center;
                let offset = self.layout.row_offset;
                self.draw_winged_line(*reference_length, cx, cy - offset, *angle_deg, REFERENCE)?;
                self.draw_winged_line(*test_length, cx, cy + offset, *angle_deg, FOREGROUND)?;
            }
            Stimulus::Ponzo {
                top_length,
                bottom_length,
            } => {
                let (cx, cy) = self.center;
                let offset = self.layout.row_offset;
                self.draw_ponzo_frame()?;
                self.draw_bar(*top_length, cx, cy - offset)?;
                self.draw_bar(*bottom_length, cx, cy + offset)?;
            }
        }
        Ok(&self.canvas)
    }

    /// Copies the canvas into an RGBA frame buffer of the same size.
    pub fn present(&self, frame_buffer: &mut [u8]) -> Result<()> {
        let data = self.canvas.data();
        if frame_buffer.len() != data.len() {
            return Err(anyhow!(
                "frame buffer is {} bytes, canvas is {}",
                frame_buffer.len(),
                data.len()
            ));
        }
        frame_buffer.copy_from_slice(data);
        Ok(())
    }

    fn draw_fixation(&mut self) -> Result<()> {
        let (cx, cy) = self.center;
        let size = self.layout.fixation_size;
        let mut paint = Paint::default();
        paint.anti_alias = false;
        paint.set_color(Color::WHITE);

        let h = Rect::from_xywh(cx - size * 0.5, cy - 1.0, size, 2.0)
            .ok_or_else(|| anyhow!("fixation rect"))?;
        let v = Rect::from_xywh(cx - 1.0, cy - size * 0.5, 2.0, size)
            .ok_or_else(|| anyhow!("fixation rect"))?;
        self.canvas.fill_rect(h, &paint, Transform::identity(), None);
        self.canvas.fill_rect(v, &paint, Transform::identity(), None);
        Ok(())
    }

    /// Horizontal shaft centred on `cx` with two wings at each end.
    /// Negative lengths collapse the shaft to a point.
    fn draw_winged_line(&mut self, length: i32, cx: f32, y: f32, angle_deg: i32, rgb: [u8; 3]) -> Result<()> {
        let half = length.max(0) as f32 / 2.0;
        let (x1, x2) = (cx - half, cx + half);

        if half > 0.0 {
            self.stroke_segment((x1, y), (x2, y), self.layout.shaft_width, rgb)?;
        }

        let wing = self.layout.wing_length;
        let ang = (angle_deg as f32).to_radians();
        let (dx, dy) = (wing * ang.cos(), wing * ang.sin());
        let w = self.layout.wing_width;
        self.stroke_segment((x1, y), (x1 - dx, y - dy), w, rgb)?;
        self.stroke_segment((x1, y), (x1 - dx, y + dy), w, rgb)?;
        self.stroke_segment((x2, y), (x2 + dx, y - dy), w, rgb)?;
        self.stroke_segment((x2, y), (x2 + dx, y + dy), w, rgb)?;
        Ok(())
    }

    fn draw_bar(&mut self, length: i32, cx: f32, y: f32) -> Result<()> {
        let half = length.max(0) as f32 / 2.0;
        if half == 0.0 {
            return Ok(());
        }
        self.stroke_segment((cx - half, y), (cx + half, y), self.layout.bar_width, FOREGROUND)
    }

    /// Two lines converging upward like rails in perspective.
    fn draw_ponzo_frame(&mut self) -> Result<()> {
        let (cx, _) = self.center;
        let bottom = self.height as f32;
        let (wide, narrow) = self.layout.frame_spread;
        let top = self.layout.frame_top;
        let w = self.layout.frame_width;
        self.stroke_segment((cx - wide, bottom), (cx - narrow, top), w, FRAME)?;
        self.stroke_segment((cx + wide, bottom), (cx + narrow, top), w, FRAME)
    }

    fn stroke_segment(&mut self, from: (f32, f32), to: (f32, f32), width: f32, rgb: [u8; 3]) -> Result<()> {
        let mut pb = PathBuilder::new();
        pb.move_to(from.0, from.1);
        pb.line_to(to.0, to.1);
        let path = pb.finish().ok_or_else(|| anyhow!("degenerate segment {from:?} -> {to:?}"))?;

        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color_rgba8(rgb[0], rgb[1], rgb[2], 255);
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.canvas
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        Ok(())
    }

    /// Centred multi-line text.
    fn draw_text(&mut self, content: &str, size: f32) {
        let Some(font) = &self.font else {
            return;
        };
        let lines: Vec<&str> = content.lines().collect();
        let pitch = size * self.layout.line_spacing;
        let (cx, cy) = self.center;
        let start_y = cy - pitch * lines.len() as f32 / 2.0;

        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let key = (line.to_string(), size.to_bits());
            let pm = self.text_cache.entry(key).or_insert_with(|| {
                render_text_pixmap(line, size, font, Color::WHITE)
            });
            let x = (cx - pm.width() as f32 / 2.0).round() as i32;
            let y = (start_y + pitch * i as f32 + pitch / 2.0 - pm.height() as f32 / 2.0).round() as i32;
            self.canvas.draw_pixmap(
                x,
                y,
                pm.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
    }
}
