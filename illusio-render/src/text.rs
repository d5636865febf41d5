use ab_glyph::{point, Font, FontVec, Glyph, OutlinedGlyph, PxScale, Rect, ScaleFont};
use anyhow::{Context, Result};
use std::path::Path;
use tiny_skia::{Color, ColorU8, Pixmap, PremultipliedColorU8};

/// Common locations of a sans-serif TTF, tried in order.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontVec::try_from_vec(bytes).with_context(|| format!("parsing font {}", path.display()))
}

pub fn find_system_font() -> Option<FontVec> {
    SYSTEM_FONTS
        .iter()
        .map(Path::new)
        .filter(|p| p.exists())
        .find_map(|p| match load_font(p) {
            Ok(font) => {
                tracing::debug!(path = %p.display(), "using system font");
                Some(font)
            }
            Err(err) => {
                tracing::debug!("skipping font: {err:#}");
                None
            }
        })
}

/// Rasterises one line of text into a tight, transparent pixmap. A line
/// with no visible glyphs yields a 1x1 pixmap.
pub fn render_text_pixmap<F: Font>(text: &str, font_size: f32, font: &F, color: Color) -> Pixmap {
    let outlines = layout_line(text, font_size, font);
    let Some(bounds) = outlines
        .iter()
        .map(OutlinedGlyph::px_bounds)
        .reduce(|a, b| Rect {
            min: point(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
            max: point(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
        })
    else {
        return Pixmap::new(1, 1).expect("pixmap");
    };

    let origin = (bounds.min.x.floor(), bounds.min.y.floor());
    let width = (bounds.max.x.ceil() - origin.0).max(1.0) as u32;
    let height = (bounds.max.y.ceil() - origin.1).max(1.0) as u32;
    let Some(mut pixmap) = Pixmap::new(width, height) else {
        return Pixmap::new(1, 1).expect("pixmap");
    };

    let ink = color.to_color_u8();
    let stride = width as usize;
    let pixels = pixmap.pixels_mut();
    for glyph in &outlines {
        let glyph_min = glyph.px_bounds().min;
        glyph.draw(|gx, gy, coverage| {
            let x = (gx as f32 + glyph_min.x - origin.0).floor();
            let y = (gy as f32 + glyph_min.y - origin.1).floor();
            if coverage <= f32::EPSILON || x < 0.0 || y < 0.0 {
                return;
            }
            let (x, y) = (x as usize, y as usize);
            if x < stride && y < height as usize {
                let i = y * stride + x;
                pixels[i] = blend_over(pixels[i], ink, coverage);
            }
        });
    }
    pixmap
}

/// Positions glyphs on a baseline at the font's ascent, with kerning, and
/// keeps only those with an outline.
fn layout_line<F: Font>(text: &str, font_size: f32, font: &F) -> Vec<OutlinedGlyph> {
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);
    let mut pen_x = 0.0f32;
    let mut previous = None;
    let mut outlines = Vec::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            pen_x += scaled.kern(prev, id);
        }
        let glyph = Glyph {
            id,
            scale,
            position: point(pen_x, scaled.ascent()),
        };
        if let Some(outline) = font.outline_glyph(glyph) {
            outlines.push(outline);
        }
        pen_x += scaled.h_advance(id);
        previous = Some(id);
    }
    outlines
}

/// Source-over of `ink` at `coverage` onto a premultiplied pixel.
fn blend_over(dst: PremultipliedColorU8, ink: ColorU8, coverage: f32) -> PremultipliedColorU8 {
    let alpha = (coverage * f32::from(ink.alpha()) / 255.0).clamp(0.0, 1.0);
    let keep = 1.0 - alpha;
    let mix = |src: u8, bg: u8| (f32::from(src) * alpha + f32::from(bg) * keep).round() as u8;
    let a = mix(255, dst.alpha());
    PremultipliedColorU8::from_rgba(
        mix(ink.red(), dst.red()).min(a),
        mix(ink.green(), dst.green()).min(a),
        mix(ink.blue(), dst.blue()).min(a),
        a,
    )
    .unwrap_or(dst)
}
