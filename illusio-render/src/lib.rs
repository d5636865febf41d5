pub mod render;
pub mod text;

pub use render::SkiaRenderer;
pub use text::{find_system_font, load_font, render_text_pixmap};
