mod app;
pub mod keymap;
mod port;

pub use app::{init_tracing, App};
pub use port::WindowPort;
