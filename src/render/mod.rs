pub mod board;
pub mod renderer;

pub use board::render_board;
pub use renderer::{Renderer, WatchStatus};
