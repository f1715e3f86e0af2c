pub mod actions;
mod app_state;
pub mod clipboard;
mod code_blocks;
mod generation_session;
mod renderer;

pub use app_state::*;
pub use code_blocks::*;
pub use generation_session::*;
pub use renderer::*;
