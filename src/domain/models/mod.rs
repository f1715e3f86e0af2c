mod action;
mod backend;
mod credential;
mod entry;
mod event;
mod generation;
mod language;
mod role;
mod slash_commands;

pub use action::*;
pub use backend::*;
pub use credential::*;
pub use entry::*;
pub use event::*;
pub use generation::*;
pub use language::*;
pub use role::*;
pub use slash_commands::*;
