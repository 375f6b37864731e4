//! Terminal front-end: a ratatui grid editor over one [`Document`](crate::Document).
mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
