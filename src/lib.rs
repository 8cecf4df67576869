//! Morais - lesson client for the Code with Morais learning platform
//!
//! Morais loads lessons, tracks progress through their blocks, gates
//! completion behind assessments, and renders lessons to HTML or plays them
//! in the terminal.

pub mod api;
pub mod app;
pub mod assessment;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod interaction;
pub mod lesson;
pub mod notify;
pub mod progress;
pub mod render;
pub mod syntax;
pub mod theme;
pub mod ui;
pub mod vocabulary;
pub mod wordgame;

pub use app::Player;
pub use config::Config;
pub use context::AppContext;
pub use theme::{Theme, ThemeMode};
