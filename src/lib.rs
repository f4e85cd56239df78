//! Rectangle annotation over a background image.
//!
//! The editing core ([`editor::Editor`]) is toolkit-free: feed it
//! [`input::InputEvent`]s and apply the [`editor::Effect`]s it returns. The
//! eframe front end lives in [`app`].

pub mod app;
pub mod color;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod input;
pub mod props;
pub mod render;
pub mod scene;
pub mod store;

pub use color::Rgba;
pub use config::Config;
pub use editor::{Editor, Effect, Feedback, Mode};
pub use error::{Error, Result};
pub use geometry::{Point, Rect};
pub use input::{InputEvent, Key, Keymap, Modifiers, Shortcut};
pub use props::{PanelFields, PropertyPanel, PropertySync, RectSpec};
pub use store::{DirImageStore, ImageStore, StoredImage};
