//! # kilo-editor: the viewer core for kilo
//!
//! This crate holds everything above the terminal layer:
//!
//! - **[`buffer`]**: `LineStore` trait and `Buffer`, a file as byte lines
//! - **[`cursor`]**: `Cursor` with clamped movement inside the viewport
//! - **[`view`]**: `draw_rows`, which lays lines and the banner into a frame
//! - **[`options`]**: welcome text, placeholder glyph and quit key

pub mod buffer;
pub mod cursor;
pub mod options;
pub mod view;
