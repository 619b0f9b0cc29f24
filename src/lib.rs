//! Core engine of a raster image editor.
//!
//! A [`Canvas`] owns a base raster plus an ordered, replayable log of
//! drawing [`Action`]s. Undo and redo move actions between the log and a
//! redo stack; after every change the canvas recomposites itself by
//! replaying the whole log from scratch, so the displayed image is always a
//! pure function of the base raster and the committed actions. Tools turn a
//! pointer-event stream into exactly one in-progress action at a time, and
//! [`Editor`] ties canvas, palette, and tools together behind the interface
//! a host shell drives.
//!
//! Everything runs synchronously on the caller's thread; the engine has no
//! event loop of its own.

#![allow(clippy::too_many_arguments)]

pub mod app;
pub mod canvas;
pub mod components;
pub mod geometry;
pub mod io;
pub mod ops;

pub use app::Editor;
pub use canvas::{Canvas, RenderMode, Surface};
pub use components::colors::{ColorSlot, Palette};
pub use components::tools::{MIN_DWELL_MS, ShapeStyle, ToolKind, ToolOptions};
pub use components::{PointerButton, PointerEvent};
pub use geometry::{Point, Rect};
pub use ops::Action;
