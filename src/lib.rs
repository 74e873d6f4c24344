#![forbid(unsafe_code)]

//! Poster composition: canvases, filters, shapes and auto-fitted text blocks.
//!
//! [`Image`] owns a premultiplied RGBA8 buffer and exposes the editing
//! operations. Text goes through the [`text`] engine, which is generic over
//! [`FontMetrics`] and [`TextSurface`] so layout can run without a raster.

pub mod codec;
pub mod color;
pub mod composite_cpu;
pub mod editor;
pub mod error;
pub mod filters;
pub mod geometry;
pub mod raster;
pub mod surface;
pub mod text;

pub use codec::ImageKind;
pub use color::{Rgb8, Rgba8};
pub use editor::{Image, InsertOptions, ShapeOptions};
pub use error::{PosterError, PosterResult};
pub use geometry::{FitPosition, ResizeMode};
pub use surface::{PixelRect, Surface};
pub use text::{
    Boundary, BoundingBox, FitSolver, FontCache, FontMetrics, HorizontalAlign, LayoutResult,
    LineBreaker, PlacedLine, TextExtents, TextOptions, TextRenderer, TextRun, TextStyle,
    TextSurface, VerticalAlign, WrappedLine,
};
