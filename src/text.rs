//! Auto-fitting multi-line text blocks.
//!
//! A draw call runs three stages against a [`FontMetrics`] implementation:
//!
//! - [`FitSolver`] shrinks the font size one point at a time until the block
//!   wrapped by [`LineBreaker`] fits the bounding box,
//! - [`place`] resolves per-line origins for the alignment modes,
//! - [`TextRenderer`] issues one draw call per line against a [`TextSurface`].
//!
//! The returned [`Boundary`] lets callers stack the next block directly below:
//!
//! ```no_run
//! use posterkit::{Image, TextOptions};
//!
//! let mut poster = Image::canvas(900, Some(600))?;
//! let title = TextOptions {
//!     x: Some(40),
//!     y: Some(40),
//!     width: Some(820),
//!     fontsize: Some(64),
//!     fontfile: Some("fonts/Inter-Bold.ttf".into()),
//!     ..TextOptions::default()
//! };
//! let boundary = poster.text("Summer festival", &title)?;
//!
//! let body = TextOptions {
//!     y: Some(boundary.bottom() + 20),
//!     fontsize: Some(24),
//!     ..title
//! };
//! poster.text("Friday to Sunday, open air stage", &body)?;
//! # Ok::<(), posterkit::PosterError>(())
//! ```

mod fit;
mod layout;
mod metrics;
mod model;
mod options;
mod render;
mod wrap;

pub use fit::{FitOutcome, FitSolver};
pub use layout::{LayoutResult, PlacedLine, place};
pub use metrics::{FontCache, FontMetrics, LoadedFont, PositionedGlyph, TextExtents};
pub use model::{Boundary, BoundingBox, HorizontalAlign, TextStyle, VerticalAlign, WrappedLine};
pub use options::TextOptions;
pub use render::{TextRenderer, TextRun, TextSurface, pastel_color};
pub use wrap::LineBreaker;
