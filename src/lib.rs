//! History graphs drawn with braille (or ASCII) dots on a character grid.
//!
//! A [`GraphMeter`] samples a [`ValueSource`] on a timer, stores every
//! sample as one encoded column, and redraws the newest columns through a
//! [`ScreenWriter`]. Each column is split among its items at 8 dots per
//! row and stays readable when the view zooms out by powers of two.

pub mod apportion;
pub mod config;
pub mod error;
pub mod glyph;
pub mod graph;
pub mod history;
pub mod logging;
pub mod lookup;
pub mod sample;
pub mod scale;
pub mod time_graph;
pub mod utils;

pub use config::{GraphConfig, PaletteConfig};
pub use error::{GraphError, Result};
pub use glyph::GlyphMode;
pub use graph::{Attr, GraphMeter, GraphState, SampleClock, ScreenWriter, ValueSource};
pub use time_graph::{BufferWriter, GraphMeterWidget, Palette};
