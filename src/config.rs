//! Graph settings, loaded from JSON.

use std::path::Path;
use std::str::FromStr;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::glyph::GlyphMode;
use crate::time_graph::Palette;

/// Tallest graph supported; `8 * height` dots must fit a 16-bit count.
pub const MAX_HEIGHT: u16 = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Graph height in rows.
    pub height: u16,
    /// Hard cap on stored columns.
    pub max_history: usize,
    /// Columns allocated on the first draw, at least the viewport width.
    pub initial_history: usize,
    /// Sampling interval in tenths of a second.
    pub delay_tenths: u32,
    pub glyphs: GlyphMode,
    pub palette: PaletteConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            height: 4,
            max_history: 1024,
            initial_history: 32,
            delay_tenths: 15,
            glyphs: GlyphMode::Braille,
            palette: PaletteConfig::default(),
        }
    }
}

impl GraphConfig {
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        debug!("Loaded graph config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_HEIGHT).contains(&self.height) {
            return Err(GraphError::invalid_config(format!(
                "height must be between 1 and {MAX_HEIGHT}, got {}",
                self.height
            )));
        }
        if self.max_history == 0 {
            return Err(GraphError::invalid_config("max_history must be at least 1"));
        }
        if self.delay_tenths == 0 {
            return Err(GraphError::invalid_config("delay_tenths must be at least 1"));
        }
        self.palette.resolve()?;
        Ok(())
    }
}

/// Colour names for each attribute, as accepted by ratatui
/// (`"red"`, `"darkgray"`, `"#ff8800"`, `"208"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub text: String,
    pub shadow: String,
    pub border: String,
    /// Item colours, reused cyclically when a chart has more items.
    pub items: Vec<String>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            text: "cyan".to_string(),
            shadow: "darkgray".to_string(),
            border: "white".to_string(),
            items: ["green", "blue", "yellow", "magenta", "red", "lightcyan"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl PaletteConfig {
    pub fn resolve(&self) -> Result<Palette> {
        if self.items.is_empty() {
            return Err(GraphError::invalid_config("palette needs at least one item colour"));
        }
        let items = self
            .items
            .iter()
            .map(|name| parse_color(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Palette::new(
            parse_color(&self.text)?,
            parse_color(&self.shadow)?,
            parse_color(&self.border)?,
            items,
        ))
    }
}

fn parse_color(value: &str) -> Result<Color> {
    Color::from_str(value.trim()).map_err(|_| GraphError::InvalidColor {
        value: value.to_string(),
    })
}
