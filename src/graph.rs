//! The graph meter: samples a value source on a timer and draws the
//! visible part of its history.
//!
//! A meter is drawn into a box `width` columns wide and `height` rows
//! tall. The first three columns hold the caption and, on meters at least
//! three rows tall, the scale label under it; the rest is the graph,
//! newest sample on the right.

use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::glyph::{GlyphMode, glyph};
use crate::history::{HistoryBuffer, MAX_ITEMS, RecordLayout};
use crate::lookup::lookup_cell;
use crate::sample::SampleAggregator;
use crate::scale::{format_scale, record_sample};

/// Columns reserved for the caption and scale label.
pub const CAPTION_WIDTH: u16 = 3;

/// Supplies the numbers a meter graphs.
pub trait ValueSource {
    /// Short label; the first three characters are shown.
    fn caption(&self) -> &str;

    /// Current value of every item. Non-positive values count as absent.
    fn values(&self) -> &[f64];

    /// Fixed total for percent charts, or 0 for a dynamic power-of-two scale.
    fn total(&self) -> f64;

    /// Number of items the source can report.
    fn max_items(&self) -> usize {
        self.values().len()
    }
}

/// Named colour attributes a screen maps to real colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
    Text,
    /// Background dots (the baseline under an empty column).
    Shadow,
    Border,
    Item(u8),
}

/// Cursor-addressed character output.
pub trait ScreenWriter {
    fn move_to(&mut self, x: u16, y: u16);

    /// Writes `text` at the cursor and advances it by one column per char.
    fn write(&mut self, text: &str, attr: Attr);
}

/// Decides when the next sample is due. Any clock reading that is not
/// after the previous one (the clock went backwards) counts as due.
#[derive(Debug, Clone)]
pub struct SampleClock {
    interval: Duration,
    last: Option<SystemTime>,
    next_due: Option<SystemTime>,
}

impl SampleClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            next_due: None,
        }
    }

    /// Interval given in tenths of a second, at least one tenth.
    pub fn from_tenths(tenths: u32) -> Self {
        Self::new(tenths_to_duration(tenths))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Changes the interval; takes effect after the next sample.
    pub fn set_interval_tenths(&mut self, tenths: u32) {
        self.interval = tenths_to_duration(tenths);
    }

    /// Returns whether a sample is due at `now`, and if so starts the
    /// next interval.
    pub fn tick(&mut self, now: SystemTime) -> bool {
        let went_backwards = self.last.is_some_and(|last| now < last);
        let due = match self.next_due {
            None => true,
            Some(next_due) => now >= next_due || went_backwards,
        };
        if due {
            self.last = Some(now);
            self.next_due = Some(now + self.interval);
        }
        due
    }
}

fn tenths_to_duration(tenths: u32) -> Duration {
    Duration::from_millis(u64::from(tenths.max(1)) * 100)
}

/// Lifecycle of a meter's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    /// Never drawn: no history allocated.
    NoData,
    /// History allocated but nothing recorded yet.
    Accumulating,
    /// At least one column recorded.
    Ready,
}

#[derive(Debug, Clone)]
struct Recording {
    aggregator: SampleAggregator,
    history: HistoryBuffer,
}

#[derive(Debug, Clone)]
pub struct GraphMeter {
    height: u16,
    glyphs: GlyphMode,
    initial_history: usize,
    max_history: usize,
    clock: SampleClock,
    recording: Option<Recording>,
}

impl GraphMeter {
    /// Builds a meter for `source`. Fails when the configuration is out of
    /// range or the source reports more items than a record can index.
    pub fn new(config: &GraphConfig, source: &dyn ValueSource) -> Result<Self> {
        config.validate()?;
        let count = source.max_items();
        if count > MAX_ITEMS {
            return Err(GraphError::TooManyItems { count });
        }
        Ok(Self {
            height: config.height,
            glyphs: config.glyphs,
            initial_history: config.initial_history,
            max_history: config.max_history,
            clock: SampleClock::from_tenths(config.delay_tenths),
            recording: None,
        })
    }

    pub fn set_glyphs(&mut self, glyphs: GlyphMode) {
        self.glyphs = glyphs;
    }

    pub fn clock_mut(&mut self) -> &mut SampleClock {
        &mut self.clock
    }

    pub fn state(&self) -> GraphState {
        match &self.recording {
            None => GraphState::NoData,
            Some(recording) if recording.history.is_empty() => GraphState::Accumulating,
            Some(_) => GraphState::Ready,
        }
    }

    pub fn history(&self) -> Option<&HistoryBuffer> {
        self.recording.as_ref().map(|r| &r.history)
    }

    /// Draws the meter with its top-left corner at `(x, y)`, recording a
    /// new sample first if one is due at `now`.
    pub fn draw<S, W>(
        &mut self,
        source: &S,
        screen: &mut W,
        x: u16,
        y: u16,
        width: u16,
        now: SystemTime,
    ) where
        S: ValueSource + ?Sized,
        W: ScreenWriter + ?Sized,
    {
        let shown = usize::from(width.min(CAPTION_WIDTH));
        let caption: String = source
            .caption()
            .chars()
            .chain(std::iter::repeat(' '))
            .take(shown)
            .collect();
        screen.move_to(x, y);
        screen.write(&caption, Attr::Text);

        let num_items = source.max_items().min(MAX_ITEMS);
        if num_items == 0 {
            return;
        }

        let graph_width = width.saturating_sub(CAPTION_WIDTH);
        let height = self.height;
        self.ensure_recording(source, num_items, usize::from(graph_width));
        let Some(recording) = self.recording.as_mut() else {
            return;
        };

        if self.clock.tick(now) {
            let values = source.values();
            let values = &values[..values.len().min(MAX_ITEMS)];
            let aggregate = recording.aggregator.aggregate(values);
            let layout = recording.history.layout();
            let mut record = recording.history.push();
            record_sample(&mut record, layout, values, &aggregate);
        }

        if graph_width == 0 {
            return;
        }

        let history = &recording.history;
        let layout = history.layout();
        let visible = history.len().min(usize::from(graph_width));
        let start = history.len() - visible;
        let scale_exp = if layout.is_percent() {
            0
        } else {
            history.max_scale_exp(start)
        };

        if height >= 3 {
            let label = if recording.aggregator.is_percent() {
                "  %".to_string()
            } else {
                format_scale(i32::from(scale_exp))
            };
            screen.move_to(x, y + 1);
            screen.write(&format!("{label:>3}"), Attr::Text);
        }

        if visible == 0 {
            return;
        }
        let left = x + CAPTION_WIDTH + (graph_width - visible as u16);
        let mut run = String::new();
        for line in 0..height {
            let row = height - 1 - line;
            screen.move_to(left, y + line);
            let mut run_attr = None;
            for index in start..history.len() {
                let Some(record) = history.get(index) else {
                    continue;
                };
                let view = lookup_cell(layout, record, row, scale_exp);
                let attr = view.item.map_or(Attr::Shadow, Attr::Item);
                if run_attr.is_some_and(|a| a != attr) {
                    flush(screen, &mut run, run_attr);
                }
                run_attr = Some(attr);
                run.push(glyph(view.details, self.glyphs));
            }
            flush(screen, &mut run, run_attr);
        }
    }

    fn ensure_recording<S>(&mut self, source: &S, num_items: usize, columns: usize)
    where
        S: ValueSource + ?Sized,
    {
        let recording = self.recording.get_or_insert_with(|| {
            let aggregator = SampleAggregator::new(source.total());
            let layout = RecordLayout::new(self.height, num_items, aggregator.is_percent());
            debug!(
                caption = source.caption(),
                ?layout,
                columns,
                "starting graph history"
            );
            let history = HistoryBuffer::new(
                layout,
                self.initial_history.max(columns),
                self.max_history,
            );
            Recording {
                aggregator,
                history,
            }
        });
        recording.history.reserve_columns(columns);
    }
}

fn flush<W: ScreenWriter + ?Sized>(screen: &mut W, run: &mut String, attr: Option<Attr>) {
    if let Some(attr) = attr {
        if !run.is_empty() {
            screen.write(run, attr);
        }
    }
    run.clear();
}
