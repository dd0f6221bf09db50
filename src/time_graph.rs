use std::time::SystemTime;

use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Style},
    widgets::{Block, Widget},
};

use crate::graph::{Attr, GraphMeter, ScreenWriter, ValueSource};

/// Styles for each graph attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    text: Style,
    shadow: Style,
    border: Style,
    items: Vec<Style>,
}

impl Palette {
    pub fn new(text: Color, shadow: Color, border: Color, items: Vec<Color>) -> Self {
        Self {
            text: Style::default().fg(text),
            shadow: Style::default().fg(shadow),
            border: Style::default().fg(border),
            items: items.into_iter().map(|c| Style::default().fg(c)).collect(),
        }
    }

    pub fn style(&self, attr: Attr) -> Style {
        match attr {
            Attr::Text => self.text,
            Attr::Shadow => self.shadow,
            Attr::Border => self.border,
            Attr::Item(item) if !self.items.is_empty() => {
                self.items[usize::from(item) % self.items.len()]
            }
            Attr::Item(_) => Style::default(),
        }
    }
}

/// `ScreenWriter` over a ratatui buffer. Writes outside `area` are dropped.
pub struct BufferWriter<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    palette: &'a Palette,
    cursor: Position,
}

impl<'a> BufferWriter<'a> {
    pub fn new(buf: &'a mut Buffer, area: Rect, palette: &'a Palette) -> Self {
        Self {
            buf,
            area,
            palette,
            cursor: area.as_position(),
        }
    }
}

impl ScreenWriter for BufferWriter<'_> {
    fn move_to(&mut self, x: u16, y: u16) {
        self.cursor = Position::new(x, y);
    }

    fn write(&mut self, text: &str, attr: Attr) {
        let style = self.palette.style(attr);
        for ch in text.chars() {
            if self.area.contains(self.cursor) {
                self.buf[self.cursor].set_char(ch).set_style(style);
            }
            self.cursor.x = self.cursor.x.saturating_add(1);
        }
    }
}

/// Renders a `GraphMeter`, sampling its source if a sample is due.
pub struct GraphMeterWidget<'a, S: ValueSource + ?Sized> {
    meter: &'a mut GraphMeter,
    source: &'a S,
    palette: &'a Palette,
    block: Option<Block<'a>>,
    now: SystemTime,
}

impl<'a, S: ValueSource + ?Sized> GraphMeterWidget<'a, S> {
    pub fn new(meter: &'a mut GraphMeter, source: &'a S, palette: &'a Palette) -> Self {
        Self {
            meter,
            source,
            palette,
            block: None,
            now: SystemTime::now(),
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Clock reading used to decide whether to sample.
    pub fn at(mut self, now: SystemTime) -> Self {
        self.now = now;
        self
    }
}

impl<S: ValueSource + ?Sized> Widget for GraphMeterWidget<'_, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let graph_area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        if graph_area.height < 1 || graph_area.width < 1 {
            return;
        }

        let mut writer = BufferWriter::new(buf, graph_area, self.palette);
        self.meter.draw(
            self.source,
            &mut writer,
            graph_area.x,
            graph_area.y,
            graph_area.width,
            self.now,
        );
    }
}
