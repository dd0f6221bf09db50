//! Column records and the rolling history that stores them.
//!
//! Every recorded sample becomes one record; a record is drawn as one
//! terminal column. Records are kept contiguously (oldest first) so a
//! redraw can scan the visible window as a plain slice.

use tracing::debug;

/// Item index reserved for "no item" (background).
pub const NO_ITEM: u8 = u8::MAX;

/// Largest number of items a chart can have; 0xFF is the background marker.
pub const MAX_ITEMS: usize = NO_ITEM as usize - 1;

/// One character cell of a column: who owns it and which of its 8 dots
/// are lit. Bit 2k is the left dot and bit 2k+1 the right dot of sub-row k,
/// counted from the top of the cell, so bits 6 and 7 form the bottom row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorCell {
    pub item: u8,
    pub details: u8,
}

impl ColorCell {
    pub const BLANK: Self = Self {
        item: NO_ITEM,
        details: 0x00,
    };

    pub fn new(item: u8, details: u8) -> Self {
        Self { item, details }
    }

    pub fn owner(&self) -> Option<u8> {
        (self.item != NO_ITEM).then_some(self.item)
    }
}

impl Default for ColorCell {
    fn default() -> Self {
        Self::BLANK
    }
}

/// How a chart's records are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// At most one item: only the dot count and scale are kept.
    OneColor { height: u16 },
    /// Fixed total: one cell per row.
    Percent { height: u16 },
    /// Power-of-two total: cells for every stored zoom level packed into
    /// `2 * height - 1` slots (see `scale::value_cell_index`).
    DynamicScale { height: u16 },
}

impl RecordLayout {
    pub fn new(height: u16, num_items: usize, is_percent: bool) -> Self {
        if height >= 2 && num_items <= 1 {
            RecordLayout::OneColor { height }
        } else if is_percent {
            RecordLayout::Percent { height }
        } else {
            RecordLayout::DynamicScale { height }
        }
    }

    pub fn height(&self) -> u16 {
        match *self {
            RecordLayout::OneColor { height }
            | RecordLayout::Percent { height }
            | RecordLayout::DynamicScale { height } => height,
        }
    }

    pub fn cells_per_record(&self) -> usize {
        match *self {
            RecordLayout::OneColor { .. } => 0,
            RecordLayout::Percent { height } => usize::from(height),
            RecordLayout::DynamicScale { height } => 2 * usize::from(height) - 1,
        }
    }

    pub fn is_percent(&self) -> bool {
        matches!(self, RecordLayout::Percent { .. })
    }
}

/// Per-record scalars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordHeader {
    /// `log2` of the total the record was computed against.
    pub scale_exp: i16,
    /// Lit dots; only meaningful for one-colour records.
    pub num_dots: u16,
}

#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub header: RecordHeader,
    pub cells: &'a [ColorCell],
}

#[derive(Debug)]
pub struct RecordMut<'a> {
    pub header: &'a mut RecordHeader,
    pub cells: &'a mut [ColorCell],
}

impl RecordMut<'_> {
    pub fn clear(&mut self) {
        *self.header = RecordHeader::default();
        self.cells.fill(ColorCell::BLANK);
    }

    pub fn as_record(&self) -> Record<'_> {
        Record {
            header: *self.header,
            cells: self.cells,
        }
    }
}

/// Rolling store of records. Grows by at least half its size when more
/// room is needed, up to `max_capacity`; once full, appending drops the
/// oldest record instead of reallocating.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    layout: RecordLayout,
    stride: usize,
    capacity: usize,
    max_capacity: usize,
    headers: Vec<RecordHeader>,
    cells: Vec<ColorCell>,
}

impl HistoryBuffer {
    pub fn new(layout: RecordLayout, initial_capacity: usize, max_capacity: usize) -> Self {
        let max_capacity = max_capacity.max(1);
        let capacity = initial_capacity.clamp(1, max_capacity);
        let stride = layout.cells_per_record();
        debug!(capacity, max_capacity, stride, "allocating graph history");
        Self {
            layout,
            stride,
            capacity,
            max_capacity,
            headers: Vec::with_capacity(capacity),
            cells: Vec::with_capacity(capacity * stride),
        }
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Number of records that fit before the next growth step.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Makes room for at least `columns` records (capped at the maximum).
    /// Returns whether the buffer grew.
    pub fn reserve_columns(&mut self, columns: usize) -> bool {
        if columns <= self.capacity || self.capacity >= self.max_capacity {
            return false;
        }
        self.grow(columns);
        true
    }

    fn grow(&mut self, min_capacity: usize) {
        let stepped = self.capacity + self.capacity.div_ceil(2);
        let new_capacity = stepped.max(min_capacity).min(self.max_capacity);
        debug_assert!(new_capacity > self.capacity);

        self.headers
            .reserve_exact(new_capacity - self.headers.len());
        self.cells
            .reserve_exact(new_capacity * self.stride - self.cells.len());
        debug!(
            from = self.capacity,
            to = new_capacity,
            "growing graph history"
        );
        self.capacity = new_capacity;
    }

    /// Appends a blank record and returns it for filling in.
    pub fn push(&mut self) -> RecordMut<'_> {
        if self.headers.len() >= self.capacity {
            if self.capacity < self.max_capacity {
                self.grow(self.capacity + 1);
            } else {
                self.headers.remove(0);
                self.cells.drain(..self.stride);
            }
        }

        self.headers.push(RecordHeader::default());
        self.cells
            .extend(std::iter::repeat_n(ColorCell::BLANK, self.stride));

        let index = self.headers.len() - 1;
        let start = index * self.stride;
        RecordMut {
            header: &mut self.headers[index],
            cells: &mut self.cells[start..start + self.stride],
        }
    }

    pub fn get(&self, index: usize) -> Option<Record<'_>> {
        let header = *self.headers.get(index)?;
        let start = index * self.stride;
        Some(Record {
            header,
            cells: &self.cells[start..start + self.stride],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Largest scale exponent among the records from `start` to the end.
    pub fn max_scale_exp(&self, start: usize) -> i16 {
        self.headers
            .iter()
            .skip(start)
            .map(|h| h.scale_exp)
            .fold(0, i16::max)
    }

    #[cfg(test)]
    pub(crate) fn allocated_records(&self) -> usize {
        self.headers.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic(height: u16) -> RecordLayout {
        RecordLayout::DynamicScale { height }
    }

    #[test]
    fn layout_selection() {
        assert_eq!(RecordLayout::new(4, 1, false), RecordLayout::OneColor { height: 4 });
        assert_eq!(RecordLayout::new(4, 0, true), RecordLayout::OneColor { height: 4 });
        assert_eq!(RecordLayout::new(1, 1, false), dynamic(1));
        assert_eq!(RecordLayout::new(4, 2, true), RecordLayout::Percent { height: 4 });
        assert_eq!(RecordLayout::new(4, 3, false), dynamic(4));

        assert_eq!(RecordLayout::OneColor { height: 4 }.cells_per_record(), 0);
        assert_eq!(RecordLayout::Percent { height: 4 }.cells_per_record(), 4);
        assert_eq!(dynamic(4).cells_per_record(), 7);
        assert_eq!(dynamic(1).cells_per_record(), 1);
    }

    #[test]
    fn push_starts_blank() {
        let mut history = HistoryBuffer::new(dynamic(3), 4, 16);
        let record = history.push();
        assert_eq!(*record.header, RecordHeader::default());
        assert!(record.cells.iter().all(|c| *c == ColorCell::BLANK));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn growth_steps_are_at_least_half() {
        let mut history = HistoryBuffer::new(dynamic(2), 4, 20);
        let mut capacities = vec![history.capacity()];
        for _ in 0..40 {
            history.push();
            if *capacities.last().unwrap() != history.capacity() {
                capacities.push(history.capacity());
            }
        }
        assert_eq!(capacities, vec![4, 6, 9, 14, 20]);
        for pair in capacities.windows(2) {
            assert!(pair[1] * 2 >= pair[0] * 3 || pair[1] == 20);
        }
        assert_eq!(history.len(), 20);
    }

    #[test]
    fn full_buffer_shifts_without_reallocating() {
        let mut history = HistoryBuffer::new(RecordLayout::Percent { height: 2 }, 3, 3);
        for n in 0..3u16 {
            history.push().header.num_dots = n;
        }
        let allocated = history.allocated_records();

        for n in 3..10u16 {
            let mut record = history.push();
            record.header.num_dots = n;
            record.cells[0] = ColorCell::new(1, 0xFF);
        }

        assert_eq!(history.allocated_records(), allocated);
        assert_eq!(history.capacity(), 3);
        let dots: Vec<u16> = history.iter().map(|r| r.header.num_dots).collect();
        assert_eq!(dots, vec![7, 8, 9]);
        assert!(history.iter().all(|r| r.cells[0] == ColorCell::new(1, 0xFF)));
    }

    #[test]
    fn reserve_columns_grows_once_to_viewport() {
        let mut history = HistoryBuffer::new(dynamic(4), 8, 100);
        assert!(history.reserve_columns(40));
        assert_eq!(history.capacity(), 40);
        assert!(!history.reserve_columns(40));
        assert!(history.reserve_columns(41));
        assert_eq!(history.capacity(), 60);
        assert!(history.reserve_columns(500));
        assert_eq!(history.capacity(), 100);
        assert!(!history.reserve_columns(500));
    }

    #[test]
    fn max_scale_exp_scans_window() {
        let mut history = HistoryBuffer::new(dynamic(2), 4, 4);
        for exp in [9, 3, 5, 4] {
            history.push().header.scale_exp = exp;
        }
        assert_eq!(history.max_scale_exp(0), 9);
        assert_eq!(history.max_scale_exp(1), 5);
        assert_eq!(history.max_scale_exp(4), 0);
    }
}
