//! Reads one visible cell back out of a stored record.

use crate::history::{Record, RecordLayout};
use crate::scale::value_cell_index;
use crate::utils::pop_count8;

/// Bottom dot row, always lit on row 0 as the graph's baseline.
pub const BASELINE: u8 = 0xC0;

/// What a row of a column shows: the owning item (None for background)
/// and the coverage mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView {
    pub item: Option<u8>,
    pub details: u8,
}

impl CellView {
    pub const BACKGROUND: Self = Self {
        item: None,
        details: 0x00,
    };
}

/// Coarsens a stored mask that covers `scale_factor` display rows' worth
/// of a finer level. Half-scale cells keep a half-cell indicator, anything
/// coarser keeps only the bottom row.
pub fn scale_cell_details(details: u8, scale_factor: u32) -> u8 {
    if scale_factor < 2 {
        return details;
    }
    if scale_factor < 4 && details & 0x0F != 0 {
        let mut scaled = 0x30;
        if pop_count8(details) >= 5 {
            scaled |= 0x40;
        }
        if details >= 0x7F {
            scaled |= 0x80;
        }
        return scaled;
    }
    if details != 0 { 0xC0 } else { 0x00 }
}

/// Cell shown at `row` (0 = bottom) when the viewport is drawn at
/// `2^scale_exp`. `scale_exp` is the viewport's maximum, so it is never
/// below the record's own exponent for dynamic charts.
pub fn lookup_cell(layout: RecordLayout, record: Record<'_>, row: u16, scale_exp: i16) -> CellView {
    let delta_exp = (i32::from(scale_exp) - i32::from(record.header.scale_exp)).max(0) as u32;

    let mut view = match layout {
        RecordLayout::OneColor { .. } => one_color_cell(record.header.num_dots, row, delta_exp),
        RecordLayout::Percent { .. } => record
            .cells
            .get(usize::from(row))
            .map_or(CellView::BACKGROUND, |cell| CellView {
                item: cell.owner(),
                details: cell.details,
            }),
        RecordLayout::DynamicScale { height } => match value_cell_index(height, delta_exp, row) {
            Some(slot) => {
                let cell = record.cells[slot.offset];
                CellView {
                    item: cell.owner(),
                    details: scale_cell_details(cell.details, slot.scale_factor),
                }
            }
            None => CellView::BACKGROUND,
        },
    };

    if row == 0 {
        view.details |= BASELINE;
    }
    view
}

fn one_color_cell(num_dots: u16, row: u16, delta_exp: u32) -> CellView {
    if num_dots == 0 {
        return CellView::BACKGROUND;
    }
    // Ceiling shift: a lit column never rescales to nothing.
    let num_dots = if delta_exp >= 16 {
        1
    } else {
        ((u32::from(num_dots) - 1) >> delta_exp) + 1
    };

    let row_top = (u32::from(row) + 1) * 8;
    if row_top - 8 >= num_dots {
        return CellView::BACKGROUND;
    }
    let mut details = 0xFFu8;
    if row_top > num_dots {
        details <<= (row_top - num_dots) / 2 * 2;
    }
    CellView {
        item: Some(0),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryBuffer;
    use crate::sample::SampleAggregator;
    use crate::scale::record_sample;
    use pretty_assertions::assert_eq;

    fn recorded(layout: RecordLayout, values: &[f64], total: f64) -> HistoryBuffer {
        let mut history = HistoryBuffer::new(layout, 1, 1);
        let aggregate = SampleAggregator::new(total).aggregate(values);
        let mut record = history.push();
        record_sample(&mut record, layout, values, &aggregate);
        history
    }

    fn column(history: &HistoryBuffer, scale_exp: i16) -> Vec<(Option<u8>, u8)> {
        let layout = history.layout();
        let record = history.get(0).unwrap();
        (0..layout.height())
            .map(|row| {
                let view = lookup_cell(layout, record, row, scale_exp);
                (view.item, view.details)
            })
            .collect()
    }

    #[test]
    fn scale_cell_details_levels() {
        assert_eq!(scale_cell_details(0x3C, 1), 0x3C);
        assert_eq!(scale_cell_details(0xFF, 2), 0xF0);
        assert_eq!(scale_cell_details(0x0F, 2), 0x30);
        assert_eq!(scale_cell_details(0x3F, 3), 0x70);
        assert_eq!(scale_cell_details(0xF0, 2), 0xC0);
        assert_eq!(scale_cell_details(0x00, 2), 0x00);
        assert_eq!(scale_cell_details(0xFF, 4), 0xC0);
        assert_eq!(scale_cell_details(0x01, 1 << 20), 0xC0);
        assert_eq!(scale_cell_details(0x00, 8), 0x00);
    }

    #[test]
    fn recorded_scale_reads_back_unchanged() {
        let history = recorded(RecordLayout::DynamicScale { height: 4 }, &[50.0, 0.0], 0.0);
        assert_eq!(
            column(&history, 6),
            vec![(Some(0), 0xFF), (Some(0), 0xFF), (Some(0), 0xFF), (Some(0), 0xC0)]
        );
    }

    #[test]
    fn coarser_views_use_stored_levels() {
        let history = recorded(RecordLayout::DynamicScale { height: 4 }, &[50.0, 0.0], 0.0);
        assert_eq!(
            column(&history, 7),
            vec![(Some(0), 0xFF), (Some(0), 0xFC), (None, 0x00), (None, 0x00)]
        );
        // Level 3 is not stored for four rows; level 2's cell is halved.
        assert_eq!(
            column(&history, 9),
            vec![(Some(0), 0xF0), (None, 0x00), (None, 0x00), (None, 0x00)]
        );
    }

    #[test]
    fn rescaled_lookup_matches_scale_cell_details() {
        for height in [1u16, 2, 3, 4, 6, 8] {
            let layout = RecordLayout::DynamicScale { height };
            let history = recorded(layout, &[7.0, 11.0, 5.0], 0.0);
            let record = history.get(0).unwrap();
            let max_level = u32::BITS - u32::from(height).leading_zeros() + 2;
            for delta in 0..=max_level {
                let scale_exp = record.header.scale_exp + delta as i16;
                for row in 0..height {
                    let view = lookup_cell(layout, record, row, scale_exp);
                    let expected = match value_cell_index(height, delta, row) {
                        Some(slot) => {
                            let cell = record.cells[slot.offset];
                            scale_cell_details(cell.details, slot.scale_factor)
                        }
                        None => 0x00,
                    };
                    let expected = if row == 0 { expected | BASELINE } else { expected };
                    assert_eq!(view.details, expected, "height {height} delta {delta} row {row}");
                }
            }
        }
    }

    #[test]
    fn zero_column_is_background_with_baseline() {
        for layout in [
            RecordLayout::DynamicScale { height: 4 },
            RecordLayout::Percent { height: 4 },
            RecordLayout::OneColor { height: 4 },
        ] {
            let total = if layout.is_percent() { 100.0 } else { 0.0 };
            let history = recorded(layout, &[0.0, 0.0, 0.0], total);
            assert_eq!(
                column(&history, 0),
                vec![(None, BASELINE), (None, 0x00), (None, 0x00), (None, 0x00)],
                "{layout:?}"
            );
        }
    }

    #[test]
    fn one_color_rescales_with_ceiling_shift() {
        let history = recorded(RecordLayout::OneColor { height: 4 }, &[50.0], 0.0);
        assert_eq!(
            column(&history, 6),
            vec![(Some(0), 0xFF), (Some(0), 0xFF), (Some(0), 0xFF), (Some(0), 0xC0)]
        );
        assert_eq!(
            column(&history, 7),
            vec![(Some(0), 0xFF), (Some(0), 0xFC), (None, 0x00), (None, 0x00)]
        );
        // However far out, a lit sample keeps one dot.
        assert_eq!(
            column(&history, 30),
            vec![(Some(0), 0xC0), (None, 0x00), (None, 0x00), (None, 0x00)]
        );
    }

    #[test]
    fn percent_cells_ignore_scale() {
        let history = recorded(RecordLayout::Percent { height: 4 }, &[30.0, 10.0], 100.0);
        let expected = vec![(Some(0), 0xFF), (Some(1), 0x3C), (None, 0x00), (None, 0x00)];
        assert_eq!(column(&history, 0), expected);
        assert_eq!(column(&history, 12), expected);
    }
}
