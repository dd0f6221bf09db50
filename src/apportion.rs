//! Splits one column among its items.
//!
//! Items are stacked bottom-up on a continuous axis `height` cells tall.
//! Every cell can show one colour only, so whole cells are handed out with
//! the largest remainder (Hamilton) method: each item gets the floor of its
//! extent, and the cells left over go to the largest fractional parts.
//! Inside a cell the 8-bit mask tells which dots are lit; the blanks at the
//! bottom and top of an item's run line its edges up with its true extent.

use std::cmp::Ordering;

use tracing::trace;

use crate::history::ColorCell;

/// Column geometry for one zoom level.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub values: &'a [f64],
    pub scaled_total: f64,
    pub height: u16,
}

/// Which zoom level a pass paints, used for the coarsened top cell rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zoom {
    /// Percent chart: a single fixed scale.
    Fixed,
    /// Dynamic chart drawn at `total * 2^delta_exp`.
    Level(u32),
}

/// One item's share of the column.
#[derive(Debug, Clone, Copy)]
struct Share {
    item: u8,
    bottom: f64,
    top: f64,
    whole: u32,
    remainder: f64,
    extra: bool,
}

impl Share {
    fn area(&self) -> f64 {
        self.top - self.bottom
    }
}

fn blanks_for(remainder: f64) -> u32 {
    (((1.0 - remainder) * 8.0) as u32) % 8
}

impl<'a> Column<'a> {
    pub fn new(values: &'a [f64], scaled_total: f64, height: u16) -> Self {
        Self {
            values,
            scaled_total,
            height,
        }
    }

    fn position(&self, sum: f64) -> f64 {
        (sum / self.scaled_total) * f64::from(self.height)
    }

    fn last_positive_item(&self) -> Option<u8> {
        self.values.iter().rposition(|&v| v > 0.0).map(|i| i as u8)
    }

    /// Walks the positive items in order with their cumulative extents.
    /// Stops once the running sum saturates.
    fn for_each_extent(&self, last: u8, mut f: impl FnMut(u8, f64, f64)) {
        let mut sum = 0.0;
        let mut bottom = 0.0;
        for (i, &value) in self.values.iter().enumerate().take(usize::from(last) + 1) {
            if sum >= f64::MAX {
                break;
            }
            if !(value > 0.0) {
                continue;
            }
            sum += value;
            if !(sum <= f64::MAX) {
                sum = f64::MAX;
            }
            let top = self.position(sum);
            f(i as u8, bottom, top);
            bottom = top;
        }
    }

    /// Owner of the partially filled top cell: the item covering the
    /// largest part of it. Ties go to the higher index.
    pub fn top_cell_item(&self, top_cell: u32) -> Option<u8> {
        let last = self.last_positive_item()?;
        let cell_bottom = f64::from(top_cell);
        let cell_top = cell_bottom + 1.0;
        let mut owner = None;
        let mut max_area = 0.0;
        self.for_each_extent(last, |item, bottom, top| {
            if top > cell_bottom {
                let area = top.min(cell_top) - bottom.max(cell_bottom);
                if area >= max_area {
                    owner = Some(item);
                    max_area = area;
                }
            }
        });
        owner
    }

    /// Paints the column for `num_dots` lit dots (1 to `8 * height`).
    ///
    /// Returns the cells from the bottom up; exactly `ceil(num_dots / 8)`
    /// of them. An all-background column yields an empty vector.
    pub fn apportion(&self, num_dots: u32, zoom: Zoom) -> Vec<ColorCell> {
        let max_dots = u32::from(self.height) * 8;
        debug_assert!(num_dots > 0 && num_dots <= max_dots);
        let num_dots = num_dots.clamp(1, max_dots.max(1));

        let Some(last_item) = self.last_positive_item() else {
            return Vec::new();
        };

        // The top cell is settled first: its owner is fixed and the area it
        // lights is taken out of the owner's share before the rest is split.
        let top_cell = (num_dots - 1) / 8;
        let blanks_at_top = (8 + top_cell * 8 - num_dots) / 2 * 2;
        let coarsened = match zoom {
            Zoom::Fixed => false,
            // Full at this zoom, but half of a partial cell at the next one.
            Zoom::Level(d) => {
                top_cell == (u32::from(self.height) - 1) >> d.min(31) && top_cell % 2 == 0
            }
        };
        let (top_item, top_area) = if blanks_at_top > 0 || coarsened {
            let owner = self.top_cell_item(top_cell).unwrap_or(last_item);
            (owner, f64::from(8 - blanks_at_top) / 8.0)
        } else {
            (last_item, 0.0)
        };
        let num_cells = top_cell + 1;

        let mut shares = self.shares(top_item, top_area);
        let reserved = u32::from(top_area > 0.0 && shares.iter().any(|s| s.item == top_item));
        let base: u32 = shares.iter().map(|s| s.whole).sum::<u32>() + reserved;
        award_extra_cells(&mut shares, num_cells.saturating_sub(base) as usize);

        let mut cells = paint(&shares, num_cells, blanks_at_top, top_item, top_area);

        if cells.len() < num_cells as usize {
            // Rounding left the stack short of the target; extend the last
            // painted run so the column still reaches its height.
            trace!(
                painted = cells.len(),
                target = num_cells,
                "padding apportioned column"
            );
            let item = cells.last().map_or(top_item, |c| c.item);
            if let Some(last) = cells.last_mut() {
                last.details = 0xFF;
            }
            while cells.len() < num_cells as usize {
                cells.push(ColorCell::new(item, 0xFF));
            }
            if let Some(last) = cells.last_mut() {
                last.details &= 0xFFu8 << blanks_at_top;
            }
        }

        debug_assert_eq!(cells.len(), num_cells as usize);
        cells
    }

    fn shares(&self, top_item: u8, top_area: f64) -> Vec<Share> {
        let mut shares = Vec::new();
        self.for_each_extent(top_item, |item, bottom, top| {
            let mut remainder = top - bottom;
            if item == top_item {
                remainder -= top_area;
                if !(remainder >= 0.0) {
                    remainder = 0.0;
                }
            }
            let whole = remainder as u32;
            shares.push(Share {
                item,
                bottom,
                top,
                whole,
                remainder: remainder - f64::from(whole),
                extra: false,
            });
        });
        shares
    }
}

/// Hands `count` leftover cells to the largest remainders. Equal
/// remainders favour items holding fewer whole cells, then lower indices.
fn award_extra_cells(shares: &mut [Share], count: usize) {
    let mut ranking: Vec<usize> = (0..shares.len()).collect();
    ranking.sort_by(|&a, &b| {
        let (a, b) = (&shares[a], &shares[b]);
        b.remainder
            .partial_cmp(&a.remainder)
            .unwrap_or(Ordering::Equal)
            .then(a.whole.cmp(&b.whole))
            .then(a.item.cmp(&b.item))
    });
    for &index in ranking.iter().take(count) {
        shares[index].extra = true;
    }
}

/// Lays the shares out bottom-up and builds each cell's mask.
fn paint(
    shares: &[Share],
    num_cells: u32,
    blanks_at_top: u32,
    top_item: u8,
    top_area: f64,
) -> Vec<ColorCell> {
    let mut cells = Vec::with_capacity(num_cells as usize);
    let mut painted = 0u32;

    for share in shares {
        let mut n = share.whole + u32::from(share.extra);
        let mut remainder = if share.extra { share.remainder } else { 0.0 };

        let mut blanks_at_end = 0;
        if share.item == top_item && top_area > 0.0 {
            n += 1;
            if share.area() < top_area {
                // Too thin to fill its part of the top cell; show at least
                // a quarter of it.
                remainder = share.area().max(0.25);
                blanks_at_end = blanks_at_top;
            }
        } else if painted + n >= num_cells {
            blanks_at_end = 0;
        } else if painted == 0 || share.bottom <= f64::from(painted) {
            blanks_at_end = blanks_for(remainder);
        } else if f64::from(painted + n) > share.top {
            blanks_at_end = ((f64::from(painted + n) - share.top) * 8.0) as u32;
        }

        let mut blanks_at_start = if painted > 0 {
            blanks_for(remainder).saturating_sub(blanks_at_end)
        } else {
            0
        };

        while n > 0 && painted < num_cells {
            let mut details = 0xFFu8;
            if blanks_at_start > 0 {
                details >>= blanks_at_start.min(7);
                blanks_at_start = 0;
            }
            if painted == num_cells - 1 {
                details &= 0xFFu8 << blanks_at_top;
            } else if n == 1 {
                details &= 0xFFu8 << blanks_at_end.min(7);
            }
            cells.push(ColorCell::new(share.item, details));
            n -= 1;
            painted += 1;
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cells(list: &[(u8, u8)]) -> Vec<ColorCell> {
        list.iter().map(|&(i, d)| ColorCell::new(i, d)).collect()
    }

    fn lit_dots(cells: &[ColorCell]) -> u32 {
        cells.iter().map(|c| c.details.count_ones()).sum()
    }

    fn dots(sum: f64, total: f64, height: u16) -> u32 {
        crate::sample::dots_for(sum, total, height)
    }

    #[test]
    fn percent_two_items_thin_top_item() {
        let values = [30.0, 10.0];
        let column = Column::new(&values, 100.0, 4);
        assert_eq!(dots(40.0, 100.0, 4), 13);
        assert_eq!(column.top_cell_item(1), Some(1));
        assert_eq!(
            column.apportion(13, Zoom::Fixed),
            cells(&[(0, 0xFF), (1, 0x3C)])
        );
    }

    #[test]
    fn single_item_fills_from_bottom() {
        let values = [50.0, 0.0];
        let column = Column::new(&values, 64.0, 4);
        assert_eq!(
            column.apportion(25, Zoom::Level(0)),
            cells(&[(0, 0xFF), (0, 0xFF), (0, 0xFF), (0, 0xC0)])
        );

        let column = Column::new(&values, 128.0, 4);
        assert_eq!(
            column.apportion(13, Zoom::Level(1)),
            cells(&[(0, 0xFF), (0, 0xFC)])
        );

        let column = Column::new(&values, 256.0, 4);
        assert_eq!(column.apportion(7, Zoom::Level(2)), cells(&[(0, 0xFF)]));
    }

    #[test]
    fn single_item_lights_num_dots_rounded_to_pairs() {
        for height in [1u16, 2, 3, 4, 6, 8] {
            for step in 1..=40 {
                let value = f64::from(step) * 0.025;
                let values = [0.0, value];
                let num_dots = dots(value, 1.0, height);
                let painted = Column::new(&values, 1.0, height).apportion(num_dots, Zoom::Fixed);
                assert_eq!(painted.len() as u32, num_dots.div_ceil(8));
                let lit = lit_dots(&painted);
                assert!(lit == num_dots || lit == num_dots + 1, "{lit} vs {num_dots}");
                assert!(painted.iter().all(|c| c.item == 1));
            }
        }
    }

    #[test]
    fn cell_count_matches_dots_for_many_columns() {
        let patterns: [&[f64]; 6] = [
            &[1.0, 1.0, 1.0],
            &[5.0, 0.0, 3.0, 2.0],
            &[0.1, 7.3, 0.4, 0.2],
            &[3.0, 3.0, 3.0, 3.0, 3.0],
            &[12.0, -1.0, 0.5],
            &[0.01, 0.02, 0.03, 9.0],
        ];
        for values in patterns {
            let sum = crate::sample::compute_sum(values);
            let items = values.iter().filter(|v| **v > 0.0).count() as u32;
            for height in [1u16, 2, 3, 4, 6, 8] {
                for total in [sum, sum * 1.3, sum * 2.0, sum * 3.7, sum * 16.0] {
                    let num_dots = dots(sum, total, height);
                    let painted =
                        Column::new(values, total, height).apportion(num_dots, Zoom::Fixed);
                    assert_eq!(painted.len() as u32, num_dots.div_ceil(8));
                    // Blanks at a boundary between two items lose less than
                    // one cell each.
                    let lit = lit_dots(&painted);
                    assert!(lit <= num_dots + 1, "{values:?} h={height} lit={lit}");
                    assert!(
                        lit + 8 * (items - 1) >= num_dots,
                        "{values:?} h={height} lit={lit} dots={num_dots}"
                    );
                    for cell in &painted {
                        assert!(values[usize::from(cell.item)] > 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn apportion_is_deterministic() {
        let values = [3.0, 3.0, 3.0, 1.0];
        let column = Column::new(&values, 16.0, 4);
        let first = column.apportion(dots(10.0, 16.0, 4), Zoom::Level(0));
        assert_eq!(first, cells(&[(0, 0xFC), (1, 0xFC), (3, 0x30)]));
        for _ in 0..10 {
            assert_eq!(column.apportion(dots(10.0, 16.0, 4), Zoom::Level(0)), first);
        }
    }

    #[test]
    fn equal_remainders_favor_lower_items() {
        // Extents 1.5, 1.5 and 1.0: one spare cell, two half remainders.
        let values = [1.5, 1.5, 1.0];
        let column = Column::new(&values, 4.0, 4);
        assert_eq!(
            column.apportion(32, Zoom::Fixed),
            cells(&[(0, 0xFF), (0, 0xF0), (1, 0xFF), (2, 0xFF)])
        );
    }

    #[test]
    fn equal_remainders_favor_fewer_cells() {
        // Extents 2.5, 0.5 and 1.0: the thin item wins the spare cell.
        let values = [2.5, 0.5, 1.0];
        let column = Column::new(&values, 4.0, 4);
        assert_eq!(
            column.apportion(32, Zoom::Fixed),
            cells(&[(0, 0xFF), (0, 0xFF), (1, 0x0F), (2, 0xFF)])
        );
    }

    #[test]
    fn growing_item_never_loses_cells() {
        for height in [2u16, 4, 6] {
            let mut previous = 0;
            for step in 0..=60 {
                let values = [f64::from(step), 20.0];
                let sum = f64::from(step) + 20.0;
                let num_dots = dots(sum, 100.0, height);
                let painted = Column::new(&values, 100.0, height).apportion(num_dots, Zoom::Fixed);
                let owned = painted.iter().filter(|c| c.item == 0).count();
                assert!(owned >= previous, "step {step}: {owned} < {previous}");
                previous = owned;
            }
        }
    }

    #[test]
    fn no_positive_values_paints_nothing() {
        let values = [0.0, -3.0, f64::NAN];
        let column = Column::new(&values, 1.0, 4);
        assert_eq!(column.top_cell_item(0), None);
        assert!(column.apportion(1, Zoom::Fixed).is_empty());
    }

    #[test]
    fn tiny_value_still_gets_a_quarter_cell() {
        let values = [1.0e-9];
        let column = Column::new(&values, 1.0, 4);
        assert_eq!(column.apportion(1, Zoom::Fixed), cells(&[(0, 0xC0)]));
    }

    #[test]
    fn saturated_sum_fills_column() {
        let values = [f64::MAX, f64::MAX, 1.0];
        let column = Column::new(&values, f64::MAX, 2);
        let painted = column.apportion(16, Zoom::Level(0));
        assert_eq!(painted.len(), 2);
        assert!(painted.iter().all(|c| c.item == 0 && c.details == 0xFF));
    }
}
