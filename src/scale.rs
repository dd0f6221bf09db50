//! Multi-zoom record layout and the recording loop.
//!
//! A dynamic-scale record keeps `2 * height - 1` cells. Zoom level `d`
//! (the column drawn against `total * 2^d`) stores row `y` at the 1-based
//! index `(2y + 1) << d`, so every level owns the odd multiples of `2^d`
//! and no two levels collide. The top row of a level is the exception: it
//! points at `(y << (d + 1))` plus the largest power of two that still fits
//! in the array. When that power is smaller than `2^d` the slot belongs to
//! a finer level and the lookup has to coarsen it by `scale_factor`.

use tracing::trace;

use crate::apportion::{Column, Zoom};
use crate::history::{RecordLayout, RecordMut};
use crate::sample::{Aggregate, dots_for};
use crate::utils::{ldexp_saturating, power_of_2_floor};

/// Deepest zoom level the index arithmetic is evaluated at. Coarser views
/// reuse this level with a large enough scale factor.
pub const MAX_DELTA_EXP: u32 = 24;

/// Where a row of a given zoom level lives in a dynamic-scale record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSlot {
    /// 0-based offset into the record's cells.
    pub offset: usize,
    /// How many zoom levels of this row fold into the stored cell, as a
    /// ratio (1 means the stored cell is exact).
    pub scale_factor: u32,
}

/// Maps `(height, zoom level, row)` to a record slot. Rows above the top
/// row of the level are background and have no slot.
pub fn value_cell_index(height: u16, delta_exp: u32, y: u16) -> Option<CellSlot> {
    if height == 0 {
        return None;
    }
    let delta_exp = delta_exp.min(MAX_DELTA_EXP);
    let top_row = (usize::from(height) - 1) >> delta_exp;
    let y = usize::from(y);
    if y > top_row {
        return None;
    }
    if y < top_row {
        return Some(CellSlot {
            offset: ((2 * y + 1) << delta_exp) - 1,
            scale_factor: 1,
        });
    }

    let start = y << (delta_exp + 1);
    let span = power_of_2_floor(2 * usize::from(height) - 1 - start);
    Some(CellSlot {
        offset: start + span - 1,
        scale_factor: ((1usize << delta_exp) / span) as u32,
    })
}

/// Fills a freshly pushed record from one sample.
///
/// One-colour records keep the dot count only. Percent records get a
/// single pass at the fixed total. Dynamic records get one pass per zoom
/// level, each level writing only the slots it owns exactly.
pub fn record_sample(
    record: &mut RecordMut<'_>,
    layout: RecordLayout,
    values: &[f64],
    aggregate: &Aggregate,
) {
    let height = layout.height();
    record.clear();
    record.header.scale_exp = aggregate.scale_exp;
    let num_dots = aggregate.num_dots(height);
    record.header.num_dots = num_dots.min(u32::from(u16::MAX)) as u16;

    trace!(
        scale_exp = aggregate.scale_exp,
        num_dots,
        sum = aggregate.sum,
        "recording sample"
    );

    if matches!(layout, RecordLayout::OneColor { .. }) || !(aggregate.sum > 0.0) {
        return;
    }

    if layout.is_percent() {
        let column = Column::new(values, aggregate.total, height);
        let cells = column.apportion(num_dots, Zoom::Fixed);
        for (slot, cell) in record.cells.iter_mut().zip(cells) {
            *slot = cell;
        }
        return;
    }

    let mut delta_exp = 0u32;
    while (1usize << delta_exp) < 2 * usize::from(height) {
        let scaled_total = ldexp_saturating(aggregate.total, delta_exp as i32);
        if delta_exp > 0 && scaled_total >= f64::MAX {
            break;
        }
        let num_dots = dots_for(aggregate.sum, scaled_total, height);
        let column = Column::new(values, scaled_total, height);
        let cells = column.apportion(num_dots, Zoom::Level(delta_exp));
        for (row, cell) in cells.into_iter().enumerate() {
            let Some(slot) = value_cell_index(height, delta_exp, row as u16) else {
                continue;
            };
            if slot.scale_factor == 1 {
                record.cells[slot.offset] = cell;
            }
        }
        delta_exp += 1;
    }
}

const SCALE_PREFIXES: &[u8; 8] = b"KMGTPEZY";

/// Three-character label for a `2^exp` scale: `"  8"`, `" 1K"`, `"64M"`,
/// or the fraction form `"M/8"` (an eighth of a mega) when the power does
/// not fit in two digits.
pub fn format_scale(exp: i32) -> String {
    if exp > 86 {
        return "inf".to_string();
    }
    if exp < 0 {
        return String::new();
    }
    if exp < 10 {
        return format!("{:3}", 1u32 << exp);
    }
    let (group, rest) = ((exp / 10) as usize, exp % 10);
    if rest <= 6 {
        format!("{:2}{}", 1u32 << rest, SCALE_PREFIXES[group - 1] as char)
    } else {
        format!("{}/{}", SCALE_PREFIXES[group] as char, 1u32 << (10 - rest))
    }
}
