//! Cell coloring.
//!
//! Every cell keeps the palette slot it was first given, so a reload of the
//! same mask reproduces the same colors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared::CellNum;

/// RGB color
pub type Rgb = [u8; 3];

/// Color of annotations marked for removal (also the merge candidate set)
pub const REMOVAL_COLOR: Rgb = [0, 0, 0];

/// Split seed that keeps its region
pub const HELPER_KEEP_COLOR: Rgb = [255, 255, 255];

/// Split seed whose region is subtracted
pub const HELPER_REMOVE_COLOR: Rgb = [0, 0, 0];

/// Fixed cell palette
pub const PALETTE: [Rgb; 15] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [67, 99, 216],
    [245, 130, 49],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
    [188, 246, 12],
    [250, 190, 190],
    [0, 128, 128],
    [230, 190, 255],
    [154, 99, 36],
    [255, 250, 200],
    [128, 0, 0],
];

/// Color of a palette slot
pub fn color(index: usize) -> Rgb {
    PALETTE[index % PALETTE.len()]
}

/// Remembered palette slot per cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaletteMemory {
    assignments: BTreeMap<CellNum, usize>,
    next_slot: usize,
}

impl PaletteMemory {
    /// Slot for `cell`: the remembered one, or the next slot in rotation
    pub fn assign(&mut self, cell: CellNum) -> usize {
        if let Some(&slot) = self.assignments.get(&cell) {
            return slot;
        }
        let slot = self.next_slot;
        self.next_slot = (self.next_slot + 1) % PALETTE.len();
        self.assignments.insert(cell, slot);
        slot
    }

    pub fn get(&self, cell: CellNum) -> Option<usize> {
        self.assignments.get(&cell).copied()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
