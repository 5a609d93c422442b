//! Column sizing and strategy selection.

use super::types::{CELL_PADDING, MIN_WRAP_WIDTH, TableStrategy, grid_width};

/// Chosen layout for a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Grid with these content widths per column
    Grid(Vec<usize>),
    List,
}

impl Layout {
    pub fn strategy(&self) -> TableStrategy {
        match self {
            Self::Grid(_) => TableStrategy::Grid,
            Self::List => TableStrategy::List,
        }
    }
}

/// Picks grid or list and sizes grid columns.
///
/// Tables wider than `budget` with more than two columns fall back to a
/// list. Otherwise each column gets
/// `max(min(natural, cap), min(natural, MIN_WRAP_WIDTH))`: it is clamped into
/// `[MIN_WRAP_WIDTH, min(natural, cap)]`, and a column whose natural width is
/// below [`MIN_WRAP_WIDTH`] keeps its natural width instead of being padded
/// out to the floor.
pub fn compute_layout(natural: &[usize], budget: usize) -> Layout {
    let columns = natural.len();
    if columns == 0 {
        return Layout::Grid(Vec::new());
    }
    if grid_width(natural) > budget && columns > 2 {
        return Layout::List;
    }

    let chrome = (2 * CELL_PADDING + 1) * columns + 1;
    let cap = budget.saturating_sub(chrome) / columns;
    Layout::Grid(
        natural
            .iter()
            .map(|&n| n.min(cap).max(n.min(MIN_WRAP_WIDTH)))
            .collect(),
    )
}
