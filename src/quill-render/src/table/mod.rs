//! Table Layout Engine
//!
//! Turns accumulated pipe rows into either a boxed grid or, when a table
//! with more than two columns does not fit the width budget, a vertical
//! list of records.
//!
//! ## Example Output
//!
//! ```text
//! ┌──────┬───────┐
//! │ Name │ Value │
//! ├──────┼───────┤
//! │ foo  │ bar   │
//! └──────┴───────┘
//! ```
//!
//! ```text
//! alpha
//!   Size: 10
//!   Notes: a very long note that would not fit the grid
//! ────────────────────────────────────────
//! beta
//!   Size: 12
//! ```

mod layout;
mod parse;
mod render;
#[cfg(test)]
mod tests;
mod types;
mod wrap;

pub use layout::{Layout, compute_layout};
pub use parse::{is_separator, parse_alignments, split_row};
pub use render::{render_grid, render_list, render_table};
pub use types::{
    Alignment, MAX_TABLE_WIDTH, TABLE_MARGIN, Table, TableCell, TableStrategy, grid_width,
    table_budget,
};
pub use wrap::wrap_spans;
