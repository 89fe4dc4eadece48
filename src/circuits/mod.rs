//! Built-in circuits expressed as template tables.

pub mod sudoku;
