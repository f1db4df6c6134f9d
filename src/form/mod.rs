//! The climatological form: a fixed 53×49 grid with one row per day, decade
//! subtotals, and monthly total and mean rows.

mod aggregate;
pub mod columns;
pub mod generator;
pub mod grid;
pub mod layout;
pub mod template;
