//! Aggregation engine behind the live-event feedback dashboard.
//!
//! Every function in the engine modules is a pure transform over
//! already-fetched rows and never fails: empty inputs produce zeros.
//! `db` and `export` are the two ways of getting those rows.

pub mod dashboard;
pub mod db;
pub mod export;
pub mod filters;
pub mod health;
pub mod impact;
pub mod matrix;
pub mod models;
pub mod rankings;
pub mod report;
pub mod scores;
pub mod segments;

#[cfg(test)]
mod fixtures;
