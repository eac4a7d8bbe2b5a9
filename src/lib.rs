//! smon - Live terminal dashboard for Slurm clusters
//!
//! The crate is split along the data path: [`slurm`] runs the external
//! commands, [`parser`] turns their text into [`models`] records, [`store`]
//! holds the current [`models::Snapshot`], [`scheduler`] drives sampling and
//! job commands in the background, and [`tui`] renders it all. [`display`]
//! serves the one-shot CLI commands.

pub mod display;
pub mod error;
pub mod filter;
pub mod fixtures;
pub mod formatting;
pub mod models;
pub mod parser;
pub mod scheduler;
pub mod slurm;
pub mod store;
pub mod tui;
