//! Small cli/daemon that reminds you to book your working hours in MOCO and lets you book them
//! from the terminal.
//!

pub mod booking;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod moco;
pub mod reminder;
pub mod storage;
pub mod utils;
