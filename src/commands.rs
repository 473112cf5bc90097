//! Implementation of wdlparse CLI commands.

pub mod config;
pub mod diagram;
pub mod info;
pub mod parse;
