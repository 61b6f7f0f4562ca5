pub mod app;
pub mod classify;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod grouper;
pub mod image;
pub mod output;
pub mod runner;
pub mod utils;
pub mod viewer;

#[cfg(test)]
mod tests;
