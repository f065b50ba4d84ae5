pub mod aggregate;
pub mod ai;
pub mod args;
mod backup;
pub mod commands;
mod config;
mod error;
pub mod form;
pub mod model;
pub mod render;
pub mod session;
pub mod store;
mod utils;
pub mod view;

#[cfg(test)]
mod test;

pub use ai::Mode;
pub use config::Config;
pub use error::Error;
pub use error::Result;
