#![warn(rust_2018_idioms)]

pub mod deal;
pub mod deck;
pub mod error;
pub mod model;
pub mod protocol;
pub mod seats;
pub mod server;
pub mod session;
pub mod trick;

pub use error::Error;

pub const GAME_VERSION: &str = env!("CARGO_PKG_VERSION");
