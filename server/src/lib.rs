#![warn(rust_2018_idioms)]

mod server;
pub mod settings;

pub use server::{make_guard, run, ClientHandle, Guard, State, Stats};
