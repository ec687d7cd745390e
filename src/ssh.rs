pub mod client;
pub mod target;
pub mod terminal;
