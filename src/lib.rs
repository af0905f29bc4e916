pub mod common;
pub mod output;
pub mod runtime;
pub mod server;
pub mod transport;
pub mod utils;
