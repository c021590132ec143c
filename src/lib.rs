pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod error;
pub mod locate;
pub mod pipeline;
pub mod process;
pub mod write;
