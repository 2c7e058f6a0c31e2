pub mod autonomous;
pub mod config;
pub mod drive;
pub mod hal;
pub mod lift;
pub mod messages;
pub mod runtime;
