pub mod args;
pub mod daemon;
pub mod group;
pub mod layout;
pub mod list;
pub mod platform;
pub mod preset;
pub mod send;
pub mod start;
pub mod status;
pub mod stop;
