// Domain layer - Pure models with no I/O
pub mod command_log;
pub mod gauge;
pub mod reading;
pub mod series;
pub mod window;
