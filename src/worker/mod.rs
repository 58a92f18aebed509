pub mod channel;
pub mod control;
pub mod launcher;
pub mod signals;
