pub mod push;
pub mod room;
