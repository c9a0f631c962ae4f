pub mod code;
pub mod error;
pub mod record;
pub mod seat;
pub mod table;
