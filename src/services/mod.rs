pub mod board;
pub mod kv;
pub mod trips;
