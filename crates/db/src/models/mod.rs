//! Row structs and the records built from them.

pub mod category;
pub mod item;
