//! Binary artifact format for compiled classes (`.dgc`)

pub mod header;
pub mod reader;
pub mod writer;

pub use reader::{decode_class, ReadError};
pub use writer::encode_class;
