//! Bytecode runtime: values, chunks, class images, and the VM

pub mod chunk;
pub mod image;
pub mod object;
pub mod opcode;
pub mod value;
pub mod vm;

pub use chunk::Chunk;
pub use image::{ClassImage, MethodImage};
pub use object::Instance;
pub use opcode::OpCode;
pub use value::Value;
pub use vm::{RuntimeError, Vm};
