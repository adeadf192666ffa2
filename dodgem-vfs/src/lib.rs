//! dodgem-vfs - Virtual File System abstraction
//!
//! The compiler pipeline never assumes disk I/O: sources are presented and
//! compiled artifacts are collected through the `VirtualFileSystem` trait.
//! `MemoryFileSystem` keeps everything in process memory; `NativeFileSystem`
//! adapts the host OS for CLI source input.

mod error;
mod memory;
mod native;
#[path = "trait.rs"]
mod vfs_trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use vfs_trait::VirtualFileSystem;
