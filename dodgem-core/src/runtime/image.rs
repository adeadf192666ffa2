//! Compiled class images, the unit the binary format encodes

use super::chunk::Chunk;

/// Fully compiled class: the in-memory form of one `.dgc` artifact
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassImage {
    /// Fully-qualified name, e.g. `com.stellariver.dodgem.Student`;
    /// nested classes use `Outer$Inner`
    pub fqn: String,
    /// Declared field names, in declaration order
    pub fields: Vec<String>,
    pub ctor: Option<MethodImage>,
    pub methods: Vec<MethodImage>,
}

impl ClassImage {
    /// Simple (unqualified) class name
    pub fn simple_name(&self) -> &str {
        self.fqn.rsplit('.').next().unwrap_or(&self.fqn)
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodImage> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Compiled method body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodImage {
    pub name: String,
    pub arity: u8,
    /// Local slot count; parameters occupy the first `arity` slots
    pub local_count: u8,
    pub chunk: Chunk,
}
