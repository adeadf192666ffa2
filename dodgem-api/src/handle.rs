//! Handles over loaded classes and constructed instances

use std::sync::Arc;

use dodgem_config::LimitConfig;
use dodgem_core::{DiagnosticReport, Instance, LoadedClass, TypeId, Value, Vm};
use dodgem_log::Logger;

use crate::error::InvocationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Constructor,
    Method,
}

/// One reflected member of a loaded class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub kind: MemberKind,
    pub name: String,
    /// Parameter count for constructors and methods
    pub arity: Option<u8>,
}

/// Result of one method invocation
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeOutput {
    pub value: Value,
    /// Everything the invocation printed
    pub stdout: String,
}

/// A class resolved through the pipeline, ready to construct and invoke
#[derive(Debug)]
pub struct TypeHandle {
    class: LoadedClass,
    limits: LimitConfig,
    logger: Arc<Logger>,
    warnings: DiagnosticReport,
}

impl TypeHandle {
    pub(crate) fn new(
        class: LoadedClass,
        limits: LimitConfig,
        logger: Arc<Logger>,
        warnings: DiagnosticReport,
    ) -> Self {
        Self {
            class,
            limits,
            logger,
            warnings,
        }
    }

    /// Fully-qualified class name
    pub fn name(&self) -> &str {
        self.class.name()
    }

    /// Loader-scoped identity of this class
    pub fn type_id(&self) -> &TypeId {
        self.class.type_id()
    }

    /// Warnings carried over from compilation
    pub fn warnings(&self) -> &DiagnosticReport {
        &self.warnings
    }

    /// Underlying class image, for tooling such as bytecode dumps
    pub fn image(&self) -> &dodgem_core::ClassImage {
        self.class.image()
    }

    /// Reflected members: fields first, then the constructor when one is
    /// declared, then methods, all in declaration order
    pub fn members(&self) -> Vec<MemberInfo> {
        let image = self.class.image();
        let mut members = Vec::new();
        for field in &image.fields {
            members.push(MemberInfo {
                kind: MemberKind::Field,
                name: field.clone(),
                arity: None,
            });
        }
        if let Some(ctor) = &image.ctor {
            members.push(MemberInfo {
                kind: MemberKind::Constructor,
                name: ctor.name.clone(),
                arity: Some(ctor.arity),
            });
        }
        for method in &image.methods {
            members.push(MemberInfo {
                kind: MemberKind::Method,
                name: method.name.clone(),
                arity: Some(method.arity),
            });
        }
        members
    }

    /// Construct an instance, running the declared constructor when there
    /// is one. Classes without a constructor get all fields set to null.
    pub fn construct(&self, args: &[Value]) -> Result<InstanceHandle, InvocationError> {
        let image = self.class.image();
        let instance = Instance::new(image);
        let mut stdout = String::new();
        if let Some(ctor) = &image.ctor {
            if args.len() != ctor.arity as usize {
                return Err(InvocationError::ArityMismatch {
                    method: ctor.name.clone(),
                    expected: ctor.arity,
                    got: args.len(),
                });
            }
            let mut vm = Vm::new(self.limits.clone(), self.logger.clone());
            vm.run_method(image, &instance, ctor, args)?;
            stdout = vm.take_output();
        }
        Ok(InstanceHandle { instance, stdout })
    }

    /// Invoke a method by name on a constructed instance
    pub fn invoke(
        &self,
        handle: &InstanceHandle,
        method: &str,
        args: &[Value],
    ) -> Result<InvokeOutput, InvocationError> {
        let image = self.class.image();
        let target = image
            .find_method(method)
            .ok_or_else(|| InvocationError::NoSuchMethod {
                name: method.to_string(),
            })?;
        if args.len() != target.arity as usize {
            return Err(InvocationError::ArityMismatch {
                method: method.to_string(),
                expected: target.arity,
                got: args.len(),
            });
        }
        let mut vm = Vm::new(self.limits.clone(), self.logger.clone());
        let value = vm.run_method(image, &handle.instance, target, args)?;
        Ok(InvokeOutput {
            value,
            stdout: vm.take_output(),
        })
    }
}

/// A constructed instance plus whatever its constructor printed
pub struct InstanceHandle {
    instance: Instance,
    stdout: String,
}

impl InstanceHandle {
    /// Output printed while the constructor ran
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.instance.get_field(name)
    }
}
