//! Bytecode virtual machine
//!
//! Methods execute on a per-frame operand stack; method-to-method calls on
//! the same instance recurse through [`Vm::call`]. `print` output is
//! captured into an internal buffer instead of going to process stdout, so
//! embedders decide what to do with it.

use std::sync::Arc;

use dodgem_config::{LimitConfig, Phase};
use dodgem_log::{trace, Logger};
use thiserror::Error;

use super::image::{ClassImage, MethodImage};
use super::object::Instance;
use super::opcode::OpCode;
use super::value::Value;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("Operand stack overflow (limit {limit})")]
    StackOverflow { limit: usize },
    #[error("Call depth exceeded (limit {limit})")]
    CallDepthExceeded { limit: usize },
    #[error("[line {line}] Undefined field '{name}'")]
    UndefinedField { name: String, line: usize },
    #[error("[line {line}] Undefined method '{name}'")]
    UndefinedMethod { name: String, line: usize },
    #[error("Method '{method}' expects {expected} arguments, got {got}")]
    ArityMismatch {
        method: String,
        expected: u8,
        got: usize,
    },
    #[error("[line {line}] {message}")]
    TypeMismatch { message: String, line: usize },
    #[error("[line {line}] Division by zero")]
    DivisionByZero { line: usize },
    #[error("Invalid bytecode: {0}")]
    InvalidBytecode(String),
}

pub struct Vm {
    output: String,
    limits: LimitConfig,
    logger: Arc<Logger>,
}

impl Vm {
    pub fn new(limits: LimitConfig, logger: Arc<Logger>) -> Self {
        Self {
            output: String::new(),
            limits,
            logger,
        }
    }

    /// Run one method on an instance. Captured `print` output accumulates
    /// until [`Vm::take_output`] is called.
    pub fn run_method(
        &mut self,
        image: &ClassImage,
        instance: &Instance,
        method: &MethodImage,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        self.call(image, instance, method, args, 0)
    }

    /// Drain the captured `print` output
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    fn call(
        &mut self,
        image: &ClassImage,
        instance: &Instance,
        method: &MethodImage,
        args: &[Value],
        depth: usize,
    ) -> Result<Value, RuntimeError> {
        if depth >= self.limits.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded {
                limit: self.limits.max_call_depth,
            });
        }
        if args.len() != method.arity as usize {
            return Err(RuntimeError::ArityMismatch {
                method: method.name.clone(),
                expected: method.arity,
                got: args.len(),
            });
        }
        trace!(
            self.logger,
            target: Phase::Vm.target(),
            "call {}.{} depth={depth}",
            image.simple_name(),
            method.name
        );

        let chunk = &method.chunk;
        let code = &chunk.code;
        let mut locals = vec![Value::Null; method.local_count as usize];
        if args.len() > locals.len() {
            return Err(RuntimeError::InvalidBytecode(format!(
                "method '{}' declares arity {} but only {} local slot(s)",
                method.name, method.arity, method.local_count
            )));
        }
        locals[..args.len()].clone_from_slice(args);
        let mut stack: Vec<Value> = Vec::new();
        let mut ip = 0usize;

        macro_rules! pop {
            () => {
                stack
                    .pop()
                    .ok_or_else(|| RuntimeError::InvalidBytecode("stack underflow".to_string()))?
            };
        }

        while ip < code.len() {
            let op_offset = ip;
            let line = chunk.line_for(op_offset);
            let op = OpCode::from_u8(code[ip]).ok_or_else(|| {
                RuntimeError::InvalidBytecode(format!("unknown opcode {:#04x}", code[ip]))
            })?;
            ip += 1;

            match op {
                OpCode::Constant => {
                    let index = read_u8(code, &mut ip)?;
                    let value = chunk.constants.get(index as usize).cloned().ok_or_else(
                        || RuntimeError::InvalidBytecode(format!("constant index {index}")),
                    )?;
                    push(&mut stack, value, &self.limits)?;
                }
                OpCode::Null => push(&mut stack, Value::Null, &self.limits)?,
                OpCode::True => push(&mut stack, Value::Bool(true), &self.limits)?,
                OpCode::False => push(&mut stack, Value::Bool(false), &self.limits)?,
                OpCode::Pop => {
                    pop!();
                }
                OpCode::GetLocal => {
                    let slot = read_u8(code, &mut ip)? as usize;
                    let value = locals.get(slot).cloned().ok_or_else(|| {
                        RuntimeError::InvalidBytecode(format!("local slot {slot}"))
                    })?;
                    push(&mut stack, value, &self.limits)?;
                }
                OpCode::SetLocal => {
                    let slot = read_u8(code, &mut ip)? as usize;
                    let value = pop!();
                    let target = locals.get_mut(slot).ok_or_else(|| {
                        RuntimeError::InvalidBytecode(format!("local slot {slot}"))
                    })?;
                    *target = value;
                }
                OpCode::GetField => {
                    let name = self.string_constant(chunk, code, &mut ip)?;
                    let value = instance.get_field(&name).ok_or_else(|| {
                        RuntimeError::UndefinedField { name: name.clone(), line }
                    })?;
                    push(&mut stack, value, &self.limits)?;
                }
                OpCode::SetField => {
                    let name = self.string_constant(chunk, code, &mut ip)?;
                    let value = pop!();
                    if !instance.set_field(&name, value) {
                        return Err(RuntimeError::UndefinedField { name, line });
                    }
                }
                OpCode::Add => {
                    let rhs = pop!();
                    let lhs = pop!();
                    push(&mut stack, add_values(lhs, rhs, line)?, &self.limits)?;
                }
                OpCode::Subtract | OpCode::Multiply | OpCode::Divide => {
                    let rhs = pop!();
                    let lhs = pop!();
                    push(&mut stack, arith(op, lhs, rhs, line)?, &self.limits)?;
                }
                OpCode::Negate => {
                    let value = pop!();
                    let negated = match value {
                        Value::Int(i) => Value::Int(-i),
                        Value::Float(v) => Value::Float(-v),
                        other => {
                            return Err(RuntimeError::TypeMismatch {
                                message: format!("Cannot negate {}", other.type_name()),
                                line,
                            })
                        }
                    };
                    push(&mut stack, negated, &self.limits)?;
                }
                OpCode::Not => {
                    let value = pop!();
                    push(&mut stack, Value::Bool(!value.is_truthy()), &self.limits)?;
                }
                OpCode::Equal => {
                    let rhs = pop!();
                    let lhs = pop!();
                    push(&mut stack, Value::Bool(values_equal(&lhs, &rhs)), &self.limits)?;
                }
                OpCode::NotEqual => {
                    let rhs = pop!();
                    let lhs = pop!();
                    push(
                        &mut stack,
                        Value::Bool(!values_equal(&lhs, &rhs)),
                        &self.limits,
                    )?;
                }
                OpCode::Greater | OpCode::GreaterEqual | OpCode::Less | OpCode::LessEqual => {
                    let rhs = pop!();
                    let lhs = pop!();
                    push(&mut stack, compare(op, lhs, rhs, line)?, &self.limits)?;
                }
                OpCode::Jump => {
                    let distance = read_i16(code, &mut ip)?;
                    ip = jump_forward(ip, distance)?;
                }
                OpCode::JumpIfFalse => {
                    let distance = read_i16(code, &mut ip)?;
                    let condition = stack.last().ok_or_else(|| {
                        RuntimeError::InvalidBytecode("stack underflow".to_string())
                    })?;
                    if !condition.is_truthy() {
                        ip = jump_forward(ip, distance)?;
                    }
                }
                OpCode::JumpBack => {
                    let distance = read_i16(code, &mut ip)?;
                    ip = ip.checked_sub(distance as usize).ok_or_else(|| {
                        RuntimeError::InvalidBytecode("backward jump before start".to_string())
                    })?;
                }
                OpCode::Print => {
                    let value = pop!();
                    self.output.push_str(&value.to_string());
                    self.output.push('\n');
                }
                OpCode::Invoke => {
                    let name = self.string_constant(chunk, code, &mut ip)?;
                    let argc = read_u8(code, &mut ip)? as usize;
                    let mut call_args = Vec::with_capacity(argc);
                    for _ in 0..argc {
                        call_args.push(pop!());
                    }
                    call_args.reverse();
                    let callee = image.find_method(&name).ok_or_else(|| {
                        RuntimeError::UndefinedMethod { name: name.clone(), line }
                    })?;
                    let result = self.call(image, instance, callee, &call_args, depth + 1)?;
                    push(&mut stack, result, &self.limits)?;
                }
                OpCode::Return => return Ok(Value::Null),
                OpCode::ReturnValue => return Ok(pop!()),
            }
        }

        Ok(Value::Null)
    }

    fn string_constant(
        &self,
        chunk: &super::chunk::Chunk,
        code: &[u8],
        ip: &mut usize,
    ) -> Result<String, RuntimeError> {
        let index = read_u8(code, ip)?;
        match chunk.constants.get(index as usize) {
            Some(Value::Str(s)) => Ok(s.clone()),
            Some(other) => Err(RuntimeError::InvalidBytecode(format!(
                "expected string constant at index {index}, found {}",
                other.type_name()
            ))),
            None => Err(RuntimeError::InvalidBytecode(format!(
                "constant index {index}"
            ))),
        }
    }
}

fn push(stack: &mut Vec<Value>, value: Value, limits: &LimitConfig) -> Result<(), RuntimeError> {
    if stack.len() >= limits.max_stack_size {
        return Err(RuntimeError::StackOverflow {
            limit: limits.max_stack_size,
        });
    }
    stack.push(value);
    Ok(())
}

fn read_u8(code: &[u8], ip: &mut usize) -> Result<u8, RuntimeError> {
    let byte = code
        .get(*ip)
        .copied()
        .ok_or_else(|| RuntimeError::InvalidBytecode("truncated operand".to_string()))?;
    *ip += 1;
    Ok(byte)
}

fn read_i16(code: &[u8], ip: &mut usize) -> Result<i16, RuntimeError> {
    if *ip + 2 > code.len() {
        return Err(RuntimeError::InvalidBytecode("truncated operand".to_string()));
    }
    let value = i16::from_le_bytes([code[*ip], code[*ip + 1]]);
    *ip += 2;
    Ok(value)
}

fn jump_forward(ip: usize, distance: i16) -> Result<usize, RuntimeError> {
    usize::try_from(ip as i64 + distance as i64)
        .map_err(|_| RuntimeError::InvalidBytecode("jump before start".to_string()))
}

/// `+` concatenates when either side is a string, otherwise adds numbers
fn add_values(lhs: Value, rhs: Value, line: usize) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Str(a), b) => Ok(Value::Str(format!("{a}{b}"))),
        (a, Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(b))),
        (a, b) => match as_floats(&a, &b) {
            Some((x, y)) => Ok(Value::Float(x + y)),
            None => Err(RuntimeError::TypeMismatch {
                message: format!("Cannot add {} and {}", a.type_name(), b.type_name()),
                line,
            }),
        },
    }
}

fn arith(op: OpCode, lhs: Value, rhs: Value, line: usize) -> Result<Value, RuntimeError> {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        return match op {
            OpCode::Subtract => Ok(Value::Int(a.wrapping_sub(*b))),
            OpCode::Multiply => Ok(Value::Int(a.wrapping_mul(*b))),
            OpCode::Divide => {
                if *b == 0 {
                    Err(RuntimeError::DivisionByZero { line })
                } else {
                    Ok(Value::Int(a.wrapping_div(*b)))
                }
            }
            _ => unreachable!("arith called with non-arithmetic opcode"),
        };
    }
    match as_floats(&lhs, &rhs) {
        Some((a, b)) => match op {
            OpCode::Subtract => Ok(Value::Float(a - b)),
            OpCode::Multiply => Ok(Value::Float(a * b)),
            OpCode::Divide => Ok(Value::Float(a / b)),
            _ => unreachable!("arith called with non-arithmetic opcode"),
        },
        None => Err(RuntimeError::TypeMismatch {
            message: format!(
                "Cannot apply {} to {} and {}",
                op.name(),
                lhs.type_name(),
                rhs.type_name()
            ),
            line,
        }),
    }
}

fn compare(op: OpCode, lhs: Value, rhs: Value, line: usize) -> Result<Value, RuntimeError> {
    let ordering = match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (a, b) => match as_floats(a, b) {
            Some((x, y)) => x.partial_cmp(&y),
            None => None,
        },
    };
    let Some(ordering) = ordering else {
        return Err(RuntimeError::TypeMismatch {
            message: format!(
                "Cannot compare {} and {}",
                lhs.type_name(),
                rhs.type_name()
            ),
            line,
        });
    };
    let result = match op {
        OpCode::Greater => ordering.is_gt(),
        OpCode::GreaterEqual => ordering.is_ge(),
        OpCode::Less => ordering.is_lt(),
        OpCode::LessEqual => ordering.is_le(),
        _ => unreachable!("compare called with non-comparison opcode"),
    };
    Ok(Value::Bool(result))
}

fn as_floats(lhs: &Value, rhs: &Value) -> Option<(f64, f64)> {
    let promote = |value: &Value| match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(v) => Some(*v),
        _ => None,
    };
    Some((promote(lhs)?, promote(rhs)?))
}

/// Equality promotes int/float pairs, everything else uses structural
/// equality
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        (a, b) => a == b,
    }
}
