//! Class image encoder
//!
//! Body layout, all integers little-endian:
//! - fqn: u16 length + utf8
//! - fields: u16 count, each a u16-length string
//! - ctor: u8 presence flag, then a method record when set
//! - methods: u16 count + method records
//!
//! Method record: name string, arity u8, local_count u8, constants
//! (u16 count + tagged values), code (u32 length + bytes), and one u32
//! line per code byte when the line-info flag is set.

use crate::runtime::image::{ClassImage, MethodImage};
use crate::runtime::value::Value;

use super::header::{write_header, FLAG_LINE_INFO};

pub(super) const TAG_NULL: u8 = 0;
pub(super) const TAG_FALSE: u8 = 1;
pub(super) const TAG_TRUE: u8 = 2;
pub(super) const TAG_INT: u8 = 3;
pub(super) const TAG_FLOAT: u8 = 4;
pub(super) const TAG_STR: u8 = 5;

/// Encode one class image into a complete artifact (header + body)
pub fn encode_class(image: &ClassImage, emit_line_info: bool) -> Vec<u8> {
    let mut body = Vec::new();
    write_str(&mut body, &image.fqn);

    body.extend_from_slice(&(image.fields.len() as u16).to_le_bytes());
    for field in &image.fields {
        write_str(&mut body, field);
    }

    match &image.ctor {
        Some(ctor) => {
            body.push(1);
            write_method(&mut body, ctor, emit_line_info);
        }
        None => body.push(0),
    }

    body.extend_from_slice(&(image.methods.len() as u16).to_le_bytes());
    for method in &image.methods {
        write_method(&mut body, method, emit_line_info);
    }

    let flags = if emit_line_info { FLAG_LINE_INFO } else { 0 };
    let mut artifact = write_header(flags, &body).to_vec();
    artifact.extend_from_slice(&body);
    artifact
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u16).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn write_method(out: &mut Vec<u8>, method: &MethodImage, emit_line_info: bool) {
    write_str(out, &method.name);
    out.push(method.arity);
    out.push(method.local_count);

    out.extend_from_slice(&(method.chunk.constants.len() as u16).to_le_bytes());
    for constant in &method.chunk.constants {
        write_constant(out, constant);
    }

    out.extend_from_slice(&(method.chunk.code.len() as u32).to_le_bytes());
    out.extend_from_slice(&method.chunk.code);

    if emit_line_info {
        for &line in &method.chunk.lines {
            out.extend_from_slice(&(line as u32).to_le_bytes());
        }
    }
}

fn write_constant(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => out.push(TAG_NULL),
        Value::Bool(false) => out.push(TAG_FALSE),
        Value::Bool(true) => out.push(TAG_TRUE),
        Value::Int(i) => {
            out.push(TAG_INT);
            out.extend_from_slice(&i.to_le_bytes());
        }
        Value::Float(v) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        Value::Str(s) => {
            out.push(TAG_STR);
            write_str(out, s);
        }
    }
}
