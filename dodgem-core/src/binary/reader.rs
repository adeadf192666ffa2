//! Class image decoder and verifier
//!
//! Decoding validates the whole artifact before any of it reaches the VM:
//! header magic, version, and checksum first, then structural decoding,
//! then a bytecode verification pass over every method.

use thiserror::Error;

use crate::runtime::chunk::Chunk;
use crate::runtime::image::{ClassImage, MethodImage};
use crate::runtime::opcode::OpCode;
use crate::runtime::value::Value;

use super::header::{checksum, FLAG_LINE_INFO, HEADER_SIZE, MAGIC, VERSION};
use super::writer::{TAG_FALSE, TAG_FLOAT, TAG_INT, TAG_NULL, TAG_STR, TAG_TRUE};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadError {
    #[error("Bad magic bytes")]
    BadMagic,
    #[error("Unsupported format version {0}.{1}.{2}")]
    UnsupportedVersion(u8, u8, u8),
    #[error("Checksum mismatch")]
    ChecksumMismatch,
    #[error("Artifact truncated")]
    Truncated,
    #[error("Trailing bytes after class record")]
    TrailingBytes,
    #[error("Invalid constant tag {0}")]
    InvalidConstantTag(u8),
    #[error("Invalid string encoding")]
    InvalidUtf8,
    #[error("Invalid opcode {byte:#04x} at offset {offset} in method '{method}'")]
    InvalidOpcode {
        method: String,
        byte: u8,
        offset: usize,
    },
    #[error("Constant index {index} out of range in method '{method}'")]
    ConstantOutOfRange { method: String, index: u8 },
    #[error("Local slot {slot} out of range in method '{method}'")]
    LocalOutOfRange { method: String, slot: u8 },
    #[error("Arity {arity} exceeds local count {local_count} in method '{method}'")]
    ArityExceedsLocals {
        method: String,
        arity: u8,
        local_count: u8,
    },
    #[error("Jump target out of range in method '{method}'")]
    BadJumpTarget { method: String },
    #[error("Operand of {op} must be a string constant in method '{method}'")]
    ExpectedStringConstant { method: String, op: &'static str },
}

/// Decode and verify one artifact
pub fn decode_class(bytes: &[u8]) -> Result<ClassImage, ReadError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ReadError::Truncated);
    }
    if bytes[0..4] != MAGIC {
        return Err(ReadError::BadMagic);
    }
    let (major, minor, patch) = (bytes[4], bytes[5], bytes[6]);
    if major != VERSION.0 {
        return Err(ReadError::UnsupportedVersion(major, minor, patch));
    }
    let flags = bytes[7];
    let expected_checksum = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
    let body_len = u32::from_le_bytes(bytes[12..16].try_into().unwrap()) as usize;

    let body = &bytes[HEADER_SIZE..];
    if body.len() < body_len {
        return Err(ReadError::Truncated);
    }
    if body.len() > body_len {
        return Err(ReadError::TrailingBytes);
    }
    if checksum(body) != expected_checksum {
        return Err(ReadError::ChecksumMismatch);
    }

    let has_line_info = flags & FLAG_LINE_INFO != 0;
    let mut cursor = Cursor { bytes: body, pos: 0 };

    let fqn = cursor.read_str()?;

    let field_count = cursor.read_u16()? as usize;
    let mut fields = Vec::with_capacity(field_count);
    for _ in 0..field_count {
        fields.push(cursor.read_str()?);
    }

    let ctor = if cursor.read_u8()? != 0 {
        Some(read_method(&mut cursor, has_line_info)?)
    } else {
        None
    };

    let method_count = cursor.read_u16()? as usize;
    let mut methods = Vec::with_capacity(method_count);
    for _ in 0..method_count {
        methods.push(read_method(&mut cursor, has_line_info)?);
    }

    if cursor.pos != body.len() {
        return Err(ReadError::TrailingBytes);
    }

    let image = ClassImage {
        fqn,
        fields,
        ctor,
        methods,
    };
    verify_image(&image)?;
    Ok(image)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, count: usize) -> Result<&'a [u8], ReadError> {
        let end = self.pos.checked_add(count).ok_or(ReadError::Truncated)?;
        if end > self.bytes.len() {
            return Err(ReadError::Truncated);
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, ReadError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn read_u32(&mut self) -> Result<u32, ReadError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn read_i64(&mut self) -> Result<i64, ReadError> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_str(&mut self) -> Result<String, ReadError> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ReadError::InvalidUtf8)
    }
}

fn read_method(cursor: &mut Cursor<'_>, has_line_info: bool) -> Result<MethodImage, ReadError> {
    let name = cursor.read_str()?;
    let arity = cursor.read_u8()?;
    let local_count = cursor.read_u8()?;

    let constant_count = cursor.read_u16()? as usize;
    let mut constants = Vec::with_capacity(constant_count);
    for _ in 0..constant_count {
        constants.push(read_constant(cursor)?);
    }

    let code_len = cursor.read_u32()? as usize;
    let code = cursor.take(code_len)?.to_vec();

    let lines = if has_line_info {
        let mut lines = Vec::with_capacity(code_len);
        for _ in 0..code_len {
            lines.push(cursor.read_u32()? as usize);
        }
        lines
    } else {
        vec![0; code_len]
    };

    Ok(MethodImage {
        name,
        arity,
        local_count,
        chunk: Chunk {
            code,
            constants,
            lines,
        },
    })
}

fn read_constant(cursor: &mut Cursor<'_>) -> Result<Value, ReadError> {
    let tag = cursor.read_u8()?;
    let value = match tag {
        TAG_NULL => Value::Null,
        TAG_FALSE => Value::Bool(false),
        TAG_TRUE => Value::Bool(true),
        TAG_INT => Value::Int(cursor.read_i64()?),
        TAG_FLOAT => {
            let bits = u64::from_le_bytes(cursor.take(8)?.try_into().unwrap());
            Value::Float(f64::from_bits(bits))
        }
        TAG_STR => Value::Str(cursor.read_str()?),
        other => return Err(ReadError::InvalidConstantTag(other)),
    };
    Ok(value)
}

fn verify_image(image: &ClassImage) -> Result<(), ReadError> {
    for method in image.ctor.iter().chain(image.methods.iter()) {
        verify_method(method)?;
    }
    Ok(())
}

/// Walk the instruction stream once, checking every operand before the
/// VM ever sees it
fn verify_method(method: &MethodImage) -> Result<(), ReadError> {
    // Arguments land in the leading local slots, so every parameter needs one
    if method.arity > method.local_count {
        return Err(ReadError::ArityExceedsLocals {
            method: method.name.clone(),
            arity: method.arity,
            local_count: method.local_count,
        });
    }
    let chunk = &method.chunk;
    let code = &chunk.code;
    let mut ip = 0usize;

    while ip < code.len() {
        let offset = ip;
        let byte = code[ip];
        let op = OpCode::from_u8(byte).ok_or_else(|| ReadError::InvalidOpcode {
            method: method.name.clone(),
            byte,
            offset,
        })?;
        ip += 1;
        if ip + op.operand_size() > code.len() {
            return Err(ReadError::Truncated);
        }

        match op {
            OpCode::Constant => {
                check_constant(method, code[ip])?;
            }
            OpCode::GetLocal | OpCode::SetLocal => {
                let slot = code[ip];
                if slot >= method.local_count {
                    return Err(ReadError::LocalOutOfRange {
                        method: method.name.clone(),
                        slot,
                    });
                }
            }
            OpCode::GetField | OpCode::SetField => {
                check_string_constant(method, code[ip], op.name())?;
            }
            OpCode::Invoke => {
                check_string_constant(method, code[ip], op.name())?;
            }
            OpCode::Jump | OpCode::JumpIfFalse => {
                let distance = i16::from_le_bytes([code[ip], code[ip + 1]]);
                let after = ip + 2;
                let target = after as i64 + distance as i64;
                if distance < 0 || target as usize > code.len() {
                    return Err(ReadError::BadJumpTarget {
                        method: method.name.clone(),
                    });
                }
            }
            OpCode::JumpBack => {
                let distance = i16::from_le_bytes([code[ip], code[ip + 1]]);
                let after = ip + 2;
                if distance < 0 || (distance as usize) > after {
                    return Err(ReadError::BadJumpTarget {
                        method: method.name.clone(),
                    });
                }
            }
            _ => {}
        }
        ip += op.operand_size();
    }
    Ok(())
}

fn check_constant(method: &MethodImage, index: u8) -> Result<(), ReadError> {
    if (index as usize) < method.chunk.constants.len() {
        Ok(())
    } else {
        Err(ReadError::ConstantOutOfRange {
            method: method.name.clone(),
            index,
        })
    }
}

fn check_string_constant(
    method: &MethodImage,
    index: u8,
    op: &'static str,
) -> Result<(), ReadError> {
    check_constant(method, index)?;
    match method.chunk.constants.get(index as usize) {
        Some(Value::Str(_)) => Ok(()),
        _ => Err(ReadError::ExpectedStringConstant {
            method: method.name.clone(),
            op,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::writer::encode_class;

    fn sample_image() -> ClassImage {
        let mut chunk = Chunk::new();
        let name = chunk.add_constant(Value::Str("name".to_string())).unwrap();
        let work = chunk.add_constant(Value::Str("work".to_string())).unwrap();
        chunk.write_op_u8(OpCode::Constant, work, 4);
        chunk.write_op_u8(OpCode::SetField, name, 4);
        chunk.write_op(OpCode::Return, 4);
        let ctor = MethodImage {
            name: "init".to_string(),
            arity: 0,
            local_count: 0,
            chunk,
        };

        let mut chunk = Chunk::new();
        let name = chunk.add_constant(Value::Str("name".to_string())).unwrap();
        chunk.write_op_u8(OpCode::GetField, name, 5);
        chunk.write_op(OpCode::Print, 5);
        chunk.write_op(OpCode::Return, 5);
        let method = MethodImage {
            name: "testPrint".to_string(),
            arity: 0,
            local_count: 0,
            chunk,
        };

        ClassImage {
            fqn: "com.stellariver.dodgem.Student".to_string(),
            fields: vec!["name".to_string()],
            ctor: Some(ctor),
            methods: vec![method],
        }
    }

    #[test]
    fn test_decode_round_trip() {
        let image = sample_image();
        let decoded = decode_class(&encode_class(&image, true)).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_decode_without_line_info() {
        let image = sample_image();
        let decoded = decode_class(&encode_class(&image, false)).unwrap();
        assert_eq!(decoded.fqn, image.fqn);
        let entry = decoded.find_method("testPrint").unwrap();
        assert_eq!(entry.chunk.code, image.methods[0].chunk.code);
        assert!(entry.chunk.lines.iter().all(|&line| line == 0));
    }

    #[test]
    fn test_bad_magic() {
        let mut artifact = encode_class(&sample_image(), true);
        artifact[0] = b'X';
        assert_eq!(decode_class(&artifact), Err(ReadError::BadMagic));
    }

    #[test]
    fn test_unsupported_version() {
        let mut artifact = encode_class(&sample_image(), true);
        artifact[4] = 9;
        assert_eq!(
            decode_class(&artifact),
            Err(ReadError::UnsupportedVersion(9, 0, 0))
        );
    }

    #[test]
    fn test_corrupted_body_fails_checksum() {
        let mut artifact = encode_class(&sample_image(), true);
        let last = artifact.len() - 1;
        artifact[last] ^= 0xff;
        assert_eq!(decode_class(&artifact), Err(ReadError::ChecksumMismatch));
    }

    #[test]
    fn test_truncated_artifact() {
        let artifact = encode_class(&sample_image(), true);
        assert_eq!(
            decode_class(&artifact[..artifact.len() - 3]),
            Err(ReadError::Truncated)
        );
        assert_eq!(decode_class(&artifact[..8]), Err(ReadError::Truncated));
    }

    #[test]
    fn test_invalid_opcode_rejected() {
        let mut image = sample_image();
        image.methods[0].chunk.code[0] = 0xEE;
        image.methods[0].chunk.lines = vec![0; image.methods[0].chunk.code.len()];
        let artifact = encode_class(&image, true);
        assert!(matches!(
            decode_class(&artifact),
            Err(ReadError::InvalidOpcode { .. })
        ));
    }

    #[test]
    fn test_constant_index_out_of_range_rejected() {
        let mut image = sample_image();
        // Point the Constant operand past the pool
        image.ctor.as_mut().unwrap().chunk.code[1] = 200;
        let artifact = encode_class(&image, true);
        assert!(matches!(
            decode_class(&artifact),
            Err(ReadError::ConstantOutOfRange { index: 200, .. })
        ));
    }

    #[test]
    fn test_field_operand_must_be_string() {
        let mut image = sample_image();
        let ctor = image.ctor.as_mut().unwrap();
        let int_index = ctor.chunk.add_constant(Value::Int(7)).unwrap();
        // Repoint SetField at an int constant
        ctor.chunk.code[3] = int_index;
        let artifact = encode_class(&image, true);
        assert!(matches!(
            decode_class(&artifact),
            Err(ReadError::ExpectedStringConstant { .. })
        ));
    }

    #[test]
    fn test_local_slot_out_of_range_rejected() {
        let mut chunk = Chunk::new();
        chunk.write_op_u8(OpCode::GetLocal, 3, 1);
        chunk.write_op(OpCode::Return, 1);
        let image = ClassImage {
            fqn: "a.X".to_string(),
            fields: vec![],
            ctor: None,
            methods: vec![MethodImage {
                name: "f".to_string(),
                arity: 0,
                local_count: 2,
                chunk,
            }],
        };
        let artifact = encode_class(&image, true);
        assert!(matches!(
            decode_class(&artifact),
            Err(ReadError::LocalOutOfRange { slot: 3, .. })
        ));
    }

    #[test]
    fn test_arity_beyond_local_count_rejected() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Return, 1);
        let image = ClassImage {
            fqn: "a.X".to_string(),
            fields: vec![],
            ctor: None,
            methods: vec![MethodImage {
                name: "f".to_string(),
                arity: 2,
                local_count: 0,
                chunk,
            }],
        };
        let artifact = encode_class(&image, true);
        assert_eq!(
            decode_class(&artifact),
            Err(ReadError::ArityExceedsLocals {
                method: "f".to_string(),
                arity: 2,
                local_count: 0,
            })
        );
    }

    #[test]
    fn test_jump_past_end_rejected() {
        let mut chunk = Chunk::new();
        let operand = chunk.write_jump(OpCode::Jump, 1);
        chunk.write_op(OpCode::Return, 1);
        // Leave the 0xffff placeholder: a huge forward distance
        let _ = operand;
        let image = ClassImage {
            fqn: "a.X".to_string(),
            fields: vec![],
            ctor: None,
            methods: vec![MethodImage {
                name: "f".to_string(),
                arity: 0,
                local_count: 0,
                chunk,
            }],
        };
        let artifact = encode_class(&image, true);
        assert!(matches!(
            decode_class(&artifact),
            Err(ReadError::BadJumpTarget { .. })
        ));
    }
}
