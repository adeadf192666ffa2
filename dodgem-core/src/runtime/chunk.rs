//! Bytecode chunk with constant pool and line table

use super::opcode::OpCode;
use super::value::Value;

/// Compiled bytecode for one method. The line table carries one entry per
/// code byte so runtime errors can point back at source lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    pub code: Vec<u8>,
    pub constants: Vec<Value>,
    pub lines: Vec<usize>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    fn write_byte(&mut self, byte: u8, line: usize) {
        self.code.push(byte);
        self.lines.push(line);
    }

    pub fn write_op(&mut self, op: OpCode, line: usize) {
        self.write_byte(op as u8, line);
    }

    pub fn write_op_u8(&mut self, op: OpCode, operand: u8, line: usize) {
        self.write_byte(op as u8, line);
        self.write_byte(operand, line);
    }

    pub fn write_op_u8_u8(&mut self, op: OpCode, a: u8, b: u8, line: usize) {
        self.write_byte(op as u8, line);
        self.write_byte(a, line);
        self.write_byte(b, line);
    }

    /// Emit a forward jump with a placeholder operand; returns the operand
    /// offset to hand back to [`Chunk::patch_jump`]
    pub fn write_jump(&mut self, op: OpCode, line: usize) -> usize {
        self.write_byte(op as u8, line);
        let operand_offset = self.code.len();
        self.write_byte(0xff, line);
        self.write_byte(0xff, line);
        operand_offset
    }

    /// Point a previously emitted forward jump at the current offset.
    /// Returns false when the distance does not fit in the operand.
    #[must_use]
    pub fn patch_jump(&mut self, operand_offset: usize) -> bool {
        let distance = self.code.len() - (operand_offset + 2);
        let Ok(distance) = i16::try_from(distance) else {
            return false;
        };
        let bytes = distance.to_le_bytes();
        self.code[operand_offset] = bytes[0];
        self.code[operand_offset + 1] = bytes[1];
        true
    }

    /// Emit a backward jump to `start`. Returns false when the distance
    /// does not fit in the operand.
    #[must_use]
    pub fn write_loop(&mut self, start: usize, line: usize) -> bool {
        // Distance is measured from the instruction pointer after the
        // operand has been read
        let distance = self.code.len() + 3 - start;
        let Ok(distance) = i16::try_from(distance) else {
            return false;
        };
        self.write_byte(OpCode::JumpBack as u8, line);
        let bytes = distance.to_le_bytes();
        self.write_byte(bytes[0], line);
        self.write_byte(bytes[1], line);
        true
    }

    /// Intern a constant, reusing an existing pool slot when the value is
    /// already present. Returns None when the pool is full.
    pub fn add_constant(&mut self, value: Value) -> Option<u8> {
        if let Some(index) = self.constants.iter().position(|v| *v == value) {
            return u8::try_from(index).ok();
        }
        let index = u8::try_from(self.constants.len()).ok()?;
        self.constants.push(value);
        Some(index)
    }

    pub fn line_for(&self, offset: usize) -> usize {
        self.lines.get(offset).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_lines() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Null, 3);
        chunk.write_op_u8(OpCode::Constant, 0, 4);
        assert_eq!(chunk.code, vec![OpCode::Null as u8, OpCode::Constant as u8, 0]);
        assert_eq!(chunk.lines, vec![3, 4, 4]);
        assert_eq!(chunk.line_for(1), 4);
    }

    #[test]
    fn test_constant_interning() {
        let mut chunk = Chunk::new();
        let a = chunk.add_constant(Value::Int(1)).unwrap();
        let b = chunk.add_constant(Value::Str("work".to_string())).unwrap();
        let c = chunk.add_constant(Value::Int(1)).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(a, c);
        assert_eq!(chunk.constants.len(), 2);
    }

    #[test]
    fn test_constant_pool_overflow() {
        let mut chunk = Chunk::new();
        for i in 0..256 {
            assert!(chunk.add_constant(Value::Int(i)).is_some());
        }
        assert!(chunk.add_constant(Value::Int(256)).is_none());
    }

    #[test]
    fn test_patch_jump() {
        let mut chunk = Chunk::new();
        let operand = chunk.write_jump(OpCode::JumpIfFalse, 1);
        chunk.write_op(OpCode::Pop, 1);
        chunk.write_op(OpCode::Null, 1);
        assert!(chunk.patch_jump(operand));
        let distance = i16::from_le_bytes([chunk.code[operand], chunk.code[operand + 1]]);
        assert_eq!(distance, 2);
    }

    #[test]
    fn test_write_loop_distance() {
        let mut chunk = Chunk::new();
        let start = chunk.current_offset();
        chunk.write_op(OpCode::True, 1);
        assert!(chunk.write_loop(start, 1));
        let operand_offset = chunk.code.len() - 2;
        let distance = i16::from_le_bytes([
            chunk.code[operand_offset],
            chunk.code[operand_offset + 1],
        ]);
        // ip sits right after the operand once it has been read
        assert_eq!(chunk.code.len() as i16 - distance, start as i16);
    }
}
