//! Bytecode instruction set

/// One-byte opcodes. Operand layout per instruction:
/// - `u8` operands index the constant pool or local slots
/// - jump operands are `i16` offsets relative to the instruction after
///   the operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Push constant at pool index (u8)
    Constant = 0,
    Null = 1,
    True = 2,
    False = 3,
    Pop = 4,
    /// Push local slot (u8)
    GetLocal = 5,
    /// Pop a value into local slot (u8)
    SetLocal = 6,
    /// Read field of `this`; operand is a string constant index (u8)
    GetField = 7,
    /// Write field of `this`; operand is a string constant index (u8)
    SetField = 8,
    Add = 9,
    Subtract = 10,
    Multiply = 11,
    Divide = 12,
    Negate = 13,
    Not = 14,
    Equal = 15,
    NotEqual = 16,
    Greater = 17,
    GreaterEqual = 18,
    Less = 19,
    LessEqual = 20,
    /// Unconditional forward jump (i16)
    Jump = 21,
    /// Forward jump when top of stack is falsey; the condition stays on
    /// the stack (i16)
    JumpIfFalse = 22,
    /// Backward jump for loops (i16)
    JumpBack = 23,
    /// Pop a value and append its display form plus newline to the output
    Print = 24,
    /// Call a method on `this`; operands are a string constant index (u8)
    /// and an argument count (u8)
    Invoke = 25,
    /// Return null from the current method
    Return = 26,
    /// Pop a value and return it
    ReturnValue = 27,
}

impl OpCode {
    pub fn from_u8(byte: u8) -> Option<Self> {
        let op = match byte {
            0 => OpCode::Constant,
            1 => OpCode::Null,
            2 => OpCode::True,
            3 => OpCode::False,
            4 => OpCode::Pop,
            5 => OpCode::GetLocal,
            6 => OpCode::SetLocal,
            7 => OpCode::GetField,
            8 => OpCode::SetField,
            9 => OpCode::Add,
            10 => OpCode::Subtract,
            11 => OpCode::Multiply,
            12 => OpCode::Divide,
            13 => OpCode::Negate,
            14 => OpCode::Not,
            15 => OpCode::Equal,
            16 => OpCode::NotEqual,
            17 => OpCode::Greater,
            18 => OpCode::GreaterEqual,
            19 => OpCode::Less,
            20 => OpCode::LessEqual,
            21 => OpCode::Jump,
            22 => OpCode::JumpIfFalse,
            23 => OpCode::JumpBack,
            24 => OpCode::Print,
            25 => OpCode::Invoke,
            26 => OpCode::Return,
            27 => OpCode::ReturnValue,
            _ => return None,
        };
        Some(op)
    }

    pub fn name(&self) -> &'static str {
        match self {
            OpCode::Constant => "CONSTANT",
            OpCode::Null => "NULL",
            OpCode::True => "TRUE",
            OpCode::False => "FALSE",
            OpCode::Pop => "POP",
            OpCode::GetLocal => "GET_LOCAL",
            OpCode::SetLocal => "SET_LOCAL",
            OpCode::GetField => "GET_FIELD",
            OpCode::SetField => "SET_FIELD",
            OpCode::Add => "ADD",
            OpCode::Subtract => "SUBTRACT",
            OpCode::Multiply => "MULTIPLY",
            OpCode::Divide => "DIVIDE",
            OpCode::Negate => "NEGATE",
            OpCode::Not => "NOT",
            OpCode::Equal => "EQUAL",
            OpCode::NotEqual => "NOT_EQUAL",
            OpCode::Greater => "GREATER",
            OpCode::GreaterEqual => "GREATER_EQUAL",
            OpCode::Less => "LESS",
            OpCode::LessEqual => "LESS_EQUAL",
            OpCode::Jump => "JUMP",
            OpCode::JumpIfFalse => "JUMP_IF_FALSE",
            OpCode::JumpBack => "JUMP_BACK",
            OpCode::Print => "PRINT",
            OpCode::Invoke => "INVOKE",
            OpCode::Return => "RETURN",
            OpCode::ReturnValue => "RETURN_VALUE",
        }
    }

    /// Number of operand bytes following the opcode
    pub fn operand_size(&self) -> usize {
        match self {
            OpCode::Constant
            | OpCode::GetLocal
            | OpCode::SetLocal
            | OpCode::GetField
            | OpCode::SetField => 1,
            OpCode::Jump | OpCode::JumpIfFalse | OpCode::JumpBack | OpCode::Invoke => 2,
            _ => 0,
        }
    }
}
