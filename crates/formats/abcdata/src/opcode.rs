/// AVM2 opcodes the decompiler understands. Anything else in a method body
/// is skipped byte-by-byte, best-effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Label = 0x09,
    Jump = 0x10,
    IfTrue = 0x11,
    IfFalse = 0x12,
    PushWith = 0x1C,
    PopScope = 0x1D,
    PushNull = 0x20,
    PushUndefined = 0x21,
    PushByte = 0x24,
    PushShort = 0x25,
    PushTrue = 0x26,
    PushFalse = 0x27,
    PushNan = 0x28,
    Pop = 0x29,
    Dup = 0x2A,
    PushString = 0x2C,
    PushInt = 0x2D,
    PushUint = 0x2E,
    PushDouble = 0x2F,
    PushScope = 0x30,
    NewFunction = 0x40,
    CallProperty = 0x46,
    ReturnVoid = 0x47,
    ReturnValue = 0x48,
    CallPropVoid = 0x4F,
    NewClass = 0x55,
    NewObject = 0x56,
    NewArray = 0x57,
    GetLex = 0x60,
    SetProperty = 0x61,
    GetLocal = 0x62,
    SetLocal = 0x63,
    GetProperty = 0x66,
    InitProperty = 0x68,
    ConvertI = 0x73,
    ConvertU = 0x74,
    ConvertD = 0x75,
    Add = 0xA0,
    Subtract = 0xA1,
    Multiply = 0xA2,
    Divide = 0xA3,
    Equals = 0xAB,
    LessThan = 0xAD,
    GetLocal0 = 0xD0,
    GetLocal1 = 0xD1,
    GetLocal2 = 0xD2,
    GetLocal3 = 0xD3,
    SetLocal0 = 0xD4,
    SetLocal1 = 0xD5,
    SetLocal2 = 0xD6,
    SetLocal3 = 0xD7,
}

impl Opcode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x09 => Some(Self::Label),
            0x10 => Some(Self::Jump),
            0x11 => Some(Self::IfTrue),
            0x12 => Some(Self::IfFalse),
            0x1C => Some(Self::PushWith),
            0x1D => Some(Self::PopScope),
            0x20 => Some(Self::PushNull),
            0x21 => Some(Self::PushUndefined),
            0x24 => Some(Self::PushByte),
            0x25 => Some(Self::PushShort),
            0x26 => Some(Self::PushTrue),
            0x27 => Some(Self::PushFalse),
            0x28 => Some(Self::PushNan),
            0x29 => Some(Self::Pop),
            0x2A => Some(Self::Dup),
            0x2C => Some(Self::PushString),
            0x2D => Some(Self::PushInt),
            0x2E => Some(Self::PushUint),
            0x2F => Some(Self::PushDouble),
            0x30 => Some(Self::PushScope),
            0x40 => Some(Self::NewFunction),
            0x46 => Some(Self::CallProperty),
            0x47 => Some(Self::ReturnVoid),
            0x48 => Some(Self::ReturnValue),
            0x4F => Some(Self::CallPropVoid),
            0x55 => Some(Self::NewClass),
            0x56 => Some(Self::NewObject),
            0x57 => Some(Self::NewArray),
            0x60 => Some(Self::GetLex),
            0x61 => Some(Self::SetProperty),
            0x62 => Some(Self::GetLocal),
            0x63 => Some(Self::SetLocal),
            0x66 => Some(Self::GetProperty),
            0x68 => Some(Self::InitProperty),
            0x73 => Some(Self::ConvertI),
            0x74 => Some(Self::ConvertU),
            0x75 => Some(Self::ConvertD),
            0xA0 => Some(Self::Add),
            0xA1 => Some(Self::Subtract),
            0xA2 => Some(Self::Multiply),
            0xA3 => Some(Self::Divide),
            0xAB => Some(Self::Equals),
            0xAD => Some(Self::LessThan),
            0xD0 => Some(Self::GetLocal0),
            0xD1 => Some(Self::GetLocal1),
            0xD2 => Some(Self::GetLocal2),
            0xD3 => Some(Self::GetLocal3),
            0xD4 => Some(Self::SetLocal0),
            0xD5 => Some(Self::SetLocal1),
            0xD6 => Some(Self::SetLocal2),
            0xD7 => Some(Self::SetLocal3),
            _ => None,
        }
    }

    /// Scope housekeeping that touches neither the operand stack nor the
    /// output. `pushscope`/`pushwith` are *not* in this set: they pop an
    /// operand and are handled explicitly by the decompiler.
    pub fn is_non_semantic(self) -> bool {
        matches!(self, Self::Label | Self::PopScope)
    }
}
