//! Three-address intermediate representation.
//!
//! Every instruction carries the source location that produced it (dropped
//! from [`Instruction`]'s `Display`, kept for error reporting during
//! assembly generation) plus a small, fixed instruction set: loads, copies,
//! calls, and explicit control flow. There is no implicit fallthrough
//! outside what a pass chooses to leave unconditional-jump-free.

use pebble_core::SourceLocation;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IRVar(pub String);

impl fmt::Display for IRVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl IRVar {
    pub fn new(name: impl Into<String>) -> Self {
        IRVar(name.into())
    }

    pub fn unit() -> Self {
        IRVar("unit".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelRef(pub String);

impl fmt::Display for LabelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Instruction {
    pub location: SourceLocation,
    pub kind: InstructionKind,
}

#[derive(Debug, Clone)]
pub enum InstructionKind {
    Label(LabelRef),
    LoadIntConst { value: i64, dest: IRVar },
    LoadBoolConst { value: bool, dest: IRVar },
    Copy { source: IRVar, dest: IRVar },
    Call { fun: IRVar, args: Vec<IRVar>, dest: IRVar },
    Jump(LabelRef),
    CondJump {
        cond: IRVar,
        then_label: LabelRef,
        else_label: LabelRef,
    },
    Return,
}

impl Instruction {
    pub fn new(location: SourceLocation, kind: InstructionKind) -> Self {
        Instruction { location, kind }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstructionKind::Label(l) => write!(f, "Label({l})"),
            InstructionKind::LoadIntConst { value, dest } => {
                write!(f, "LoadIntConst({value}, {dest})")
            }
            InstructionKind::LoadBoolConst { value, dest } => {
                write!(f, "LoadBoolConst({value}, {dest})")
            }
            InstructionKind::Copy { source, dest } => write!(f, "Copy({source}, {dest})"),
            InstructionKind::Call { fun, args, dest } => {
                let args_str = args
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Call({fun}, [{args_str}], {dest})")
            }
            InstructionKind::Jump(l) => write!(f, "Jump({l})"),
            InstructionKind::CondJump {
                cond,
                then_label,
                else_label,
            } => write!(f, "CondJump({cond}, {then_label}, {else_label})"),
            InstructionKind::Return => write!(f, "Return()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instr(kind: InstructionKind) -> Instruction {
        Instruction::new(SourceLocation::any(), kind)
    }

    #[test]
    fn load_int_const_formats_as_class_call() {
        let i = instr(InstructionKind::LoadIntConst {
            value: 42,
            dest: IRVar::new("x1"),
        });
        assert_eq!(i.to_string(), "LoadIntConst(42, x1)");
    }

    #[test]
    fn call_formats_args_as_a_list() {
        let i = instr(InstructionKind::Call {
            fun: IRVar::new("+"),
            args: vec![IRVar::new("x1"), IRVar::new("x2")],
            dest: IRVar::new("x3"),
        });
        assert_eq!(i.to_string(), "Call(+, [x1, x2], x3)");
    }

    #[test]
    fn cond_jump_formats_three_operands() {
        let i = instr(InstructionKind::CondJump {
            cond: IRVar::new("x1"),
            then_label: LabelRef("L1".to_string()),
            else_label: LabelRef("L2".to_string()),
        });
        assert_eq!(i.to_string(), "CondJump(x1, L1, L2)");
    }

    #[test]
    fn return_takes_no_operands() {
        let i = instr(InstructionKind::Return);
        assert_eq!(i.to_string(), "Return()");
    }
}
