//! Assembly emitter: lowers the flat IR to x86-64 AT&T text.
//!
//! Grounded directly in `assembly_generator.py`'s `Locals` table: every
//! distinct [`IRVar`] referenced anywhere in the instruction list gets one
//! naive 8-byte stack slot, assigned in first-appearance order — there is
//! no register allocation, no liveness analysis, nothing beyond "does this
//! name already have a slot". Arithmetic, comparison and unary operators
//! dispatch through a small intrinsics table keyed by operator name, the
//! same indirection the reference uses (`all_intrinsics.get(ins.fun.name)`)
//! so the Call instruction doesn't need to special-case each one.

use std::collections::HashMap;
use std::fmt::{self, Write as _};

use crate::ir::{Instruction, InstructionKind, IRVar};

#[derive(Debug)]
pub enum AsmError {
    /// An IR invariant was violated (unreachable if the type checker and IR
    /// generator did their jobs, kept anyway so codegen stays a pure
    /// `Result`-returning function rather than panicking on malformed input).
    Logic(String),
    Format(fmt::Error),
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmError::Logic(s) => write!(f, "{s}"),
            AsmError::Format(e) => write!(f, "assembly generation error: {e}"),
        }
    }
}

impl std::error::Error for AsmError {}

impl From<fmt::Error> for AsmError {
    fn from(e: fmt::Error) -> Self {
        AsmError::Format(e)
    }
}

/// The largest value representable as a 32-bit sign-extended immediate.
/// `LoadIntConst` values outside this range can't be encoded as `movq
/// $imm, mem` and need the two-instruction `movabsq` form instead.
const I32_MIN: i64 = i32::MIN as i64;
const I32_MAX: i64 = i32::MAX as i64;

/// Tracks the stack slot assigned to every local. First-appearance order,
/// one 8-byte slot each, exactly `Locals` in the reference implementation.
struct Locals {
    slots: HashMap<IRVar, i64>,
    stack_used: i64,
}

impl Locals {
    fn collect(instructions: &[Instruction]) -> Self {
        let mut locals = Locals {
            slots: HashMap::new(),
            stack_used: 8,
        };
        for instr in instructions {
            for var in operands(&instr.kind) {
                locals.add(var);
            }
        }
        locals
    }

    fn add(&mut self, var: IRVar) {
        if !self.slots.contains_key(&var) {
            self.slots.insert(var, self.stack_used);
            self.stack_used += 8;
        }
    }

    fn get(&self, var: &IRVar) -> Result<String, AsmError> {
        self.slots
            .get(var)
            .map(|offset| format!("-{offset}(%rbp)"))
            .ok_or_else(|| AsmError::Logic(format!("no stack slot assigned to '{var}'")))
    }

    fn stack_bytes(&self) -> i64 {
        self.stack_used
    }
}

/// Every `IRVar` an instruction reads or writes, in the order the reference
/// visits dataclass fields: destinations first, then sources/args.
fn operands(kind: &InstructionKind) -> Vec<IRVar> {
    match kind {
        InstructionKind::Label(_) | InstructionKind::Jump(_) | InstructionKind::Return => vec![],
        InstructionKind::LoadIntConst { dest, .. } => vec![dest.clone()],
        InstructionKind::LoadBoolConst { dest, .. } => vec![dest.clone()],
        InstructionKind::Copy { source, dest } => vec![source.clone(), dest.clone()],
        InstructionKind::Call { fun, args, dest } => {
            let mut v = vec![fun.clone()];
            v.extend(args.iter().cloned());
            v.push(dest.clone());
            v
        }
        InstructionKind::CondJump { cond, .. } => vec![cond.clone()],
    }
}

const INTRINSIC_NAMES: &[&str] = &[
    "+", "-", "*", "/", "%", "<", "<=", ">", ">=", "==", "!=", "unary_-", "not",
];

/// Generates the full AT&T-syntax assembly text for a well-typed program's
/// IR. The caller (the `asm`/`compile`/`test-prints`/`end` CLI paths) is
/// expected to hand this the output of [`crate::ir_generator::IrGenerator::generate_program`].
pub fn generate_assembly(instructions: &[Instruction]) -> Result<String, AsmError> {
    let locals = Locals::collect(instructions);
    let mut out = String::new();

    writeln!(out, ".global main")?;
    writeln!(out, ".type main, @function")?;
    writeln!(out, ".extern print_int")?;
    writeln!(out, ".extern print_bool")?;
    writeln!(out, ".extern read_int")?;
    writeln!(out)?;
    writeln!(out, ".section .text")?;
    writeln!(out, "main:")?;
    writeln!(out, "    pushq %rbp")?;
    writeln!(out, "    movq %rsp, %rbp")?;
    writeln!(out, "    subq ${}, %rsp", locals.stack_bytes())?;

    for instr in instructions {
        writeln!(out, "    # {instr}")?;
        emit_instruction(&mut out, &locals, &instr.kind)?;
    }

    Ok(out)
}

fn emit_instruction(out: &mut String, locals: &Locals, kind: &InstructionKind) -> Result<(), AsmError> {
    match kind {
        InstructionKind::Label(label) => {
            writeln!(out, ".{label}:")?;
        }
        InstructionKind::LoadIntConst { value, dest } => {
            let dest_ref = locals.get(dest)?;
            if (I32_MIN..=I32_MAX).contains(value) {
                writeln!(out, "    movq ${value}, {dest_ref}")?;
            } else {
                // Outside the 32-bit immediate range: load into a register
                // with `movabsq` first, then store it to the stack slot.
                writeln!(out, "    movabsq ${value}, %rax")?;
                writeln!(out, "    movq %rax, {dest_ref}")?;
            }
        }
        InstructionKind::LoadBoolConst { value, dest } => {
            let dest_ref = locals.get(dest)?;
            let encoded = if *value { 1 } else { 0 };
            writeln!(out, "    movq ${encoded}, {dest_ref}")?;
        }
        InstructionKind::Copy { source, dest } => {
            let source_ref = locals.get(source)?;
            let dest_ref = locals.get(dest)?;
            writeln!(out, "    movq {source_ref}, %rax")?;
            writeln!(out, "    movq %rax, {dest_ref}")?;
        }
        InstructionKind::Call { fun, args, dest } => {
            emit_call(out, locals, &fun.0, args, dest)?;
        }
        InstructionKind::Jump(label) => {
            writeln!(out, "    jmp .{label}")?;
        }
        InstructionKind::CondJump {
            cond,
            then_label,
            else_label,
        } => {
            let cond_ref = locals.get(cond)?;
            writeln!(out, "    cmpq $0, {cond_ref}")?;
            writeln!(out, "    jne .{then_label}")?;
            writeln!(out, "    jmp .{else_label}")?;
        }
        InstructionKind::Return => {
            writeln!(out, "    movq $0, %rax")?;
            writeln!(out, "    movq %rbp, %rsp")?;
            writeln!(out, "    popq %rbp")?;
            writeln!(out, "    ret")?;
        }
    }
    Ok(())
}

fn emit_call(
    out: &mut String,
    locals: &Locals,
    fun_name: &str,
    args: &[IRVar],
    dest: &IRVar,
) -> Result<(), AsmError> {
    if INTRINSIC_NAMES.contains(&fun_name) {
        let dest_ref = locals.get(dest)?;
        emit_intrinsic(out, locals, fun_name, args)?;
        writeln!(out, "    movq %rax, {dest_ref}")?;
        return Ok(());
    }

    match fun_name {
        "print_int" | "print_bool" => {
            let [arg] = args else {
                return Err(AsmError::Logic(format!(
                    "'{fun_name}' expects exactly one argument"
                )));
            };
            let arg_ref = locals.get(arg)?;
            writeln!(out, "    movq {arg_ref}, %rdi")?;
            writeln!(out, "    call {fun_name}")?;
        }
        "read_int" => {
            if !args.is_empty() {
                return Err(AsmError::Logic("'read_int' takes no arguments".to_string()));
            }
            let dest_ref = locals.get(dest)?;
            writeln!(out, "    call read_int")?;
            writeln!(out, "    movq %rax, {dest_ref}")?;
        }
        other => {
            return Err(AsmError::Logic(format!("unknown call target '{other}'")));
        }
    }
    Ok(())
}

/// Emits one of the binary/unary operator intrinsics, leaving the result in
/// `%rax`. Mirrors the reference's per-operator assembly bodies.
fn emit_intrinsic(out: &mut String, locals: &Locals, name: &str, args: &[IRVar]) -> Result<(), AsmError> {
    let binary = |out: &mut String, op: &str| -> Result<(), AsmError> {
        let [left, right] = args else {
            return Err(AsmError::Logic(format!("'{name}' expects two operands")));
        };
        let left_ref = locals.get(left)?;
        let right_ref = locals.get(right)?;
        writeln!(out, "    movq {left_ref}, %rax")?;
        writeln!(out, "    {op} {right_ref}, %rax")?;
        Ok(())
    };

    let compare = |out: &mut String, setcc: &str| -> Result<(), AsmError> {
        let [left, right] = args else {
            return Err(AsmError::Logic(format!("'{name}' expects two operands")));
        };
        let left_ref = locals.get(left)?;
        let right_ref = locals.get(right)?;
        writeln!(out, "    movq {left_ref}, %rax")?;
        writeln!(out, "    cmpq {right_ref}, %rax")?;
        writeln!(out, "    {setcc} %al")?;
        writeln!(out, "    movzbq %al, %rax")?;
        Ok(())
    };

    match name {
        "+" => binary(out, "addq")?,
        "-" => binary(out, "subq")?,
        "*" => binary(out, "imulq")?,
        "/" => {
            let [left, right] = args else {
                return Err(AsmError::Logic("'/' expects two operands".to_string()));
            };
            let left_ref = locals.get(left)?;
            let right_ref = locals.get(right)?;
            writeln!(out, "    movq {left_ref}, %rax")?;
            writeln!(out, "    cqto")?;
            writeln!(out, "    movq {right_ref}, %rcx")?;
            writeln!(out, "    idivq %rcx")?;
        }
        "%" => {
            let [left, right] = args else {
                return Err(AsmError::Logic("'%' expects two operands".to_string()));
            };
            let left_ref = locals.get(left)?;
            let right_ref = locals.get(right)?;
            writeln!(out, "    movq {left_ref}, %rax")?;
            writeln!(out, "    cqto")?;
            writeln!(out, "    movq {right_ref}, %rcx")?;
            writeln!(out, "    idivq %rcx")?;
            writeln!(out, "    movq %rdx, %rax")?;
        }
        "<" => compare(out, "setl")?,
        "<=" => compare(out, "setle")?,
        ">" => compare(out, "setg")?,
        ">=" => compare(out, "setge")?,
        "==" => compare(out, "sete")?,
        "!=" => compare(out, "setne")?,
        "unary_-" => {
            let [operand] = args else {
                return Err(AsmError::Logic("unary '-' expects one operand".to_string()));
            };
            let operand_ref = locals.get(operand)?;
            writeln!(out, "    movq {operand_ref}, %rax")?;
            writeln!(out, "    negq %rax")?;
        }
        "not" => {
            let [operand] = args else {
                return Err(AsmError::Logic("'not' expects one operand".to_string()));
            };
            let operand_ref = locals.get(operand)?;
            writeln!(out, "    movq {operand_ref}, %rax")?;
            writeln!(out, "    xorq $1, %rax")?;
        }
        other => return Err(AsmError::Logic(format!("unknown intrinsic '{other}'"))),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir_generator::IrGenerator;
    use crate::parser::Parser;
    use crate::typechecker::TypeChecker;

    fn assemble(src: &str) -> String {
        let expr = Parser::new("t.pebble", src).parse().unwrap().unwrap();
        TypeChecker::new().check(&expr).unwrap();
        let instrs = IrGenerator::generate_program(&expr);
        generate_assembly(&instrs).unwrap()
    }

    #[test]
    fn reserves_one_slot_per_distinct_variable() {
        let asm = assemble("1 + 2");
        // x1, x2, the "+" operator var, x3, "print_int", and its dest
        // temp x4 => 6 distinct locals (the operator names themselves
        // occupy a slot too, unused, exactly as in the reference).
        assert!(asm.contains("subq $56, %rsp"));
    }

    #[test]
    fn labels_are_dot_prefixed_not_dot_l_prefixed() {
        let asm = assemble("1");
        assert!(asm.contains(".start:"));
        assert!(!asm.contains(".Lstart:"));
    }

    #[test]
    fn large_constant_uses_movabsq() {
        let asm = assemble("5000000000");
        assert!(asm.contains("movabsq $5000000000, %rax"));
    }

    #[test]
    fn small_constant_uses_plain_movq() {
        let asm = assemble("42");
        assert!(asm.contains("movq $42,"));
        assert!(!asm.contains("movabsq"));
    }

    #[test]
    fn addition_dispatches_through_addq() {
        let asm = assemble("1 + 2");
        assert!(asm.contains("addq"));
    }

    #[test]
    fn division_uses_cqto_and_idivq() {
        let asm = assemble("7 / 2");
        assert!(asm.contains("cqto"));
        assert!(asm.contains("idivq"));
    }

    #[test]
    fn comparison_uses_setcc() {
        let asm = assemble("1 < 2");
        assert!(asm.contains("setl"));
    }

    #[test]
    fn print_int_calls_through_rdi() {
        let asm = assemble("1 + 1");
        assert!(asm.contains("movq") && asm.contains("%rdi"));
        assert!(asm.contains("call print_int"));
    }

    #[test]
    fn ends_with_epilogue_and_ret() {
        let asm = assemble("1");
        assert!(asm.trim_end().ends_with("ret"));
    }

    #[test]
    fn cond_jump_compares_against_zero() {
        let asm = assemble("if true then 1 else 2");
        assert!(asm.contains("cmpq $0,"));
        assert!(asm.contains("jne ."));
    }
}
