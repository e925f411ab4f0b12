//! Lowers a type-checked AST into the three-address IR.
//!
//! A pure left-to-right, depth-first traversal. The only state carried
//! across calls is the instruction list, the temporary/label counters, and
//! a symbol table mapping source names (and, in the root scope, every
//! built-in operator/function name) to the [`IRVar`] that currently holds
//! their value — the same scoping discipline the type checker and
//! interpreter use, just with a different payload.

use crate::ast::{Expr, ExprKind, Literal};
use crate::builtins::OPERATOR_NAMES;
use pebble_core::{SymbolTable, Type};

use crate::ir::{Instruction, InstructionKind, IRVar, LabelRef};

const BUILTIN_FUNCTION_NAMES: &[&str] = &["print_int", "print_bool", "read_int"];

pub struct IrGenerator {
    instructions: Vec<Instruction>,
    temp_counter: usize,
    label_counter: usize,
    scope: SymbolTable<IRVar>,
}

impl Default for IrGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IrGenerator {
    pub fn new() -> Self {
        let mut root = std::collections::HashMap::new();
        for name in OPERATOR_NAMES {
            root.insert(name.to_string(), IRVar::new(*name));
        }
        for name in BUILTIN_FUNCTION_NAMES {
            root.insert(name.to_string(), IRVar::new(*name));
        }

        IrGenerator {
            instructions: Vec::new(),
            temp_counter: 0,
            label_counter: 0,
            scope: SymbolTable::with_root(root),
        }
    }

    fn fresh_temp(&mut self) -> IRVar {
        self.temp_counter += 1;
        IRVar::new(format!("x{}", self.temp_counter))
    }

    fn fresh_label(&mut self) -> LabelRef {
        self.label_counter += 1;
        LabelRef(format!("L{}", self.label_counter))
    }

    fn emit(&mut self, location: pebble_core::SourceLocation, kind: InstructionKind) {
        self.instructions.push(Instruction::new(location, kind));
    }

    /// Generates the IR for `expr` wrapped in a `start` label and a final
    /// result print, followed by `Return`. This is the entry point used by
    /// every downstream consumer (the `ir`/`asm`/`compile` CLI commands).
    pub fn generate_program(expr: &Expr) -> Vec<Instruction> {
        let mut generator = IrGenerator::new();
        generator.emit(expr.location.clone(), InstructionKind::Label(LabelRef("start".to_string())));
        let result = generator.visit(expr);

        match expr.ty() {
            Some(Type::Int) => {
                let print_int = generator
                    .scope
                    .lookup("print_int")
                    .cloned()
                    .expect("print_int is seeded in the root scope");
                let dest = generator.fresh_temp();
                generator.emit(
                    expr.location.clone(),
                    InstructionKind::Call {
                        fun: print_int,
                        args: vec![result],
                        dest,
                    },
                );
            }
            Some(Type::Bool) => {
                let print_bool = generator
                    .scope
                    .lookup("print_bool")
                    .cloned()
                    .expect("print_bool is seeded in the root scope");
                let dest = generator.fresh_temp();
                generator.emit(
                    expr.location.clone(),
                    InstructionKind::Call {
                        fun: print_bool,
                        args: vec![result],
                        dest,
                    },
                );
            }
            _ => {}
        }

        generator.emit(expr.location.clone(), InstructionKind::Return);
        generator.instructions
    }

    fn visit(&mut self, expr: &Expr) -> IRVar {
        let location = expr.location.clone();
        match &expr.kind {
            ExprKind::Literal(Literal::Int(n)) => {
                let dest = self.fresh_temp();
                self.emit(
                    location,
                    InstructionKind::LoadIntConst { value: *n, dest: dest.clone() },
                );
                dest
            }
            ExprKind::Literal(Literal::Bool(b)) => {
                let dest = self.fresh_temp();
                self.emit(
                    location,
                    InstructionKind::LoadBoolConst { value: *b, dest: dest.clone() },
                );
                dest
            }
            ExprKind::Literal(Literal::Unit) => IRVar::unit(),

            ExprKind::Identifier(name) => self
                .scope
                .lookup(name)
                .cloned()
                .unwrap_or_else(|| panic!("unresolved identifier '{name}' reached IR generation")),

            ExprKind::BinaryOp { left, op, right } if op == "=" => {
                let right_var = self.visit(right);
                let name = match &left.kind {
                    ExprKind::Identifier(name) => name,
                    _ => unreachable!("type checker rejects non-identifier assignment targets"),
                };
                let target = self
                    .scope
                    .lookup(name)
                    .cloned()
                    .unwrap_or_else(|| panic!("unresolved identifier '{name}' reached IR generation"));
                self.emit(
                    location,
                    InstructionKind::Copy { source: right_var.clone(), dest: target },
                );
                right_var
            }

            ExprKind::BinaryOp { left, op, right } if op == "and" => {
                self.generate_short_circuit(location, left, right, true)
            }
            ExprKind::BinaryOp { left, op, right } if op == "or" => {
                self.generate_short_circuit(location, left, right, false)
            }

            ExprKind::BinaryOp { left, op, right } => {
                let left_var = self.visit(left);
                let right_var = self.visit(right);
                let op_var = self
                    .scope
                    .lookup(op)
                    .cloned()
                    .unwrap_or_else(|| panic!("unknown operator '{op}'"));
                let dest = self.fresh_temp();
                self.emit(
                    location,
                    InstructionKind::Call {
                        fun: op_var,
                        args: vec![left_var, right_var],
                        dest: dest.clone(),
                    },
                );
                dest
            }

            ExprKind::UnaryOp { op, operand } => {
                let operand_var = self.visit(operand);
                let op_name = if op == "-" { "unary_-".to_string() } else { op.clone() };
                let op_var = self
                    .scope
                    .lookup(&op_name)
                    .cloned()
                    .unwrap_or_else(|| panic!("unknown unary operator '{op_name}'"));
                let dest = self.fresh_temp();
                self.emit(
                    location,
                    InstructionKind::Call {
                        fun: op_var,
                        args: vec![operand_var],
                        dest: dest.clone(),
                    },
                );
                dest
            }

            ExprKind::If {
                cond,
                then_branch,
                else_branch: None,
            } => {
                let l_then = self.fresh_label();
                let l_end = self.fresh_label();
                let cond_var = self.visit(cond);
                self.emit(
                    location.clone(),
                    InstructionKind::CondJump {
                        cond: cond_var,
                        then_label: l_then.clone(),
                        else_label: l_end.clone(),
                    },
                );
                self.emit(location.clone(), InstructionKind::Label(l_then));
                self.visit(then_branch);
                self.emit(location, InstructionKind::Label(l_end));
                IRVar::unit()
            }

            ExprKind::If {
                cond,
                then_branch,
                else_branch: Some(else_branch),
            } => {
                let l_then = self.fresh_label();
                let l_else = self.fresh_label();
                let l_end = self.fresh_label();
                let cond_var = self.visit(cond);
                self.emit(
                    location.clone(),
                    InstructionKind::CondJump {
                        cond: cond_var,
                        then_label: l_then.clone(),
                        else_label: l_else.clone(),
                    },
                );
                let result = self.fresh_temp();

                self.emit(location.clone(), InstructionKind::Label(l_then));
                let then_var = self.visit(then_branch);
                self.emit(
                    location.clone(),
                    InstructionKind::Copy { source: then_var, dest: result.clone() },
                );
                self.emit(location.clone(), InstructionKind::Jump(l_end.clone()));

                self.emit(location.clone(), InstructionKind::Label(l_else));
                let else_var = self.visit(else_branch);
                self.emit(
                    location.clone(),
                    InstructionKind::Copy { source: else_var, dest: result.clone() },
                );

                self.emit(location, InstructionKind::Label(l_end));
                result
            }

            ExprKind::While { cond, body } => {
                let l_start = self.fresh_label();
                let l_body = self.fresh_label();
                let l_end = self.fresh_label();

                self.emit(location.clone(), InstructionKind::Label(l_start.clone()));
                let cond_var = self.visit(cond);
                self.emit(
                    location.clone(),
                    InstructionKind::CondJump {
                        cond: cond_var,
                        then_label: l_body.clone(),
                        else_label: l_end.clone(),
                    },
                );
                self.emit(location.clone(), InstructionKind::Label(l_body));
                self.visit(body);
                self.emit(location.clone(), InstructionKind::Jump(l_start));
                self.emit(location, InstructionKind::Label(l_end));
                IRVar::unit()
            }

            ExprKind::Block { statements } => {
                self.scope.push();
                let mut result = IRVar::unit();
                for stmt in statements {
                    result = self.visit(stmt);
                }
                self.scope.pop().expect("block scope is never the root");
                result
            }

            ExprKind::VarDecl { name, value, .. } => {
                let value_var = self.visit(value);
                let dest = self.fresh_temp();
                self.emit(
                    location,
                    InstructionKind::Copy { source: value_var, dest: dest.clone() },
                );
                self.scope
                    .define(name.as_str(), dest)
                    .unwrap_or_else(|_| panic!("'{name}' redefined reached IR generation"));
                IRVar::unit()
            }

            ExprKind::Call { callee, args } => {
                let arg_vars: Vec<IRVar> = args.iter().map(|a| self.visit(a)).collect();
                let callee_var = self
                    .scope
                    .lookup(callee)
                    .cloned()
                    .unwrap_or_else(|| panic!("unknown function '{callee}'"));
                let dest = self.fresh_temp();
                self.emit(
                    location,
                    InstructionKind::Call { fun: callee_var, args: arg_vars, dest: dest.clone() },
                );
                dest
            }
        }
    }

    /// `and`/`or` share the same three-label shape; `short_circuits_on_true`
    /// picks which branch order and result loads true vs. false first.
    fn generate_short_circuit(
        &mut self,
        location: pebble_core::SourceLocation,
        left: &Expr,
        right: &Expr,
        short_circuits_on_true: bool,
    ) -> IRVar {
        let l_skip = self.fresh_label();
        let l_continue = self.fresh_label();
        let l_end = self.fresh_label();

        let left_var = self.visit(left);

        let (then_label, else_label) = if short_circuits_on_true {
            // `and`: continue evaluating on true, skip (result false) on false.
            (l_continue.clone(), l_skip.clone())
        } else {
            // `or`: skip (result true) on true, continue evaluating on false.
            (l_skip.clone(), l_continue.clone())
        };

        self.emit(
            location.clone(),
            InstructionKind::CondJump { cond: left_var, then_label, else_label },
        );

        let result = self.fresh_temp();

        self.emit(location.clone(), InstructionKind::Label(l_continue));
        let right_var = self.visit(right);
        self.emit(
            location.clone(),
            InstructionKind::Copy { source: right_var, dest: result.clone() },
        );
        self.emit(location.clone(), InstructionKind::Jump(l_end.clone()));

        self.emit(location.clone(), InstructionKind::Label(l_skip));
        self.emit(
            location.clone(),
            InstructionKind::LoadBoolConst { value: !short_circuits_on_true, dest: result.clone() },
        );
        self.emit(location.clone(), InstructionKind::Jump(l_end.clone()));

        self.emit(location, InstructionKind::Label(l_end));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::typechecker::TypeChecker;

    fn generate(src: &str) -> Vec<Instruction> {
        let expr = Parser::new("t.pebble", src).parse().unwrap().unwrap();
        TypeChecker::new().check(&expr).unwrap();
        IrGenerator::generate_program(&expr)
    }

    fn texts(instrs: &[Instruction]) -> Vec<String> {
        instrs.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn program_wraps_with_start_label_and_return() {
        let instrs = generate("1");
        assert_eq!(instrs.first().unwrap().to_string(), "Label(start)");
        assert_eq!(instrs.last().unwrap().to_string(), "Return()");
    }

    #[test]
    fn int_result_is_printed() {
        let instrs = generate("1 + 1");
        assert!(texts(&instrs).iter().any(|s| s.starts_with("Call(print_int")));
    }

    #[test]
    fn bool_result_is_printed() {
        let instrs = generate("true");
        assert!(texts(&instrs).iter().any(|s| s.starts_with("Call(print_bool")));
    }

    #[test]
    fn unit_result_is_not_printed() {
        let instrs = generate("{ var x = 1; }");
        assert!(!texts(&instrs).iter().any(|s| s.contains("print_int") || s.contains("print_bool")));
    }

    #[test]
    fn literal_loads_a_fresh_temporary() {
        let instrs = generate("42");
        assert!(texts(&instrs).iter().any(|s| s == "LoadIntConst(42, x1)"));
    }

    #[test]
    fn binary_op_calls_the_operator_by_name() {
        let instrs = generate("1 + 2");
        assert!(texts(&instrs).iter().any(|s| s.starts_with("Call(+, ")));
    }

    #[test]
    fn and_short_circuits_with_three_labels() {
        let instrs = generate("false and true");
        let text = texts(&instrs).join("\n");
        assert!(text.contains("CondJump"));
        assert!(text.contains("LoadBoolConst(false"));
    }

    #[test]
    fn or_short_circuits_with_three_labels() {
        let instrs = generate("true or false");
        let text = texts(&instrs).join("\n");
        assert!(text.contains("CondJump"));
        assert!(text.contains("LoadBoolConst(true"));
    }

    #[test]
    fn if_with_else_allocates_shared_result_before_branches() {
        let instrs = generate("if true then 1 else 2");
        let text = texts(&instrs).join("\n");
        assert!(text.contains("CondJump"));
        assert!(text.matches("Copy(").count() >= 2);
    }

    #[test]
    fn while_loop_jumps_back_to_start() {
        let instrs = generate("while false do 1");
        let text = texts(&instrs).join("\n");
        assert!(text.contains("Jump(L1)") || text.contains("CondJump"));
    }

    #[test]
    fn var_decl_binds_a_fresh_temporary() {
        let instrs = generate("{ var x = 1; x }");
        assert!(texts(&instrs).iter().any(|s| s.starts_with("Copy(")));
    }

    #[test]
    fn function_call_emits_a_call_instruction() {
        let instrs = generate("print_int(1)");
        assert!(texts(&instrs).iter().any(|s| s.starts_with("Call(print_int")));
    }
}
