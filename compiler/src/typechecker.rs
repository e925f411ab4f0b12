//! Type checker.
//!
//! A single recursive traversal carrying a lexical scope stack
//! ([`SymbolTable<Type>`]). Each visit returns the expression's inferred
//! type and, as a side effect, annotates the node itself through
//! [`Expr::set_ty`] so later passes (the IR generator) don't need to
//! re-derive it.

use crate::ast::{Expr, ExprKind, Literal};
use crate::builtins::lookup_function;
use crate::errors::TypeError;
use pebble_core::{SymbolTable, Type};

pub struct TypeChecker {
    scope: SymbolTable<Type>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker {
            scope: SymbolTable::new(),
        }
    }

    pub fn check(&mut self, expr: &Expr) -> Result<Type, TypeError> {
        let ty = self.visit(expr)?;
        expr.set_ty(ty.clone());
        Ok(ty)
    }

    fn visit(&mut self, expr: &Expr) -> Result<Type, TypeError> {
        let ty = match &expr.kind {
            ExprKind::Literal(Literal::Int(_)) => Type::Int,
            ExprKind::Literal(Literal::Bool(_)) => Type::Bool,
            ExprKind::Literal(Literal::Unit) => Type::Unit,

            ExprKind::Identifier(name) => self.scope.lookup(name).cloned().ok_or_else(|| {
                TypeError::new(expr.location.clone(), format!("undefined variable '{name}'"))
            })?,

            ExprKind::BinaryOp { left, op, right } if op == "=" => {
                let name = match &left.kind {
                    ExprKind::Identifier(name) => name,
                    _ => {
                        return Err(TypeError::new(
                            expr.location.clone(),
                            "left side of an assignment must be an identifier",
                        ));
                    }
                };
                let target_ty = self.visit(left)?;
                let value_ty = self.visit(right)?;
                if target_ty != value_ty {
                    return Err(TypeError::new(
                        expr.location.clone(),
                        format!(
                            "cannot assign {value_ty} to '{name}' of type {target_ty}"
                        ),
                    ));
                }
                target_ty
            }

            ExprKind::BinaryOp { left, op, right } => {
                self.check_binary_op(expr, left, op, right)?
            }

            ExprKind::UnaryOp { op, operand } => self.check_unary_op(expr, op, operand)?,

            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_ty = self.visit(cond)?;
                require(&cond_ty, &Type::Bool, &expr.location, "if condition")?;

                match else_branch {
                    None => {
                        self.visit(then_branch)?;
                        Type::Unit
                    }
                    Some(else_branch) => {
                        let then_ty = self.visit(then_branch)?;
                        let else_ty = self.visit(else_branch)?;
                        if then_ty != else_ty {
                            return Err(TypeError::new(
                                expr.location.clone(),
                                format!(
                                    "if branches have different types: {then_ty} vs {else_ty}"
                                ),
                            ));
                        }
                        then_ty
                    }
                }
            }

            ExprKind::While { cond, body } => {
                let cond_ty = self.visit(cond)?;
                require(&cond_ty, &Type::Bool, &expr.location, "while condition")?;
                self.visit(body)?;
                Type::Unit
            }

            ExprKind::Block { statements } => {
                self.scope.push();
                let mut result = Ok(Type::Unit);
                for stmt in statements {
                    if let Err(e) = self.check(stmt) {
                        result = Err(e);
                        break;
                    }
                }
                self.scope
                    .pop()
                    .expect("block scope is never the root scope");
                result?;
                Type::Unit
            }

            ExprKind::VarDecl {
                name,
                declared_type_name,
                value,
            } => {
                let value_ty = self.visit(value)?;
                if let Some(declared) = declared_type_name {
                    let declared_ty = match declared.as_str() {
                        "Int" => Type::Int,
                        "Bool" => Type::Bool,
                        other => {
                            return Err(TypeError::new(
                                expr.location.clone(),
                                format!("unknown type annotation '{other}'"),
                            ));
                        }
                    };
                    if declared_ty != value_ty {
                        return Err(TypeError::new(
                            expr.location.clone(),
                            format!(
                                "'{name}' declared as {declared_ty} but initialized with {value_ty}"
                            ),
                        ));
                    }
                }
                self.scope.define(name.as_str(), value_ty).map_err(|_| {
                    TypeError::new(
                        expr.location.clone(),
                        format!("'{name}' is already defined in this scope"),
                    )
                })?;
                Type::Unit
            }

            ExprKind::Call { callee, args } => {
                let mut arg_types = Vec::with_capacity(args.len());
                for arg in args {
                    arg_types.push(self.visit(arg)?);
                }
                let func = lookup_function(callee).ok_or_else(|| {
                    TypeError::new(
                        expr.location.clone(),
                        format!("undefined function '{callee}'"),
                    )
                })?;
                if func.params.len() != arg_types.len() {
                    return Err(TypeError::new(
                        expr.location.clone(),
                        format!(
                            "'{callee}' expects {} argument(s), got {}",
                            func.params.len(),
                            arg_types.len()
                        ),
                    ));
                }
                for (expected, got) in func.params.iter().zip(arg_types.iter()) {
                    if expected != got {
                        return Err(TypeError::new(
                            expr.location.clone(),
                            format!("'{callee}' expects {expected}, got {got}"),
                        ));
                    }
                }
                func.ret
            }
        };

        expr.set_ty(ty.clone());
        Ok(ty)
    }

    fn check_binary_op(
        &mut self,
        expr: &Expr,
        left: &Expr,
        op: &str,
        right: &Expr,
    ) -> Result<Type, TypeError> {
        let left_ty = self.visit(left)?;
        let right_ty = self.visit(right)?;

        match op {
            "+" | "-" | "*" | "/" | "%" => {
                require(&left_ty, &Type::Int, &expr.location, op)?;
                require(&right_ty, &Type::Int, &expr.location, op)?;
                Ok(Type::Int)
            }
            "<" | "<=" | ">" | ">=" => {
                require(&left_ty, &Type::Int, &expr.location, op)?;
                require(&right_ty, &Type::Int, &expr.location, op)?;
                Ok(Type::Bool)
            }
            "==" | "!=" => {
                if !matches!(left_ty, Type::Int | Type::Bool) {
                    return Err(TypeError::new(
                        expr.location.clone(),
                        format!("'{op}' is not defined for {left_ty}"),
                    ));
                }
                if left_ty != right_ty {
                    return Err(TypeError::new(
                        expr.location.clone(),
                        format!("cannot compare {left_ty} with {right_ty} using '{op}'"),
                    ));
                }
                Ok(Type::Bool)
            }
            "and" | "or" => {
                require(&left_ty, &Type::Bool, &expr.location, op)?;
                require(&right_ty, &Type::Bool, &expr.location, op)?;
                Ok(Type::Bool)
            }
            other => Err(TypeError::new(
                expr.location.clone(),
                format!("unknown operator '{other}'"),
            )),
        }
    }

    fn check_unary_op(&mut self, expr: &Expr, op: &str, operand: &Expr) -> Result<Type, TypeError> {
        let operand_ty = self.visit(operand)?;
        match op {
            "-" => {
                require(&operand_ty, &Type::Int, &expr.location, "unary -")?;
                Ok(Type::Int)
            }
            "not" => {
                require(&operand_ty, &Type::Bool, &expr.location, "not")?;
                Ok(Type::Bool)
            }
            other => Err(TypeError::new(
                expr.location.clone(),
                format!("unknown unary operator '{other}'"),
            )),
        }
    }
}

fn require(
    actual: &Type,
    expected: &Type,
    location: &pebble_core::SourceLocation,
    context: &str,
) -> Result<(), TypeError> {
    if actual != expected {
        return Err(TypeError::new(
            location.clone(),
            format!("{context} expects {expected}, got {actual}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn check(src: &str) -> Result<Type, TypeError> {
        let expr = Parser::new("t.pebble", src).parse().unwrap().unwrap();
        TypeChecker::new().check(&expr)
    }

    #[test]
    fn arithmetic_is_int() {
        assert_eq!(check("1 + 2 * 3").unwrap(), Type::Int);
    }

    #[test]
    fn comparison_is_bool() {
        assert_eq!(check("1 < 2").unwrap(), Type::Bool);
    }

    #[test]
    fn equality_requires_matching_types() {
        assert!(check("1 == true").is_err());
        assert_eq!(check("1 == 2").unwrap(), Type::Bool);
        assert_eq!(check("true == false").unwrap(), Type::Bool);
    }

    #[test]
    fn and_or_require_bool_operands() {
        assert!(check("1 and true").is_err());
        assert_eq!(check("true and false").unwrap(), Type::Bool);
    }

    #[test]
    fn unary_minus_requires_int() {
        assert!(check("- true").is_err());
        assert_eq!(check("- 1").unwrap(), Type::Int);
    }

    #[test]
    fn undefined_identifier_is_an_error() {
        assert!(check("x").is_err());
    }

    #[test]
    fn var_decl_binds_name_in_scope() {
        assert_eq!(check("{ var x = 1; x + 1 }").unwrap(), Type::Int);
    }

    #[test]
    fn var_decl_type_annotation_must_match() {
        assert!(check("var x: Bool = 1").is_err());
        assert!(check("var x: Int = 1").is_ok());
    }

    #[test]
    fn var_redefinition_in_same_scope_is_an_error() {
        assert!(check("{ var x = 1; var x = 2; }").is_err());
    }

    #[test]
    fn shadowing_in_child_scope_is_allowed() {
        assert!(check("{ var x = 1; { var x = true; } }").is_ok());
    }

    #[test]
    fn block_out_of_scope_after_close() {
        assert!(check("{ { var x = 1; } x }").is_err());
    }

    #[test]
    fn if_without_else_is_unit() {
        assert_eq!(check("if true then 1").unwrap(), Type::Unit);
    }

    #[test]
    fn if_with_else_requires_matching_branch_types() {
        assert!(check("if true then 1 else false").is_err());
        assert_eq!(check("if true then 1 else 2").unwrap(), Type::Int);
    }

    #[test]
    fn if_condition_must_be_bool() {
        assert!(check("if 1 then 1").is_err());
    }

    #[test]
    fn while_is_unit() {
        assert_eq!(check("while false do 1").unwrap(), Type::Unit);
    }

    #[test]
    fn assignment_requires_identifier_target() {
        assert!(check("{ var x = 1; x = 2 }").is_ok());
        assert!(check("1 = 2").is_err());
    }

    #[test]
    fn assignment_requires_matching_types() {
        assert!(check("{ var x = 1; x = true }").is_err());
    }

    #[test]
    fn builtin_calls_have_fixed_signatures() {
        assert_eq!(check("print_int(1)").unwrap(), Type::Unit);
        assert_eq!(check("print_bool(true)").unwrap(), Type::Unit);
        assert_eq!(check("read_int()").unwrap(), Type::Int);
        assert!(check("print_int(true)").is_err());
        assert!(check("print_int(1, 2)").is_err());
    }

    #[test]
    fn annotates_nodes_in_place() {
        let expr = Parser::new("t.pebble", "1 + 2").parse().unwrap().unwrap();
        assert!(expr.ty().is_none());
        TypeChecker::new().check(&expr).unwrap();
        assert_eq!(expr.ty(), Some(Type::Int));
    }
}
