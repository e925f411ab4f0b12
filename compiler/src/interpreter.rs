//! Tree-walking interpreter.
//!
//! Operators and built-in functions share one dispatch path: the root scope
//! binds every operator name (`"+"`, `"unary_-"`, …) and every built-in
//! function name to a [`Value::Builtin`], and [`Interpreter::apply_builtin`]
//! is the single place that knows what each of those names actually does.
//! `and`/`or` are handled before reaching that table because they need to
//! skip evaluating their right operand.

use std::fmt;
use std::io::{self, BufRead, Write};

use crate::ast::{Expr, ExprKind, Literal};
use crate::builtins::OPERATOR_NAMES;
use crate::errors::InterpretError;
use pebble_core::SymbolTable;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Unit,
    Builtin(&'static str),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Unit => write!(f, "unit"),
            Value::Builtin(name) => write!(f, "<builtin {name}>"),
        }
    }
}

const BUILTIN_FUNCTION_NAMES: &[&str] = &["print_int", "print_bool", "read_int"];

pub struct Interpreter<R: BufRead, W: Write> {
    scope: SymbolTable<Value>,
    stdin: R,
    stdout: W,
}

impl Interpreter<io::BufReader<io::Stdin>, io::Stdout> {
    pub fn new() -> Self {
        Interpreter::with_io(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl Default for Interpreter<io::BufReader<io::Stdin>, io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead, W: Write> Interpreter<R, W> {
    pub fn with_io(stdin: R, stdout: W) -> Self {
        let mut root = std::collections::HashMap::new();
        for name in OPERATOR_NAMES {
            root.insert(name.to_string(), Value::Builtin(name));
        }
        for name in BUILTIN_FUNCTION_NAMES {
            root.insert(name.to_string(), Value::Builtin(name));
        }

        Interpreter {
            scope: SymbolTable::with_root(root),
            stdin,
            stdout,
        }
    }

    pub fn run(&mut self, expr: &Expr) -> Result<Value, InterpretError> {
        self.eval(expr)
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, InterpretError> {
        match &expr.kind {
            ExprKind::Literal(Literal::Int(n)) => Ok(Value::Int(*n)),
            ExprKind::Literal(Literal::Bool(b)) => Ok(Value::Bool(*b)),
            ExprKind::Literal(Literal::Unit) => Ok(Value::Unit),

            ExprKind::Identifier(name) => self.scope.lookup(name).cloned().ok_or_else(|| {
                InterpretError::new(expr.location.clone(), format!("undefined variable '{name}'"))
            }),

            ExprKind::BinaryOp { left, op, right } if op == "=" => {
                let name = match &left.kind {
                    ExprKind::Identifier(name) => name.clone(),
                    _ => {
                        return Err(InterpretError::new(
                            expr.location.clone(),
                            "left side of an assignment must be an identifier",
                        ));
                    }
                };
                let value = self.eval(right)?;
                self.scope.assign(&name, value.clone()).map_err(|_| {
                    InterpretError::new(
                        expr.location.clone(),
                        format!("undefined variable '{name}'"),
                    )
                })?;
                Ok(value)
            }

            ExprKind::BinaryOp { left, op, right } if op == "and" => {
                let left_val = self.eval(left)?;
                match left_val {
                    Value::Bool(false) => Ok(Value::Bool(false)),
                    Value::Bool(true) => self.eval(right),
                    other => Err(InterpretError::new(
                        expr.location.clone(),
                        format!("'and' expects Bool, got {other}"),
                    )),
                }
            }

            ExprKind::BinaryOp { left, op, right } if op == "or" => {
                let left_val = self.eval(left)?;
                match left_val {
                    Value::Bool(true) => Ok(Value::Bool(true)),
                    Value::Bool(false) => self.eval(right),
                    other => Err(InterpretError::new(
                        expr.location.clone(),
                        format!("'or' expects Bool, got {other}"),
                    )),
                }
            }

            ExprKind::BinaryOp { left, op, right } => {
                let left_val = self.eval(left)?;
                let right_val = self.eval(right)?;
                self.dispatch(op, &[left_val, right_val], &expr.location)
            }

            ExprKind::UnaryOp { op, operand } => {
                let operand_val = self.eval(operand)?;
                let op_name: String = if op == "-" {
                    "unary_-".to_string()
                } else {
                    op.clone()
                };
                self.dispatch(&op_name, &[operand_val], &expr.location)
            }

            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_val = self.eval(cond)?;
                let is_true = self.expect_bool(&cond_val, &expr.location)?;
                match else_branch {
                    None => {
                        if is_true {
                            self.eval(then_branch)?;
                        }
                        Ok(Value::Unit)
                    }
                    Some(else_branch) => {
                        if is_true {
                            self.eval(then_branch)
                        } else {
                            self.eval(else_branch)
                        }
                    }
                }
            }

            ExprKind::While { cond, body } => {
                loop {
                    let cond_val = self.eval(cond)?;
                    if !self.expect_bool(&cond_val, &expr.location)? {
                        break;
                    }
                    self.eval(body)?;
                }
                Ok(Value::Unit)
            }

            ExprKind::Block { statements } => {
                self.scope.push();
                let mut result = Ok(Value::Unit);
                for stmt in statements {
                    match self.eval(stmt) {
                        Ok(v) => result = Ok(v),
                        Err(e) => {
                            result = Err(e);
                            break;
                        }
                    }
                }
                self.scope.pop().expect("block scope is never the root");
                result
            }

            ExprKind::VarDecl { name, value, .. } => {
                let value = self.eval(value)?;
                self.scope.define(name.as_str(), value).map_err(|_| {
                    InterpretError::new(
                        expr.location.clone(),
                        format!("'{name}' is already defined in this scope"),
                    )
                })?;
                Ok(Value::Unit)
            }

            ExprKind::Call { callee, args } => {
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval(arg)?);
                }
                self.dispatch(callee, &arg_values, &expr.location)
            }
        }
    }

    fn expect_bool(
        &self,
        value: &Value,
        location: &pebble_core::SourceLocation,
    ) -> Result<bool, InterpretError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(InterpretError::new(
                location.clone(),
                format!("expected Bool, got {other}"),
            )),
        }
    }

    fn dispatch(
        &mut self,
        name: &str,
        args: &[Value],
        location: &pebble_core::SourceLocation,
    ) -> Result<Value, InterpretError> {
        match self.scope.lookup(name) {
            Some(Value::Builtin(_)) => {}
            Some(_) => {
                return Err(InterpretError::new(
                    location.clone(),
                    format!("'{name}' is not callable"),
                ));
            }
            None => {
                return Err(InterpretError::new(
                    location.clone(),
                    format!("undefined function '{name}'"),
                ));
            }
        }
        self.apply_builtin(name, args, location)
    }

    fn apply_builtin(
        &mut self,
        name: &str,
        args: &[Value],
        location: &pebble_core::SourceLocation,
    ) -> Result<Value, InterpretError> {
        use Value::*;

        let int_args = || -> Result<(i64, i64), InterpretError> {
            match (&args[0], &args[1]) {
                (Int(a), Int(b)) => Ok((*a, *b)),
                _ => Err(InterpretError::new(
                    location.clone(),
                    format!("'{name}' expects two Int arguments"),
                )),
            }
        };

        match name {
            "+" => {
                let (a, b) = int_args()?;
                Ok(Int(a + b))
            }
            "-" => {
                let (a, b) = int_args()?;
                Ok(Int(a - b))
            }
            "*" => {
                let (a, b) = int_args()?;
                Ok(Int(a * b))
            }
            "/" => {
                let (a, b) = int_args()?;
                if b == 0 {
                    return Err(InterpretError::new(location.clone(), "division by zero"));
                }
                Ok(Int(a / b))
            }
            "%" => {
                let (a, b) = int_args()?;
                if b == 0 {
                    return Err(InterpretError::new(location.clone(), "division by zero"));
                }
                Ok(Int(a % b))
            }
            "<" => {
                let (a, b) = int_args()?;
                Ok(Bool(a < b))
            }
            "<=" => {
                let (a, b) = int_args()?;
                Ok(Bool(a <= b))
            }
            ">" => {
                let (a, b) = int_args()?;
                Ok(Bool(a > b))
            }
            ">=" => {
                let (a, b) = int_args()?;
                Ok(Bool(a >= b))
            }
            "==" => Ok(Bool(args[0] == args[1])),
            "!=" => Ok(Bool(args[0] != args[1])),
            "unary_-" => match &args[0] {
                Int(n) => Ok(Int(-n)),
                other => Err(InterpretError::new(
                    location.clone(),
                    format!("unary '-' expects Int, got {other}"),
                )),
            },
            "not" => match &args[0] {
                Bool(b) => Ok(Bool(!b)),
                other => Err(InterpretError::new(
                    location.clone(),
                    format!("'not' expects Bool, got {other}"),
                )),
            },
            "print_int" => match &args[0] {
                Int(n) => {
                    writeln!(self.stdout, "{n}").map_err(|e| {
                        InterpretError::new(location.clone(), format!("write failed: {e}"))
                    })?;
                    Ok(Unit)
                }
                other => Err(InterpretError::new(
                    location.clone(),
                    format!("'print_int' expects Int, got {other}"),
                )),
            },
            "print_bool" => match &args[0] {
                Bool(b) => {
                    writeln!(self.stdout, "{b}").map_err(|e| {
                        InterpretError::new(location.clone(), format!("write failed: {e}"))
                    })?;
                    Ok(Unit)
                }
                other => Err(InterpretError::new(
                    location.clone(),
                    format!("'print_bool' expects Bool, got {other}"),
                )),
            },
            "read_int" => {
                let mut line = String::new();
                self.stdin.read_line(&mut line).map_err(|e| {
                    InterpretError::new(location.clone(), format!("read failed: {e}"))
                })?;
                let value: i64 = line.trim().parse().map_err(|_| {
                    InterpretError::new(
                        location.clone(),
                        format!("'{}' is not a valid integer", line.trim()),
                    )
                })?;
                Ok(Int(value))
            }
            other => Err(InterpretError::new(
                location.clone(),
                format!("unknown builtin '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::typechecker::TypeChecker;
    use std::io::Cursor;

    fn run(src: &str) -> Value {
        let expr = Parser::new("t.pebble", src).parse().unwrap().unwrap();
        TypeChecker::new().check(&expr).unwrap();
        let mut interp = Interpreter::with_io(Cursor::new(Vec::new()), Vec::<u8>::new());
        interp.run(&expr).unwrap()
    }

    fn run_with_output(src: &str, input: &str) -> (Value, String) {
        let expr = Parser::new("t.pebble", src).parse().unwrap().unwrap();
        TypeChecker::new().check(&expr).unwrap();
        let mut interp = Interpreter::with_io(Cursor::new(input.as_bytes().to_vec()), Vec::<u8>::new());
        let result = interp.run(&expr).unwrap();
        let output = String::from_utf8(interp.stdout.clone()).unwrap();
        (result, output)
    }

    #[test]
    fn arithmetic_evaluates() {
        assert_eq!(run("1 + 2 * 3"), Value::Int(7));
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(run("-7 / 2"), Value::Int(-3));
        assert_eq!(run("-7 % 2"), Value::Int(-1));
    }

    #[test]
    fn and_short_circuits() {
        // the right side would type-error if it were ever evaluated
        assert_eq!(run("{ var x = false; x and (1 == true) }"), Value::Bool(false));
    }

    #[test]
    fn or_short_circuits() {
        // the right side would type-error if it were ever evaluated
        assert_eq!(run("{ var x = true; x or (1 == true) }"), Value::Bool(true));
    }

    #[test]
    fn if_without_else_always_yields_unit() {
        assert_eq!(run("if true then 5"), Value::Unit);
    }

    #[test]
    fn if_with_else_yields_branch_value() {
        assert_eq!(run("if false then 1 else 2"), Value::Int(2));
    }

    #[test]
    fn while_counts_down() {
        let v = run("{ var x = 3; var acc = 0; while x > 0 do { acc = acc + x; x = x - 1; }; acc }");
        assert_eq!(v, Value::Int(6));
    }

    #[test]
    fn block_result_is_last_statement() {
        assert_eq!(run("{ 1; 2; 3 }"), Value::Int(3));
    }

    #[test]
    fn assignment_updates_outer_scope() {
        assert_eq!(run("{ var x = 1; { x = 2; }; x }"), Value::Int(2));
    }

    #[test]
    fn print_int_writes_a_line() {
        let (_, out) = run_with_output("print_int(42)", "");
        assert_eq!(out, "42\n");
    }

    #[test]
    fn print_bool_writes_true_false() {
        let (_, out) = run_with_output("print_bool(true)", "");
        assert_eq!(out, "true\n");
    }

    #[test]
    fn read_int_parses_a_line() {
        let (v, _) = run_with_output("read_int()", "17\n");
        assert_eq!(v, Value::Int(17));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let expr = Parser::new("t.pebble", "1 / 0").parse().unwrap().unwrap();
        TypeChecker::new().check(&expr).unwrap();
        let mut interp = Interpreter::with_io(Cursor::new(Vec::new()), Vec::<u8>::new());
        assert!(interp.run(&expr).is_err());
    }
}
