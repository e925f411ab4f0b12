//! Abstract syntax tree produced by the parser and annotated by the type
//! checker.
//!
//! Every node carries a [`SourceLocation`] and, once the type checker has
//! visited it, a [`Type`]. The annotation is written in place through a
//! `RefCell` rather than rebuilding the tree, matching how a single
//! recursive traversal is expected to decorate the nodes it already owns.

use pebble_core::{SourceLocation, Type};
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Unit,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub location: SourceLocation,
    pub ty: RefCell<Option<Type>>,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    BinaryOp {
        left: Box<Expr>,
        op: String,
        right: Box<Expr>,
    },
    UnaryOp {
        op: String,
        operand: Box<Expr>,
    },
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },
    While {
        cond: Box<Expr>,
        body: Box<Expr>,
    },
    Block {
        statements: Vec<Expr>,
    },
    VarDecl {
        name: String,
        declared_type_name: Option<String>,
        value: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn new(location: SourceLocation, kind: ExprKind) -> Self {
        Expr {
            location,
            ty: RefCell::new(None),
            kind,
        }
    }

    pub fn ty(&self) -> Option<Type> {
        self.ty.borrow().clone()
    }

    pub fn set_ty(&self, ty: Type) {
        *self.ty.borrow_mut() = Some(ty);
    }
}

/// Structural equality, ignoring both locations and type annotations.
/// Used by the parser's round-trip tests (§8 property 1 in the design doc).
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl PartialEq for ExprKind {
    fn eq(&self, other: &Self) -> bool {
        use ExprKind::*;
        match (self, other) {
            (Literal(a), Literal(b)) => a == b,
            (Identifier(a), Identifier(b)) => a == b,
            (
                BinaryOp {
                    left: l1,
                    op: o1,
                    right: r1,
                },
                BinaryOp {
                    left: l2,
                    op: o2,
                    right: r2,
                },
            ) => o1 == o2 && l1 == l2 && r1 == r2,
            (
                UnaryOp {
                    op: o1,
                    operand: e1,
                },
                UnaryOp {
                    op: o2,
                    operand: e2,
                },
            ) => o1 == o2 && e1 == e2,
            (
                If {
                    cond: c1,
                    then_branch: t1,
                    else_branch: e1,
                },
                If {
                    cond: c2,
                    then_branch: t2,
                    else_branch: e2,
                },
            ) => c1 == c2 && t1 == t2 && e1 == e2,
            (
                While {
                    cond: c1,
                    body: b1,
                },
                While {
                    cond: c2,
                    body: b2,
                },
            ) => c1 == c2 && b1 == b2,
            (Block { statements: s1 }, Block { statements: s2 }) => s1 == s2,
            (
                VarDecl {
                    name: n1,
                    declared_type_name: d1,
                    value: v1,
                },
                VarDecl {
                    name: n2,
                    declared_type_name: d2,
                    value: v2,
                },
            ) => n1 == n2 && d1 == d2 && v1 == v2,
            (
                Call {
                    callee: c1,
                    args: a1,
                },
                Call {
                    callee: c2,
                    args: a2,
                },
            ) => c1 == c2 && a1 == a2,
            _ => false,
        }
    }
}

/// Helpers for building nodes with a throwaway location, handy in tests
/// that only care about shape.
#[cfg(test)]
pub(crate) mod build {
    use super::*;

    pub fn int(n: i64) -> Expr {
        Expr::new(SourceLocation::any(), ExprKind::Literal(Literal::Int(n)))
    }

    pub fn boolean(b: bool) -> Expr {
        Expr::new(SourceLocation::any(), ExprKind::Literal(Literal::Bool(b)))
    }

    pub fn ident(name: &str) -> Expr {
        Expr::new(SourceLocation::any(), ExprKind::Identifier(name.to_string()))
    }

    pub fn binop(left: Expr, op: &str, right: Expr) -> Expr {
        Expr::new(
            SourceLocation::any(),
            ExprKind::BinaryOp {
                left: Box::new(left),
                op: op.to_string(),
                right: Box::new(right),
            },
        )
    }
}
