//! The fixed table of built-in operators and functions.
//!
//! Per the design notes, operator dispatch is table-driven for naming
//! uniformity between operators and user-visible functions (interpreter,
//! IR generator), but the table itself is a `static` fixed at compile time
//! rather than a runtime-mutable map — there is no way for Pebble source to
//! introduce a new operator or function, so nothing needs to insert into it.

use pebble_core::Type;

/// One of the three built-in functions callable from Pebble source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub params: &'static [Type],
    pub ret: Type,
}

const PRINT_INT_PARAMS: [Type; 1] = [Type::Int];
const PRINT_BOOL_PARAMS: [Type; 1] = [Type::Bool];

pub fn builtin_functions() -> &'static [BuiltinFunction] {
    &[
        BuiltinFunction {
            name: "print_int",
            params: &PRINT_INT_PARAMS,
            ret: Type::Unit,
        },
        BuiltinFunction {
            name: "print_bool",
            params: &PRINT_BOOL_PARAMS,
            ret: Type::Unit,
        },
        BuiltinFunction {
            name: "read_int",
            params: &[],
            ret: Type::Int,
        },
    ]
}

pub fn lookup_function(name: &str) -> Option<BuiltinFunction> {
    builtin_functions().iter().cloned().find(|f| f.name == name)
}

/// Every binary/unary operator name the language recognizes, used to seed
/// the interpreter's and IR generator's root scope. `=` (assignment) is
/// deliberately absent: it never dispatches through the builtin table,
/// it is handled structurally by both passes.
pub const OPERATOR_NAMES: &[&str] = &[
    "+", "-", "*", "/", "%", "<", "<=", ">", ">=", "==", "!=", "and", "or", "unary_-", "not",
];

/// The type each operator's *result* carries, used by the IR generator to
/// seed `var_types` for the root scope. This is the corrected table per the
/// design notes: the reference's root type table has `unary_-` bound to
/// `Bool` and is missing `==` entirely — both are fixed here.
pub fn operator_result_type(op: &str) -> Option<Type> {
    match op {
        "+" | "-" | "*" | "/" | "%" | "unary_-" => Some(Type::Int),
        "<" | "<=" | ">" | ">=" | "==" | "!=" | "and" | "or" | "not" => Some(Type::Bool),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_int_takes_int_returns_unit() {
        let f = lookup_function("print_int").unwrap();
        assert_eq!(f.params, &[Type::Int]);
        assert_eq!(f.ret, Type::Unit);
    }

    #[test]
    fn read_int_takes_nothing_returns_int() {
        let f = lookup_function("read_int").unwrap();
        assert!(f.params.is_empty());
        assert_eq!(f.ret, Type::Int);
    }

    #[test]
    fn unary_minus_is_int_not_bool() {
        assert_eq!(operator_result_type("unary_-"), Some(Type::Int));
    }

    #[test]
    fn equality_operator_is_present() {
        assert_eq!(operator_result_type("=="), Some(Type::Bool));
    }
}
