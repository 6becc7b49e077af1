//! Compile-time constant folding: int/float passthrough, named-constant
//! lookup (with recursion), and binary arithmetic over `+ - * / div mod`.
//! Used for array bounds and for inlining named constants during code
//! generation.

use crate::ast::{BinOpKind, Expr};
use crate::error::CompileError;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Real(f64),
}

impl ConstValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstValue::Int(v) => Some(*v),
            ConstValue::Real(_) => None,
        }
    }
}

/// Folds `expr` to a scalar value, resolving named constants through `consts`.
pub fn eval_const(expr: &Expr, consts: &HashMap<String, Expr>) -> Result<ConstValue, CompileError> {
    eval_inner(expr, consts, 0)
}

fn eval_inner(
    expr: &Expr,
    consts: &HashMap<String, Expr>,
    depth: usize,
) -> Result<ConstValue, CompileError> {
    if depth > 64 {
        return Err(CompileError::declaration(expr.line(), "constant expression recurses too deeply"));
    }
    match expr {
        Expr::IntLit(v, _) => Ok(ConstValue::Int(*v)),
        Expr::RealLit(v, _) => Ok(ConstValue::Real(*v)),
        Expr::Ident(name, line) => {
            let def = consts
                .get(name)
                .ok_or_else(|| CompileError::declaration(*line, format!("'{name}' is not a constant")))?;
            eval_inner(def, consts, depth + 1)
        }
        Expr::BinOp { op, lhs, rhs, line } => {
            let l = eval_inner(lhs, consts, depth + 1)?;
            let r = eval_inner(rhs, consts, depth + 1)?;
            eval_binop(*op, l, r, *line)
        }
        other => Err(CompileError::declaration(
            other.line(),
            "expression is not a compile-time constant",
        )),
    }
}

fn eval_binop(op: BinOpKind, l: ConstValue, r: ConstValue, line: usize) -> Result<ConstValue, CompileError> {
    use ConstValue::*;
    match (op, l, r) {
        (BinOpKind::Add, Int(a), Int(b)) => Ok(Int(a + b)),
        (BinOpKind::Add, a, b) => Ok(Real(as_f64(a) + as_f64(b))),
        (BinOpKind::Sub, Int(a), Int(b)) => Ok(Int(a - b)),
        (BinOpKind::Sub, a, b) => Ok(Real(as_f64(a) - as_f64(b))),
        (BinOpKind::Mul, Int(a), Int(b)) => Ok(Int(a * b)),
        (BinOpKind::Mul, a, b) => Ok(Real(as_f64(a) * as_f64(b))),
        (BinOpKind::Div, a, b) => Ok(Real(as_f64(a) / as_f64(b))),
        (BinOpKind::IDiv, Int(a), Int(b)) => {
            if b == 0 {
                return Err(CompileError::declaration(line, "division by zero in constant expression"));
            }
            Ok(Int(a / b))
        }
        (BinOpKind::Mod, Int(a), Int(b)) => {
            if b == 0 {
                return Err(CompileError::declaration(line, "division by zero in constant expression"));
            }
            Ok(Int(a % b))
        }
        _ => Err(CompileError::declaration(line, "invalid operator in constant expression")),
    }
}

fn as_f64(v: ConstValue) -> f64 {
    match v {
        ConstValue::Int(v) => v as f64,
        ConstValue::Real(v) => v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_constant_recurses_through_another_constant() {
        let mut consts = HashMap::new();
        consts.insert("a".to_string(), Expr::IntLit(2, 1));
        consts.insert("b".to_string(), Expr::Ident("a".to_string(), 1));
        assert_eq!(eval_const(&Expr::Ident("b".to_string(), 1), &consts).unwrap(), ConstValue::Int(2));
    }

    #[test]
    fn integer_division_by_zero_is_an_error() {
        let expr = Expr::BinOp {
            op: BinOpKind::IDiv,
            lhs: Box::new(Expr::IntLit(1, 1)),
            rhs: Box::new(Expr::IntLit(0, 1)),
            line: 1,
        };
        assert!(eval_const(&expr, &HashMap::new()).is_err());
    }

    #[test]
    fn mixed_int_real_arithmetic_widens_to_real() {
        let expr = Expr::BinOp {
            op: BinOpKind::Add,
            lhs: Box::new(Expr::IntLit(1, 1)),
            rhs: Box::new(Expr::RealLit(0.5, 1)),
            line: 1,
        };
        assert_eq!(eval_const(&expr, &HashMap::new()).unwrap(), ConstValue::Real(1.5));
    }

    #[test]
    fn self_referential_constant_hits_the_depth_guard() {
        let mut consts = HashMap::new();
        consts.insert("a".to_string(), Expr::Ident("a".to_string(), 1));
        assert!(eval_const(&Expr::Ident("a".to_string(), 1), &consts).is_err());
    }
}
