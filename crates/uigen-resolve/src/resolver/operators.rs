//! Binary operator evaluation over literal operands, split by numeric
//! category. Mixed or non-numeric categories fall back to string
//! concatenation (for `+`) or fail with an unsupported-operation error.

use crate::context::Context;
use crate::error::{debug_node, structural_error, unsupported_op};
use crate::resolver::Resolver;
use uigen_core::ast::{Expr, ExprBinary, Lit};
use uigen_core::ops::BinOp;
use uigen_core::Result;

enum NumPair {
    Int(i32, i32),
    Long(i64, i64),
    Double(f64, f64),
    Char(char, char),
}

fn numeric_pair(lhs: &Expr, rhs: &Expr) -> Option<NumPair> {
    match (lhs.as_lit()?, rhs.as_lit()?) {
        (Lit::Int(l), Lit::Int(r)) => Some(NumPair::Int(*l, *r)),
        (Lit::Long(l), Lit::Long(r)) => Some(NumPair::Long(*l, *r)),
        (Lit::Double(l), Lit::Double(r)) => Some(NumPair::Double(*l, *r)),
        (Lit::Char(l), Lit::Char(r)) => Some(NumPair::Char(*l, *r)),
        _ => None,
    }
}

impl Resolver {
    pub(super) fn eval_binary(
        &self,
        ctx: &mut Context,
        expr: &Expr,
        binary: &ExprBinary,
    ) -> Result<Expr> {
        let lhs = self.lookup_node(ctx, &binary.lhs)?;
        let rhs = self.lookup_node(ctx, &binary.rhs)?;
        let lhs = self.resolve_var(ctx, &lhs)?;
        let rhs = self.resolve_var(ctx, &rhs)?;
        match binary.op {
            BinOp::Add => match numeric_pair(&lhs, &rhs) {
                Some(pair) => eval_arith(expr, BinOp::Add, pair),
                None => {
                    // non-numeric addition is string concatenation
                    let left = self.resolve_string(ctx, &lhs)?;
                    let right = self.resolve_string(ctx, &rhs)?;
                    Ok(Expr::string(format!("{left}{right}")))
                }
            },
            op if op.is_arithmetic() => match numeric_pair(&lhs, &rhs) {
                Some(pair) => eval_arith(expr, op, pair),
                None => Err(operand_mismatch(expr, op, &lhs, &rhs)),
            },
            op if op.is_ordering() => match numeric_pair(&lhs, &rhs) {
                Some(pair) => Ok(Expr::bool_lit(eval_ordering(op, pair))),
                None => Err(operand_mismatch(expr, op, &lhs, &rhs)),
            },
            op @ (BinOp::And | BinOp::Or) => {
                let left = boolean_operand(expr, op, &lhs)?;
                let right = boolean_operand(expr, op, &rhs)?;
                Ok(Expr::bool_lit(match op {
                    BinOp::And => left && right,
                    _ => left || right,
                }))
            }
            op @ (BinOp::Eq | BinOp::Ne) => {
                let left = self.resolve_string(ctx, &lhs)?;
                let right = self.resolve_string(ctx, &rhs)?;
                let equal = left == right;
                Ok(Expr::bool_lit(if op == BinOp::Eq { equal } else { !equal }))
            }
            op => Err(operand_mismatch(expr, op, &lhs, &rhs)),
        }
    }
}

fn boolean_operand(expr: &Expr, op: BinOp, operand: &Expr) -> Result<bool> {
    operand.as_bool().ok_or_else(|| {
        structural_error(
            format!(
                "operand of {} did not evaluate to a boolean literal in {};\nreceived: {}",
                op,
                debug_node(expr),
                debug_node(operand)
            ),
            operand.span,
        )
    })
}

fn operand_mismatch(expr: &Expr, op: BinOp, lhs: &Expr, rhs: &Expr) -> uigen_core::Error {
    unsupported_op(
        format!(
            "cannot apply {} to the nodes of {}\nleft: {}\nright: {}",
            op,
            debug_node(expr),
            debug_node(lhs),
            debug_node(rhs)
        ),
        expr.span,
    )
}

fn eval_arith(expr: &Expr, op: BinOp, pair: NumPair) -> Result<Expr> {
    match pair {
        NumPair::Int(l, r) => Ok(Expr::int(apply_int(expr, op, l, r)?)),
        NumPair::Long(l, r) => Ok(Expr::long(apply_long(expr, op, l, r)?)),
        NumPair::Double(l, r) => Ok(Expr::double(apply_double(expr, op, l, r)?)),
        NumPair::Char(l, r) => {
            let raw = apply_int(expr, op, l as i32, r as i32)?;
            let value = u32::try_from(raw)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| {
                    unsupported_op(
                        format!(
                            "char {} in {} produced a non-character code point {}",
                            op,
                            debug_node(expr),
                            raw
                        ),
                        expr.span,
                    )
                })?;
            Ok(Expr::char_lit(value))
        }
    }
}

fn eval_ordering(op: BinOp, pair: NumPair) -> bool {
    match pair {
        NumPair::Int(l, r) => ordered(op, &l, &r),
        NumPair::Long(l, r) => ordered(op, &l, &r),
        NumPair::Double(l, r) => match op {
            BinOp::Lt => l < r,
            BinOp::Le => l <= r,
            BinOp::Gt => l > r,
            _ => l >= r,
        },
        NumPair::Char(l, r) => ordered(op, &l, &r),
    }
}

fn ordered<T: Ord>(op: BinOp, l: &T, r: &T) -> bool {
    match op {
        BinOp::Lt => l < r,
        BinOp::Le => l <= r,
        BinOp::Gt => l > r,
        _ => l >= r,
    }
}

fn apply_int(expr: &Expr, op: BinOp, l: i32, r: i32) -> Result<i32> {
    Ok(match op {
        BinOp::Add => l.wrapping_add(r),
        BinOp::Sub => l.wrapping_sub(r),
        BinOp::Mul => l.wrapping_mul(r),
        BinOp::Div => {
            if r == 0 {
                return Err(division_by_zero(expr));
            }
            l.wrapping_div(r)
        }
        BinOp::Rem => {
            if r == 0 {
                return Err(division_by_zero(expr));
            }
            l.wrapping_rem(r)
        }
        // shift distances mask to the operand width
        BinOp::Shl => l.wrapping_shl(r as u32),
        BinOp::Shr => l.wrapping_shr(r as u32),
        BinOp::UShr => ((l as u32).wrapping_shr(r as u32)) as i32,
        BinOp::BitXor => l ^ r,
        BinOp::BitAnd => l & r,
        BinOp::BitOr => l | r,
        _ => return Err(not_arithmetic(expr, op)),
    })
}

fn apply_long(expr: &Expr, op: BinOp, l: i64, r: i64) -> Result<i64> {
    Ok(match op {
        BinOp::Add => l.wrapping_add(r),
        BinOp::Sub => l.wrapping_sub(r),
        BinOp::Mul => l.wrapping_mul(r),
        BinOp::Div => {
            if r == 0 {
                return Err(division_by_zero(expr));
            }
            l.wrapping_div(r)
        }
        BinOp::Rem => {
            if r == 0 {
                return Err(division_by_zero(expr));
            }
            l.wrapping_rem(r)
        }
        BinOp::Shl => l.wrapping_shl(r as u32),
        BinOp::Shr => l.wrapping_shr(r as u32),
        BinOp::UShr => ((l as u64).wrapping_shr(r as u32)) as i64,
        BinOp::BitXor => l ^ r,
        BinOp::BitAnd => l & r,
        BinOp::BitOr => l | r,
        _ => return Err(not_arithmetic(expr, op)),
    })
}

fn apply_double(expr: &Expr, op: BinOp, l: f64, r: f64) -> Result<f64> {
    Ok(match op {
        BinOp::Add => l + r,
        BinOp::Sub => l - r,
        BinOp::Mul => l * r,
        BinOp::Div => l / r,
        BinOp::Rem => l % r,
        _ => {
            return Err(unsupported_op(
                format!(
                    "cannot apply {} to floating point operands in {}",
                    op,
                    debug_node(expr)
                ),
                expr.span,
            ))
        }
    })
}

fn division_by_zero(expr: &Expr) -> uigen_core::Error {
    unsupported_op(
        format!("division by zero in {}", debug_node(expr)),
        expr.span,
    )
}

fn not_arithmetic(expr: &Expr, op: BinOp) -> uigen_core::Error {
    unsupported_op(
        format!("{} is not an arithmetic operator in {}", op, debug_node(expr)),
        expr.span,
    )
}
