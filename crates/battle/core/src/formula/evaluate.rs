//! Formula evaluation against a [`FormulaScope`].

use super::{BinaryOp, Formula, FormulaError, MathFn, Method, Operand, Property, UnaryOp};

/// Values a formula may read.
pub trait FormulaScope {
    /// `None` when the battler has no such value.
    fn property(&self, operand: Operand, property: Property) -> Option<f64>;

    fn method(&self, operand: Operand, method: Method, arg: f64) -> Option<f64>;

    /// Game variable; unset variables read 0.
    fn variable(&self, index: i32) -> f64;

    fn random(&self) -> f64;
}

fn truthy(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Evaluates `formula`. A NaN result is reported as [`FormulaError::NotANumber`].
pub fn evaluate(formula: &Formula, scope: &dyn FormulaScope) -> Result<f64, FormulaError> {
    let value = eval(formula, scope)?;
    if value.is_nan() {
        return Err(FormulaError::NotANumber);
    }
    Ok(value)
}

fn eval(formula: &Formula, scope: &dyn FormulaScope) -> Result<f64, FormulaError> {
    match formula {
        Formula::Number(value) => Ok(*value),

        Formula::Variable(index) => {
            let index = eval(index, scope)?;
            Ok(scope.variable(index as i32))
        }

        Formula::Property { operand, property } => scope
            .property(*operand, *property)
            .ok_or(FormulaError::Unavailable((*property).into())),

        Formula::Method {
            operand,
            method,
            arg,
        } => {
            let arg = eval(arg, scope)?;
            scope
                .method(*operand, *method, arg)
                .ok_or(FormulaError::Unavailable((*method).into()))
        }

        Formula::Call { function, args } => {
            let values = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(call(*function, &values, scope))
        }

        Formula::Unary { op, expr } => {
            let value = eval(expr, scope)?;
            Ok(match op {
                UnaryOp::Neg => -value,
                UnaryOp::Plus => value,
                UnaryOp::Not => flag(!truthy(value)),
            })
        }

        Formula::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, scope)?;
            // Logical operators short-circuit and yield an operand.
            match op {
                BinaryOp::And if !truthy(lhs) => return Ok(lhs),
                BinaryOp::Or if truthy(lhs) => return Ok(lhs),
                BinaryOp::And | BinaryOp::Or => return eval(rhs, scope),
                _ => {}
            }
            let rhs = eval(rhs, scope)?;
            Ok(match op {
                BinaryOp::Add => lhs + rhs,
                BinaryOp::Sub => lhs - rhs,
                BinaryOp::Mul => lhs * rhs,
                BinaryOp::Div => lhs / rhs,
                BinaryOp::Rem => lhs % rhs,
                BinaryOp::Lt => flag(lhs < rhs),
                BinaryOp::Le => flag(lhs <= rhs),
                BinaryOp::Gt => flag(lhs > rhs),
                BinaryOp::Ge => flag(lhs >= rhs),
                BinaryOp::Eq => flag(lhs == rhs),
                BinaryOp::Ne => flag(lhs != rhs),
                BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
            })
        }

        Formula::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if truthy(eval(condition, scope)?) {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
    }
}

fn call(function: MathFn, args: &[f64], scope: &dyn FormulaScope) -> f64 {
    let first = args.first().copied().unwrap_or(f64::NAN);
    match function {
        MathFn::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        MathFn::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
        MathFn::Floor => first.floor(),
        MathFn::Ceil => first.ceil(),
        MathFn::Round => super::round_half_up(first),
        MathFn::Abs => first.abs(),
        MathFn::Sqrt => first.sqrt(),
        MathFn::Pow => first.powf(args.get(1).copied().unwrap_or(f64::NAN)),
        MathFn::Random => scope.random(),
    }
}
