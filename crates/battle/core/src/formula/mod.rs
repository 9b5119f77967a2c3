//! Damage formula language.
//!
//! Skill and item damage is written as a small expression over the subject
//! `a`, the target `b` and game variables `v[n]`:
//!
//! ```ignore
//! // classic physical attack
//! Formula::parse("a.atk * 4 - b.def * 2")?;
//!
//! // heal scaled by magic, capped by the target's missing HP
//! Formula::parse("Math.min(a.mat * 2 + 50, b.mhp - b.hp)")?;
//!
//! // bonus against poisoned targets
//! Formula::parse("b.isStateAffected(4) ? a.atk * 6 : a.atk * 3")?;
//! ```
//!
//! The language is arithmetic only: no assignment, loops or calls outside
//! the fixed function set. The only side effect is `Math.random()`, which
//! draws from the battle RNG.

mod evaluate;
mod parse;

pub use evaluate::{FormulaScope, evaluate};

/// Errors raised while parsing or evaluating a damage formula.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedChar { ch: char, position: usize },

    #[error("unexpected token '{found}' at {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("{function} takes {expected} argument(s), got {found}")]
    WrongArity {
        function: &'static str,
        expected: usize,
        found: usize,
    },

    /// The battler has no such value (an enemy's level).
    #[error("'{0}' is not available for this battler")]
    Unavailable(&'static str),

    #[error("formula evaluated to NaN")]
    NotANumber,
}

impl crate::error::BattleError for FormulaError {
    fn severity(&self) -> crate::error::ErrorSeverity {
        use crate::error::ErrorSeverity;
        match self {
            Self::Unavailable(_) | Self::NotANumber => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnexpectedChar { .. } => "FORMULA_UNEXPECTED_CHAR",
            Self::UnexpectedToken { .. } => "FORMULA_UNEXPECTED_TOKEN",
            Self::UnexpectedEnd => "FORMULA_UNEXPECTED_END",
            Self::UnknownIdentifier(_) => "FORMULA_UNKNOWN_IDENTIFIER",
            Self::WrongArity { .. } => "FORMULA_WRONG_ARITY",
            Self::Unavailable(_) => "FORMULA_UNAVAILABLE",
            Self::NotANumber => "FORMULA_NOT_A_NUMBER",
        }
    }
}

// ============================================================================
// Syntax tree
// ============================================================================

/// Which battler a property or method reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// `a`
    Subject,
    /// `b`
    Target,
}

/// Readable battler value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Property {
    Hp,
    Mp,
    Tp,
    Mhp,
    Mmp,
    Atk,
    Def,
    Mat,
    Mdf,
    Agi,
    Luk,
    Hit,
    Eva,
    Cri,
    Cev,
    Mev,
    Mrf,
    Cnt,
    Hrg,
    Mrg,
    Trg,
    Tgr,
    Grd,
    Rec,
    Pha,
    Mcr,
    Tcr,
    Pdr,
    Mdr,
    Fdr,
    Exr,
    Level,
}

/// Battler query taking one numeric argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum Method {
    IsStateAffected,
    IsBuffAffected,
    IsDebuffAffected,
    Buff,
    Param,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum MathFn {
    Max,
    Min,
    Floor,
    Ceil,
    Round,
    Abs,
    Sqrt,
    Pow,
    Random,
}

impl MathFn {
    /// `None` means variadic (at least one argument).
    fn arity(self) -> Option<usize> {
        match self {
            Self::Max | Self::Min => None,
            Self::Random => Some(0),
            Self::Pow => Some(2),
            _ => Some(1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

/// Parsed formula.
#[derive(Clone, Debug, PartialEq)]
pub enum Formula {
    Number(f64),
    /// `v[index]`
    Variable(Box<Formula>),
    Property {
        operand: Operand,
        property: Property,
    },
    Method {
        operand: Operand,
        method: Method,
        arg: Box<Formula>,
    },
    Call {
        function: MathFn,
        args: Vec<Formula>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Formula>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Formula>,
        rhs: Box<Formula>,
    },
    Conditional {
        condition: Box<Formula>,
        then: Box<Formula>,
        otherwise: Box<Formula>,
    },
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        parse::Parser::new(source)?.parse()
    }
}

impl core::str::FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Rounds halves toward positive infinity, as game formulas expect
/// (`-2.5` becomes `-2`).
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_round_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
        assert_eq!(round_half_up(7.0), 7.0);
    }

    #[test]
    fn names_map_to_variants() {
        assert_eq!("mhp".parse::<Property>(), Ok(Property::Mhp));
        assert_eq!("isStateAffected".parse::<Method>(), Ok(Method::IsStateAffected));
        assert_eq!("pow".parse::<MathFn>(), Ok(MathFn::Pow));
        assert!("MHP".parse::<Property>().is_err());
    }
}
