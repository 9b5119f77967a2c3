//! Tokenizer and recursive-descent parser.
//!
//! Precedence, lowest first: `?:`, `||`, `&&`, equality, relational,
//! additive, multiplicative, unary, primary.

use super::{BinaryOp, Formula, FormulaError, MathFn, Method, Operand, Property, UnaryOp};

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Question,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Ident(name) => name.clone(),
            other => format!("{other:?}"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, FormulaError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let start = i;

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        if ch.is_ascii_digit() || (ch == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit))
        {
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value = text
                .parse::<f64>()
                .map_err(|_| FormulaError::UnexpectedToken {
                    found: text.clone(),
                    position: start,
                })?;
            tokens.push((Token::Number(value), start));
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == '_' || ch == '$' {
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            tokens.push((Token::Ident(chars[start..i].iter().collect()), start));
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (token, width) = match (ch, next) {
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            // `===` and `!==` are accepted as plain equality.
            ('=', Some('=')) => (Token::EqEq, if chars.get(i + 2) == Some(&'=') { 3 } else { 2 }),
            ('!', Some('=')) => (Token::NotEq, if chars.get(i + 2) == Some(&'=') { 3 } else { 2 }),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('!', _) => (Token::Bang, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            ('.', _) => (Token::Dot, 1),
            (',', _) => (Token::Comma, 1),
            ('?', _) => (Token::Question, 1),
            (':', _) => (Token::Colon, 1),
            // A trailing statement terminator is harmless.
            (';', _) if chars[i + 1..].iter().all(|c| c.is_whitespace()) => {
                i = chars.len();
                continue;
            }
            _ => {
                return Err(FormulaError::UnexpectedChar {
                    ch,
                    position: start,
                });
            }
        };
        tokens.push((token, start));
        i += width;
    }

    Ok(tokens)
}

pub(super) struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    pub(super) fn new(source: &str) -> Result<Self, FormulaError> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    pub(super) fn parse(mut self) -> Result<Formula, FormulaError> {
        let expr = self.conditional()?;
        match self.tokens.get(self.pos) {
            None => Ok(expr),
            Some((token, position)) => Err(FormulaError::UnexpectedToken {
                found: token.describe(),
                position: *position,
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn advance(&mut self) -> Result<Token, FormulaError> {
        let (token, _) = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(FormulaError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        match self.tokens.get(self.pos) {
            Some((token, _)) if *token == expected => {
                self.pos += 1;
                Ok(())
            }
            Some((token, position)) => Err(FormulaError::UnexpectedToken {
                found: token.describe(),
                position: *position,
            }),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn ident(&mut self) -> Result<String, FormulaError> {
        match self.tokens.get(self.pos) {
            Some((Token::Ident(name), _)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            Some((token, position)) => Err(FormulaError::UnexpectedToken {
                found: token.describe(),
                position: *position,
            }),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn conditional(&mut self) -> Result<Formula, FormulaError> {
        let condition = self.binary(0)?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let then = self.conditional()?;
        self.expect(Token::Colon)?;
        let otherwise = self.conditional()?;
        Ok(Formula::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// Precedence climbing over the binary operator levels.
    fn binary(&mut self, level: usize) -> Result<Formula, FormulaError> {
        const LEVELS: usize = 6;
        if level == LEVELS {
            return self.unary();
        }

        let mut lhs = self.binary(level + 1)?;
        while let Some(op) = self.peek().and_then(|token| binary_op(token, level)) {
            self.pos += 1;
            let rhs = self.binary(level + 1)?;
            lhs = Formula::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Formula, FormulaError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Bang) => UnaryOp::Not,
            _ => return self.primary(),
        };
        self.pos += 1;
        let expr = self.unary()?;
        Ok(Formula::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    fn primary(&mut self) -> Result<Formula, FormulaError> {
        let position = self.tokens.get(self.pos).map(|(_, p)| *p).unwrap_or(0);
        match self.advance()? {
            Token::Number(value) => Ok(Formula::Number(value)),
            Token::LParen => {
                let expr = self.conditional()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::Ident(name) => self.identifier(name),
            other => Err(FormulaError::UnexpectedToken {
                found: other.describe(),
                position,
            }),
        }
    }

    fn identifier(&mut self, name: String) -> Result<Formula, FormulaError> {
        match name.as_str() {
            "a" | "b" => {
                let operand = if name == "a" {
                    Operand::Subject
                } else {
                    Operand::Target
                };
                self.expect(Token::Dot)?;
                let member = self.ident()?;
                if self.eat(&Token::LParen) {
                    let method = member
                        .parse::<Method>()
                        .map_err(|_| FormulaError::UnknownIdentifier(member.clone()))?;
                    let arg = self.conditional()?;
                    self.expect(Token::RParen)?;
                    Ok(Formula::Method {
                        operand,
                        method,
                        arg: Box::new(arg),
                    })
                } else {
                    let property = member
                        .parse::<Property>()
                        .map_err(|_| FormulaError::UnknownIdentifier(member.clone()))?;
                    Ok(Formula::Property { operand, property })
                }
            }
            "v" => {
                self.expect(Token::LBracket)?;
                let index = self.conditional()?;
                self.expect(Token::RBracket)?;
                Ok(Formula::Variable(Box::new(index)))
            }
            "Math" => {
                self.expect(Token::Dot)?;
                let member = self.ident()?;
                if member == "PI" {
                    return Ok(Formula::Number(core::f64::consts::PI));
                }
                let function = member
                    .parse::<MathFn>()
                    .map_err(|_| FormulaError::UnknownIdentifier(format!("Math.{member}")))?;
                self.expect(Token::LParen)?;
                let args = self.arguments()?;
                check_arity(function, args.len())?;
                Ok(Formula::Call { function, args })
            }
            "true" => Ok(Formula::Number(1.0)),
            "false" => Ok(Formula::Number(0.0)),
            _ => Err(FormulaError::UnknownIdentifier(name)),
        }
    }

    /// Comma-separated arguments after an opening parenthesis.
    fn arguments(&mut self) -> Result<Vec<Formula>, FormulaError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.conditional()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            self.expect(Token::Comma)?;
        }
    }
}

fn binary_op(token: &Token, level: usize) -> Option<BinaryOp> {
    let op = match (level, token) {
        (0, Token::OrOr) => BinaryOp::Or,
        (1, Token::AndAnd) => BinaryOp::And,
        (2, Token::EqEq) => BinaryOp::Eq,
        (2, Token::NotEq) => BinaryOp::Ne,
        (3, Token::Lt) => BinaryOp::Lt,
        (3, Token::Le) => BinaryOp::Le,
        (3, Token::Gt) => BinaryOp::Gt,
        (3, Token::Ge) => BinaryOp::Ge,
        (4, Token::Plus) => BinaryOp::Add,
        (4, Token::Minus) => BinaryOp::Sub,
        (5, Token::Star) => BinaryOp::Mul,
        (5, Token::Slash) => BinaryOp::Div,
        (5, Token::Percent) => BinaryOp::Rem,
        _ => return None,
    };
    Some(op)
}

fn check_arity(function: MathFn, found: usize) -> Result<(), FormulaError> {
    let ok = match function.arity() {
        Some(expected) => found == expected,
        None => found >= 1,
    };
    if ok {
        return Ok(());
    }
    Err(FormulaError::WrongArity {
        function: function.into(),
        expected: function.arity().unwrap_or(1),
        found,
    })
}
