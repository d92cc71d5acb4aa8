//! Allow-listed arithmetic expression evaluator.
//!
//! Numeric parameter fields may carry small formulas instead of literals
//! ("23-30-5", "10*log(4)"). This crate evaluates such expressions against
//! a fixed allow-list of math functions and constants; anything outside the
//! list is a parse error, never a lookup into ambient state.
//!
//! Semantics:
//! - `sin`/`cos`/`tan` take degrees; `sinrad`/`cosrad`/`tanrad` take
//!   radians; `arcsin`/`arccos`/`arctan` return degrees.
//! - `log` is base-10, `ln` is natural.
//! - `^` and `**` are the right-associative power operator and bind
//!   tighter than unary minus (`-2^2` is -4).
//! - Division or modulo by zero evaluates to 0 rather than failing, so a
//!   formula over partially filled-in fields degrades quietly.

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

/// Expression parse or evaluation failure. Offsets are byte positions into
/// the source text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("unexpected character `{ch}` at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },
    #[error("malformed number `{text}` at offset {offset}")]
    MalformedNumber { text: String, offset: usize },
    #[error("unknown identifier `{name}` at offset {offset}")]
    UnknownIdentifier { name: String, offset: usize },
    #[error("`{name}` is a function and needs an argument, at offset {offset}")]
    MissingArgument { name: String, offset: usize },
    #[error("unbalanced parenthesis at offset {offset}")]
    UnbalancedParenthesis { offset: usize },
    #[error("expected a value at offset {offset}")]
    ExpectedValue { offset: usize },
    #[error("trailing input starting at offset {offset}")]
    TrailingInput { offset: usize },
    #[error("empty expression")]
    Empty,
}

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
struct Spanned {
    token: Token,
    offset: usize,
}

fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut chars: Peekable<CharIndices<'_>> = input.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = offset;
                let mut seen_exponent = false;
                while let Some(&(i, c)) = chars.peek() {
                    let take = c.is_ascii_digit()
                        || c == '.'
                        || c == 'e'
                        || c == 'E'
                        || (seen_exponent
                            && (c == '+' || c == '-')
                            && matches!(input.as_bytes().get(i.wrapping_sub(1)), Some(b'e' | b'E')));
                    if !take {
                        break;
                    }
                    if c == 'e' || c == 'E' {
                        seen_exponent = true;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                let text = &input[offset..end];
                let value = text.parse::<f64>().map_err(|_| EvalError::MalformedNumber {
                    text: text.to_string(),
                    offset,
                })?;
                tokens.push(Spanned {
                    token: Token::Number(value),
                    offset,
                });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = offset;
                while let Some(&(i, c)) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                tokens.push(Spanned {
                    token: Token::Ident(input[offset..end].to_string()),
                    offset,
                });
            }
            '+' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Plus,
                    offset,
                });
            }
            '-' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Minus,
                    offset,
                });
            }
            '*' => {
                chars.next();
                // `**` is the same operator as `^`.
                if let Some(&(_, '*')) = chars.peek() {
                    chars.next();
                    tokens.push(Spanned {
                        token: Token::Caret,
                        offset,
                    });
                } else {
                    tokens.push(Spanned {
                        token: Token::Star,
                        offset,
                    });
                }
            }
            '/' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Slash,
                    offset,
                });
            }
            '%' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Percent,
                    offset,
                });
            }
            '^' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Caret,
                    offset,
                });
            }
            '(' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::LParen,
                    offset,
                });
            }
            ')' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::RParen,
                    offset,
                });
            }
            other => {
                return Err(EvalError::UnexpectedCharacter { ch: other, offset });
            }
        }
    }
    Ok(tokens)
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        "inf" => Some(f64::INFINITY),
        _ => None,
    }
}

fn function(name: &str) -> Option<fn(f64) -> f64> {
    Some(match name {
        "sin" => |x: f64| x.to_radians().sin(),
        "cos" => |x: f64| x.to_radians().cos(),
        "tan" => |x: f64| x.to_radians().tan(),
        "arcsin" => |x: f64| x.asin().to_degrees(),
        "arccos" => |x: f64| x.acos().to_degrees(),
        "arctan" => |x: f64| x.atan().to_degrees(),
        "sinrad" => f64::sin,
        "cosrad" => f64::cos,
        "tanrad" => f64::tan,
        "deg2rad" => f64::to_radians,
        "rad2deg" => f64::to_degrees,
        "sqrt" => f64::sqrt,
        "log" => f64::log10,
        "ln" => f64::ln,
        "abs" => f64::abs,
        _ => return None,
    })
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end_offset: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|s| s.offset)
            .unwrap_or(self.end_offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let rhs = self.unary()?;
                    value = if rhs == 0.0 { 0.0 } else { value / rhs };
                }
                Some(Token::Percent) => {
                    self.advance();
                    let rhs = self.unary()?;
                    value = if rhs == 0.0 { 0.0 } else { value % rhs };
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.advance();
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64> {
        let base = self.primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.advance();
            // Right-associative, and the exponent may carry its own sign.
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(EvalError::UnbalancedParenthesis { offset }),
                }
            }
            Some(Token::Ident(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    let func = function(&name)
                        .ok_or_else(|| EvalError::UnknownIdentifier {
                            name: name.clone(),
                            offset,
                        })?;
                    let paren_offset = self.offset();
                    self.advance();
                    let argument = self.expr()?;
                    match self.advance() {
                        Some(Token::RParen) => Ok(func(argument)),
                        _ => Err(EvalError::UnbalancedParenthesis {
                            offset: paren_offset,
                        }),
                    }
                } else if let Some(value) = constant(&name) {
                    Ok(value)
                } else if function(&name).is_some() {
                    Err(EvalError::MissingArgument { name, offset })
                } else {
                    Err(EvalError::UnknownIdentifier { name, offset })
                }
            }
            _ => Err(EvalError::ExpectedValue { offset }),
        }
    }
}

/// Evaluate one expression to a number.
pub fn evaluate(input: &str) -> Result<f64> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end_offset: input.len(),
    };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(EvalError::TrailingInput {
            offset: parser.offset(),
        });
    }
    Ok(value)
}

/// Render a value the way the input fields display it: at most two decimal
/// places, trailing zeros (and a bare trailing point) stripped.
pub fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let text = format!("{value:.2}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" || trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
