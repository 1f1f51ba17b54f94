//! Text to `Expression`.
//!
//! Precedence, loosest first: `+ -`, `* /`, unary `-`, `^` (also `**`, right
//! associative). Functions: `ln` (alias `log`), `exp`, `sqrt`, `sin`, `cos`.

use super::{
    error::ParseError,
    expression::{BinaryOp, Expression, UnaryOp},
    symbol::Symbol,
};
use logos::{Lexer, Logos};

#[derive(Logos, Clone, PartialEq, Debug)]
#[logos(skip r"\s+")]
enum Token {
    // a literal that overflows to infinity is an error token
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", number)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", number)]
    Number(f64),
    #[regex(r"[\p{L}_][\p{L}\p{N}_]*", |lex| String::from(lex.slice()))]
    Ident(String),
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    #[token("**")]
    Caret,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
}

fn number(lex: &mut Lexer<Token>) -> Option<f64> {
    lex.slice().parse::<f64>().ok().filter(|x| x.is_finite())
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Number(x) => x.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Plus => String::from("+"),
            Token::Minus => String::from("-"),
            Token::Star => String::from("*"),
            Token::Slash => String::from("/"),
            Token::Caret => String::from("^"),
            Token::LParen => String::from("("),
            Token::RParen => String::from(")"),
        }
    }
}

const UNARY_PREC: u8 = 3;
const POW_PREC: u8 = 4;

fn binary_op_info(token: &Token) -> Option<(u8, BinaryOp)> {
    match token {
        Token::Plus => Some((1, BinaryOp::Add)),
        Token::Minus => Some((1, BinaryOp::Sub)),
        Token::Star => Some((2, BinaryOp::Mul)),
        Token::Slash => Some((2, BinaryOp::Div)),
        Token::Caret => Some((POW_PREC, BinaryOp::Pow)),
        _ => None,
    }
}

/// Parse `text`, accepting only identifiers listed in `known_symbols`.
///
/// Parsing is deterministic: the same input always gives the same tree.
pub fn parse(text: &str, known_symbols: &[Symbol]) -> Result<Expression, ParseError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        known_symbols,
    };
    let expr = parser.parse_pratt(0)?;
    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some((token, offset)) => Err(ParseError::UnexpectedToken {
            expected: "operator or end of input",
            found: token.text(),
            offset: *offset,
        }),
    }
}

/// Tokens with their byte offsets.
fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut lexer = Token::lexer(text);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        let offset = lexer.span().start;
        match token {
            Ok(token) => tokens.push((token, offset)),
            Err(()) => return Err(lex_error(lexer.slice(), offset)),
        }
    }
    Ok(tokens)
}

fn lex_error(slice: &str, offset: usize) -> ParseError {
    match slice.chars().next() {
        Some(c) if c.is_ascii_digit() || c == '.' => ParseError::InvalidNumber {
            text: String::from(slice),
            offset,
        },
        Some(found) => ParseError::UnexpectedChar { found, offset },
        None => ParseError::UnexpectedEnd {
            expected: "number, symbol or `(`",
        },
    }
}

struct Parser<'a> {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    known_symbols: &'a [Symbol],
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let next = self.tokens.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> Result<(), ParseError> {
        match self.advance() {
            Some((ref token, _)) if *token == expected => Ok(()),
            Some((token, offset)) => Err(ParseError::UnexpectedToken {
                expected: what,
                found: token.text(),
                offset,
            }),
            None => Err(ParseError::UnexpectedEnd { expected: what }),
        }
    }

    fn parse_pratt(&mut self, min_prec: u8) -> Result<Expression, ParseError> {
        let mut left = self.parse_prefix()?;

        while let Some((prec, op)) = self.peek().and_then(binary_op_info) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let next_prec = if op == BinaryOp::Pow { prec } else { prec + 1 };
            let right = self.parse_pratt(next_prec)?;
            left = Expression::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expression, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                // `-x^2` is `-(x^2)`, `-x*y` is `(-x)*y`
                let operand = self.parse_pratt(POW_PREC)?;
                Ok(match operand {
                    Expression::Constant(c) => Expression::Constant(-c),
                    operand => Expression::unary(UnaryOp::Neg, operand),
                })
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_pratt(UNARY_PREC)
            }
            _ => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> Result<Expression, ParseError> {
        match self.advance() {
            Some((Token::Number(value), _)) => Ok(Expression::Constant(value)),
            Some((Token::LParen, _)) => {
                let inner = self.parse_pratt(0)?;
                self.expect(Token::RParen, "`)`")?;
                Ok(inner)
            }
            Some((Token::Ident(name), offset)) => {
                if self.peek() == Some(&Token::LParen) {
                    if let Some(op) = function(&name) {
                        self.advance();
                        let argument = self.parse_pratt(0)?;
                        self.expect(Token::RParen, "`)`")?;
                        return Ok(Expression::unary(op, argument));
                    }
                }
                self.known_symbols
                    .iter()
                    .find(|symbol| symbol.name() == name)
                    .map(Expression::variable)
                    .ok_or(ParseError::UnknownSymbol { name, offset })
            }
            Some((token, offset)) => Err(ParseError::UnexpectedToken {
                expected: "number, symbol or `(`",
                found: token.text(),
                offset,
            }),
            None => Err(ParseError::UnexpectedEnd {
                expected: "number, symbol or `(`",
            }),
        }
    }
}

fn function(name: &str) -> Option<UnaryOp> {
    match name {
        "ln" | "log" => Some(UnaryOp::Ln),
        "exp" => Some(UnaryOp::Exp),
        "sqrt" => Some(UnaryOp::Sqrt),
        "sin" => Some(UnaryOp::Sin),
        "cos" => Some(UnaryOp::Cos),
        _ => None,
    }
}
