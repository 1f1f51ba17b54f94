//! Immutable symbolic expression trees.
//!
//! Trees built by the parser keep the structure of the source text. Trees
//! produced by `substitute` and `differentiate` go through the folding
//! constructors, which evaluate constant subtrees and drop neutral elements.

use super::{error::EvaluationError, symbol::Symbol};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOp {
    Neg,
    Ln,
    Exp,
    Sqrt,
    Sin,
    Cos,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl UnaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Ln => "ln",
            UnaryOp::Exp => "exp",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
        }
    }

    fn apply(&self, x: f64) -> Result<f64, EvaluationError> {
        let y = match self {
            UnaryOp::Neg => -x,
            UnaryOp::Ln => x.ln(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Sin => x.sin(),
            UnaryOp::Cos => x.cos(),
        };
        finite(y, self.name())
    }
}

impl BinaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }

    fn apply(&self, a: f64, b: f64) -> Result<f64, EvaluationError> {
        let y = match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => {
                if b == 0.0 {
                    return Err(EvaluationError::DivisionByZero);
                }
                a / b
            }
            BinaryOp::Pow => a.powf(b),
        };
        finite(y, self.name())
    }

    /// Binding strength, higher binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
            BinaryOp::Pow => 4,
        }
    }
}

fn finite(y: f64, op: &'static str) -> Result<f64, EvaluationError> {
    if y.is_finite() {
        Ok(y)
    } else {
        Err(EvaluationError::Undefined(op))
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Expression {
    Constant(f64),
    Variable(Symbol),
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn constant(value: f64) -> Self {
        Expression::Constant(value)
    }

    pub fn variable(symbol: &Symbol) -> Self {
        Expression::Variable(symbol.clone())
    }

    /// Unary node as written, without folding.
    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Binary node as written, without folding.
    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn as_constant(&self) -> Option<f64> {
        match self {
            Expression::Constant(c) => Some(*c),
            _ => None,
        }
    }

    fn is_constant(&self, value: f64) -> bool {
        self.as_constant() == Some(value)
    }

    /// Unary node with constant folding.
    pub fn folded_unary(op: UnaryOp, operand: Expression) -> Self {
        match (op, operand) {
            (op, Expression::Constant(c)) => match op.apply(c) {
                Ok(y) => Expression::Constant(y),
                Err(_) => Expression::unary(op, Expression::Constant(c)),
            },
            (UnaryOp::Neg, Expression::Unary {
                op: UnaryOp::Neg,
                operand,
            }) => *operand,
            (op, operand) => Expression::unary(op, operand),
        }
    }

    /// Binary node with constant folding and removal of neutral elements.
    pub fn folded_binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        use self::BinaryOp::*;
        use self::Expression::{Binary, Constant, Unary};

        if let (Constant(a), Constant(b)) = (&left, &right) {
            if let Ok(y) = op.apply(*a, *b) {
                return Constant(y);
            }
            return Expression::binary(op, left, right);
        }
        match op {
            Add => {
                if left.is_constant(0.0) {
                    return right;
                }
                if right.is_constant(0.0) {
                    return left;
                }
                match right {
                    Unary {
                        op: UnaryOp::Neg,
                        operand,
                    } => Expression::binary(Sub, left, *operand),
                    Constant(c) if c < 0.0 => Expression::binary(Sub, left, Constant(-c)),
                    right => Expression::binary(Add, left, right),
                }
            }
            Sub => {
                if right.is_constant(0.0) {
                    return left;
                }
                if left.is_constant(0.0) {
                    return Expression::folded_unary(UnaryOp::Neg, right);
                }
                match right {
                    Unary {
                        op: UnaryOp::Neg,
                        operand,
                    } => Expression::binary(Add, left, *operand),
                    Constant(c) if c < 0.0 => Expression::binary(Add, left, Constant(-c)),
                    right => Expression::binary(Sub, left, right),
                }
            }
            Mul => {
                if left.is_constant(0.0) || right.is_constant(0.0) {
                    return Constant(0.0);
                }
                if left.is_constant(1.0) {
                    return right;
                }
                if right.is_constant(1.0) {
                    return left;
                }
                if left.is_constant(-1.0) {
                    return Expression::folded_unary(UnaryOp::Neg, right);
                }
                if right.is_constant(-1.0) {
                    return Expression::folded_unary(UnaryOp::Neg, left);
                }
                match (left, right) {
                    (
                        Constant(a),
                        Binary {
                            op: Mul,
                            left: inner,
                            right: rest,
                        },
                    ) => match inner.as_constant() {
                        Some(b) => Expression::folded_binary(Mul, Constant(a * b), *rest),
                        None => Expression::binary(Mul, Constant(a), Expression::binary(Mul, *inner, *rest)),
                    },
                    (left, right) => Expression::binary(Mul, left, right),
                }
            }
            Div => {
                if right.is_constant(1.0) {
                    return left;
                }
                if left.is_constant(0.0) && right.as_constant().is_none() {
                    return Constant(0.0);
                }
                Expression::binary(Div, left, right)
            }
            Pow => {
                if right.is_constant(1.0) {
                    return left;
                }
                if right.is_constant(0.0) {
                    return Constant(1.0);
                }
                Expression::binary(Pow, left, right)
            }
        }
    }

    pub fn depends_on(&self, symbol: &Symbol) -> bool {
        match self {
            Expression::Constant(_) => false,
            Expression::Variable(s) => s == symbol,
            Expression::Unary { operand, .. } => operand.depends_on(symbol),
            Expression::Binary { left, right, .. } => {
                left.depends_on(symbol) || right.depends_on(symbol)
            }
        }
    }

    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, symbols: &mut BTreeSet<Symbol>) {
        match self {
            Expression::Constant(_) => {}
            Expression::Variable(s) => {
                symbols.insert(s.clone());
            }
            Expression::Unary { operand, .. } => operand.collect_symbols(symbols),
            Expression::Binary { left, right, .. } => {
                left.collect_symbols(symbols);
                right.collect_symbols(symbols);
            }
        }
    }

    /// Replace every occurrence of `symbol` by `replacement`.
    pub fn substitute(&self, symbol: &Symbol, replacement: &Expression) -> Expression {
        match self {
            Expression::Constant(_) => self.clone(),
            Expression::Variable(s) => {
                if s == symbol {
                    replacement.clone()
                } else {
                    self.clone()
                }
            }
            Expression::Unary { op, operand } => {
                Expression::folded_unary(*op, operand.substitute(symbol, replacement))
            }
            Expression::Binary { op, left, right } => Expression::folded_binary(
                *op,
                left.substitute(symbol, replacement),
                right.substitute(symbol, replacement),
            ),
        }
    }

    pub fn substitute_value(&self, symbol: &Symbol, value: f64) -> Expression {
        self.substitute(symbol, &Expression::Constant(value))
    }

    /// Partial derivative with respect to `symbol`.
    pub fn differentiate(&self, symbol: &Symbol) -> Expression {
        use self::BinaryOp::*;
        let fold = Expression::folded_binary;

        match self {
            Expression::Constant(_) => Expression::Constant(0.0),
            Expression::Variable(s) => Expression::Constant(if s == symbol { 1.0 } else { 0.0 }),
            Expression::Unary { op, operand } => {
                let d = operand.differentiate(symbol);
                match op {
                    UnaryOp::Neg => Expression::folded_unary(UnaryOp::Neg, d),
                    UnaryOp::Ln => fold(Div, d, (**operand).clone()),
                    UnaryOp::Exp => fold(Mul, self.clone(), d),
                    // u' / (2 * sqrt(u))
                    UnaryOp::Sqrt => fold(Div, d, fold(Mul, Expression::Constant(2.0), self.clone())),
                    UnaryOp::Sin => fold(
                        Mul,
                        Expression::folded_unary(UnaryOp::Cos, (**operand).clone()),
                        d,
                    ),
                    UnaryOp::Cos => fold(
                        Mul,
                        Expression::folded_unary(
                            UnaryOp::Neg,
                            Expression::folded_unary(UnaryOp::Sin, (**operand).clone()),
                        ),
                        d,
                    ),
                }
            }
            Expression::Binary { op, left, right } => {
                let (u, v) = (&**left, &**right);
                match op {
                    Add | Sub => fold(*op, u.differentiate(symbol), v.differentiate(symbol)),
                    Mul => fold(
                        Add,
                        fold(Mul, u.differentiate(symbol), v.clone()),
                        fold(Mul, u.clone(), v.differentiate(symbol)),
                    ),
                    Div => fold(
                        Div,
                        fold(
                            Sub,
                            fold(Mul, u.differentiate(symbol), v.clone()),
                            fold(Mul, u.clone(), v.differentiate(symbol)),
                        ),
                        fold(Pow, v.clone(), Expression::Constant(2.0)),
                    ),
                    Pow => match (u.depends_on(symbol), v.depends_on(symbol)) {
                        (false, false) => Expression::Constant(0.0),
                        // n * u^(n-1) * u'
                        (true, false) => fold(
                            Mul,
                            fold(
                                Mul,
                                v.clone(),
                                fold(Pow, u.clone(), fold(Sub, v.clone(), Expression::Constant(1.0))),
                            ),
                            u.differentiate(symbol),
                        ),
                        // a^v * ln(a) * v'
                        (false, true) => fold(
                            Mul,
                            fold(
                                Mul,
                                self.clone(),
                                Expression::folded_unary(UnaryOp::Ln, u.clone()),
                            ),
                            v.differentiate(symbol),
                        ),
                        // u^v * (v' * ln(u) + v * u' / u)
                        (true, true) => fold(
                            Mul,
                            self.clone(),
                            fold(
                                Add,
                                fold(
                                    Mul,
                                    v.differentiate(symbol),
                                    Expression::folded_unary(UnaryOp::Ln, u.clone()),
                                ),
                                fold(Div, fold(Mul, v.clone(), u.differentiate(symbol)), u.clone()),
                            ),
                        ),
                    },
                }
            }
        }
    }

    /// Numeric value of a closed expression.
    pub fn evaluate(&self) -> Result<f64, EvaluationError> {
        self.evaluate_with(&|_: &Symbol| None)
    }

    /// Numeric value with symbols looked up through `lookup`.
    pub fn evaluate_with<F>(&self, lookup: &F) -> Result<f64, EvaluationError>
    where
        F: Fn(&Symbol) -> Option<f64>,
    {
        match self {
            Expression::Constant(c) => Ok(*c),
            Expression::Variable(s) => {
                lookup(s).ok_or_else(|| EvaluationError::FreeSymbol(s.clone()))
            }
            Expression::Unary { op, operand } => op.apply(operand.evaluate_with(lookup)?),
            Expression::Binary { op, left, right } => {
                op.apply(left.evaluate_with(lookup)?, right.evaluate_with(lookup)?)
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::Constant(c) if *c < 0.0 => 3,
            Expression::Constant(_) | Expression::Variable(_) => 5,
            Expression::Unary { op: UnaryOp::Neg, .. } => 3,
            Expression::Unary { .. } => 5,
            Expression::Binary { op, .. } => op.precedence(),
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, min_prec: u8) -> fmt::Result {
        if self.precedence() < min_prec {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(c) => write!(f, "{}", c),
            Expression::Variable(s) => write!(f, "{}", s),
            Expression::Unary {
                op: UnaryOp::Neg,
                operand,
            } => {
                f.write_str("-")?;
                operand.fmt_child(f, 4)
            }
            Expression::Unary { op, operand } => write!(f, "{}({})", op.name(), operand),
            Expression::Binary { op, left, right } => {
                let p = op.precedence();
                // left associative except `^`
                let (left_min, right_min) = match op {
                    BinaryOp::Pow => (p + 1, 3),
                    _ => (p, p + 1),
                };
                left.fmt_child(f, left_min)?;
                write!(f, " {} ", op.name())?;
                right.fmt_child(f, right_min)
            }
        }
    }
}

impl Serialize for Expression {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
