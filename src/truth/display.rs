//! Rendering of propositions in surface notation.
//!
//! The kernel only stores implications and `false`, so rendering recognises the
//! fixed encodings produced by the constructors in `truth` and prints the most
//! specific connective. None of this affects evaluation.

use std::fmt;

use itertools::Itertools;

use crate::truth::{PropKind, Proposition};

const LINK: u8 = 1;
const OR: u8 = 2;
const AND: u8 = 3;
const PREFIX: u8 = 4;
const ATOM: u8 = 5;

enum Form<'a> {
    DoubleNegation(&'a Proposition),
    Equivalence(&'a Proposition, &'a Proposition),
    Disjunction(&'a Proposition, &'a Proposition),
    Conjunction(&'a Proposition, &'a Proposition),
    Negation(&'a Proposition),
    Implication(&'a Proposition, &'a Proposition),
}

fn as_implication(p: &Proposition) -> Option<(&Proposition, &Proposition)> {
    match p.kind() {
        PropKind::Implication(a, c) => Some((a, c)),
        _ => None,
    }
}

/// `x` when `p` is `x ==> false`
fn as_negation(p: &Proposition) -> Option<&Proposition> {
    as_implication(p).and_then(|(a, c)| if c.is_false() { Some(a) } else { None })
}

fn recognise<'a>(a: &'a Proposition, c: &'a Proposition) -> Form<'a> {
    if c.is_false() {
        if let Some(inner) = as_negation(a) {
            return Form::DoubleNegation(inner);
        }
        // `x && y` is `(x ==> (y ==> false)) ==> false`
        if let Some((x, not_y)) = as_implication(a) {
            if let Some(y) = as_negation(not_y) {
                if let (Some((p, q)), Some((q2, p2))) = (as_implication(x), as_implication(y)) {
                    if p == p2 && q == q2 {
                        return Form::Equivalence(p, q);
                    }
                }
                return Form::Conjunction(x, y);
            }
        }
        return Form::Negation(a);
    }
    if let Some(x) = as_negation(a) {
        return Form::Disjunction(x, c);
    }
    Form::Implication(a, c)
}

impl Proposition {
    fn precedence(&self) -> u8 {
        match self.kind() {
            PropKind::Implication(a, c) => match recognise(a, c) {
                Form::Equivalence(_, _) | Form::Implication(_, _) => LINK,
                Form::Disjunction(_, _) => OR,
                Form::Conjunction(_, _) => AND,
                Form::Negation(_) | Form::DoubleNegation(_) => PREFIX,
            },
            _ => ATOM,
        }
    }
}

fn operand(f: &mut fmt::Formatter<'_>, p: &Proposition, bracket_at: u8) -> fmt::Result {
    if p.precedence() <= bracket_at {
        write!(f, "({})", p)
    } else {
        write!(f, "{}", p)
    }
}

fn binary(f: &mut fmt::Formatter<'_>, a: &Proposition, op: &str, c: &Proposition, prec: u8) -> fmt::Result {
    operand(f, a, prec)?;
    write!(f, " {} ", op)?;
    operand(f, c, prec)
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            PropKind::Constant(value) => write!(f, "{}", value),
            PropKind::Variable(v) => write!(f, "{}", v),
            PropKind::Function(name, vars) => write!(f, "{}({})", name, vars.iter().join(", ")),
            PropKind::Lambda(q, v, scope) => {
                write!(f, "({}{})", q.symbol(), v)?;
                operand(f, scope, PREFIX - 1)
            }
            PropKind::Implication(a, c) => match recognise(a, c) {
                Form::DoubleNegation(x) => {
                    write!(f, "!!")?;
                    operand(f, x, PREFIX - 1)
                }
                Form::Negation(x) => {
                    write!(f, "!")?;
                    operand(f, x, PREFIX - 1)
                }
                Form::Equivalence(x, y) => binary(f, x, "===", y, LINK),
                Form::Disjunction(x, y) => binary(f, x, "||", y, OR),
                Form::Conjunction(x, y) => binary(f, x, "&&", y, AND),
                Form::Implication(x, y) => binary(f, x, "==>", y, LINK),
            },
        }
    }
}

impl fmt::Debug for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
