//! The logical kernel.
//!
//! Propositions are built from two primitives only: material implication and
//! the constant `false`. Every other connective is notation over those two, so
//! evaluation needs a single rule and the rewriting in [`prenex`] needs a single
//! case. Quantifiers (`Lambda`) and function atoms exist for prenex reduction;
//! neither can be evaluated.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use indexmap::IndexSet;
use map_in_place::MapVecInPlace;

use crate::error::InternalError;

mod display;
mod prenex;
pub mod decide;

pub use decide::{assignments, decide, truth_table, Assignment, Assignments, Conflict, DecideError};

/// A named propositional variable (or an opaque atom produced by analysis)
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(Rc<str>);

impl Variable {
    pub fn new(name: &str) -> Variable {
        Variable(Rc::from(name))
    }
    pub fn name(&self) -> &str {
        &self.0
    }
    fn indexed(&self, i: usize) -> Variable {
        Variable::new(&format!("{}{}", self.0, i))
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}
impl From<String> for Variable {
    fn from(name: String) -> Self {
        Variable(Rc::from(name))
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}'", self.0)
    }
}
impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Quantifier {
    Universal,
    Existential,
}

impl Quantifier {
    /// The dual quantifier, used when pulling a quantifier out of an antecedent
    pub fn flip(self) -> Quantifier {
        match self {
            Quantifier::Universal => Quantifier::Existential,
            Quantifier::Existential => Quantifier::Universal,
        }
    }
    pub fn symbol(self) -> &'static str {
        match self {
            Quantifier::Universal => "∀",
            Quantifier::Existential => "∃",
        }
    }
}

/// An immutable, structurally shared proposition
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Proposition {
    kind: Rc<PropKind>,
}

#[derive(PartialEq, Eq, Hash)]
pub enum PropKind {
    Constant(bool),
    Variable(Variable),
    /// An uninterpreted predicate applied to variables, e.g. `F(x, y)`
    Function(String, Vec<Variable>),
    Implication(Proposition, Proposition),
    /// A quantifier binding a variable over its scope
    Lambda(Quantifier, Variable, Proposition),
}

impl PropKind {
    fn into_prop(self) -> Proposition {
        Proposition { kind: Rc::new(self) }
    }
}

pub fn constant(value: bool) -> Proposition {
    PropKind::Constant(value).into_prop()
}

pub fn variable<V: Into<Variable>>(name: V) -> Proposition {
    PropKind::Variable(name.into()).into_prop()
}

pub fn function(name: &str, vars: Vec<Variable>) -> Proposition {
    PropKind::Function(name.to_string(), vars).into_prop()
}

/// `a ==> b`
pub fn implies(a: Proposition, b: Proposition) -> Proposition {
    PropKind::Implication(a, b).into_prop()
}

/// `a <== b`
pub fn follows(a: Proposition, b: Proposition) -> Proposition {
    implies(b, a)
}

/// `!a`, encoded as `a ==> false`
pub fn not(a: Proposition) -> Proposition {
    implies(a, constant(false))
}

/// `a || b`, encoded as `!a ==> b`
pub fn or(a: Proposition, b: Proposition) -> Proposition {
    implies(not(a), b)
}

/// `a && b`, encoded as `!(a ==> !b)`
pub fn and(a: Proposition, b: Proposition) -> Proposition {
    not(implies(a, not(b)))
}

/// `a === b`, encoded as `(a ==> b) && (b ==> a)`
pub fn eqv(a: Proposition, b: Proposition) -> Proposition {
    and(implies(a.clone(), b.clone()), implies(b, a))
}

pub fn universal<V: Into<Variable>>(var: V, scope: Proposition) -> Proposition {
    PropKind::Lambda(Quantifier::Universal, var.into(), scope).into_prop()
}

pub fn existential<V: Into<Variable>>(var: V, scope: Proposition) -> Proposition {
    PropKind::Lambda(Quantifier::Existential, var.into(), scope).into_prop()
}

fn lambda(q: Quantifier, var: Variable, scope: Proposition) -> Proposition {
    PropKind::Lambda(q, var, scope).into_prop()
}

/// First of `base0`, `base1`, ... that is not `taken`
fn fresh_variable<F>(base: &Variable, taken: F) -> Variable
where
    F: Fn(&Variable) -> bool,
{
    let mut i = 0;
    loop {
        let candidate = base.indexed(i);
        if !taken(&candidate) {
            return candidate;
        }
        i += 1;
    }
}

impl Proposition {
    pub fn kind(&self) -> &PropKind {
        &self.kind
    }
    pub fn is_false(&self) -> bool {
        matches!(self.kind.deref(), PropKind::Constant(false))
    }
    /// The variables with at least one unbound occurrence, in order of first appearance
    pub fn free(&self) -> IndexSet<Variable> {
        match self.kind.deref() {
            PropKind::Constant(_) => IndexSet::new(),
            PropKind::Variable(v) => {
                let mut vars = IndexSet::new();
                vars.insert(v.clone());
                vars
            }
            PropKind::Function(_, vars) => vars.iter().cloned().collect(),
            PropKind::Implication(a, b) => {
                let mut vars = a.free();
                vars.extend(b.free());
                vars
            }
            PropKind::Lambda(_, v, scope) => {
                let mut vars = scope.free();
                vars.shift_remove(v);
                vars
            }
        }
    }
    pub fn occurs_free(&self, var: &Variable) -> bool {
        self.free().contains(var)
    }
    /// The truth value under `state`. Only constants and variables can be evaluated:
    /// quantifiers must be eliminated first, and function atoms have no interpretation.
    pub fn eval(&self, state: &Assignment) -> Result<bool, InternalError> {
        match self.kind.deref() {
            PropKind::Constant(value) => Ok(*value),
            PropKind::Variable(v) => match state.get(v) {
                Some(value) => Ok(value),
                None => internal_error!("variable missing from assignment"),
            },
            PropKind::Implication(a, b) => Ok(!a.eval(state)? || b.eval(state)?),
            PropKind::Function(_, _) => internal_error!("function atoms cannot be evaluated"),
            PropKind::Lambda(_, _, _) => internal_error!("quantifiers cannot be evaluated"),
        }
    }
    /// Replace every free occurrence of `a` with `b`.
    /// A quantifier binding `b` is renamed first so that `b` is never captured.
    pub fn replace(&self, a: &Variable, b: &Variable) -> Proposition {
        match self.kind.deref() {
            PropKind::Constant(_) => self.clone(),
            PropKind::Variable(v) => {
                if v == a {
                    PropKind::Variable(b.clone()).into_prop()
                } else {
                    self.clone()
                }
            }
            PropKind::Function(name, vars) => {
                let vars = vars
                    .clone()
                    .map_in_place(|v| if v == *a { b.clone() } else { v });
                PropKind::Function(name.clone(), vars).into_prop()
            }
            PropKind::Implication(p, q) => implies(p.replace(a, b), q.replace(a, b)),
            PropKind::Lambda(q, v, scope) => {
                if v == a {
                    // `a` is bound here, so it has no free occurrences below
                    return self.clone();
                }
                let scope_free = scope.free();
                if !scope_free.contains(a) {
                    return self.clone();
                }
                if v == b {
                    let fresh = fresh_variable(v, |c| c == a || c == b || scope_free.contains(c));
                    let renamed = scope.replace(v, &fresh);
                    lambda(*q, fresh, renamed.replace(a, b))
                } else {
                    lambda(*q, v.clone(), scope.replace(a, b))
                }
            }
        }
    }
}
