use std::fmt;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::InternalError;
use crate::truth::{Proposition, Variable};

/// A truth value for each variable, kept in the order the variables were listed
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    values: IndexMap<Variable, bool>,
}

impl Assignment {
    pub fn new() -> Assignment {
        Assignment { values: IndexMap::new() }
    }
    pub fn set(&mut self, var: Variable, value: bool) {
        self.values.insert(var, value);
    }
    pub fn get(&self, var: &Variable) -> Option<bool> {
        self.values.get(var).copied()
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.values
            .iter()
            .map(|(var, value)| format!("{:?} := {}", var, value))
            .join(", "))
    }
}
impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Iterates over every assignment of a list of variables.
/// The `k`th variable is true in the `i`th assignment iff bit `k` of `i` is set,
/// so the first variable alternates fastest and the all-false assignment comes first.
#[derive(Debug, Clone)]
pub struct Assignments {
    vars: Vec<Variable>,
    next: u64,
    count: u64,
}

impl Iterator for Assignments {
    type Item = Assignment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let i = self.next;
        self.next += 1;
        let mut state = Assignment::new();
        for (k, var) in self.vars.iter().enumerate() {
            state.set(var.clone(), (i >> k) & 1 == 1);
        }
        Some(state)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.next) as usize;
        (remaining, Some(remaining))
    }
}

/// All `2^n` assignments of `vars`, or `None` if there are too many to count
pub fn assignments(vars: Vec<Variable>) -> Option<Assignments> {
    let count = 1u64.checked_shl(vars.len() as u32)?;
    Some(Assignments { vars, next: 0, count })
}

/// Two assignments of the same proposition with different truth values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub first: Assignment,
    pub first_value: bool,
    pub witness: Assignment,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state {} yields {}; state {} yields {}",
               self.first, self.first_value, self.witness, !self.first_value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecideError {
    Conflict(Conflict),
    TooManyVariables(usize),
    Internal(InternalError),
}

impl fmt::Display for DecideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecideError::Conflict(conflict) => write!(f, "{}", conflict),
            DecideError::TooManyVariables(n) => write!(f, "cannot enumerate the cases of {} free variables", n),
            DecideError::Internal(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for DecideError {}

impl From<InternalError> for DecideError {
    fn from(err: InternalError) -> Self {
        DecideError::Internal(err)
    }
}

fn cases(p: &Proposition) -> Result<Assignments, DecideError> {
    let vars = p.free().into_iter().collect::<Vec<_>>();
    let n = vars.len();
    assignments(vars).ok_or(DecideError::TooManyVariables(n))
}

/// Evaluate `p` under every assignment of its free variables.
/// Holds all `2^n` rows at once; `decide` does not use it.
pub fn truth_table(p: &Proposition) -> Result<Vec<(Assignment, bool)>, DecideError> {
    cases(p)?
        .map(|state| -> Result<(Assignment, bool), DecideError> {
            let value = p.eval(&state)?;
            Ok((state, value))
        })
        .collect()
}

/// Decide whether `p` has the same value in every case, returning that value.
/// A proposition that is false in every case is decided `false`; only
/// disagreement between two cases is an error. Every case is evaluated, but only
/// the first case and the first disagreeing one are kept.
pub fn decide(p: &Proposition) -> Result<bool, DecideError> {
    debug!("deciding {}", p);
    let mut states = cases(p)?;
    let first = match states.next() {
        Some(state) => state,
        None => internal_error!("no assignments to evaluate")?,
    };
    let first_value = p.eval(&first)?;
    let mut witness = None;
    for state in states {
        let value = p.eval(&state)?;
        if value != first_value && witness.is_none() {
            witness = Some(state);
        }
    }
    match witness {
        Some(witness) => {
            let conflict = Conflict { first, first_value, witness };
            debug!("conflict: {}", conflict);
            Err(DecideError::Conflict(conflict))
        }
        None => Ok(first_value),
    }
}
