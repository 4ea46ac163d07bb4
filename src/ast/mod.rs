use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use itertools::Itertools;

use crate::symbol::Parameter;

pub mod chain;
pub use chain::*;

mod parse;
pub use parse::*;

/// A surface expression. Trees are immutable and shared; `replace` builds new ones.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Expr {
    kind: Rc<ExprKind>,
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// A bare name, including `this` and numerals
    Simple(String),
    /// A call, written `f(a, b)` or postfix as `a f`
    Postfix(Call),
    Constant(bool),
    Bracketed(Expr),
    Negated(Expr),
    Binary(Operator, Expr, Expr),
    /// A link (`===`, `==>` or `<==`), optionally justified by a template
    Relation(Relation),
    /// `ψ(params) { body }`: a predicate value
    Lambda(Lambda),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    pub op: Operator,
    pub lhs: Expr,
    pub rhs: Expr,
    pub justification: Option<Call>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lambda {
    pub params: Vec<Parameter>,
    pub body: Expr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Eqv,
    Impl,
    Fllw,
}

/// Names mapped to the expressions that replace them
pub type Substitution = HashMap<String, Expr>;

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Eqv => "===",
            Operator::Impl => "==>",
            Operator::Fllw => "<==",
        }
    }
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        match symbol {
            "&&" => Some(Operator::And),
            "||" => Some(Operator::Or),
            "===" => Some(Operator::Eqv),
            "==>" => Some(Operator::Impl),
            "<==" => Some(Operator::Fllw),
            _ => None,
        }
    }
    /// Links are the operators a relation chain is made of
    pub fn is_link(self) -> bool {
        match self {
            Operator::Eqv | Operator::Impl | Operator::Fllw => true,
            Operator::And | Operator::Or => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl ExprKind {
    pub fn into_expr(self) -> Expr {
        Expr { kind: Rc::new(self) }
    }
}

/// First of `base0`, `base1`, ... that is not `taken`
fn fresh_name<F>(base: &str, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    (0..)
        .map(|i| format!("{}{}", base, i))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

impl Expr {
    pub fn simple(name: &str) -> Expr {
        ExprKind::Simple(name.to_string()).into_expr()
    }
    pub fn call(name: &str, args: Vec<Expr>) -> Expr {
        ExprKind::Postfix(Call { name: name.to_string(), args }).into_expr()
    }
    pub fn constant(value: bool) -> Expr {
        ExprKind::Constant(value).into_expr()
    }
    pub fn bracketed(inner: Expr) -> Expr {
        ExprKind::Bracketed(inner).into_expr()
    }
    pub fn negated(inner: Expr) -> Expr {
        ExprKind::Negated(inner).into_expr()
    }
    pub fn binary(op: Operator, lhs: Expr, rhs: Expr) -> Expr {
        ExprKind::Binary(op, lhs, rhs).into_expr()
    }
    pub fn relation(op: Operator, lhs: Expr, rhs: Expr, justification: Option<Call>) -> Expr {
        ExprKind::Relation(Relation { op, lhs, rhs, justification }).into_expr()
    }
    pub fn lambda(params: Vec<Parameter>, body: Expr) -> Expr {
        ExprKind::Lambda(Lambda { params, body }).into_expr()
    }
    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }
    /// `self` without any enclosing brackets
    pub fn unbracketed(&self) -> &Expr {
        match self.kind.deref() {
            ExprKind::Bracketed(inner) => inner.unbracketed(),
            _ => self,
        }
    }
    /// Every name mentioned and not bound by an enclosing lambda, callees included
    pub fn free_names(&self) -> HashSet<String> {
        let mut names = HashSet::new();
        self.collect_names(&mut names);
        names
    }
    fn collect_names(&self, names: &mut HashSet<String>) {
        match self.kind.deref() {
            ExprKind::Simple(name) => {
                names.insert(name.clone());
            }
            ExprKind::Postfix(call) => call.collect_names(names),
            ExprKind::Constant(_) => {}
            ExprKind::Bracketed(e) | ExprKind::Negated(e) => e.collect_names(names),
            ExprKind::Binary(_, lhs, rhs) => {
                lhs.collect_names(names);
                rhs.collect_names(names);
            }
            ExprKind::Relation(rel) => {
                rel.lhs.collect_names(names);
                rel.rhs.collect_names(names);
                if let Some(just) = &rel.justification {
                    just.collect_names(names);
                }
            }
            ExprKind::Lambda(lambda) => {
                let mut inner = lambda.body.free_names();
                for param in &lambda.params {
                    inner.remove(&param.name);
                }
                names.extend(inner);
            }
        }
    }
    /// Substitute expressions for free names, producing a new tree.
    /// Lambda parameters that would capture a substituted name are renamed, and a
    /// call whose callee is replaced by a lambda is beta-reduced. A callee may only
    /// be replaced by a name or by a lambda taking as many arguments as the call.
    pub fn replace(&self, sub: &Substitution) -> Result<Expr, SubstitutionError> {
        if sub.is_empty() {
            return Ok(self.clone());
        }
        let replaced = match self.kind.deref() {
            ExprKind::Simple(name) => sub.get(name).cloned().unwrap_or_else(|| self.clone()),
            ExprKind::Postfix(call) => {
                let args = call.args.iter().map(|a| a.replace(sub)).collect::<Result<Vec<_>, _>>()?;
                match sub.get(&call.name) {
                    None => Expr::call(&call.name, args),
                    Some(replacement) => match replacement.unbracketed().kind() {
                        ExprKind::Lambda(lambda) if lambda.params.len() == args.len() => lambda.apply(&args)?,
                        ExprKind::Simple(renamed) => Expr::call(renamed, args),
                        _ => return Err(SubstitutionError::new(&call.name, replacement, args.len())),
                    },
                }
            }
            ExprKind::Constant(_) => self.clone(),
            ExprKind::Bracketed(e) => Expr::bracketed(e.replace(sub)?),
            ExprKind::Negated(e) => Expr::negated(e.replace(sub)?),
            ExprKind::Binary(op, lhs, rhs) => Expr::binary(*op, lhs.replace(sub)?, rhs.replace(sub)?),
            ExprKind::Relation(rel) => Expr::relation(
                rel.op,
                rel.lhs.replace(sub)?,
                rel.rhs.replace(sub)?,
                rel.justification.as_ref().map(|just| just.replace(sub)).transpose()?,
            ),
            ExprKind::Lambda(lambda) => ExprKind::Lambda(lambda.replace(sub)?).into_expr(),
        };
        Ok(replaced)
    }
}

/// A callee replaced by something that cannot take its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionError {
    pub callee: String,
    pub replacement: String,
    pub arity: usize,
}

impl SubstitutionError {
    fn new(callee: &str, replacement: &Expr, arity: usize) -> SubstitutionError {
        SubstitutionError { callee: callee.to_string(), replacement: replacement.to_string(), arity }
    }
}

impl fmt::Display for SubstitutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` is called with {} argument(s), but was replaced by `{}`",
               self.callee, self.arity, self.replacement)
    }
}

impl std::error::Error for SubstitutionError {}

impl Call {
    fn collect_names(&self, names: &mut HashSet<String>) {
        names.insert(self.name.clone());
        for arg in &self.args {
            arg.collect_names(names);
        }
    }
    /// Replace inside the arguments; a callee is only ever renamed
    pub fn replace(&self, sub: &Substitution) -> Result<Call, SubstitutionError> {
        let args = self.args.iter().map(|a| a.replace(sub)).collect::<Result<Vec<_>, _>>()?;
        let name = match sub.get(&self.name) {
            None => self.name.clone(),
            Some(replacement) => match replacement.unbracketed().kind() {
                ExprKind::Simple(renamed) => renamed.clone(),
                _ => return Err(SubstitutionError::new(&self.name, replacement, args.len())),
            },
        };
        Ok(Call { name, args })
    }
}

impl Lambda {
    pub fn binds(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
    /// Beta-reduce: the body with each parameter replaced by its argument
    pub fn apply(&self, args: &[Expr]) -> Result<Expr, SubstitutionError> {
        let sub = self.params
            .iter()
            .map(|p| p.name.clone())
            .zip(args.iter().cloned())
            .collect::<Substitution>();
        Ok(Expr::bracketed(self.body.replace(&sub)?))
    }
    fn replace(&self, sub: &Substitution) -> Result<Lambda, SubstitutionError> {
        let body_names = self.body.free_names();
        let inner = sub
            .iter()
            .filter(|(name, _)| !self.binds(name) && body_names.contains(*name))
            .map(|(name, e)| (name.clone(), e.clone()))
            .collect::<Substitution>();
        if inner.is_empty() {
            return Ok(self.clone());
        }
        let incoming = inner.values().flat_map(|e| e.free_names()).collect::<HashSet<_>>();
        let mut params = self.params.clone();
        let mut body = self.body.clone();
        for param in params.iter_mut() {
            if !incoming.contains(&param.name) {
                continue;
            }
            let fresh = fresh_name(&param.name, |c| {
                incoming.contains(c) || body_names.contains(c) || self.binds(c)
            });
            let mut rename = Substitution::new();
            rename.insert(param.name.clone(), Expr::simple(&fresh));
            body = body.replace(&rename)?;
            param.name = fresh;
        }
        Ok(Lambda { params, body: body.replace(&inner)? })
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.iter().join(", "))
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ψ({}) {{ {} }}", self.params.iter().join(", "), self.body)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.deref() {
            ExprKind::Simple(name) => write!(f, "{}", name),
            ExprKind::Postfix(call) => write!(f, "{}", call),
            ExprKind::Constant(value) => write!(f, "{}", value),
            ExprKind::Bracketed(e) => write!(f, "({})", e),
            ExprKind::Negated(e) => write!(f, "!{}", e),
            ExprKind::Binary(op, lhs, rhs) => write!(f, "{} {} {}", lhs, op, rhs),
            ExprKind::Relation(rel) => {
                write!(f, "{} {} {}", rel.lhs, rel.op, rel.rhs)?;
                if let Some(just) = &rel.justification {
                    write!(f, " ~[{}]", just)?;
                }
                Ok(())
            }
            ExprKind::Lambda(lambda) => write!(f, "{}", lambda),
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
