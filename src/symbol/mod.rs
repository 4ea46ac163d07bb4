//! Scopes and the symbols they bind.

use std::fmt;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

use crate::ast::{Expr, ProofChain};

mod analyse;
pub use analyse::*;

/// The name every function or template body uses to refer to itself
pub const THIS: &str = "this";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Matches every other type
    Any,
    Bool,
    /// A declared `type`, or a unary predicate used as a type
    Named(String),
    /// A predicate value, `func(T, ...) bool`
    Func(Vec<Type>),
}

impl Type {
    /// Whether a value of type `self` may stand where `other` is expected (and vice versa)
    pub fn matches(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Any, _) | (_, Type::Any) => true,
            (Type::Func(a), Type::Func(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.matches(y))
            }
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "any"),
            Type::Bool => write!(f, "bool"),
            Type::Named(name) => write!(f, "{}", name),
            Type::Func(params) => write!(f, "func({}) bool", params.iter().join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

impl Parameter {
    pub fn new(name: &str, ty: Type) -> Parameter {
        Parameter { name: name.to_string(), ty }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    Undefined(String),
    UndefinedType(String),
    Redeclared(String),
    NotInvocable(String),
    NotPrimary(String),
    /// A name used by a template's body that the current scope binds locally
    Shadowed { name: String, template: String },
    LengthMismatch { name: String, expected: usize, found: usize },
    /// `position` counts from 1
    ParameterType { name: String, position: usize, expected: Type, found: Type },
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeError::Undefined(name) => write!(f, "undefined name `{}`", name),
            ScopeError::UndefinedType(name) => write!(f, "undefined type `{}`", name),
            ScopeError::Redeclared(name) => write!(f, "`{}` is already declared in this scope", name),
            ScopeError::NotInvocable(name) => write!(f, "`{}` can not be invoked", name),
            ScopeError::NotPrimary(name) => write!(f, "`{}` is not a primary expression", name),
            ScopeError::Shadowed { name, template } => {
                write!(f, "`{}` used by `{}` is shadowed by a local binding", name, template)
            }
            ScopeError::LengthMismatch { name, expected, found } => {
                write!(f, "`{}` takes {} argument(s) but {} were supplied", name, expected, found)
            }
            ScopeError::ParameterType { name, position, expected, found } => {
                write!(f, "parameter {} of `{}` expects type {}, found {}", position, name, expected, found)
            }
        }
    }
}

impl std::error::Error for ScopeError {}

/// Check supplied argument types positionally against a signature
pub fn check_signature(name: &str, declared: &[Type], supplied: &[Type]) -> Result<(), ScopeError> {
    if declared.len() != supplied.len() {
        return Err(ScopeError::LengthMismatch {
            name: name.to_string(),
            expected: declared.len(),
            found: supplied.len(),
        });
    }
    for (i, (expected, found)) in declared.iter().zip(supplied.iter()).enumerate() {
        if !found.matches(expected) {
            return Err(ScopeError::ParameterType {
                name: name.to_string(),
                position: i + 1,
                expected: expected.clone(),
                found: found.clone(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub is_axiom: bool,
    pub name: String,
    pub params: Vec<Parameter>,
    pub ret: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub is_axiom: bool,
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Expr,
    pub proofs: Vec<ProofChain>,
}

/// A fact established earlier in the same proof
#[derive(Debug, Clone, PartialEq)]
pub struct LocalProof {
    pub expr: Expr,
}

impl LocalProof {
    pub fn new() -> LocalProof {
        LocalProof { expr: Expr::constant(true) }
    }
}

impl Default for LocalProof {
    fn default() -> Self {
        LocalProof::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// A value of the given type: a parameter or a prelude constant
    Type(Type),
    /// A declared nominal type; not usable as a value
    TypeName(Type),
    Function(Rc<Function>),
    Template(Rc<Template>),
    LocalProof(LocalProof),
}

fn param_types(params: &[Parameter]) -> Vec<Type> {
    params.iter().map(|p| p.ty.clone()).collect()
}

impl Function {
    /// Unary and bool-valued, so its name may be used as a type
    pub fn is_predicate(&self) -> bool {
        self.params.len() == 1 && self.ret == Type::Bool
    }
    pub fn check_invocation(&self, supplied: &[Type]) -> Result<(), ScopeError> {
        check_signature(&self.name, &param_types(&self.params), supplied)
    }
    /// The bindings visible inside this function's own declaration
    pub fn table(self: &Rc<Self>) -> Result<Table, ScopeError> {
        let mut table = Table::with_params(&self.params)?;
        table.declare(THIS, Symbol::Function(Rc::clone(self)))?;
        Ok(table)
    }
}

impl Template {
    /// The type of the template as a predicate value
    pub fn signature(&self) -> Type {
        Type::Func(param_types(&self.params))
    }
    pub fn check_invocation(&self, supplied: &[Type]) -> Result<(), ScopeError> {
        check_signature(&self.name, &param_types(&self.params), supplied)
    }
    /// The bindings visible inside this template's body and proofs
    pub fn table(self: &Rc<Self>) -> Result<Table, ScopeError> {
        let mut table = Table::with_params(&self.params)?;
        table.declare(THIS, Symbol::Template(Rc::clone(self)))?;
        Ok(table)
    }
    /// The body must read the same wherever it is instantiated: none of the
    /// declarations it mentions may be hidden by a local binding of `table`
    pub fn check_unshadowed(&self, table: &Table) -> Result<(), ScopeError> {
        let mut shadowed = self.body
            .free_names()
            .into_iter()
            .filter(|name| name != THIS && !self.params.iter().any(|p| &p.name == name))
            .filter(|name| table.is_local(name))
            .collect::<Vec<_>>();
        shadowed.sort();
        match shadowed.into_iter().next() {
            Some(name) => Err(ScopeError::Shadowed { name, template: self.name.clone() }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_axiom { "@" } else { "" };
        write!(f, "{}func {}({}) {}", marker, self.name, self.params.iter().join(", "), self.ret)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_axiom { "@" } else { "" };
        write!(f, "{}tmpl {}({}): {}", marker, self.name, self.params.iter().join(", "), self.body)
    }
}

/// Names bound in one scope. Keys are unique; `nest` lets a child shadow its parent.
/// Names bound by a nested scope (parameters, labels) are local; declarations are not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    symbols: IndexMap<String, Symbol>,
    locals: IndexSet<String>,
}

impl Table {
    pub fn new() -> Table {
        Table { symbols: IndexMap::new(), locals: IndexSet::new() }
    }
    /// A table binding each parameter as a value of its type
    pub fn with_params(params: &[Parameter]) -> Result<Table, ScopeError> {
        let mut table = Table::new();
        for param in params {
            table.declare(&param.name, Symbol::Type(param.ty.clone()))?;
        }
        Ok(table)
    }
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }
    /// Bind `name`, replacing any previous binding
    pub fn bind(&mut self, name: &str, symbol: Symbol) -> Option<Symbol> {
        self.symbols.insert(name.to_string(), symbol)
    }
    /// Bind `name` as a local, such as a proof label
    pub fn bind_local(&mut self, name: &str, symbol: Symbol) -> Option<Symbol> {
        self.locals.insert(name.to_string());
        self.bind(name, symbol)
    }
    pub fn is_local(&self, name: &str) -> bool {
        self.locals.contains(name)
    }
    /// Bind a name that must be new to this table
    pub fn declare(&mut self, name: &str, symbol: Symbol) -> Result<(), ScopeError> {
        if self.contains(name) {
            return Err(ScopeError::Redeclared(name.to_string()));
        }
        self.bind(name, symbol);
        Ok(())
    }
    /// The union of `parent` and `self`, where `self` wins on collision
    pub fn nest(&self, parent: &Table) -> Table {
        let mut nested = parent.clone();
        for (name, symbol) in self.symbols.iter() {
            nested.bind_local(name, symbol.clone());
        }
        nested
    }
    pub fn len(&self) -> usize {
        self.symbols.len()
    }
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item=(&String, &Symbol)> {
        self.symbols.iter()
    }
    /// Check that every name mentioned by `ty` is a type in this scope
    pub fn resolve_type(&self, ty: &Type) -> Result<Type, ScopeError> {
        match ty {
            Type::Any | Type::Bool => Ok(ty.clone()),
            Type::Named(name) => match self.get(name) {
                Some(Symbol::TypeName(_)) => Ok(ty.clone()),
                Some(Symbol::Function(f)) if f.is_predicate() => Ok(ty.clone()),
                _ => Err(ScopeError::UndefinedType(name.clone())),
            },
            Type::Func(params) => {
                let params = params
                    .iter()
                    .map(|p| self.resolve_type(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Type::Func(params))
            }
        }
    }
    /// Resolve every parameter's type
    pub fn resolve_params(&self, params: &[Parameter]) -> Result<Vec<Parameter>, ScopeError> {
        params
            .iter()
            .map(|p| Ok(Parameter::new(&p.name, self.resolve_type(&p.ty)?)))
            .collect()
    }
}
