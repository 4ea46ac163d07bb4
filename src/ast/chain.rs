use std::fmt;

use itertools::Itertools;

use crate::ast::{Expr, ExprKind, Operator, Relation};
use crate::symbol::Parameter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The proof step is not made of links
    NotAChain(String),
    /// A chain links with both `==>` and `<==`
    NoCommonOperator { first: Operator, conflicting: Operator },
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::NotAChain(expr) => write!(f, "proof step is not a relation chain: `{}`", expr),
            ChainError::NoCommonOperator { first, conflicting } => {
                write!(f, "no common operator: `{}` conflicts with `{}`", conflicting, first)
            }
        }
    }
}

impl std::error::Error for ChainError {}

/// A non-empty sequence of links where each link starts at the end of the previous one
#[derive(Debug, Clone, PartialEq)]
pub struct RelationChain {
    links: Vec<Relation>,
}

fn as_link(expr: &Expr) -> Option<Relation> {
    match expr.kind() {
        ExprKind::Relation(relation) => Some(relation.clone()),
        ExprKind::Binary(op, lhs, rhs) if op.is_link() => Some(Relation {
            op: *op,
            lhs: lhs.clone(),
            rhs: rhs.clone(),
            justification: None,
        }),
        _ => None,
    }
}

impl RelationChain {
    /// Flatten `A ==> B === C` into `[A ==> B, B === C]`.
    /// Bracketed relations are operands, not links.
    pub fn quantise(expr: &Expr) -> Result<RelationChain, ChainError> {
        let link = as_link(expr).ok_or_else(|| ChainError::NotAChain(expr.to_string()))?;
        let mut links = match RelationChain::quantise(&link.lhs) {
            Ok(chain) => chain.links,
            Err(_) => vec![],
        };
        let link = match links.last() {
            Some(previous) => Relation { lhs: previous.rhs.clone(), ..link },
            None => link,
        };
        links.push(link);
        Ok(RelationChain { links })
    }
    pub fn links(&self) -> &[Relation] {
        &self.links
    }
    pub fn len(&self) -> usize {
        self.links.len()
    }
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
    /// Each link as a standalone expression
    pub fn link_exprs(&self) -> impl Iterator<Item=Expr> + '_ {
        self.links.iter().map(|link| ExprKind::Relation(link.clone()).into_expr())
    }
    /// The single directional operator of the chain. `===` links are neutral;
    /// a chain of only `===` links is an equivalence.
    pub fn operator(&self) -> Result<Operator, ChainError> {
        let mut resolved: Option<Operator> = None;
        for link in self.links.iter() {
            match (link.op, resolved) {
                (Operator::Eqv, _) => {}
                (op, None) => resolved = Some(op),
                (op, Some(first)) if op != first => {
                    return Err(ChainError::NoCommonOperator { first, conflicting: op });
                }
                (_, Some(_)) => {}
            }
        }
        Ok(resolved.unwrap_or(Operator::Eqv))
    }
    /// `first.lhs op last.rhs` for the chain's operator
    pub fn burden(&self) -> Result<Expr, ChainError> {
        let op = self.operator()?;
        match (self.links.first(), self.links.last()) {
            (Some(first), Some(last)) => Ok(Expr::binary(op, first.lhs.clone(), last.rhs.clone())),
            _ => Err(ChainError::NotAChain(String::new())),
        }
    }
}

impl fmt::Display for RelationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.links.first() {
            write!(f, "{}", first.lhs)?;
        }
        for link in self.links.iter() {
            write!(f, " {} {}", link.op, link.rhs)?;
            if let Some(just) = &link.justification {
                write!(f, " ~[{}]", just)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Proof {
    Chain(RelationChain),
    Labelled { label: String, proof: Box<Proof> },
    /// A chain proved for arbitrary values of its parameters
    Lambda { params: Vec<Parameter>, chain: RelationChain },
}

impl Proof {
    /// A relation chain, or a lambda whose body is one
    pub fn from_expr(expr: &Expr) -> Result<Proof, ChainError> {
        match expr.unbracketed().kind() {
            ExprKind::Lambda(lambda) => Ok(Proof::Lambda {
                params: lambda.params.clone(),
                chain: RelationChain::quantise(lambda.body.unbracketed())?,
            }),
            _ => Ok(Proof::Chain(RelationChain::quantise(expr)?)),
        }
    }
    pub fn labelled(label: &str, proof: Proof) -> Proof {
        Proof::Labelled { label: label.to_string(), proof: Box::new(proof) }
    }
    pub fn chain(&self) -> &RelationChain {
        match self {
            Proof::Chain(chain) | Proof::Lambda { chain, .. } => chain,
            Proof::Labelled { proof, .. } => proof.chain(),
        }
    }
    pub fn label(&self) -> Option<&str> {
        match self {
            Proof::Labelled { label, .. } => Some(label),
            Proof::Chain(_) | Proof::Lambda { .. } => None,
        }
    }
    /// Parameters bound over the chain, if any
    pub fn params(&self) -> &[Parameter] {
        match self {
            Proof::Lambda { params, .. } => params,
            Proof::Labelled { proof, .. } => proof.params(),
            Proof::Chain(_) => &[],
        }
    }
    /// The single obligation the chain establishes
    pub fn burden(&self) -> Result<Expr, ChainError> {
        match self {
            Proof::Chain(chain) => chain.burden(),
            Proof::Labelled { proof, .. } => proof.burden(),
            Proof::Lambda { params, chain } => Ok(Expr::lambda(params.clone(), chain.burden()?)),
        }
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proof::Chain(chain) => write!(f, "{}", chain),
            Proof::Labelled { label, proof } => write!(f, "{}: {}", label, proof),
            Proof::Lambda { params, chain } => write!(f, "ψ({}) {{ {} }}", params.iter().join(", "), chain),
        }
    }
}

/// One proof block: facts established in order, then the proof of the template itself
#[derive(Debug, Clone, PartialEq)]
pub struct ProofChain {
    pub preamble: Vec<Proof>,
    pub last: Proof,
}

impl ProofChain {
    pub fn new(mut proofs: Vec<Proof>) -> Option<ProofChain> {
        let last = proofs.pop()?;
        Some(ProofChain { preamble: proofs, last })
    }
}
