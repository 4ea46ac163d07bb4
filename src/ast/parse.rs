use pest::Parser;
use pest::Span;
use pest::iterators::Pair;
use pest::error::{Error, ErrorVariant, InputLocation};

use pest_derive::*;
use crate::ast::{Call, Expr, Operator, Proof, ProofChain};
use crate::symbol::{Function, Parameter, Template, Type};

#[derive(Parser)]
#[grammar = "../grammar.pest"]
struct Grammar;

/// A top level item of a source file
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Type(String),
    Function(Function),
    Template(Template),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Type(name) => name,
            Declaration::Function(f) => &f.name,
            Declaration::Template(t) => &t.name,
        }
    }
}

pub fn parse(source: &str) -> Result<Vec<Declaration>, Error<Rule>> {
    let pairs = Grammar::parse(Rule::source, source).map_err(|e| explain_reserved(source, e))?;
    let mut declarations = vec![];
    for pair in pairs.flat_map(|p| p.into_inner()) {
        match pair.as_rule() {
            Rule::EOI => break,
            _ => declarations.push(parse_declaration(pair)?),
        }
    }
    Ok(declarations)
}

/// Parse a single expression, such as a proof step
pub fn parse_expr(source: &str) -> Result<Expr, Error<Rule>> {
    let formula = Grammar::parse(Rule::formula, source)
        .map_err(|e| explain_reserved(source, e))?
        .next()
        .ok_or_else(|| Error::new_from_pos(
            ErrorVariant::CustomError { message: "expected an expression".to_string() },
            pest::Position::from_start(source),
        ))?;
    let span = formula.as_span();
    let expr = formula.into_inner().next().ok_or_else(|| custom(span, "expected an expression"))?;
    parse_expr_pair(expr)
}

fn custom(span: Span<'_>, message: &str) -> Error<Rule> {
    Error::new_from_span(ErrorVariant::CustomError { message: message.to_string() }, span)
}

fn unexpected(pair: &Pair<'_, Rule>) -> Error<Rule> {
    custom(pair.as_span(), &format!("unexpected {:?}", pair.as_rule()))
}

fn parse_declaration(pair: Pair<Rule>) -> Result<Declaration, Error<Rule>> {
    let rule = pair.as_rule();
    let span = pair.as_span();
    let mut is_axiom = rule == Rule::axiom_decl;
    let mut name = None;
    let mut params = vec![];
    let mut ret = Type::Bool;
    let mut body = None;
    let mut proofs = vec![];
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::axiom_marker => is_axiom = true,
            Rule::kw_type | Rule::kw_func | Rule::kw_tmpl | Rule::kw_axiom => {}
            Rule::ident => name = Some(part.as_str().to_string()),
            Rule::params => params = parse_params(part)?,
            Rule::type_name => ret = parse_type(part)?,
            Rule::expr => body = Some(parse_expr_pair(part)?),
            Rule::proof_block => proofs.push(parse_proof_block(part)?),
            _ => return Err(unexpected(&part)),
        }
    }
    let name = name.ok_or_else(|| custom(span.clone(), "declaration is missing a name"))?;
    match rule {
        Rule::type_decl => Ok(Declaration::Type(name)),
        Rule::func_decl => Ok(Declaration::Function(Function { is_axiom, name, params, ret })),
        Rule::tmpl_decl | Rule::axiom_decl => {
            let body = body.ok_or_else(|| custom(span.clone(), "template is missing a body"))?;
            Ok(Declaration::Template(Template { is_axiom, name, params, body, proofs }))
        }
        _ => Err(custom(span, "expected a declaration")),
    }
}

fn parse_params(pair: Pair<Rule>) -> Result<Vec<Parameter>, Error<Rule>> {
    pair.into_inner().map(parse_param).collect()
}

/// An untyped parameter accepts anything
fn parse_param(pair: Pair<Rule>) -> Result<Parameter, Error<Rule>> {
    let span = pair.as_span();
    let mut parts = pair.into_inner();
    let name = parts.next().ok_or_else(|| custom(span.clone(), "parameter is missing a name"))?;
    let ty = match parts.next() {
        Some(ty) => parse_type(ty)?,
        None => Type::Any,
    };
    Ok(Parameter::new(name.as_str(), ty))
}

fn parse_type(pair: Pair<Rule>) -> Result<Type, Error<Rule>> {
    let span = pair.as_span();
    let inner = pair.into_inner().next().ok_or_else(|| custom(span.clone(), "expected a type"))?;
    match inner.as_rule() {
        Rule::ident => Ok(match inner.as_str() {
            "any" => Type::Any,
            "bool" => Type::Bool,
            name => Type::Named(name.to_string()),
        }),
        Rule::arrow_type => {
            let mut params = vec![];
            for part in inner.into_inner() {
                match part.as_rule() {
                    Rule::kw_func => {}
                    Rule::type_name => params.push(parse_type(part)?),
                    Rule::ident if part.as_str() == "bool" => {}
                    Rule::ident => return Err(custom(part.as_span(), "predicate types must return bool")),
                    _ => return Err(unexpected(&part)),
                }
            }
            Ok(Type::Func(params))
        }
        _ => Err(unexpected(&inner)),
    }
}

fn parse_proof_block(pair: Pair<Rule>) -> Result<ProofChain, Error<Rule>> {
    let span = pair.as_span();
    let mut proofs = vec![];
    for step in pair.into_inner() {
        let step_span = step.as_span();
        let mut label = None;
        let mut proof = None;
        for part in step.into_inner() {
            match part.as_rule() {
                Rule::label => label = Some(part.as_str().to_string()),
                Rule::expr => {
                    let expr = parse_expr_pair(part)?;
                    let chain = Proof::from_expr(&expr).map_err(|e| custom(step_span.clone(), &e.to_string()))?;
                    proof = Some(chain);
                }
                _ => return Err(unexpected(&part)),
            }
        }
        let proof = proof.ok_or_else(|| custom(step_span.clone(), "expected a proof step"))?;
        proofs.push(match label {
            Some(label) => Proof::labelled(&label, proof),
            None => proof,
        });
    }
    ProofChain::new(proofs).ok_or_else(|| custom(span, "empty proof block"))
}

/// Links associate to the left, so `a ==> b === c` is `(a ==> b) === c` before quantisation
fn parse_expr_pair(pair: Pair<Rule>) -> Result<Expr, Error<Rule>> {
    let span = pair.as_span();
    let mut parts = pair.into_inner().peekable();
    let first = parts.next().ok_or_else(|| custom(span.clone(), "expected an expression"))?;
    let mut expr = parse_disjunction(first)?;
    while let Some(link) = parts.next() {
        let op = Operator::from_symbol(link.as_str()).ok_or_else(|| unexpected(&link))?;
        let rhs = parts.next().ok_or_else(|| custom(link.as_span(), "link is missing a right hand side"))?;
        let rhs = parse_disjunction(rhs)?;
        let justification = match parts.peek().map(|p| p.as_rule()) {
            Some(Rule::justification) => match parts.next().and_then(|p| p.into_inner().next()) {
                Some(call) => Some(parse_call(call)?),
                None => return Err(custom(span, "empty justification")),
            },
            _ => None,
        };
        expr = Expr::relation(op, expr, rhs, justification);
    }
    Ok(expr)
}

fn parse_disjunction(pair: Pair<Rule>) -> Result<Expr, Error<Rule>> {
    fold_binary(pair, Operator::Or)
}

fn parse_conjunction(pair: Pair<Rule>) -> Result<Expr, Error<Rule>> {
    fold_binary(pair, Operator::And)
}

fn fold_binary(pair: Pair<Rule>, op: Operator) -> Result<Expr, Error<Rule>> {
    let span = pair.as_span();
    let mut operands = pair.into_inner().map(|p| match p.as_rule() {
        Rule::conjunction => parse_conjunction(p),
        Rule::unary => parse_unary(p),
        _ => Err(unexpected(&p)),
    });
    let first = operands.next().ok_or_else(|| custom(span, "expected an operand"))??;
    operands.try_fold(first, |lhs, rhs| Ok(Expr::binary(op, lhs, rhs?)))
}

fn parse_unary(pair: Pair<Rule>) -> Result<Expr, Error<Rule>> {
    let span = pair.as_span();
    let inner = pair.into_inner().next().ok_or_else(|| custom(span.clone(), "expected an operand"))?;
    match inner.as_rule() {
        Rule::negation => {
            let operand = inner.into_inner().next().ok_or_else(|| custom(span, "expected an operand"))?;
            Ok(Expr::negated(parse_unary(operand)?))
        }
        Rule::application => parse_application(inner),
        _ => Err(unexpected(&inner)),
    }
}

/// `x nat` is `nat(x)`, and `(a, b) less` is `less(a, b)`
fn parse_application(pair: Pair<Rule>) -> Result<Expr, Error<Rule>> {
    let span = pair.as_span();
    let mut parts = pair.into_inner();
    let primary = parts.next().ok_or_else(|| custom(span.clone(), "expected an operand"))?;
    let names = parts.map(|p| p.as_str().trim().to_string()).collect::<Vec<_>>();
    let mut names = names.iter();
    let mut expr = if primary.as_rule() == Rule::tuple {
        let args = primary.into_inner().map(parse_expr_pair).collect::<Result<Vec<_>, _>>()?;
        let name = names.next().ok_or_else(|| custom(span, "a tuple must be followed by a predicate name"))?;
        Expr::call(name, args)
    } else {
        parse_primary(primary)?
    };
    for name in names {
        expr = Expr::call(name, vec![expr]);
    }
    Ok(expr)
}

fn parse_primary(pair: Pair<Rule>) -> Result<Expr, Error<Rule>> {
    let span = pair.as_span();
    match pair.as_rule() {
        Rule::constant => Ok(Expr::constant(pair.as_str() == "true")),
        Rule::ident | Rule::numeral => Ok(Expr::simple(pair.as_str())),
        Rule::call => Ok(Expr::call(&call_name(&pair)?, call_args(pair)?)),
        Rule::bracketed => {
            let inner = pair.into_inner().next().ok_or_else(|| custom(span, "expected an expression"))?;
            Ok(Expr::bracketed(parse_expr_pair(inner)?))
        }
        Rule::lambda => {
            let mut params = vec![];
            let mut body = None;
            for part in pair.into_inner() {
                match part.as_rule() {
                    Rule::kw_psi => {}
                    Rule::params => params = parse_params(part)?,
                    Rule::expr => body = Some(parse_expr_pair(part)?),
                    _ => return Err(unexpected(&part)),
                }
            }
            let body = body.ok_or_else(|| custom(span, "lambda is missing a body"))?;
            Ok(Expr::lambda(params, body))
        }
        _ => Err(unexpected(&pair)),
    }
}

fn call_name(pair: &Pair<Rule>) -> Result<String, Error<Rule>> {
    pair.clone()
        .into_inner()
        .next()
        .map(|name| name.as_str().to_string())
        .ok_or_else(|| custom(pair.as_span(), "call is missing a name"))
}

fn call_args(pair: Pair<Rule>) -> Result<Vec<Expr>, Error<Rule>> {
    pair.into_inner().skip(1).map(parse_expr_pair).collect()
}

fn parse_call(pair: Pair<Rule>) -> Result<Call, Error<Rule>> {
    Ok(Call { name: call_name(&pair)?, args: call_args(pair)? })
}

/// updates the error so that reserved words are mentioned in the error message
fn explain_reserved(source: &str, mut error: Error<Rule>) -> Error<Rule> {
    let start_idx = match error.location {
        InputLocation::Pos(idx) => idx,
        InputLocation::Span((idx, _)) => idx,
    };
    // check if reserved word would parse starting here
    let pair = match source.get(start_idx..).map(|rest| Grammar::parse(Rule::reserved, rest)) {
        Some(Ok(mut pairs)) => match pairs.next() {
            Some(pair) => pair,
            None => return error,
        },
        // not a reserved word, it did not fail because of that
        _ => return error,
    };
    error.variant = ErrorVariant::CustomError {
        message: format!("unexpected reserved word `{}`; expected a name or an expression",
                         pair.as_str().trim()
        )
    };
    error
}
