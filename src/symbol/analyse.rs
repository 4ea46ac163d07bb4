//! Semantic analysis: surface expressions to kernel propositions.
//!
//! Every call, name and lambda becomes an opaque boolean atom of the kernel,
//! named by its canonical rendering. Two occurrences denote the same atom exactly
//! when they render the same, so the rendering parenthesises nested operators and
//! ignores source brackets.

use std::fmt;
use std::rc::Rc;

use itertools::Itertools;

use crate::ast::{Call, Expr, ExprKind, Lambda, Operator, Relation, Substitution, SubstitutionError};
use crate::error::InternalError;
use crate::symbol::{check_signature, ScopeError, Symbol, Table, Template, Type, THIS};
use crate::truth::{self, Proposition};

/// The result of analysing an expression
#[derive(Debug, Clone, PartialEq)]
pub struct Analysed {
    pub prop: Proposition,
    pub ty: Type,
    /// Canonical rendering, used to name atoms built from this expression
    pub name: String,
}

impl Analysed {
    fn atom(name: String, ty: Type) -> Analysed {
        Analysed { prop: truth::variable(name.as_str()), ty, name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    NonBoolean { operator: String, operand: String, found: Type },
    /// A template body that is not boolean
    NotAProposition { name: String, found: Type },
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::NonBoolean { operator, operand, found } => {
                write!(f, "operator on non-boolean: `{}` applied to `{}` of type {}", operator, operand, found)
            }
            TypeError::NotAProposition { name, found } => {
                write!(f, "the body of `{}` has type {}, expected bool", name, found)
            }
        }
    }
}

impl std::error::Error for TypeError {}

#[derive(Debug, Clone, PartialEq)]
pub enum JustificationError {
    NotTemplate(String),
    Instantiation { name: String, cause: Box<AnalysisError> },
}

impl fmt::Display for JustificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JustificationError::NotTemplate(name) => write!(f, "justification `{}` is not a template", name),
            JustificationError::Instantiation { name, cause } => {
                write!(f, "could not instantiate justification `{}`: {}", name, cause)
            }
        }
    }
}

impl std::error::Error for JustificationError {}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    Scope(ScopeError),
    Type(TypeError),
    Justification(JustificationError),
    Substitution(SubstitutionError),
    Internal(InternalError),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Scope(err) => write!(f, "{}", err),
            AnalysisError::Type(err) => write!(f, "{}", err),
            AnalysisError::Justification(err) => write!(f, "{}", err),
            AnalysisError::Substitution(err) => write!(f, "{}", err),
            AnalysisError::Internal(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<ScopeError> for AnalysisError {
    fn from(err: ScopeError) -> Self {
        AnalysisError::Scope(err)
    }
}
impl From<TypeError> for AnalysisError {
    fn from(err: TypeError) -> Self {
        AnalysisError::Type(err)
    }
}
impl From<JustificationError> for AnalysisError {
    fn from(err: JustificationError) -> Self {
        AnalysisError::Justification(err)
    }
}
impl From<SubstitutionError> for AnalysisError {
    fn from(err: SubstitutionError) -> Self {
        AnalysisError::Substitution(err)
    }
}
impl From<InternalError> for AnalysisError {
    fn from(err: InternalError) -> Self {
        AnalysisError::Internal(err)
    }
}

fn require_bool(operator: &str, analysed: &Analysed) -> Result<(), TypeError> {
    if analysed.ty.matches(&Type::Bool) {
        Ok(())
    } else {
        Err(TypeError::NonBoolean {
            operator: operator.to_string(),
            operand: analysed.name.clone(),
            found: analysed.ty.clone(),
        })
    }
}

/// The name of an operand of a binary operator or negation
fn operand_name(expr: &Expr, analysed: &Analysed) -> String {
    match expr.unbracketed().kind() {
        ExprKind::Binary(_, _, _) | ExprKind::Relation(_) => format!("({})", analysed.name),
        _ => analysed.name.clone(),
    }
}

fn connective(op: Operator, a: Proposition, b: Proposition) -> Proposition {
    match op {
        Operator::And => truth::and(a, b),
        Operator::Or => truth::or(a, b),
        Operator::Eqv => truth::eqv(a, b),
        Operator::Impl => truth::implies(a, b),
        Operator::Fllw => truth::follows(a, b),
    }
}

/// Analyse `expr` against the bindings of `table`
pub fn analyse(expr: &Expr, table: &Table) -> Result<Analysed, AnalysisError> {
    match expr.kind() {
        ExprKind::Simple(name) => analyse_simple(name, table),
        ExprKind::Postfix(call) => analyse_call(call, table),
        ExprKind::Constant(value) => Ok(Analysed {
            prop: truth::constant(*value),
            ty: Type::Bool,
            name: value.to_string(),
        }),
        ExprKind::Bracketed(inner) => analyse(inner, table),
        ExprKind::Negated(inner) => {
            let a = analyse(inner, table)?;
            require_bool("!", &a)?;
            let name = format!("!{}", operand_name(inner, &a));
            Ok(Analysed { prop: truth::not(a.prop), ty: Type::Bool, name })
        }
        ExprKind::Binary(op, lhs, rhs) => analyse_binary(*op, lhs, rhs, table),
        ExprKind::Relation(relation) => analyse_relation(relation, table),
        ExprKind::Lambda(lambda) => analyse_lambda(lambda, table),
    }
}

fn analyse_simple(name: &str, table: &Table) -> Result<Analysed, AnalysisError> {
    match table.get(name) {
        Some(Symbol::Template(template)) if name == THIS => {
            let body = analyse(&template.body, &enclosing(template, table)?)?;
            Ok(Analysed { prop: body.prop, ty: template.signature(), name: name.to_string() })
        }
        Some(Symbol::LocalProof(fact)) => analyse(&fact.expr, table),
        Some(Symbol::Type(ty)) => Ok(Analysed::atom(name.to_string(), ty.clone())),
        Some(_) => Err(ScopeError::NotPrimary(name.to_string()).into()),
        None => Err(ScopeError::Undefined(name.to_string()).into()),
    }
}

/// The scope in which a template's body is read: its parameters over `table`,
/// with `this` reduced to an opaque predicate so recursive bodies terminate.
fn enclosing(template: &Rc<Template>, table: &Table) -> Result<Table, AnalysisError> {
    template.check_unshadowed(table)?;
    let mut scope = template.table()?.nest(table);
    scope.bind(THIS, Symbol::Type(template.signature()));
    Ok(scope)
}

/// Types of call arguments. A lambda argument is a predicate value here,
/// though it reads as an opaque boolean everywhere else.
fn analyse_arguments(args: &[Expr], table: &Table) -> Result<(Vec<Type>, Vec<String>), AnalysisError> {
    let mut types = Vec::with_capacity(args.len());
    let mut names = Vec::with_capacity(args.len());
    for arg in args {
        let a = analyse(arg, table)?;
        let ty = match arg.unbracketed().kind() {
            ExprKind::Lambda(lambda) => Type::Func(lambda.params.iter().map(|p| p.ty.clone()).collect()),
            _ => a.ty,
        };
        types.push(ty);
        names.push(a.name);
    }
    Ok((types, names))
}

fn analyse_call(call: &Call, table: &Table) -> Result<Analysed, AnalysisError> {
    let symbol = table
        .get(&call.name)
        .ok_or_else(|| ScopeError::Undefined(call.name.clone()))?;
    if let (Symbol::Template(template), true) = (symbol, call.name == THIS) {
        return instantiate(template, &call.args, table);
    }
    let (types, names) = analyse_arguments(&call.args, table)?;
    let name = format!("{}({})", call.name, names.iter().join(", "));
    match symbol {
        Symbol::Function(function) => {
            function.check_invocation(&types)?;
            Ok(Analysed::atom(name, function.ret.clone()))
        }
        Symbol::Template(template) => {
            template.check_invocation(&types)?;
            Ok(Analysed::atom(name, Type::Bool))
        }
        Symbol::Type(Type::Any) => Ok(Analysed::atom(name, Type::Bool)),
        Symbol::Type(Type::Func(params)) => {
            check_signature(&call.name, params, &types)?;
            Ok(Analysed::atom(name, Type::Bool))
        }
        Symbol::Type(_) | Symbol::TypeName(_) | Symbol::LocalProof(_) => {
            Err(ScopeError::NotInvocable(call.name.clone()).into())
        }
    }
}

/// Substitute `args` for the template's parameters and analyse its body.
/// The arguments are read in `table`; every other name of the body must mean
/// there what it meant where the template was declared.
pub fn instantiate(template: &Rc<Template>, args: &[Expr], table: &Table) -> Result<Analysed, AnalysisError> {
    let (types, _) = analyse_arguments(args, table)?;
    template.check_invocation(&types)?;
    template.check_unshadowed(table)?;
    let sub = template.params
        .iter()
        .map(|p| p.name.clone())
        .zip(args.iter().cloned())
        .collect::<Substitution>();
    let body = template.body.replace(&sub)?;
    trace!("instantiated {} as {}", template.name, body);
    let mut scope = table.clone();
    scope.bind(THIS, Symbol::Type(template.signature()));
    let analysed = analyse(&body, &scope)?;
    require_bool(&template.name, &analysed)?;
    Ok(analysed)
}

fn analyse_operands(op: Operator, lhs: &Expr, rhs: &Expr, table: &Table) -> Result<(Analysed, Analysed), AnalysisError> {
    let a = analyse(lhs, table)?;
    require_bool(op.symbol(), &a)?;
    let b = analyse(rhs, table)?;
    require_bool(op.symbol(), &b)?;
    Ok((a, b))
}

fn analyse_binary(op: Operator, lhs: &Expr, rhs: &Expr, table: &Table) -> Result<Analysed, AnalysisError> {
    let (a, b) = analyse_operands(op, lhs, rhs, table)?;
    let name = binary_name(op, lhs, &a, rhs, &b);
    Ok(Analysed { prop: connective(op, a.prop, b.prop), ty: Type::Bool, name })
}

fn binary_name(op: Operator, lhs: &Expr, a: &Analysed, rhs: &Expr, b: &Analysed) -> String {
    format!("{} {} {}", operand_name(lhs, a), op, operand_name(rhs, b))
}

fn analyse_justification(call: &Call, table: &Table) -> Result<Analysed, AnalysisError> {
    let template = match table.get(&call.name) {
        Some(Symbol::Template(template)) => template,
        Some(_) => return Err(JustificationError::NotTemplate(call.name.clone()).into()),
        None => return Err(ScopeError::Undefined(call.name.clone()).into()),
    };
    instantiate(template, &call.args, table).map_err(|cause| {
        JustificationError::Instantiation { name: call.name.clone(), cause: Box::new(cause) }.into()
    })
}

fn analyse_relation(relation: &Relation, table: &Table) -> Result<Analysed, AnalysisError> {
    let Relation { op, lhs, rhs, justification } = relation;
    let (a, b) = analyse_operands(*op, lhs, rhs, table)?;
    let name = binary_name(*op, lhs, &a, rhs, &b);
    let j = match justification {
        Some(call) => Some(analyse_justification(call, table)?.prop),
        None => None,
    };
    let prop = match (op, j) {
        (Operator::Impl, Some(j)) => truth::implies(truth::and(j, a.prop), b.prop),
        (Operator::Fllw, Some(j)) => truth::follows(a.prop, truth::and(j, b.prop)),
        (Operator::Eqv, Some(j)) => truth::eqv(truth::and(j.clone(), a.prop), truth::and(j, b.prop)),
        (Operator::Impl, None) | (Operator::Fllw, None) | (Operator::Eqv, None) => connective(*op, a.prop, b.prop),
        (Operator::And, _) | (Operator::Or, _) => internal_error!("relation over a non-link operator")?,
    };
    Ok(Analysed { prop, ty: Type::Bool, name })
}

fn analyse_lambda(lambda: &Lambda, table: &Table) -> Result<Analysed, AnalysisError> {
    let params = table.resolve_params(&lambda.params)?;
    let scope = Table::with_params(&params)?.nest(table);
    let body = analyse(&lambda.body, &scope)?;
    require_bool("ψ", &body)?;
    let name = format!("ψ({}){{{}}}", params.iter().join(", "), body.name);
    Ok(Analysed::atom(name, Type::Bool))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::ast::{parse_expr, Expr, Operator};
    use crate::symbol::*;
    use crate::truth::decide;

    fn nat() -> Type {
        Type::Named("nat".to_string())
    }

    /// nat(x) bool, succ(x nat) nat, less(a nat, b nat) bool, @tmpl succnat(x)
    fn peano() -> Table {
        let mut table = Table::new();
        table.bind("0", Symbol::Type(Type::Any));
        table.bind("nat", Symbol::Function(Rc::new(Function {
            is_axiom: false,
            name: "nat".to_string(),
            params: vec![Parameter::new("x", Type::Any)],
            ret: Type::Bool,
        })));
        table.bind("succ", Symbol::Function(Rc::new(Function {
            is_axiom: false,
            name: "succ".to_string(),
            params: vec![Parameter::new("x", nat())],
            ret: nat(),
        })));
        table.bind("less", Symbol::Function(Rc::new(Function {
            is_axiom: false,
            name: "less".to_string(),
            params: vec![Parameter::new("a", nat()), Parameter::new("b", nat())],
            ret: Type::Bool,
        })));
        table.bind("succnat", Symbol::Template(Rc::new(Template {
            is_axiom: true,
            name: "succnat".to_string(),
            params: vec![Parameter::new("x", Type::Any)],
            body: expr("x nat ==> succ(x) nat"),
            proofs: vec![],
        })));
        table.bind("x", Symbol::Type(Type::Any));
        table.bind("p", Symbol::Type(Type::Bool));
        table.bind("q", Symbol::Type(Type::Bool));
        table
    }

    fn expr(source: &str) -> Expr {
        parse_expr(source).expect("well formed")
    }

    fn analysed(source: &str) -> Analysed {
        analyse(&expr(source), &peano()).expect("analyses")
    }

    fn error(source: &str) -> AnalysisError {
        analyse(&expr(source), &peano()).expect_err("does not analyse")
    }

    #[test]
    fn analyse_names() {
        assert_eq!(analysed("x nat").name, "nat(x)");
        assert_eq!(analysed("succ(x)").name, "succ(x)");
        assert_eq!(analysed("succ(x)").ty, nat());
        assert_eq!(analysed("!(p && q) || (p)").name, "!(p && q) || p");
        assert_eq!(analysed("p ==> (q ==> p)").name, "p ==> (q ==> p)");
    }
    #[test]
    fn analyse_tautology() {
        let a = analysed("p && q ==> q");
        assert_eq!(decide(&a.prop), Ok(true));
        assert_eq!(a.ty, Type::Bool);
    }
    #[test]
    fn analyse_atoms_are_shared() {
        // both occurrences of `x nat` are the same atom
        let a = analysed("x nat && (x) nat ==> nat(x)");
        assert_eq!(decide(&a.prop), Ok(true));
    }
    #[test]
    fn analyse_justification_folds() {
        let a = analysed("x nat ==> succ(x) nat ~[succnat(x)]");
        assert_eq!(decide(&a.prop), Ok(true));
        let unjustified = analysed("x nat ==> succ(x) nat");
        assert!(decide(&unjustified.prop).is_err());
    }
    #[test]
    fn analyse_undefined() {
        assert_eq!(error("y nat"), AnalysisError::Scope(ScopeError::Undefined("y".to_string())));
    }
    #[test]
    fn analyse_not_primary() {
        assert_eq!(error("nat && p"), AnalysisError::Scope(ScopeError::NotPrimary("nat".to_string())));
    }
    #[test]
    fn analyse_not_invocable() {
        assert_eq!(error("p(x)"), AnalysisError::Scope(ScopeError::NotInvocable("p".to_string())));
    }
    #[test]
    fn analyse_call_length() {
        match error("less(x)") {
            AnalysisError::Scope(ScopeError::LengthMismatch { expected: 2, found: 1, .. }) => {}
            other => panic!("expected a length mismatch, got {:?}", other),
        }
    }
    #[test]
    fn analyse_call_type() {
        match error("less(x, p)") {
            AnalysisError::Scope(ScopeError::ParameterType { position: 2, found: Type::Bool, .. }) => {}
            other => panic!("expected a parameter type mismatch, got {:?}", other),
        }
    }
    #[test]
    fn analyse_non_boolean() {
        let err = error("succ(x) && p");
        assert_eq!(err, AnalysisError::Type(TypeError::NonBoolean {
            operator: "&&".to_string(),
            operand: "succ(x)".to_string(),
            found: nat(),
        }));
        assert!(err.to_string().starts_with("operator on non-boolean"));
        assert!(matches!(error("!succ(x)"), AnalysisError::Type(_)));
    }
    #[test]
    fn analyse_bad_justification() {
        assert_eq!(
            error("p ==> p ~[nat(x)]"),
            AnalysisError::Justification(JustificationError::NotTemplate("nat".to_string()))
        );
        match error("p ==> p ~[succnat(x, x)]") {
            AnalysisError::Justification(JustificationError::Instantiation { name, .. }) => assert_eq!(name, "succnat"),
            other => panic!("expected an instantiation failure, got {:?}", other),
        }
    }
    #[test]
    fn analyse_justification_shadowed() {
        // inside a template with a parameter named `nat`, succnat's `nat` would be captured
        let params = Table::with_params(&[Parameter::new("nat", Type::Any)]).expect("distinct parameters");
        let table = params.nest(&peano());
        match analyse(&expr("0 nat ==> 0 nat ~[succnat(0)]"), &table) {
            Err(AnalysisError::Justification(JustificationError::Instantiation { name, cause })) => {
                assert_eq!(name, "succnat");
                assert_eq!(*cause, AnalysisError::Scope(ScopeError::Shadowed {
                    name: "nat".to_string(),
                    template: "succnat".to_string(),
                }));
            }
            other => panic!("expected a shadowing failure, got {:?}", other),
        }
        // a local that only matches a parameter name is substituted away
        let params = Table::with_params(&[Parameter::new("x", Type::Any)]).expect("distinct parameters");
        let a = analyse(&expr("x nat ==> succ(x) nat ~[succnat(x)]"), &params.nest(&peano())).expect("analyses");
        assert_eq!(decide(&a.prop), Ok(true));
    }
    #[test]
    fn analyse_justification_lambda_arity() {
        let mut table = peano();
        table.bind("ax", Symbol::Template(Rc::new(Template {
            is_axiom: true,
            name: "ax".to_string(),
            params: vec![Parameter::new("y", Type::Any)],
            body: expr("y(0) ==> y(0)"),
            proofs: vec![],
        })));
        table.bind("y", Symbol::Type(Type::Any));
        assert!(analyse(&expr("y(0) ==> y(0) ~[ax(psi(a) { true })]"), &table).is_ok());
        match analyse(&expr("y(0) ==> y(0) ~[ax(psi(a, b) { true })]"), &table) {
            Err(AnalysisError::Justification(JustificationError::Instantiation { cause, .. })) => {
                assert!(matches!(*cause, AnalysisError::Substitution(_)), "{:?}", cause);
            }
            other => panic!("expected a substitution failure, got {:?}", other),
        }
    }
    #[test]
    fn analyse_relation_needs_link() {
        let relation = Expr::relation(Operator::And, expr("p"), expr("q"), None);
        assert!(matches!(analyse(&relation, &peano()), Err(AnalysisError::Internal(_))));
    }
    #[test]
    fn analyse_lambda() {
        let a = analysed("psi(k nat) { k nat ==> succ(k) nat }");
        assert_eq!(a.name, "ψ(k nat){nat(k) ==> nat(succ(k))}");
        assert_eq!(a.ty, Type::Bool);
        // the parameter is only bound inside the lambda
        assert!(analyse(&expr("psi(k) { k nat } && k nat"), &peano()).is_err());
    }
    #[test]
    fn analyse_predicate_parameter() {
        let mut table = peano();
        table.bind("y", Symbol::Type(Type::Func(vec![nat()])));
        let a = analyse(&expr("y(0) ==> y(0)"), &table).expect("analyses");
        assert_eq!(decide(&a.prop), Ok(true));
        assert!(analyse(&expr("y(0, 0)"), &table).is_err());
    }
    #[test]
    fn analyse_this() {
        let template = Rc::new(Template {
            is_axiom: false,
            name: "t".to_string(),
            params: vec![Parameter::new("a", Type::Bool)],
            body: expr("a || !a"),
            proofs: vec![],
        });
        let table = template.table().expect("distinct parameters").nest(&peano());
        let this = analyse(&expr("this"), &table).expect("analyses");
        assert_eq!(this.ty, Type::Func(vec![Type::Bool]));
        let applied = analyse(&expr("this(p && q)"), &table).expect("analyses");
        assert_eq!(applied.name, "(p && q) || !(p && q)");
        assert_eq!(decide(&applied.prop), Ok(true));
    }
}
