use std::fmt;
use std::rc::Rc;

use itertools::Itertools;
use pest::error::Error;

mod chain;
pub use chain::*;

use crate::ast::{self, Declaration, Rule};
use crate::config::Config;
use crate::symbol::{analyse, AnalysisError, Function, Symbol, Table, Template, Type, TypeError};

/// The lines printed while verifying
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    pub fn line<S: Into<String>>(&mut self, line: S) {
        self.lines.push(line.into());
    }
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines.iter() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Why one declaration was rejected
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub declaration: String,
    pub error: ProofError,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.declaration, self.error)
    }
}

#[derive(Debug)]
pub enum VerifyError {
    Syntax(Error<Rule>),
    Rejected(Vec<Failure>),
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::Syntax(err) => write!(f, "{}", err),
            VerifyError::Rejected(failures) => write!(f, "{}", failures.iter().join("\n")),
        }
    }
}

impl std::error::Error for VerifyError {}

impl From<Error<Rule>> for VerifyError {
    fn from(err: Error<Rule>) -> Self {
        VerifyError::Syntax(err)
    }
}

/// Owns the symbol table of one run: declarations are registered in order,
/// then every template's proofs are checked in the same order.
pub struct Verifier {
    table: Table,
    config: Config,
    transcript: Transcript,
    failures: Vec<Failure>,
}

impl Verifier {
    pub fn new(config: Config) -> Verifier {
        let mut table = Table::new();
        for constant in config.constants() {
            table.bind(constant, Symbol::Type(Type::Any));
        }
        Verifier { table, config, transcript: Transcript::default(), failures: vec![] }
    }
    pub fn table(&self) -> &Table {
        &self.table
    }
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Add a declaration to the table.
    /// A template whose body does not analyse is still registered, but its error is returned.
    pub fn register(&mut self, declaration: Declaration) -> Result<Option<Rc<Template>>, AnalysisError> {
        match declaration {
            Declaration::Type(name) => {
                let ty = Type::Named(name.clone());
                self.table.declare(&name, Symbol::TypeName(ty))?;
                info!("registered type {}", name);
                Ok(None)
            }
            Declaration::Function(function) => {
                let params = self.table.resolve_params(&function.params)?;
                let ret = self.table.resolve_type(&function.ret)?;
                let function = Rc::new(Function { params, ret, ..function });
                function.table()?;
                self.table.declare(&function.name, Symbol::Function(Rc::clone(&function)))?;
                info!("registered {}", function);
                Ok(None)
            }
            Declaration::Template(template) => {
                let params = self.table.resolve_params(&template.params)?;
                let template = Rc::new(Template { params, ..template });
                let scope = template.table()?.nest(&self.table);
                self.table.declare(&template.name, Symbol::Template(Rc::clone(&template)))?;
                info!("registered {}", template);
                let body = analyse(&template.body, &scope)?;
                if !body.ty.matches(&Type::Bool) {
                    return Err(TypeError::NotAProposition { name: template.name.clone(), found: body.ty }.into());
                }
                Ok(Some(template))
            }
        }
    }

    /// Check every proof block of `template`, recording the outcome in the transcript
    pub fn verify_template(&mut self, template: &Rc<Template>) {
        self.transcript.line(template.to_string());
        if template.is_axiom {
            self.transcript.line("axiom");
            return;
        }
        if template.proofs.is_empty() {
            info!("{} has no proof", template.name);
            self.transcript.line("unproved");
            return;
        }
        for chain in template.proofs.iter() {
            self.transcript.line("proof:");
            match self.check_proof_chain(template, chain) {
                Ok(()) => {
                    info!("{} accepted", template.name);
                    self.transcript.line("qed");
                }
                Err(error) => {
                    warn!("{} rejected: {}", template.name, error);
                    self.transcript.line(format!("rejected: {}", error));
                    self.failures.push(Failure { declaration: template.name.clone(), error });
                }
            }
        }
    }

    /// Register every declaration, then verify the templates that registered cleanly
    pub fn run(mut self, declarations: Vec<Declaration>) -> (String, Result<(), VerifyError>) {
        let mut templates = vec![];
        for declaration in declarations {
            let name = declaration.name().to_string();
            let text = match &declaration {
                Declaration::Template(t) => t.to_string(),
                Declaration::Function(f) => f.to_string(),
                Declaration::Type(name) => format!("type {}", name),
            };
            match self.register(declaration) {
                Ok(Some(template)) => templates.push(template),
                Ok(None) => {}
                Err(cause) => {
                    warn!("{} rejected: {}", name, cause);
                    self.transcript.line(text);
                    let error = ProofError::Invalid(cause);
                    self.transcript.line(format!("rejected: {}", error));
                    self.failures.push(Failure { declaration: name, error });
                }
            }
        }
        for template in templates.iter() {
            self.verify_template(template);
        }
        let transcript = self.transcript.to_string();
        if self.failures.is_empty() {
            (transcript, Ok(()))
        } else {
            (transcript, Err(VerifyError::Rejected(self.failures)))
        }
    }
}

/// Parse and verify a source file with the default configuration,
/// returning the transcript and every failure
pub fn verify(source: &str) -> (String, Result<(), VerifyError>) {
    verify_with(source, &Config::default())
}

pub fn verify_with(source: &str, config: &Config) -> (String, Result<(), VerifyError>) {
    let declarations = match ast::parse(source) {
        Ok(declarations) => declarations,
        Err(err) => return (String::new(), Err(err.into())),
    };
    debug!("parsed {} declarations", declarations.len());
    Verifier::new(config.clone()).run(declarations)
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::prover::*;

    const PEANO: &str = "
        func nat(x) bool;
        func succ(x nat) nat;
        axiom one: 1 nat;
        @tmpl succnat(x): x nat ==> succ(x) nat;
    ";

    fn run(proofs: &str) -> (String, Result<(), VerifyError>) {
        verify(&format!("{}{}", PEANO, proofs))
    }

    fn rejection(proofs: &str) -> String {
        match run(proofs).1 {
            Err(err) => err.to_string(),
            Ok(()) => panic!("expected a rejection"),
        }
    }

    #[test]
    fn verify_simple_0() {
        let (transcript, result) = run("
            tmpl thm(x): x nat ==> succ(x) nat {
                x nat ==> succ(x) nat ~[succnat(x)];
            }
        ");
        assert!(result.is_ok(), "{:?}", result);
        assert!(transcript.contains("qed"));
        assert!(transcript.contains("proof:\n\tnat(x) ==> nat(succ(x)) ~[succnat(x)]\nqed"));
    }
    #[test]
    fn verify_negated_consequent() {
        let message = rejection("
            tmpl thm(x): x nat ==> succ(x) nat {
                x nat ==> !succ(x) nat ~[succnat(x)];
            }
        ");
        assert!(message.contains("contradiction"), "{}", message);
        assert!(message.starts_with("thm: "));
    }
    #[test]
    fn verify_burden_failure() {
        let message = rejection("
            tmpl thm(x): x nat ==> !succ(x) nat {
                x nat ==> succ(x) nat ~[succnat(x)];
            }
        ");
        assert!(message.contains("qed burden failure"), "{}", message);
    }
    #[test]
    fn verify_no_common_operator() {
        let message = rejection("
            tmpl mixed(a bool, b bool): a ==> a {
                a ==> a || b <== a;
            }
        ");
        assert!(message.contains("no common operator"), "{}", message);
    }
    #[test]
    fn verify_equivalence_chain() {
        let (_, result) = run("
            tmpl demorgan(a bool, b bool): !(a && b) === !a || !b {
                !(a && b) === !a || !b === !(a && b) || false === !a || !b;
            }
        ");
        assert!(result.is_ok(), "{:?}", result);
    }
    #[test]
    fn verify_lambda_proof() {
        let (transcript, result) = run("
            tmpl step(): psi(k nat) { k nat ==> succ(k) nat } {
                psi(k nat) { k nat ==> succ(k) nat ~[succnat(k)] };
            }
        ");
        assert!(result.is_ok(), "{:?}", result);
        assert!(transcript.ends_with("qed\n"));
    }
    #[test]
    fn verify_labels() {
        let (_, result) = run("
            tmpl two(): succ(succ(1)) nat {
                base: true ==> 1 nat ~[one()];
                base ==> 1 nat ~[one()] ==> succ(1) nat ~[succnat(1)] ==> succ(succ(1)) nat ~[succnat(succ(1))];
            }
        ");
        assert!(result.is_ok(), "{:?}", result);
    }
    #[test]
    fn verify_unproved_and_axioms() {
        let (transcript, result) = run("tmpl open(x): x nat;");
        assert!(result.is_ok());
        assert!(transcript.contains("tmpl open(x any): nat(x)\nunproved"));
        assert!(transcript.contains("@tmpl succnat(x any): nat(x) ==> nat(succ(x))\naxiom"));
    }
    #[test]
    fn verify_keeps_going() {
        let (transcript, result) = run("
            tmpl bad(x): x nat ==> succ(x) nat { x nat ==> succ(x) nat; }
            tmpl good(x): x nat ==> succ(x) nat { x nat ==> succ(x) nat ~[succnat(x)]; }
        ");
        match result {
            Err(VerifyError::Rejected(failures)) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].declaration, "bad");
            }
            other => panic!("expected one rejection, got {:?}", other),
        }
        assert!(transcript.ends_with("qed\n"));
    }
    #[test]
    fn verify_registration_errors() {
        let message = rejection("
            func nat(y) bool;
            tmpl t(x even): x nat;
            tmpl u(x): succ(x);
        ");
        assert!(message.contains("nat: `nat` is already declared"), "{}", message);
        assert!(message.contains("undefined type `even`"), "{}", message);
        assert!(message.contains("u: "), "{}", message);
    }
    #[test]
    fn verify_syntax_error() {
        let (transcript, result) = verify("tmpl t(x): x nat");
        assert!(transcript.is_empty());
        assert!(matches!(result, Err(VerifyError::Syntax(_))));
    }
    #[test]
    fn verify_echo_obligations() {
        let config = Config { echo_obligations: true, ..Config::default() };
        let source = format!("{}{}", PEANO, "tmpl t(p bool): p ==> p { p ==> p; }");
        let (transcript, result) = verify_with(&source, &config);
        assert!(result.is_ok());
        assert!(transcript.contains("\t\tp ==> p\n"));
    }
    #[test]
    fn verify_without_constants() {
        let config = Config { constants: vec![], ..Config::default() };
        let (_, result) = verify_with(PEANO, &config);
        let message = result.expect_err("1 is unbound").to_string();
        assert!(message.contains("undefined name `1`"), "{}", message);
    }
}
