//! Checking one proof block of a template.
//!
//! A proof block is a preamble of labelled facts followed by a final proof. Each
//! proof is checked link by link, reduced to its burden, and the final burden must
//! entail the template's body. Labels of checked facts are bound as local proofs
//! for everything after them.

use std::fmt;
use std::rc::Rc;

use crate::ast::{ChainError, Expr, Proof, ProofChain};
use crate::prover::Verifier;
use crate::symbol::{analyse, AnalysisError, LocalProof, ScopeError, Symbol, Table, Template};
use crate::truth::{self, decide, Conflict, DecideError};

#[derive(Debug, Clone, PartialEq)]
pub enum ProofError {
    /// A declaration or proof parameter list that does not analyse
    Invalid(AnalysisError),
    Chain(ChainError),
    Analysis { step: String, cause: AnalysisError },
    /// A link decided false, or true only in some cases
    Contradiction { link: String, conflict: Option<Conflict> },
    Decision { link: String, cause: DecideError },
    /// The burden does not decide
    BurdenFailure(DecideError),
    /// The burden decides, but not in favour of the template
    Entailment { burden: String, assertion: String },
    Preamble { label: Option<String>, cause: Box<ProofError> },
}

impl fmt::Display for ProofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofError::Invalid(err) => write!(f, "{}", err),
            ProofError::Chain(err) => write!(f, "{}", err),
            ProofError::Analysis { step, cause } => write!(f, "analysis error in `{}`: {}", step, cause),
            ProofError::Contradiction { link, conflict: None } => write!(f, "contradiction in `{}`", link),
            ProofError::Contradiction { link, conflict: Some(conflict) } => {
                write!(f, "contradiction in `{}`: {}", link, conflict)
            }
            ProofError::Decision { link, cause } => write!(f, "decision error in `{}`: {}", link, cause),
            ProofError::BurdenFailure(err) => write!(f, "qed burden failure: {}", err),
            ProofError::Entailment { burden, assertion } => {
                write!(f, "contradiction: `{}` does not establish `{}`", burden, assertion)
            }
            ProofError::Preamble { label: Some(label), cause } => write!(f, "in `{}`: {}", label, cause),
            ProofError::Preamble { label: None, cause } => write!(f, "in preamble: {}", cause),
        }
    }
}

impl std::error::Error for ProofError {}

impl From<ChainError> for ProofError {
    fn from(err: ChainError) -> Self {
        ProofError::Chain(err)
    }
}

impl From<ScopeError> for ProofError {
    fn from(err: ScopeError) -> Self {
        ProofError::Invalid(err.into())
    }
}

fn analyse_step(expr: &Expr, table: &Table) -> Result<truth::Proposition, ProofError> {
    analyse(expr, table)
        .map(|analysed| analysed.prop)
        .map_err(|cause| ProofError::Analysis { step: expr.to_string(), cause })
}

impl Verifier {
    /// Check one proof block against the template it proves
    pub fn check_proof_chain(&mut self, template: &Rc<Template>, chain: &ProofChain) -> Result<(), ProofError> {
        let mut outer = template.table()?.nest(self.table());
        for proof in chain.preamble.iter() {
            self.check_fact(proof, &outer).map_err(|cause| ProofError::Preamble {
                label: proof.label().map(|l| l.to_string()),
                cause: Box::new(cause),
            })?;
            if let Some(label) = proof.label() {
                debug!("{} established `{}`", template.name, label);
                outer.bind_local(label, Symbol::LocalProof(LocalProof::new()));
            }
        }
        self.check_links(&chain.last, &outer)?;
        let burden = chain.last.burden()?;
        let burden_prop = analyse_step(&burden, &outer)?;
        let assertion = analyse_step(&template.body, &outer)?;
        let qed = truth::implies(burden_prop, assertion);
        debug!("{} entailment: {}", template.name, qed);
        match decide(&qed) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ProofError::Entailment {
                burden: burden.to_string(),
                assertion: template.body.to_string(),
            }),
            Err(err) => Err(ProofError::BurdenFailure(err)),
        }
    }

    /// A preamble entry: sound links and a burden that makes sense where it is used
    fn check_fact(&mut self, proof: &Proof, outer: &Table) -> Result<(), ProofError> {
        self.check_links(proof, outer)?;
        let burden = proof.burden()?;
        analyse_step(&burden, outer)?;
        Ok(())
    }

    /// Every link of the proof must decide true
    fn check_links(&mut self, proof: &Proof, outer: &Table) -> Result<(), ProofError> {
        let params = outer.resolve_params(proof.params())?;
        let scope = Table::with_params(&params)?.nest(outer);
        for link in proof.chain().link_exprs() {
            self.transcript.line(format!("\t{}", link));
            let prop = analyse_step(&link, &scope)?;
            if self.config.echo_obligations {
                self.transcript.line(format!("\t\t{}", prop));
            }
            match decide(&prop) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(ProofError::Contradiction { link: link.to_string(), conflict: None });
                }
                Err(DecideError::Conflict(conflict)) => {
                    return Err(ProofError::Contradiction { link: link.to_string(), conflict: Some(conflict) });
                }
                Err(cause) => return Err(ProofError::Decision { link: link.to_string(), cause }),
            }
        }
        Ok(())
    }
}
