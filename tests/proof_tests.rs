#[cfg(test)]

use chain_prover::{verify, verify_with, Config, VerifyError};

const PEANO: &str = "
    func nat(x) bool;
    func succ(x nat) nat;
    axiom one: 1 nat;
    @tmpl succnat(x): x nat ==> succ(x) nat;
";

fn with_peano(source: &str) -> (String, Result<(), VerifyError>) {
    verify(&format!("{}{}", PEANO, source))
}

fn rejection(source: &str) -> String {
    match with_peano(source) {
        (_, Err(err)) => err.to_string(),
        (transcript, Ok(())) => panic!("expected a rejection, got:\n{}", transcript),
    }
}

#[test]
fn simple_proof_0() {
    let (transcript, result) = with_peano("
        tmpl thm(x): x nat ==> succ(x) nat {
            x nat ==> succ(x) nat ~[succnat(x)];
        }
    ");
    result.expect("should verify");
    assert!(transcript.contains("tmpl thm(x any): nat(x) ==> nat(succ(x))\nproof:"));
    assert!(transcript.ends_with("qed\n"));
}
#[test]
fn simple_proof_1() {
    // the consequent is negated, so the link itself is unsound
    let message = rejection("
        tmpl thm(x): x nat ==> succ(x) nat {
            x nat ==> !succ(x) nat ~[succnat(x)];
        }
    ");
    assert!(message.contains("contradiction") || message.contains("qed burden failure"), "{}", message);
}
#[test]
fn simple_proof_2() {
    // without the justification the link only holds in some states
    let message = rejection("
        tmpl thm(x): x nat ==> succ(x) nat {
            x nat ==> succ(x) nat;
        }
    ");
    assert!(message.contains("contradiction in `nat(x) ==> nat(succ(x))`"), "{}", message);
    assert!(message.contains("yields"), "{}", message);
}
#[test]
fn simple_proof_3() {
    // a sound chain that proves something else
    let message = rejection("
        tmpl thm(x): succ(x) nat {
            x nat ==> succ(x) nat ~[succnat(x)];
        }
    ");
    assert!(message.contains("qed burden failure"), "{}", message);
}
#[test]
fn chain_operator_conflict() {
    let message = rejection("
        tmpl mixed(a bool, b bool): a ==> a || b {
            a ==> a || b <== a;
        }
    ");
    assert!(message.contains("no common operator"), "{}", message);
}
#[test]
fn backwards_chain() {
    let (_, result) = with_peano("
        tmpl back(x): succ(x) nat <== x nat {
            succ(x) nat <== x nat ~[succnat(x)] <== x nat && x nat;
        }
    ");
    result.expect("should verify");
}
#[test]
fn preamble_failure() {
    let message = rejection("
        tmpl thm(x): x nat ==> x nat {
            bad: x nat ==> succ(x) nat;
            x nat ==> x nat;
        }
    ");
    assert!(message.contains("in `bad`: contradiction"), "{}", message);
}
#[test]
fn unknown_justification() {
    let message = rejection("
        tmpl thm(x): x nat ==> succ(x) nat {
            x nat ==> succ(x) nat ~[nosuch(x)];
        }
    ");
    assert!(message.contains("undefined name `nosuch`"), "{}", message);
}
#[test]
fn justification_avoids_capture() {
    // instantiating `refl` with j := k must not capture k under the inner lambda
    let (_, result) = verify("
        func rel(a, b) bool;
        @tmpl refl(j): psi(k) { (k, j) rel };
        tmpl uses(): psi(k) { true ==> psi(k0) { (k0, k) rel } } {
            psi(k) { true ==> psi(k0) { (k0, k) rel } ~[refl(k)] };
        }
    ");
    result.expect("should verify");
}
#[test]
fn justification_not_captured_by_parameters() {
    // `anypred` names its parameter `nat`, so `zero()` must not read as `nat(0)` of that parameter
    match verify("
        func nat(x) bool;
        axiom zero: 0 nat;
        tmpl anypred(nat): nat(0) { true ==> nat(0) ~[zero()]; }
        tmpl absurd(): false { true ==> false ~[anypred(psi(x) { false })]; }
    ") {
        (transcript, Err(VerifyError::Rejected(failures))) => {
            let failure = failures.iter().find(|f| f.declaration == "anypred").expect("anypred is rejected");
            let message = failure.to_string();
            assert!(message.contains("could not instantiate justification `zero`"), "{}", message);
            assert!(message.contains("`nat` used by `zero` is shadowed by a local binding"), "{}", message);
            assert!(transcript.contains("tmpl anypred(nat any): nat(0)\nproof:"), "{}", transcript);
        }
        (transcript, other) => panic!("expected a rejection, got {:?}\n{}", other, transcript),
    }
}
#[test]
fn justification_lambda_arity() {
    let source = "
        @tmpl ax(y): y(0) ==> y(0);
        tmpl user(y): y(0) ==> y(0) { y(0) ==> y(0) ~[ax(psi(a, b) { true })]; }
    ";
    match verify(source) {
        (_, Err(VerifyError::Rejected(failures))) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].declaration, "user");
            let message = failures[0].to_string();
            assert!(message.contains("`y` is called with 1 argument(s)"), "{}", message);
        }
        (transcript, other) => panic!("expected a rejection, got {:?}\n{}", other, transcript),
    }
    let (_, result) = verify(&source.replace("psi(a, b)", "psi(a)"));
    result.expect("a one place predicate fits");
}
#[test]
fn failures_are_collected() {
    match with_peano("
        tmpl a(x): x nat ==> succ(x) nat { x nat ==> succ(x) nat; }
        tmpl b(x): x nat ==> succ(x) nat { x nat ==> succ(x) nat ~[succnat(x)]; }
        tmpl c(x): x nat ==> succ(x) nat { x nat ==> x nat; }
    ") {
        (transcript, Err(VerifyError::Rejected(failures))) => {
            let names = failures.iter().map(|f| f.declaration.as_str()).collect::<Vec<_>>();
            assert_eq!(names, vec!["a", "c"]);
            assert_eq!(transcript.matches("qed\n").count(), 1);
            assert_eq!(transcript.matches("rejected: ").count(), 2);
        }
        (_, other) => panic!("expected two rejections, got {:?}", other),
    }
}
#[test]
fn syntax_error() {
    match verify("tmpl t(x): x nat ==> ;") {
        (_, Err(VerifyError::Syntax(err))) => assert!(err.to_string().contains("1:")),
        (_, other) => panic!("expected a syntax error, got {:?}", other),
    }
}
#[test]
fn configured_constants() {
    let config = Config { constants: vec!["zero".to_string()], ..Config::default() };
    let (_, result) = verify_with("
        func nat(x) bool;
        axiom z: zero nat;
    ", &config);
    result.expect("zero is a constant");
    let (_, result) = verify_with("
        func nat(x) bool;
        axiom z: 0 nat;
    ", &config);
    assert!(result.is_err());
}
#[test]
fn peano_demo() {
    let (transcript, result) = verify(include_str!("../demos/peano.i2"));
    result.expect("the demo should verify");
    assert_eq!(transcript.matches("\nqed\n").count(), 7);
    assert_eq!(transcript.matches("\naxiom\n").count(), 4);
    assert!(transcript.ends_with("tmpl halves(x even): nat(half(x))\nunproved\n"));
}
