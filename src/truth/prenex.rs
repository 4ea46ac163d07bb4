use crate::truth::{fresh_variable, implies, lambda, PropKind, Proposition, Variable};

impl Proposition {
    /// Take one step towards prenex normal form, or `None` if `self` is already prenex.
    ///
    /// For an implication, implications nested in an operand are reduced first;
    /// otherwise a quantifier is pulled out of an operand using
    ///   `(λx)C ==> D`  to  `(λ'x')(C[x:=x'] ==> D)`, where `λ'` is the dual quantifier
    ///   `D ==> (λx)C`  to  `(λx')(D ==> C[x:=x'])`
    /// and `x'` is only fresh when `x` occurs free in `D`.
    pub fn innex_reduce(&self) -> Option<Proposition> {
        match self.kind() {
            PropKind::Implication(a, c) => reduce_implication(a, c),
            PropKind::Lambda(q, v, scope) => scope
                .innex_reduce()
                .map(|reduced| lambda(*q, v.clone(), reduced)),
            PropKind::Constant(_) | PropKind::Variable(_) | PropKind::Function(_, _) => None,
        }
    }
    /// Reduce to a fixed point
    pub fn prenex(&self) -> Proposition {
        let mut current = self.clone();
        while let Some(reduced) = current.innex_reduce() {
            trace!("prenex step: {} to {}", current, reduced);
            current = reduced;
        }
        current
    }
    pub fn is_prenex(&self) -> bool {
        self.innex_reduce().is_none()
    }
}

fn nested_reduce(p: &Proposition) -> Option<Proposition> {
    match p.kind() {
        PropKind::Implication(a, c) => reduce_implication(a, c),
        _ => None,
    }
}

fn reduce_implication(a: &Proposition, c: &Proposition) -> Option<Proposition> {
    if let Some(reduced) = nested_reduce(a) {
        return Some(implies(reduced, c.clone()));
    }
    if let PropKind::Lambda(q, v, scope) = a.kind() {
        let b = reduction_variable(v, scope, c);
        return Some(lambda(q.flip(), b.clone(), implies(scope.replace(v, &b), c.clone())));
    }
    if let Some(reduced) = nested_reduce(c) {
        return Some(implies(a.clone(), reduced));
    }
    if let PropKind::Lambda(q, v, scope) = c.kind() {
        let b = reduction_variable(v, scope, a);
        return Some(lambda(*q, b.clone(), implies(a.clone(), scope.replace(v, &b))));
    }
    None
}

/// The variable a pulled quantifier binds: `v` itself unless that would capture
/// a free `v` of the other operand.
fn reduction_variable(v: &Variable, scope: &Proposition, other: &Proposition) -> Variable {
    let other_free = other.free();
    if !other_free.contains(v) {
        return v.clone();
    }
    let scope_free = scope.free();
    fresh_variable(v, |c| scope_free.contains(c) || other_free.contains(c))
}

#[cfg(test)]
mod tests {
    use crate::truth::*;

    fn var(name: &str) -> Variable {
        Variable::new(name)
    }

    /// true when no implication anywhere has a quantifier as an operand
    fn lambdas_outermost(p: &Proposition) -> bool {
        match p.kind() {
            PropKind::Implication(a, c) => {
                let pulled = |x: &Proposition| matches!(x.kind(), PropKind::Lambda(_, _, _));
                !pulled(a) && !pulled(c) && lambdas_outermost(a) && lambdas_outermost(c)
            }
            PropKind::Lambda(_, _, scope) => lambdas_outermost(scope),
            _ => true,
        }
    }

    #[test]
    fn pull_from_antecedent_flips() {
        let p = implies(universal("x", function("F", vec![var("x")])), variable("p"));
        let expected = existential("x", implies(function("F", vec![var("x")]), variable("p")));
        assert_eq!(p.prenex(), expected);
    }
    #[test]
    fn pull_from_consequent_keeps() {
        let p = implies(variable("p"), existential("x", function("F", vec![var("x")])));
        let expected = existential("x", implies(variable("p"), function("F", vec![var("x")])));
        assert_eq!(p.prenex(), expected);
    }
    #[test]
    fn pull_renames_on_clash() {
        // (∀x)F(x) ==> F(x)   the free x on the right must stay free
        let p = implies(
            universal("x", function("F", vec![var("x")])),
            function("F", vec![var("x")]),
        );
        let expected = existential("x0", implies(
            function("F", vec![var("x0")]),
            function("F", vec![var("x")]),
        ));
        assert_eq!(p.prenex(), expected);
    }
    #[test]
    fn prenex_is_idempotent() {
        let p = universal("z", implies(
            not(not(universal("y", function("F", vec![var("y"), var("z")])))),
            not(not(existential("x", function("G", vec![var("x"), var("y"), var("z")])))),
        ));
        let once = p.prenex();
        assert!(once.is_prenex());
        assert_eq!(once.prenex(), once);
        assert!(lambdas_outermost(&once));
    }
    #[test]
    fn prenex_of_conjunction() {
        // p && (∀x)F(x)
        let p = and(variable("p"), universal("x", function("F", vec![var("x")])));
        let reduced = p.prenex();
        assert!(lambdas_outermost(&reduced));
        assert_eq!(reduced.free(), p.free());
    }
    #[test]
    fn already_prenex() {
        let p = universal("x", implies(variable("p"), function("F", vec![var("x")])));
        assert!(p.is_prenex());
        assert_eq!(p.prenex(), p);
        let q = eqv(variable("p"), variable("q"));
        assert_eq!(q.prenex(), q);
    }
}
