//! Tests for minimal solution enumeration (solve_all)

use kodkod_min::ast::{Expression, Formula, Relation};
use kodkod_min::engine::Evaluator;
use kodkod_min::instance::{Bounds, Instance, TupleSet, Universe};
use kodkod_min::solution::Solution;
use kodkod_min::solver::{MinSolver, Options};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two unary relations over {t1, t2}, both with empty lower bounds
fn two_relations() -> (Bounds, Relation, Relation) {
    let universe = Universe::new(&["t1", "t2"]).unwrap();
    let mut bounds = Bounds::new(universe);
    let a = Relation::unary("A");
    let b = Relation::unary("B");
    let factory = bounds.universe().factory();
    bounds.bound(&a, factory.none(1), factory.all(1)).unwrap();
    bounds.bound(&b, factory.none(1), factory.all(1)).unwrap();
    (bounds, a, b)
}

fn enumerate(formula: &Formula, bounds: &Bounds) -> Vec<Solution> {
    let solver = MinSolver::new(Options::default());
    let mut solutions = Vec::new();
    for solution in solver.solve_all(formula, bounds).unwrap() {
        solutions.push(solution.unwrap());
        assert!(solutions.len() <= 100, "enumeration does not terminate");
    }
    solutions
}

/// The tuples of every bound relation, in bounds order
fn key(instance: &Instance, bounds: &Bounds) -> Vec<TupleSet> {
    bounds
        .relations()
        .map(|r| instance.tuples(r).cloned().expect("every bound relation is padded"))
        .collect()
}

/// No single tuple outside the lower bounds can be dropped
fn assert_minimal(formula: &Formula, bounds: &Bounds, instance: &Instance) {
    assert!(Evaluator::new(instance).evaluate(formula).unwrap(), "{} is not a model", instance);
    for relation in bounds.relations() {
        let lower = bounds.lower_bound(relation).unwrap();
        let tuples = instance.tuples(relation).unwrap();
        for tuple in tuples.iter().filter(|t| !lower.contains(t)) {
            let mut smaller = tuples.clone();
            smaller.remove(tuple);
            let mut candidate = instance.clone();
            candidate.add(relation.clone(), smaller).unwrap();
            assert!(
                !Evaluator::new(&candidate).evaluate(formula).unwrap(),
                "{} is not minimal: {} can be dropped from {}",
                instance,
                tuple,
                relation
            );
        }
    }
}

#[test]
fn test_all_four_combinations() {
    init();
    let (bounds, a, b) = two_relations();
    let formula = Expression::from(&a).some().and(Expression::from(&b).some());
    let solutions = enumerate(&formula, &bounds);

    assert_eq!(solutions.len(), 5, "expected 4 SAT + 1 UNSAT");
    assert!(solutions[4].is_unsat());

    let mut seen = Vec::new();
    for solution in &solutions[..4] {
        assert!(solution.is_sat());
        let instance = solution.instance().unwrap();
        assert_eq!(instance.tuples(&a).unwrap().size(), 1);
        assert_eq!(instance.tuples(&b).unwrap().size(), 1);
        assert_minimal(&formula, &bounds, instance);

        let key = key(instance, &bounds);
        assert!(!seen.contains(&key), "{} delivered twice", instance);
        seen.push(key);
    }
}

#[test]
fn test_cone_excludes_supersets() {
    let (bounds, a, _) = two_relations();
    let formula = Expression::from(&a).some();
    let solutions = enumerate(&formula, &bounds);

    assert_eq!(solutions.len(), 3, "{{t1}}, {{t2}}, then UNSAT");
    let first = solutions[0].instance().unwrap().tuples(&a).unwrap().clone();
    for later in &solutions[1..] {
        if let Some(instance) = later.instance() {
            assert!(!first.is_subset(instance.tuples(&a).unwrap()));
        }
    }
}

#[test]
fn test_implication_has_single_minimal_model() {
    let universe = Universe::new(&["t1", "t2"]).unwrap();
    let mut bounds = Bounds::new(universe);
    let factory = bounds.universe().factory();
    let a = Relation::unary("A");
    let t1 = Relation::unary("T1");
    let t2 = Relation::unary("T2");
    bounds.bound(&a, factory.none(1), factory.all(1)).unwrap();
    bounds.bound_exactly(&t1, factory.tuple_set(&[&["t1"]]).unwrap()).unwrap();
    bounds.bound_exactly(&t2, factory.tuple_set(&[&["t2"]]).unwrap()).unwrap();

    // some A and (t1 in A => t2 in A): {t2} is the only minimal model
    let formula = Expression::from(&a).some().and(
        Expression::from(&t1)
            .in_set(Expression::from(&a))
            .implies(Expression::from(&t2).in_set(Expression::from(&a))),
    );
    let solutions = enumerate(&formula, &bounds);

    assert_eq!(solutions.len(), 2);
    let instance = solutions[0].instance().unwrap();
    assert_eq!(instance.tuples(&a).unwrap(), &factory.tuple_set(&[&["t2"]]).unwrap());
    assert_minimal(&formula, &bounds, instance);
    assert!(solutions[1].is_unsat());
}

#[test]
fn test_exhaustion_termination() {
    let universe = Universe::new(&["a", "b", "c"]).unwrap();
    let mut bounds = Bounds::new(universe);
    let r = Relation::binary("r");
    let factory = bounds.universe().factory();
    bounds.bound(&r, factory.none(2), factory.all(2)).unwrap();

    let solver = MinSolver::new(Options::default());
    let mut solutions = solver.solve_all(&Expression::from(&r).some(), &bounds).unwrap();
    let mut sat = 0;
    while solutions.has_next() {
        let solution = solutions.next_solution().unwrap();
        if solution.is_sat() {
            assert_eq!(solution.instance().unwrap().tuples(&r).unwrap().size(), 1);
            sat += 1;
        } else {
            assert!(!solutions.has_next());
        }
    }
    assert_eq!(sat, 9);
    assert!(solutions.next_solution().is_err());
    assert!(solutions.next().is_none());
}

#[test]
fn test_empty_minimal_model() {
    let (bounds, a, _) = two_relations();
    let solutions = enumerate(&Expression::from(&a).no(), &bounds);

    assert_eq!(solutions.len(), 2);
    let instance = solutions[0].instance().unwrap();
    assert!(instance.tuples(&a).unwrap().is_empty());
    assert!(solutions[1].is_unsat());
}

#[test]
fn test_padding_keeps_lower_bounds() {
    let universe = Universe::new(&["t1", "t2", "t3"]).unwrap();
    let mut bounds = Bounds::new(universe);
    let factory = bounds.universe().factory();
    let a = Relation::unary("A");
    let b = Relation::unary("B");
    let lower = factory.tuple_set(&[&["t1"]]).unwrap();
    bounds.bound(&a, lower.clone(), factory.all(1)).unwrap();
    bounds.bound(&b, factory.none(1), factory.all(1)).unwrap();

    let formula = Expression::from(&b).some().and(Expression::from(&b).in_set(Expression::from(&a)));
    let solutions = enumerate(&formula, &bounds);

    let sat: Vec<_> = solutions.iter().filter(|s| s.is_sat()).collect();
    assert!(!sat.is_empty());
    for solution in sat {
        let instance = solution.instance().unwrap();
        assert!(lower.is_subset(instance.tuples(&a).unwrap()));
        assert_minimal(&formula, &bounds, instance);
    }
    // {B = t1} needs nothing beyond the lower bound; {B = t2} and {B = t3} each add one tuple to A
    assert_eq!(solutions.len(), 4);
}

#[test]
fn test_quantified_formula() {
    let universe = Universe::new(&["n0", "n1", "n2"]).unwrap();
    let mut bounds = Bounds::new(universe);
    let factory = bounds.universe().factory();
    let node = Relation::unary("Node");
    let next = Relation::binary("next");
    bounds.bound_exactly(&node, factory.all(1)).unwrap();
    bounds.bound(&next, factory.none(2), factory.all(2)).unwrap();

    // every node has a successor
    let n = kodkod_min::ast::Variable::unary("n");
    let formula = Formula::forall(
        kodkod_min::ast::Decls::from(kodkod_min::ast::Decl::one_of(n.clone(), Expression::from(&node))),
        Expression::from(&n).join(Expression::from(&next)).some(),
    );

    let solver = MinSolver::new(Options::default());
    let first = solver.solve_all(&formula, &bounds).unwrap().next().unwrap().unwrap();
    let instance = first.instance().unwrap();
    assert_eq!(instance.tuples(&next).unwrap().size(), 3);
    assert_minimal(&formula, &bounds, instance);
}

#[test]
fn test_statistics_stay_fixed_across_rounds() {
    init();
    let (bounds, a, b) = two_relations();
    let formula = Expression::from(&a).some().or(Expression::from(&b).some());
    let solutions = enumerate(&formula, &bounds);
    assert_eq!(solutions.len(), 5);

    let first = solutions[0].statistics();
    assert_eq!(first.primary_variables(), 4);
    for solution in &solutions[1..] {
        assert_eq!(solution.statistics().num_variables(), first.num_variables());
        assert_eq!(solution.statistics().num_clauses(), first.num_clauses());
    }
}
