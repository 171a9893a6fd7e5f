//! Lifters and lifted enumeration

use kodkod_min::ast::{Expression, Formula, Relation};
use kodkod_min::error::KodkodError;
use kodkod_min::instance::{Bounds, Instance, Universe};
use kodkod_min::solver::{MinSolver, Options};

fn bounds(upper: &[&[&str]]) -> (Bounds, Relation) {
    let universe = Universe::new(&["t1", "t2", "t3"]).unwrap();
    let mut bounds = Bounds::new(universe);
    let a = Relation::unary("A");
    let factory = bounds.universe().factory();
    bounds.bound(&a, factory.none(1), factory.tuple_set(upper).unwrap()).unwrap();
    (bounds, a)
}

fn lifters_of_first(formula: &Formula, bounds: &Bounds) -> (Instance, Instance) {
    let solver = MinSolver::new(Options::default());
    let mut solutions = solver.solve_all(formula, bounds).unwrap();
    let first = solutions.next_solution().unwrap();
    let lifters = solver.lifters(&mut solutions).unwrap();
    (first.instance().unwrap().clone(), lifters)
}

#[test]
fn test_other_tuple_lifts_some() {
    let (bounds, a) = bounds(&[&["t1"], &["t2"]]);
    let (first, lifters) = lifters_of_first(&Expression::from(&a).some(), &bounds);

    let chosen = first.tuples(&a).unwrap();
    assert_eq!(chosen.size(), 1);
    let lifted = lifters.tuples(&a).unwrap();
    assert_eq!(lifted.size(), 1);
    assert!(!chosen.is_subset(lifted));
}

#[test]
fn test_nothing_lifts_one() {
    let (bounds, a) = bounds(&[&["t1"], &["t2"]]);
    let (_, lifters) = lifters_of_first(&Expression::from(&a).one(), &bounds);
    assert!(lifters.tuples(&a).map_or(true, |t| t.is_empty()));
}

#[test]
fn test_enumeration_resumes_after_lifting() {
    let (bounds, a) = bounds(&[&["t1"], &["t2"], &["t3"]]);
    let solver = MinSolver::default();
    let mut solutions = solver.solve_all(&Expression::from(&a).some(), &bounds).unwrap();

    let first = solutions.next_solution().unwrap();
    assert_eq!(solver.lifters(&mut solutions).unwrap().tuples(&a).unwrap().size(), 2);

    let mut seen = vec![first.instance().unwrap().tuples(&a).unwrap().clone()];
    for solution in solutions {
        let solution = solution.unwrap();
        if let Some(instance) = solution.instance() {
            let tuples = instance.tuples(&a).unwrap().clone();
            assert_eq!(tuples.size(), 1);
            assert!(!seen.contains(&tuples), "cone clauses are asserted again after lifting");
            seen.push(tuples);
        }
    }
    assert_eq!(seen.len(), 3);
}

#[test]
fn test_lift_forces_extra_tuples() {
    let (bounds, a) = bounds(&[&["t1"], &["t2"], &["t3"]]);
    let formula = Expression::from(&a).some();
    let solver = MinSolver::default();
    let mut solutions = solver.solve_all(&formula, &bounds).unwrap();
    let first = solutions.next_solution().unwrap();
    let chosen = first.instance().unwrap().tuples(&a).unwrap().clone();

    let factory = bounds.universe().factory();
    let extra_atom = ["t1", "t2", "t3"]
        .into_iter()
        .find(|atom| !chosen.contains(&factory.tuple(&[*atom]).unwrap()))
        .unwrap();
    let mut extra = Instance::new(bounds.universe().clone());
    extra.add(a.clone(), factory.tuple_set(&[&[extra_atom]]).unwrap()).unwrap();

    let translation = solutions.translation().unwrap();
    let lifted: Vec<_> = solver
        .lift(&formula, &bounds, translation, &first, &extra)
        .unwrap()
        .map(Result::unwrap)
        .collect();

    assert_eq!(lifted.len(), 2);
    let tuples = lifted[0].instance().unwrap().tuples(&a).unwrap();
    assert_eq!(tuples.size(), 2);
    assert!(chosen.is_subset(tuples));
    assert!(lifted[1].is_unsat());
}

#[test]
fn test_lift_rejects_tuples_outside_upper_bound() {
    let (bounds, a) = bounds(&[&["t1"], &["t2"]]);
    let formula = Expression::from(&a).some();
    let solver = MinSolver::default();
    let mut solutions = solver.solve_all(&formula, &bounds).unwrap();
    let first = solutions.next_solution().unwrap();

    let factory = bounds.universe().factory();
    let mut extra = Instance::new(bounds.universe().clone());
    extra.add(a.clone(), factory.tuple_set(&[&["t3"]]).unwrap()).unwrap();

    let result = solver.lift(&formula, &bounds, solutions.translation().unwrap(), &first, &extra);
    assert!(matches!(result, Err(KodkodError::InvalidArgument(_))));
}

#[test]
fn test_lifters_before_first_solution() {
    let (bounds, a) = bounds(&[&["t1"], &["t2"]]);
    let solver = MinSolver::default();
    let mut solutions = solver.solve_all(&Expression::from(&a).some(), &bounds).unwrap();
    assert!(matches!(solver.lifters(&mut solutions), Err(KodkodError::IllegalState(_))));
}
