//! Local minimization of a model
//!
//! Starting from the session's current model, each round asks the oracle
//! for a model whose true primaries are a proper subset of the current
//! ones: a blocking clause forces one true primary to turn false, and every
//! primary already false is assumed false for the rest of the pass. When
//! the oracle says no, the current model is subset-minimal.

use log::{trace, warn};

use super::{Session, SolverError};

/// Shrinks the session's current model to a minimal one
pub struct Minimizer;

impl Minimizer {
    /// Minimizes the current (satisfying) model in place
    ///
    /// `assumptions` are kept throughout. Blocking clauses are retracted
    /// before returning on every path. Returns the number of rounds that
    /// found a smaller model.
    pub fn minimize(session: &mut Session, assumptions: &[i32]) -> Result<usize, SolverError> {
        let primary = session.num_primary_variables();
        let mut units = assumptions.to_vec();
        let mut fixed = vec![false; primary as usize + 1];
        let mut blocking = Vec::new();
        let mut rounds = 0;

        let result = loop {
            let mut clause = Vec::new();
            for var in 1..=primary {
                if session.value_of(var) {
                    clause.push(-(var as i32));
                } else if !fixed[var as usize] {
                    fixed[var as usize] = true;
                    units.push(-(var as i32));
                }
            }
            if clause.is_empty() {
                break Ok(rounds);
            }
            trace!("minimization round {}: {} true primaries", rounds, clause.len());

            match session.add_constraint(&clause) {
                Ok(handle) => blocking.push(handle),
                Err(e) => {
                    warn!("blocking clause not asserted: {}", e);
                    break Ok(rounds);
                }
            }
            match session.solve(&units) {
                Ok(true) => rounds += 1,
                Ok(false) => break Ok(rounds),
                Err(e) => break Err(e),
            }
        };

        for handle in blocking {
            session.remove_constraint(handle);
        }
        result
    }
}
