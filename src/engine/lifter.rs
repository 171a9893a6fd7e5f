//! Lifter computation
//!
//! With the true primaries of a model held as assumptions, finds
//! every false primary that some satisfying extension can turn true. Each
//! round asks for at least one remaining candidate to be true and collects
//! all candidates the answer makes true.

use std::collections::BTreeSet;

use log::{debug, trace, warn};

use super::{Session, SolverError};

/// Computes the lifters of a model
pub struct LifterComputer;

impl LifterComputer {
    /// Returns the lifters of the model whose true primaries are `preserved`, ascending
    ///
    /// Retracts every cone clause of the session first; restoring them is up
    /// to the caller ([`Session::ensure_asserted`]).
    pub fn compute(session: &mut Session, preserved: &[u32]) -> Result<Vec<u32>, SolverError> {
        session.clear_all();

        let mut units: Vec<i32> = preserved.iter().map(|&v| v as i32).collect();
        let mut candidates: BTreeSet<u32> = (1..=session.num_primary_variables()).collect();
        for var in preserved {
            candidates.remove(var);
        }
        debug!("lifting: {} preserved, {} candidates", units.len(), candidates.len());

        let mut lifters = Vec::new();
        while !candidates.is_empty() {
            let mut handle = None;
            if candidates.len() > 1 {
                let clause: Vec<i32> = candidates.iter().map(|&v| v as i32).collect();
                match session.add_constraint(&clause) {
                    Ok(h) => handle = Some(h),
                    Err(e) => {
                        warn!("candidate clause not asserted: {}", e);
                        break;
                    }
                }
            } else if let Some(&only) = candidates.first() {
                units.push(only as i32);
            }

            let sat = session.solve(&units);
            if let Some(h) = handle {
                session.remove_constraint(h);
            }
            if !sat? {
                break;
            }

            let found: Vec<u32> = candidates.iter().copied().filter(|&v| session.value_of(v)).collect();
            trace!("lifting round found {:?}", found);
            for var in &found {
                candidates.remove(var);
            }
            lifters.extend(found);
        }

        lifters.sort_unstable();
        Ok(lifters)
    }
}
