/*
 * Kodkod -- Copyright (c) 2005-present, Emina Torlak
 * Rust port -- Copyright (c) 2024
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
 * THE SOFTWARE.
 */

//! Translation logs and proofs of unsatisfiability
//!
//! A proof names the top-level conjuncts of a formula that are jointly
//! unsatisfiable under its bounds. Trivial proofs come from conjuncts that
//! folded to FALSE during translation; core proofs come from the failed
//! assumptions of an unsatisfiable solver call.

use crate::ast::Formula;
use crate::bool::BooleanConstant;
use crate::engine::SATProver;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Record of a single translation event
///
/// Tracks the mapping from a top-level conjunct to its circuit literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRecord {
    /// The conjunct
    pub formula: Formula,
    /// The literal representing its meaning (`±i32::MAX` for constants)
    pub literal: i32,
}

/// Log of the top-level conjuncts of a translated formula
#[derive(Debug, Clone, Default)]
pub struct TranslationLog {
    records: Vec<TranslationRecord>,
}

impl TranslationLog {
    /// Creates a log from (conjunct, literal) pairs
    pub fn new(records: Vec<(Formula, i32)>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|(formula, literal)| TranslationRecord { formula, literal })
                .collect(),
        }
    }

    /// Returns the formula roots (top-level conjuncts)
    pub fn roots(&self) -> impl Iterator<Item = &Formula> {
        self.records.iter().map(|r| &r.formula)
    }

    /// Returns an iterator over translation records
    pub fn records(&self) -> impl Iterator<Item = &TranslationRecord> {
        self.records.iter()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Proof of unsatisfiability
///
/// Contains the subset of top-level conjuncts that form an unsatisfiable core.
#[derive(Debug, Clone)]
pub struct Proof {
    log: Rc<TranslationLog>,
    core: FxHashMap<Formula, i32>,
    trivial: bool,
}

impl Proof {
    /// Creates a proof for a formula that folded to FALSE
    ///
    /// The core is every conjunct that folded to FALSE on its own, or every
    /// non-TRUE conjunct when the contradiction only shows up between them.
    pub fn trivial(log: Rc<TranslationLog>) -> Self {
        let false_label = BooleanConstant::FALSE.label();
        let true_label = BooleanConstant::TRUE.label();
        let mut core: FxHashMap<Formula, i32> = log
            .records()
            .filter(|r| r.literal == false_label)
            .map(|r| (r.formula.clone(), r.literal))
            .collect();
        if core.is_empty() {
            core = log
                .records()
                .filter(|r| r.literal != true_label)
                .map(|r| (r.formula.clone(), r.literal))
                .collect();
        }
        Self {
            log,
            core,
            trivial: true,
        }
    }

    /// Creates a proof from the failed assumptions of an unsatisfiable call
    pub fn from_core(log: Rc<TranslationLog>, prover: &dyn SATProver) -> Self {
        let failed = prover.failed_assumptions();
        let core = log
            .records()
            .filter(|r| failed.contains(&r.literal))
            .map(|r| (r.formula.clone(), r.literal))
            .collect();
        Self {
            log,
            core,
            trivial: false,
        }
    }

    /// The conjuncts in the core, each with its literal
    pub fn core(&self) -> &FxHashMap<Formula, i32> {
        &self.core
    }

    /// The conjuncts in the core, in translation order
    pub fn core_formulas(&self) -> Vec<&Formula> {
        self.log
            .records()
            .filter(|r| self.core.contains_key(&r.formula))
            .map(|r| &r.formula)
            .collect()
    }

    /// Whether the proof was built without calling a solver
    pub fn is_trivial(&self) -> bool {
        self.trivial
    }

    /// Returns the translation log
    pub fn log(&self) -> &TranslationLog {
        &self.log
    }
}
