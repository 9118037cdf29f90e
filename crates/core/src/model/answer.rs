use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::question::AssessmentType;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("question {index} is out of range for {len} slots")]
    SlotOutOfRange { index: usize, len: usize },
}

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// A recorded answer for one question.
///
/// `Multi` is never empty; an empty selection is stored as no answer at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Single(usize),
    Multi(BTreeSet<usize>),
}

impl Answer {
    /// Whether this answer includes the given option.
    #[must_use]
    pub fn contains(&self, option: usize) -> bool {
        match self {
            Answer::Single(chosen) => *chosen == option,
            Answer::Multi(chosen) => chosen.contains(&option),
        }
    }

    /// Chosen options, ascending.
    #[must_use]
    pub fn options(&self) -> Vec<usize> {
        match self {
            Answer::Single(chosen) => vec![*chosen],
            Answer::Multi(chosen) => chosen.iter().copied().collect(),
        }
    }
}

//
// ─── LEDGER ────────────────────────────────────────────────────────────────────
//

/// Per-question record of what the user currently has selected.
///
/// The slot count is fixed at construction and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerLedger {
    slots: Vec<Option<Answer>>,
}

impl AnswerLedger {
    /// A ledger with `len` unanswered slots.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Apply one selection to a slot.
    ///
    /// Single-select replaces the slot with `option`. Multi-select toggles
    /// `option`; removing the last option leaves the slot unanswered.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::SlotOutOfRange` if `index` has no slot.
    pub fn record(
        &mut self,
        index: usize,
        kind: AssessmentType,
        option: usize,
    ) -> Result<(), LedgerError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(LedgerError::SlotOutOfRange { index, len })?;

        *slot = match (kind, slot.take()) {
            (AssessmentType::SingleSelect, _) => Some(Answer::Single(option)),
            (AssessmentType::MultiSelect, Some(Answer::Multi(mut chosen))) => {
                if !chosen.remove(&option) {
                    chosen.insert(option);
                }
                (!chosen.is_empty()).then_some(Answer::Multi(chosen))
            }
            // A stale single answer in a multi-select slot is discarded.
            (AssessmentType::MultiSelect, _) => Some(Answer::Multi(BTreeSet::from([option]))),
        };
        Ok(())
    }

    /// Reset a slot to unanswered.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::SlotOutOfRange` if `index` has no slot.
    pub fn clear(&mut self, index: usize) -> Result<(), LedgerError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(LedgerError::SlotOutOfRange { index, len })?;
        *slot = None;
        Ok(())
    }

    /// Current value of a slot; `None` when unanswered or out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Answer> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn is_answered(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    #[must_use]
    pub fn count_answered(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    #[must_use]
    pub fn count_unanswered(&self) -> usize {
        self.slots.len() - self.count_answered()
    }

    /// Iterate slots in question order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&Answer>> {
        self.slots.iter().map(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn single_select_is_exclusive() {
        let mut ledger = AnswerLedger::new(2);
        ledger.record(0, AssessmentType::SingleSelect, 1).unwrap();
        ledger.record(0, AssessmentType::SingleSelect, 3).unwrap();
        assert_eq!(ledger.get(0), Some(&Answer::Single(3)));
        assert_eq!(ledger.count_answered(), 1);
        assert_eq!(ledger.count_unanswered(), 1);
    }

    #[test]
    fn multi_select_toggles_and_normalizes_empty() {
        let mut ledger = AnswerLedger::new(1);
        ledger.record(0, AssessmentType::MultiSelect, 0).unwrap();
        ledger.record(0, AssessmentType::MultiSelect, 2).unwrap();
        assert_eq!(ledger.get(0).unwrap().options(), vec![0, 2]);

        ledger.record(0, AssessmentType::MultiSelect, 0).unwrap();
        ledger.record(0, AssessmentType::MultiSelect, 2).unwrap();
        assert_eq!(ledger.get(0), None);
        assert_eq!(ledger.count_answered(), 0);
    }

    #[test]
    fn out_of_range_slot_is_rejected() {
        let mut ledger = AnswerLedger::new(1);
        let err = ledger
            .record(4, AssessmentType::SingleSelect, 0)
            .unwrap_err();
        assert_eq!(err, LedgerError::SlotOutOfRange { index: 4, len: 1 });
        assert!(ledger.clear(1).is_err());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn clear_resets_slot() {
        let mut ledger = AnswerLedger::new(3);
        ledger.record(1, AssessmentType::SingleSelect, 0).unwrap();
        ledger.clear(1).unwrap();
        assert!(!ledger.is_answered(1));
        assert_eq!(ledger.iter().filter(Option::is_some).count(), 0);
    }

    proptest! {
        #[test]
        fn toggling_twice_restores_slot(
            prior in proptest::collection::btree_set(0usize..6, 0..6),
            option in 0usize..6,
        ) {
            let mut ledger = AnswerLedger::new(1);
            for o in &prior {
                ledger.record(0, AssessmentType::MultiSelect, *o).unwrap();
            }
            let before = ledger.clone();

            ledger.record(0, AssessmentType::MultiSelect, option).unwrap();
            ledger.record(0, AssessmentType::MultiSelect, option).unwrap();

            prop_assert_eq!(ledger, before);
        }

        #[test]
        fn ledger_length_never_changes(ops in proptest::collection::vec((0usize..4, 0usize..5, any::<bool>()), 0..40)) {
            let mut ledger = AnswerLedger::new(4);
            for (index, option, multi) in ops {
                let kind = if multi { AssessmentType::MultiSelect } else { AssessmentType::SingleSelect };
                ledger.record(index, kind, option).unwrap();
                prop_assert_eq!(ledger.len(), 4);
            }
            prop_assert!(ledger.iter().all(|slot| !matches!(slot, Some(Answer::Multi(s)) if s.is_empty())));
        }
    }
}
