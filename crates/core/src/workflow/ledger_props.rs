//! Property-based tests for StepLedger.

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::ledger::StepLedger;
use crate::workflow::types::{ApprovalMode, Decision, StepDecision};

/// Strategy for generating random UUIDs.
fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

/// Strategy for generating distinct approver lists.
fn arb_approvers() -> impl Strategy<Value = Vec<Uuid>> {
    prop::collection::hash_set(arb_uuid(), 1..=25).prop_map(|set| set.into_iter().collect())
}

fn arb_decision() -> impl Strategy<Value = Decision> {
    prop_oneof![Just(Decision::Approved), Just(Decision::Rejected)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// initiate creates exactly N pending steps with sequences 1..=N in rule order.
    #[test]
    fn prop_initiate_shape(expense_id in arb_uuid(), approvers in arb_approvers()) {
        let steps = StepLedger::initiate(expense_id, &approvers, &[], Utc::now()).unwrap();

        prop_assert_eq!(steps.len(), approvers.len());
        for (i, step) in steps.iter().enumerate() {
            prop_assert_eq!(step.sequence as usize, i + 1);
            prop_assert_eq!(step.approver_id, approvers[i]);
            prop_assert_eq!(step.expense_id, expense_id);
            prop_assert_eq!(step.decision, StepDecision::Pending);
        }
    }

    /// A second decision on the same step always fails and never overwrites the first.
    #[test]
    fn prop_decision_is_write_once(
        approvers in arb_approvers(),
        first in arb_decision(),
        second in arb_decision(),
        index in any::<prop::sample::Index>(),
    ) {
        let mut steps = StepLedger::initiate(Uuid::new_v4(), &approvers, &[], Utc::now()).unwrap();
        let step_id = steps[index.index(steps.len())].id;

        StepLedger::record_decision(ApprovalMode::Parallel, &mut steps, step_id, first, None, Utc::now())
            .unwrap();
        let again = StepLedger::record_decision(
            ApprovalMode::Parallel,
            &mut steps,
            step_id,
            second,
            None,
            Utc::now(),
        );

        let is_already_decided = matches!(again, Err(WorkflowError::StepAlreadyDecided { .. }));
        prop_assert!(is_already_decided);
        let step = StepLedger::find(&steps, step_id).unwrap();
        prop_assert_eq!(step.decision, StepDecision::from(first));
    }

    /// In sequential mode only the lowest pending step is ever decidable.
    #[test]
    fn prop_sequential_turn_is_unique(
        approvers in arb_approvers(),
        approved_prefix in 0usize..25,
    ) {
        let mut steps = StepLedger::initiate(Uuid::new_v4(), &approvers, &[], Utc::now()).unwrap();
        let prefix = approved_prefix.min(steps.len());
        for step in steps.iter_mut().take(prefix) {
            step.decision = StepDecision::Approved;
        }

        let decidable: Vec<u32> = steps
            .iter()
            .filter(|s| StepLedger::is_turn(ApprovalMode::Sequential, &steps, s))
            .map(|s| s.sequence)
            .collect();

        if prefix == steps.len() {
            prop_assert!(decidable.is_empty());
        } else {
            prop_assert_eq!(decidable, vec![u32::try_from(prefix).unwrap() + 1]);
        }
    }
}
