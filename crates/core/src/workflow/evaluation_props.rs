//! Property-based tests for EvaluationEngine.
//!
//! The percentage rules are checked against an independent formulation
//! over integer counts, so any rounding drift shows up immediately.

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use crate::workflow::evaluation::{EvaluationEngine, Tally};
use crate::workflow::ledger::{ApprovalStep, StepLedger};
use crate::workflow::rule::ApprovalPolicy;
use crate::workflow::types::{ExpenseStatus, StepDecision};

/// Strategy for generating random step decisions.
fn arb_decision() -> impl Strategy<Value = StepDecision> {
    prop_oneof![
        Just(StepDecision::Pending),
        Just(StepDecision::Approved),
        Just(StepDecision::Rejected),
    ]
}

/// Strategy for generating non-empty ledgers of up to 20 steps.
fn arb_decisions() -> impl Strategy<Value = Vec<StepDecision>> {
    prop::collection::vec(arb_decision(), 1..=20)
}

fn ledger(decisions: &[StepDecision]) -> Vec<ApprovalStep> {
    let approvers: Vec<Uuid> = decisions.iter().map(|_| Uuid::new_v4()).collect();
    let mut steps = StepLedger::initiate(Uuid::new_v4(), &approvers, &[], Utc::now()).unwrap();
    for (step, decision) in steps.iter_mut().zip(decisions) {
        step.decision = *decision;
    }
    steps
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Approved iff 100*approved >= min*total after flooring; rejected iff
    /// even unanimous pending approval stays below the threshold.
    #[test]
    fn prop_parallel_matches_reference(
        decisions in arb_decisions(),
        min in 1u8..=100u8,
    ) {
        let steps = ledger(&decisions);
        let tally = Tally::of(&steps);
        let total = u64::from(tally.total);
        let min = u64::from(min);

        let approved_pct = u64::from(tally.approved) * 100 / total;
        let reachable_pct = u64::from(tally.approved + tally.pending) * 100 / total;
        let expected = if approved_pct >= min {
            ExpenseStatus::Approved
        } else if reachable_pct < min {
            ExpenseStatus::Rejected
        } else {
            ExpenseStatus::Pending
        };

        let policy = ApprovalPolicy::Parallel { min_approval_percent: u8::try_from(min).unwrap() };
        prop_assert_eq!(EvaluationEngine::evaluate(&policy, &steps), expected);
    }

    /// Counts always add up to the number of steps.
    #[test]
    fn prop_tally_is_complete(decisions in arb_decisions()) {
        let tally = Tally::of(&ledger(&decisions));
        prop_assert_eq!(tally.approved + tally.rejected + tally.pending, tally.total);
        prop_assert_eq!(tally.total as usize, decisions.len());
        prop_assert!(tally.approved_percent() <= tally.reachable_percent());
        prop_assert!(tally.reachable_percent() <= 100);
    }

    /// A sequential chain is rejected by any rejection and approved only when unanimous.
    #[test]
    fn prop_sequential_semantics(decisions in arb_decisions()) {
        let steps = ledger(&decisions);
        let status = EvaluationEngine::evaluate(&ApprovalPolicy::Sequential, &steps);

        if decisions.contains(&StepDecision::Rejected) {
            prop_assert_eq!(status, ExpenseStatus::Rejected);
        } else if decisions.iter().all(|d| *d == StepDecision::Approved) {
            prop_assert_eq!(status, ExpenseStatus::Approved);
        } else {
            prop_assert_eq!(status, ExpenseStatus::Pending);
        }
    }

    /// A 100% parallel rule behaves exactly like "everyone must approve".
    #[test]
    fn prop_hundred_percent_is_unanimity(decisions in arb_decisions()) {
        let steps = ledger(&decisions);
        let parallel = EvaluationEngine::evaluate(
            &ApprovalPolicy::Parallel { min_approval_percent: 100 },
            &steps,
        );
        let sequential = EvaluationEngine::evaluate(&ApprovalPolicy::Sequential, &steps);
        prop_assert_eq!(parallel, sequential);
    }

    /// Turning a pending step into an approval never makes the outcome worse.
    #[test]
    fn prop_parallel_approval_is_monotonic(
        decisions in arb_decisions(),
        min in 1u8..=100u8,
        index in any::<prop::sample::Index>(),
    ) {
        let policy = ApprovalPolicy::Parallel { min_approval_percent: min };
        let before = EvaluationEngine::evaluate(&policy, &ledger(&decisions));

        let pending: Vec<usize> = decisions
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == StepDecision::Pending)
            .map(|(i, _)| i)
            .collect();
        if pending.is_empty() {
            return Ok(());
        }
        let mut after_decisions = decisions.clone();
        after_decisions[pending[index.index(pending.len())]] = StepDecision::Approved;
        let after = EvaluationEngine::evaluate(&policy, &ledger(&after_decisions));

        if before == ExpenseStatus::Approved {
            prop_assert_eq!(after, ExpenseStatus::Approved);
        }
        if before != ExpenseStatus::Rejected {
            prop_assert_ne!(after, ExpenseStatus::Rejected);
        }
    }
}
