//! Property-based tests for WorkflowService.
//!
//! Random decision orders are replayed against the state machine to check
//! that an expense is finalized at most once and stays final.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::evaluation::EvaluationEngine;
use crate::workflow::expense::ExpenseDraft;
use crate::workflow::rule::{ApprovalPolicy, ApprovalRule};
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{Decision, DecisionRequest, ExpenseStatus};

fn draft() -> ExpenseDraft {
    ExpenseDraft {
        submitter_id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        amount: dec!(99.99),
        currency: "USD".to_string(),
        category: "software".to_string(),
        description: None,
        expense_date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        receipt_url: None,
    }
}

/// Strategy for a policy in either mode.
fn arb_policy() -> impl Strategy<Value = ApprovalPolicy> {
    prop_oneof![
        Just(ApprovalPolicy::Sequential),
        (1u8..=100u8).prop_map(|min_approval_percent| ApprovalPolicy::Parallel {
            min_approval_percent
        }),
    ]
}

/// Strategy for (approver count, decision order, decisions).
fn arb_run() -> impl Strategy<Value = (Vec<usize>, Vec<Decision>)> {
    (1usize..=8).prop_flat_map(|n| {
        (
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
            prop::collection::vec(
                prop_oneof![Just(Decision::Approved), Just(Decision::Rejected)],
                n,
            ),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Whatever the order, at most one decision emits an event, the status
    /// only ever leaves Pending once, and every later decision is refused.
    #[test]
    fn prop_single_terminal_transition(policy in arb_policy(), run in arb_run()) {
        let (order, decisions) = run;
        let n = order.len();
        let rule = ApprovalRule::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Property rule",
            (0..n).map(|_| Uuid::new_v4()).collect(),
            policy,
            1,
        )
        .unwrap();
        let mut submission =
            WorkflowService::submit(Uuid::new_v4(), draft(), &rule, Utc::now()).unwrap();

        let mut events = 0;
        let mut final_status: Option<ExpenseStatus> = None;

        for index in order {
            let step = submission.steps[index].clone();
            let request = DecisionRequest {
                decision: decisions[index],
                comments: None,
            };
            let result = WorkflowService::decide(
                &submission.expense,
                &submission.steps,
                step.id,
                &request,
                step.approver_id,
                Utc::now(),
            );

            match result {
                Ok(outcome) => {
                    prop_assert!(final_status.is_none(), "decision accepted after finalization");
                    if let Some(event) = &outcome.event {
                        events += 1;
                        final_status = Some(event.status);
                    }
                    submission.steps[index] = outcome.step;
                    submission.expense = outcome.expense;
                }
                Err(WorkflowError::ExpenseAlreadyFinal { status, .. }) => {
                    prop_assert_eq!(Some(status), final_status);
                }
                Err(WorkflowError::OutOfOrderDecision { .. }) => {
                    prop_assert_eq!(policy, ApprovalPolicy::Sequential);
                }
                Err(other) => {
                    prop_assert!(false, "unexpected error: {other}");
                }
            }
        }

        prop_assert!(events <= 1);
        prop_assert_eq!(
            submission.expense.status,
            EvaluationEngine::evaluate(&submission.expense.policy, &submission.steps)
        );
        if let Some(status) = final_status {
            prop_assert_eq!(submission.expense.status, status);
        }
    }
}
