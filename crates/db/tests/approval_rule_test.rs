//! Integration tests for approval rule storage.

mod common;

use rstest::rstest;
use uuid::Uuid;

use spendflow_core::workflow::{ApprovalMode, ApprovalPolicy, WorkflowError};
use spendflow_db::{ApprovalRuleRepository, CreateRuleInput, UpdateRuleInput};

use common::{approvers, create_rule, setup_db};

#[tokio::test]
async fn test_create_and_resolve_rule() {
    let db = setup_db().await;
    let company_id = Uuid::new_v4();
    let chain = approvers(3);

    let rule = create_rule(&db, company_id, chain.clone(), ApprovalMode::Parallel, 60).await;

    let repo = ApprovalRuleRepository::new(db);
    let resolved = repo.resolve(rule.id).await.unwrap();

    assert_eq!(resolved, rule);
    assert_eq!(resolved.approvers, chain);
    assert_eq!(resolved.version, 1);
    assert_eq!(
        resolved.policy,
        ApprovalPolicy::Parallel {
            min_approval_percent: 60
        }
    );
}

#[tokio::test]
async fn test_sequential_rule_stores_full_threshold() {
    let db = setup_db().await;

    let rule = create_rule(&db, Uuid::new_v4(), approvers(2), ApprovalMode::Sequential, 40).await;
    let resolved = ApprovalRuleRepository::new(db).get_rule(rule.id).await.unwrap();

    assert_eq!(resolved.policy, ApprovalPolicy::Sequential);
    assert_eq!(resolved.policy.min_approval_percent(), 100);
}

#[rstest]
#[case::no_approvers(vec![], 50)]
#[case::zero_threshold(vec![Uuid::from_u128(1)], 0)]
#[case::threshold_over_100(vec![Uuid::from_u128(1)], 101)]
#[case::duplicate_approver(vec![Uuid::from_u128(1), Uuid::from_u128(1)], 50)]
#[tokio::test]
async fn test_create_rejects_malformed_rule(#[case] approvers: Vec<Uuid>, #[case] percent: u8) {
    let db = setup_db().await;
    let repo = ApprovalRuleRepository::new(db);

    let result = repo
        .create_rule(CreateRuleInput {
            company_id: Uuid::new_v4(),
            name: "Broken".to_string(),
            approvers,
            mode: ApprovalMode::Parallel,
            min_approval_percent: percent,
        })
        .await;

    assert!(matches!(result, Err(WorkflowError::InvalidRule(_))));
}

#[tokio::test]
async fn test_unknown_rule_is_not_found() {
    let db = setup_db().await;
    let repo = ApprovalRuleRepository::new(db);
    let rule_id = Uuid::new_v4();

    let result = repo.resolve(rule_id).await;

    assert!(matches!(result, Err(WorkflowError::RuleNotFound(id)) if id == rule_id));
}

#[tokio::test]
async fn test_update_bumps_version_and_replaces_approvers() {
    let db = setup_db().await;
    let rule = create_rule(&db, Uuid::new_v4(), approvers(3), ApprovalMode::Sequential, 100).await;
    let repo = ApprovalRuleRepository::new(db);

    let mut reordered = rule.approvers.clone();
    reordered.reverse();
    let extra = Uuid::new_v4();
    reordered.push(extra);

    let updated = repo
        .update_rule(
            rule.id,
            UpdateRuleInput {
                name: Some("Managers first".to_string()),
                approvers: Some(reordered.clone()),
                mode: Some(ApprovalMode::Parallel),
                min_approval_percent: Some(75),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.version, 2);
    assert_eq!(updated.name, "Managers first");

    let stored = repo.get_rule(rule.id).await.unwrap();
    assert_eq!(stored.approvers, reordered);
    assert_eq!(stored.version, 2);
    assert_eq!(stored.mode(), ApprovalMode::Parallel);
    assert_eq!(stored.policy.min_approval_percent(), 75);
}

#[tokio::test]
async fn test_update_keeps_unspecified_fields() {
    let db = setup_db().await;
    let rule = create_rule(&db, Uuid::new_v4(), approvers(2), ApprovalMode::Parallel, 50).await;
    let repo = ApprovalRuleRepository::new(db);

    let updated = repo
        .update_rule(
            rule.id,
            UpdateRuleInput {
                min_approval_percent: Some(100),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.approvers, rule.approvers);
    assert_eq!(updated.name, rule.name);
    assert_eq!(updated.policy.min_approval_percent(), 100);
    assert_eq!(repo.get_rule(rule.id).await.unwrap(), updated);
}

#[tokio::test]
async fn test_invalid_update_leaves_rule_untouched() {
    let db = setup_db().await;
    let rule = create_rule(&db, Uuid::new_v4(), approvers(2), ApprovalMode::Parallel, 50).await;
    let repo = ApprovalRuleRepository::new(db);

    let result = repo
        .update_rule(
            rule.id,
            UpdateRuleInput {
                approvers: Some(vec![]),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(WorkflowError::InvalidRule(_))));
    assert_eq!(repo.get_rule(rule.id).await.unwrap(), rule);
}

#[tokio::test]
async fn test_deactivated_rule_cannot_be_resolved() {
    let db = setup_db().await;
    let company_id = Uuid::new_v4();
    let rule = create_rule(&db, company_id, approvers(1), ApprovalMode::Sequential, 100).await;
    let repo = ApprovalRuleRepository::new(db);

    repo.deactivate_rule(rule.id).await.unwrap();

    assert!(matches!(
        repo.resolve(rule.id).await,
        Err(WorkflowError::RuleNotFound(_))
    ));
    assert!(matches!(
        repo.deactivate_rule(rule.id).await,
        Err(WorkflowError::RuleNotFound(_))
    ));
    // Still readable for audit.
    assert_eq!(repo.get_rule(rule.id).await.unwrap().id, rule.id);
    assert!(repo.list_rules(company_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_rules_is_scoped_to_company() {
    let db = setup_db().await;
    let company_a = Uuid::new_v4();
    let company_b = Uuid::new_v4();

    create_rule(&db, company_a, approvers(1), ApprovalMode::Sequential, 100).await;
    create_rule(&db, company_a, approvers(2), ApprovalMode::Parallel, 50).await;
    create_rule(&db, company_b, approvers(1), ApprovalMode::Sequential, 100).await;

    let repo = ApprovalRuleRepository::new(db);

    let rules = repo.list_rules(company_a).await.unwrap();
    assert_eq!(rules.len(), 2);
    assert!(rules.iter().all(|r| r.company_id == company_a));
    // Ordered by name: "parallel rule" < "sequential rule"
    assert_eq!(rules[0].mode(), ApprovalMode::Parallel);
}
