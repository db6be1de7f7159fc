mod common;

use billing_engine::{BillingError, BillingScope, LedgerStore};
use common::{TestEnv, TERM, YEAR};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn coverage_reports_partial_generation() {
    let env = TestEnv::new().await;
    let (class_a, _) = env.seed_class("4A", dec!(500), 10).await;

    // Bill only 4A's roster minus three students: generate for the class,
    // then delete three ledgers to open a gap.
    env.generation.generate(&env.scope(), env.actor).await.unwrap();
    let ledgers = env.store.list_scope(&env.scope()).await.unwrap();
    for ledger in ledgers.iter().take(3) {
        env.store.delete(ledger.id).await.unwrap();
    }

    let report = env.verification.verify(&env.scope()).await.unwrap();
    assert_eq!(report.total_students, 10);
    assert_eq!(report.students_with_billing, 7);
    assert_eq!(report.students_without_billing, 3);
    assert_eq!(report.coverage_percentage, 70.0);
    assert_eq!(
        report.students_with_billing + report.students_without_billing,
        report.total_students
    );

    let class = &report.classes[0];
    assert_eq!(class.class_id, class_a);
    assert_eq!(class.missing.len(), 3);
    for missing in &class.missing {
        assert_eq!(missing.class_id, class_a);
        assert!(!missing.full_name.is_empty());
        assert!(!missing.identifier.is_empty());
    }
}

#[tokio::test]
async fn full_coverage_after_generation() {
    let env = TestEnv::new().await;
    env.seed_class("4A", dec!(500), 5).await;
    env.seed_class("4B", dec!(450), 4).await;
    env.generation.generate(&env.scope(), env.actor).await.unwrap();

    let report = env.verification.verify(&env.scope()).await.unwrap();
    assert_eq!(report.total_students, 9);
    assert_eq!(report.coverage_percentage, 100.0);
    assert!(report.classes.iter().all(|c| c.missing.is_empty()));
}

#[tokio::test]
async fn empty_roster_reports_full_coverage() {
    let env = TestEnv::new().await;
    env.seed_class("Empty", dec!(500), 0).await;

    let report = env.verification.verify(&env.scope()).await.unwrap();
    assert_eq!(report.total_students, 0);
    assert_eq!(report.coverage_percentage, 100.0);
    assert_eq!(report.classes[0].coverage_percentage, 100.0);
}

#[tokio::test]
async fn verification_is_read_only() {
    let env = TestEnv::new().await;
    env.seed_class("4A", dec!(500), 3).await;

    env.verification.verify(&env.scope()).await.unwrap();
    assert!(env.store.is_empty().await);

    env.generation.generate(&env.scope(), env.actor).await.unwrap();
    let before = env.store.list_scope(&env.scope()).await.unwrap();
    env.verification.verify(&env.scope()).await.unwrap();
    let after = env.store.list_scope(&env.scope()).await.unwrap();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.audit_trail.len(), a.audit_trail.len());
    }
}

#[tokio::test]
async fn scoped_verification_ignores_other_classes() {
    let env = TestEnv::new().await;
    let (class_a, _) = env.seed_class("4A", dec!(500), 4).await;
    env.seed_class("4B", dec!(500), 6).await;
    env.generation
        .generate(&env.scope().with_classes(vec![class_a]), env.actor)
        .await
        .unwrap();

    let scoped = env
        .verification
        .verify(&env.scope().with_classes(vec![class_a]))
        .await
        .unwrap();
    assert_eq!(scoped.total_students, 4);
    assert_eq!(scoped.coverage_percentage, 100.0);

    let whole_site = env.verification.verify(&env.scope()).await.unwrap();
    assert_eq!(whole_site.total_students, 10);
    assert_eq!(whole_site.students_with_billing, 4);
    assert_eq!(whole_site.coverage_percentage, 40.0);
}

#[tokio::test]
async fn unknown_site_is_invalid_scope() {
    let env = TestEnv::new().await;
    let err = env
        .verification
        .verify(&BillingScope::new(Uuid::new_v4(), YEAR, TERM))
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::InvalidScope { .. }));
}
