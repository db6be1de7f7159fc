mod common;

use billing_engine::{BillingStatus, LedgerFilter, LedgerStore, Pagination};
use common::TestEnv;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::test]
async fn summary_aggregates_scope_totals() {
    let env = TestEnv::new().await;
    env.seed_class("4A", dec!(500), 3).await;
    env.generation.generate(&env.scope(), env.actor).await.unwrap();

    let ledgers = env.store.list_scope(&env.scope()).await.unwrap();
    env.pay(ledgers[0].id, dec!(500)).await; // clear
    env.pay(ledgers[1].id, dec!(600)).await; // overpaid

    let summary = env.reporting.summary(&env.scope()).await.unwrap();
    assert_eq!(summary.ledger_count, 3);
    assert_eq!(summary.total_billed, dec!(1500));
    assert_eq!(summary.total_paid, dec!(1100));
    assert_eq!(summary.total_outstanding, dec!(400));
    assert_eq!(summary.owing_count, 1);
    assert_eq!(summary.clear_count, 1);
    assert_eq!(summary.overpaid_count, 1);
}

#[tokio::test]
async fn summary_of_empty_scope_is_zero() {
    let env = TestEnv::new().await;
    let summary = env.reporting.summary(&env.scope()).await.unwrap();
    assert_eq!(summary.ledger_count, 0);
    assert_eq!(summary.total_billed, Decimal::ZERO);
    assert_eq!(summary.total_outstanding, Decimal::ZERO);
}

#[tokio::test]
async fn list_filters_by_status_and_class() {
    let env = TestEnv::new().await;
    let (class_a, _) = env.seed_class("4A", dec!(500), 2).await;
    env.seed_class("4B", dec!(450), 3).await;
    env.generation.generate(&env.scope(), env.actor).await.unwrap();

    let a_ledgers = env
        .reporting
        .list(
            &env.scope(),
            &LedgerFilter {
                class_id: Some(class_a),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(a_ledgers.total_count, 2);

    env.pay(a_ledgers.items[0].id, dec!(500)).await;

    let clear = env
        .reporting
        .list(
            &env.scope(),
            &LedgerFilter {
                status: Some(BillingStatus::Clear),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(clear.total_count, 1);
    assert_eq!(clear.items[0].id, a_ledgers.items[0].id);
}

#[tokio::test]
async fn list_pages_are_stable_and_bounded() {
    let env = TestEnv::new().await;
    env.seed_class("4A", dec!(500), 7).await;
    env.generation.generate(&env.scope(), env.actor).await.unwrap();

    let page1 = env
        .reporting
        .list(
            &env.scope(),
            &LedgerFilter::default(),
            Pagination { page: 1, page_size: 3 },
        )
        .await
        .unwrap();
    let page2 = env
        .reporting
        .list(
            &env.scope(),
            &LedgerFilter::default(),
            Pagination { page: 2, page_size: 3 },
        )
        .await
        .unwrap();
    let page3 = env
        .reporting
        .list(
            &env.scope(),
            &LedgerFilter::default(),
            Pagination { page: 3, page_size: 3 },
        )
        .await
        .unwrap();

    assert_eq!(page1.total_count, 7);
    assert_eq!(page1.items.len(), 3);
    assert_eq!(page2.items.len(), 3);
    assert_eq!(page3.items.len(), 1);

    let mut seen: Vec<_> = page1
        .items
        .iter()
        .chain(&page2.items)
        .chain(&page3.items)
        .map(|l| l.id)
        .collect();
    seen.dedup();
    assert_eq!(seen.len(), 7);
}

#[tokio::test]
async fn out_of_range_page_is_empty_not_a_panic() {
    let env = TestEnv::new().await;
    env.seed_class("4A", dec!(500), 2).await;
    env.generation.generate(&env.scope(), env.actor).await.unwrap();

    let page = env
        .reporting
        .list(
            &env.scope(),
            &LedgerFilter::default(),
            Pagination {
                page: usize::MAX,
                page_size: 200,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total_count, 2);
    assert!(page.items.is_empty());
}
