//! Integration tests for token-ledger

use std::sync::Arc;

use token_ledger::{
    Account, ClientConfig, LedgerError, LedgerGateway, MemoryGateway, MemoryLedger, RetryPolicy,
    TokenClient,
};

fn connect(ledger: &MemoryLedger) -> TokenClient<MemoryGateway> {
    let config = ClientConfig::default();
    TokenClient::new(&config, ledger.connect(&config).unwrap()).unwrap()
}

#[tokio::test]
async fn test_account_lifecycle() {
    let ledger = MemoryLedger::new();
    let client = connect(&ledger);

    assert!(!client.client_exists("alice").await.unwrap());
    assert_eq!(client.add_client("alice", 100).await.unwrap(), 100);
    assert!(client.client_exists("alice").await.unwrap());
    assert_eq!(client.get_tokens("alice").await.unwrap(), 100);

    assert_eq!(client.put_tokens("alice", 42).await.unwrap(), 42);
    assert_eq!(client.get_tokens("alice").await.unwrap(), 42);

    client.delete_client("alice").await.unwrap();
    assert!(!client.client_exists("alice").await.unwrap());
    assert_eq!(
        client.get_tokens("alice").await.unwrap_err(),
        LedgerError::NotFound("alice".to_string())
    );

    // Re-adding after deletion starts from the new initial amount
    assert_eq!(client.add_client("alice", 7).await.unwrap(), 7);
    assert_eq!(client.get_tokens("alice").await.unwrap(), 7);
}

#[tokio::test]
async fn test_add_client_is_not_idempotent() {
    let ledger = MemoryLedger::new();
    let client = connect(&ledger);

    client.add_client("bob", 10).await.unwrap();
    assert_eq!(
        client.add_client("bob", 999).await.unwrap_err(),
        LedgerError::AlreadyExists("bob".to_string())
    );
    assert_eq!(client.get_tokens("bob").await.unwrap(), 10);
}

#[tokio::test]
async fn test_operations_on_missing_client() {
    let ledger = MemoryLedger::new();
    let client = connect(&ledger);
    let missing = LedgerError::NotFound("ghost".to_string());
    assert!(missing.is_business_rule());

    assert_eq!(client.put_tokens("ghost", 1).await.unwrap_err(), missing);
    assert_eq!(client.delete_client("ghost").await.unwrap_err(), missing);
    assert_eq!(
        client.contribute_resource("ghost", "data").await.unwrap_err(),
        missing
    );
    assert_eq!(client.consume_resource("ghost", 10).await.unwrap_err(), missing);
    assert!(!client.client_exists("ghost").await.unwrap());
}

#[tokio::test]
async fn test_contribute_and_consume_pricing() {
    let ledger = MemoryLedger::new();
    let client = connect(&ledger);

    client.add_client("carol", 0).await.unwrap();
    let data = "x".repeat(23);
    assert_eq!(client.contribute_resource("carol", &data).await.unwrap(), 3);
    assert_eq!(client.contribute_resource("carol", "").await.unwrap(), 3);
    assert_eq!(client.contribute_resource("carol", "ab").await.unwrap(), 4);

    client.put_tokens("carol", 5).await.unwrap();
    assert_eq!(client.consume_resource("carol", 41).await.unwrap(), 0);

    client.put_tokens("carol", 5).await.unwrap();
    assert_eq!(client.consume_resource("carol", 42).await.unwrap(), 0);

    client.put_tokens("carol", 5).await.unwrap();
    assert_eq!(
        client.consume_resource("carol", 51).await.unwrap_err(),
        LedgerError::InsufficientBalance {
            id: "carol".to_string(),
            balance: 5,
            cost: 6
        }
    );
    assert_eq!(client.get_tokens("carol").await.unwrap(), 5);
}

#[tokio::test]
async fn test_balance_never_negative_over_sequence() {
    let ledger = MemoryLedger::new();
    let client = connect(&ledger);
    client.add_client("dave", 20).await.unwrap();

    let mut expected: u64 = 20;
    for required in [30u64, 100, 95, 7, 250, 1, 0, 19] {
        let cost = required.div_ceil(10);
        match client.consume_resource("dave", required).await {
            Ok(balance) => {
                expected -= cost;
                assert_eq!(balance, expected);
            }
            Err(LedgerError::InsufficientBalance { balance, .. }) => {
                assert!(cost > expected);
                assert_eq!(balance, expected);
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
        assert_eq!(client.get_tokens("dave").await.unwrap(), expected);
    }
}

#[tokio::test]
async fn test_get_all_tokens_sorted_without_deleted() {
    let ledger = MemoryLedger::new();
    let client = connect(&ledger);

    for (id, amount) in [("mia", 3), ("ben", 1), ("zoe", 9), ("amy", 4)] {
        client.add_client(id, amount).await.unwrap();
    }
    client.delete_client("zoe").await.unwrap();
    client.put_tokens("ben", 2).await.unwrap();

    assert_eq!(
        client.get_all_tokens().await.unwrap(),
        vec![
            Account::new("amy", 4),
            Account::new("ben", 2),
            Account::new("mia", 3),
        ]
    );
}

#[tokio::test]
async fn test_events_carry_resulting_value() {
    let ledger = MemoryLedger::new();
    let client = connect(&ledger);

    client.add_client("erin", 10).await.unwrap();
    client.contribute_resource("erin", "0123456789a").await.unwrap();
    client.consume_resource("erin", 30).await.unwrap();
    client.put_tokens("erin", 50).await.unwrap();
    client.delete_client("erin").await.unwrap();
    // Rejected and read-only calls emit nothing
    assert_eq!(
        client.consume_resource("erin", 1).await.unwrap_err(),
        LedgerError::NotFound("erin".to_string())
    );
    client.client_exists("erin").await.unwrap();

    let events = ledger.events().unwrap();
    let summary: Vec<(&str, &[u8])> = events
        .iter()
        .map(|e| (e.name.as_str(), e.payload.as_slice()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("AddClient", b"10".as_slice()),
            ("ContributeResource", b"12".as_slice()),
            ("ConsumeResource", b"9".as_slice()),
            ("PutTokens", b"50".as_slice()),
            ("DeleteClient", b"null".as_slice()),
        ]
    );
    assert!(events.iter().all(|e| e.key == "erin"));
}

#[tokio::test]
async fn test_conflict_then_success_recomputes_from_fresh_read() {
    let ledger = MemoryLedger::new();
    let client = connect(&ledger);
    client.add_client("frank", 10).await.unwrap();

    // A competing transaction commits between our endorsement and commit
    ledger
        .interleave(|l| l.seed("frank", 50).map(|_| ()))
        .unwrap();

    let balance = client
        .contribute_resource("frank", "0123456789")
        .await
        .unwrap();
    assert_eq!(balance, 51);
    assert_eq!(client.get_tokens("frank").await.unwrap(), 51);

    let stats = ledger.stats().unwrap();
    assert_eq!(stats.mvcc_conflicts, 1);
}

#[tokio::test]
async fn test_conflict_on_every_attempt_surfaces() {
    let ledger = MemoryLedger::new();
    let client = connect(&ledger);
    client.add_client("gina", 10).await.unwrap();
    let committed_before = ledger.stats().unwrap().committed;

    ledger
        .interleave(|l| l.seed("gina", 20).map(|_| ()))
        .unwrap();
    ledger
        .interleave(|l| l.seed("gina", 30).map(|_| ()))
        .unwrap();

    let err = client.put_tokens("gina", 1).await.unwrap_err();
    assert!(matches!(err, LedgerError::CommitConflict { ref key, .. } if key == "gina"));
    // Only the competing writes landed
    assert_eq!(client.get_tokens("gina").await.unwrap(), 30);

    let stats = ledger.stats().unwrap();
    assert_eq!(stats.mvcc_conflicts, 2);
    assert_eq!(stats.committed, committed_before);
    // AddClient plus both PutTokens attempts
    assert_eq!(stats.submitted, 3);
}

#[tokio::test]
async fn test_add_client_not_retried_by_default() {
    let ledger = MemoryLedger::new();
    let client = connect(&ledger);

    ledger
        .interleave(|l| l.seed("hank", 5).map(|_| ()))
        .unwrap();
    let err = client.add_client("hank", 100).await.unwrap_err();
    assert!(err.is_commit_conflict());
    assert_eq!(client.get_tokens("hank").await.unwrap(), 5);
}

#[tokio::test]
async fn test_custom_retry_policy() {
    let ledger = MemoryLedger::new();
    let mut config = ClientConfig::default();
    config.retry = RetryPolicy::disabled();
    let client = TokenClient::new(&config, ledger.connect(&config).unwrap()).unwrap();
    assert_eq!(client.retry_policy(), &RetryPolicy::disabled());
    client.add_client("ivy", 10).await.unwrap();

    ledger.interleave(|l| l.seed("ivy", 11).map(|_| ())).unwrap();
    assert!(client
        .put_tokens("ivy", 1)
        .await
        .unwrap_err()
        .is_commit_conflict());
    assert_eq!(ledger.stats().unwrap().mvcc_conflicts, 1);
}

#[tokio::test]
async fn test_other_organization_cannot_mutate() {
    let ledger = MemoryLedger::new();
    let org1 = connect(&ledger);
    let org2_config = ClientConfig::default().with_msp_id("Org2MSP");
    let org2 = TokenClient::new(&org2_config, ledger.connect(&org2_config).unwrap()).unwrap();

    assert_eq!(org1.gateway().org(), "Org1MSP");
    assert_eq!(org2.gateway().org(), "Org2MSP");
    org1.add_client("jane", 10).await.unwrap();

    let err = org2.put_tokens("jane", 0).await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::PolicyViolation {
            key: "jane".to_string(),
            org: "Org2MSP".to_string()
        }
    );
    // Reads are not restricted
    assert_eq!(org2.get_tokens("jane").await.unwrap(), 10);
    assert_eq!(org1.get_tokens("jane").await.unwrap(), 10);
    // Both connections share one world state
    let stats = org2.gateway().ledger().stats().unwrap();
    assert_eq!(stats, ledger.stats().unwrap());
    assert_eq!(stats.policy_failures, 1);
}

#[tokio::test]
async fn test_connect_rejects_unknown_channel_or_contract() {
    let ledger = MemoryLedger::new();

    let mut config = ClientConfig::default();
    config.channel = "other".to_string();
    assert!(matches!(ledger.connect(&config), Err(LedgerError::Config(_))));

    let mut config = ClientConfig::default();
    config.contract = "assets".to_string();
    assert!(matches!(ledger.connect(&config), Err(LedgerError::Config(_))));
}

#[tokio::test]
async fn test_closed_gateway_fails_without_retry() {
    let ledger = MemoryLedger::new();
    let config = ClientConfig::default();
    let gateway = ledger.connect(&config).unwrap();
    gateway.close().await.unwrap();

    let client = TokenClient::new(&config, gateway).unwrap();
    assert!(matches!(
        client.put_tokens("kim", 1).await,
        Err(LedgerError::Transport(_))
    ));
    assert!(matches!(
        client.get_all_tokens().await,
        Err(LedgerError::Transport(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_contributions_preserve_balance() {
    let ledger = MemoryLedger::new();
    let client = Arc::new(connect(&ledger));
    client.add_client("lee", 100).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            client.contribute_resource("lee", "0123456789").await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(err) => assert!(err.is_commit_conflict(), "unexpected error: {err}"),
        }
    }

    // Each committed contribution adds exactly one token; lost races add nothing
    assert_eq!(client.get_tokens("lee").await.unwrap(), 100 + succeeded);
}
