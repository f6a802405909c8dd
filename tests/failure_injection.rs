//! Failure injection tests for the data access layer.

use axum::http::{Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use todo_service::db::ReadTarget;
use todo_service::lifecycle::StartupError;
use todo_service::resilience::CircuitState;
use todo_service::store::Role;

mod common;
use common::{router, send, start, test_config, with_replica, FlakyConnector};

#[tokio::test(start_paused = true)]
async fn test_breaker_trips_then_recovers() {
    let config = test_config();
    let connector = FlakyConnector::new();
    let service = start(&config, &connector).await.unwrap();
    let app = router(&service, &config);

    connector.primary.fail();
    for _ in 0..3 {
        let (status, body) = send(&app, Method::GET, "/todos", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "database unavailable: connection refused");
    }
    let breaker = service.state.todos.access().breaker();
    assert_eq!(breaker.state(), CircuitState::Open);

    let calls_before = connector.primary.calls();
    let (status, body) = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "Service Unavailable (Circuit Breaker Open)");
    assert_eq!(connector.primary.calls(), calls_before);

    connector.primary.recover();
    tokio::time::advance(Duration::from_secs(31)).await;

    let (status, body) = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_writes_rejected_while_open() {
    let config = test_config();
    let connector = FlakyConnector::new();
    let service = start(&config, &connector).await.unwrap();
    let app = router(&service, &config);

    connector.primary.fail();
    for _ in 0..3 {
        send(&app, Method::POST, "/todos", Some(r#"{"task":"buy milk"}"#)).await;
    }
    connector.primary.recover();

    let (status, _) = send(&app, Method::POST, "/todos", Some(r#"{"task":"buy milk"}"#)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (status, _) = send(&app, Method::DELETE, "/todos/1", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    // Validation happens before the breaker is consulted.
    let (status, _) = send(&app, Method::POST, "/todos", Some("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_is_retried_within_request() {
    let config = test_config();
    let connector = FlakyConnector::new();
    let service = start(&config, &connector).await.unwrap();
    let app = router(&service, &config);

    connector.primary.fail();
    let recover = {
        let primary = connector.primary.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            primary.recover();
        })
    };

    let (status, body) = send(&app, Method::POST, "/todos", Some(r#"{"task":"buy milk"}"#)).await;
    recover.await.unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, r#"{"id":1,"task":"buy milk","completed":false}"#);
    assert_eq!(service.state.todos.access().breaker().counts().total_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_replica_unreachable_at_startup_falls_back_to_primary() {
    let config = with_replica(test_config());
    let connector = FlakyConnector::new().unreachable(Role::Replica);
    let service = start(&config, &connector).await.unwrap();
    let app = router(&service, &config);

    assert_eq!(service.connections.read_target(), ReadTarget::Primary);
    assert!(Arc::ptr_eq(&service.connections.select_for_read(), service.connections.primary()));

    send(&app, Method::POST, "/todos", Some(r#"{"task":"buy milk"}"#)).await;
    let (status, body) = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"[{"id":1,"task":"buy milk","completed":false}]"#);
}

#[tokio::test(start_paused = true)]
async fn test_primary_unreachable_at_startup_is_fatal() {
    let config = with_replica(test_config());
    let connector = FlakyConnector::new().unreachable(Role::Primary);

    match start(&config, &connector).await {
        Err(StartupError::Connect(e)) => assert!(e.to_string().contains("primary")),
        Err(other) => panic!("unexpected startup error: {other}"),
        Ok(_) => panic!("startup should fail without a primary"),
    }
}

#[tokio::test]
async fn test_reads_use_replica_and_may_lag() {
    let config = with_replica(test_config());
    let connector = FlakyConnector::new();
    let service = start(&config, &connector).await.unwrap();
    let app = router(&service, &config);

    assert_eq!(service.connections.read_target(), ReadTarget::Replica);

    // Separate stores stand in for a replica that has not caught up.
    let (status, _) = send(&app, Method::POST, "/todos", Some(r#"{"task":"buy milk"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, body) = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_healthz_fails_when_primary_down() {
    let config = test_config();
    let connector = FlakyConnector::new();
    let service = start(&config, &connector).await.unwrap();
    let app = router(&service, &config);

    let (status, body) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "OK"));

    connector.primary.fail();
    let (status, body) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Database connection failed"));
}

#[tokio::test]
async fn test_healthz_tolerates_replica_down() {
    let config = with_replica(test_config());
    let connector = FlakyConnector::new();
    let service = start(&config, &connector).await.unwrap();
    let app = router(&service, &config);

    connector.replica.fail();
    let (status, body) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "OK"));
    assert!(connector.replica.calls() > 0);
}

#[tokio::test]
async fn test_healthz_bypasses_open_breaker() {
    let config = test_config();
    let connector = FlakyConnector::new();
    let service = start(&config, &connector).await.unwrap();
    let app = router(&service, &config);

    let breaker = service.state.todos.access().breaker();
    for _ in 0..3 {
        let _ = breaker.call(|| async { Err::<(), _>("injected") }).await;
    }
    assert_eq!(breaker.state(), CircuitState::Open);

    let (status, _) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
}
