use ppa_core::TokenUsage;
use ppa_llm::{LLMError, ProviderEventBus, ProviderLifecycle};
use ppa_observability::{Config, Observability, ProviderMetricsCollector};

#[test]
fn test_lifecycle_requests_are_measured() {
    let bus = ProviderEventBus::new();
    let collector = ProviderMetricsCollector::attach(&bus);
    let lifecycle = ProviderLifecycle::new("ollama", bus.clone());

    lifecycle.begin_request(None).complete(Some(TokenUsage::new(20, 30)));
    lifecycle
        .begin_request(None)
        .fail(LLMError::Request("model not loaded".to_string()));
    let in_flight = lifecycle.begin_request(Some("slow".to_string()));

    let pending = collector.pending_requests();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].request_id, "slow");

    // Dropping the tracker reports a failure
    drop(in_flight);

    let metrics = collector.snapshot("ollama").unwrap();
    assert_eq!(metrics.total_requests, 3);
    assert_eq!(metrics.successful_requests, 1);
    assert_eq!(metrics.failed_requests, 2);
    assert_eq!(metrics.total_tokens, 50);
    assert!(collector.pending_requests().is_empty());
}

#[test]
fn test_health_checks_are_tracked_per_provider() {
    let bus = ProviderEventBus::new();
    let collector = ProviderMetricsCollector::attach(&bus);

    bus.emit_health_check("ollama", true, None);
    bus.emit_health_check("lmstudio", false, None);

    assert_eq!(collector.snapshot("ollama").unwrap().last_health, Some(true));
    assert_eq!(collector.snapshot("lmstudio").unwrap().last_health, Some(false));
    assert!(collector.snapshot("missing").is_none());
}

#[test]
fn test_observability_without_prometheus() {
    let bus = ProviderEventBus::new();
    let config = Config::default().with_prometheus(false);

    let obs = tokio_test::block_on(Observability::init(config, &bus)).unwrap();
    bus.emit_request_start("ollama", "r1");
    assert_eq!(
        obs.provider_metrics().snapshot("ollama").unwrap().total_requests,
        1
    );

    tokio_test::block_on(obs.shutdown()).unwrap();
    assert_eq!(bus.total_listeners(), 0);
}
