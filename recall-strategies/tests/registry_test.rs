//! Unit tests for StrategyRegistry: kind lookup and the session-type
//! default table.

mod common;

use std::sync::Arc;

use common::MockModelClient;
use recall_core::{SessionType, StrategyKind};
use recall_strategies::StrategyRegistry;

fn registry() -> StrategyRegistry {
    StrategyRegistry::with_defaults(Arc::new(MockModelClient::new("recap")))
}

#[test]
fn test_defaults_register_all_kinds() {
    let registry = registry();
    for kind in [
        StrategyKind::RollingWindow,
        StrategyKind::Summarization,
        StrategyKind::SemanticSelection,
        StrategyKind::ImportanceBased,
        StrategyKind::Hybrid,
    ] {
        assert!(registry.get(kind).is_some(), "missing strategy {kind:?}");
    }
    assert_eq!(registry.kinds().len(), 5);
}

#[test]
fn test_session_type_table() {
    let registry = registry();
    assert_eq!(
        registry.for_session_type(SessionType::Chat).unwrap().kind(),
        StrategyKind::Hybrid
    );
    assert_eq!(
        registry.for_session_type(SessionType::Task).unwrap().kind(),
        StrategyKind::ImportanceBased
    );
    assert_eq!(
        registry.for_session_type(SessionType::Workflow).unwrap().kind(),
        StrategyKind::Summarization
    );
    assert_eq!(
        registry
            .for_session_type(SessionType::Collaborative)
            .unwrap()
            .kind(),
        StrategyKind::RollingWindow
    );
}

#[test]
fn test_empty_registry_resolves_nothing() {
    let registry = StrategyRegistry::new();
    assert!(registry.get(StrategyKind::RollingWindow).is_none());
    assert!(registry.for_session_type(SessionType::Chat).is_none());
}
