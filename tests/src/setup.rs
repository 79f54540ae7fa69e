//! Common test setup functions.

use api::{router, AppState};
use axum::Router;
use axum_test::TestServer;
use dashboard_core::RuleSet;
use rollup_engine::{memory::InMemoryStore, Dashboard};
use std::sync::Arc;

use crate::fixtures;
use crate::mocks::{ContendedClassifications, FlakyFacts};

/// Test context running the real router over seeded in-memory stores.
///
/// The fact repository and the classification store are wrapped so tests
/// can inject outages and write conflicts.
pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub facts: FlakyFacts,
    pub classifications: ContendedClassifications,
    pub router: Router,
}

impl TestContext {
    /// Context seeded with [`fixtures::seed`].
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        fixtures::seed(&store);
        Self::with_store(store)
    }

    pub fn with_store(store: Arc<InMemoryStore>) -> Self {
        let facts = FlakyFacts::new(store.clone());
        let classifications = ContendedClassifications::new(store.clone());

        let dashboard = Dashboard::new(
            Arc::new(facts.clone()),
            Arc::new(classifications.clone()),
            store.clone(),
            RuleSet::builtin(),
        );
        let router = router(AppState::new(dashboard));

        Self {
            store,
            facts,
            classifications,
            router,
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
