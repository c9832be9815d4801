use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use globalscore::{build_router, users::UserService, AppState, InMemoryStore};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub store: Arc<InMemoryStore>,
    pub state: AppState,
    pub router: Router,
    pub users: HashMap<String, Uuid>,
}

pub struct TestSetupBuilder {
    users: Vec<String>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self { users: vec![] }
    }

    /// Users are registered in the given order, so earlier names are older accounts
    pub fn with_users(mut self, users: Vec<&str>) -> Self {
        self.users = users.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_users(self) -> Self {
        self.with_users(vec!["ana", "beto"])
    }

    pub async fn build(self) -> TestSetup {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::from_store(store.clone());
        let service = UserService::new(Arc::clone(&state.user_repository));

        let mut users = HashMap::new();
        for name in &self.users {
            let user = service.register_user(name).await.unwrap();
            users.insert(name.clone(), user.id);
            // Distinct creation instants keep tie-breaks deterministic
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        TestSetup {
            router: build_router(state.clone()),
            store,
            state,
            users,
        }
    }
}

impl TestSetup {
    pub fn user_id(&self, name: &str) -> Uuid {
        *self
            .users
            .get(name)
            .unwrap_or_else(|| panic!("user {} was not registered", name))
    }
}
