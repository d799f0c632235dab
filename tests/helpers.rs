#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use usergroups::forms::GroupForm;
use usergroups::models::*;
use usergroups::options::{GroupConfiguration, GroupRegistry};
use usergroups::services::{FormOutcome, GroupService, Notification, Notifier};
use usergroups::store::{GroupStore, MemoryStore};
use usergroups::views::GroupViews;
use usergroups::web::AppState;
use uuid::Uuid;

/// Keeps every notification for later inspection
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

/// In-memory store, one registered kind and three users.
///
/// `alice` creates groups in most tests; `bob` and `carol` start as outsiders.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub config: Arc<GroupConfiguration>,
    pub alice: User,
    pub bob: User,
    pub carol: User,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(GroupConfiguration::new("groups").with_notifications(true)).await
    }

    pub async fn with_config(config: GroupConfiguration) -> Self {
        let store = Arc::new(MemoryStore::new());
        let alice = store.create_user("alice", "alice@example.com").await.unwrap();
        let bob = store.create_user("bob", "bob@example.com").await.unwrap();
        let carol = store.create_user("carol", "carol@example.com").await.unwrap();

        Self {
            store,
            notifier: Arc::new(RecordingNotifier::default()),
            config: Arc::new(config),
            alice,
            bob,
            carol,
        }
    }

    pub fn service(&self) -> GroupService {
        GroupService::new(
            self.config.clone(),
            self.store.clone(),
            self.notifier.clone(),
        )
    }

    pub fn views(&self) -> GroupViews {
        GroupViews::new(self.service())
    }

    /// App state sharing this context's store, with the context's kind registered
    pub fn app_state(&self) -> AppState {
        let mut registry = GroupRegistry::new();
        registry
            .register(GroupConfiguration::new(self.config.slug.clone()))
            .unwrap();
        AppState::new(registry, self.store.clone(), self.notifier.clone())
    }

    /// Group created by `creator`
    pub async fn create_group(&self, creator: &User, name: &str) -> Group {
        let form = GroupForm {
            name: name.to_string(),
            description: None,
        };
        match self.service().create_group(creator.id, &form).await.unwrap() {
            FormOutcome::Saved(group) => group,
            FormOutcome::Invalid(errors) => panic!("invalid group form: {:?}", errors),
        }
    }

    pub async fn member_ids(&self, group_id: Uuid) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .store
            .list_members(group_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.user.id)
            .collect();
        ids.sort();
        ids
    }

    pub async fn admin_ids(&self, group_id: Uuid) -> Vec<Uuid> {
        let mut ids = self.store.admin_ids(group_id).await.unwrap();
        ids.sort();
        ids
    }
}

pub fn sorted(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort();
    ids
}
