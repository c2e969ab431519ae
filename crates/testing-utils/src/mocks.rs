//! Mock implementations for the repository traits
//!
//! In-memory implementations that honor the same contracts as the SQLite
//! repositories: transitions run read-verify-write under a single lock
//! (serializing racing callers), and ranked lists are write-once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use dispatch_core::{DispatchError, DispatchResult};
use dispatch_domain::entities::{HelpRequest, RankedList, VolunteerRecord};
use dispatch_domain::repositories::{
    HelpRequestRepository, RankedListRepository, TransitionGuard, VolunteerRepository,
};

/// Mock implementation of HelpRequestRepository
///
/// The store mutex is held across the whole read-verify-write, so concurrent
/// transitions on one request are linearized exactly like the SQLite guard.
#[derive(Clone, Default)]
pub struct MockHelpRequestRepository {
    requests: Arc<Mutex<HashMap<String, HelpRequest>>>,
    rankings: Arc<Mutex<HashMap<String, RankedList>>>,
}

impl MockHelpRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share the ranking store with a [`MockRankedListRepository`] so that
    /// transitions observe lists created through that repository.
    pub fn with_ranking_store(rankings: Arc<Mutex<HashMap<String, RankedList>>>) -> Self {
        Self {
            requests: Arc::new(Mutex::new(HashMap::new())),
            rankings,
        }
    }

    pub fn insert(&self, request: HelpRequest) {
        self.requests
            .lock()
            .unwrap()
            .insert(request.id.clone(), request);
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HelpRequestRepository for MockHelpRequestRepository {
    async fn create(&self, request: &HelpRequest) -> DispatchResult<HelpRequest> {
        let mut requests = self.requests.lock().unwrap();
        requests.insert(request.id.clone(), request.clone());
        Ok(request.clone())
    }

    async fn get_by_id(&self, request_id: &str) -> DispatchResult<Option<HelpRequest>> {
        let requests = self.requests.lock().unwrap();
        Ok(requests.get(request_id).cloned())
    }

    async fn transition(
        &self,
        request_id: &str,
        guard: TransitionGuard,
    ) -> DispatchResult<HelpRequest> {
        let mut requests = self.requests.lock().unwrap();
        let current = requests
            .get(request_id)
            .ok_or_else(|| DispatchError::RequestNotFound {
                id: request_id.to_string(),
            })?;

        let rankings = self.rankings.lock().unwrap();
        let ranking = rankings.get(request_id);

        let mut updated = guard(current, ranking)?;
        updated.version = current.version + 1;
        updated.updated_at = chrono::Utc::now();
        requests.insert(request_id.to_string(), updated.clone());
        Ok(updated)
    }
}

/// Mock implementation of RankedListRepository (write-once)
#[derive(Clone, Default)]
pub struct MockRankedListRepository {
    rankings: Arc<Mutex<HashMap<String, RankedList>>>,
}

impl MockRankedListRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose the backing store for sharing with [`MockHelpRequestRepository`].
    pub fn store(&self) -> Arc<Mutex<HashMap<String, RankedList>>> {
        Arc::clone(&self.rankings)
    }
}

#[async_trait]
impl RankedListRepository for MockRankedListRepository {
    async fn create(&self, list: &RankedList) -> DispatchResult<()> {
        let mut rankings = self.rankings.lock().unwrap();
        if rankings.contains_key(&list.request_id) {
            return Err(DispatchError::RankingExists {
                id: list.request_id.clone(),
            });
        }
        rankings.insert(list.request_id.clone(), list.clone());
        Ok(())
    }

    async fn get_by_request_id(&self, request_id: &str) -> DispatchResult<Option<RankedList>> {
        let rankings = self.rankings.lock().unwrap();
        Ok(rankings.get(request_id).cloned())
    }
}

/// Mock implementation of VolunteerRepository
#[derive(Clone, Default)]
pub struct MockVolunteerRepository {
    volunteers: Arc<Mutex<Vec<VolunteerRecord>>>,
}

impl MockVolunteerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_volunteers(volunteers: Vec<VolunteerRecord>) -> Self {
        Self {
            volunteers: Arc::new(Mutex::new(volunteers)),
        }
    }

    pub fn insert(&self, volunteer: VolunteerRecord) {
        self.volunteers.lock().unwrap().push(volunteer);
    }
}

#[async_trait]
impl VolunteerRepository for MockVolunteerRepository {
    async fn get_approved_volunteers(&self) -> DispatchResult<Vec<VolunteerRecord>> {
        let volunteers = self.volunteers.lock().unwrap();
        Ok(volunteers
            .iter()
            .filter(|v| v.is_volunteer && v.volunteer_status == "approved")
            .cloned()
            .collect())
    }
}
