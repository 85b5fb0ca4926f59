use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use ration_core::{Advice, RationRecord};
use ration_world::RationContent;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// A computed ration as the service hands it back and keeps it in history.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRation {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: RationRecord,
    pub advice: Vec<Advice>,
}

pub type SharedHistory = Arc<Mutex<VecDeque<StoredRation>>>;

#[derive(Clone)]
pub struct AppState {
    pub content: Arc<RationContent>,
    pub history: SharedHistory,
    pub history_limit: usize,
}

impl AppState {
    pub fn new(content: RationContent, history_limit: usize) -> Self {
        Self {
            content: Arc::new(content),
            history: Arc::new(Mutex::new(VecDeque::with_capacity(history_limit))),
            history_limit,
        }
    }

    /// Stamps the record and keeps it, dropping the oldest past the limit.
    pub fn store(&self, record: RationRecord) -> StoredRation {
        let advice = record
            .balance
            .as_ref()
            .map(ration_core::BalanceReport::advice)
            .unwrap_or_default();
        let stored = StoredRation {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            record,
            advice,
        };
        if self.history_limit > 0 {
            let mut history = self.history.lock();
            while history.len() >= self.history_limit {
                history.pop_front();
            }
            history.push_back(stored.clone());
        }
        stored
    }

    pub fn recent(&self) -> Vec<StoredRation> {
        self.history.lock().iter().cloned().collect()
    }
}
