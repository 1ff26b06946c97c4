//! Process-local store used with `PD_STORE=memory` and in tests.
//!
//! One async mutex per collection; every repository call holds its locks for
//! the whole operation. When an operation needs two collections it locks
//! shipments before medications and users before sessions.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI32, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use patient_dashboard_core::{MedicationId, ShipmentId, UserId, WeightRecordId};

use crate::models::{Medication, Shipment, User, WeightRecord};

/// A user row together with its password hash.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: Option<String>,
}

/// A session token row, keyed by token digest.
#[derive(Debug, Clone, Copy)]
pub struct StoredSession {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

/// In-memory collections.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: AtomicI32,
    pub users: Mutex<BTreeMap<UserId, StoredUser>>,
    pub sessions: Mutex<HashMap<String, StoredSession>>,
    pub medications: Mutex<BTreeMap<MedicationId, Medication>>,
    pub shipments: Mutex<BTreeMap<ShipmentId, Shipment>>,
    pub weight_records: Mutex<BTreeMap<WeightRecordId, WeightRecord>>,
}

impl MemoryStore {
    /// Next identifier, shared across collections and never reused.
    pub fn next_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}
