//! In-memory fakes shared by the orchestration test suites.
//!
//! Hand-rolled like the per-module mocks elsewhere in this crate, but
//! hoisted here because the policy, orchestrator, and gateway tests all
//! exercise the same store/client/renderer trio.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use awayline_types::activity::{ActivityLogEntry, ActivityPage, NewActivityLog};
use awayline_types::error::{GatewayError, ProtocolError, StoreError};
use awayline_types::event::GatewayEvent;
use awayline_types::protocol::{ClientEvent, ContactInfo};
use awayline_types::session::{DEFAULT_AUTO_REPLY_MESSAGE, Session};
use awayline_types::user::UserId;
use chrono::Utc;
use tokio::sync::{broadcast, mpsc};

use crate::protocol::{ClientFactory, PairingRenderer, ProtocolClient};
use crate::store::SessionStore;

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory `SessionStore` with injectable outages.
pub struct MemoryStore {
    sessions: Mutex<HashMap<i64, Session>>,
    activity: Mutex<Vec<ActivityLogEntry>>,
    next_session_id: AtomicUsize,
    next_activity_id: AtomicUsize,
    outage_remaining: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            activity: Mutex::new(Vec::new()),
            next_session_id: AtomicUsize::new(1),
            next_activity_id: AtomicUsize::new(1),
            outage_remaining: AtomicUsize::new(0),
        }
    }

    /// Make the next `calls` store operations fail with `Unavailable`.
    pub fn fail_next(&self, calls: usize) {
        self.outage_remaining.store(calls, Ordering::SeqCst);
    }

    /// Insert a session row directly, bypassing the trait.
    pub fn seed_session(&self, user_id: UserId, is_active: bool, is_paused: bool) -> Session {
        let session = Session {
            id: self.next_session_id.fetch_add(1, Ordering::SeqCst) as i64,
            user_id,
            session_data: None,
            is_active,
            is_paused,
            auto_reply_message: DEFAULT_AUTO_REPLY_MESSAGE.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(user_id.as_i64(), session.clone());
        session
    }

    /// Snapshot of a user's session row.
    pub fn session(&self, user_id: UserId) -> Option<Session> {
        self.sessions.lock().unwrap().get(&user_id.as_i64()).cloned()
    }

    /// Snapshot of a user's activity rows, insertion order.
    pub fn activity_for(&self, user_id: UserId) -> Vec<ActivityLogEntry> {
        self.activity
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect()
    }

    fn gate(&self) -> Result<(), StoreError> {
        loop {
            let remaining = self.outage_remaining.load(Ordering::SeqCst);
            if remaining == 0 {
                return Ok(());
            }
            if self
                .outage_remaining
                .compare_exchange(remaining, remaining - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Err(StoreError::Unavailable("injected outage".to_string()));
            }
        }
    }
}

impl SessionStore for MemoryStore {
    async fn get_session(&self, user_id: UserId) -> Result<Option<Session>, StoreError> {
        self.gate()?;
        Ok(self.sessions.lock().unwrap().get(&user_id.as_i64()).cloned())
    }

    async fn upsert_session_defaults(&self, user_id: UserId) -> Result<Session, StoreError> {
        self.gate()?;
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(existing) = sessions.get(&user_id.as_i64()) {
            return Ok(existing.clone());
        }
        let session = Session {
            id: self.next_session_id.fetch_add(1, Ordering::SeqCst) as i64,
            user_id,
            session_data: None,
            is_active: false,
            is_paused: false,
            auto_reply_message: DEFAULT_AUTO_REPLY_MESSAGE.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        sessions.insert(user_id.as_i64(), session.clone());
        Ok(session)
    }

    async fn set_active(&self, user_id: UserId, active: bool) -> Result<(), StoreError> {
        self.gate()?;
        if let Some(session) = self.sessions.lock().unwrap().get_mut(&user_id.as_i64()) {
            session.is_active = active;
            session.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn toggle_paused(&self, user_id: UserId) -> Result<bool, StoreError> {
        self.gate()?;
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(&user_id.as_i64())
            .ok_or(StoreError::NotFound)?;
        session.is_paused = !session.is_paused;
        session.updated_at = Utc::now();
        Ok(session.is_paused)
    }

    async fn set_auto_reply_message(
        &self,
        user_id: UserId,
        message: &str,
    ) -> Result<(), StoreError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(StoreError::InvalidMessage(
                "message cannot be empty".to_string(),
            ));
        }
        self.gate()?;
        if let Some(session) = self.sessions.lock().unwrap().get_mut(&user_id.as_i64()) {
            session.auto_reply_message = trimmed.to_string();
            session.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn append_activity(&self, entry: &NewActivityLog) -> Result<(), StoreError> {
        self.gate()?;
        self.activity.lock().unwrap().push(ActivityLogEntry {
            id: self.next_activity_id.fetch_add(1, Ordering::SeqCst) as i64,
            user_id: entry.user_id,
            contact_number: entry.contact_number.clone(),
            message_received: entry.message_received.clone(),
            replied_sent: entry.replied_sent.clone(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn list_activity(
        &self,
        user_id: UserId,
        page: u32,
        limit: u32,
    ) -> Result<ActivityPage, StoreError> {
        self.gate()?;
        let page = page.max(1);
        let limit = limit.max(1);

        let mut rows: Vec<ActivityLogEntry> = self
            .activity
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        let total = rows.len() as i64;
        let offset = ((page - 1) * limit) as usize;
        let logs = rows.into_iter().skip(offset).take(limit as usize).collect();

        Ok(ActivityPage {
            logs,
            total,
            page,
            total_pages: ActivityPage::page_count(total, limit),
        })
    }

    async fn list_active_sessions(&self) -> Result<Vec<UserId>, StoreError> {
        self.gate()?;
        let mut ids: Vec<UserId> = self
            .sessions
            .lock()
            .unwrap()
            .values()
            .filter(|session| session.is_active)
            .map(|session| session.user_id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

// ---------------------------------------------------------------------------
// ScriptedClient / ScriptedFactory
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ClientState {
    replies: Mutex<Vec<(String, String)>>,
    contacts: Mutex<HashMap<String, ContactInfo>>,
    destroyed: AtomicBool,
    connect_calls: AtomicUsize,
    fail_connect: AtomicBool,
    fail_send: AtomicBool,
}

/// Protocol client fake that records every call and fails on demand.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    state: Arc<ClientState>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the contact resolved for a conversation.
    pub fn set_contact(&self, conversation_id: &str, number: &str, known: bool) {
        self.state.contacts.lock().unwrap().insert(
            conversation_id.to_string(),
            ContactInfo {
                number: number.to_string(),
                is_known_contact: known,
            },
        );
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.state.fail_send.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.state.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// (conversation_id, text) pairs sent so far.
    pub fn replies(&self) -> Vec<(String, String)> {
        self.state.replies.lock().unwrap().clone()
    }

    pub fn destroyed(&self) -> bool {
        self.state.destroyed.load(Ordering::SeqCst)
    }

    pub fn connect_calls(&self) -> usize {
        self.state.connect_calls.load(Ordering::SeqCst)
    }
}

impl ProtocolClient for ScriptedClient {
    async fn connect(&self) -> Result<(), ProtocolError> {
        self.state.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(ProtocolError::Connect("scripted connect failure".to_string()));
        }
        Ok(())
    }

    async fn send_reply(&self, conversation_id: &str, text: &str) -> Result<(), ProtocolError> {
        if self.state.fail_send.load(Ordering::SeqCst) {
            return Err(ProtocolError::Send("scripted send failure".to_string()));
        }
        self.state
            .replies
            .lock()
            .unwrap()
            .push((conversation_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn contact_info(&self, conversation_id: &str) -> Result<ContactInfo, ProtocolError> {
        let contacts = self.state.contacts.lock().unwrap();
        Ok(contacts
            .get(conversation_id)
            .cloned()
            .unwrap_or_else(|| ContactInfo {
                number: conversation_id.to_string(),
                is_known_contact: false,
            }))
    }

    async fn destroy(&self) -> Result<(), ProtocolError> {
        self.state.destroyed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct FactoryState {
    clients: Mutex<HashMap<i64, ScriptedClient>>,
    senders: Mutex<HashMap<i64, mpsc::Sender<ClientEvent>>>,
    build_count: AtomicUsize,
    fail_build: AtomicBool,
    fail_build_for: Mutex<HashSet<i64>>,
    fail_connect: AtomicBool,
}

/// Factory that hands out `ScriptedClient`s and keeps the event senders so
/// tests can push protocol events after the session is running.
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    state: Arc<FactoryState>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_builds(&self, fail: bool) {
        self.state.fail_build.store(fail, Ordering::SeqCst);
    }

    /// Fail builds for this user only.
    pub fn fail_builds_for(&self, user_id: UserId) {
        self.state
            .fail_build_for
            .lock()
            .unwrap()
            .insert(user_id.as_i64());
    }

    /// Built clients fail their `connect` call.
    pub fn fail_connects(&self, fail: bool) {
        self.state.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn build_count(&self) -> usize {
        self.state.build_count.load(Ordering::SeqCst)
    }

    /// The client built for this user. Panics if none was built.
    pub fn client(&self, user_id: UserId) -> ScriptedClient {
        self.state
            .clients
            .lock()
            .unwrap()
            .get(&user_id.as_i64())
            .cloned()
            .expect("no client built for user")
    }

    /// Push a protocol event into the user's drive task.
    pub async fn emit(&self, user_id: UserId, event: ClientEvent) {
        let sender = self
            .state
            .senders
            .lock()
            .unwrap()
            .get(&user_id.as_i64())
            .cloned()
            .expect("no client built for user");
        sender.send(event).await.expect("event receiver dropped");
    }
}

impl ClientFactory for ScriptedFactory {
    type Client = ScriptedClient;

    async fn build(
        &self,
        user_id: UserId,
    ) -> Result<(ScriptedClient, mpsc::Receiver<ClientEvent>), ProtocolError> {
        self.state.build_count.fetch_add(1, Ordering::SeqCst);
        let user_fails = self
            .state
            .fail_build_for
            .lock()
            .unwrap()
            .contains(&user_id.as_i64());
        if self.state.fail_build.load(Ordering::SeqCst) || user_fails {
            return Err(ProtocolError::Connect("scripted build failure".to_string()));
        }

        let client = ScriptedClient::new();
        if self.state.fail_connect.load(Ordering::SeqCst) {
            client.set_fail_connect(true);
        }

        let (tx, rx) = mpsc::channel(16);
        self.state
            .clients
            .lock()
            .unwrap()
            .insert(user_id.as_i64(), client.clone());
        self.state.senders.lock().unwrap().insert(user_id.as_i64(), tx);
        Ok((client, rx))
    }
}

// ---------------------------------------------------------------------------
// EchoRenderer
// ---------------------------------------------------------------------------

/// Renderer that tags the payload instead of producing a real image.
pub struct EchoRenderer;

impl PairingRenderer for EchoRenderer {
    fn render(&self, code: &str) -> Result<String, GatewayError> {
        Ok(format!("rendered:{code}"))
    }
}

// ---------------------------------------------------------------------------
// Broadcast helpers
// ---------------------------------------------------------------------------

/// Wait until `rx` yields an event matching `predicate`.
///
/// Broadcasts fire after the store writes they announce, so receiving one
/// doubles as a synchronization barrier for asserting on store state.
pub async fn expect_event(
    rx: &mut broadcast::Receiver<GatewayEvent>,
    predicate: impl Fn(&GatewayEvent) -> bool,
) -> GatewayEvent {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) => continue,
                Err(err) => panic!("broadcast closed while waiting: {err}"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
