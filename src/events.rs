//! change notifications
//!
//! the builder session emits one event per accepted action. hosts register
//! subscribers with type filters and drain their channel after each call;
//! events are sent synchronously, before the mutating call returns.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::validate::Issue;
use crate::wire::WireGroup;

/// default size of the recent-events buffer
pub const DEFAULT_RECENT_EVENTS: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// all supported event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventType {
    /// a payload was loaded into the session
    #[serde(rename = "filter.ready")]
    Ready,
    /// an accepted mutation changed the tree
    #[serde(rename = "filter.changed")]
    Changed,
    /// the current tree was committed as the applied filter
    #[serde(rename = "filter.applied")]
    Applied,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Ready => "filter.ready",
            EventType::Changed => "filter.changed",
            EventType::Applied => "filter.applied",
        }
    }

    pub fn all() -> &'static [EventType] {
        &[EventType::Ready, EventType::Changed, EventType::Applied]
    }

    pub fn description(&self) -> &'static str {
        match self {
            EventType::Ready => "Filter payload loaded",
            EventType::Changed => "Filter tree changed",
            EventType::Applied => "Filter applied",
        }
    }

    pub fn parse(s: &str) -> Option<EventType> {
        match s {
            "filter.ready" => Some(EventType::Ready),
            "filter.changed" => Some(EventType::Changed),
            "filter.applied" => Some(EventType::Applied),
            _ => None,
        }
    }

    /// check if this event type matches a filter pattern
    /// patterns: "*", "filter.*", or exact match
    pub fn matches_filter(&self, filter: &str) -> bool {
        let type_str = self.as_str();

        if filter == "*" {
            return true;
        }

        if let Some(prefix) = filter.strip_suffix(".*") {
            return type_str.starts_with(prefix)
                && type_str[prefix.len()..].starts_with('.');
        }

        type_str == filter
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Event
// ============================================================================

/// the state announced with every event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    /// the action that produced the event ("add_condition", "undo", ...)
    pub action: String,
    pub wire_tree: WireGroup,
    pub is_valid: bool,
    pub issues: Vec<Issue>,
}

/// a single event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub ts: DateTime<Utc>,
    /// per-session sequence number, strictly increasing
    pub seq: u64,
    pub data: EventData,
}

impl Event {
    pub fn new(event_type: EventType, seq: u64, data: EventData) -> Self {
        Self {
            event_type,
            ts: Utc::now(),
            seq,
            data,
        }
    }

    /// check if this event matches any of the given filters (empty = all)
    pub fn matches_filters(&self, filters: &[String]) -> bool {
        filters.is_empty() || filters.iter().any(|f| self.event_type.matches_filter(f))
    }

    /// format event as JSON-RPC notification
    pub fn to_jsonrpc_notification(&self) -> String {
        serde_json::json!({
            "jsonrpc": "2.0",
            "method": "event",
            "params": self,
        })
        .to_string()
    }
}

// ============================================================================
// EventBus
// ============================================================================

struct Subscriber {
    /// event type filters (empty = all events)
    filters: Vec<String>,
    sender: mpsc::UnboundedSender<Event>,
}

/// subscriber registry owned by one session
pub struct EventBus {
    next_id: u64,
    subscribers: HashMap<u64, Subscriber>,
    recent: VecDeque<Event>,
    recent_limit: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_recent_limit(DEFAULT_RECENT_EVENTS)
    }

    pub fn with_recent_limit(recent_limit: usize) -> Self {
        Self {
            next_id: 1,
            subscribers: HashMap::new(),
            recent: VecDeque::new(),
            recent_limit,
        }
    }

    /// subscribe to events with filters
    /// returns (subscription_id, receiver)
    pub fn subscribe(&mut self, filters: Vec<String>) -> (u64, mpsc::UnboundedReceiver<Event>) {
        let id = self.next_id;
        self.next_id += 1;
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.insert(id, Subscriber { filters, sender });
        (id, receiver)
    }

    /// returns false if the id was not subscribed
    pub fn unsubscribe(&mut self, id: u64) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// deliver an event to all matching subscribers
    ///
    /// subscribers whose receiver was dropped are removed
    pub fn emit(&mut self, event: Event) {
        log::trace!("emit {} seq={}", event.event_type, event.seq);

        self.subscribers.retain(|id, subscriber| {
            if !event.matches_filters(&subscriber.filters) {
                return true;
            }
            let delivered = subscriber.sender.send(event.clone()).is_ok();
            if !delivered {
                log::debug!("dropping closed subscriber {}", id);
            }
            delivered
        });

        if self.recent_limit > 0 {
            self.recent.push_back(event);
            while self.recent.len() > self.recent_limit {
                self.recent.pop_front();
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// recently emitted events, oldest first
    pub fn recent(&self) -> impl Iterator<Item = &Event> {
        self.recent.iter()
    }

    /// expand filter patterns to actual event types
    pub fn expand_filters(filters: &[String]) -> Vec<String> {
        let all = || -> Vec<String> {
            EventType::all()
                .iter()
                .map(|e| e.as_str().to_string())
                .collect()
        };

        if filters.is_empty() || filters.iter().any(|f| f == "*") {
            return all();
        }

        let mut result = Vec::new();
        for filter in filters {
            if filter.ends_with(".*") {
                for event_type in EventType::all() {
                    if event_type.matches_filter(filter) {
                        result.push(event_type.as_str().to_string());
                    }
                }
            } else if EventType::parse(filter).is_some() {
                result.push(filter.clone());
            }
        }

        result.sort();
        result.dedup();
        result
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
