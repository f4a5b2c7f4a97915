use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Change events ---

/// Kind of recent change carried by the stream. Only `New` and `Edit` are
/// actionable; everything else (log entries, categorization churn) collapses
/// into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    New,
    Edit,
    #[serde(other)]
    Other,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::New => write!(f, "new"),
            ChangeType::Edit => write!(f, "edit"),
            ChangeType::Other => write!(f, "other"),
        }
    }
}

/// Wire form of a `recentchange` payload from the event stream. The nested
/// `length`/`revision` pairs are absent for log events and partially absent
/// for page creations.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentChange {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub minor: bool,
    #[serde(default)]
    pub namespace: i64,
    pub title: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub length: Option<LengthPair>,
    #[serde(default)]
    pub revision: Option<RevisionPair>,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub server_name: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LengthPair {
    #[serde(default)]
    pub old: Option<i64>,
    #[serde(default)]
    pub new: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RevisionPair {
    #[serde(default)]
    pub old: Option<i64>,
    #[serde(default)]
    pub new: Option<i64>,
}

/// A single change event as the pipeline sees it. Absent wire fields are
/// already normalized to zero, so `old_revision_id == 0` is the brand-new-page
/// signal and `delta()` is always defined.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub change_type: ChangeType,
    pub bot: bool,
    pub minor: bool,
    pub namespace: i64,
    pub title: String,
    pub user: String,
    pub summary: String,
    pub length_old: i64,
    pub length_new: i64,
    pub old_revision_id: i64,
    pub revision_id: i64,
    pub server_name: String,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    /// Signed byte-size change of the edit. The only size measure used
    /// anywhere in the pipeline.
    pub fn delta(&self) -> i64 {
        self.length_new - self.length_old
    }

    pub fn is_new_page(&self) -> bool {
        self.old_revision_id == 0
    }
}

impl From<RecentChange> for ChangeEvent {
    fn from(rc: RecentChange) -> Self {
        let (length_old, length_new) = match rc.length {
            Some(l) => (l.old.unwrap_or(0), l.new.unwrap_or(0)),
            None => (0, 0),
        };
        let (old_revision_id, revision_id) = match rc.revision {
            Some(r) => (r.old.unwrap_or(0), r.new.unwrap_or(0)),
            None => (0, 0),
        };

        Self {
            change_type: rc.change_type,
            bot: rc.bot,
            minor: rc.minor,
            namespace: rc.namespace,
            title: rc.title,
            user: rc.user,
            summary: rc.comment,
            length_old,
            length_new,
            old_revision_id,
            revision_id,
            server_name: rc.server_name,
            timestamp: DateTime::from_timestamp(rc.timestamp, 0).unwrap_or_default(),
        }
    }
}

// --- Subscriptions ---

/// A subscription key: every delivery rule hangs off either a whole namespace
/// or one exact page title.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Goal {
    Namespace(i64),
    Title(String),
}

impl Goal {
    /// Key form used in the persisted document: `<N>` for namespaces, the raw
    /// title otherwise.
    pub fn storage_key(&self) -> String {
        match self {
            Goal::Namespace(ns) => format!("<{ns}>"),
            Goal::Title(title) => title.clone(),
        }
    }

    /// Inverse of [`storage_key`](Self::storage_key). Total: anything that is
    /// not a bracketed integer is a title.
    pub fn from_storage_key(key: &str) -> Goal {
        if let Some(inner) = key.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) {
            if let Ok(ns) = inner.parse::<i64>() {
                return Goal::Namespace(ns);
            }
        }
        Goal::Title(key.to_string())
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Namespace(ns) => write!(f, "<{ns}>"),
            Goal::Title(title) => write!(f, "{title}"),
        }
    }
}

/// Where to deliver matching changes, with an optional minimum size delta.
/// `min_length` is normalized on construction: any negative threshold means
/// "no size filter", matching the persisted canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRule {
    pub destination: String,
    pub min_length: Option<i64>,
}

impl DeliveryRule {
    pub fn new(destination: impl Into<String>, min_length: Option<i64>) -> Self {
        Self {
            destination: destination.into(),
            min_length: min_length.filter(|n| *n >= 0),
        }
    }

    /// Canonical persisted form: `"<destination>"` or
    /// `"<destination>|<minLength>"`. Rules are deduplicated by exact
    /// canonical equality.
    pub fn canonical(&self) -> String {
        match self.min_length {
            Some(min) => format!("{}|{min}", self.destination),
            None => self.destination.clone(),
        }
    }

    /// Parse a persisted rule string. Returns `None` for malformed entries
    /// (empty destination, non-numeric threshold) so loading can skip them.
    pub fn parse(raw: &str) -> Option<DeliveryRule> {
        let (destination, min_length) = match raw.split_once('|') {
            Some((dest, min)) => (dest, Some(min.parse::<i64>().ok()?)),
            None => (raw, None),
        };
        if destination.is_empty() {
            return None;
        }
        Some(DeliveryRule::new(destination, min_length))
    }
}

// --- Notifications ---

/// Destination-agnostic notification built by the formatter. Backends map
/// this onto their own message shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPayload {
    pub title: String,
    pub title_url: String,
    pub icon_url: String,
    pub color: u32,
    pub footer: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_type_catches_unknown_variants() {
        let edit: ChangeType = serde_json::from_str("\"edit\"").unwrap();
        let new: ChangeType = serde_json::from_str("\"new\"").unwrap();
        let log: ChangeType = serde_json::from_str("\"log\"").unwrap();
        let categorize: ChangeType = serde_json::from_str("\"categorize\"").unwrap();

        assert_eq!(edit, ChangeType::Edit);
        assert_eq!(new, ChangeType::New);
        assert_eq!(log, ChangeType::Other);
        assert_eq!(categorize, ChangeType::Other);
    }

    #[test]
    fn recent_change_converts_with_nested_pairs() {
        let raw = r#"{
            "type": "edit",
            "namespace": 0,
            "title": "Earth",
            "comment": "fix typo",
            "timestamp": 1712345678,
            "user": "203.0.113.7",
            "bot": false,
            "minor": true,
            "length": {"old": 1000, "new": 1120},
            "revision": {"old": 55, "new": 56},
            "server_name": "en.wikipedia.org"
        }"#;

        let event: ChangeEvent = serde_json::from_str::<RecentChange>(raw).unwrap().into();
        assert_eq!(event.change_type, ChangeType::Edit);
        assert_eq!(event.delta(), 120);
        assert_eq!(event.old_revision_id, 55);
        assert!(!event.is_new_page());
        assert!(event.minor);
        assert_eq!(event.timestamp.timestamp(), 1712345678);
    }

    #[test]
    fn new_page_defaults_missing_old_fields_to_zero() {
        let raw = r#"{
            "type": "new",
            "namespace": 0,
            "title": "Brand New",
            "user": "Someone",
            "length": {"new": 430},
            "revision": {"new": 99},
            "server_name": "en.wikipedia.org"
        }"#;

        let event: ChangeEvent = serde_json::from_str::<RecentChange>(raw).unwrap().into();
        assert_eq!(event.length_old, 0);
        assert_eq!(event.delta(), 430);
        assert!(event.is_new_page());
        assert_eq!(event.summary, "");
    }

    #[test]
    fn goal_storage_key_round_trips() {
        assert_eq!(Goal::Namespace(0).storage_key(), "<0>");
        assert_eq!(Goal::from_storage_key("<10>"), Goal::Namespace(10));
        assert_eq!(
            Goal::from_storage_key("Earth"),
            Goal::Title("Earth".to_string())
        );
        // A title that merely looks bracketed stays a title.
        assert_eq!(
            Goal::from_storage_key("<not a number>"),
            Goal::Title("<not a number>".to_string())
        );
    }

    #[test]
    fn delivery_rule_canonical_round_trips() {
        let plain = DeliveryRule::parse("123456").unwrap();
        assert_eq!(plain.min_length, None);
        assert_eq!(plain.canonical(), "123456");

        let filtered = DeliveryRule::parse("123456|100").unwrap();
        assert_eq!(filtered.min_length, Some(100));
        assert_eq!(filtered.canonical(), "123456|100");
    }

    #[test]
    fn delivery_rule_normalizes_negative_threshold() {
        let rule = DeliveryRule::new("123456", Some(-1));
        assert_eq!(rule.min_length, None);
        assert_eq!(rule, DeliveryRule::new("123456", None));
    }

    #[test]
    fn delivery_rule_rejects_malformed_entries() {
        assert!(DeliveryRule::parse("").is_none());
        assert!(DeliveryRule::parse("123456|lots").is_none());
    }
}
