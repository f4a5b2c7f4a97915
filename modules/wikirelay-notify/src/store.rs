//! Subscription store: which changes go to which destinations.
//!
//! The persisted form is one JSON document mapping a goal key (bracketed
//! namespace or exact page title) to an ordered list of rule strings
//! (`"<destination>"` or `"<destination>|<minLength>"`). Every mutation is
//! written through before it returns; memory and disk never disagree.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{info, warn};

use wikirelay_common::error::RelayError;
use wikirelay_common::types::{DeliveryRule, Goal};

type RuleMap = BTreeMap<Goal, Vec<DeliveryRule>>;

pub struct SubscriptionStore {
    path: PathBuf,
    /// `None` when the document was absent or unreadable at startup: the
    /// store runs degraded and every operation is a no-op.
    inner: Mutex<Option<RuleMap>>,
}

impl SubscriptionStore {
    /// Load the persisted document. A missing file is not fatal; the host
    /// process keeps running with notifications disabled.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let inner = match fs::read_to_string(&path) {
            Ok(raw) => match parse_document(&raw) {
                Ok(map) => {
                    info!(path = %path.display(), goals = map.len(), "Loaded subscriptions");
                    Some(map)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Subscription document unreadable, notifications disabled");
                    None
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "No subscription document, notifications disabled");
                None
            }
        };
        Self {
            path,
            inner: Mutex::new(inner),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    /// Rules for one goal, in stored order. Empty when the goal has none or
    /// the store is degraded.
    pub fn rules_for(&self, goal: &Goal) -> Vec<DeliveryRule> {
        self.lock()
            .as_ref()
            .and_then(|map| map.get(goal))
            .cloned()
            .unwrap_or_default()
    }

    /// Append a delivery rule under a goal and persist. `Ok(false)` when the
    /// identical rule already exists or the store is degraded. A failed write
    /// rolls the in-memory change back and surfaces the error, so a rule the
    /// caller was told about is always on disk.
    pub fn add_rule(
        &self,
        goal: &Goal,
        destination: &str,
        min_length: Option<i64>,
    ) -> Result<bool, RelayError> {
        let mut guard = self.lock();
        let Some(map) = guard.as_mut() else {
            return Ok(false);
        };

        let rule = DeliveryRule::new(destination, min_length);
        let rules = map.entry(goal.clone()).or_default();
        if rules.contains(&rule) {
            return Ok(false);
        }
        rules.push(rule);

        if let Err(e) = write_document(&self.path, map) {
            let rules = map.entry(goal.clone()).or_default();
            rules.pop();
            if rules.is_empty() {
                map.remove(goal);
            }
            return Err(e);
        }

        info!(goal = %goal, destination, "Subscription rule added");
        Ok(true)
    }

    /// Remove the rule matching the exact canonical form. No-op when the
    /// store is degraded or the goal is absent. A goal whose rule list
    /// empties is dropped entirely; an empty entry never persists. The
    /// document is rewritten even when no rule matched, as long as the goal
    /// existed.
    pub fn remove_rule(
        &self,
        goal: &Goal,
        destination: &str,
        min_length: Option<i64>,
    ) -> Result<bool, RelayError> {
        let mut guard = self.lock();
        let Some(map) = guard.as_mut() else {
            return Ok(false);
        };

        let canonical = DeliveryRule::new(destination, min_length).canonical();
        let Some(rules) = map.get_mut(goal) else {
            return Ok(false);
        };

        let undo = rules
            .iter()
            .position(|r| r.canonical() == canonical)
            .map(|idx| (idx, rules.remove(idx)));
        let removed = undo.is_some();
        if rules.is_empty() {
            map.remove(goal);
        }

        if let Err(e) = write_document(&self.path, map) {
            if let Some((idx, rule)) = undo {
                map.entry(goal.clone()).or_default().insert(idx, rule);
            }
            return Err(e);
        }

        if removed {
            info!(goal = %goal, destination, "Subscription rule removed");
        }
        Ok(removed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<RuleMap>> {
        self.inner
            .lock()
            .expect("subscription store lock poisoned")
    }
}

fn parse_document(raw: &str) -> Result<RuleMap, RelayError> {
    let doc: BTreeMap<String, Vec<String>> = serde_json::from_str(raw)?;

    let mut map = RuleMap::new();
    for (key, entries) in doc {
        let mut rules = Vec::with_capacity(entries.len());
        for entry in &entries {
            match DeliveryRule::parse(entry) {
                Some(rule) => rules.push(rule),
                None => warn!(goal = %key, entry = %entry, "Skipping malformed subscription rule"),
            }
        }
        if !rules.is_empty() {
            map.insert(Goal::from_storage_key(&key), rules);
        }
    }
    Ok(map)
}

fn write_document(path: &Path, map: &RuleMap) -> Result<(), RelayError> {
    let doc: BTreeMap<String, Vec<String>> = map
        .iter()
        .map(|(goal, rules)| {
            (
                goal.storage_key(),
                rules.iter().map(DeliveryRule::canonical).collect(),
            )
        })
        .collect();

    let raw = serde_json::to_string_pretty(&doc)?;
    fs::write(path, raw)
        .map_err(|e| RelayError::Persistence(format!("cannot write {}: {e}", path.display())))?;
    Ok(())
}
