//! Filter & dispatch: decides which destinations hear about a change and
//! delivers the formatted notification.
//!
//! One event is handled at a time, in arrival order. Deliveries for a single
//! event fan out concurrently; a slow or dead destination costs at most the
//! delivery timeout and never suppresses its siblings.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use wikirelay_common::linking::LinkBuilder;
use wikirelay_common::locale::Locale;
use wikirelay_common::types::{ChangeEvent, ChangeType, DeliveryRule, Goal};

use crate::backend::Notifier;
use crate::format;
use crate::store::SubscriptionStore;

/// Upper bound on a single delivery. A stalled destination forfeits its
/// notification instead of stalling the stream.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DispatchEngine {
    store: Arc<SubscriptionStore>,
    notifier: Arc<dyn Notifier>,
    locale: Locale,
    links: LinkBuilder,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<SubscriptionStore>,
        notifier: Arc<dyn Notifier>,
        locale: Locale,
        links: LinkBuilder,
    ) -> Self {
        Self {
            store,
            notifier,
            locale,
            links,
        }
    }

    /// Consume the change stream until it closes.
    pub async fn run(&self, mut events: mpsc::Receiver<ChangeEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(&event).await;
        }
        info!("Change stream closed, dispatcher stopping");
    }

    /// Deliver one change to every matching rule. Never fails; a rule whose
    /// delivery errors is logged and skipped.
    pub async fn handle(&self, event: &ChangeEvent) {
        if event.bot || !matches!(event.change_type, ChangeType::New | ChangeType::Edit) {
            return;
        }

        // Namespace and exact-title subscriptions are independent; one event
        // can notify under both.
        let mut targets: Vec<DeliveryRule> = Vec::new();
        for goal in [
            Goal::Namespace(event.namespace),
            Goal::Title(event.title.clone()),
        ] {
            for rule in self.store.rules_for(&goal) {
                if let Some(min) = rule.min_length {
                    if event.delta() <= min {
                        debug!(
                            goal = %goal,
                            destination = %rule.destination,
                            delta = event.delta(),
                            "Delta at or below rule threshold"
                        );
                        continue;
                    }
                }
                targets.push(rule);
            }
        }

        if targets.is_empty() {
            return;
        }

        let payload = format::format(event, &self.locale, &self.links);
        debug!(
            title = %event.title,
            destinations = targets.len(),
            "Dispatching change notification"
        );

        let deliveries = targets.iter().map(|rule| {
            let payload = &payload;
            async move {
                let sent = tokio::time::timeout(
                    DELIVERY_TIMEOUT,
                    self.notifier.send(&rule.destination, payload),
                )
                .await;
                match sent {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!(destination = %rule.destination, error = %e, "Delivery failed")
                    }
                    Err(_) => warn!(destination = %rule.destination, "Delivery timed out"),
                }
            }
        });
        join_all(deliveries).await;
    }
}
