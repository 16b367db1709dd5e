//! Cross-window message bridge between the widget and the Sigma host.
//!
//! The bridge owns the handshake with the embedding host, turns inbound
//! messages into [`BridgeEvent`]s and fans them out to subscribers. The host
//! window and the timer source are injected through [`HostWindow`] and
//! [`Scheduler`]; browser implementations live in `browser`.
//!
//! Lifecycle
//! ---------
//! `bootstrap()` decides the mode exactly once:
//! - **standalone** (no parent window): a status line, then the built-in sample
//!   table after the configured delay;
//! - **embedded**: a status line and a `sigma.requestData` message to the parent.
//!
//! `teardown()` cancels the pending sample delivery. Errors never escape the
//! bridge; they are emitted on the error channel and listening continues.

mod error;
mod host;
mod schedule;
mod subscribers;

#[cfg(target_arch = "wasm32")]
pub mod browser;

pub use error::{BridgeError, UNKNOWN_HOST_ERROR, UNPARSEABLE_MESSAGE};
pub use host::{DetachedHost, HostWindow};
#[cfg(target_arch = "wasm32")]
pub use schedule::TimeoutScheduler;
pub use schedule::{ImmediateScheduler, ManualScheduler, ScheduledTask, Scheduler, Task};
pub use subscribers::{Subscribers, Subscription};

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::core::{config::WidgetConfig, normalize, table, Table};

/// Message types that carry a table payload.
pub const DATA_EVENT_TYPES: [&str; 5] = [
    "sigma.data",
    "sigma:payload",
    "sigma.payload",
    "sigma.viz.payload",
    "sigma-plugin-data",
];
pub const ERROR_EVENT_TYPE: &str = "sigma.error";
pub const REQUEST_ACK_EVENT_TYPE: &str = "sigma.requestDataAck";
pub const REQUEST_DATA_EVENT_TYPE: &str = "sigma.requestData";

pub const STATUS_STANDALONE: &str = "Standalone preview mode";
pub const STATUS_WAITING: &str = "Waiting for Sigma host…";
pub const STATUS_RENDERING: &str = "Rendering Sigma data";
pub const STATUS_ACKNOWLEDGED: &str = "Data request acknowledged";

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    Data(Table),
    Error(BridgeError),
    Status(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeMode {
    Standalone,
    Embedded,
}

struct Inner {
    host: Box<dyn HostWindow>,
    scheduler: Box<dyn Scheduler>,
    config: WidgetConfig,
    data: Subscribers<Table>,
    errors: Subscribers<BridgeError>,
    status: Subscribers<String>,
    last_table: RefCell<Option<Table>>,
    mode: Cell<Option<BridgeMode>>,
    pending_sample: RefCell<Option<ScheduledTask>>,
}

/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct HostBridge {
    inner: Rc<Inner>,
}

impl HostBridge {
    pub fn new(
        host: impl HostWindow + 'static,
        scheduler: impl Scheduler + 'static,
        config: WidgetConfig,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                host: Box::new(host),
                scheduler: Box::new(scheduler),
                config,
                data: Subscribers::new(),
                errors: Subscribers::new(),
                status: Subscribers::new(),
                last_table: RefCell::new(None),
                mode: Cell::new(None),
                pending_sample: RefCell::new(None),
            }),
        }
    }

    /// `None` until [`HostBridge::bootstrap`] has run.
    pub fn mode(&self) -> Option<BridgeMode> {
        self.inner.mode.get()
    }

    pub fn last_table(&self) -> Option<Table> {
        self.inner.last_table.borrow().clone()
    }

    /// Register a data callback. If a table has already arrived it is replayed
    /// to this callback before returning.
    pub fn on_data(&self, callback: impl Fn(Table) + 'static) -> Subscription {
        let replay = self.last_table();
        let callback = Rc::new(callback);
        let subscription = {
            let callback = callback.clone();
            self.inner.data.add(move |table| (*callback)(table))
        };
        if let Some(table) = replay {
            (*callback)(table);
        }
        subscription
    }

    pub fn on_error(&self, callback: impl Fn(BridgeError) + 'static) -> Subscription {
        self.inner.errors.add(callback)
    }

    pub fn on_status(&self, callback: impl Fn(String) + 'static) -> Subscription {
        self.inner.status.add(callback)
    }

    pub fn bootstrap(&self) {
        if let Some(mode) = self.mode() {
            warn!(?mode, "bridge already bootstrapped");
            return;
        }

        if self.inner.host.is_embedded() {
            self.inner.mode.set(Some(BridgeMode::Embedded));
            info!("bridge bootstrapped in embedded mode");
            self.emit(BridgeEvent::Status(STATUS_WAITING.to_string()));
            self.request_data();
        } else {
            self.inner.mode.set(Some(BridgeMode::Standalone));
            info!("bridge bootstrapped in standalone mode");
            self.emit(BridgeEvent::Status(STATUS_STANDALONE.to_string()));
            self.schedule_sample();
        }
    }

    /// Ask the parent window for data. Ignored when running standalone.
    pub fn request_data(&self) {
        if !self.inner.host.is_embedded() {
            return;
        }
        let message = json!({ "type": REQUEST_DATA_EVENT_TYPE });
        self.post_to_parent(&message);
    }

    fn post_to_parent(&self, message: &Value) {
        let target = self.inner.config.request_target_origin.as_str();
        if let Err(err) = self.inner.host.post_to_parent(message, target) {
            warn!(error = %err, "posting to parent window failed");
            self.emit(BridgeEvent::Error(err));
        }
    }

    fn schedule_sample(&self) {
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        let task = self.inner.scheduler.schedule(
            self.inner.config.sample_delay(),
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    debug!("delivering sample table");
                    HostBridge { inner }.emit(BridgeEvent::Data(table::sample_table()));
                }
            }),
        );
        // A previous handle, if any, is cancelled by the drop.
        self.inner.pending_sample.replace(Some(task));
    }

    /// Cancel pending deferred work. Subscriptions stay registered, so inbound
    /// messages handled afterwards are still delivered.
    pub fn teardown(&self) {
        if let Some(task) = self.inner.pending_sample.borrow_mut().take() {
            debug!("cancelling pending sample delivery");
            task.cancel();
        }
    }

    /// Process one inbound cross-window message.
    pub fn handle_message(&self, origin: &str, data: &Value) {
        if !self.inner.config.origin_policy.allows(origin) {
            debug!(origin, "ignoring message from disallowed origin");
            return;
        }

        let Some(message) = data.as_object() else {
            return;
        };
        let Some(kind) = message
            .get("type")
            .filter(|kind| normalize::is_truthy(kind))
        else {
            return;
        };
        let kind = kind.as_str().unwrap_or_default();
        let payload = message.get("payload");

        if DATA_EVENT_TYPES.contains(&kind) {
            match payload.and_then(normalize::normalize) {
                Some(table) => {
                    debug!(kind, rows = table.rows.len(), "table payload received");
                    self.emit(BridgeEvent::Status(STATUS_RENDERING.to_string()));
                    self.emit(BridgeEvent::Data(table));
                }
                None => {
                    warn!(kind, "table payload could not be parsed");
                    self.emit(BridgeEvent::Error(BridgeError::Unparseable {
                        payload: payload.cloned().unwrap_or(Value::Null),
                    }));
                }
            }
            return;
        }

        match kind {
            ERROR_EVENT_TYPE => {
                self.emit(BridgeEvent::Error(BridgeError::from_host_payload(payload)));
            }
            REQUEST_ACK_EVENT_TYPE => {
                self.emit(BridgeEvent::Status(STATUS_ACKNOWLEDGED.to_string()));
            }
            other => debug!(kind = other, "ignoring unrecognized message type"),
        }
    }

    fn emit(&self, event: BridgeEvent) {
        match event {
            BridgeEvent::Data(table) => {
                self.inner.last_table.replace(Some(table.clone()));
                self.inner.data.notify(&table);
            }
            BridgeEvent::Error(err) => self.inner.errors.notify(&err),
            BridgeEvent::Status(message) => self.inner.status.notify(&message),
        }
    }
}

impl std::fmt::Debug for HostBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBridge")
            .field("mode", &self.mode())
            .field("has_table", &self.inner.last_table.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::OriginPolicy;
    use serde_json::json;
    use std::time::Duration;

    /// Framed window that records outbound posts and can be told to fail.
    #[derive(Clone, Default)]
    struct FakeParent {
        posted: Rc<RefCell<Vec<(Value, String)>>>,
        fail: bool,
    }

    impl HostWindow for FakeParent {
        fn is_embedded(&self) -> bool {
            true
        }

        fn post_to_parent(&self, message: &Value, target_origin: &str) -> Result<(), BridgeError> {
            if self.fail {
                return Err(BridgeError::Transport("SecurityError: blocked".into()));
            }
            self.posted
                .borrow_mut()
                .push((message.clone(), target_origin.to_string()));
            Ok(())
        }
    }

    /// Collects every emitted event in order.
    fn record(bridge: &HostBridge) -> Rc<RefCell<Vec<BridgeEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let data_log = log.clone();
        let error_log = log.clone();
        let status_log = log.clone();
        let _ = bridge.on_data(move |t| data_log.borrow_mut().push(BridgeEvent::Data(t)));
        let _ = bridge.on_error(move |e| error_log.borrow_mut().push(BridgeEvent::Error(e)));
        let _ = bridge.on_status(move |s| status_log.borrow_mut().push(BridgeEvent::Status(s)));
        log
    }

    fn embedded() -> (HostBridge, FakeParent) {
        let parent = FakeParent::default();
        let bridge = HostBridge::new(parent.clone(), ManualScheduler::new(), WidgetConfig::default());
        (bridge, parent)
    }

    fn table_payload() -> Value {
        json!({
            "columns": [{ "name": "Category" }, { "name": "Total" }],
            "rows": [["North", 1]]
        })
    }

    #[test]
    fn embedded_bootstrap_requests_data() {
        let (bridge, parent) = embedded();
        let log = record(&bridge);
        bridge.bootstrap();

        assert_eq!(bridge.mode(), Some(BridgeMode::Embedded));
        assert_eq!(*log.borrow(), vec![BridgeEvent::Status(STATUS_WAITING.into())]);
        assert_eq!(
            *parent.posted.borrow(),
            vec![(json!({ "type": "sigma.requestData" }), "*".to_string())]
        );
    }

    #[test]
    fn transport_failure_is_reported_not_raised() {
        let parent = FakeParent {
            fail: true,
            ..FakeParent::default()
        };
        let bridge = HostBridge::new(parent, ManualScheduler::new(), WidgetConfig::default());
        let log = record(&bridge);
        bridge.bootstrap();

        let events = log.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], BridgeEvent::Error(BridgeError::Transport(msg)) if msg.contains("blocked")));
    }

    #[test]
    fn standalone_emits_sample_after_delay() {
        let scheduler = ManualScheduler::new();
        let bridge = HostBridge::new(DetachedHost, scheduler.clone(), WidgetConfig::default());
        let log = record(&bridge);
        bridge.bootstrap();

        assert_eq!(*log.borrow(), vec![BridgeEvent::Status(STATUS_STANDALONE.into())]);
        scheduler.advance(Duration::from_millis(149));
        assert_eq!(log.borrow().len(), 1);
        scheduler.advance(Duration::from_millis(1));
        assert_eq!(log.borrow()[1], BridgeEvent::Data(table::sample_table()));
    }

    #[test]
    fn teardown_cancels_sample_delivery() {
        let scheduler = ManualScheduler::new();
        let bridge = HostBridge::new(DetachedHost, scheduler.clone(), WidgetConfig::default());
        let log = record(&bridge);
        bridge.bootstrap();
        bridge.teardown();

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn data_message_emits_status_then_table() {
        let (bridge, _) = embedded();
        let log = record(&bridge);
        for kind in DATA_EVENT_TYPES {
            bridge.handle_message("https://host", &json!({ "type": kind, "payload": table_payload() }));
        }

        let events = log.borrow();
        assert_eq!(events.len(), DATA_EVENT_TYPES.len() * 2);
        assert_eq!(events[0], BridgeEvent::Status(STATUS_RENDERING.into()));
        assert!(matches!(&events[1], BridgeEvent::Data(t) if t.rows.len() == 1));
    }

    #[test]
    fn unparseable_payload_reports_error_with_payload() {
        let (bridge, _) = embedded();
        let log = record(&bridge);
        bridge.handle_message("https://host", &json!({ "type": "sigma.data", "payload": { "foo": 1 } }));

        assert_eq!(
            *log.borrow(),
            vec![BridgeEvent::Error(BridgeError::Unparseable {
                payload: json!({ "foo": 1 })
            })]
        );
        assert!(bridge.last_table().is_none());
    }

    #[test]
    fn host_error_and_ack_messages() {
        let (bridge, _) = embedded();
        let log = record(&bridge);
        bridge.handle_message("o", &json!({ "type": "sigma.error" }));
        bridge.handle_message("o", &json!({ "type": "sigma.error", "payload": "Boom" }));
        bridge.handle_message("o", &json!({ "type": "sigma.requestDataAck" }));

        let messages: Vec<String> = log
            .borrow()
            .iter()
            .map(|event| match event {
                BridgeEvent::Error(err) => err.to_string(),
                BridgeEvent::Status(status) => status.clone(),
                BridgeEvent::Data(_) => "data".into(),
            })
            .collect();
        assert_eq!(messages, [UNKNOWN_HOST_ERROR, "Boom", STATUS_ACKNOWLEDGED]);
    }

    #[test]
    fn unknown_and_malformed_messages_are_ignored() {
        let (bridge, _) = embedded();
        let log = record(&bridge);
        bridge.handle_message("o", &json!({ "type": "sigma.unknown", "payload": table_payload() }));
        bridge.handle_message("o", &json!("sigma.data"));
        bridge.handle_message("o", &json!({ "payload": table_payload() }));
        bridge.handle_message("o", &json!({ "type": "", "payload": table_payload() }));
        bridge.handle_message("o", &Value::Null);

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn late_subscriber_receives_last_table() {
        let (bridge, _) = embedded();
        bridge.handle_message("o", &json!({ "type": "sigma.data", "payload": table_payload() }));

        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = received.clone();
        let _sub = bridge.on_data(move |t| sink.borrow_mut().push(t));

        assert_eq!(received.borrow().len(), 1);
        assert_eq!(received.borrow()[0].rows, vec![vec![json!("North"), json!(1)]]);
    }

    #[test]
    fn subscribers_get_independent_copies() {
        let (bridge, _) = embedded();
        let _mutator = bridge.on_data(|mut t| t.rows.clear());
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        let _reader = bridge.on_data(move |t| *sink.borrow_mut() = Some(t));

        bridge.handle_message("o", &json!({ "type": "sigma.data", "payload": table_payload() }));
        assert_eq!(seen.borrow().as_ref().map(|t| t.rows.len()), Some(1));
        assert_eq!(bridge.last_table().map(|t| t.rows.len()), Some(1));
    }

    #[test]
    fn unsubscribed_callbacks_stop_receiving() {
        let (bridge, _) = embedded();
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let sub = bridge.on_status(move |_| counter.set(counter.get() + 1));
        bridge.handle_message("o", &json!({ "type": "sigma.requestDataAck" }));
        sub.unsubscribe();
        bridge.handle_message("o", &json!({ "type": "sigma.requestDataAck" }));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn allow_list_filters_origins() {
        let config = WidgetConfig {
            origin_policy: OriginPolicy::AllowList(vec!["https://app.sigmacomputing.com".into()]),
            ..WidgetConfig::default()
        };
        let bridge = HostBridge::new(FakeParent::default(), ManualScheduler::new(), config);
        let log = record(&bridge);

        bridge.handle_message("https://evil.example", &json!({ "type": "sigma.requestDataAck" }));
        assert!(log.borrow().is_empty());
        bridge.handle_message("https://app.sigmacomputing.com", &json!({ "type": "sigma.requestDataAck" }));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn bridge_keeps_listening_after_errors() {
        let (bridge, _) = embedded();
        let log = record(&bridge);
        bridge.handle_message("o", &json!({ "type": "sigma.data", "payload": 42 }));
        bridge.handle_message("o", &json!({ "type": "sigma.data", "payload": table_payload() }));
        assert!(matches!(log.borrow().last(), Some(BridgeEvent::Data(_))));
    }

    #[test]
    fn second_bootstrap_is_ignored() {
        let (bridge, parent) = embedded();
        bridge.bootstrap();
        bridge.bootstrap();
        assert_eq!(parent.posted.borrow().len(), 1);
    }
}
