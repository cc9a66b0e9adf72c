use crate::ports::push::{DeliveryFailure, PushSender};
use crate::ports::store::{RoomStore, StaleSubscription};
use crate::types::room::{
    Machine, MachineStatus, MachineType, Member, PushSubscription, PushSubscriptionKeys, Room,
    SubscriptionFlags, subscription_key,
};

use std::collections::{BTreeMap, HashMap};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Shared, ordered record of sender and store activity.
pub(crate) type EventLog = Arc<Mutex<Vec<String>>>;

pub(crate) fn events(log: &EventLog) -> Vec<String> {
    log.lock().expect("event log lock").clone()
}

fn push_event(log: &EventLog, event: String) {
    log.lock().expect("event log lock").push(event);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TestSendError {
    Gone,
    Unreachable,
}

impl std::fmt::Display for TestSendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestSendError::Gone => f.write_str("test endpoint gone"),
            TestSendError::Unreachable => f.write_str("test endpoint unreachable"),
        }
    }
}

impl DeliveryFailure for TestSendError {
    fn is_permanent(&self) -> bool {
        matches!(self, TestSendError::Gone)
    }
}

#[derive(Clone, Default)]
pub(crate) struct TestSender {
    pub(crate) sent: Arc<Mutex<Vec<(String, String)>>>,
    failures: Arc<HashMap<String, TestSendError>>,
}

impl TestSender {
    pub(crate) fn failing(failures: &[(&str, TestSendError)]) -> Self {
        Self {
            sent: Arc::default(),
            failures: Arc::new(
                failures
                    .iter()
                    .map(|(endpoint, err)| (endpoint.to_string(), *err))
                    .collect(),
            ),
        }
    }

    pub(crate) fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub(crate) fn sent_to(&self, endpoint: &str) -> usize {
        self.sent()
            .iter()
            .filter(|(sent_endpoint, _)| sent_endpoint == endpoint)
            .count()
    }
}

impl PushSender for TestSender {
    type Error = TestSendError;
    type Fut<'a>
        = std::future::Ready<Result<(), Self::Error>>
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a PushSubscription, message: &'a str) -> Self::Fut<'a> {
        self.sent
            .lock()
            .expect("sent lock")
            .push((subscription.endpoint.clone(), message.to_string()));
        match self.failures.get(&subscription.endpoint) {
            Some(err) => std::future::ready(Err(*err)),
            None => std::future::ready(Ok(())),
        }
    }
}

/// Holds every send until `attempts` sends are in flight at the same time.
#[derive(Clone)]
pub(crate) struct GatedSender {
    gate: Arc<tokio::sync::Barrier>,
    log: EventLog,
    failures: Arc<HashMap<String, TestSendError>>,
}

impl GatedSender {
    pub(crate) fn new(
        attempts: usize,
        log: EventLog,
        failures: &[(&str, TestSendError)],
    ) -> Self {
        Self {
            gate: Arc::new(tokio::sync::Barrier::new(attempts)),
            log,
            failures: Arc::new(
                failures
                    .iter()
                    .map(|(endpoint, err)| (endpoint.to_string(), *err))
                    .collect(),
            ),
        }
    }
}

impl PushSender for GatedSender {
    type Error = TestSendError;
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), Self::Error>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a PushSubscription, _message: &'a str) -> Self::Fut<'a> {
        Box::pin(async move {
            let endpoint = subscription.endpoint.as_str();
            push_event(&self.log, format!("started {endpoint}"));
            self.gate.wait().await;
            push_event(&self.log, format!("finished {endpoint}"));
            match self.failures.get(endpoint) {
                Some(err) => Err(*err),
                None => Ok(()),
            }
        })
    }
}

#[derive(Debug)]
pub(crate) struct TestStoreError;

impl std::fmt::Display for TestStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("test store error")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreWrite {
    Flag {
        room_id: String,
        username: String,
        machine_type: MachineType,
        enabled: bool,
    },
    PushSubscription {
        room_id: String,
        username: String,
        key: String,
        endpoint: String,
    },
    Removal {
        room_id: String,
        stale: Vec<StaleSubscription>,
    },
}

#[derive(Clone, Default)]
pub(crate) struct TestStore {
    pub(crate) writes: Arc<Mutex<Vec<StoreWrite>>>,
    log: Option<EventLog>,
    fail: bool,
}

impl TestStore {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn logging(log: EventLog) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    pub(crate) fn writes(&self) -> Vec<StoreWrite> {
        self.writes.lock().expect("writes lock").clone()
    }

    fn record(&self, write: StoreWrite) -> std::future::Ready<Result<(), TestStoreError>> {
        if let Some(log) = &self.log {
            let kind = match write {
                StoreWrite::Flag { .. } => "flag",
                StoreWrite::PushSubscription { .. } => "subscription",
                StoreWrite::Removal { .. } => "removal",
            };
            push_event(log, format!("write {kind}"));
        }
        self.writes.lock().expect("writes lock").push(write);
        if self.fail {
            std::future::ready(Err(TestStoreError))
        } else {
            std::future::ready(Ok(()))
        }
    }
}

impl RoomStore for TestStore {
    type Error = TestStoreError;
    type Fut<'a>
        = std::future::Ready<Result<(), Self::Error>>
    where
        Self: 'a;

    fn set_subscription_flag<'a>(
        &'a self,
        room_id: &'a str,
        username: &'a str,
        machine_type: MachineType,
        enabled: bool,
    ) -> Self::Fut<'a> {
        self.record(StoreWrite::Flag {
            room_id: room_id.to_string(),
            username: username.to_string(),
            machine_type,
            enabled,
        })
    }

    fn put_push_subscription<'a>(
        &'a self,
        room_id: &'a str,
        username: &'a str,
        key: &'a str,
        subscription: &'a PushSubscription,
    ) -> Self::Fut<'a> {
        self.record(StoreWrite::PushSubscription {
            room_id: room_id.to_string(),
            username: username.to_string(),
            key: key.to_string(),
            endpoint: subscription.endpoint.clone(),
        })
    }

    fn remove_push_subscriptions<'a>(
        &'a self,
        room_id: &'a str,
        stale: &'a [StaleSubscription],
    ) -> Self::Fut<'a> {
        self.record(StoreWrite::Removal {
            room_id: room_id.to_string(),
            stale: stale.to_vec(),
        })
    }
}

pub(crate) fn machine(
    id: u64,
    machine_type: MachineType,
    status: MachineStatus,
    last_used_by: Option<&str>,
) -> Machine {
    let label = match machine_type {
        MachineType::Washer => "Washer",
        MachineType::Dryer => "Dryer",
    };
    Machine {
        id,
        name: format!("{label} {id}"),
        machine_type,
        status,
        finish_time: None,
        last_used_by: last_used_by.map(str::to_string),
    }
}

pub(crate) fn subscription(endpoint: &str) -> PushSubscription {
    PushSubscription {
        endpoint: endpoint.to_string(),
        expiration_time: None,
        keys: PushSubscriptionKeys {
            p256dh: "p256".to_string(),
            auth: "auth".to_string(),
        },
    }
}

pub(crate) fn member(endpoints: &[&str], washer: bool, dryer: bool) -> Member {
    Member {
        push_subscriptions: endpoints
            .iter()
            .map(|endpoint| (subscription_key(endpoint), subscription(endpoint)))
            .collect(),
        subscriptions: SubscriptionFlags { washer, dryer },
    }
}

pub(crate) fn room(machines: Vec<Machine>, members: Vec<(&str, Member)>) -> Room {
    Room {
        name: "Block C".to_string(),
        machines: Some(machines),
        modes: Vec::new(),
        members: Some(
            members
                .into_iter()
                .map(|(name, member)| (name.to_string(), member))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}
