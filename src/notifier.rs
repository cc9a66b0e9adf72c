//! Reacts to a room write: compares the previous and new snapshot, notifies
//! members and writes back flag and subscription cleanup.

use crate::ports::push::{DeliveryFailure, PushSender};
use crate::ports::store::{RoomStore, StaleSubscription};
use crate::types::push::Payload;
use crate::types::room::{Machine, MachineStatus, MachineType, Member, Room};

use futures::future::join_all;
use log::{debug, error, info};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotice {
    pub username: String,
    pub payload: Payload,
}

/// A washer or dryer type went from fully occupied to at least one free unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityNotice {
    pub machine_type: MachineType,
    pub recipients: Vec<String>,
}

impl AvailabilityNotice {
    pub fn payload(&self) -> Payload {
        Payload::Availability {
            machine_type: self.machine_type,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationPlan {
    pub completions: Vec<CompletionNotice>,
    pub availability: Vec<AvailabilityNotice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    RoomDeleted,
    RoomIncomplete,
    PushDisabled,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::RoomDeleted => f.write_str("room deleted"),
            SkipReason::RoomIncomplete => f.write_str("room created or incomplete"),
            SkipReason::PushDisabled => f.write_str("push notifications disabled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unsubscribed {
    pub username: String,
    pub machine_type: MachineType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotifyReport {
    Skipped {
        reason: SkipReason,
    },
    Processed {
        delivered: usize,
        failed: usize,
        stale: Vec<StaleSubscription>,
        unsubscribed: Vec<Unsubscribed>,
        cleanup_failed: bool,
    },
}

/// Decides who gets notified for a write. Depends on nothing but the two
/// snapshots.
pub fn plan_notifications(
    before: Option<&Room>,
    after: Option<&Room>,
) -> Result<NotificationPlan, SkipReason> {
    let Some(after) = after else {
        return Err(SkipReason::RoomDeleted);
    };
    let Some(before) = before.filter(|room| room.machines.is_some() && room.members.is_some())
    else {
        return Err(SkipReason::RoomIncomplete);
    };

    Ok(NotificationPlan {
        completions: finished_cycles(before, after),
        availability: MachineType::ALL
            .into_iter()
            .filter_map(|machine_type| became_available(before, after, machine_type))
            .collect(),
    })
}

fn finished_cycles(before: &Room, after: &Room) -> Vec<CompletionNotice> {
    after
        .machines()
        .iter()
        .filter_map(|machine| {
            let previous = before.machines().iter().find(|m| m.id == machine.id)?;
            if previous.status != MachineStatus::InUse || machine.status != MachineStatus::Finished
            {
                return None;
            }
            let Some(username) = machine.last_used_by.as_deref() else {
                debug!("machine '{}' finished without a last user", machine.name);
                return None;
            };
            if !after.member(username).is_some_and(Member::has_push_target) {
                debug!("'{username}' has no push subscriptions, skipping completion notice");
                return None;
            }
            Some(CompletionNotice {
                username: username.to_string(),
                payload: Payload::Completion {
                    machine_name: machine.name.clone(),
                },
            })
        })
        .collect()
}

fn became_available(
    before: &Room,
    after: &Room,
    machine_type: MachineType,
) -> Option<AvailabilityNotice> {
    let previous = of_type(before, machine_type);
    let current = of_type(after, machine_type);
    if previous.is_empty() || current.is_empty() {
        return None;
    }

    let was_busy = previous.iter().all(|machine| machine.status.is_busy());
    let is_available = current
        .iter()
        .any(|machine| machine.status == MachineStatus::Available);
    if !(was_busy && is_available) {
        return None;
    }

    let recipients = after
        .members
        .iter()
        .flatten()
        .filter(|(_, member)| member.subscriptions.get(machine_type) && member.has_push_target())
        .map(|(username, _)| username.clone())
        .collect();
    Some(AvailabilityNotice {
        machine_type,
        recipients,
    })
}

fn of_type(room: &Room, machine_type: MachineType) -> Vec<&Machine> {
    room.machines()
        .iter()
        .filter(|machine| machine.machine_type == machine_type)
        .collect()
}

#[derive(Debug, Default)]
struct DeliveryTally {
    delivered: usize,
    failed: usize,
    stale: Vec<StaleSubscription>,
}

#[derive(Debug, Clone)]
pub struct RoomNotifier<S, D> {
    sender: S,
    store: D,
    icon: String,
}

impl<S, D> RoomNotifier<S, D>
where
    S: PushSender,
    D: RoomStore,
{
    pub fn new(sender: S, store: D, icon: impl Into<String>) -> Self {
        Self {
            sender,
            store,
            icon: icon.into(),
        }
    }

    pub async fn on_room_write(
        &self,
        room_id: &str,
        before: Option<&Room>,
        after: Option<&Room>,
    ) -> NotifyReport {
        let plan = match plan_notifications(before, after) {
            Ok(plan) => plan,
            Err(reason) => {
                info!("room {room_id}: {reason}, no action");
                return NotifyReport::Skipped { reason };
            }
        };
        let Some(after) = after else {
            return NotifyReport::Skipped {
                reason: SkipReason::RoomDeleted,
            };
        };

        let mut tally = DeliveryTally::default();

        for notice in &plan.completions {
            let Some(member) = after.member(&notice.username) else {
                continue;
            };
            let message = notice.payload.to_json(&self.icon);
            self.deliver(&notice.username, member, &message, &mut tally)
                .await;
        }

        let mut unsubscribed = Vec::new();
        for notice in &plan.availability {
            let message = notice.payload().to_json(&self.icon);
            for username in &notice.recipients {
                let Some(member) = after.member(username) else {
                    continue;
                };
                self.deliver(username, member, &message, &mut tally).await;

                match self
                    .store
                    .set_subscription_flag(room_id, username, notice.machine_type, false)
                    .await
                {
                    Ok(()) => unsubscribed.push(Unsubscribed {
                        username: username.clone(),
                        machine_type: notice.machine_type,
                    }),
                    Err(err) => error!(
                        "failed to clear {} subscription for '{username}' in room {room_id}: {err}",
                        notice.machine_type
                    ),
                }
            }
        }

        let cleanup_failed = self.clean_up(room_id, &tally.stale).await;

        NotifyReport::Processed {
            delivered: tally.delivered,
            failed: tally.failed,
            stale: tally.stale,
            unsubscribed,
            cleanup_failed,
        }
    }

    /// Sends to every subscription of one member and waits for all attempts.
    async fn deliver(
        &self,
        username: &str,
        member: &Member,
        message: &str,
        tally: &mut DeliveryTally,
    ) {
        let (keys, attempts): (Vec<&String>, Vec<_>) = member
            .push_subscriptions
            .iter()
            .map(|(key, subscription)| (key, self.sender.send(subscription, message)))
            .unzip();
        let results = join_all(attempts).await;

        for (key, result) in keys.into_iter().zip(results) {
            match result {
                Ok(()) => tally.delivered += 1,
                Err(err) if err.is_permanent() => {
                    info!("subscription {key} for '{username}' is stale, marking for removal ({err})");
                    let stale = StaleSubscription {
                        username: username.to_string(),
                        key: key.clone(),
                    };
                    if !tally.stale.contains(&stale) {
                        tally.stale.push(stale);
                    }
                }
                Err(err) => {
                    error!("push delivery error: {err} (user {username}, subscription {key})");
                    tally.failed += 1;
                }
            }
        }
    }

    /// Returns true when the cleanup write failed.
    async fn clean_up(&self, room_id: &str, stale: &[StaleSubscription]) -> bool {
        if stale.is_empty() {
            return false;
        }
        match self.store.remove_push_subscriptions(room_id, stale).await {
            Ok(()) => {
                info!(
                    "cleaned up {} stale subscription(s) in room {room_id}",
                    stale.len()
                );
                false
            }
            Err(err) => {
                error!("failed to clean up stale subscriptions in room {room_id}: {err}");
                true
            }
        }
    }
}
