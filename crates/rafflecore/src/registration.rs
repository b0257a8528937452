//! Registration workflow
//!
//! Turns an inbound user into a numbered participant:
//!
//! 1. already in the store → return the existing number (no gate call, no write)
//! 2. gate says "not a member" → ask to subscribe, write nothing
//! 3. gate passes → atomic upsert, return the new number
//!
//! Rejection is never persisted, so a user can retry step 2 any number of
//! times. Two concurrent registrations of the same user are made safe by the
//! store's atomic upsert alone; there is no locking here.

use std::sync::Arc;

use crate::gate::MembershipGate;
use crate::storage::ParticipantStore;
use crate::types::{Participant, UserProfile};

/// Result of one registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The user was registered before; nothing changed
    AlreadyRegistered(Participant),
    /// The user is not in the channel; nothing was written
    NeedsSubscription,
    /// The user has just been registered
    Registered(Participant),
    /// Storage failed; no number can be reported
    StorageFailed,
}

impl RegistrationOutcome {
    /// Participant number, when the outcome has one.
    pub fn number(&self) -> Option<i64> {
        match self {
            RegistrationOutcome::AlreadyRegistered(p) | RegistrationOutcome::Registered(p) => Some(p.number),
            RegistrationOutcome::NeedsSubscription | RegistrationOutcome::StorageFailed => None,
        }
    }
}

#[derive(Clone)]
pub struct RegistrationWorkflow {
    store: Arc<dyn ParticipantStore>,
    gate: MembershipGate,
}

impl RegistrationWorkflow {
    pub fn new(store: Arc<dyn ParticipantStore>, gate: MembershipGate) -> Self {
        Self { store, gate }
    }

    /// Runs one registration attempt for `profile`.
    pub async fn register(&self, profile: &UserProfile) -> RegistrationOutcome {
        match self.store.find_by_user_id(profile.user_id).await {
            Ok(Some(existing)) => {
                log::info!(
                    "User {} is already registered as #{}",
                    profile.user_id,
                    existing.number
                );
                return RegistrationOutcome::AlreadyRegistered(existing);
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("Failed to look up participant {}: {}", profile.user_id, e);
                return RegistrationOutcome::StorageFailed;
            }
        }

        if !self.gate.is_member(profile.user_id).await {
            log::info!("User {} is not subscribed to the channel", profile.user_id);
            return RegistrationOutcome::NeedsSubscription;
        }

        match self.store.upsert(profile).await {
            Ok(participant) => {
                log::info!("Registered user {} as #{}", profile.user_id, participant.number);
                RegistrationOutcome::Registered(participant)
            }
            Err(e) => {
                log::error!("Failed to register participant {}: {}", profile.user_id, e);
                RegistrationOutcome::StorageFailed
            }
        }
    }
}
