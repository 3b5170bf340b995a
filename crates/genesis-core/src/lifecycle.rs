//! §3 Lifecycles for Interface, Agent, and Function Service roles.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterfaceState {
    Discovering,
    Ready,
    Busy,
    Offline,
}

impl InterfaceState {
    pub fn can_transition_to(self, next: Self) -> bool {
        use InterfaceState::*;
        matches!(
            (self, next),
            (Discovering, Ready)
                | (Ready, Busy)
                | (Busy, Ready)
                | (Ready, Offline)
                | (Busy, Offline)
                | (Discovering, Offline)
        )
    }
}

/// Shared by Agent and Function Service: both add a DEGRADED excursion from
/// BUSY/READY on tool (resp. invocation) failure, per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderState {
    Discovering,
    Ready,
    Busy,
    Degraded,
    Offline,
}

impl ProviderState {
    pub fn can_transition_to(self, next: Self) -> bool {
        use ProviderState::*;
        matches!(
            (self, next),
            (Discovering, Ready)
                | (Ready, Busy)
                | (Busy, Ready)
                | (Ready, Degraded)
                | (Busy, Degraded)
                | (Degraded, Ready)
                | (Degraded, Busy)
                | (Ready, Offline)
                | (Busy, Offline)
                | (Degraded, Offline)
                | (Discovering, Offline)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_cannot_skip_discovering() {
        assert!(!ProviderState::Discovering.can_transition_to(ProviderState::Busy));
        assert!(ProviderState::Discovering.can_transition_to(ProviderState::Ready));
    }

    #[test]
    fn agent_degrades_and_recovers() {
        assert!(ProviderState::Ready.can_transition_to(ProviderState::Degraded));
        assert!(ProviderState::Degraded.can_transition_to(ProviderState::Ready));
    }

    #[test]
    fn interface_never_degrades() {
        // InterfaceState has no Degraded variant at all; this is a
        // compile-time guarantee rather than a runtime check.
        let s = InterfaceState::Busy;
        assert!(s.can_transition_to(InterfaceState::Ready));
    }
}
