use std::time::Duration;

use crate::view_model::LifecycleView;
use crate::{MarkerClasses, TriggerSettings};

pub type RequestId = u64;

/// Delay between arming the prefill and applying it, so the host page can
/// finish rendering the card content asynchronously.
pub const DEFAULT_PREFILL_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreSettings {
    pub markers: MarkerClasses,
    pub trigger: TriggerSettings,
    pub prefill_delay: Duration,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            markers: MarkerClasses::default(),
            trigger: TriggerSettings::default(),
            prefill_delay: DEFAULT_PREFILL_DELAY,
        }
    }
}

/// Lifecycle of the single tracked editor instance.
///
/// `InstanceActive` holds exactly when a key handler is attached to the
/// carried node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstanceState<N> {
    #[default]
    Idle,
    InstanceActive(N),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefillState {
    #[default]
    Unarmed,
    Scheduled,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight<N> {
    pub request_id: RequestId,
    pub instance: N,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState<N> {
    settings: CoreSettings,
    instance: InstanceState<N>,
    in_flight: Vec<InFlight<N>>,
    prefill: PrefillState,
    next_request_id: RequestId,
}

impl<N> Default for AppState<N> {
    fn default() -> Self {
        Self::with_settings(CoreSettings::default())
    }
}

impl<N: Copy + PartialEq> AppState<N> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<N> AppState<N> {
    pub fn with_settings(settings: CoreSettings) -> Self {
        Self {
            settings,
            instance: InstanceState::Idle,
            in_flight: Vec::new(),
            prefill: PrefillState::Unarmed,
            next_request_id: 1,
        }
    }

    pub fn settings(&self) -> &CoreSettings {
        &self.settings
    }
}

impl<N: Copy + PartialEq> AppState<N> {
    pub fn instance(&self) -> InstanceState<N> {
        self.instance
    }

    pub fn active_instance(&self) -> Option<N> {
        match self.instance {
            InstanceState::Idle => None,
            InstanceState::InstanceActive(node) => Some(node),
        }
    }

    /// Moves to `InstanceActive`. Returns false if an instance is already active.
    pub(crate) fn activate(&mut self, node: N) -> bool {
        match self.instance {
            InstanceState::Idle => {
                self.instance = InstanceState::InstanceActive(node);
                true
            }
            InstanceState::InstanceActive(_) => false,
        }
    }

    /// Moves to `Idle`, returning the node that was active.
    pub(crate) fn deactivate(&mut self) -> Option<N> {
        let previous = self.active_instance();
        self.instance = InstanceState::Idle;
        previous
    }

    pub fn is_pending(&self, node: N) -> bool {
        self.in_flight.iter().any(|entry| entry.instance == node)
    }

    pub(crate) fn begin_request(&mut self, node: N) -> RequestId {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight.push(InFlight {
            request_id,
            instance: node,
        });
        request_id
    }

    pub(crate) fn settle_request(&mut self, request_id: RequestId) -> Option<InFlight<N>> {
        let index = self
            .in_flight
            .iter()
            .position(|entry| entry.request_id == request_id)?;
        Some(self.in_flight.remove(index))
    }

    /// Arms the first prefill check. Returns true if this call armed it.
    pub(crate) fn arm_prefill(&mut self) -> bool {
        if self.prefill == PrefillState::Unarmed {
            self.prefill = PrefillState::Scheduled;
            true
        } else {
            false
        }
    }

    /// Arms another prefill check unless one is already scheduled.
    /// Returns true if this call armed it.
    pub(crate) fn rearm_prefill(&mut self) -> bool {
        match self.prefill {
            PrefillState::Unarmed | PrefillState::Done => {
                self.prefill = PrefillState::Scheduled;
                true
            }
            PrefillState::Scheduled => false,
        }
    }

    /// Marks the prefill as done. Returns true if it was scheduled.
    pub(crate) fn finish_prefill(&mut self) -> bool {
        if self.prefill == PrefillState::Scheduled {
            self.prefill = PrefillState::Done;
            true
        } else {
            false
        }
    }

    pub fn view(&self) -> LifecycleView<N> {
        LifecycleView {
            instance: self.active_instance(),
            pending_requests: self.in_flight.iter().map(|entry| entry.request_id).collect(),
            prefill: self.prefill,
        }
    }
}
