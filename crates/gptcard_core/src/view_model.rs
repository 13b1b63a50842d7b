use crate::{PrefillState, RequestId};

/// Read-only snapshot of the lifecycle state, for logging and assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleView<N> {
    pub instance: Option<N>,
    pub pending_requests: Vec<RequestId>,
    pub prefill: PrefillState,
}

impl<N> LifecycleView<N> {
    pub fn instance_active(&self) -> bool {
        self.instance.is_some()
    }
}
