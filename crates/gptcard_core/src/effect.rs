use std::time::Duration;

use crate::RequestId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect<N> {
    AttachKeyHandler { instance: N },
    DetachKeyHandler { instance: N },
    /// Insert "please wait" before the instance's trailing element child.
    InsertPendingMarker { request_id: RequestId, instance: N },
    RequestCompletion { request_id: RequestId, query: String },
    RemovePendingMarker { request_id: RequestId },
    /// Append the result block and a fresh empty paragraph to the instance.
    InsertResult { instance: N, text: String },
    MoveCaretToEnd { instance: N },
    SchedulePrefill { delay: Duration },
    /// Apply the stored prefill. `None` means no instance is tracked and the
    /// runner should look one up in the document.
    ApplyPrefill { instance: Option<N> },
}
