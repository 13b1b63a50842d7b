use crate::{MutationRecord, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg<N> {
    /// The page-ready signal arrived and observation has started.
    Initialized,
    /// One mutation record delivered by the observer, in delivery order.
    Mutation(MutationRecord<N>),
    /// A key went down on a node carrying the trigger's key handler.
    KeyDown {
        instance: N,
        key_code: u32,
        /// Rendered text of the instance at the moment of the keystroke.
        text: String,
    },
    /// The completion call settled. `text` is either the completion or
    /// the inline error message.
    CompletionSettled { request_id: RequestId, text: String },
    /// The deferred prefill delay elapsed.
    PrefillDue,
}
