//! gptcard core: pure card-lifecycle state machine and command-trigger protocol.
mod classify;
mod command;
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use classify::{classify, Lifecycle, MarkerClasses, MutationKind, MutationRecord, NodeInfo};
pub use command::{extract_query, last_line, TriggerSettings, ENTER_KEY_CODE, TRIGGER_PREFIX};
pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    AppState, CoreSettings, InFlight, InstanceState, PrefillState, RequestId,
    DEFAULT_PREFILL_DELAY,
};
pub use update::update;
pub use view_model::LifecycleView;
