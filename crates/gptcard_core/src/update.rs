use std::fmt::Debug;

use card_logging::{card_debug, card_info, card_trace, card_warn};

use crate::{classify, extract_query, AppState, Effect, Lifecycle, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update<N>(mut state: AppState<N>, msg: Msg<N>) -> (AppState<N>, Vec<Effect<N>>)
where
    N: Copy + PartialEq + Debug,
{
    let effects = match msg {
        Msg::Initialized => {
            if state.rearm_prefill() {
                vec![schedule_prefill(&state)]
            } else {
                card_trace!("Init while a prefill check is scheduled");
                Vec::new()
            }
        }
        Msg::Mutation(record) => match classify(&record, &state.settings().markers) {
            Some(Lifecycle::Opened(instance)) => on_opened(&mut state, instance),
            Some(Lifecycle::Closed(instance)) => on_closed(&mut state, instance),
            None => Vec::new(),
        },
        Msg::KeyDown {
            instance,
            key_code,
            text,
        } => on_key_down(&mut state, instance, key_code, &text),
        Msg::CompletionSettled { request_id, text } => match state.settle_request(request_id) {
            Some(in_flight) => vec![
                Effect::RemovePendingMarker { request_id },
                Effect::InsertResult {
                    instance: in_flight.instance,
                    text,
                },
                Effect::MoveCaretToEnd {
                    instance: in_flight.instance,
                },
            ],
            None => {
                card_warn!("Completion for unknown request {} dropped", request_id);
                Vec::new()
            }
        },
        Msg::PrefillDue => {
            if state.finish_prefill() {
                vec![Effect::ApplyPrefill {
                    instance: state.active_instance(),
                }]
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}

fn schedule_prefill<N>(state: &AppState<N>) -> Effect<N> {
    Effect::SchedulePrefill {
        delay: state.settings().prefill_delay,
    }
}

/// The first open arms a check only if no init signal has done so yet.
fn arm_prefill<N: Copy + PartialEq>(state: &mut AppState<N>) -> Vec<Effect<N>> {
    if state.arm_prefill() {
        vec![schedule_prefill(state)]
    } else {
        Vec::new()
    }
}

fn on_opened<N: Copy + PartialEq + Debug>(state: &mut AppState<N>, instance: N) -> Vec<Effect<N>> {
    if !state.activate(instance) {
        card_trace!("Open match on {:?} ignored, an instance is already active", instance);
        return Vec::new();
    }
    card_info!("Card opened: {:?}", instance);
    let mut effects = vec![Effect::AttachKeyHandler { instance }];
    effects.extend(arm_prefill(state));
    effects
}

fn on_closed<N: Copy + PartialEq + Debug>(state: &mut AppState<N>, closing: N) -> Vec<Effect<N>> {
    let Some(active) = state.deactivate() else {
        card_trace!("Close match on {:?} ignored, no instance is active", closing);
        return Vec::new();
    };
    if active != closing {
        // The handler lives on the tracked node, so that is what gets detached.
        card_debug!("Close match on {:?} while {:?} is tracked", closing, active);
    }
    card_info!("Card closed: {:?}", active);
    vec![Effect::DetachKeyHandler { instance: active }]
}

fn on_key_down<N: Copy + PartialEq + Debug>(
    state: &mut AppState<N>,
    instance: N,
    key_code: u32,
    text: &str,
) -> Vec<Effect<N>> {
    if state.active_instance() != Some(instance) {
        return Vec::new();
    }
    let trigger = &state.settings().trigger;
    if key_code != trigger.confirm_key_code {
        return Vec::new();
    }
    let Some(query) = extract_query(text, &trigger.prefix) else {
        return Vec::new();
    };
    let query = query.to_string();

    if state.is_pending(instance) {
        card_info!("Command on {:?} ignored, a request is still pending", instance);
        return Vec::new();
    }

    let request_id = state.begin_request(instance);
    card_info!("Command {} on {:?}: query_len={}", request_id, instance, query.len());
    vec![
        Effect::InsertPendingMarker {
            request_id,
            instance,
        },
        Effect::RequestCompletion { request_id, query },
    ]
}
