//! Stand-in for the browser side of the extension: loads a host page,
//! delivers the init signal and plays scripted user actions against it.
mod host;
mod logging;
mod replay;
mod session;

pub use replay::{run_replay, ReplayArgs};
