//! Bidirectional state mirroring between the host model and a remote view.
//!
//! Outbound: committed attribute state leaves as [`patch::StatePatch`]es
//! through a [`sink::PatchSink`], fire-and-forget. Inbound: structured view
//! messages are classified by [`inbound::classify`] and routed through a
//! per-entity [`dispatch::EventDispatcher`].

pub mod channel;
pub mod dispatch;
pub mod inbound;
pub mod patch;
pub mod sink;

pub use channel::SyncChannel;
pub use dispatch::{Callback, CallbackId, EventDispatcher};
pub use inbound::{Classified, EventKind, MalformedMessage, classify};
pub use patch::{Command, Outbound, StatePatch};
pub use sink::{JsonLinesSink, PatchSink, RecordingSink};
