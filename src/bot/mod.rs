pub mod access;
pub mod controller;
pub mod event;
pub mod keyboard;
pub mod messages;

pub use access::MembershipGate;
pub use controller::FlowController;
pub use event::{Command, Event, EventKind, Sender};
pub use keyboard::CallbackAction;
