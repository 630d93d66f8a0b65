//! User interaction: gestures, tooltips and their routing between frames

/// Gesture state machine
pub mod controller;
/// Tooltip dispatch strategies and the message bus
pub mod dispatch;
/// Controller, scanner and host wiring
pub mod session;

pub use controller::{Button, Command, Controller, InputEvent, Reaction};
pub use dispatch::{
    BusMessage, FeedbackRequest, FrameRole, FrameTarget, InProcessBus, LocalDispatch, MessageBus,
    RelayDispatch, TooltipDispatch, TooltipRequest, TooltipSurface, dispatch_for, listen,
};
pub use session::{Host, Session};
