//! Tooltip routing between frames.
//!
//! Only the top frame renders tooltips. A frame either renders directly
//! ([`LocalDispatch`]) or posts the request upward over a [`MessageBus`]
//! ([`RelayDispatch`]); the top frame turns bus traffic back into surface
//! calls with [`listen`].

use crate::models::{Point, is_link};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{trace, warn};

/// A tooltip to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipRequest {
    /// Text shown
    pub text: String,
    /// Anchor in the rendering frame's page coordinates
    pub coords: Point,
    /// Text is an http(s) link
    pub is_link: bool,
    /// Decode method, shown next to results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl TooltipRequest {
    /// Tooltip for a decoded result
    pub fn result(text: impl Into<String>, method: impl Into<String>, coords: Point) -> Self {
        let text = text.into();
        Self {
            is_link: is_link(&text),
            text,
            coords,
            method: Some(method.into()),
        }
    }

    /// Tooltip for a progress or failure message
    pub fn status(text: impl Into<String>, coords: Point) -> Self {
        Self {
            text: text.into(),
            coords,
            is_link: false,
            method: None,
        }
    }

    fn offset(mut self, by: Point) -> Self {
        self.coords = self.coords.translate(by.x, by.y);
        self
    }
}

/// Short confirmation such as "Copied"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    /// Text shown
    pub text: String,
    /// Anchor in page coordinates
    pub coords: Point,
}

/// Messages exchanged between frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusMessage {
    /// Render a tooltip
    ShowTooltip(TooltipRequest),
    /// Remove the tooltip
    HideTooltip,
    /// Flash a feedback message
    ShowFeedback(FeedbackRequest),
}

impl BusMessage {
    /// JSON wire form
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse the wire form; anything else on the channel yields `None`
    pub fn from_wire(wire: &str) -> Option<Self> {
        serde_json::from_str(wire).ok()
    }
}

/// Destination frame of a bus message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTarget {
    /// Outermost frame
    Top,
    /// Immediate parent frame
    Parent,
}

/// Callback registered on a bus
pub type BusHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Cross-frame transport
pub trait MessageBus: Send + Sync {
    /// Post `message` to `target`
    fn send(&self, target: FrameTarget, message: String);

    /// Register a handler for incoming messages
    fn on_message(&self, handler: BusHandler);
}

/// Bus delivering synchronously to handlers in the same process
#[derive(Default)]
pub struct InProcessBus {
    handlers: Mutex<Vec<BusHandler>>,
}

impl InProcessBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageBus for InProcessBus {
    fn send(&self, target: FrameTarget, message: String) {
        let handlers = self.handlers.lock().clone();
        trace!(?target, handlers = handlers.len(), "bus send");
        for handler in handlers {
            handler(&message);
        }
    }

    fn on_message(&self, handler: BusHandler) {
        self.handlers.lock().push(handler);
    }
}

/// Tooltip renderer of the top frame
pub trait TooltipSurface: Send + Sync {
    /// Show or replace the tooltip
    fn show(&self, request: &TooltipRequest);

    /// Remove the tooltip
    fn hide(&self);

    /// Flash a feedback message
    fn feedback(&self, request: &FeedbackRequest);
}

/// How a frame gets tooltips rendered
pub trait TooltipDispatch: Send + Sync {
    /// Show or replace the tooltip
    fn show(&self, request: TooltipRequest);

    /// Remove the tooltip
    fn hide(&self);

    /// Flash a feedback message
    fn feedback(&self, request: FeedbackRequest);
}

/// Renders directly; used in the top frame
pub struct LocalDispatch {
    surface: Arc<dyn TooltipSurface>,
}

impl LocalDispatch {
    /// Dispatch onto `surface`
    pub fn new(surface: Arc<dyn TooltipSurface>) -> Self {
        Self { surface }
    }
}

impl TooltipDispatch for LocalDispatch {
    fn show(&self, request: TooltipRequest) {
        self.surface.show(&request);
    }

    fn hide(&self) {
        self.surface.hide();
    }

    fn feedback(&self, request: FeedbackRequest) {
        self.surface.feedback(&request);
    }
}

/// Posts requests to the top frame, translating coordinates by this
/// frame's offset inside it
pub struct RelayDispatch {
    bus: Arc<dyn MessageBus>,
    offset: Point,
}

impl RelayDispatch {
    /// Relay over `bus` from a frame located at `offset` in the top frame
    pub fn new(bus: Arc<dyn MessageBus>, offset: Point) -> Self {
        Self { bus, offset }
    }

    fn post(&self, message: BusMessage) {
        match message.to_wire() {
            Ok(wire) => self.bus.send(FrameTarget::Top, wire),
            Err(err) => warn!(%err, "failed to encode bus message"),
        }
    }
}

impl TooltipDispatch for RelayDispatch {
    fn show(&self, request: TooltipRequest) {
        self.post(BusMessage::ShowTooltip(request.offset(self.offset)));
    }

    fn hide(&self) {
        self.post(BusMessage::HideTooltip);
    }

    fn feedback(&self, mut request: FeedbackRequest) {
        request.coords = request.coords.translate(self.offset.x, self.offset.y);
        self.post(BusMessage::ShowFeedback(request));
    }
}

/// Position of the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameRole {
    /// Outermost frame
    Top,
    /// Nested frame at the given offset inside the top frame
    Nested(Point),
}

/// Pick the dispatch strategy for a frame
pub fn dispatch_for(
    role: FrameRole,
    surface: Arc<dyn TooltipSurface>,
    bus: Arc<dyn MessageBus>,
) -> Arc<dyn TooltipDispatch> {
    match role {
        FrameRole::Top => Arc::new(LocalDispatch::new(surface)),
        FrameRole::Nested(offset) => Arc::new(RelayDispatch::new(bus, offset)),
    }
}

/// Render relayed requests in the top frame. Messages that are not ours
/// are ignored.
pub fn listen(bus: &dyn MessageBus, surface: Arc<dyn TooltipSurface>) {
    bus.on_message(Arc::new(move |wire: &str| match BusMessage::from_wire(wire) {
        Some(BusMessage::ShowTooltip(request)) => surface.show(&request),
        Some(BusMessage::HideTooltip) => surface.hide(),
        Some(BusMessage::ShowFeedback(request)) => surface.feedback(&request),
        None => trace!("ignoring foreign bus message"),
    }));
}
