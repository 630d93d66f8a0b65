//! Glue between the controller, the scanner and the host page.

use super::controller::{Command, Controller, InputEvent};
use super::dispatch::{FeedbackRequest, TooltipDispatch, TooltipRequest};
use crate::models::{CacheEntry, ElementBox, Point};
use crate::scanner::Scanner;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Shown while a forced local scan runs
pub const DECODING: &str = "Decoding…";
/// Shown while the remote race runs
pub const QUERYING_REMOTE: &str = "Querying remote decoders…";
/// Shown when a forced local scan fails
pub const DECODE_FAILED: &str = "Decode failed";
/// Shown when the remote race fails
pub const REMOTE_FAILED: &str = "Remote decode failed";
/// Feedback after copying a text result
pub const COPIED: &str = "Copied";
/// Feedback after a long-press link copy
pub const LINK_COPIED: &str = "Link copied";

/// Page-side primitives
pub trait Host: Send + Sync {
    /// Put `text` on the clipboard
    fn write_clipboard(&self, text: &str);

    /// Open `url` in a new tab
    fn open_tab(&self, url: &str);

    /// Draw the crop overlay, or remove it with `None`
    fn set_crop_overlay(&self, rect: Option<ElementBox>);
}

/// One frame's wiring of controller, scanner, tooltip dispatch and host
pub struct Session {
    scanner: Arc<Scanner>,
    controller: Mutex<Controller>,
    dispatch: Arc<dyn TooltipDispatch>,
    host: Arc<dyn Host>,
    last_tooltip: Mutex<Option<TooltipRequest>>,
}

impl Session {
    /// Wire a session around `scanner`
    pub fn new(
        scanner: Arc<Scanner>,
        dispatch: Arc<dyn TooltipDispatch>,
        host: Arc<dyn Host>,
    ) -> Self {
        let controller = Controller::new(scanner.config().clone(), scanner.cache().clone());
        Self {
            scanner,
            controller: Mutex::new(controller),
            dispatch,
            host,
            last_tooltip: Mutex::new(None),
        }
    }

    /// Scanner used by this session
    pub fn scanner(&self) -> &Arc<Scanner> {
        &self.scanner
    }

    /// Feed an event and run the resulting commands. Returns whether the
    /// host's default action should be prevented.
    pub async fn handle(&self, event: InputEvent, now: Instant) -> bool {
        let reaction = self.controller.lock().handle(event, now);
        for command in reaction.commands {
            self.execute(command).await;
        }
        reaction.suppress_default
    }

    /// Run one controller command
    pub async fn execute(&self, command: Command) {
        match command {
            Command::Scan {
                target,
                bounds,
                request,
            } => {
                let anchor = bounds.tooltip_anchor();
                if request.force {
                    self.show(TooltipRequest::status(DECODING, anchor));
                }
                let entry = self.scanner.scan(&target, &request).await;
                self.present(entry, anchor, request.force.then_some(DECODE_FAILED));
            }
            Command::RemoteScan { target, bounds } => {
                let anchor = bounds.tooltip_anchor();
                self.show(TooltipRequest::status(QUERYING_REMOTE, anchor));
                let entry = self.scanner.remote_scan(&target).await;
                self.present(entry, anchor, Some(REMOTE_FAILED));
            }
            Command::MarkTooLarge { target } => {
                self.scanner.mark_too_large(&target);
            }
            Command::ShowTooltip(request) => self.show(request),
            Command::HideTooltip => {
                self.last_tooltip.lock().take();
                self.dispatch.hide();
            }
            Command::BeginCrop { bounds } => self.host.set_crop_overlay(Some(bounds)),
            Command::UpdateCrop(rect) => self.host.set_crop_overlay(Some(rect)),
            Command::EndCrop => self.host.set_crop_overlay(None),
            Command::CopyLink { text, at } => {
                self.host.write_clipboard(&text);
                self.feedback(LINK_COPIED, at);
            }
        }
    }

    /// The visible tooltip was clicked: open a link result, copy a text one
    pub fn tooltip_clicked(&self) {
        let Some(tooltip) = self.last_tooltip.lock().clone() else {
            return;
        };
        if tooltip.method.is_none() {
            return;
        }
        if tooltip.is_link {
            self.host.open_tab(&tooltip.text);
        } else {
            self.host.write_clipboard(&tooltip.text);
            self.feedback(COPIED, tooltip.coords);
        }
    }

    fn present(&self, entry: CacheEntry, anchor: Point, failure: Option<&str>) {
        match entry {
            CacheEntry::Success { text, method } => {
                self.show(TooltipRequest::result(text, method, anchor));
            }
            other => match failure {
                Some(message) => self.show(TooltipRequest::status(message, anchor)),
                None => debug!(entry = %other, "automatic scan found nothing"),
            },
        }
    }

    fn show(&self, request: TooltipRequest) {
        *self.last_tooltip.lock() = Some(request.clone());
        self.dispatch.show(request);
    }

    fn feedback(&self, text: &str, coords: Point) {
        self.dispatch.feedback(FeedbackRequest {
            text: text.to_string(),
            coords,
        });
    }
}
