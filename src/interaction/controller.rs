//! Gesture state machine.
//!
//! Turns pointer and keyboard events into pipeline commands. The
//! controller never runs scans itself; it only reads the result cache to
//! decide whether a hover or long-press has anything to act on.
//!
//! Gestures:
//! - hover an eligible element for the debounce interval: automatic scan
//! - hold the right button and click left N times, then release right:
//!   1 = forced scan with all formats, 2 = remote race,
//!   3 = crop-select, 4 = crop-select without size reduction
//! - long-press an element whose cached result is a link: copy the link

use super::dispatch::TooltipRequest;
use crate::cache::ResultCache;
use crate::config::ScanConfig;
use crate::models::{CacheEntry, CropRegion, ElementBox, Point, ScanTarget, is_link};
use crate::scanner::ScanRequest;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Primary button
    Left,
    /// Secondary button
    Right,
    /// Wheel button
    Middle,
}

/// Input delivered to the controller
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// Pointer entered an element
    Enter {
        /// Element under the pointer
        target: ScanTarget,
        /// Element layout box
        bounds: ElementBox,
    },
    /// Pointer left the hovered element
    Leave,
    /// Pointer moved
    Move {
        /// Pointer position
        at: Point,
    },
    /// Button pressed
    Down {
        /// Which button
        button: Button,
        /// Pointer position
        at: Point,
    },
    /// Button released
    Up {
        /// Which button
        button: Button,
        /// Pointer position
        at: Point,
    },
    /// Context menu about to open
    ContextMenu,
    /// Click about to be delivered
    Click,
    /// Escape key
    Escape,
    /// Time passed; fires due timers
    Tick,
}

/// Work requested by the controller
#[derive(Debug, Clone)]
pub enum Command {
    /// Run a local scan
    Scan {
        /// Element to scan
        target: ScanTarget,
        /// Element layout box, for tooltip placement
        bounds: ElementBox,
        /// Scan parameters
        request: ScanRequest,
    },
    /// Run the remote race
    RemoteScan {
        /// Element to scan
        target: ScanTarget,
        /// Element layout box
        bounds: ElementBox,
    },
    /// Record that the element is too large for automatic scans
    MarkTooLarge {
        /// Oversized element
        target: ScanTarget,
    },
    /// Show a tooltip
    ShowTooltip(TooltipRequest),
    /// Hide the tooltip
    HideTooltip,
    /// Crop selection started over `bounds`
    BeginCrop {
        /// Element being cropped
        bounds: ElementBox,
    },
    /// Current crop rectangle
    UpdateCrop(ElementBox),
    /// Crop selection finished or cancelled
    EndCrop,
    /// Copy a link to the clipboard
    CopyLink {
        /// Link text
        text: String,
        /// Feedback anchor
        at: Point,
    },
}

/// Commands for one event plus whether the host's default action is blocked
#[derive(Debug, Default)]
pub struct Reaction {
    /// Commands to execute, in order
    pub commands: Vec<Command>,
    /// Block the browser default (menu, click navigation, drag)
    pub suppress_default: bool,
}

impl Reaction {
    fn none() -> Self {
        Self::default()
    }

    fn suppressed() -> Self {
        Self {
            commands: Vec::new(),
            suppress_default: true,
        }
    }

    fn with(commands: Vec<Command>) -> Self {
        Self {
            commands,
            suppress_default: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Hover {
    target: ScanTarget,
    bounds: ElementBox,
}

#[derive(Debug)]
struct Press {
    hover: Hover,
    started: Instant,
    at: Point,
    fired: bool,
}

#[derive(Debug)]
struct CropSelect {
    hover: Hover,
    no_scale: bool,
    anchor: Option<Point>,
}

/// Event-driven gesture controller
pub struct Controller {
    config: ScanConfig,
    cache: Arc<ResultCache>,
    hover: Option<Hover>,
    debounce: Option<Instant>,
    right_held: bool,
    combo: u32,
    combo_target: Option<Hover>,
    suppress_menu: bool,
    press: Option<Press>,
    suppress_click: bool,
    crop: Option<CropSelect>,
}

impl Controller {
    /// Controller reading outcomes from `cache`
    pub fn new(config: ScanConfig, cache: Arc<ResultCache>) -> Self {
        Self {
            config,
            cache,
            hover: None,
            debounce: None,
            right_held: false,
            combo: 0,
            combo_target: None,
            suppress_menu: false,
            press: None,
            suppress_click: false,
            crop: None,
        }
    }

    /// Whether a crop selection is in progress
    pub fn is_cropping(&self) -> bool {
        self.crop.is_some()
    }

    /// Deadline of the pending hover scan, if any
    pub fn pending_scan(&self) -> Option<Instant> {
        self.debounce
    }

    /// Hover eligibility: ready, near-square and not too small
    pub fn is_eligible(&self, target: &ScanTarget) -> bool {
        let size = target.display_size();
        target.is_ready()
            && size.width.abs_diff(size.height) <= self.config.square_tolerance
            && size.width.min(size.height) >= self.config.min_size
    }

    /// Feed one event
    pub fn handle(&mut self, event: InputEvent, now: Instant) -> Reaction {
        trace!(?event, "input");
        match event {
            InputEvent::Enter { target, bounds } => self.on_enter(Hover { target, bounds }, now),
            InputEvent::Leave => self.on_leave(),
            InputEvent::Move { at } => self.on_move(at),
            InputEvent::Down { button, at } => self.on_down(button, at, now),
            InputEvent::Up { button, at } => self.on_up(button, at, now),
            InputEvent::ContextMenu => self.on_context_menu(),
            InputEvent::Click => self.on_click(),
            InputEvent::Escape => self.cancel_crop(),
            InputEvent::Tick => self.on_tick(now),
        }
    }

    fn on_enter(&mut self, hover: Hover, now: Instant) -> Reaction {
        if self.crop.is_some() {
            return Reaction::none();
        }
        self.debounce = None;
        self.hover = Some(hover.clone());

        if !self.is_eligible(&hover.target) {
            return Reaction::none();
        }
        match self.cache.get(&hover.target.key()) {
            Some(CacheEntry::Success { text, method }) => {
                let tooltip = TooltipRequest::result(text, method, hover.bounds.tooltip_anchor());
                return Reaction::with(vec![Command::ShowTooltip(tooltip)]);
            }
            Some(_) => return Reaction::none(),
            None => {}
        }
        if self.config.exceeds_auto_size(hover.target.natural_size()) {
            return Reaction::with(vec![Command::MarkTooLarge {
                target: hover.target,
            }]);
        }

        self.debounce = Some(now + self.config.hover_delay);
        Reaction::none()
    }

    fn on_leave(&mut self) -> Reaction {
        if self.crop.is_some() {
            return Reaction::none();
        }
        self.hover = None;
        self.debounce = None;
        self.press = None;
        Reaction::with(vec![Command::HideTooltip])
    }

    fn on_move(&mut self, at: Point) -> Reaction {
        match &self.crop {
            Some(CropSelect {
                hover,
                anchor: Some(anchor),
                ..
            }) => {
                let rect = span(*anchor, hover.bounds.clamp(at));
                Reaction::with(vec![Command::UpdateCrop(rect)])
            }
            _ => Reaction::none(),
        }
    }

    fn on_down(&mut self, button: Button, at: Point, now: Instant) -> Reaction {
        match button {
            Button::Right => {
                if self.crop.is_some() {
                    self.suppress_menu = true;
                    let mut reaction = self.cancel_crop();
                    reaction.suppress_default = true;
                    return reaction;
                }
                self.right_held = true;
                self.combo = 0;
                self.combo_target = self.hover.clone();
                Reaction::none()
            }
            Button::Left => {
                if let Some(crop) = &mut self.crop {
                    crop.anchor = Some(crop.hover.bounds.clamp(at));
                    return Reaction::suppressed();
                }
                if self.right_held {
                    self.combo += 1;
                    return Reaction::suppressed();
                }
                self.press = self.hover.clone().map(|hover| Press {
                    hover,
                    started: now,
                    at,
                    fired: false,
                });
                Reaction::none()
            }
            Button::Middle => Reaction::none(),
        }
    }

    fn on_up(&mut self, button: Button, at: Point, now: Instant) -> Reaction {
        match button {
            Button::Right if self.right_held => self.commit_combo(),
            Button::Left if self.crop.is_some() => self.finish_crop(at),
            Button::Left => {
                let mut reaction = self.check_long_press(now);
                self.press = None;
                if self.suppress_click {
                    reaction.suppress_default = true;
                }
                reaction
            }
            _ => Reaction::none(),
        }
    }

    fn on_context_menu(&mut self) -> Reaction {
        if (self.right_held && self.combo > 0) || self.suppress_menu {
            self.suppress_menu = false;
            return Reaction::suppressed();
        }
        Reaction::none()
    }

    fn on_click(&mut self) -> Reaction {
        if self.suppress_click || self.right_held {
            self.suppress_click = false;
            return Reaction::suppressed();
        }
        Reaction::none()
    }

    fn on_tick(&mut self, now: Instant) -> Reaction {
        let mut reaction = self.check_long_press(now);

        if self.debounce.is_some_and(|deadline| now >= deadline) {
            self.debounce = None;
            if let Some(hover) = &self.hover {
                debug!(target = %hover.target, "hover debounce elapsed");
                reaction.commands.push(Command::Scan {
                    target: hover.target.clone(),
                    bounds: hover.bounds,
                    request: ScanRequest::auto(),
                });
            }
        }
        reaction
    }

    fn check_long_press(&mut self, now: Instant) -> Reaction {
        let Some(press) = &mut self.press else {
            return Reaction::none();
        };
        if press.fired || now.duration_since(press.started) < self.config.long_press {
            return Reaction::none();
        }
        press.fired = true;

        match self.cache.get(&press.hover.target.key()) {
            Some(CacheEntry::Success { text, .. }) if is_link(&text) => {
                self.suppress_click = true;
                self.debounce = None;
                Reaction::with(vec![Command::CopyLink { text, at: press.at }])
            }
            _ => Reaction::none(),
        }
    }

    fn commit_combo(&mut self) -> Reaction {
        self.right_held = false;
        let count = std::mem::take(&mut self.combo);
        let target = self.combo_target.take().or_else(|| self.hover.clone());
        if count == 0 {
            return Reaction::none();
        }
        self.suppress_menu = true;

        let Some(hover) = target else {
            return Reaction::suppressed();
        };
        debug!(count, target = %hover.target, "combo committed");
        self.debounce = None;

        let command = match count {
            1 => Some(Command::Scan {
                target: hover.target,
                bounds: hover.bounds,
                request: ScanRequest::forced_all_formats(),
            }),
            2 => Some(Command::RemoteScan {
                target: hover.target,
                bounds: hover.bounds,
            }),
            3 | 4 => {
                let bounds = hover.bounds;
                self.crop = Some(CropSelect {
                    hover,
                    no_scale: count == 4,
                    anchor: None,
                });
                Some(Command::BeginCrop { bounds })
            }
            _ => None,
        };
        Reaction {
            commands: command.into_iter().collect(),
            suppress_default: true,
        }
    }

    fn finish_crop(&mut self, at: Point) -> Reaction {
        let Some(crop) = self.crop.take() else {
            return Reaction::none();
        };
        let mut commands = vec![Command::EndCrop];

        if let Some(anchor) = crop.anchor {
            let bounds = crop.hover.bounds;
            let rect = span(anchor, bounds.clamp(at));
            let min = self.config.min_crop as f32;
            if rect.width >= min && rect.height >= min {
                let mut region = CropRegion::new(
                    (rect.x - bounds.x) as f64,
                    (rect.y - bounds.y) as f64,
                    rect.width as f64,
                    rect.height as f64,
                );
                region.no_scale = crop.no_scale;
                commands.push(Command::Scan {
                    target: crop.hover.target,
                    bounds,
                    request: ScanRequest::crop(region),
                });
            } else {
                debug!(?rect, "crop too small");
            }
        }
        Reaction {
            commands,
            suppress_default: true,
        }
    }

    fn cancel_crop(&mut self) -> Reaction {
        match self.crop.take() {
            Some(_) => Reaction::with(vec![Command::EndCrop]),
            None => Reaction::none(),
        }
    }
}

/// Rectangle spanned by two corners
fn span(a: Point, b: Point) -> ElementBox {
    ElementBox::new(a.x.min(b.x), a.y.min(b.y), (a.x - b.x).abs(), (a.y - b.y).abs())
}
