use std::time::Instant;

use chrono::Utc;
use shared::{
    domain::ButtonRequest,
    protocol::{Location, RequestEnvelope, RT_MESSAGE, RTPI_MESSAGE},
};
use tracing::{debug, error, info};

pub mod transport;

pub use transport::{ChannelSignal, WsChannel};

/// Outbound half of the named-channel messenger. Sends are
/// fire-and-forget: no acknowledgement, no backpressure.
pub trait ChannelSink: Send + Sync {
    fn send(&self, channel: &'static str, payload: String);
}

/// External UI surface: a text input read on demand, a scrollable
/// display the buffer is rendered into, and a user-facing alert.
pub trait Surface {
    fn input_text(&self) -> String;
    /// Renders `lines` newest-first with the scroll position reset to
    /// the top.
    fn render_display(&self, lines: &[String]);
    fn alert(&self, message: &str);
}

/// Which pointer transition ended the press. A pointer leaving the
/// control's bounds while held counts as a release; touch platforms
/// do not reliably deliver the up signal after a swipe-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseKind {
    Up,
    Out,
}

impl ReleaseKind {
    fn status_label(self) -> &'static str {
        match self {
            ReleaseKind::Up => "Button Released",
            ReleaseKind::Out => "Button Released-Out",
        }
    }
}

/// Static configuration baked into every request envelope.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub location: Location,
    pub button_number: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            location: Location {
                locationid: "1".to_string(),
                locationdesc: "Visalia".to_string(),
                sortorder: 1,
                locationtype: "User".to_string(),
            },
            button_number: "1".to_string(),
        }
    }
}

/// Invariant: `press_started_at.is_some() == pressed`.
#[derive(Debug, Default)]
struct PressState {
    pressed: bool,
    press_started_at: Option<Instant>,
}

/// Received text lines, newest first. Unbounded.
#[derive(Debug, Default)]
pub struct DisplayBuffer {
    lines: Vec<String>,
}

impl DisplayBuffer {
    pub fn prepend(&mut self, line: String) {
        self.lines.insert(0, line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Relays press/release transitions on a single UI control to the
/// messaging channel and collects inbound messages for display.
///
/// Handlers are plain methods on an owned instance; the host event
/// loop serializes invocation, so the press guard only rejects
/// logically duplicate transitions, never concurrent access.
pub struct InputEventRelay<S, U> {
    sink: S,
    surface: U,
    press: PressState,
    envelope: RequestEnvelope,
    display: DisplayBuffer,
}

impl<S: ChannelSink, U: Surface> InputEventRelay<S, U> {
    pub fn new(config: RelayConfig, sink: S, surface: U) -> Self {
        Self {
            sink,
            surface,
            press: PressState::default(),
            envelope: RequestEnvelope::new(config.location, config.button_number),
            display: DisplayBuffer::default(),
        }
    }

    /// Press transition at the current instant.
    pub fn on_press(&mut self) {
        self.press_at(Instant::now());
    }

    /// Press transition with an explicit clock reading. No-op while
    /// already pressed, which absorbs repeated low-level pointer
    /// signals.
    pub fn press_at(&mut self, now: Instant) {
        if self.press.pressed {
            debug!("press ignored: button already pressed");
            return;
        }
        self.press.press_started_at = Some(now);
        self.press.pressed = true;
        self.emit_status("Button Pressed".to_string());
        self.emit_request(ButtonRequest::Press);
    }

    /// Release transition at the current instant.
    pub fn on_release(&mut self, kind: ReleaseKind) {
        self.release_at(kind, Instant::now());
    }

    /// Release transition with an explicit clock reading. Both release
    /// variants share this transition; `kind` only selects the status
    /// label. No-op unless currently pressed.
    pub fn release_at(&mut self, kind: ReleaseKind, now: Instant) {
        if !self.press.pressed {
            debug!(?kind, "release ignored: button not pressed");
            return;
        }
        let elapsed = self
            .press
            .press_started_at
            .take()
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default();
        self.press.pressed = false;
        self.emit_status(format!(
            "{}\nPressed Down for {} milliseconds",
            kind.status_label(),
            elapsed.as_millis()
        ));
        self.emit_request(ButtonRequest::Release);
    }

    /// Reads the surface's text input on demand and relays it verbatim
    /// on the status channel.
    pub fn send_input_message(&mut self) {
        let message = self.surface.input_text();
        info!(%message, "send status message");
        self.sink.send(RT_MESSAGE, message);
    }

    /// Prepends `payload` to the display for either recognized inbound
    /// channel. Content is never transformed or filtered.
    pub fn on_inbound_message(&mut self, channel: &str, payload: String) {
        if channel != RT_MESSAGE && channel != RTPI_MESSAGE {
            debug!(%channel, "dropping message on unrecognized channel");
            return;
        }
        info!(%channel, "received message");
        self.display.prepend(payload);
        self.surface.render_display(self.display.lines());
    }

    /// Unexpected channel termination: log the reason and raise a
    /// user-facing alert. Reconnection is the transport's concern,
    /// not the relay's.
    pub fn on_channel_terminated(&mut self, reason: &str) {
        error!(%reason, "channel terminated");
        self.surface.alert("Unexpected termination of connection.");
    }

    pub fn is_pressed(&self) -> bool {
        self.press.pressed
    }

    pub fn display(&self) -> &DisplayBuffer {
        &self.display
    }

    pub fn surface(&self) -> &U {
        &self.surface
    }

    fn emit_status(&self, message: String) {
        info!(%message, "relay status");
        self.sink.send(RT_MESSAGE, message);
    }

    fn emit_request(&mut self, request: ButtonRequest) {
        self.envelope.prepare(request, Utc::now());
        match serde_json::to_string(&self.envelope) {
            Ok(json) => self.sink.send(RTPI_MESSAGE, json),
            Err(err) => error!(%err, "failed to serialize request envelope"),
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
