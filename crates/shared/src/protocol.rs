use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ButtonRequest;

/// Channel carrying freeform human-readable status text.
pub const RT_MESSAGE: &str = "rt_message";
pub const RT_DISCONNECT: &str = "rt_disconnect";
/// Channel carrying serialized [`RequestEnvelope`]s.
pub const RTPI_MESSAGE: &str = "rtpi_message";
pub const RTPI_DISCONNECT: &str = "rtpi_disconnect";

/// Fixed service port on the server host.
pub const SERVICE_PORT: u16 = 6181;

pub const ENVELOPE_VERSION: &str = "1.0";

/// Wire unit of the named-channel messenger: one JSON text frame
/// per message, tagged with the channel it travels on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub channel: String,
    pub payload: String,
}

impl Frame {
    pub fn new(channel: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
        }
    }
}

/// Structured request sent on [`RTPI_MESSAGE`] alongside the plain
/// status text. Field names are the wire schema; do not rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub pirequest: PiRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiRequest {
    pub version: String,
    pub utctime: String,
    pub locations: Vec<Location>,
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub locationid: String,
    pub locationdesc: String,
    pub sortorder: u32,
    pub locationtype: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub number: String,
    pub request: ButtonRequest,
}

impl RequestEnvelope {
    /// Builds the envelope for one location and one button. Everything
    /// except `buttons[0].request` and `utctime` stays fixed for the
    /// lifetime of the relay.
    pub fn new(location: Location, button_number: impl Into<String>) -> Self {
        Self {
            pirequest: PiRequest {
                version: ENVELOPE_VERSION.to_string(),
                utctime: String::new(),
                locations: vec![location],
                buttons: vec![Button {
                    number: button_number.into(),
                    request: ButtonRequest::Release,
                }],
            },
        }
    }

    /// Points the button at `request` and stamps `utctime` with the
    /// send time, RFC 3339 in UTC.
    pub fn prepare(&mut self, request: ButtonRequest, now: DateTime<Utc>) {
        self.pirequest.utctime = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        for button in &mut self.pirequest.buttons {
            button.request = request;
        }
    }
}
