//! Client side of the panel firmware's framebuffer API.
//!
//! `GET /state` returns `{w, h, fb}` with `fb` the base64 of `w*h*3` row-major
//! RGB bytes; `/set`, `/clear` and `/size` mutate the framebuffer. A fetched
//! state becomes panel 0 of a single-frame session.

use crate::{
    color::Pixel,
    error::{Error, Result},
    session::{EditorSession, MAX_PANEL_SIZE},
    wall::Wall,
};
use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, general_purpose},
};
use serde::Deserialize;
use tracing::{debug, info, warn};

const FB_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    general_purpose::PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[inline]
fn encode_dec(buf: &mut itoa::Buffer, num: impl itoa::Integer) -> &str {
    buf.format(num)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    State,
    Set { x: usize, y: usize, pixel: Pixel },
    Clear,
    Size { width: usize, height: usize },
}

impl Request {
    pub fn path(&self) -> String {
        let mut num_buf = itoa::Buffer::new();
        let mut path = String::with_capacity(32);

        match *self {
            Self::State => path.push_str("/state"),
            Self::Clear => path.push_str("/clear"),
            Self::Set { x, y, pixel } => {
                path.push_str("/set?x=");
                path.push_str(encode_dec(&mut num_buf, x));
                path.push_str("&y=");
                path.push_str(encode_dec(&mut num_buf, y));
                path.push_str("&rgb=");
                path.push_str(encode_dec(&mut num_buf, pixel.r));
                path.push(',');
                path.push_str(encode_dec(&mut num_buf, pixel.g));
                path.push(',');
                path.push_str(encode_dec(&mut num_buf, pixel.b));
            }
            Self::Size { width, height } => {
                path.push_str("/size?w=");
                path.push_str(encode_dec(&mut num_buf, width));
                path.push_str("&h=");
                path.push_str(encode_dec(&mut num_buf, height));
            }
        }

        path
    }
}

#[derive(Deserialize)]
struct StateResponse {
    w: Option<f64>,
    h: Option<f64>,
    fb: Option<String>,
}

fn dimension(name: &str, value: Option<f64>) -> Result<usize> {
    let value = value.filter(|v| v.is_finite()).map_or(0.0, f64::trunc);
    if !(1.0..=MAX_PANEL_SIZE as f64).contains(&value) {
        return Err(Error::malformed(format!("{name} = {value} outside 1..={MAX_PANEL_SIZE}")));
    }

    Ok(value as usize)
}

/// Device framebuffer as reported by `GET /state`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceState {
    pub width: usize,
    pub height: usize,
    /// Row-major RGB bytes; may be shorter than `width * height * 3`.
    pub framebuffer: Vec<u8>,
}

impl DeviceState {
    /// Dimensions are truncated and must fall within `1..=MAX_PANEL_SIZE`.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let response: StateResponse = serde_json::from_slice(body)?;
        let width = dimension("w", response.w)?;
        let height = dimension("h", response.h)?;

        let framebuffer = match response.fb.as_deref() {
            Some(fb) if !fb.is_empty() => FB_ENGINE.decode(fb)?,
            _ => vec![0; width * height * 3],
        };

        Ok(Self {
            width,
            height,
            framebuffer,
        })
    }
}

/// Performs one `GET` against the device and returns the 2xx body.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&mut self, path: &str) -> Result<Vec<u8>>;
}

/// Mirrors panel 0 of a session to and from a device.
///
/// Requests are fire-and-report: a failure updates [`DeviceSync::status`] and
/// is returned to the caller, nothing is retried.
pub struct DeviceSync<T> {
    transport: T,
    base: String,
    connected: bool,
    status: String,
}

impl<T: Transport> DeviceSync<T> {
    pub fn new(base: impl Into<String>, transport: T) -> Self {
        Self {
            transport,
            base: base.into().trim().to_owned(),
            connected: false,
            status: "Not connected".to_owned(),
        }
    }

    /// True when an address is configured and the last state fetch succeeded.
    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn send(&mut self, request: Request) -> Result<Vec<u8>> {
        if self.base.is_empty() {
            return Err(Error::NotConnected);
        }

        let path = request.path();
        debug!(%path, "device request");
        self.transport.get(&path).await
    }

    fn fail(&mut self, op: &str, error: Error) -> Error {
        warn!(%error, op, "device request failed");
        self.status = format!("{op} failed: {error}");
        error
    }

    async fn refresh(&mut self, session: &mut EditorSession) -> Result<DeviceState> {
        let result = match self.send(Request::State).await {
            Ok(body) => DeviceState::decode(&body),
            Err(error) => Err(error),
        };

        let state = match result {
            Ok(state) if session.apply_device_state(&state) => state,
            Ok(state) => {
                self.connected = false;
                return Err(Error::malformed(format!(
                    "unusable framebuffer {}x{}",
                    state.width, state.height
                )));
            }
            Err(error) => {
                self.connected = false;
                return Err(error);
            }
        };

        self.connected = true;
        self.status = format!("Connected to {}", self.base);
        info!(
            base = %self.base,
            width = state.width,
            height = state.height,
            "fetched device state"
        );

        Ok(state)
    }

    /// Fetch the framebuffer and make it the session's only frame.
    pub async fn fetch_state(&mut self, session: &mut EditorSession) -> Result<DeviceState> {
        if self.base.is_empty() {
            self.connected = false;
            self.status = "Local preview (no device)".to_owned();
            return Err(Error::NotConnected);
        }

        let result = self.refresh(session).await;
        result.map_err(|error| self.fail("Connect", error))
    }

    pub async fn push_pixel(&mut self, x: usize, y: usize, pixel: Pixel) -> Result<()> {
        let result = self.send(Request::Set { x, y, pixel }).await;
        result.map(drop).map_err(|error| self.fail("Set", error))
    }

    /// Clear the device, then re-read its state.
    pub async fn clear_device(&mut self, session: &mut EditorSession) -> Result<()> {
        let result = match self.send(Request::Clear).await {
            Ok(_) => self.refresh(session).await.map(drop),
            Err(error) => Err(error),
        };

        result.map_err(|error| self.fail("Clear", error))
    }

    /// Resize the device framebuffer, then re-read its state.
    pub async fn resize_device(
        &mut self,
        width: usize,
        height: usize,
        session: &mut EditorSession,
    ) -> Result<()> {
        let result = match self.send(Request::Size { width, height }).await {
            Ok(_) => self.refresh(session).await.map(drop),
            Err(error) => Err(error),
        };

        result.map_err(|error| self.fail("Resize", error))
    }

    /// Upload panel 0 of `wall`, skipping cells that already match `previous`.
    ///
    /// Returns how many pixels were sent; stops at the first failure.
    pub async fn push_wall(&mut self, wall: &Wall, previous: Option<&Wall>) -> Result<usize> {
        let Some(panel) = wall.panel(0) else {
            return Ok(0);
        };
        let previous = previous.and_then(|wall| wall.panel(0));

        let mut sent = 0;
        for (x, y, pixel) in panel.pixels() {
            if previous.and_then(|prev| prev.get(x, y)) == Some(pixel) {
                continue;
            }

            self.push_pixel(x, y, pixel).await?;
            sent += 1;
        }

        debug!(sent, "pushed wall");
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_paths() {
        assert_eq!(Request::State.path(), "/state");
        assert_eq!(Request::Clear.path(), "/clear");
        assert_eq!(
            Request::Set {
                x: 3,
                y: 14,
                pixel: Pixel::new(255, 0, 128)
            }
            .path(),
            "/set?x=3&y=14&rgb=255,0,128"
        );
        assert_eq!(Request::Size { width: 32, height: 8 }.path(), "/size?w=32&h=8");
    }

    #[test]
    fn decodes_state() {
        // base64 of 01 02 03 04 05 06
        let state = DeviceState::decode(br#"{"w":2,"h":1,"fb":"AQIDBAUG"}"#).unwrap();
        assert_eq!((state.width, state.height), (2, 1));
        assert_eq!(state.framebuffer, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn missing_framebuffer_is_zeroed() {
        let state = DeviceState::decode(br#"{"w":2,"h":2}"#).unwrap();
        assert_eq!(state.framebuffer, vec![0; 12]);

        let state = DeviceState::decode(br#"{"w":1,"h":1,"fb":""}"#).unwrap();
        assert_eq!(state.framebuffer, vec![0; 3]);
    }

    #[test]
    fn unpadded_framebuffer_decodes() {
        let state = DeviceState::decode(br#"{"w":1,"h":1,"fb":"AQID"}"#).unwrap();
        assert_eq!(state.framebuffer, vec![1, 2, 3]);
        let state = DeviceState::decode(br#"{"w":1,"h":1,"fb":"AQI"}"#).unwrap();
        assert_eq!(state.framebuffer, vec![1, 2]);
    }

    #[test]
    fn fractional_dimensions_truncate() {
        let state = DeviceState::decode(br#"{"w":2.9,"h":1.2}"#).unwrap();
        assert_eq!((state.width, state.height), (2, 1));
        assert_eq!(state.framebuffer, vec![0; 6]);
    }

    #[test]
    fn out_of_range_dimensions_are_rejected() {
        for body in [
            r#"{"w":2,"h":-1}"#,
            r#"{"w":0,"h":4}"#,
            r#"{"h":4}"#,
            r#"{"w":129,"h":1}"#,
            r#"{"w":1e10,"h":1e10}"#,
            r#"{"w":100000,"h":100000,"fb":""}"#,
        ] {
            let result = DeviceState::decode(body.as_bytes());
            assert!(matches!(result, Err(Error::MalformedResponse(_))), "{body}");
        }

        let state = DeviceState::decode(br#"{"w":128,"h":128}"#).unwrap();
        assert_eq!(state.framebuffer.len(), 128 * 128 * 3);
    }

    #[test]
    fn broken_payloads_are_errors() {
        assert!(matches!(DeviceState::decode(b"{"), Err(Error::Json(_))));
        assert!(matches!(
            DeviceState::decode(br#"{"w":1,"h":1,"fb":"!!"}"#),
            Err(Error::Base64(_))
        ));
    }
}
