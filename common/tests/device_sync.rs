use panelforge_common::{DeviceSync, EditorSession, Error, Pixel, Result, Transport, Wall};
use std::collections::VecDeque;

/// Answers requests from a script and records every path it was asked for.
#[derive(Default)]
struct Scripted {
    replies: VecDeque<Result<Vec<u8>>>,
    paths: Vec<String>,
}

impl Scripted {
    fn reply(mut self, body: &str) -> Self {
        self.replies.push_back(Ok(body.as_bytes().to_vec()));
        self
    }

    fn fail(mut self, status: u16) -> Self {
        self.replies.push_back(Err(Error::Status(status)));
        self
    }
}

impl Transport for Scripted {
    async fn get(&mut self, path: &str) -> Result<Vec<u8>> {
        self.paths.push(path.to_owned());
        self.replies.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

const STATE_2X1: &str = r#"{"w":2,"h":1,"fb":"AQIDBAUG"}"#;

#[test]
fn fetch_state_connects() {
    let mut session = EditorSession::default();
    session.add_frame();
    let mut sync = DeviceSync::new("http://192.168.4.1", Scripted::default().reply(STATE_2X1));

    let state = pollster::block_on(sync.fetch_state(&mut session)).unwrap();
    assert_eq!((state.width, state.height), (2, 1));
    assert!(sync.connected());
    assert_eq!(sync.status(), "Connected to http://192.168.4.1");
    assert_eq!(session.frames().len(), 1);
    assert_eq!(session.working().panel(0).unwrap().get(1, 0), Some(Pixel::new(4, 5, 6)));
}

#[test]
fn empty_address_stays_local() {
    let mut session = EditorSession::default();
    let mut sync = DeviceSync::new("  ", Scripted::default());

    let err = pollster::block_on(sync.fetch_state(&mut session)).unwrap_err();
    assert!(matches!(err, Error::NotConnected));
    assert!(!sync.connected());
    assert_eq!(sync.status(), "Local preview (no device)");
    assert!(sync.transport().paths.is_empty());
}

#[test]
fn failed_fetch_disconnects() {
    let mut session = EditorSession::default();
    let transport = Scripted::default().reply(STATE_2X1).fail(503);
    let mut sync = DeviceSync::new("http://panel", transport);

    pollster::block_on(sync.fetch_state(&mut session)).unwrap();
    let err = pollster::block_on(sync.fetch_state(&mut session)).unwrap_err();

    assert!(matches!(err, Error::Status(503)));
    assert!(!sync.connected());
    assert_eq!(sync.status(), "Connect failed: HTTP 503");
    // the last good state stays in place
    assert_eq!(session.panel_size(), (2, 1));
}

#[test]
fn empty_framebuffer_is_not_a_connection() {
    let mut session = EditorSession::new(4, 4);
    session.add_frame();
    let mut sync = DeviceSync::new("http://panel", Scripted::default().reply(r#"{"w":0,"h":4}"#));

    let err = pollster::block_on(sync.fetch_state(&mut session)).unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
    assert!(!sync.connected());
    assert!(sync.status().starts_with("Connect failed: malformed response"));
    assert_eq!(session.panel_size(), (4, 4));
    assert_eq!(session.frames().len(), 2);
}

#[test]
fn oversized_framebuffer_is_rejected() {
    let mut session = EditorSession::default();
    let body = r#"{"w":1e10,"h":1e10,"fb":"AQID"}"#;
    let mut sync = DeviceSync::new("http://panel", Scripted::default().reply(body));

    let err = pollster::block_on(sync.fetch_state(&mut session)).unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
    assert!(!sync.connected());
    assert_eq!(session.panel_size(), (16, 16));
}

#[test]
fn push_pixel_failure_is_reported() {
    let mut sync = DeviceSync::new("http://panel", Scripted::default().fail(500));

    let err = pollster::block_on(sync.push_pixel(1, 2, Pixel::new(9, 8, 7))).unwrap_err();
    assert!(matches!(err, Error::Status(500)));
    assert_eq!(sync.status(), "Set failed: HTTP 500");
    assert_eq!(sync.transport().paths, ["/set?x=1&y=2&rgb=9,8,7"]);
}

#[test]
fn clear_and_resize_refetch_state() {
    let mut session = EditorSession::default();
    let transport = Scripted::default()
        .reply("")
        .reply(r#"{"w":2,"h":2}"#)
        .reply("")
        .reply(STATE_2X1);
    let mut sync = DeviceSync::new("http://panel", transport);

    pollster::block_on(sync.clear_device(&mut session)).unwrap();
    assert_eq!(session.panel_size(), (2, 2));
    assert_eq!(session.working(), &Wall::new(2, 2));

    pollster::block_on(sync.resize_device(2, 1, &mut session)).unwrap();
    assert_eq!(session.panel_size(), (2, 1));
    assert_eq!(sync.transport().paths, ["/clear", "/state", "/size?w=2&h=1", "/state"]);
}

#[test]
fn clear_failure_skips_refetch() {
    let mut session = EditorSession::default();
    let mut sync = DeviceSync::new("http://panel", Scripted::default().fail(404));

    pollster::block_on(sync.clear_device(&mut session)).unwrap_err();
    assert_eq!(sync.status(), "Clear failed: HTTP 404");
    assert_eq!(sync.transport().paths, ["/clear"]);
}

#[test]
fn push_wall_sends_only_changes() {
    let previous = Wall::from_device(2, 2, &[0; 12]);
    let mut next = previous.clone();
    next.panel_mut(0).unwrap().set(1, 1, Pixel::new(255, 0, 0));
    next.panel_mut(1).unwrap().set(0, 0, Pixel::new(0, 255, 0));

    let mut sync = DeviceSync::new("http://panel", Scripted::default());
    let sent = pollster::block_on(sync.push_wall(&next, Some(&previous))).unwrap();
    assert_eq!(sent, 1);
    assert_eq!(sync.transport().paths, ["/set?x=1&y=1&rgb=255,0,0"]);

    let sent = pollster::block_on(sync.push_wall(&next, None)).unwrap();
    assert_eq!(sent, 4);
}
