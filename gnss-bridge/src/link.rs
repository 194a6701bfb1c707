//! Link to the native peer: one unix-socket connection, framed notifications
//! out through a single writer task, single-byte commands in.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gnss_core::proto;
use gnss_core::wire;
use gnss_core::{MessageSink, Status};
use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::unix::OwnedReadHalf;
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Connection lifecycle. Exactly one live connection at a time; `Ready` is
/// the only state in which outbound sends go anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Connecting,
    Ready,
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("link already connecting or connected")]
    Busy,
    #[error("link closed for shutdown")]
    Shutdown,
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),
}

struct Inner {
    state: LinkState,
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

/// Explicitly owned connection handle shared by the command loop and all
/// senders. The mutex is only ever held for state flips and enqueues, never
/// across an await.
pub struct Link {
    inner: Mutex<Inner>,
}

impl Link {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: LinkState::Idle,
                tx: None,
            }),
        }
    }

    pub fn state(&self) -> LinkState {
        self.inner.lock().state
    }

    /// Dial the peer socket. On success the link is `Ready` and the returned
    /// read half feeds the command loop; on failure the link is back to
    /// `Idle` and the error is recoverable (caller decides retry).
    pub async fn connect(&self, path: &Path) -> Result<OwnedReadHalf, LinkError> {
        {
            let mut inner = self.inner.lock();
            match inner.state {
                LinkState::Idle => {}
                LinkState::Closed => return Err(LinkError::Shutdown),
                LinkState::Connecting | LinkState::Ready => return Err(LinkError::Busy),
            }
            inner.state = LinkState::Connecting;
        }

        let stream = match UnixStream::connect(path).await {
            Ok(stream) => stream,
            Err(e) => {
                self.inner.lock().state = LinkState::Idle;
                return Err(LinkError::Connect(e));
            }
        };

        let (reader, mut writer) = stream.into_split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        tokio::spawn(async move {
            // One channel message per pre-encoded frame keeps frames atomic
            // on the wire even with many concurrent senders.
            while let Some(frame) = rx.recv().await {
                if writer.write_all(&frame).await.is_err() {
                    warn!("peer write failed, stopping writer");
                    break;
                }
                if writer.flush().await.is_err() {
                    break;
                }
            }
        });

        let mut inner = self.inner.lock();
        inner.tx = Some(tx);
        inner.state = LinkState::Ready;
        Ok(reader)
    }

    /// Tear down after the command loop exits: readiness cleared, writer task
    /// drains and closes the socket. The link is eligible for reconnect.
    fn disconnect(&self) {
        let mut inner = self.inner.lock();
        inner.tx = None;
        inner.state = LinkState::Idle;
    }

    /// Shutdown for good; further connects are rejected.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.tx = None;
        inner.state = LinkState::Closed;
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSink for Link {
    /// Best-effort framed send. Dropped with a log line when the link is not
    /// ready; state-mutation callers never see the failure.
    fn send_text(&self, text: &str) {
        let inner = self.inner.lock();
        if inner.state != LinkState::Ready {
            debug!(message = text, "link not ready, dropping notification");
            return;
        }
        let Some(tx) = inner.tx.as_ref() else {
            return;
        };
        match wire::encode_frame(text) {
            Ok(frame) => {
                if tx.send(frame).is_err() {
                    warn!("writer task gone, could not notify peer");
                }
            }
            Err(e) => warn!(error = %e, "could not frame notification"),
        }
    }
}

/// Run the inbound command loop until quit, peer EOF or a read error. One
/// command byte per iteration; on exit the link readiness is cleared so
/// sends stop until a future reconnect.
pub async fn run_command_loop(
    link: Arc<Link>,
    mut reader: OwnedReadHalf,
    status: Arc<tokio::sync::Mutex<Status>>,
    data_dir: PathBuf,
) {
    debug!("starting command loop");
    loop {
        let mut cmd = [0u8; 1];
        match reader.read_exact(&mut cmd).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                debug!("peer closed the link");
                break;
            }
            Err(e) => {
                warn!(error = %e, "command read failed");
                break;
            }
        }

        match cmd[0] {
            proto::CMD_DOWNLOAD_PGPS_DATA => match read_download_command(&mut reader).await {
                Ok(command) => {
                    crate::download::fetch_pgps_data(link.as_ref(), &data_dir, &command).await;
                }
                Err(e) => {
                    warn!(error = %e, "could not read download command");
                    link.send_text(&proto::pgps_data_failed_message());
                }
            },
            proto::CMD_QUIT => {
                debug!("quit command received");
                break;
            }
            proto::CMD_SEND_ALL_INFO => {
                status.lock().await.send_all();
            }
            other => {
                debug!(command = other, "ignoring unknown command byte");
            }
        }
    }
    link.disconnect();
    debug!("command loop exiting");
}

/// The download command arrives as one length byte followed by that many
/// bytes of UTF-8 text.
async fn read_download_command(reader: &mut OwnedReadHalf) -> std::io::Result<String> {
    let mut len = [0u8; 1];
    reader.read_exact(&mut len).await?;
    let mut buf = vec![0u8; usize::from(len[0])];
    reader.read_exact(&mut buf).await?;
    String::from_utf8(buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
