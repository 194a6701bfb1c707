//! Bounded reconnect supervisor: dial the peer socket a fixed number of
//! times with fixed spacing, then run the command loop to completion. After
//! a give-up, nothing happens until an external retrigger.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gnss_core::Status;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::link::{self, Link};

pub const CONNECT_ATTEMPTS: u32 = 15;
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorOutcome {
    /// Connected; the command loop ran and has now exited.
    Finished,
    /// All attempts failed; idle until an external retrigger.
    GaveUp { attempts: u32 },
    /// Another run is active; this trigger is a no-op.
    AlreadyRunning,
}

/// One supervisor per process; triggers while a run is active are rejected
/// so exactly one connect attempt sequence and one command loop exist at a
/// time.
pub struct Supervisor {
    link: Arc<Link>,
    status: Arc<Mutex<Status>>,
    socket_path: PathBuf,
    data_dir: PathBuf,
    active: AtomicBool,
    attempts: u32,
    retry_delay: Duration,
}

impl Supervisor {
    pub fn new(link: Arc<Link>, status: Arc<Mutex<Status>>, config: &Config) -> Self {
        Self {
            link,
            status,
            socket_path: config.socket_path.clone(),
            data_dir: config.data_dir.clone(),
            active: AtomicBool::new(false),
            attempts: CONNECT_ATTEMPTS,
            retry_delay: CONNECT_RETRY_DELAY,
        }
    }

    /// Override the retry policy (tests; the defaults are contract).
    pub fn with_policy(mut self, attempts: u32, retry_delay: Duration) -> Self {
        self.attempts = attempts;
        self.retry_delay = retry_delay;
        self
    }

    /// Run one attempt sequence. Returns immediately if a run is already
    /// active.
    pub async fn run(&self) -> SupervisorOutcome {
        if self.active.swap(true, Ordering::SeqCst) {
            debug!("supervisor already active, ignoring trigger");
            return SupervisorOutcome::AlreadyRunning;
        }
        let outcome = self.dial_and_serve().await;
        self.active.store(false, Ordering::SeqCst);
        outcome
    }

    async fn dial_and_serve(&self) -> SupervisorOutcome {
        for attempt in 1..=self.attempts {
            match self.link.connect(&self.socket_path).await {
                Ok(reader) => {
                    info!(path = %self.socket_path.display(), "link to native peer established");
                    link::run_command_loop(
                        self.link.clone(),
                        reader,
                        self.status.clone(),
                        self.data_dir.clone(),
                    )
                    .await;
                    return SupervisorOutcome::Finished;
                }
                Err(e) => {
                    debug!(attempt, error = %e, "connect attempt failed");
                    if attempt < self.attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        warn!(
            attempts = self.attempts,
            "connect attempts exhausted, giving up until retriggered"
        );
        SupervisorOutcome::GaveUp {
            attempts: self.attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnss_core::proto;
    use tokio::io::AsyncWriteExt;
    use tokio::net::UnixListener;

    fn harness(socket_path: PathBuf, data_dir: PathBuf) -> (Arc<Link>, Arc<Supervisor>) {
        let link = Arc::new(Link::new());
        let status = Arc::new(Mutex::new(Status::new(link.clone())));
        let config = Config {
            socket_path,
            data_dir,
        };
        let supervisor = Arc::new(
            Supervisor::new(link.clone(), status, &config)
                .with_policy(3, Duration::from_millis(10)),
        );
        (link, supervisor)
    }

    #[test]
    fn default_policy_is_fifteen_attempts_five_seconds_apart() {
        assert_eq!(CONNECT_ATTEMPTS, 15);
        assert_eq!(CONNECT_RETRY_DELAY, Duration::from_secs(5));

        let link = Arc::new(Link::new());
        let status = Arc::new(Mutex::new(Status::new(link.clone())));
        let config = Config {
            socket_path: PathBuf::from("/run/gnss-bridge.sock"),
            data_dir: PathBuf::from("/var/lib/gnss-bridge"),
        };
        let supervisor = Supervisor::new(link, status, &config);
        assert_eq!(supervisor.attempts, CONNECT_ATTEMPTS);
        assert_eq!(supervisor.retry_delay, CONNECT_RETRY_DELAY);
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let (_link, supervisor) = harness(
            dir.path().join("absent.sock"),
            dir.path().to_path_buf(),
        );

        let outcome = supervisor.run().await;
        assert_eq!(outcome, SupervisorOutcome::GaveUp { attempts: 3 });

        // A fresh external trigger starts a new attempt sequence.
        let outcome = supervisor.run().await;
        assert_eq!(outcome, SupervisorOutcome::GaveUp { attempts: 3 });
    }

    #[tokio::test]
    async fn second_trigger_is_noop_while_active() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let (_link, supervisor) = harness(path, dir.path().to_path_buf());

        let first = supervisor.clone();
        let first_run = tokio::spawn(async move { first.run().await });
        let (mut peer, _) = listener.accept().await.unwrap();

        // The first run now owns the command loop; a second trigger must not
        // start another connect sequence.
        assert_eq!(supervisor.run().await, SupervisorOutcome::AlreadyRunning);

        peer.write_all(&[proto::CMD_QUIT]).await.unwrap();
        assert_eq!(first_run.await.unwrap(), SupervisorOutcome::Finished);

        // After the loop finished the guard is released again.
        drop(listener);
        assert_eq!(
            supervisor.run().await,
            SupervisorOutcome::GaveUp { attempts: 3 }
        );
    }

    #[tokio::test]
    async fn connects_and_finishes_on_peer_eof() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let (_link, supervisor) = harness(path, dir.path().to_path_buf());

        let run = {
            let supervisor = supervisor.clone();
            tokio::spawn(async move { supervisor.run().await })
        };
        let (peer, _) = listener.accept().await.unwrap();
        drop(peer);
        assert_eq!(run.await.unwrap(), SupervisorOutcome::Finished);
    }
}
