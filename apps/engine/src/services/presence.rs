//! Opponent presence watching and disconnect forfeits.
//!
//! Each client announces itself online and arms an offline fallback on its
//! store connection, then watches the opponent's record. An offline opponent
//! gets a grace period; if a fresh read still shows them offline when it runs
//! out, the match is forfeited against them. Both clients run this; the
//! forfeit is idempotent so at most one terminal write lands.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::ids::{PlayerId, SessionId};
use crate::domain::session::MatchSession;
use crate::domain::state::ForfeitReason;
use crate::error::AppError;
use crate::protocol::events::PresenceEvent;
use crate::repos::presence::{self, PresenceRecord};
use crate::services::match_flow::{ForfeitResult, Forfeiter};
use crate::store::{typed, ConnectionId, SharedStore, SnapshotStream, StorePath};
use crate::utils::clock::now_ms;

const EVENT_BUFFER: usize = 16;

/// Never waits on the receiver: a reader that stops draining must not stall
/// the grace timer.
fn emit(tx: &mpsc::Sender<PresenceEvent>, event: PresenceEvent) {
    if let Err(e) = tx.try_send(event) {
        debug!(event = ?e.into_inner(), "presence event dropped");
    }
}

/// Who is watching whom, and where.
#[derive(Debug, Clone)]
pub struct PresenceTarget {
    pub session_id: SessionId,
    pub me: PlayerId,
    pub opponent: PlayerId,
}

/// Running monitor. Dropping the handle does not stop the task; call
/// [`shutdown`](Self::shutdown).
pub struct PresenceHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PresenceHandle {
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "presence monitor task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

pub struct PresenceMonitor {
    store: Arc<dyn SharedStore>,
    conn: ConnectionId,
    target: PresenceTarget,
    forfeiter: Arc<dyn Forfeiter>,
    grace: Duration,
}

/// Result of re-checking an offline opponent when the grace period ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraceCheck {
    /// The match is over, by our forfeit or otherwise.
    Ended,
    /// The opponent is back; wait for the stream to say so.
    Recovered,
    /// Could not decide; try again after another grace period.
    Retry,
}

/// What the opponent's record last told us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seen {
    Unseen,
    Online,
    Offline,
}

impl PresenceMonitor {
    pub fn new(
        store: Arc<dyn SharedStore>,
        conn: ConnectionId,
        target: PresenceTarget,
        forfeiter: Arc<dyn Forfeiter>,
        grace: Duration,
    ) -> Self {
        Self {
            store,
            conn,
            target,
            forfeiter,
            grace,
        }
    }

    /// Announce presence, subscribe, and spawn the watch loop.
    pub async fn start(self) -> Result<(PresenceHandle, mpsc::Receiver<PresenceEvent>), AppError> {
        let t = &self.target;
        presence::announce(
            self.store.as_ref(),
            self.conn,
            &t.session_id,
            &t.me,
            now_ms(),
        )
        .await?;

        let opponent_path = StorePath::presence(&t.session_id, &t.opponent);
        let match_path = StorePath::match_record(&t.session_id);
        let opponent_stream = self.store.subscribe(&opponent_path).await?;
        let match_stream = self.store.subscribe(&match_path).await?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(
            opponent_stream,
            match_stream,
            tx,
            cancel.clone(),
        ));
        Ok((PresenceHandle { cancel, task }, rx))
    }

    async fn run(
        self,
        mut opponent_stream: SnapshotStream,
        mut match_stream: SnapshotStream,
        tx: mpsc::Sender<PresenceEvent>,
        cancel: CancellationToken,
    ) {
        let t = self.target.clone();
        let opponent_path = StorePath::presence(&t.session_id, &t.opponent);
        let match_path = StorePath::match_record(&t.session_id);
        let mut seen = Seen::Unseen;
        let mut match_seen = false;
        let timer = sleep(self.grace);
        tokio::pin!(timer);
        let mut armed = false;

        info!(session_id = %t.session_id, uid = %t.me, opponent = %t.opponent, "presence monitor started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                snap = opponent_stream.next() => {
                    let Some(snap) = snap else { break };
                    let record = match snap.map(|s| typed::decode::<PresenceRecord>(&opponent_path, s)).transpose() {
                        Ok(r) => r.map(|s| s.value),
                        Err(e) => {
                            warn!(error = %e, "ignoring unreadable presence record");
                            continue;
                        }
                    };
                    let now = match record {
                        None => Seen::Unseen,
                        Some(r) if r.connected => Seen::Online,
                        Some(_) => Seen::Offline,
                    };
                    match (seen, now) {
                        (Seen::Online | Seen::Unseen, Seen::Offline) => {
                            info!(session_id = %t.session_id, opponent = %t.opponent, grace_secs = self.grace.as_secs(), "opponent disconnected");
                            timer.as_mut().reset(Instant::now() + self.grace);
                            armed = true;
                            emit(&tx, PresenceEvent::OpponentDisconnected {
                                uid: t.opponent.clone(),
                                grace: self.grace,
                            });
                        }
                        (Seen::Offline, Seen::Online) => {
                            info!(session_id = %t.session_id, opponent = %t.opponent, "opponent recovered");
                            armed = false;
                            emit(&tx, PresenceEvent::OpponentRecovered {
                                uid: t.opponent.clone(),
                            });
                        }
                        _ => {}
                    }
                    seen = now;
                }

                snap = match_stream.next() => {
                    let Some(snap) = snap else { break };
                    match snap {
                        None if match_seen => {
                            debug!(session_id = %t.session_id, "match record removed");
                            break;
                        }
                        None => {}
                        Some(snap) => {
                            match_seen = true;
                            match typed::decode::<MatchSession>(&match_path, snap) {
                                Ok(s) if s.value.state.is_finished() => {
                                    debug!(session_id = %t.session_id, "match finished; monitor stopping");
                                    break;
                                }
                                Ok(_) => {}
                                Err(e) => warn!(error = %e, "ignoring unreadable match record"),
                            }
                        }
                    }
                }

                () = &mut timer, if armed => {
                    armed = false;
                    match self.grace_expired(&tx).await {
                        GraceCheck::Ended => break,
                        GraceCheck::Recovered => {}
                        GraceCheck::Retry => {
                            timer.as_mut().reset(Instant::now() + self.grace);
                            armed = true;
                        }
                    }
                }
            }
        }

        if let Err(e) = presence::withdraw(self.store.as_ref(), self.conn, &t.session_id, &t.me).await {
            debug!(error = %e, "presence fallback not withdrawn");
        }
        info!(session_id = %t.session_id, uid = %t.me, "presence monitor stopped");
    }

    /// Grace ran out. Re-read before acting: the opponent may have come back
    /// between the last notification and now.
    async fn grace_expired(&self, tx: &mpsc::Sender<PresenceEvent>) -> GraceCheck {
        let t = &self.target;
        let fresh = match presence::find(self.store.as_ref(), &t.session_id, &t.opponent).await {
            Ok(r) => r.map(|s| s.value),
            Err(e) => {
                // Unreachable store: re-arm rather than forfeit on stale data.
                warn!(error = %e, "presence re-check failed");
                return GraceCheck::Retry;
            }
        };
        if matches!(fresh, Some(PresenceRecord { connected: true, .. })) {
            debug!(opponent = %t.opponent, "opponent back before forfeit");
            return GraceCheck::Recovered;
        }

        match self
            .forfeiter
            .forfeit(&t.opponent, ForfeitReason::DisconnectTimeout)
            .await
        {
            Ok(ForfeitResult::Applied(_)) => {
                info!(session_id = %t.session_id, opponent = %t.opponent, "opponent forfeited on disconnect timeout");
                emit(tx, PresenceEvent::OpponentForfeited {
                    uid: t.opponent.clone(),
                });
                GraceCheck::Ended
            }
            Ok(other) => {
                debug!(result = ?other, "match already over at grace expiry");
                GraceCheck::Ended
            }
            Err(e) => {
                warn!(error = %e, "disconnect forfeit failed");
                GraceCheck::Retry
            }
        }
    }
}
