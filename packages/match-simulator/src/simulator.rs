//! Two automated peers playing full matches on one in-process store.

use std::sync::Arc;
use std::time::Duration;

use domino_engine::domain::{
    Dealer, MatchId, PlayerId, ProposeOutcome, RandomDealer, SeededDealer, SessionId, Side,
    WinType,
};
use domino_engine::ledger::{BalanceLedger, MemoryLedger, SeaLedger};
use domino_engine::protocol::MatchSessionView;
use domino_engine::services::{
    EscrowService, ExitResult, MatchClient, PlayResult, PresenceHandle, PresenceMonitor,
    PresenceTarget, SettlementEngine,
};
use domino_engine::store::{ConnectionId, MemoryStore, SharedStore};
use domino_engine::{AppError, EngineConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Safety stop for a match that somehow never finishes.
const MAX_TURNS: u32 = 200;

pub struct MatchReport {
    pub match_id: MatchId,
    pub winner: Option<PlayerId>,
    pub win_type: WinType,
    pub moves: u32,
    pub balances: [u64; 2],
}

/// One side of the table: its own connection and services.
struct Peer {
    uid: PlayerId,
    conn: ConnectionId,
    escrow: EscrowService,
    client: Arc<MatchClient>,
}

impl Peer {
    async fn connect(
        uid: PlayerId,
        opponent: &PlayerId,
        store: &Arc<MemoryStore>,
        ledger: &Arc<dyn BalanceLedger>,
        config: &EngineConfig,
        dealer: Arc<dyn Dealer>,
    ) -> Result<Self, AppError> {
        let shared: Arc<dyn SharedStore> = store.clone();
        let conn = shared.connect().await?;
        let escrow = EscrowService::new(
            shared.clone(),
            ledger.clone(),
            config.bet_menu.clone(),
            dealer,
        );
        let session_id = SessionId::for_pair(&uid, opponent)?;
        let settlement = Arc::new(SettlementEngine::new(shared.clone(), ledger.clone()));
        let client = Arc::new(MatchClient::new(uid.clone(), session_id, shared, settlement));
        Ok(Self {
            uid,
            conn,
            escrow,
            client,
        })
    }

    async fn watch_presence(
        &self,
        store: &Arc<MemoryStore>,
        opponent: &PlayerId,
        grace: Duration,
    ) -> Result<PresenceHandle, AppError> {
        let target = PresenceTarget {
            session_id: self.client.session_id().clone(),
            me: self.uid.clone(),
            opponent: opponent.clone(),
        };
        let (handle, mut events) = PresenceMonitor::new(
            store.clone(),
            self.conn,
            target,
            self.client.clone(),
            grace,
        )
        .start()
        .await?;
        let uid = self.uid.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                info!(%uid, ?event, "presence event");
            }
        });
        Ok(handle)
    }

    /// Greedy: heaviest playable tile, else draw, else pass.
    async fn take_turn(&self, view: &MatchSessionView) -> Result<(), AppError> {
        let best = view
            .playable
            .iter()
            .copied()
            .max_by_key(|&i| view.hand.get(i).map(|t| t.pip_sum()).unwrap_or(0));
        match best {
            Some(index) => {
                if let PlayResult::SideChoiceRequired { tile } = self.client.play(index).await? {
                    debug!(uid = %self.uid, ?tile, "tile fits both ends; playing right");
                    self.client.choose_side(Side::Right).await?;
                }
            }
            None if view.pile_count > 0 => {
                self.client.draw().await?;
            }
            None => {
                self.client.pass().await?;
            }
        }
        Ok(())
    }
}

pub struct Simulator {
    store: Arc<MemoryStore>,
    ledger: Arc<dyn BalanceLedger>,
    config: EngineConfig,
    players: [PlayerId; 2],
    rng: StdRng,
    seed: Option<u64>,
}

impl Simulator {
    /// Balances live in the `wallets` table when `DATABASE_URL` is set,
    /// otherwise in memory. Both players start at the configured balance.
    pub async fn new(config: EngineConfig, seed: Option<u64>) -> Result<Self, AppError> {
        let players = [PlayerId::from("alice"), PlayerId::from("bob")];
        let ledger: Arc<dyn BalanceLedger> = match config.database_url.as_deref() {
            Some(url) => {
                let ledger = SeaLedger::connect(url).await?;
                for p in &players {
                    ledger.write_balance(p, config.starting_balance).await?;
                }
                Arc::new(ledger)
            }
            None => Arc::new(MemoryLedger::with_balances(
                players
                    .iter()
                    .map(|p| (p.clone(), config.starting_balance)),
            )),
        };
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            store: Arc::new(MemoryStore::new()),
            ledger,
            config,
            players,
            rng,
            seed,
        })
    }

    pub fn players(&self) -> &[PlayerId; 2] {
        &self.players
    }

    pub async fn balances(&self) -> Result<[u64; 2], AppError> {
        Ok([
            self.ledger.read_balance(&self.players[0]).await?,
            self.ledger.read_balance(&self.players[1]).await?,
        ])
    }

    /// Negotiate, play and settle one match. The inviter alternates.
    pub async fn run_match(
        &mut self,
        game: u32,
        bet: u64,
        abandon_rate: f64,
    ) -> Result<MatchReport, AppError> {
        let (a, b) = if game % 2 == 1 {
            (self.players[0].clone(), self.players[1].clone())
        } else {
            (self.players[1].clone(), self.players[0].clone())
        };
        let dealer: Arc<dyn Dealer> = match self.seed {
            Some(s) => Arc::new(SeededDealer {
                seed: s.wrapping_add(u64::from(game)),
            }),
            None => Arc::new(RandomDealer),
        };
        let abandon_at = self
            .rng
            .random_bool(abandon_rate.clamp(0.0, 1.0))
            .then(|| self.rng.random_range(0..12u32));

        let inviter = Peer::connect(
            a.clone(),
            &b,
            &self.store,
            &self.ledger,
            &self.config,
            dealer.clone(),
        )
        .await?;
        let invitee =
            Peer::connect(b.clone(), &a, &self.store, &self.ledger, &self.config, dealer).await?;

        let record = inviter.escrow.open(&a, &b).await?;
        let sid = record.session_id;
        inviter.escrow.propose(&sid, &a, bet).await?;
        let outcome = invitee.escrow.propose(&sid, &b, bet).await?;
        debug!(game, ?outcome, "negotiation");
        if !matches!(outcome, ProposeOutcome::Matched { .. }) {
            return Err(AppError::internal("proposals did not match"));
        }

        let (started_a, started_b) =
            tokio::join!(inviter.escrow.start(&sid, &a), invitee.escrow.start(&sid, &b));
        let match_id = started_a?.session().match_id;
        if started_b?.session().match_id != match_id {
            return Err(AppError::internal("peers started different matches"));
        }

        let grace = self.config.disconnect_grace;
        let presence = [
            inviter.watch_presence(&self.store, &b, grace).await?,
            invitee.watch_presence(&self.store, &a, grace).await?,
        ];

        let peers = [&inviter, &invitee];
        let mut moves = 0;
        loop {
            let mut acted = false;
            for peer in peers {
                let view = peer.client.view().await?;
                if view.result.is_some() {
                    break;
                }
                if !view.your_turn {
                    continue;
                }
                if abandon_at == Some(moves) {
                    info!(game, uid = %peer.uid, moves, "peer abandons");
                    peer.client.abandon().await?;
                } else {
                    peer.take_turn(&view).await?;
                    moves += 1;
                }
                acted = true;
            }
            let view = inviter.client.view().await?;
            if view.result.is_some() {
                break;
            }
            if !acted || moves >= MAX_TURNS {
                return Err(AppError::internal(format!("match stalled after {moves} moves")));
            }
        }

        let final_view = inviter.client.view().await?;
        let (exit_a, exit_b) = tokio::join!(inviter.client.exit(), invitee.client.exit());
        for exit in [exit_a?, exit_b?] {
            if let ExitResult::Settled(result) = exit {
                debug!(game, receipt = ?result.receipt(), "settlement");
            }
        }
        for handle in presence {
            handle.shutdown().await;
        }
        for peer in peers {
            self.store.drop_connection(peer.conn).await?;
        }

        let result = final_view
            .result
            .ok_or_else(|| AppError::internal("finished match without a result"))?;
        Ok(MatchReport {
            match_id,
            winner: result.winner,
            win_type: result.win_type,
            moves,
            balances: self.balances().await?,
        })
    }
}
