//! Two peers sharing one in-memory store, wired the way real clients are.

use std::sync::Arc;

use domino_engine::domain::tiles::canonical_set;
use domino_engine::domain::{BetMenu, Deal, Dealer, PlayerId, SessionId, Tile};
use domino_engine::error::AppError;
use domino_engine::ledger::{BalanceLedger, MemoryLedger};
use domino_engine::services::{EscrowService, MatchClient, SettlementEngine};
use domino_engine::store::{MemoryStore, SharedStore};
use engine_test_support::unique_pair;

/// Hands out the same deal every time.
pub struct FixedDealer(pub Deal);

impl Dealer for FixedDealer {
    fn deal(&self) -> Deal {
        self.0.clone()
    }
}

pub fn tile(a: u8, b: u8) -> Tile {
    Tile::new(a, b).expect("valid pips")
}

pub fn tiles(pairs: &[(u8, u8)]) -> Vec<Tile> {
    pairs.iter().map(|&(a, b)| tile(a, b)).collect()
}

/// Deal the given hands; everything else goes to the pile.
pub fn deal_of(first: &[(u8, u8)], second: &[(u8, u8)]) -> Deal {
    let first = tiles(first);
    let second = tiles(second);
    let pile: Vec<Tile> = canonical_set()
        .into_iter()
        .filter(|t| !first.contains(t) && !second.contains(t))
        .collect();
    Deal::from_parts(first, second, pile).expect("hands partition the set")
}

/// Inviter holds a run from 0|1 to 5|6 plus 4|6; the invitee holds every
/// double from 1|1 up plus 0|3. Played greedily the inviter empties first.
pub fn staircase_deal() -> Deal {
    deal_of(
        &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (4, 6)],
        &[(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6), (0, 3)],
    )
}

pub struct Peer {
    pub uid: PlayerId,
    pub escrow: EscrowService,
    pub client: Arc<MatchClient>,
}

pub struct Table {
    pub store: Arc<MemoryStore>,
    pub ledger: Arc<MemoryLedger>,
    pub session_id: SessionId,
    /// The inviter.
    pub a: Peer,
    pub b: Peer,
}

impl Table {
    pub fn new(balances: [u64; 2], dealer: Arc<dyn Dealer>) -> Self {
        let (a, b) = unique_pair("alice", "bob");
        let (a, b) = (PlayerId::from(a.as_str()), PlayerId::from(b.as_str()));
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(MemoryLedger::with_balances([
            (a.clone(), balances[0]),
            (b.clone(), balances[1]),
        ]));
        let session_id = SessionId::for_pair(&a, &b).expect("distinct players");
        let peer = |uid: PlayerId| {
            let shared: Arc<dyn SharedStore> = store.clone();
            let settlement = Arc::new(SettlementEngine::new(shared.clone(), ledger.clone()));
            Peer {
                escrow: EscrowService::new(
                    shared.clone(),
                    ledger.clone(),
                    BetMenu::default(),
                    dealer.clone(),
                ),
                client: Arc::new(MatchClient::new(
                    uid.clone(),
                    session_id.clone(),
                    shared,
                    settlement,
                )),
                uid,
            }
        };
        let a = peer(a);
        let b = peer(b);
        Self {
            store,
            ledger,
            session_id,
            a,
            b,
        }
    }

    pub fn with_deal(balances: [u64; 2], deal: Deal) -> Self {
        Self::new(balances, Arc::new(FixedDealer(deal)))
    }

    /// Open, agree on `bet` and start. Returns once the match record exists.
    pub async fn start_match(&self, bet: u64) -> Result<(), AppError> {
        self.a.escrow.open(&self.a.uid, &self.b.uid).await?;
        self.a.escrow.propose(&self.session_id, &self.a.uid, bet).await?;
        self.b.escrow.propose(&self.session_id, &self.b.uid, bet).await?;
        self.a.escrow.start(&self.session_id, &self.a.uid).await?;
        Ok(())
    }

    pub async fn balances(&self) -> [u64; 2] {
        [
            self.ledger.read_balance(&self.a.uid).await.expect("balance"),
            self.ledger.read_balance(&self.b.uid).await.expect("balance"),
        ]
    }
}

/// Hand index of `t` in the peer's current view.
pub async fn index_of(peer: &Peer, t: Tile) -> usize {
    let view = peer.client.view().await.expect("view");
    view.hand
        .iter()
        .position(|h| *h == t)
        .unwrap_or_else(|| panic!("{t:?} not in hand {:?}", view.hand))
}
