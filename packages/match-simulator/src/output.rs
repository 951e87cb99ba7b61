//! Per-match JSON lines and the closing tally.

use serde::Serialize;

use crate::simulator::MatchReport;

#[derive(Debug, Serialize)]
pub struct MatchLine<'a> {
    pub game: u32,
    pub match_id: String,
    pub winner: Option<&'a str>,
    pub win_type: domino_engine::domain::WinType,
    pub moves: u32,
    pub balances: [u64; 2],
}

impl<'a> MatchLine<'a> {
    pub fn new(game: u32, report: &'a MatchReport) -> Self {
        Self {
            game,
            match_id: report.match_id.to_string(),
            winner: report.winner.as_ref().map(|w| w.as_str()),
            win_type: report.win_type,
            moves: report.moves,
            balances: report.balances,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct Tally {
    pub completed: u32,
    pub errors: u32,
    pub wins: [u32; 2],
    pub draws: u32,
    pub abandons: u32,
    pub blocked: u32,
    pub total_moves: u64,
    pub final_balances: [u64; 2],
}

impl Tally {
    pub fn record(&mut self, report: &MatchReport, players: &[String; 2]) {
        use domino_engine::domain::WinType;

        self.completed += 1;
        self.total_moves += u64::from(report.moves);
        self.final_balances = report.balances;
        match &report.winner {
            Some(w) => {
                if let Some(i) = players.iter().position(|p| p == w.as_str()) {
                    self.wins[i] += 1;
                }
            }
            None => self.draws += 1,
        }
        match report.win_type {
            WinType::Abandon => self.abandons += 1,
            WinType::Blocked => self.blocked += 1,
            WinType::EmptiedHand | WinType::DisconnectTimeout => {}
        }
    }

    pub fn print(&self, players: &[String; 2], elapsed: std::time::Duration) {
        println!("\n=== Simulation Summary ===");
        println!("Matches completed: {}", self.completed);
        if self.errors > 0 {
            println!("Errors: {}", self.errors);
        }
        println!("Total time: {elapsed:?}");
        if self.completed == 0 {
            return;
        }
        println!(
            "Average moves per match: {:.1}",
            self.total_moves as f64 / f64::from(self.completed)
        );
        println!("Blocked: {}  Abandoned: {}  Drawn: {}", self.blocked, self.abandons, self.draws);
        for (i, name) in players.iter().enumerate() {
            let rate = f64::from(self.wins[i]) / f64::from(self.completed) * 100.0;
            println!(
                "{name}: wins={} ({rate:.1}%), balance={}",
                self.wins[i], self.final_balances[i]
            );
        }
    }
}
