use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ids::PlayerId;

/// Opponent connectivity notifications, one channel per monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceEvent {
    /// The opponent went offline; they forfeit unless back within `grace`.
    OpponentDisconnected {
        uid: PlayerId,
        #[serde(with = "grace_secs")]
        grace: Duration,
    },
    OpponentRecovered {
        uid: PlayerId,
    },
    /// The grace period ran out and the forfeit was written.
    OpponentForfeited {
        uid: PlayerId,
    },
}

mod grace_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
