//! Level generator boundary
//!
//! The generator is an external, possibly slow, possibly absent service. The
//! core never awaits it: a request carries a reply channel and the
//! transition polls the receiving end once per tick. Implementations may
//! answer synchronously (offline) or from a host callback (browser).

use async_channel::Sender;
use serde::{Deserialize, Serialize};

use super::Level;
use crate::error::GenerationError;

/// Context passed along with a level request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRequest {
    pub previous_level_name: String,
    pub score: u64,
    pub lives: u8,
    pub levels_visited: u32,
}

/// Context for the end-of-run performance review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub score: u64,
    pub levels_visited: u32,
}

pub type LevelReply = Sender<Result<Level, GenerationError>>;
pub type SummaryReply = Sender<Result<String, GenerationError>>;

/// Something that can produce the next level
///
/// Each request must be answered at most once through its reply channel.
/// Dropping the sender without answering counts as a failure.
pub trait LevelGenerator {
    fn request_level(&mut self, request: LevelRequest, reply: LevelReply);

    fn request_summary(&mut self, request: SummaryRequest, reply: SummaryReply) {
        let _ = request;
        let _ = reply.try_send(Err(GenerationError::Unavailable));
    }
}

/// Generator used when no external service is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

impl LevelGenerator for OfflineGenerator {
    fn request_level(&mut self, _request: LevelRequest, reply: LevelReply) {
        let _ = reply.try_send(Err(GenerationError::Unavailable));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_answers_unavailable() {
        let (tx, rx) = async_channel::unbounded();
        OfflineGenerator.request_level(
            LevelRequest {
                previous_level_name: "Home Base".to_string(),
                score: 0,
                lives: 3,
                levels_visited: 0,
            },
            tx,
        );
        assert!(matches!(rx.try_recv(), Ok(Err(GenerationError::Unavailable))));

        let (tx, rx) = async_channel::unbounded();
        OfflineGenerator.request_summary(
            SummaryRequest {
                score: 10,
                levels_visited: 1,
            },
            tx,
        );
        assert!(matches!(rx.try_recv(), Ok(Err(GenerationError::Unavailable))));
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let json = serde_json::to_string(&LevelRequest {
            previous_level_name: "Home Base".to_string(),
            score: 2500,
            lives: 2,
            levels_visited: 1,
        })
        .unwrap();
        assert!(json.contains("\"previousLevelName\":\"Home Base\""));
        assert!(json.contains("\"levelsVisited\":1"));
    }
}
