//! Transcript entity: the capacity-bounded history of one session

use crate::turn::entities::{Turn, TurnId};
use std::collections::VecDeque;
use thiserror::Error;

/// Maximum turns kept per session.
pub const DEFAULT_TRANSCRIPT_CAPACITY: usize = 20;

/// Errors raised by transcript mutation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Turn {0} is not terminal and cannot be persisted")]
    NotTerminal(TurnId),
}

/// Ordered turns of one session, oldest evicted first on overflow
///
/// Appending a turn whose id is already present replaces it in place, so a
/// retried write never duplicates a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    capacity: usize,
    /// Oldest first
    turns: VecDeque<Turn>,
}

impl Transcript {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            turns: VecDeque::new(),
        }
    }

    /// Rebuild from stored turns (oldest first), trimming to capacity
    pub fn from_turns(capacity: usize, turns: impl IntoIterator<Item = Turn>) -> Self {
        let mut transcript = Self::new(capacity);
        transcript.turns.extend(turns);
        transcript.evict_overflow();
        transcript
    }

    /// Append a terminal turn. Returns any turns evicted to stay in bounds.
    pub fn append(&mut self, turn: Turn) -> Result<Vec<Turn>, TranscriptError> {
        if !turn.is_terminal() {
            return Err(TranscriptError::NotTerminal(turn.turn_id));
        }
        if let Some(existing) = self.turns.iter_mut().find(|t| t.turn_id == turn.turn_id) {
            *existing = turn;
            return Ok(Vec::new());
        }
        self.turns.push_back(turn);
        Ok(self.evict_overflow())
    }

    /// Remove a turn by id
    pub fn remove(&mut self, turn_id: &TurnId) -> Option<Turn> {
        let index = self.turns.iter().position(|t| &t.turn_id == turn_id)?;
        self.turns.remove(index)
    }

    /// Turns, most recent first
    pub fn recent_first(&self) -> Vec<Turn> {
        self.turns.iter().rev().cloned().collect()
    }

    /// Turns, oldest first (storage order)
    pub fn oldest_first(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn get(&self, turn_id: &TurnId) -> Option<&Turn> {
        self.turns.iter().find(|t| &t.turn_id == turn_id)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn evict_overflow(&mut self) -> Vec<Turn> {
        let mut evicted = Vec::new();
        while self.turns.len() > self.capacity {
            if let Some(oldest) = self.turns.pop_front() {
                evicted.push(oldest);
            }
        }
        evicted
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSCRIPT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::UserMessage;
    use crate::core::model::ModelId;
    use crate::turn::entities::FusionOutcome;
    use crate::turn::value_objects::Generation;

    fn finished_turn(text: &str) -> Turn {
        let selection = vec![ModelId::from("a"), ModelId::from("b")];
        let mut turn = Turn::new(
            TurnId::generate(),
            UserMessage::new(text).unwrap(),
            &selection,
        );
        for branch in &mut turn.branches {
            branch.resolve(Ok(Generation::new("ok")));
        }
        turn.apply_fusion(FusionOutcome::synthesized("fused"));
        turn
    }

    #[test]
    fn test_append_beyond_capacity_evicts_exactly_the_oldest() {
        let mut transcript = Transcript::default();
        let turns: Vec<Turn> = (0..21).map(|i| finished_turn(&format!("q{}", i))).collect();

        for turn in turns.iter().take(20) {
            assert!(transcript.append(turn.clone()).unwrap().is_empty());
        }
        assert_eq!(transcript.len(), 20);

        let evicted = transcript.append(turns[20].clone()).unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].turn_id, turns[0].turn_id);
        assert_eq!(transcript.len(), 20);
    }

    #[test]
    fn test_recent_first_ordering() {
        let mut transcript = Transcript::default();
        let first = finished_turn("first");
        let second = finished_turn("second");
        transcript.append(first.clone()).unwrap();
        transcript.append(second.clone()).unwrap();

        let listed = transcript.recent_first();
        assert_eq!(listed[0].turn_id, second.turn_id);
        assert_eq!(listed[1].turn_id, first.turn_id);
    }

    #[test]
    fn test_non_terminal_turn_rejected() {
        let mut transcript = Transcript::default();
        let live = Turn::new(
            TurnId::generate(),
            UserMessage::new("live").unwrap(),
            &[ModelId::from("a"), ModelId::from("b")],
        );
        let id = live.turn_id;
        assert_eq!(
            transcript.append(live),
            Err(TranscriptError::NotTerminal(id))
        );
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_reappending_same_turn_does_not_duplicate() {
        let mut transcript = Transcript::default();
        let turn = finished_turn("once");
        transcript.append(turn.clone()).unwrap();
        transcript.append(turn.clone()).unwrap();
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut transcript = Transcript::default();
        let keep = finished_turn("keep");
        let drop = finished_turn("drop");
        transcript.append(keep.clone()).unwrap();
        transcript.append(drop.clone()).unwrap();

        assert!(transcript.remove(&drop.turn_id).is_some());
        assert!(transcript.remove(&drop.turn_id).is_none());
        assert_eq!(transcript.len(), 1);
        assert!(transcript.get(&keep.turn_id).is_some());
    }

    #[test]
    fn test_from_turns_trims_oldest() {
        let turns: Vec<Turn> = (0..5).map(|i| finished_turn(&format!("q{}", i))).collect();
        let transcript = Transcript::from_turns(3, turns.clone());
        assert_eq!(transcript.len(), 3);
        let oldest: Vec<TurnId> = transcript.oldest_first().map(|t| t.turn_id).collect();
        assert_eq!(
            oldest,
            vec![turns[2].turn_id, turns[3].turn_id, turns[4].turn_id]
        );
    }
}
