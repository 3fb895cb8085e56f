//! One study pass over a deck.

use chrono::Utc;

use crate::error::Result;
use crate::models::{Card, Deck, DeckStats, ReviewOutcome, SessionStats};
use crate::schedule;
use crate::store::DeckStore;

/// Ephemeral state of a study session. Dropped once the session is finished.
#[derive(Debug, Clone)]
pub struct StudySession {
    deck_id: String,
    queue: Vec<usize>,
    position: usize,
    stats: SessionStats,
}

impl StudySession {
    /// Queue every card in deck order, or only the due ones when `due_only`.
    pub fn new(deck: &Deck, due_only: bool) -> Self {
        let queue = if due_only {
            schedule::due_indices_at(deck, Utc::now())
        } else {
            (0..deck.cards.len()).collect()
        };

        Self {
            deck_id: deck.id.clone(),
            queue,
            position: 0,
            stats: SessionStats::default(),
        }
    }

    pub fn deck_id(&self) -> &str {
        &self.deck_id
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Index into the deck's cards of the card being studied.
    pub fn current_index(&self) -> Option<usize> {
        self.queue.get(self.position).copied()
    }

    pub fn current_card<'a>(&self, store: &'a DeckStore) -> Option<&'a Card> {
        let index = self.current_index()?;
        store.deck(&self.deck_id)?.cards.get(index)
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.queue.len()
    }

    /// `(current card number, cards in session)`.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.queue.len();
        ((self.position + 1).min(total), total)
    }

    /// Record `outcome` for the current card and move to the next one.
    pub fn answer(&mut self, store: &mut DeckStore, outcome: ReviewOutcome) -> Result<()> {
        let Some(index) = self.current_index() else {
            return Ok(());
        };

        store.record_response(&self.deck_id, index, outcome)?;
        self.stats.tally(outcome);
        self.position += 1;
        Ok(())
    }

    /// Fold the session counts into the deck's stats.
    pub fn finish(self, store: &mut DeckStore) -> Result<Option<DeckStats>> {
        store.finish_session(&self.deck_id, &self.stats)
    }
}
