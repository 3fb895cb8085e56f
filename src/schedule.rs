//! Ebbinghaus-style review scheduling.
//!
//! Intervals come from a fixed table rather than a model of recall: each
//! consecutive easy answer moves a card one step further along
//! `[1, 3, 7, 14, 30]` days, and a hard answer always brings it back the
//! next day.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Card, Deck, Difficulty, ReviewOutcome};

/// Days until the next review after the 1st, 2nd, ... easy answer.
pub const EASY_INTERVALS: [u32; 5] = [1, 3, 7, 14, 30];

/// Days until the next review after a hard answer.
pub const HARD_INTERVAL: u32 = 1;

/// Interval in days for the `review_ordinal`-th review answered easy.
///
/// Ordinals past the end of the table stay on the last interval.
pub fn schedule_easy(review_ordinal: u32) -> u32 {
    let step = review_ordinal.saturating_sub(1) as usize;
    EASY_INTERVALS[step.min(EASY_INTERVALS.len() - 1)]
}

/// Applies a review outcome to a card.
#[derive(Debug, Default, Clone, Copy)]
pub struct Scheduler;

impl Scheduler {
    pub fn new() -> Self {
        Self
    }

    /// Update `card` for `outcome` answered at `now`. Skips leave the card untouched.
    pub fn review_card(&self, card: &mut Card, outcome: ReviewOutcome, now: DateTime<Utc>) {
        let days = match outcome {
            ReviewOutcome::Skip => return,
            ReviewOutcome::Easy => {
                card.learned = true;
                card.difficulty = Difficulty::Easy;
                card.reviews += 1;
                schedule_easy(card.reviews)
            }
            ReviewOutcome::Hard => {
                card.learned = false;
                card.difficulty = Difficulty::Hard;
                card.reviews += 1;
                HARD_INTERVAL
            }
        };

        card.last_review = Some(now);
        card.next_review_date = now + Duration::days(i64::from(days));
        log::debug!("{:?} answer, next review in {} day(s)", outcome, days);
    }

    /// Interval each outcome would produce for `card`, formatted for display.
    pub fn preview_intervals(&self, card: &Card) -> [(ReviewOutcome, String); 3] {
        ReviewOutcome::ALL.map(|outcome| {
            let label = match outcome {
                ReviewOutcome::Hard => format_interval(HARD_INTERVAL),
                ReviewOutcome::Easy => format_interval(schedule_easy(card.reviews + 1)),
                ReviewOutcome::Skip => "later".to_string(),
            };
            (outcome, label)
        })
    }
}

/// Cards whose next review date is at or before `now`, in deck order.
pub fn cards_needing_review_at(deck: &Deck, now: DateTime<Utc>) -> Vec<&Card> {
    deck.cards.iter().filter(|c| c.is_due_at(now)).collect()
}

/// Positions of the cards that are due at `now`, in deck order.
pub fn due_indices_at(deck: &Deck, now: DateTime<Utc>) -> Vec<usize> {
    deck.cards
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_due_at(now))
        .map(|(i, _)| i)
        .collect()
}

/// Human readable interval: `1d`, `1w`, `2w`, `1mo`.
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        d if d < 7 => format!("{}d", d),
        d if d < 30 => format!("{}w", d / 7),
        d => format!("{}mo", d / 30),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Card {
        Card::new("Bonjour".into(), "Hello".into())
    }

    #[test]
    fn test_schedule_easy_table() {
        assert_eq!(schedule_easy(1), 1);
        assert_eq!(schedule_easy(2), 3);
        assert_eq!(schedule_easy(3), 7);
        assert_eq!(schedule_easy(4), 14);
        assert_eq!(schedule_easy(5), 30);
        assert_eq!(schedule_easy(6), 30);
        assert_eq!(schedule_easy(100), 30);
    }

    #[test]
    fn test_schedule_easy_zero_ordinal_uses_first_step() {
        assert_eq!(schedule_easy(0), 1);
    }

    #[test]
    fn test_consecutive_easy_answers_follow_table() {
        let scheduler = Scheduler::new();
        let mut card = card();
        let expected = [1, 3, 7, 14, 30, 30, 30];

        for days in expected {
            let now = Utc::now();
            scheduler.review_card(&mut card, ReviewOutcome::Easy, now);
            let last = card.last_review.unwrap();
            assert_eq!((card.next_review_date - last).num_days(), days);
        }
        assert_eq!(card.reviews, 7);
        assert!(card.learned);
        assert_eq!(card.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_hard_is_always_one_day() {
        let scheduler = Scheduler::new();
        let mut card = card();
        card.reviews = 9;
        card.learned = true;

        let now = Utc::now();
        scheduler.review_card(&mut card, ReviewOutcome::Hard, now);

        assert_eq!(card.next_review_date, now + Duration::days(1));
        assert_eq!(card.reviews, 10);
        assert!(!card.learned);
        assert_eq!(card.difficulty, Difficulty::Hard);
        assert_eq!(card.last_review, Some(now));
    }

    #[test]
    fn test_skip_leaves_card_untouched() {
        let scheduler = Scheduler::new();
        let mut card = card();
        let before = card.clone();

        scheduler.review_card(&mut card, ReviewOutcome::Skip, Utc::now());

        assert_eq!(card, before);
    }

    #[test]
    fn test_cards_needing_review_preserves_order() {
        let mut deck = Deck::new("French".into());
        for front in ["a", "b", "c", "d"] {
            deck.add_card(front.into(), "x".into());
        }
        // New cards are due from the moment they are created.
        let now = Utc::now();
        deck.cards[1].next_review_date = now + Duration::days(2);
        deck.cards[3].next_review_date = now - Duration::days(5);
        deck.cards[0].next_review_date = now;

        let due: Vec<&str> = cards_needing_review_at(&deck, now)
            .iter()
            .map(|c| c.front.as_str())
            .collect();
        assert_eq!(due, vec!["a", "c", "d"]);
        assert_eq!(due_indices_at(&deck, now), vec![0, 2, 3]);
    }

    #[test]
    fn test_preview_intervals() {
        let scheduler = Scheduler::new();
        let mut card = card();
        let preview = scheduler.preview_intervals(&card);
        assert_eq!(preview[0], (ReviewOutcome::Hard, "1d".to_string()));
        assert_eq!(preview[1], (ReviewOutcome::Easy, "1d".to_string()));

        card.reviews = 3;
        let preview = scheduler.preview_intervals(&card);
        assert_eq!(preview[1].1, "2w");
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "now");
        assert_eq!(format_interval(1), "1d");
        assert_eq!(format_interval(3), "3d");
        assert_eq!(format_interval(7), "1w");
        assert_eq!(format_interval(14), "2w");
        assert_eq!(format_interval(30), "1mo");
    }
}
