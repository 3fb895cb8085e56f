//! Statistics across one deck or the whole collection.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

use crate::models::Deck;
use crate::schedule;

/// Expected retention (percent) after each step of the review schedule, in days.
pub const RETENTION_CURVE: [(u32, u8); 5] = [(1, 90), (3, 72), (7, 54), (14, 35), (30, 21)];

/// One step of the retention forecast shown after a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastStep {
    pub days: u32,
    pub date: NaiveDate,
    pub retention: u8,
}

/// Calendar dates for each step of [`RETENTION_CURVE`] counted from `now`.
pub fn forecast(now: DateTime<Utc>) -> Vec<ForecastStep> {
    RETENTION_CURVE
        .iter()
        .map(|&(days, retention)| ForecastStep {
            days,
            date: (now + Duration::days(i64::from(days)))
                .with_timezone(&Local)
                .date_naive(),
            retention,
        })
        .collect()
}

/// `part / whole` as a percentage with one decimal, 0 when `whole` is 0.
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

fn average(total: usize, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (total as f64 / count as f64 * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeckSummary {
    pub name: String,
    pub cards: usize,
    pub learned: usize,
    pub retention: f64,
    pub total_reviews: u32,
    pub sessions: u32,
    pub needs_review: usize,
    pub average_accuracy: f64,
}

impl DeckSummary {
    pub fn of(deck: &Deck, now: DateTime<Utc>) -> Self {
        let learned = deck.learned_count();
        Self {
            name: deck.name.clone(),
            cards: deck.cards.len(),
            learned,
            retention: percent(learned, deck.cards.len()),
            total_reviews: deck.stats.total_reviews,
            sessions: deck.stats.total_study_sessions,
            needs_review: schedule::cards_needing_review_at(deck, now).len(),
            average_accuracy: deck.stats.average_accuracy,
        }
    }
}

/// Totals over every deck.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analytics {
    pub total_decks: usize,
    pub total_cards: usize,
    pub total_learned: usize,
    pub overall_retention: f64,
    pub total_reviews: u32,
    pub total_sessions: u32,
    pub avg_cards_per_deck: f64,
    pub avg_reviews_per_deck: f64,
    pub decks: Vec<DeckSummary>,
}

impl Analytics {
    pub fn of(decks: &[Deck], now: DateTime<Utc>) -> Self {
        let summaries: Vec<DeckSummary> = decks.iter().map(|d| DeckSummary::of(d, now)).collect();

        let total_cards: usize = summaries.iter().map(|s| s.cards).sum();
        let total_learned: usize = summaries.iter().map(|s| s.learned).sum();
        let total_reviews: u32 = summaries.iter().map(|s| s.total_reviews).sum();
        let total_sessions: u32 = summaries.iter().map(|s| s.sessions).sum();

        Self {
            total_decks: decks.len(),
            total_cards,
            total_learned,
            overall_retention: percent(total_learned, total_cards),
            total_reviews,
            total_sessions,
            avg_cards_per_deck: average(total_cards, decks.len()),
            avg_reviews_per_deck: average(total_reviews as usize, decks.len()),
            decks: summaries,
        }
    }
}
