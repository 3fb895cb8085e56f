//! Data models for flashcards and decks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// How well a card was recalled during a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewOutcome {
    Hard,
    Easy,
    Skip,
}

impl ReviewOutcome {
    pub const ALL: [ReviewOutcome; 3] = [Self::Hard, Self::Easy, Self::Skip];

    pub fn from_key(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::Hard),
            '2' => Some(Self::Easy),
            '3' | 's' => Some(Self::Skip),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hard => "Hard",
            Self::Easy => "Easy",
            Self::Skip => "Skip",
        }
    }

    pub fn color_for_theme(&self, theme: &crate::ui::Theme) -> ratatui::style::Color {
        match self {
            Self::Hard => theme.colors.rating_hard,
            Self::Easy => theme.colors.rating_easy,
            Self::Skip => theme.colors.rating_skip,
        }
    }
}

/// Where a card stands after its latest review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    New,
    Easy,
    Hard,
}

/// A single flashcard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub front: String,
    pub back: String,

    // Review state
    #[serde(default)]
    pub learned: bool,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default)]
    pub last_review: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub next_review_date: DateTime<Utc>,
}

impl Card {
    pub fn new(front: String, back: String) -> Self {
        Self {
            front,
            back,
            learned: false,
            difficulty: Difficulty::New,
            reviews: 0,
            last_review: None,
            next_review_date: Utc::now(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.difficulty == Difficulty::New
    }

    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        self.next_review_date <= now
    }

    pub fn is_due(&self) -> bool {
        self.is_due_at(Utc::now())
    }

    /// Forget all review history; the card becomes due at `now`.
    pub fn reset_progress(&mut self, now: DateTime<Utc>) {
        self.learned = false;
        self.difficulty = Difficulty::New;
        self.reviews = 0;
        self.last_review = None;
        self.next_review_date = now;
    }
}

/// Persisted statistics for a deck, rewritten at the end of each session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeckStats {
    pub total_reviews: u32,
    pub cards_learned: u32,
    /// Never computed; kept so stored documents keep their shape.
    pub current_streak: u32,
    pub last_review: Option<DateTime<Utc>>,
    pub total_study_sessions: u32,
    #[serde(deserialize_with = "number_or_string")]
    pub average_accuracy: f64,
}

/// Accepts `75`, `75.0` or `"75.0"`; older exports stored the percentage as text.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Response counts for a single study session. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub easy: u32,
    pub hard: u32,
    pub skipped: u32,
}

impl SessionStats {
    pub fn tally(&mut self, outcome: ReviewOutcome) {
        match outcome {
            ReviewOutcome::Easy => self.easy += 1,
            ReviewOutcome::Hard => self.hard += 1,
            ReviewOutcome::Skip => self.skipped += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.easy + self.hard + self.skipped
    }

    /// Share of easy responses as a percentage truncated to one decimal.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let pct = f64::from(self.easy) / f64::from(total) * 100.0;
        (pct * 10.0).trunc() / 10.0
    }
}

/// Card counts derived from a deck's current state, for display.
#[derive(Debug, Default)]
pub struct DeckCounts {
    pub total_cards: usize,
    pub new_cards: usize,
    pub learned_cards: usize,
    pub due_cards: usize,
}

/// A named, ordered collection of flashcards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default = "Utc::now")]
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub stats: DeckStats,
}

impl Deck {
    pub fn new(name: String) -> Self {
        Self {
            id: new_id(),
            name,
            cards: Vec::new(),
            created_date: Utc::now(),
            stats: DeckStats::default(),
        }
    }

    pub fn add_card(&mut self, front: String, back: String) -> &Card {
        self.cards.push(Card::new(front, back));
        &self.cards[self.cards.len() - 1]
    }

    pub fn learned_count(&self) -> usize {
        self.cards.iter().filter(|c| c.learned).count()
    }

    pub fn counts_at(&self, now: DateTime<Utc>) -> DeckCounts {
        let mut counts = DeckCounts {
            total_cards: self.cards.len(),
            ..Default::default()
        };

        for card in &self.cards {
            if card.is_new() {
                counts.new_cards += 1;
            }
            if card.learned {
                counts.learned_cards += 1;
            }
            if card.is_due_at(now) {
                counts.due_cards += 1;
            }
        }

        counts
    }

    pub fn counts(&self) -> DeckCounts {
        self.counts_at(Utc::now())
    }
}

/// Random identifier for a deck: 32 hex characters.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_card_defaults() {
        let card = Card::new("Hola".into(), "Hello".into());
        assert!(!card.learned);
        assert_eq!(card.difficulty, Difficulty::New);
        assert_eq!(card.reviews, 0);
        assert!(card.last_review.is_none());
        assert!(card.is_due());
    }

    #[test]
    fn test_reset_progress() {
        let now = Utc::now();
        let mut card = Card::new("a".into(), "b".into());
        card.learned = true;
        card.difficulty = Difficulty::Easy;
        card.reviews = 4;
        card.last_review = Some(now);
        card.next_review_date = now + Duration::days(14);

        card.reset_progress(now);

        assert!(!card.learned);
        assert_eq!(card.difficulty, Difficulty::New);
        assert_eq!(card.reviews, 0);
        assert!(card.last_review.is_none());
        assert_eq!(card.next_review_date, now);
    }

    #[test]
    fn test_session_accuracy() {
        let stats = SessionStats { easy: 3, hard: 1, skipped: 0 };
        assert_eq!(stats.accuracy(), 75.0);

        let stats = SessionStats { easy: 2, hard: 1, skipped: 0 };
        assert_eq!(stats.accuracy(), 66.6);

        assert_eq!(SessionStats::default().accuracy(), 0.0);
    }

    #[test]
    fn test_card_serializes_camel_case() {
        let card = Card::new("Merci".into(), "Thanks".into());
        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("nextReviewDate").is_some());
        assert!(json.get("lastReview").is_some());
        assert_eq!(json["difficulty"], "new");
    }

    #[test]
    fn test_card_missing_fields_get_defaults() {
        let card: Card = serde_json::from_str(r#"{"front":"Bonjour","back":"Hello"}"#).unwrap();
        assert!(!card.learned);
        assert_eq!(card.difficulty, Difficulty::New);
        assert_eq!(card.reviews, 0);
        assert!(card.is_due());
    }

    #[test]
    fn test_stats_accept_text_accuracy() {
        let stats: DeckStats =
            serde_json::from_str(r#"{"totalReviews":4,"averageAccuracy":"75.0"}"#).unwrap();
        assert_eq!(stats.total_reviews, 4);
        assert_eq!(stats.average_accuracy, 75.0);
    }

    #[test]
    fn test_deck_counts() {
        let mut deck = Deck::new("Spanish".into());
        deck.add_card("Hola".into(), "Hello".into());
        deck.add_card("Gracias".into(), "Thanks".into());
        let now = Utc::now();
        deck.cards[1].learned = true;
        deck.cards[1].difficulty = Difficulty::Easy;
        deck.cards[1].next_review_date = now + Duration::days(3);

        let counts = deck.counts_at(now);
        assert_eq!(counts.total_cards, 2);
        assert_eq!(counts.new_cards, 1);
        assert_eq!(counts.learned_cards, 1);
        assert_eq!(counts.due_cards, 1);
    }
}
