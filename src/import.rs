//! Parsers that turn JSON, CSV and plain-text files into decks.
//!
//! Parsers never touch the store. They either return every deck the file
//! describes or a [`StoreError::Format`], so a failed import adds nothing.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Result, StoreError};
use crate::models::{Card, Deck, Difficulty};

pub const DEFAULT_JSON_DECK_NAME: &str = "Imported Deck";
pub const CSV_DECK_NAME: &str = "Imported CSV Deck";
pub const TXT_DECK_NAME: &str = "Imported TXT Deck";

/// File formats accepted by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
    Txt,
}

impl ImportFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            Some("txt") => Ok(Self::Txt),
            _ => Err(StoreError::format("Unsupported file format")),
        }
    }

    pub fn parse(self, content: &str) -> Result<Vec<Deck>> {
        match self {
            Self::Json => parse_json(content),
            Self::Csv => parse_csv(content),
            Self::Txt => parse_txt(content),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    decks: Vec<ImportedDeck>,
}

#[derive(Deserialize)]
struct ImportedDeck {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    cards: Vec<ImportedCard>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedCard {
    #[serde(default)]
    front: String,
    #[serde(default)]
    back: String,
    // Explicit nulls fall back to defaults like missing keys do.
    #[serde(default)]
    learned: Option<bool>,
    #[serde(default)]
    difficulty: Option<Difficulty>,
    #[serde(default)]
    reviews: Option<u32>,
    #[serde(default)]
    last_review: Option<DateTime<Utc>>,
    #[serde(default)]
    next_review_date: Option<DateTime<Utc>>,
}

impl ImportedCard {
    fn into_card(self, now: DateTime<Utc>) -> Option<Card> {
        let front = self.front.trim();
        let back = self.back.trim();
        if front.is_empty() || back.is_empty() {
            return None;
        }

        Some(Card {
            front: front.to_string(),
            back: back.to_string(),
            learned: self.learned.unwrap_or_default(),
            difficulty: self.difficulty.unwrap_or_default(),
            reviews: self.reviews.unwrap_or_default(),
            last_review: self.last_review,
            next_review_date: self.next_review_date.unwrap_or(now),
        })
    }
}

/// Parse a `{ "decks": [...] }` document, such as one written by export.
pub fn parse_json(content: &str) -> Result<Vec<Deck>> {
    let envelope: Envelope = serde_json::from_str(content).map_err(|e| {
        StoreError::format(format!(
            "Invalid JSON format. Expected \"decks\" array. ({})",
            e
        ))
    })?;

    let now = Utc::now();
    let decks = envelope
        .decks
        .into_iter()
        .map(|imported| {
            let name = imported
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_JSON_DECK_NAME.to_string());

            let mut deck = Deck::new(name);
            deck.cards = imported
                .cards
                .into_iter()
                .filter_map(|c| c.into_card(now))
                .collect();
            deck
        })
        .collect();

    Ok(decks)
}

/// Parse `front,back` rows after a header line into one deck.
pub fn parse_csv(content: &str) -> Result<Vec<Deck>> {
    let content = content.trim();
    if content.lines().count() < 2 {
        return Err(StoreError::format(
            "CSV file must have at least a header and one data row",
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut deck = Deck::new(CSV_DECK_NAME.to_string());
    for record in reader.records() {
        let record = record.map_err(|e| StoreError::format(format!("Invalid CSV: {}", e)))?;
        let front = record.get(0).unwrap_or_default();
        let back = record.get(1).unwrap_or_default();

        if !front.is_empty() && !back.is_empty() {
            deck.add_card(front.to_string(), back.to_string());
        }
    }

    if deck.cards.is_empty() {
        return Err(StoreError::format("No valid cards found in CSV"));
    }

    Ok(vec![deck])
}

/// Parse alternating front/back lines into one deck. Blank lines are ignored.
pub fn parse_txt(content: &str) -> Result<Vec<Deck>> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.len() < 2 || lines.len() % 2 != 0 {
        return Err(StoreError::format(
            "TXT file must have pairs of lines (front and back alternating)",
        ));
    }

    let mut deck = Deck::new(TXT_DECK_NAME.to_string());
    for pair in lines.chunks_exact(2) {
        deck.add_card(pair[0].to_string(), pair[1].to_string());
    }

    Ok(vec![deck])
}
