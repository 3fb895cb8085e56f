//! Storage module for saving and loading the deck collection.
//!
//! The whole collection lives in one JSON file holding an array of decks.
//! Every save rewrites the file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Card, Deck, Difficulty};

/// Handles deck persistence.
pub struct DeckStorage {
    path: PathBuf,
}

impl DeckStorage {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Get default storage location.
    pub fn default_path() -> PathBuf {
        data_dir().join("decks.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every deck. A missing or blank file is an empty collection.
    ///
    /// Files written by the older learned-index layout are converted and
    /// written back in the current layout before returning.
    pub fn load(&self) -> Result<Vec<Deck>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Persisted>(&json)? {
            Persisted::Current(decks) => Ok(decks),
            Persisted::Legacy(legacy) => {
                log::warn!(
                    "Migrating learned-index deck file {:?} to the current layout",
                    self.path
                );
                let decks = legacy.migrate(Utc::now());
                self.save(&decks)?;
                Ok(decks)
            }
        }
    }

    /// Replace the stored collection with `decks`.
    ///
    /// Writes a sibling temp file and renames it over the deck file, so a
    /// crash mid-write never leaves a truncated collection behind.
    pub fn save(&self, decks: &[Deck]) -> Result<()> {
        let json = serde_json::to_string_pretty(decks)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        log::debug!("Saved {} deck(s) to {:?}", decks.len(), self.path);
        Ok(())
    }

    /// Get default backup path.
    pub fn default_backup_path() -> PathBuf {
        let date = chrono::Local::now().format("%Y-%m-%d");
        dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(format!("flashcards-backup-{}.json", date))
    }

    /// Log file used while the terminal UI owns the screen.
    pub fn default_log_path() -> PathBuf {
        data_dir().join("flashdeck.log")
    }
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flashdeck")
}

/// Backup format containing all decks. The JSON importer reads it back.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub decks: Vec<Deck>,
}

impl Backup {
    pub const VERSION: u32 = 1;

    pub fn new(decks: Vec<Deck>) -> Self {
        Self {
            version: Self::VERSION,
            exported_at: Utc::now(),
            decks,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Persisted {
    Current(Vec<Deck>),
    Legacy(LegacyState),
}

/// Layout used by the simpler variant of the app: bare decks plus a map
/// from deck position to the indices of its learned cards.
#[derive(Deserialize)]
struct LegacyState {
    decks: Vec<LegacyDeck>,
    #[serde(default)]
    learned: HashMap<String, Vec<usize>>,
}

#[derive(Deserialize)]
struct LegacyDeck {
    name: String,
    #[serde(default)]
    cards: Vec<LegacyCard>,
}

#[derive(Deserialize)]
struct LegacyCard {
    #[serde(alias = "question")]
    front: String,
    #[serde(alias = "answer")]
    back: String,
}

impl LegacyState {
    fn migrate(self, now: DateTime<Utc>) -> Vec<Deck> {
        let learned = self.learned;

        self.decks
            .into_iter()
            .enumerate()
            .map(|(position, legacy)| {
                let learned_indices = learned
                    .get(&position.to_string())
                    .map(Vec::as_slice)
                    .unwrap_or_default();

                let mut deck = Deck::new(legacy.name);
                deck.created_date = now;
                deck.cards = legacy
                    .cards
                    .into_iter()
                    .map(|c| {
                        let mut card = Card::new(c.front, c.back);
                        card.next_review_date = now;
                        card
                    })
                    .collect();

                for &index in learned_indices {
                    if let Some(card) = deck.cards.get_mut(index) {
                        card.learned = true;
                        card.difficulty = Difficulty::Easy;
                    }
                }
                deck.stats.cards_learned = deck.learned_count() as u32;
                deck
            })
            .collect()
    }
}
