//! The deck store: owns the deck collection and every operation on it.
//!
//! Each mutating call validates first, then changes state, then writes the
//! whole collection through to [`DeckStorage`]. Calls that name a deck or a
//! card that does not exist change nothing and report the miss through
//! their return value.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{Result, StoreError};
use crate::import::ImportFormat;
use crate::models::{new_id, Card, Deck, DeckStats, ReviewOutcome, SessionStats};
use crate::schedule::{self, Scheduler};
use crate::storage::{Backup, DeckStorage};

pub struct DeckStore {
    decks: Vec<Deck>,
    storage: DeckStorage,
    scheduler: Scheduler,
}

impl DeckStore {
    /// Open the store backed by `storage`, loading whatever it holds.
    pub fn open(storage: DeckStorage) -> Result<Self> {
        let decks = storage.load()?;
        log::info!("Loaded {} deck(s) from {:?}", decks.len(), storage.path());
        Ok(Self {
            decks,
            storage,
            scheduler: Scheduler::new(),
        })
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn deck(&self, id: &str) -> Option<&Deck> {
        self.decks.iter().find(|d| d.id == id)
    }

    pub fn deck_by_name(&self, name: &str) -> Option<&Deck> {
        let name = name.trim().to_lowercase();
        self.decks.iter().find(|d| d.name.to_lowercase() == name)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.decks.iter().position(|d| d.id == id)
    }

    /// Apply `change` to a copy of the collection, save the copy, then keep it.
    ///
    /// A failed save leaves the in-memory collection as it was.
    fn commit<T>(&mut self, change: impl FnOnce(&mut Vec<Deck>) -> T) -> Result<T> {
        let mut next = self.decks.clone();
        let out = change(&mut next);
        self.storage.save(&next)?;
        self.decks = next;
        Ok(out)
    }

    /// An id no deck in the collection or in `pending` uses yet.
    fn unused_id(&self, pending: &[Deck]) -> String {
        loop {
            let id = new_id();
            if !self.decks.iter().chain(pending).any(|d| d.id == id) {
                return id;
            }
        }
    }

    /// Trimmed deck name, rejecting blanks and names another deck already uses.
    fn validate_name(&self, name: &str, except_id: Option<&str>) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("Please enter a deck name"));
        }

        let taken = self
            .deck_by_name(name)
            .is_some_and(|d| Some(d.id.as_str()) != except_id);
        if taken {
            return Err(StoreError::validation(format!(
                "A deck named '{}' already exists",
                name
            )));
        }

        Ok(name.to_string())
    }

    pub fn create_deck(&mut self, name: &str) -> Result<Deck> {
        let name = self.validate_name(name, None)?;
        let mut deck = Deck::new(name);
        deck.id = self.unused_id(&[]);
        self.commit(|decks| decks.push(deck.clone()))?;
        log::info!("Created deck '{}' ({})", deck.name, deck.id);
        Ok(deck)
    }

    /// Returns `None` when the deck does not exist.
    pub fn rename_deck(&mut self, deck_id: &str, new_name: &str) -> Result<Option<Deck>> {
        let name = self.validate_name(new_name, Some(deck_id))?;
        let Some(i) = self.position(deck_id) else {
            return Ok(None);
        };
        let renamed = self.commit(|decks| {
            decks[i].name = name;
            decks[i].clone()
        })?;
        Ok(Some(renamed))
    }

    pub fn delete_deck(&mut self, deck_id: &str) -> Result<bool> {
        let Some(i) = self.position(deck_id) else {
            return Ok(false);
        };
        self.commit(|decks| decks.remove(i))?;
        log::info!("Deleted deck {}", deck_id);
        Ok(true)
    }

    /// Append a card. Returns `None` when the deck does not exist.
    pub fn add_card(&mut self, deck_id: &str, front: &str, back: &str) -> Result<Option<Card>> {
        let (front, back) = (front.trim(), back.trim());
        if front.is_empty() || back.is_empty() {
            return Err(StoreError::validation("Please fill in both fields"));
        }

        let Some(i) = self.position(deck_id) else {
            return Ok(None);
        };
        let card = self.commit(|decks| decks[i].add_card(front.to_string(), back.to_string()).clone())?;
        Ok(Some(card))
    }

    pub fn delete_card(&mut self, deck_id: &str, index: usize) -> Result<bool> {
        let Some(i) = self.position(deck_id) else {
            return Ok(false);
        };
        if index >= self.decks[i].cards.len() {
            return Ok(false);
        }
        self.commit(|decks| decks[i].cards.remove(index))?;
        Ok(true)
    }

    /// Apply a study answer to one card and save. Returns the updated card.
    pub fn record_response(
        &mut self,
        deck_id: &str,
        card_index: usize,
        outcome: ReviewOutcome,
    ) -> Result<Option<Card>> {
        self.record_response_at(deck_id, card_index, outcome, Utc::now())
    }

    pub fn record_response_at(
        &mut self,
        deck_id: &str,
        card_index: usize,
        outcome: ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<Option<Card>> {
        let Some(i) = self.position(deck_id) else {
            return Ok(None);
        };
        if card_index >= self.decks[i].cards.len() {
            return Ok(None);
        }

        let scheduler = self.scheduler;
        let card = self.commit(|decks| {
            let card = &mut decks[i].cards[card_index];
            scheduler.review_card(card, outcome, now);
            card.clone()
        })?;
        Ok(Some(card))
    }

    /// Cards due now, in deck order. Empty for an unknown deck.
    pub fn cards_needing_review(&self, deck_id: &str) -> Vec<&Card> {
        self.cards_needing_review_at(deck_id, Utc::now())
    }

    pub fn cards_needing_review_at(&self, deck_id: &str, now: DateTime<Utc>) -> Vec<&Card> {
        self.deck(deck_id)
            .map(|d| schedule::cards_needing_review_at(d, now))
            .unwrap_or_default()
    }

    /// Fold a finished session into the deck's stats and save.
    pub fn finish_session(
        &mut self,
        deck_id: &str,
        session: &SessionStats,
    ) -> Result<Option<DeckStats>> {
        let Some(i) = self.position(deck_id) else {
            return Ok(None);
        };

        let stats = self.commit(|decks| {
            let deck = &mut decks[i];
            let learned = deck.learned_count() as u32;
            let stats = &mut deck.stats;
            stats.cards_learned = learned;
            stats.total_reviews += session.total();
            stats.total_study_sessions += 1;
            stats.average_accuracy = session.accuracy();
            stats.last_review = Some(Utc::now());
            stats.clone()
        })?;

        log::info!(
            "Session finished for deck {}: {} answered, {:.1}% easy",
            deck_id,
            session.total(),
            stats.average_accuracy
        );
        Ok(Some(stats))
    }

    /// Wipe every card's review history and the deck's stats.
    pub fn reset_deck(&mut self, deck_id: &str) -> Result<bool> {
        let Some(i) = self.position(deck_id) else {
            return Ok(false);
        };

        let now = Utc::now();
        self.commit(|decks| {
            let deck = &mut decks[i];
            for card in &mut deck.cards {
                card.reset_progress(now);
            }
            deck.stats = DeckStats::default();
        })?;
        log::info!("Reset deck {}", deck_id);
        Ok(true)
    }

    /// Remove every deck.
    pub fn clear_all(&mut self) -> Result<()> {
        self.commit(|decks| decks.clear())?;
        log::warn!("Cleared all decks");
        Ok(())
    }

    /// Parse `content` and add the resulting decks, or add nothing on error.
    ///
    /// `custom_name` renames the deck when the file holds exactly one.
    pub fn import(
        &mut self,
        content: &str,
        format: ImportFormat,
        custom_name: Option<&str>,
    ) -> Result<Vec<Deck>> {
        let parsed = format.parse(content)?;
        if parsed.is_empty() {
            return Err(StoreError::format("No valid decks found in file"));
        }

        let custom_name = custom_name.map(str::trim).filter(|n| !n.is_empty());
        let single = parsed.len() == 1;
        let now = Utc::now();

        let mut decks: Vec<Deck> = Vec::with_capacity(parsed.len());
        for mut deck in parsed {
            if let (Some(name), true) = (custom_name, single) {
                deck.name = name.to_string();
            }
            deck.id = self.unused_id(&decks);
            deck.created_date = now;
            deck.stats = DeckStats::default();
            decks.push(deck);
        }

        self.commit(|all| all.extend(decks.iter().cloned()))?;
        log::info!("Imported {} deck(s) as {:?}", decks.len(), format);
        Ok(decks)
    }

    /// Read a file and import it, picking the format from its extension.
    pub fn import_file(&mut self, path: &Path, custom_name: Option<&str>) -> Result<Vec<Deck>> {
        let format = ImportFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;
        self.import(&content, format, custom_name)
    }

    /// The whole collection as one JSON document the importer accepts.
    pub fn export(&self) -> Result<String> {
        let backup = Backup::new(self.decks.clone());
        Ok(serde_json::to_string_pretty(&backup)?)
    }

    pub fn export_to(&self, path: &Path) -> Result<usize> {
        fs::write(path, self.export()?)?;
        log::info!("Exported {} deck(s) to {:?}", self.decks.len(), path);
        Ok(self.decks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use chrono::Duration;
    use tempfile::TempDir;

    fn create_test_store() -> (DeckStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = DeckStorage::new(temp_dir.path().join("decks.json")).unwrap();
        (DeckStore::open(storage).unwrap(), temp_dir)
    }

    fn reopen(temp: &TempDir) -> DeckStore {
        let storage = DeckStorage::new(temp.path().join("decks.json")).unwrap();
        DeckStore::open(storage).unwrap()
    }

    fn deck_with_cards(store: &mut DeckStore, cards: &[(&str, &str)]) -> String {
        let id = store.create_deck("Spanish").unwrap().id;
        for (front, back) in cards {
            store.add_card(&id, front, back).unwrap();
        }
        id
    }

    #[test]
    fn test_create_deck_is_empty() {
        let (mut store, _temp) = create_test_store();
        let deck = store.create_deck("  Spanish  ").unwrap();

        assert_eq!(deck.name, "Spanish");
        assert!(deck.cards.is_empty());
        assert_eq!(deck.stats, DeckStats::default());
        assert_eq!(store.decks().len(), 1);
    }

    #[test]
    fn test_create_deck_rejects_blank_and_duplicate() {
        let (mut store, _temp) = create_test_store();
        assert!(matches!(store.create_deck("   "), Err(StoreError::Validation(_))));

        store.create_deck("Spanish").unwrap();
        assert!(matches!(store.create_deck("spanish"), Err(StoreError::Validation(_))));
        assert_eq!(store.decks().len(), 1);
    }

    #[test]
    fn test_deck_ids_are_unique() {
        let (mut store, _temp) = create_test_store();
        let a = store.create_deck("A").unwrap();
        let b = store.create_deck("B").unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 32);

        let imported = store
            .import("Hola\nHello\n", ImportFormat::Txt, None)
            .unwrap();
        assert!(store.decks().iter().filter(|d| d.id == imported[0].id).count() == 1);
    }

    #[test]
    fn test_failed_save_leaves_store_unchanged() {
        let (mut store, temp) = create_test_store();
        let id = deck_with_cards(&mut store, &[("Hola", "Hello")]);

        // A directory where the deck file should be makes every save fail.
        let path = temp.path().join("decks.json");
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(matches!(store.create_deck("French"), Err(StoreError::Io(_))));
        assert!(store.rename_deck(&id, "Renamed").is_err());
        assert!(store.add_card(&id, "Adios", "Bye").is_err());
        assert!(store.record_response(&id, 0, ReviewOutcome::Easy).is_err());
        assert!(store.reset_deck(&id).is_err());
        assert!(store.import("Oui\nYes\n", ImportFormat::Txt, None).is_err());
        assert!(store.clear_all().is_err());
        assert!(store.delete_deck(&id).is_err());

        assert_eq!(store.decks().len(), 1);
        let deck = store.deck(&id).unwrap();
        assert_eq!(deck.name, "Spanish");
        assert_eq!(deck.cards.len(), 1);
        assert_eq!(deck.cards[0].reviews, 0);

        // Once the file can be written again the same name is accepted.
        fs::remove_dir(&path).unwrap();
        store.create_deck("French").unwrap();
        assert_eq!(reopen(&temp).decks().len(), 2);
    }

    #[test]
    fn test_rename_deck() {
        let (mut store, temp) = create_test_store();
        let id = store.create_deck("Spanish").unwrap().id;
        store.create_deck("French").unwrap();

        assert!(matches!(store.rename_deck(&id, " "), Err(StoreError::Validation(_))));
        assert!(matches!(store.rename_deck(&id, "French"), Err(StoreError::Validation(_))));

        // Renaming to its own name with different case is allowed.
        let renamed = store.rename_deck(&id, "SPANISH").unwrap().unwrap();
        assert_eq!(renamed.name, "SPANISH");
        assert_eq!(renamed.id, id);
        assert!(store.rename_deck("missing", "Other").unwrap().is_none());

        assert_eq!(reopen(&temp).deck(&id).unwrap().name, "SPANISH");
    }

    #[test]
    fn test_add_card_validation() {
        let (mut store, _temp) = create_test_store();
        let id = store.create_deck("Spanish").unwrap().id;

        assert!(matches!(store.add_card(&id, "Hola", "  "), Err(StoreError::Validation(_))));
        assert!(store.deck(&id).unwrap().cards.is_empty());

        let card = store.add_card(&id, "Hola", "Hello").unwrap().unwrap();
        assert_eq!(card.front, "Hola");
        assert_eq!(card.difficulty, Difficulty::New);
        assert!(store.add_card("missing", "a", "b").unwrap().is_none());
    }

    #[test]
    fn test_delete_card_and_deck() {
        let (mut store, temp) = create_test_store();
        let id = deck_with_cards(&mut store, &[("a", "1"), ("b", "2"), ("c", "3")]);

        assert!(!store.delete_card(&id, 3).unwrap());
        assert!(store.delete_card(&id, 1).unwrap());
        let fronts: Vec<String> = store.deck(&id).unwrap().cards.iter().map(|c| c.front.clone()).collect();
        assert_eq!(fronts, vec!["a", "c"]);

        assert!(!store.delete_deck("missing").unwrap());
        assert!(store.delete_deck(&id).unwrap());
        assert!(reopen(&temp).decks().is_empty());
    }

    #[test]
    fn test_record_response_easy_sequence() {
        let (mut store, _temp) = create_test_store();
        let id = deck_with_cards(&mut store, &[("Hola", "Hello")]);

        for expected in [1, 3, 7, 14, 30, 30] {
            let card = store.record_response(&id, 0, ReviewOutcome::Easy).unwrap().unwrap();
            let last = card.last_review.unwrap();
            assert_eq!((card.next_review_date - last).num_days(), expected);
        }
    }

    #[test]
    fn test_record_response_hard_and_skip() {
        let (mut store, temp) = create_test_store();
        let id = deck_with_cards(&mut store, &[("Hola", "Hello")]);
        let now = Utc::now();

        store.record_response_at(&id, 0, ReviewOutcome::Easy, now).unwrap();
        store.record_response_at(&id, 0, ReviewOutcome::Easy, now).unwrap();
        let card = store.record_response_at(&id, 0, ReviewOutcome::Hard, now).unwrap().unwrap();
        assert_eq!(card.next_review_date, now + Duration::days(1));
        assert!(!card.learned);
        assert_eq!(card.reviews, 3);

        let skipped = store.record_response_at(&id, 0, ReviewOutcome::Skip, now).unwrap().unwrap();
        assert_eq!(skipped, card);

        // Written through on every answer.
        assert_eq!(reopen(&temp).deck(&id).unwrap().cards[0], card);
        assert!(store.record_response(&id, 5, ReviewOutcome::Easy).unwrap().is_none());
    }

    #[test]
    fn test_cards_needing_review() {
        let (mut store, _temp) = create_test_store();
        let id = deck_with_cards(&mut store, &[("a", "1"), ("b", "2"), ("c", "3")]);
        let now = Utc::now();

        store.record_response_at(&id, 1, ReviewOutcome::Easy, now).unwrap();
        let due: Vec<&str> = store
            .cards_needing_review_at(&id, now + Duration::hours(1))
            .iter()
            .map(|c| c.front.as_str())
            .collect();
        assert_eq!(due, vec!["a", "c"]);

        let all = store.cards_needing_review_at(&id, now + Duration::days(2));
        assert_eq!(all.len(), 3);
        assert!(store.cards_needing_review("missing").is_empty());
    }

    #[test]
    fn test_finish_session() {
        let (mut store, _temp) = create_test_store();
        let id = deck_with_cards(&mut store, &[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")]);
        for i in 0..3 {
            store.record_response(&id, i, ReviewOutcome::Easy).unwrap();
        }
        store.record_response(&id, 3, ReviewOutcome::Hard).unwrap();

        let session = SessionStats { easy: 3, hard: 1, skipped: 0 };
        let stats = store.finish_session(&id, &session).unwrap().unwrap();
        assert_eq!(stats.average_accuracy, 75.0);
        assert_eq!(stats.cards_learned, 3);
        assert_eq!(stats.total_reviews, 4);
        assert_eq!(stats.total_study_sessions, 1);
        assert_eq!(stats.current_streak, 0);
        assert!(stats.last_review.is_some());

        let stats = store.finish_session(&id, &SessionStats::default()).unwrap().unwrap();
        assert_eq!(stats.average_accuracy, 0.0);
        assert_eq!(stats.total_reviews, 4);
        assert_eq!(stats.total_study_sessions, 2);
    }

    #[test]
    fn test_reset_deck() {
        let (mut store, _temp) = create_test_store();
        let id = deck_with_cards(&mut store, &[("a", "1"), ("b", "2")]);
        store.record_response(&id, 0, ReviewOutcome::Easy).unwrap();
        store
            .finish_session(&id, &SessionStats { easy: 1, hard: 0, skipped: 1 })
            .unwrap();

        assert!(store.reset_deck(&id).unwrap());
        let deck = store.deck(&id).unwrap();
        assert_eq!(deck.stats, DeckStats::default());
        for card in &deck.cards {
            assert!(!card.learned);
            assert_eq!(card.difficulty, Difficulty::New);
            assert_eq!(card.reviews, 0);
            assert!(card.last_review.is_none());
            assert!(card.is_due());
        }
        assert!(!store.reset_deck("missing").unwrap());
    }

    #[test]
    fn test_import_csv_and_custom_name() {
        let (mut store, _temp) = create_test_store();
        let decks = store
            .import("front,back\nHola,Hello\nGracias,Thanks", ImportFormat::Csv, None)
            .unwrap();
        assert_eq!(decks[0].name, "Imported CSV Deck");
        assert_eq!(store.decks()[0].cards.len(), 2);

        let decks = store
            .import("Bonjour\nHello", ImportFormat::Txt, Some("French"))
            .unwrap();
        assert_eq!(decks[0].name, "French");
        assert!(store.deck_by_name("french").is_some());
    }

    #[test]
    fn test_custom_name_ignored_for_multiple_decks() {
        let (mut store, _temp) = create_test_store();
        let json = r#"{"decks":[{"name":"A","cards":[]},{"name":"B","cards":[]}]}"#;
        let decks = store.import(json, ImportFormat::Json, Some("Custom")).unwrap();
        let names: Vec<&str> = decks.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_failed_import_adds_nothing() {
        let (mut store, temp) = create_test_store();
        store.create_deck("Existing").unwrap();

        assert!(matches!(
            store.import("Bonjour\nHello\nMerci", ImportFormat::Txt, None),
            Err(StoreError::Format(_))
        ));
        assert!(matches!(
            store.import(r#"{"decks":[]}"#, ImportFormat::Json, None),
            Err(StoreError::Format(_))
        ));
        assert_eq!(store.decks().len(), 1);
        assert_eq!(reopen(&temp).decks().len(), 1);
    }

    #[test]
    fn test_import_file_rejects_unknown_extension() {
        let (mut store, temp) = create_test_store();
        let path = temp.path().join("deck.apkg");
        fs::write(&path, "whatever").unwrap();
        assert!(matches!(store.import_file(&path, None), Err(StoreError::Format(_))));
    }

    #[test]
    fn test_export_import_round_trip() {
        let (mut store, temp) = create_test_store();
        let id = deck_with_cards(&mut store, &[("Hola", "Hello"), ("Gracias", "Thanks")]);
        store.record_response(&id, 0, ReviewOutcome::Easy).unwrap();
        store.create_deck("Empty").unwrap();

        let path = temp.path().join("backup.json");
        assert_eq!(store.export_to(&path).unwrap(), 2);

        let (mut other, _other_temp) = create_test_store();
        let imported = other.import_file(&path, None).unwrap();

        assert_eq!(imported.len(), 2);
        for (original, copy) in store.decks().iter().zip(other.decks()) {
            assert_eq!(original.name, copy.name);
            assert_ne!(original.id, copy.id);
            let a: Vec<(&str, &str)> = original.cards.iter().map(|c| (c.front.as_str(), c.back.as_str())).collect();
            let b: Vec<(&str, &str)> = copy.cards.iter().map(|c| (c.front.as_str(), c.back.as_str())).collect();
            assert_eq!(a, b);
        }
        assert!(other.decks()[0].cards[0].learned);
    }

    #[test]
    fn test_clear_all() {
        let (mut store, temp) = create_test_store();
        store.create_deck("A").unwrap();
        store.clear_all().unwrap();
        assert!(store.decks().is_empty());
        assert!(reopen(&temp).decks().is_empty());
    }
}
