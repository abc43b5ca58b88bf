//! The length-partitioned word index (C5): per-length score-sorted entries, a hash
//! set for membership/score lookup, and a prefix tree for wildcard queries.
//!
//! Concurrency model follows `spec.md` §5: the whole index is guarded by a single
//! `RwLock`, held exclusively for the duration of a load. Readers that need a
//! complete index call `wait_for_load`, which simply acquires (and drops) a read
//! guard (if a load is in flight that blocks until it finishes; if the index was
//! never loaded it returns immediately, which is intentional: an empty, "loaded"
//! index is a valid, queryable state).

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use crate::atom::{Atom, Word};
use crate::clue::Slot;
use crate::error::EngineError;
use crate::grid::MAX_DIM;
use crate::trie::Trie;

/// Frequency-distribution weights over the 26 letters (A=index 0), used to bias
/// the fill search toward common, diverse letters (`spec.md` §4.4.1).
const ATOM_SCORE: [u32; 26] = [
    82, 15, 28, 43, 127, 22, 20, 61, 70, 2, 8, 40, 24, // A-M
    67, 75, 19, 1, 60, 63, 91, 28, 10, 24, 2, 20, 1, // N-Z
];

/// `letter_score(w) = floor((Σ ATOM_SCORE[w[i]]) * 1000 * distinct_letter_count(w))`.
#[must_use]
pub fn letter_score(word: &Word) -> u64 {
    let raw_sum: u64 = word
        .atoms()
        .iter()
        .filter(|a| !a.is_empty())
        .map(|a| u64::from(ATOM_SCORE[(a.code() - 1) as usize]))
        .sum();
    let s = raw_sum * 1000;
    let u = word.distinct_letter_count() as u64;
    s * u
}

/// Normalized desirability of a word, 1..=100.
pub type FreqScore = u8;

#[derive(Debug, Clone)]
pub struct Entry {
    pub word: Word,
    pub freq_score: FreqScore,
    pub letter_score: u64,
    /// Raw frequency as read from the dictionary source, kept around so
    /// `finalize()` can normalize against the true distribution rather than a
    /// value already lossily clamped into `FreqScore`'s range.
    raw_freq: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NeverLoaded,
    Loading,
    Loaded,
}

const PARTIAL_CACHE_CAP: usize = 20_000;

/// Memo of partial-word -> has-solution, bounded by periodic full clears. Keyed
/// only on the partial word, not `score_min` (the caching defect preserved from
/// the source per `spec.md` §4.4.3/§9); callers must flush between search
/// iterations that change `score_min`.
#[derive(Debug, Default)]
struct PartialCache(Mutex<HashMap<Word, bool>>);

impl PartialCache {
    fn get(&self, key: &Word) -> Option<bool> {
        self.0.lock().unwrap().get(key).copied()
    }

    fn insert(&self, key: Word, value: bool) {
        let mut guard = self.0.lock().unwrap();
        if guard.len() >= PARTIAL_CACHE_CAP {
            guard.clear();
        }
        guard.insert(key, value);
    }

    fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Per-cell glyph presence counts for one per-length store: `[cell_idx][glyph_idx]`
/// is the number of entries in the store with that letter at that position.
/// Mirrors the teacher's `build_glyph_counts_by_cell`, scoped down to what the
/// oracle and search actually need: a cheap "does anything even have this letter
/// here" check, not incremental elimination bookkeeping (`spec.md` §10).
type GlyphCountsByCell = Vec<[u32; 26]>;

fn build_glyph_counts_by_cell(entries: &[Entry], length: usize) -> GlyphCountsByCell {
    let mut counts = vec![[0u32; 26]; length];
    for entry in entries {
        for (cell_idx, atom) in entry.word.atoms().iter().enumerate() {
            counts[cell_idx][(atom.code() - 1) as usize] += 1;
        }
    }
    counts
}

/// Per-length store: score-sorted entries, a membership/score map, and a trie.
#[derive(Debug)]
struct PerLengthStore {
    length: usize,
    entries: Vec<Entry>,
    word_set: HashMap<Word, FreqScore>,
    trie: Trie,
    partial_cache: PartialCache,
    glyph_counts: GlyphCountsByCell,
}

impl PerLengthStore {
    fn new(length: usize) -> PerLengthStore {
        PerLengthStore {
            length,
            entries: Vec::new(),
            word_set: HashMap::new(),
            trie: Trie::new(length),
            partial_cache: PartialCache::default(),
            glyph_counts: vec![[0u32; 26]; length],
        }
    }

    fn insert_raw(&mut self, word: Word, raw_freq: u32) {
        let score = letter_score(&word);
        if self.word_set.contains_key(&word) {
            return;
        }
        self.word_set.insert(word.clone(), 0); // placeholder, replaced by finalize()
        self.trie.insert(&word);
        self.entries.push(Entry {
            word,
            freq_score: 0,
            letter_score: score,
            raw_freq,
        });
    }

    /// Normalize raw frequency scores into [1, 100] (`spec.md` §4.4.2), sort by
    /// descending letter score, rebuild the glyph-presence counts, and flush the
    /// partial-word memo.
    fn finalize(&mut self) {
        normalize_freq_scores(&mut self.entries);
        self.entries.sort_by(|a, b| b.letter_score.cmp(&a.letter_score));
        for entry in &self.entries {
            self.word_set.insert(entry.word.clone(), entry.freq_score);
        }
        self.glyph_counts = build_glyph_counts_by_cell(&self.entries, self.length);
        self.partial_cache.clear();
    }

    fn has_solution(&self, constraint: &Word, score_min: FreqScore) -> bool {
        if let Some(cached) = self.partial_cache.get(constraint) {
            return cached;
        }
        let found = self
            .entries
            .iter()
            .any(|entry| entry.freq_score >= score_min && constraint.matches(&entry.word));
        self.partial_cache.insert(constraint.clone(), found);
        found
    }

    fn get_solutions(&self, constraint: &Word) -> Vec<Word> {
        self.trie.find(constraint)
    }

    /// Cheap, score-blind pre-check: does every non-empty position in `constraint`
    /// have at least one entry in this store with that letter at that position?
    /// `false` proves no entry can match; `true` is necessary but not sufficient,
    /// so callers still need `has_solution`/`get_solutions` to confirm (`spec.md`
    /// §10).
    fn quick_feasible(&self, constraint: &Word) -> bool {
        (0..constraint.len()).all(|cell_idx| {
            let atom = constraint.get(cell_idx);
            atom.is_empty() || self.glyph_counts[cell_idx][(atom.code() - 1) as usize] > 0
        })
    }
}

/// Normalize raw frequency scores in place per `spec.md` §4.4.2.
fn normalize_freq_scores(entries: &mut [Entry]) {
    let n = entries.len();
    if n == 0 {
        return;
    }
    let raw: Vec<f64> = entries.iter().map(|e| f64::from(e.raw_freq)).collect();
    let mean = raw.iter().sum::<f64>() / n as f64;
    let variance = raw.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let sigma = variance.sqrt();

    const MAX_SIGMA: f64 = 1.0;
    const MIN_SIGMA: f64 = 2.0;

    for (entry, &raw_score) in entries.iter_mut().zip(raw.iter()) {
        let sigma_i = if sigma == 0.0 { 0.0 } else { (raw_score - mean) / sigma };
        let divided = if sigma_i > 0.0 { sigma_i / MAX_SIGMA } else { sigma_i / MIN_SIGMA };
        let clamped = divided.clamp(-1.0, 1.0);
        let final_score = (50.0 + 50.0 * clamped).round().clamp(1.0, 100.0);
        entry.freq_score = final_score as FreqScore;
    }
}

struct WordIndexInner {
    stores: Vec<PerLengthStore>,
    state: LoadState,
}

/// The length-partitioned word index (C5).
pub struct WordIndex {
    inner: RwLock<WordIndexInner>,
}

impl Default for WordIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl WordIndex {
    #[must_use]
    pub fn new() -> WordIndex {
        WordIndex {
            inner: RwLock::new(WordIndexInner {
                stores: (0..MAX_DIM).map(PerLengthStore::new).collect(),
                state: LoadState::NeverLoaded,
            }),
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.read().unwrap().state == LoadState::Loaded
    }

    /// Block until any in-flight load completes. Returns immediately if the index
    /// was never loaded or is already loaded.
    pub fn wait_for_load(&self) {
        drop(self.inner.read().unwrap());
    }

    /// Parse the whitespace-separated `WORD SCORE` dictionary format
    /// (`spec.md` §6) and load it synchronously, replacing any existing contents.
    pub fn load_from_file(&self, path: &Path) -> Result<(), EngineError> {
        let contents = std::fs::read_to_string(path)?;
        self.load_from_str(&contents);
        Ok(())
    }

    /// Spawn a background thread to load `path`, returning immediately. Errors are
    /// logged rather than surfaced, since there's no synchronous caller to return
    /// them to; `wait_for_load`/`is_loaded` are how callers observe completion.
    pub fn load_deferred(self: &Arc<Self>, path: std::path::PathBuf) {
        let index = Arc::clone(self);
        std::thread::spawn(move || {
            if let Err(err) = index.load_from_file(&path) {
                log::warn!("deferred dictionary load of {path:?} failed: {err}");
            }
        });
    }

    pub(crate) fn load_from_str(&self, contents: &str) {
        use unicode_normalization::UnicodeNormalization;

        let mut inner = self.inner.write().unwrap();
        inner.state = LoadState::Loading;
        for store in &mut inner.stores {
            *store = PerLengthStore::new(store.length);
        }

        let mut skipped = 0usize;
        let mut loaded = 0usize;
        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let (Some(raw_word), Some(raw_score)) = (parts.next(), parts.next()) else {
                let err = EngineError::DictionaryParse { line: line_no, text: line.to_string() };
                log::warn!("skipping dictionary line: {err}");
                skipped += 1;
                continue;
            };
            let normalized: String = raw_word.nfkd().filter(char::is_ascii).collect::<String>().to_uppercase();
            if normalized.is_empty() || normalized.len() >= MAX_DIM || !normalized.chars().all(|c| c.is_ascii_uppercase()) {
                let err = EngineError::DictionaryParse { line: line_no, text: line.to_string() };
                log::warn!("skipping dictionary line: {err}");
                skipped += 1;
                continue;
            }
            let Ok(raw_freq) = raw_score.parse::<u32>() else {
                let err = EngineError::DictionaryParse { line: line_no, text: line.to_string() };
                log::warn!("skipping dictionary line: {err}");
                skipped += 1;
                continue;
            };

            let word = Word::from_str_strict(&normalized);
            inner.stores[word.len()].insert_raw(word, raw_freq);
            loaded += 1;
        }

        for store in &mut inner.stores {
            store.finalize();
        }
        inner.state = LoadState::Loaded;
        log::info!("dictionary load complete: {loaded} words loaded, {skipped} lines skipped");
    }

    /// Manually add a single entry to the index, as if it came from the dictionary
    /// source (`spec.md` §6 `add_entry`). Re-sorts the affected length's entries.
    pub fn add_entry(&self, word: &Word, freq_score: FreqScore, _letter_score_hint: u64) {
        let mut inner = self.inner.write().unwrap();
        let len = word.len();
        let store = &mut inner.stores[len];
        if store.word_set.contains_key(word) {
            return;
        }
        store.word_set.insert(word.clone(), freq_score);
        store.trie.insert(word);
        store.entries.push(Entry {
            word: word.clone(),
            freq_score,
            letter_score: letter_score(word),
            raw_freq: u32::from(freq_score),
        });
        store.entries.sort_by(|a, b| b.letter_score.cmp(&a.letter_score));
        for (cell_idx, atom) in word.atoms().iter().enumerate() {
            store.glyph_counts[cell_idx][(atom.code() - 1) as usize] += 1;
        }
        store.partial_cache.clear();
    }

    #[must_use]
    pub fn contains(&self, word: &Word) -> bool {
        let inner = self.inner.read().unwrap();
        inner.stores[word.len()].word_set.contains_key(word)
    }

    #[must_use]
    pub fn freq_score(&self, word: &Word) -> Option<FreqScore> {
        let inner = self.inner.read().unwrap();
        inner.stores[word.len()].word_set.get(word).copied()
    }

    /// All complete words matching `slot`'s current constraint, in unspecified
    /// trie-traversal order (`spec.md` §4.4.3 open question on candidate ranking;
    /// callers that need score order must sort explicitly).
    #[must_use]
    pub fn get_solutions(&self, slot: &Slot, _score_min: FreqScore) -> Vec<Word> {
        let inner = self.inner.read().unwrap();
        inner.stores[slot.constraint().len()].get_solutions(slot.constraint())
    }

    /// Does any word of `slot`'s length with `freq_score >= score_min` match its
    /// constraints? Memoized per length, keyed only on the constraint word.
    #[must_use]
    pub fn has_solution(&self, slot: &Slot, score_min: FreqScore) -> bool {
        let inner = self.inner.read().unwrap();
        inner.stores[slot.constraint().len()].has_solution(slot.constraint(), score_min)
    }

    /// Cheap pre-check (`spec.md` §10): does every letter already placed in `slot`
    /// appear at that position in at least one entry of this length? A `false`
    /// here proves the slot has no solution without walking the trie or the
    /// score-sorted entry list; a `true` only means the full check is worth
    /// running.
    #[must_use]
    pub fn quick_feasible(&self, slot: &Slot) -> bool {
        let inner = self.inner.read().unwrap();
        inner.stores[slot.constraint().len()].quick_feasible(slot.constraint())
    }

    /// Flush every per-length `partial_cache`. Must be called between search
    /// iterations that change `score_min`, since the cache key ignores it
    /// (`spec.md` §4.6, §9).
    pub fn flush_caches(&self) {
        let inner = self.inner.read().unwrap();
        for store in &inner.stores {
            store.partial_cache.clear();
        }
    }
}
