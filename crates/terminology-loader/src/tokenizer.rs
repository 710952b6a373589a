//! Search-term tokenization.
//!
//! [`Tokenize`] is the contract the release parsers consume. The default
//! implementation, [`MultiLanguageTokenizer`], dispatches to one
//! [`SentenceTokenizer`] per language, created on first use from a static
//! table: languages with linguistic support get a [`LinguisticTokenizer`],
//! every other language falls back to a [`StopWordTokenizer`].

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

/// Non-word characters, replaced by spaces before splitting.
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

/// Decimal numbers, or words optionally joined by apostrophes and hyphens.
static WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\p{N}+(?:[.,]\p{N}+)+|[\p{L}\p{N}]+(?:['’\-][\p{L}\p{N}]+)*").expect("valid regex")
});

/// Produces normalized search tokens for a language.
pub trait Tokenize: Send + Sync {
    /// Returns the tokens of `text` in `language`.
    fn tokenize(&self, language: &str, text: &str) -> BTreeSet<String>;
}

/// Tokenizer bound to a single language.
pub trait SentenceTokenizer: Send + Sync {
    /// Returns the tokens of `text`.
    fn tokens(&self, text: &str) -> BTreeSet<String>;
}

/// Returns the bundled stop-word list of a language, if there is one.
pub fn bundled_stop_words(language: &str) -> Option<&'static str> {
    match language {
        "en" => Some(include_str!("../stopwords/en.txt")),
        "fr" => Some(include_str!("../stopwords/fr.txt")),
        "nl" => Some(include_str!("../stopwords/nl.txt")),
        "de" => Some(include_str!("../stopwords/de.txt")),
        _ => None,
    }
}

fn word_set(list: &str) -> HashSet<String> {
    list.lines()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lowercases, blanks out punctuation and drops stop words.
#[derive(Debug, Clone, Default)]
pub struct StopWordTokenizer {
    stop_words: HashSet<String>,
}

impl StopWordTokenizer {
    /// Creates a tokenizer with the given stop words.
    pub fn new<'a, I>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            stop_words: stop_words.into_iter().map(str::to_lowercase).collect(),
        }
    }

    /// Creates a tokenizer with the bundled list of a language.
    ///
    /// A language without a bundled list gets an empty one.
    pub fn for_language(language: &str) -> Self {
        match bundled_stop_words(language) {
            Some(list) => Self {
                stop_words: word_set(list),
            },
            None => {
                tracing::warn!("No stop words bundled for language {}", language);
                Self::default()
            }
        }
    }
}

impl SentenceTokenizer for StopWordTokenizer {
    fn tokens(&self, text: &str) -> BTreeSet<String> {
        let lowered = text.to_lowercase();
        NON_WORD
            .replace_all(&lowered, " ")
            .split_whitespace()
            .filter(|w| !self.stop_words.contains(*w))
            .map(str::to_string)
            .collect()
    }
}

/// Keeps content words: nouns, verbs, adjectives, adverbs and numbers.
///
/// Closed-class words (articles, prepositions, pronouns, conjunctions) are
/// removed, elided articles (`l'`, `d'`) and possessives (`'s`) are stripped,
/// and hyphenated compounds contribute both the compound and its parts.
#[derive(Debug, Clone)]
pub struct LinguisticTokenizer {
    function_words: HashSet<String>,
    elisions: &'static [&'static str],
}

impl LinguisticTokenizer {
    /// Creates the tokenizer of a supported language.
    ///
    /// Returns `None` for languages without linguistic support.
    pub fn for_language(language: &str) -> Option<Self> {
        let elisions: &'static [&'static str] = match language {
            "en" => &[],
            "fr" => &["l'", "d'", "qu'", "n'", "s'", "c'", "j'", "m'", "t'", "jusqu'", "lorsqu'"],
            _ => return None,
        };
        Some(Self {
            function_words: bundled_stop_words(language).map(word_set).unwrap_or_default(),
            elisions,
        })
    }

    fn normalize<'a>(&self, word: &'a str) -> &'a str {
        let word = self
            .elisions
            .iter()
            .find_map(|prefix| word.strip_prefix(prefix))
            .unwrap_or(word);
        word.strip_suffix("'s").unwrap_or(word)
    }

    fn keep(&self, word: &str) -> bool {
        if word.is_empty() || self.function_words.contains(word) {
            return false;
        }
        word.chars().count() > 1 || word.chars().all(|c| c.is_numeric())
    }
}

impl SentenceTokenizer for LinguisticTokenizer {
    fn tokens(&self, text: &str) -> BTreeSet<String> {
        let lowered = text.to_lowercase().replace('’', "'");
        let mut tokens = BTreeSet::new();

        for found in WORD.find_iter(&lowered) {
            let word = self.normalize(found.as_str());
            if self.keep(word) {
                tokens.insert(word.to_string());
            }
            if word.contains('-') {
                for part in word.split('-') {
                    if self.keep(part) {
                        tokens.insert(part.to_string());
                    }
                }
            }
        }

        tokens
    }
}

/// Creates the tokenizer registered for a language.
pub fn create_sentence_tokenizer(language: &str) -> Arc<dyn SentenceTokenizer> {
    match LinguisticTokenizer::for_language(language) {
        Some(tokenizer) => Arc::new(tokenizer),
        None => Arc::new(StopWordTokenizer::for_language(language)),
    }
}

/// Per-language tokenizer registry, populated on first use.
#[derive(Default)]
pub struct MultiLanguageTokenizer {
    tokenizers: RwLock<HashMap<String, Arc<dyn SentenceTokenizer>>>,
}

impl MultiLanguageTokenizer {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tokenizer for a language, replacing any existing one.
    pub fn register(&self, language: &str, tokenizer: Arc<dyn SentenceTokenizer>) {
        self.tokenizers.write().insert(language.to_string(), tokenizer);
    }

    /// Returns the number of languages with a tokenizer.
    pub fn language_count(&self) -> usize {
        self.tokenizers.read().len()
    }

    fn tokenizer(&self, language: &str) -> Arc<dyn SentenceTokenizer> {
        if let Some(tokenizer) = self.tokenizers.read().get(language) {
            return Arc::clone(tokenizer);
        }
        let mut tokenizers = self.tokenizers.write();
        Arc::clone(
            tokenizers
                .entry(language.to_string())
                .or_insert_with(|| create_sentence_tokenizer(language)),
        )
    }
}

impl std::fmt::Debug for MultiLanguageTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiLanguageTokenizer")
            .field("languages", &self.language_count())
            .finish()
    }
}

impl Tokenize for MultiLanguageTokenizer {
    fn tokenize(&self, language: &str, text: &str) -> BTreeSet<String> {
        self.tokenizer(language).tokens(text)
    }
}
