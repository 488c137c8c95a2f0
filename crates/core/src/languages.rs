use crate::config::AUTO_SOURCE_LANG;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Language {
    pub code: String,
    pub name: String,
}

impl Language {
    pub fn new<C: Into<String>, N: Into<String>>(code: C, name: N) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

const BUILTIN: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("bg", "Bulgarian"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en-GB", "English (British)"),
    ("en-US", "English (American)"),
    ("es", "Spanish"),
    ("et", "Estonian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("lt", "Lithuanian"),
    ("lv", "Latvian"),
    ("nb", "Norwegian (Bokmål)"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("pt-BR", "Portuguese (Brazilian)"),
    ("pt-PT", "Portuguese (European)"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("sv", "Swedish"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("zh", "Chinese (simplified)"),
];

/// Offline catalog, used when the translation service can't be asked.
pub fn builtin_languages() -> Vec<Language> {
    BUILTIN
        .iter()
        .map(|(code, name)| Language::new(*code, *name))
        .collect()
}

/// Ordered `(code, display name)` list backing the language selectors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguageCatalog {
    languages: Vec<Language>,
}

impl LanguageCatalog {
    pub fn new(languages: Vec<Language>) -> Self {
        Self { languages }
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn contains(&self, code: &str) -> bool {
        self.languages
            .iter()
            .any(|l| l.code.eq_ignore_ascii_case(code))
    }

    pub fn source_choices(&self) -> Vec<(String, String)> {
        self.choices_with((AUTO_SOURCE_LANG, "Auto"))
    }

    pub fn target_choices(&self) -> Vec<(String, String)> {
        self.choices_with(("", "Select a target language"))
    }

    fn choices_with(&self, first: (&str, &str)) -> Vec<(String, String)> {
        std::iter::once((first.0.to_owned(), first.1.to_owned()))
            .chain(
                self.languages
                    .iter()
                    .map(|l| (l.code.clone(), l.name.clone())),
            )
            .collect()
    }
}

impl Default for LanguageCatalog {
    fn default() -> Self {
        Self::new(builtin_languages())
    }
}
