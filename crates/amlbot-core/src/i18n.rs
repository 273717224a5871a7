//! Translation store: `(language, key) -> template` with a fallback language.
//!
//! Tables are flat YAML maps, one file per language (`en.yml`, `ru.yml`, ...). Built-in
//! tables are compiled in; `load_dir` replaces them with tables read from disk at startup.

use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::OnceLock,
};

use regex::{Captures, Regex};

use crate::{errors::Error, Result};

pub const DEFAULT_LANGUAGE: &str = "en";

const BUILTIN: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en.yml")),
    ("ru", include_str!("../locales/ru.yml")),
];

type Table = HashMap<String, String>;

#[derive(Clone, Debug)]
pub struct Translations {
    tables: HashMap<String, Table>,
    fallback: String,
}

impl Translations {
    /// Tables shipped with the crate, falling back to `fallback`.
    pub fn builtin(fallback: &str) -> Result<Self> {
        let mut tables = HashMap::new();
        for (lang, raw) in BUILTIN {
            tables.insert((*lang).to_string(), parse_table(raw)?);
        }
        Self::from_tables(tables, fallback)
    }

    /// Read every `*.yml` / `*.yaml` file in `dir`; the file stem is the language code.
    pub fn load_dir(dir: &Path, fallback: &str) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|e| {
            Error::Translation(format!(
                "cannot read translations dir {}: {e}",
                dir.display()
            ))
        })?;

        let mut tables = HashMap::new();
        for entry in entries {
            let path = entry?.path();
            let is_yaml = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yml") | Some("yaml")
            );
            if !is_yaml {
                continue;
            }
            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let raw = fs::read_to_string(&path)?;
            let table = parse_table(&raw).map_err(|e| {
                Error::Translation(format!("invalid translation file {}: {e}", path.display()))
            })?;
            tables.insert(lang.to_lowercase(), table);
        }

        let translations = Self::from_tables(tables, fallback)?;
        translations.ensure_fallback_complete()?;
        Ok(translations)
    }

    /// Use `dir` when configured, the built-in tables otherwise.
    pub fn load(dir: Option<&Path>, fallback: &str) -> Result<Self> {
        match dir {
            Some(dir) => Self::load_dir(dir, fallback),
            None => Self::builtin(fallback),
        }
    }

    pub fn from_tables(tables: HashMap<String, Table>, fallback: &str) -> Result<Self> {
        let fallback = fallback.to_lowercase();
        if !tables.contains_key(&fallback) {
            return Err(Error::Translation(format!(
                "fallback language '{fallback}' has no translation table"
            )));
        }
        Ok(Self { tables, fallback })
    }

    /// Every key the built-in tables define must resolve through the fallback table.
    fn ensure_fallback_complete(&self) -> Result<()> {
        let required = builtin_table(DEFAULT_LANGUAGE)?;
        let fallback = self.tables.get(&self.fallback);
        let mut missing: Vec<&str> = required
            .keys()
            .filter(|k| !fallback.is_some_and(|t| t.contains_key(*k)))
            .map(String::as_str)
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        Err(Error::Translation(format!(
            "fallback language '{}' is missing keys: {}",
            self.fallback,
            missing.join(", ")
        )))
    }

    /// Look up `key` for `lang` (any IETF tag, or none) and fill `{name}` placeholders.
    ///
    /// Falls back to the fallback language when the language or the key is missing there.
    pub fn get(&self, lang: Option<&str>, key: &str, args: &[(&str, &str)]) -> Result<String> {
        let template = lang
            .and_then(normalize_language)
            .and_then(|l| self.tables.get(&l))
            .and_then(|t| t.get(key))
            .or_else(|| self.tables.get(&self.fallback).and_then(|t| t.get(key)))
            .ok_or_else(|| {
                Error::Translation(format!(
                    "missing key '{key}' in fallback language '{}'",
                    self.fallback
                ))
            })?;

        Ok(render(template, args))
    }
}

/// Reduce an IETF tag to its lowercase primary subtag (`pt-BR` -> `pt`).
pub fn normalize_language(tag: &str) -> Option<String> {
    let primary = tag.trim().split(|c: char| c == '-' || c == '_').next().unwrap_or("").trim();
    if primary.is_empty() {
        None
    } else {
        Some(primary.to_lowercase())
    }
}

fn builtin_table(lang: &str) -> Result<Table> {
    let raw = BUILTIN
        .iter()
        .find(|(l, _)| *l == lang)
        .map(|(_, raw)| *raw)
        .unwrap_or_default();
    parse_table(raw)
}

fn parse_table(raw: &str) -> Result<Table> {
    Ok(serde_yaml::from_str::<Option<Table>>(raw)?.unwrap_or_default())
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("valid regex"))
}

// Single pass, so values containing `{...}` are never expanded again.
fn render(template: &str, args: &[(&str, &str)]) -> String {
    if args.is_empty() {
        return template.to_string();
    }
    placeholder_re()
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            args.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tmp_dir(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = PathBuf::from(format!("/tmp/{prefix}-{}-{ts}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn table(pairs: &[(&str, &str)]) -> Table {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn builtin_tables_cover_the_same_keys() {
        let tr = Translations::builtin(DEFAULT_LANGUAGE).unwrap();
        let en = &tr.tables["en"];
        let ru = &tr.tables["ru"];
        let mut missing: Vec<_> = en.keys().filter(|k| !ru.contains_key(*k)).collect();
        missing.sort();
        assert!(missing.is_empty(), "ru is missing {missing:?}");
    }

    #[test]
    fn picks_requested_language() {
        let tr = Translations::builtin("en").unwrap();
        let ru = tr.get(Some("ru-RU"), "details_header", &[]).unwrap();
        assert_eq!(ru, "Детали:");
        let en = tr.get(Some("en"), "details_header", &[]).unwrap();
        assert_eq!(en, "Details:");
    }

    #[test]
    fn falls_back_for_unknown_language_or_missing_key() {
        let mut tables = HashMap::new();
        tables.insert("en".to_string(), table(&[("welcome", "Hi"), ("bye", "Bye")]));
        tables.insert("ru".to_string(), table(&[("welcome", "Привет")]));
        let tr = Translations::from_tables(tables, "en").unwrap();

        assert_eq!(tr.get(Some("ru"), "welcome", &[]).unwrap(), "Привет");
        assert_eq!(tr.get(Some("ru"), "bye", &[]).unwrap(), "Bye");
        assert_eq!(tr.get(Some("de"), "welcome", &[]).unwrap(), "Hi");
        assert_eq!(tr.get(None, "welcome", &[]).unwrap(), "Hi");
    }

    #[test]
    fn missing_key_in_fallback_is_an_error() {
        let tr = Translations::builtin("en").unwrap();
        let err = tr.get(Some("ru"), "no_such_key", &[]).unwrap_err();
        assert!(matches!(err, Error::Translation(_)));
    }

    #[test]
    fn fallback_table_must_exist() {
        let err = Translations::builtin("de").unwrap_err();
        assert!(matches!(err, Error::Translation(_)));
    }

    #[test]
    fn fills_placeholders_once() {
        let out = render(
            "Risk: {score}, Details: {details}, {unknown}",
            &[("score", "0.75"), ("details", "{score}")],
        );
        assert_eq!(out, "Risk: 0.75, Details: {score}, {unknown}");
    }

    #[test]
    fn loads_tables_from_dir() {
        let dir = tmp_dir("amlbot-i18n");
        let mut en = builtin_table("en").unwrap();
        en.insert("welcome".to_string(), "Test welcome".to_string());
        fs::write(dir.join("en.yml"), serde_yaml::to_string(&en).unwrap()).unwrap();
        fs::write(dir.join("ru.yml"), "welcome: \"Тест\"\n").unwrap();
        fs::write(dir.join("README.txt"), "ignored").unwrap();

        let tr = Translations::load_dir(&dir, "en").unwrap();
        assert!(tr.tables.contains_key("ru"));
        assert_eq!(tr.get(Some("ru"), "welcome", &[]).unwrap(), "Тест");
        assert_eq!(tr.get(Some("en"), "welcome", &[]).unwrap(), "Test welcome");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_dir_is_an_error_not_a_panic() {
        let err = Translations::load_dir(Path::new("/nonexistent/amlbot-locales"), "en").unwrap_err();
        assert!(matches!(err, Error::Translation(_)));
    }

    #[test]
    fn dir_without_fallback_file_is_rejected() {
        let dir = tmp_dir("amlbot-i18n-nofallback");
        fs::write(dir.join("ru.yml"), "welcome: \"Тест\"\n").unwrap();
        assert!(Translations::load_dir(&dir, "en").is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn incomplete_fallback_file_is_rejected_at_load() {
        let dir = tmp_dir("amlbot-i18n-partial");
        fs::write(dir.join("en.yml"), "details_header: \"Details:\"\n").unwrap();

        let err = Translations::load_dir(&dir, "en").unwrap_err();
        assert!(matches!(err, Error::Translation(ref m) if m.contains("welcome")));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn normalizes_language_tags() {
        assert_eq!(normalize_language("ru-RU").as_deref(), Some("ru"));
        assert_eq!(normalize_language("EN_us").as_deref(), Some("en"));
        assert_eq!(normalize_language("  "), None);
    }
}
