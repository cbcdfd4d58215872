//! Scenario file types
//!
//! A scenario describes one recorded run of a job: the outputs and counters
//! it was expected to produce, and the ones it actually produced.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};
use crate::validate::{parse_tabbed_pair, CounterExpectation, Counters, Pair, Value};

/// A complete scenario loaded from a YAML file
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario checks
    pub description: Option<String>,
    /// Whether output order matters (config default when unset)
    pub order_matters: Option<bool>,
    /// Whether undeclared counters fail the run (config default when unset)
    pub strict_counters: Option<bool>,
    #[serde(default)]
    pub expected: OutputSource,
    #[serde(default)]
    pub actual: OutputSource,
    #[serde(default)]
    pub counters: CounterSection,
    /// Distributed cache entries localized around the replay
    #[serde(default)]
    pub cache: CacheSection,
}

impl Scenario {
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::scenario_parse(path, e))
    }
}

/// Where a list of outputs comes from
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum OutputSource {
    /// `[key, value]` pairs written in the scenario
    Inline(Vec<(Value, Value)>),
    /// Tab-separated `key<TAB>value` lines, relative to the scenario file
    File { file: PathBuf },
}

impl Default for OutputSource {
    fn default() -> Self {
        OutputSource::Inline(Vec::new())
    }
}

impl OutputSource {
    /// The file to read, if any, resolved against `base`
    pub fn file(&self, base: &Path) -> Option<PathBuf> {
        match self {
            OutputSource::Inline(_) => None,
            OutputSource::File { file } => Some(resolve(base, file)),
        }
    }

    /// Build the pairs, given the file contents when this source is a file
    pub fn pairs(&self, file_content: Option<&str>) -> Result<Vec<Pair<Value, Value>>> {
        match (self, file_content) {
            (OutputSource::Inline(items), _) => Ok(items
                .iter()
                .map(|(k, v)| Pair::new(k.clone(), v.clone()))
                .collect()),
            (OutputSource::File { .. }, Some(content)) => parse_tsv(content),
            (OutputSource::File { file }, None) => Err(Error::Config(format!(
                "No content loaded for output file '{}'",
                file.display()
            ))),
        }
    }
}

/// Parse tab-separated output lines; blank lines are skipped
pub fn parse_tsv(content: &str) -> Result<Vec<Pair<Value, Value>>> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let pair = parse_tabbed_pair(line)?;
            let (key, value) = pair.into_parts();
            Ok(Pair::new(field_value(&key), field_value(&value)))
        })
        .collect()
}

/// Type a raw field by its plain scalar form
///
/// Integers, decimal floats, `true`/`false` and `~`/`null` are typed the
/// way the same inline YAML scalar would be. Anything else is kept byte for
/// byte as text, so `#tag`, `'quoted'` or ` padded ` survive unchanged.
pub fn field_value(field: &str) -> Value {
    match field {
        "~" | "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = field.parse::<i64>() {
        if n.to_string() == field {
            return Value::Long(n);
        }
    }
    if is_decimal_float(field) {
        if let Ok(n) = field.parse::<f64>() {
            return Value::from(n);
        }
    }
    Value::text(field)
}

/// `-1.5`, `2.`, `.5`, `1e3`, `6.02E+23`; no `inf`, `nan` or padding
fn is_decimal_float(field: &str) -> bool {
    let digits = field.trim_start_matches(['-', '+']);
    let (mantissa, exponent) = match digits.find(['e', 'E']) {
        Some(i) => (&digits[..i], Some(&digits[i + 1..])),
        None => (digits, None),
    };
    let mantissa_ok = mantissa.chars().any(|c| c.is_ascii_digit())
        && mantissa.chars().all(|c| c.is_ascii_digit() || c == '.')
        && mantissa.matches('.').count() <= 1;
    let exponent_ok = exponent.map_or(true, |e| {
        let e = e.strip_prefix(['-', '+']).unwrap_or(e);
        !e.is_empty() && e.chars().all(|c| c.is_ascii_digit())
    });
    let is_float_form = mantissa.contains('.') || exponent.is_some();
    digits.len() + 1 >= field.len() && mantissa_ok && exponent_ok && is_float_form
}

/// Expected and actual counters
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct CounterSection {
    #[serde(default)]
    pub expected: Vec<CounterSpec>,
    #[serde(default)]
    pub actual: Vec<CounterSpec>,
    /// Log of `reporter:counter:` lines, applied after `actual`
    pub actual_file: Option<PathBuf>,
}

impl CounterSection {
    pub fn expectations(&self) -> Vec<CounterExpectation> {
        self.expected
            .iter()
            .map(|c| CounterExpectation::named(c.group.as_str(), c.name.as_str(), c.value))
            .collect()
    }

    /// Actual counters, given the counter log contents when one is named
    pub fn actual_counters(&self, log: Option<&str>) -> Result<Counters> {
        let mut counters = Counters::new();
        for c in &self.actual {
            counters.increment(c.group.as_str(), c.name.as_str(), c.value);
        }
        if let Some(log) = log {
            let applied = counters.apply_reporter_lines(log)?;
            tracing::debug!("Applied {} counter updates from log", applied);
        }
        Ok(counters)
    }
}

/// A single `(group, name) = value` counter
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CounterSpec {
    pub group: String,
    pub name: String,
    pub value: i64,
}

/// Cache files and archives, relative to the scenario file
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct CacheSection {
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub archives: Vec<PathBuf>,
}

/// Resolve `path` against the scenario directory unless it is absolute
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{CounterId, CounterLookup};

    const WORD_COUNT: &str = r#"
name: word count
description: counts words
order_matters: false
expected:
  - [hello, 2]
  - [world, 1]
actual:
  file: actual.tsv
counters:
  expected:
    - { group: wc, name: words, value: 3 }
  actual:
    - { group: wc, name: words, value: 2 }
  actual_file: counters.log
cache:
  archives: [dict.zip]
"#;

    #[test]
    fn test_parse_full_scenario() {
        let scenario = Scenario::parse(WORD_COUNT, Path::new("wc.yaml")).unwrap();
        assert_eq!(scenario.name, "word count");
        assert_eq!(scenario.order_matters, Some(false));
        assert_eq!(scenario.strict_counters, None);
        assert_eq!(
            scenario.expected,
            OutputSource::Inline(vec![
                (Value::text("hello"), Value::Long(2)),
                (Value::text("world"), Value::Long(1)),
            ])
        );
        assert_eq!(
            scenario.actual.file(Path::new("/data")),
            Some(PathBuf::from("/data/actual.tsv"))
        );
        assert_eq!(scenario.counters.expectations().len(), 1);
        assert_eq!(scenario.cache.archives, vec![PathBuf::from("dict.zip")]);
        assert!(scenario.cache.files.is_empty());
    }

    #[test]
    fn test_minimal_scenario_defaults() {
        let scenario = Scenario::parse("name: empty", Path::new("e.yaml")).unwrap();
        assert_eq!(scenario.expected, OutputSource::Inline(Vec::new()));
        assert_eq!(scenario.actual, OutputSource::Inline(Vec::new()));
        assert_eq!(scenario.counters, CounterSection::default());
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = Scenario::parse("description: no name", Path::new("bad.yaml")).unwrap_err();
        assert!(matches!(err, Error::ScenarioParse { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_tsv_fields_are_typed_like_yaml() {
        let pairs = parse_tsv("hello\t2\n\nflag\ttrue\nk\tsome text\n").unwrap();
        assert_eq!(
            pairs,
            vec![
                Pair::new(Value::text("hello"), Value::Long(2)),
                Pair::new(Value::text("flag"), Value::Bool(true)),
                Pair::new(Value::text("k"), Value::text("some text")),
            ]
        );
    }

    #[test]
    fn test_tsv_rejects_line_without_tab() {
        assert!(matches!(parse_tsv("no tab here"), Err(Error::InvalidPair(_))));
    }

    #[test]
    fn test_field_value_falls_back_to_text() {
        assert_eq!(field_value("a: b"), Value::text("a: b"));
        assert_eq!(field_value("[1"), Value::text("[1"));
        assert_eq!(field_value(""), Value::text(""));
        assert_eq!(field_value("~"), Value::Null);
        assert_eq!(field_value("null"), Value::Null);
    }

    #[test]
    fn test_field_value_keeps_text_verbatim() {
        for raw in ["#tag", "a # c", "'quoted'", "\"quoted\"", " padded ", "007", "+5", "inf", "NaN", "1.2.3", "e5", "-"] {
            assert_eq!(field_value(raw), Value::text(raw), "{raw:?}");
        }
    }

    #[test]
    fn test_field_value_numbers() {
        assert_eq!(field_value("-42"), Value::Long(-42));
        assert_eq!(field_value("1.5"), Value::from(1.5));
        assert_eq!(field_value("-2.5e3"), Value::from(-2500.0));
        assert_eq!(field_value(".5"), Value::from(0.5));
    }

    #[test]
    fn test_floats_inline_and_tsv_agree() {
        let scenario = Scenario::parse(
            "name: f\nexpected: [[k, 1.5]]\n",
            Path::new("f.yaml"),
        )
        .unwrap();
        let inline = scenario.expected.pairs(None).unwrap();
        assert_eq!(inline, vec![Pair::new(Value::text("k"), Value::from(1.5))]);
        assert_eq!(parse_tsv("k\t1.5\n").unwrap(), inline);
    }

    #[test]
    fn test_actual_counters_merge_log() {
        let section = CounterSection {
            expected: Vec::new(),
            actual: vec![CounterSpec {
                group: "wc".to_string(),
                name: "words".to_string(),
                value: 2,
            }],
            actual_file: Some(PathBuf::from("counters.log")),
        };
        let log = "noise\nreporter:counter:wc,words,1\nreporter:counter:wc,lines,4\n";
        let counters = section.actual_counters(Some(log)).unwrap();
        assert_eq!(counters.value_of(&CounterId::new("wc", "words")), 3);
        assert_eq!(counters.find("wc", "lines"), 4);
    }

    #[test]
    fn test_resolve() {
        let base = Path::new("/scenarios");
        assert_eq!(
            resolve(base, Path::new("out.tsv")),
            PathBuf::from("/scenarios/out.tsv")
        );
        assert_eq!(resolve(base, Path::new("/abs/out.tsv")), PathBuf::from("/abs/out.tsv"));
    }
}
