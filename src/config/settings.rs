//! Run settings — the named retrieval / model knobs shared by a whole run.
//!
//! `Settings` is a plain value: it is built once at startup (defaults, then
//! the `[settings]` TOML table, then CLI overrides) and handed to the session.
//! Every override batch goes through [`Settings::update`], which either
//! applies all entries or none of them. Derived identifiers such as
//! [`Settings::matching_method`] are computed on demand, so they can never
//! lag behind the values they are built from.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

pub const DEFAULT_RECALL_INDEX: usize = 25;
pub const DEFAULT_NEIGHBOR_NUM: usize = 2;
pub const DEFAULT_DEEP_SEARCH_INDEX: usize = 5;
pub const DEFAULT_DEEP_SEARCH_NUM: usize = 10;
pub const DEFAULT_VOTER_NUM: usize = 10;
pub const DEFAULT_NUM_CTX: usize = 21145;
pub const DEFAULT_COMMON_MODEL: &str = "llama3.1:latest";

/// Every recognised setting name, in display order.
pub const SETTING_NAMES: [&str; 7] = [
    "recall_index",
    "neighbor_num",
    "deep_search_index",
    "deep_search_num",
    "voter_num",
    "num_ctx",
    "common_model",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown setting: {0}")]
    UnknownSetting(String),
    #[error("invalid value for {name}: expected {expected}, got '{got}'")]
    InvalidValue {
        name: String,
        expected: &'static str,
        got: String,
    },
}

/// A single setting value as read from TOML or the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Count(u64),
    Text(String),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Count(n) => write!(f, "{n}"),
            SettingValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for SettingValue {
    fn from(n: u64) -> Self {
        SettingValue::Count(n)
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Text(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::Text(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingKind {
    Count,
    Text,
}

fn kind_of(name: &str) -> Option<SettingKind> {
    match name {
        "recall_index" | "neighbor_num" | "deep_search_index" | "deep_search_num"
        | "voter_num" | "num_ctx" => Some(SettingKind::Count),
        "common_model" => Some(SettingKind::Text),
        _ => None,
    }
}

impl SettingValue {
    /// Parse a raw command-line string into the value type expected by `name`.
    pub fn parse_for(name: &str, raw: &str) -> Result<Self, SettingsError> {
        match kind_of(name) {
            None => Err(SettingsError::UnknownSetting(name.to_string())),
            Some(SettingKind::Text) => Ok(SettingValue::Text(raw.to_string())),
            Some(SettingKind::Count) => raw
                .trim()
                .parse::<u64>()
                .map(SettingValue::Count)
                .map_err(|_| SettingsError::InvalidValue {
                    name: name.to_string(),
                    expected: "a non-negative integer",
                    got: raw.to_string(),
                }),
        }
    }

    /// Convert a TOML value (from the `[settings]` table).
    pub fn from_toml(name: &str, value: &toml::Value) -> Result<Self, SettingsError> {
        match value {
            toml::Value::Integer(n) if *n >= 0 => Ok(SettingValue::Count(*n as u64)),
            toml::Value::String(s) => Ok(SettingValue::Text(s.clone())),
            other => Err(SettingsError::InvalidValue {
                name: name.to_string(),
                expected: "a non-negative integer or a string",
                got: other.to_string(),
            }),
        }
    }

    fn as_count(&self, name: &str) -> Result<usize, SettingsError> {
        match self {
            SettingValue::Count(n) => usize::try_from(*n).map_err(|_| SettingsError::InvalidValue {
                name: name.to_string(),
                expected: "an integer that fits in usize",
                got: n.to_string(),
            }),
            SettingValue::Text(s) => Err(SettingsError::InvalidValue {
                name: name.to_string(),
                expected: "a non-negative integer",
                got: s.clone(),
            }),
        }
    }

    fn as_text(&self, name: &str) -> Result<String, SettingsError> {
        match self {
            SettingValue::Text(s) if !s.trim().is_empty() => Ok(s.clone()),
            other => Err(SettingsError::InvalidValue {
                name: name.to_string(),
                expected: "a non-empty string",
                got: other.to_string(),
            }),
        }
    }
}

/// Split a `name=value` command-line override.
pub fn parse_assignment(arg: &str) -> Result<(String, SettingValue), SettingsError> {
    let (name, raw) = arg.split_once('=').ok_or_else(|| SettingsError::InvalidValue {
        name: arg.to_string(),
        expected: "name=value",
        got: arg.to_string(),
    })?;
    let name = name.trim();
    let value = SettingValue::parse_for(name, raw)?;
    Ok((name.to_string(), value))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    recall_index: usize,
    neighbor_num: usize,
    deep_search_index: usize,
    deep_search_num: usize,
    voter_num: usize,
    num_ctx: usize,
    common_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recall_index: DEFAULT_RECALL_INDEX,
            neighbor_num: DEFAULT_NEIGHBOR_NUM,
            deep_search_index: DEFAULT_DEEP_SEARCH_INDEX,
            deep_search_num: DEFAULT_DEEP_SEARCH_NUM,
            voter_num: DEFAULT_VOTER_NUM,
            num_ctx: DEFAULT_NUM_CTX,
            common_model: DEFAULT_COMMON_MODEL.to_string(),
        }
    }
}

impl Settings {
    pub fn recall_index(&self) -> usize { self.recall_index }
    pub fn neighbor_num(&self) -> usize { self.neighbor_num }
    pub fn deep_search_index(&self) -> usize { self.deep_search_index }
    pub fn deep_search_num(&self) -> usize { self.deep_search_num }
    pub fn voter_num(&self) -> usize { self.voter_num }
    pub fn num_ctx(&self) -> usize { self.num_ctx }
    pub fn common_model(&self) -> &str { &self.common_model }

    /// Look up a setting by name.
    pub fn get(&self, name: &str) -> Result<SettingValue, SettingsError> {
        let value = match name {
            "recall_index" => SettingValue::Count(self.recall_index as u64),
            "neighbor_num" => SettingValue::Count(self.neighbor_num as u64),
            "deep_search_index" => SettingValue::Count(self.deep_search_index as u64),
            "deep_search_num" => SettingValue::Count(self.deep_search_num as u64),
            "voter_num" => SettingValue::Count(self.voter_num as u64),
            "num_ctx" => SettingValue::Count(self.num_ctx as u64),
            "common_model" => SettingValue::Text(self.common_model.clone()),
            _ => return Err(SettingsError::UnknownSetting(name.to_string())),
        };
        Ok(value)
    }

    /// Apply a batch of overrides.
    ///
    /// Names are checked before any value is looked at, so an unknown name is
    /// always reported as [`SettingsError::UnknownSetting`]. On any error
    /// `self` is left exactly as it was.
    pub fn update(&mut self, overrides: &BTreeMap<String, SettingValue>) -> Result<(), SettingsError> {
        if let Some(unknown) = overrides.keys().find(|name| kind_of(name).is_none()) {
            return Err(SettingsError::UnknownSetting(unknown.clone()));
        }

        let mut next = self.clone();
        for (name, value) in overrides {
            next.apply(name, value)?;
        }
        *self = next;
        Ok(())
    }

    fn apply(&mut self, name: &str, value: &SettingValue) -> Result<(), SettingsError> {
        match name {
            "recall_index" => self.recall_index = value.as_count(name)?,
            "neighbor_num" => self.neighbor_num = value.as_count(name)?,
            "deep_search_index" => self.deep_search_index = value.as_count(name)?,
            "deep_search_num" => self.deep_search_num = value.as_count(name)?,
            "voter_num" => self.voter_num = value.as_count(name)?,
            "num_ctx" => self.num_ctx = value.as_count(name)?,
            "common_model" => self.common_model = value.as_text(name)?,
            _ => return Err(SettingsError::UnknownSetting(name.to_string())),
        }
        Ok(())
    }

    /// Composite tag describing the retrieval configuration of a run.
    pub fn matching_method(&self) -> String {
        format!(
            "{}voters+cot+2x{}neighbours+deep_search{}+CTX_{}",
            self.voter_num, self.neighbor_num, self.deep_search_num, self.num_ctx
        )
    }

    /// Per-run folder name: model, matching method, recall depth and run stamp.
    pub fn history_folder(&self, run_stamp: &str) -> String {
        format!(
            "{}+{}@{}_{}",
            self.common_model,
            self.matching_method(),
            self.recall_index,
            run_stamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(entries: &[(&str, SettingValue)]) -> BTreeMap<String, SettingValue> {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.recall_index(), 25);
        assert_eq!(s.neighbor_num(), 2);
        assert_eq!(s.deep_search_index(), 5);
        assert_eq!(s.deep_search_num(), 10);
        assert_eq!(s.voter_num(), 10);
        assert_eq!(s.num_ctx(), 21145);
        assert_eq!(s.common_model(), "llama3.1:latest");
    }

    #[test]
    fn get_returns_every_known_name() {
        let s = Settings::default();
        for name in SETTING_NAMES {
            assert!(s.get(name).is_ok(), "{name} should be readable");
        }
        assert_eq!(s.get("num_ctx").unwrap(), SettingValue::Count(21145));
        assert_eq!(s.get("common_model").unwrap(), SettingValue::from("llama3.1:latest"));
    }

    #[test]
    fn get_unknown_name_errors() {
        let s = Settings::default();
        assert_eq!(
            s.get("temperature"),
            Err(SettingsError::UnknownSetting("temperature".into()))
        );
    }

    #[test]
    fn update_only_touches_supplied_names() {
        let mut s = Settings::default();
        s.update(&batch(&[("recall_index", 8u64.into())])).unwrap();
        s.update(&batch(&[("common_model", "gpt-4o".into())])).unwrap();
        assert_eq!(s.recall_index(), 8);
        assert_eq!(s.common_model(), "gpt-4o");
        assert_eq!(s.neighbor_num(), DEFAULT_NEIGHBOR_NUM);
    }

    #[test]
    fn unknown_name_rejects_whole_batch() {
        let mut s = Settings::default();
        let before = s.clone();
        let err = s
            .update(&batch(&[("recall_index", 3u64.into()), ("recal_index", 4u64.into())]))
            .unwrap_err();
        assert_eq!(err, SettingsError::UnknownSetting("recal_index".into()));
        assert_eq!(s, before);
    }

    #[test]
    fn wrong_type_rejects_whole_batch() {
        let mut s = Settings::default();
        let before = s.clone();
        let err = s
            .update(&batch(&[("neighbor_num", 7u64.into()), ("voter_num", "many".into())]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { ref name, .. } if name == "voter_num"));
        assert_eq!(s, before);
    }

    #[test]
    fn derived_identifiers_follow_updates() {
        let mut s = Settings::default();
        assert_eq!(s.matching_method(), "10voters+cot+2x2neighbours+deep_search10+CTX_21145");
        s.update(&batch(&[("voter_num", 3u64.into()), ("num_ctx", 4096u64.into())])).unwrap();
        assert_eq!(s.matching_method(), "3voters+cot+2x2neighbours+deep_search10+CTX_4096");
        assert_eq!(
            s.history_folder("20250101-000000-000000"),
            "llama3.1:latest+3voters+cot+2x2neighbours+deep_search10+CTX_4096@25_20250101-000000-000000"
        );
    }

    #[test]
    fn parse_assignment_types_by_name() {
        assert_eq!(
            parse_assignment("recall_index=12").unwrap(),
            ("recall_index".to_string(), SettingValue::Count(12))
        );
        assert_eq!(
            parse_assignment("common_model=qwen2:latest").unwrap(),
            ("common_model".to_string(), SettingValue::from("qwen2:latest"))
        );
        assert!(matches!(
            parse_assignment("recall_index=lots"),
            Err(SettingsError::InvalidValue { .. })
        ));
        assert_eq!(
            parse_assignment("depth=3"),
            Err(SettingsError::UnknownSetting("depth".into()))
        );
        assert!(parse_assignment("recall_index").is_err());
    }

    #[test]
    fn toml_values_convert() {
        assert_eq!(
            SettingValue::from_toml("num_ctx", &toml::Value::Integer(2048)).unwrap(),
            SettingValue::Count(2048)
        );
        assert!(SettingValue::from_toml("num_ctx", &toml::Value::Integer(-1)).is_err());
        assert!(SettingValue::from_toml("num_ctx", &toml::Value::Boolean(true)).is_err());
    }

    #[test]
    fn empty_model_name_rejected() {
        let mut s = Settings::default();
        assert!(s.update(&batch(&[("common_model", " ".into())])).is_err());
        assert_eq!(s.common_model(), DEFAULT_COMMON_MODEL);
    }
}
