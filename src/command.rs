//! Typed commands produced by the parser.
//!
//! One variant per recognized keyword plus `Error` for everything the
//! parser could not place. Commands are transient: built per webhook
//! invocation, consumed by exactly one handler, then dropped.

use std::collections::HashMap;

/// Recognized command keywords, matched case-sensitively after the
/// bot-mention prefix.
pub const KEYWORD_PREPARATION: &str = "PREPARATION";
pub const KEYWORD_REQUEST: &str = "REQUEST";
pub const KEYWORD_INTERVIEW: &str = "INTERVIEW";
pub const KEYWORD_RESULT: &str = "RESULT";

/// One key→value mapping parsed from a "CV N:" block. Keys are
/// open-ended and passed through verbatim, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateEntry {
    pairs: Vec<(String, String)>,
}

impl CandidateEntry {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The `candidate_name` value, the one key every block must carry.
    pub fn candidate_name(&self) -> Option<&str> {
        self.get("candidate_name")
    }

    pub fn link(&self) -> Option<&str> {
        self.get("link")
    }

    pub fn description(&self) -> Option<&str> {
        self.get("description")
    }
}

/// Value of one inline `--FLAG` token: bare presence or a quoted string.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Set,
    Text(String),
}

/// Free-form flag map extracted from a Preparation remainder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagMap {
    flags: HashMap<String, FlagValue>,
}

impl FlagMap {
    pub fn insert(&mut self, name: String, value: FlagValue) {
        self.flags.insert(name, value);
    }

    /// True when the flag is present, bare or with a value.
    pub fn is_set(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    /// The quoted value of a flag, when it has one.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.flags.get(name) {
            Some(FlagValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparationCommand {
    /// First line of the thread root's second block.
    pub request_name: String,
    /// Fourth `-`-segment of the thread root's first block.
    pub client_name: String,
    pub candidates: Vec<CandidateEntry>,
    pub flags: FlagMap,
    /// The `--COMMENT "..."` value, when given.
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestCommand {
    /// Remainder of the triggering message.
    pub client_name: String,
    pub request_name: String,
    pub devs_amount: Option<String>,
    pub description: Option<String>,
    pub space_id: Option<String>,
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterviewCommand {
    pub last_name: String,
    pub first_name: Option<String>,
    pub client_name: String,
    /// Raw `"d.m H:M"` string; the handler parses it in the business
    /// timezone.
    pub date_time: String,
    /// Space display name, stored on the interview record so a later
    /// Result command can find it.
    pub space_name: String,
    pub space_id: Option<String>,
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultCommand {
    pub last_name: String,
    pub client_name: String,
    pub result: String,
    /// Space display name, retained as the interview record identifier.
    pub space_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorCommand {
    pub token: String,
    pub space_id: Option<String>,
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Preparation(PreparationCommand),
    Request(RequestCommand),
    Interview(InterviewCommand),
    Result(ResultCommand),
    Error(ErrorCommand),
}

impl Command {
    /// The keyword this command was parsed from. `Error` reports the
    /// offending token instead.
    pub fn keyword(&self) -> &str {
        match self {
            Command::Preparation(_) => KEYWORD_PREPARATION,
            Command::Request(_) => KEYWORD_REQUEST,
            Command::Interview(_) => KEYWORD_INTERVIEW,
            Command::Result(_) => KEYWORD_RESULT,
            Command::Error(e) => &e.token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_entry_preserves_order_and_keys() {
        let entry = CandidateEntry::new(vec![
            ("candidate_name".to_string(), "Иванов Иван".to_string()),
            ("link".to_string(), "https://cv.example/1".to_string()),
            ("note".to_string(), "middle".to_string()),
        ]);
        let keys: Vec<&str> = entry.keys().collect();
        assert_eq!(keys, vec!["candidate_name", "link", "note"]);
        assert_eq!(entry.candidate_name(), Some("Иванов Иван"));
        assert_eq!(entry.link(), Some("https://cv.example/1"));
        assert_eq!(entry.get("missing"), None);
    }

    #[test]
    fn test_flag_map_set_and_text() {
        let mut flags = FlagMap::default();
        flags.insert("NOSYNC".to_string(), FlagValue::Set);
        flags.insert(
            "COMMENT".to_string(),
            FlagValue::Text("urgent request".to_string()),
        );

        assert!(flags.is_set("NOSYNC"));
        assert!(flags.is_set("COMMENT"));
        assert!(!flags.is_set("OTHER"));
        assert_eq!(flags.text("COMMENT"), Some("urgent request"));
        assert_eq!(flags.text("NOSYNC"), None);
        assert_eq!(flags.len(), 2);
    }
}
