//! Command parser: chat message text plus thread context in, typed
//! `Command` out.
//!
//! The grammar is positional and regex-based. Every recognized keyword
//! has its own production rule; any structural failure inside a rule
//! (a thread root without the expected blocks, a bad token count)
//! surfaces as `Command::Error` so the dispatcher can answer in-thread
//! instead of crashing. The parser does no I/O: the thread root, when a
//! rule needs it, is fetched by the caller and passed in.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::command::{
    Command, ErrorCommand, FlagMap, FlagValue, InterviewCommand, PreparationCommand,
    RequestCommand, ResultCommand, CandidateEntry, KEYWORD_INTERVIEW, KEYWORD_PREPARATION,
    KEYWORD_REQUEST, KEYWORD_RESULT,
};
use crate::event::ChatEvent;

/// Flag that suppresses the scheduling step of a Preparation command.
pub const FLAG_NOSYNC: &str = "NOSYNC";
/// Flag carrying free text for the summary and the event description.
pub const FLAG_COMMENT: &str = "COMMENT";

/// Why a known keyword's remainder could not be parsed.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Thread root message is missing")]
    MissingThreadRoot,

    #[error("Thread root has no {0}")]
    MalformedThreadRoot(&'static str),

    #[error("Space display name has no client segment")]
    MissingClientSegment,

    #[error("Expected 3 to 5 tokens, got {0}")]
    BadTokenCount(usize),

    #[error("'{0}' is not a day.month date")]
    BadDateToken(String),

    #[error("'{0}' is not an hour:minute time")]
    BadTimeToken(String),

    #[error("Missing {0}")]
    MissingArgument(&'static str),

    #[error("'{0}' is not a valid calendar date-time")]
    InvalidDateTime(String),
}

// Compile-once patterns via OnceLock.
fn re_blank_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\r\n|\n|\r){2}").unwrap())
}

fn re_cv_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"CV\s\d+:\s").unwrap())
}

fn re_flag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"--([A-Z]+)(?:\s+"([^"]*)")?"#).unwrap())
}

fn re_date_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}\.\d{1,2}$").unwrap())
}

fn re_time_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}:\d{2}$").unwrap())
}

fn re_devs_amount() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"12\..+\n(\d{1,2})").unwrap())
}

fn re_description_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^14\.").unwrap())
}

fn re_numbered_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,2}\.").unwrap())
}

fn re_space_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]{2,}").unwrap())
}

/// Parse one webhook message into a command.
///
/// `thread_root` is the text of the first message in the originating
/// thread, when the caller could fetch one. Rules that need it and
/// don't get it fail as malformed input, not as a panic.
pub fn parse(event: &ChatEvent, thread_root: Option<&str>, bot_name: &str) -> Command {
    let (space_id, thread_id) = routing_ids(event);

    let text = event
        .message
        .as_ref()
        .map(|m| m.text.as_str())
        .unwrap_or("");
    if text.trim().is_empty() {
        // Nothing to quote back and nothing worth replying to.
        return Command::Error(ErrorCommand {
            token: String::new(),
            space_id: None,
            thread_id: None,
        });
    }

    let body = strip_mention(text, bot_name);
    let (keyword, remainder) = match body.split_once(' ') {
        Some((k, r)) => (k, r),
        None => (body, ""),
    };

    let display_name = event
        .space
        .as_ref()
        .map(|s| s.display_name.as_str())
        .unwrap_or("");

    let parsed = match keyword {
        KEYWORD_PREPARATION => parse_preparation(remainder, thread_root),
        KEYWORD_REQUEST => parse_request(remainder, thread_root, &space_id, &thread_id),
        KEYWORD_INTERVIEW => parse_interview(remainder, display_name, &space_id, &thread_id),
        KEYWORD_RESULT => parse_result(remainder, display_name),
        _ => {
            return Command::Error(ErrorCommand {
                token: keyword.to_string(),
                space_id,
                thread_id,
            })
        }
    };

    match parsed {
        Ok(command) => command,
        Err(e) => {
            log::warn!("{} command failed to parse: {}", keyword, e);
            Command::Error(ErrorCommand {
                token: keyword.to_string(),
                space_id,
                thread_id,
            })
        }
    }
}

/// Space and thread ids for reply routing. The thread name has the form
/// `spaces/<space>/threads/<thread>`; when the event has no thread, the
/// space id falls back to the space resource name.
pub fn routing_ids(event: &ChatEvent) -> (Option<String>, Option<String>) {
    let thread_name = event
        .message
        .as_ref()
        .and_then(|m| m.thread.as_ref())
        .map(|t| t.name.as_str())
        .unwrap_or("");

    let parts: Vec<&str> = thread_name.split('/').collect();
    let space_id = parts
        .get(1)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .or_else(|| {
            event
                .space
                .as_ref()
                .and_then(|s| s.space_id())
                .map(str::to_string)
        });
    let thread_id = parts
        .get(3)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    (space_id, thread_id)
}

fn strip_mention<'a>(text: &'a str, bot_name: &str) -> &'a str {
    text.strip_prefix(bot_name).unwrap_or(text).trim_start()
}

// ---------------------------------------------------------------------------
// Per-keyword production rules
// ---------------------------------------------------------------------------

fn parse_preparation(
    remainder: &str,
    thread_root: Option<&str>,
) -> Result<Command, ParseError> {
    let root = thread_root.ok_or(ParseError::MissingThreadRoot)?;
    let (request_name, client_name) = parse_root_names(root)?;

    let (stripped, flags) = extract_flags(remainder);
    let candidates: Vec<CandidateEntry> = split_cv_blocks(&stripped)
        .iter()
        .map(|block| parse_candidate_entry(block))
        .collect();

    let description = flags.text(FLAG_COMMENT).map(str::to_string);

    Ok(Command::Preparation(PreparationCommand {
        request_name,
        client_name,
        candidates,
        flags,
        description,
    }))
}

fn parse_request(
    remainder: &str,
    thread_root: Option<&str>,
    space_id: &Option<String>,
    thread_id: &Option<String>,
) -> Result<Command, ParseError> {
    let client_name = remainder.trim();
    if client_name.is_empty() {
        return Err(ParseError::MissingArgument("client name"));
    }

    let root = thread_root.ok_or(ParseError::MissingThreadRoot)?;
    let blocks = split_blank_lines(root);
    let name_block = blocks
        .get(1)
        .ok_or(ParseError::MalformedThreadRoot("request-name block"))?;
    let request_name = name_block
        .lines()
        .next()
        .ok_or(ParseError::MalformedThreadRoot("request-name line"))?
        .to_string();
    let details = blocks
        .get(2)
        .ok_or(ParseError::MalformedThreadRoot("details block"))?;

    Ok(Command::Request(RequestCommand {
        client_name: client_name.to_string(),
        request_name,
        devs_amount: parse_devs_amount(details),
        description: parse_description(details),
        space_id: space_id.clone(),
        thread_id: thread_id.clone(),
    }))
}

fn parse_interview(
    remainder: &str,
    display_name: &str,
    space_id: &Option<String>,
    thread_id: &Option<String>,
) -> Result<Command, ParseError> {
    let tokens: Vec<&str> = remainder.split_whitespace().collect();

    // Arity decides the interpretation; a colon in the 4th token marks
    // it as the time, which pushes a first name into position 2.
    let (last_name, first_name, date, time, client) = match tokens.len() {
        3 => (tokens[0], None, tokens[1], tokens[2], None),
        4 if tokens[3].contains(':') => {
            (tokens[0], Some(tokens[1]), tokens[2], tokens[3], None)
        }
        4 => (tokens[0], None, tokens[1], tokens[2], Some(tokens[3])),
        5 => (tokens[0], Some(tokens[1]), tokens[2], tokens[3], Some(tokens[4])),
        n => return Err(ParseError::BadTokenCount(n)),
    };

    if !re_date_token().is_match(date) {
        return Err(ParseError::BadDateToken(date.to_string()));
    }
    if !re_time_token().is_match(time) {
        return Err(ParseError::BadTimeToken(time.to_string()));
    }

    let client_name = match client {
        Some(name) => name.to_string(),
        None => derive_client(display_name)?,
    };

    Ok(Command::Interview(InterviewCommand {
        last_name: last_name.to_string(),
        first_name: first_name.map(capitalize),
        client_name,
        date_time: format!("{} {}", date, time),
        space_name: display_name.to_string(),
        space_id: space_id.clone(),
        thread_id: thread_id.clone(),
    }))
}

fn parse_result(remainder: &str, display_name: &str) -> Result<Command, ParseError> {
    let (last_name, result) = remainder
        .split_once(' ')
        .ok_or(ParseError::MissingArgument("result text"))?;
    if last_name.is_empty() {
        return Err(ParseError::MissingArgument("developer last name"));
    }

    Ok(Command::Result(ResultCommand {
        last_name: last_name.to_string(),
        client_name: derive_client(display_name)?,
        result: result.to_string(),
        space_name: display_name.to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

/// Request name and client name from the thread root: blocks split on a
/// blank line, block[1]'s first line names the request, block[0]'s 4th
/// `-`-segment names the client.
fn parse_root_names(root: &str) -> Result<(String, String), ParseError> {
    let blocks = split_blank_lines(root);
    let header = blocks
        .first()
        .ok_or(ParseError::MalformedThreadRoot("header block"))?;
    let name_block = blocks
        .get(1)
        .ok_or(ParseError::MalformedThreadRoot("request-name block"))?;

    let request_name = name_block
        .lines()
        .next()
        .ok_or(ParseError::MalformedThreadRoot("request-name line"))?
        .to_string();
    let client_name = header
        .split('-')
        .nth(3)
        .ok_or(ParseError::MalformedThreadRoot("client segment"))?
        .trim()
        .to_string();

    Ok((request_name, client_name))
}

fn split_blank_lines(text: &str) -> Vec<&str> {
    re_blank_line().split(text).collect()
}

/// Pull `--FLAG` / `--FLAG "value"` tokens out of the remainder. The
/// stripped text keeps its line structure; only space runs left behind
/// by a removed flag are collapsed.
fn extract_flags(remainder: &str) -> (String, FlagMap) {
    let mut flags = FlagMap::default();
    let stripped = re_flag().replace_all(remainder, |caps: &regex::Captures| {
        let value = match caps.get(2) {
            Some(v) => FlagValue::Text(v.as_str().to_string()),
            None => FlagValue::Set,
        };
        flags.insert(caps[1].to_string(), value);
        ""
    });
    let collapsed = re_space_run().replace_all(stripped.trim(), " ").into_owned();
    (collapsed, flags)
}

fn split_cv_blocks(text: &str) -> Vec<&str> {
    re_cv_marker()
        .split(text)
        .filter(|block| !block.trim().is_empty())
        .collect()
}

/// One CV block into ordered `key - value` pairs. Pairs without the
/// ` - ` separator are dropped rather than failing the block.
fn parse_candidate_entry(block: &str) -> CandidateEntry {
    let pairs = block
        .split(", ")
        .filter_map(|pair| {
            pair.split_once(" - ")
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect();
    CandidateEntry::new(pairs)
}

/// 1-2 digit developer count on the line after the "12." line.
fn parse_devs_amount(details: &str) -> Option<String> {
    re_devs_amount()
        .captures(details)
        .map(|caps| caps[1].to_string())
}

/// Text from the "14." line up to (not including) the next "NN." line.
fn parse_description(details: &str) -> Option<String> {
    let lines: Vec<&str> = details.lines().collect();
    let start = lines
        .iter()
        .position(|line| re_description_marker().is_match(line))?;

    let mut out = vec![lines[start]];
    for line in &lines[start + 1..] {
        if re_numbered_marker().is_match(line) {
            break;
        }
        out.push(line);
    }

    let text = out.join("\n").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// 2nd `-`-segment of the space display name, trimmed.
fn derive_client(display_name: &str) -> Result<String, ParseError> {
    display_name
        .splitn(3, '-')
        .nth(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingClientSegment)
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
