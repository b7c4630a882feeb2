//! Bot configuration loaded from `~/.staffbot/config.json`.
//!
//! All fields carry serde defaults so a minimal file (just the Google
//! credentials) is enough to run. Secrets can also come from the
//! environment (`STAFFBOT_CLIENT_ID`, `STAFFBOT_CLIENT_SECRET`,
//! `STAFFBOT_REFRESH_TOKEN`), which takes precedence over the file, as
//! does `STAFFBOT_ADDR` for the listen address.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A bookable meeting room: human name plus its calendar resource id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfig {
    pub name: String,
    pub resource_email: String,
}

/// OAuth2 credentials for the Google REST surface (refresh-token flow).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCredentials {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// Mention prefix stripped from incoming messages, including the
    /// trailing space ("@Staff Bot ").
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    /// IANA timezone all scheduling arithmetic runs in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_work_hours_start")]
    pub work_hours_start: u8,
    #[serde(default = "default_work_hours_end")]
    pub work_hours_end: u8,
    /// How many days ahead the free-slot search looks.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
    /// Space id of the staffing channel where preparation summaries go.
    #[serde(default)]
    pub staffing_space: String,
    /// Staffing group address invited to every request sync.
    #[serde(default)]
    pub group_email: String,
    /// Staff members invited to every interview.
    #[serde(default)]
    pub staff_emails: Vec<String>,
    #[serde(default = "default_rooms")]
    pub rooms: Vec<RoomConfig>,
    /// Override for the SQLite path. Defaults to `~/.staffbot/staffbot.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub google: GoogleCredentials,
}

fn default_bot_name() -> String {
    "@Staff Bot ".to_string()
}
fn default_timezone() -> String {
    "Europe/Moscow".to_string()
}
fn default_work_hours_start() -> u8 {
    8
}
fn default_work_hours_end() -> u8 {
    17
}
fn default_horizon_days() -> u32 {
    7
}
fn default_slot_minutes() -> u32 {
    15
}
fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The office roster, in allocation order.
fn default_rooms() -> Vec<RoomConfig> {
    const ROOMS: [(&str, &str); 9] = [
        ("205", "c_188fhqo2uejg8jd4lab0c53gvb5cg@resource.calendar.google.com"),
        ("204", "c_1888bffs8loncjd9h9tq8uv3va2ek@resource.calendar.google.com"),
        ("211", "c_188700nojl77gifrjs8p4ot6tv9bs@resource.calendar.google.com"),
        ("210", "c_188db7ki2gvneipljc8i7do1vih46@resource.calendar.google.com"),
        ("301", "c_1882hrb18vkc6jufhr3lg461v84jk@resource.calendar.google.com"),
        ("307", "c_1888a0ngsiu14i9khe3c0q4n0hqki@resource.calendar.google.com"),
        ("308", "c_188b6mi231eaqhi3mr4e0jclgj45g@resource.calendar.google.com"),
        ("311", "c_1883rcfnejvjsj8fitbp4d3h7854o@resource.calendar.google.com"),
        ("312", "c_188blbdsisqvuhdilv72an345qtcs@resource.calendar.google.com"),
    ];
    ROOMS
        .iter()
        .map(|(name, email)| RoomConfig {
            name: (*name).to_string(),
            resource_email: (*email).to_string(),
        })
        .collect()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            timezone: default_timezone(),
            work_hours_start: default_work_hours_start(),
            work_hours_end: default_work_hours_end(),
            horizon_days: default_horizon_days(),
            slot_minutes: default_slot_minutes(),
            staffing_space: String::new(),
            group_email: String::new(),
            staff_emails: Vec::new(),
            rooms: default_rooms(),
            db_path: None,
            listen_addr: default_listen_addr(),
            google: GoogleCredentials::default(),
        }
    }
}

impl BotConfig {
    /// Parse the configured timezone, falling back to the default when
    /// the name is unknown.
    pub fn tz(&self) -> chrono_tz::Tz {
        match self.timezone.parse() {
            Ok(tz) => tz,
            Err(_) => {
                log::warn!("Unknown timezone '{}', using Europe/Moscow", self.timezone);
                chrono_tz::Europe::Moscow
            }
        }
    }
}

/// Path to the config file: `~/.staffbot/config.json`.
pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".staffbot").join("config.json"))
}

/// Default database path: `~/.staffbot/staffbot.db`.
pub fn default_db_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".staffbot").join("staffbot.db"))
}

/// Load configuration from disk and apply environment overrides.
///
/// A missing file is not an error: the defaults cover everything except
/// the Google credentials, which can come from the environment.
pub fn load_config() -> Result<BotConfig, String> {
    let path = config_path()?;

    let mut config = if path.exists() {
        let content =
            fs::read_to_string(&path).map_err(|e| format!("Failed to read config: {}", e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?
    } else {
        log::info!("No config file at {}, using defaults", path.display());
        BotConfig::default()
    };

    apply_env_overrides(&mut config);

    if config.google.client_id.is_empty() || config.google.refresh_token.is_empty() {
        return Err(format!(
            "Google credentials missing. Set them in {} or via STAFFBOT_CLIENT_ID / \
             STAFFBOT_CLIENT_SECRET / STAFFBOT_REFRESH_TOKEN",
            path.display()
        ));
    }

    Ok(config)
}

fn apply_env_overrides(config: &mut BotConfig) {
    if let Ok(v) = std::env::var("STAFFBOT_CLIENT_ID") {
        config.google.client_id = v;
    }
    if let Ok(v) = std::env::var("STAFFBOT_CLIENT_SECRET") {
        config.google.client_secret = v;
    }
    if let Ok(v) = std::env::var("STAFFBOT_REFRESH_TOKEN") {
        config.google.refresh_token = v;
    }
    if let Ok(v) = std::env::var("STAFFBOT_ADDR") {
        config.listen_addr = v;
    }
}
