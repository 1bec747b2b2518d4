//! Persisted user settings.
//!
//! The settings record is the configuration a session is created from. It is
//! owned by whatever surface edits it and read by the orchestrator; nothing
//! here validates it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::persistence::{Database, StoreError};

const DEFAULT_USER: &str = "user@email.com";
const DEFAULT_FILES: &str =
    "https://alemoraoaist.z13.web.core.windows.net/docs/Energy/wind_turbines_telemetry.csv";

/// Prompt loaded alongside the sample settings.
pub const SAMPLE_PROMPT: &str =
    "Generate a chart of the latest MSFT, APPL, TSLA and NVDIA stock prices?";

/// The four user-editable fields a session is created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// User identity; also the key every remote call is scoped by.
    pub user: String,
    /// Assistant display name
    pub name: String,
    pub instructions: String,
    /// Comma-separated file URLs
    pub files: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            name: "CSV Assistant".to_string(),
            instructions: "You are an Assistant that can help analyze and perform calculations \
                using the provided file(s). You are polite and friendly. After answering the \
                user's, say, \"Can I be of further assistance.\""
                .to_string(),
            files: DEFAULT_FILES.to_string(),
        }
    }
}

impl Settings {
    /// The "Personalized Assistant" preset.
    pub fn sample() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            name: "Personalized Assistant".to_string(),
            instructions: "You are an Assistant that can help analyze and perform calculations \
                on the provided data file(s). Use only the provided data. Be polite, friendly, \
                and helpful. After answering a user's question, say, \"Can I be of further \
                assistance.\""
                .to_string(),
            files: DEFAULT_FILES.to_string(),
        }
    }

    /// True when every field is non-empty.
    pub fn is_complete(&self) -> bool {
        !(self.user.is_empty()
            || self.name.is_empty()
            || self.instructions.is_empty()
            || self.files.is_empty())
    }

    /// Split the file field on commas and trim each locator.
    pub fn file_urls(&self) -> Vec<String> {
        self.files
            .split(',')
            .map(|file| file.trim().to_string())
            .collect()
    }

    pub fn field(&self, field: SettingsField) -> &str {
        match field {
            SettingsField::User => &self.user,
            SettingsField::Name => &self.name,
            SettingsField::Instructions => &self.instructions,
            SettingsField::Files => &self.files,
        }
    }

    /// Return a copy with one field replaced.
    pub fn with_field(&self, field: SettingsField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let value = value.into();
        match field {
            SettingsField::User => next.user = value,
            SettingsField::Name => next.name = value,
            SettingsField::Instructions => next.instructions = value,
            SettingsField::Files => next.files = value,
        }
        next
    }
}

/// Names of the editable settings fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    User,
    Name,
    Instructions,
    Files,
}

impl SettingsField {
    pub const ALL: [SettingsField; 4] = [
        SettingsField::User,
        SettingsField::Name,
        SettingsField::Instructions,
        SettingsField::Files,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsField::User => "user",
            SettingsField::Name => "name",
            SettingsField::Instructions => "instructions",
            SettingsField::Files => "files",
        }
    }
}

impl fmt::Display for SettingsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingsField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingsField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown settings field '{s}' (expected user, name, instructions or files)")
            })
    }
}

/// Durable settings: every `set` is written through before it becomes visible.
pub struct PersistedSettings {
    db: Database,
    current: ArcSwap<Settings>,
}

impl PersistedSettings {
    /// Load the stored record, seeding the defaults on first run.
    pub async fn load(db: Database) -> Result<Self, StoreError> {
        let settings = match db.load_settings().await? {
            Some(settings) => settings,
            None => {
                let defaults = Settings::default();
                db.save_settings(defaults.clone()).await?;
                info!(
                    component = "settings",
                    event = "settings.seeded",
                    user = %defaults.user,
                );
                defaults
            }
        };

        Ok(Self {
            db,
            current: ArcSwap::from_pointee(settings),
        })
    }

    pub fn get(&self) -> Settings {
        self.current.load().as_ref().clone()
    }

    /// User identity only, without cloning the whole record.
    pub fn user(&self) -> String {
        self.current.load().user.clone()
    }

    pub async fn set(&self, settings: Settings) -> Result<(), StoreError> {
        self.db.save_settings(settings.clone()).await?;
        self.current.store(Arc::new(settings));
        Ok(())
    }
}
