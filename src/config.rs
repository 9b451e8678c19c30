//! Application settings and the key-value port they persist through.
//!
//! Settings are one JSON document under [`CONFIG_KEY`]. Loading never fails:
//! a missing or unreadable document yields the defaults.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Storage key of the settings document.
pub const CONFIG_KEY: &str = "stepflow.config";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
	#[default]
	Dark,
	Light,
}

impl ThemeMode {
	pub const ALL: [ThemeMode; 2] = [ThemeMode::Dark, ThemeMode::Light];

	pub fn as_str(self) -> &'static str {
		match self {
			ThemeMode::Dark => "dark",
			ThemeMode::Light => "light",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|m| m.as_str() == value)
	}
}

/// Backend used by the explanation side panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationProvider {
	/// Panel hidden.
	#[default]
	Off,
	OpenAi,
	Anthropic,
	Gemini,
}

impl ExplanationProvider {
	pub const ALL: [ExplanationProvider; 4] = [
		ExplanationProvider::Off,
		ExplanationProvider::OpenAi,
		ExplanationProvider::Anthropic,
		ExplanationProvider::Gemini,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			ExplanationProvider::Off => "off",
			ExplanationProvider::OpenAi => "openai",
			ExplanationProvider::Anthropic => "anthropic",
			ExplanationProvider::Gemini => "gemini",
		}
	}

	pub fn display_name(self) -> &'static str {
		match self {
			ExplanationProvider::Off => "Off",
			ExplanationProvider::OpenAi => "OpenAI",
			ExplanationProvider::Anthropic => "Anthropic",
			ExplanationProvider::Gemini => "Gemini",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|p| p.as_str() == value)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
	pub theme: ThemeMode,
	pub provider: ExplanationProvider,
}

impl AppConfig {
	/// Read settings from `store`, falling back to defaults.
	pub fn load(store: &impl KeyValueStore) -> Self {
		let Some(raw) = store.get(CONFIG_KEY) else {
			log::debug!("no stored settings, using defaults");
			return Self::default();
		};
		match serde_json::from_str(&raw) {
			Ok(config) => config,
			Err(err) => {
				log::warn!("stored settings unreadable ({}), using defaults", err);
				Self::default()
			}
		}
	}

	pub fn save(&self, store: &impl KeyValueStore) -> Result<(), ConfigError> {
		let raw = serde_json::to_string(self)?;
		store.set(CONFIG_KEY, &raw)
	}
}

/// String key-value persistence.
pub trait KeyValueStore {
	fn get(&self, key: &str) -> Option<String>;
	fn set(&self, key: &str, value: &str) -> Result<(), ConfigError>;
}

/// `window.localStorage`.
#[derive(Clone, Debug)]
pub struct BrowserStorage {
	storage: web_sys::Storage,
}

impl BrowserStorage {
	pub fn open() -> Result<Self, ConfigError> {
		let window = web_sys::window().ok_or_else(|| ConfigError::Unavailable("no window".into()))?;
		let storage = window
			.local_storage()
			.map_err(|err| ConfigError::Unavailable(format!("{err:?}")))?
			.ok_or_else(|| ConfigError::Unavailable("localStorage disabled".into()))?;
		Ok(Self { storage })
	}
}

impl KeyValueStore for BrowserStorage {
	fn get(&self, key: &str) -> Option<String> {
		self.storage.get_item(key).ok().flatten()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
		self.storage
			.set_item(key, value)
			.map_err(|err| ConfigError::WriteRejected {
				key: key.to_string(),
				reason: format!("{err:?}"),
			})
	}
}

/// In-memory store, shared between clones.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.borrow().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
		self.entries.borrow_mut().insert(key.to_string(), value.to_string());
		Ok(())
	}
}

/// Either backend, chosen at startup.
#[derive(Clone, Debug)]
pub enum SettingsStore {
	Browser(BrowserStorage),
	Memory(MemoryStore),
}

impl SettingsStore {
	/// localStorage when available, otherwise a process-lifetime memory store.
	pub fn detect() -> Self {
		match BrowserStorage::open() {
			Ok(storage) => SettingsStore::Browser(storage),
			Err(err) => {
				log::warn!("{}; settings will not persist", err);
				SettingsStore::Memory(MemoryStore::new())
			}
		}
	}
}

impl KeyValueStore for SettingsStore {
	fn get(&self, key: &str) -> Option<String> {
		match self {
			SettingsStore::Browser(s) => s.get(key),
			SettingsStore::Memory(s) => s.get(key),
		}
	}

	fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
		match self {
			SettingsStore::Browser(s) => s.set(key, value),
			SettingsStore::Memory(s) => s.set(key, value),
		}
	}
}
