// ABOUTME: Page profiles: a URL template plus the descriptor set applied to pages built from it.
// ABOUTME: Provides load_builtin_profile() for the embedded investidor10 stock page profile.

//! Page profile definitions and loading.
//!
//! A profile is the JSON form of "what page to load and what to pull out of
//! it". The URL may contain a `{ticker}` placeholder.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::DescriptorSet;
use crate::error::ScrapeError;

/// Embedded JSON for the stock page on investidor10.com.br.
const BUILTIN_PROFILE_JSON: &str = include_str!("../data/investidor10.json");

const TICKER_PLACEHOLDER: &str = "{ticker}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub url: String,
    #[serde(flatten)]
    pub descriptors: DescriptorSet,
}

impl Profile {
    /// Parses and validates a profile from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ScrapeError> {
        let profile: Profile = serde_json::from_str(json).map_err(|e| {
            ScrapeError::profile("Load", Some(anyhow::anyhow!("malformed profile: {}", e)))
        })?;
        profile.descriptors.validate()?;
        Ok(profile)
    }

    /// Reads, parses and validates a profile file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScrapeError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            ScrapeError::profile(
                "Load",
                Some(anyhow::anyhow!("reading {}: {}", path.display(), e)),
            )
        })?;
        Self::from_json_str(&json)
    }

    /// Whether the URL contains a `{ticker}` placeholder.
    pub fn is_template(&self) -> bool {
        self.url.contains(TICKER_PLACEHOLDER)
    }

    /// The page URL for `ticker`, lower-cased into the placeholder.
    pub fn url_for(&self, ticker: &str) -> String {
        self.url
            .replace(TICKER_PLACEHOLDER, &ticker.trim().to_lowercase())
    }
}

/// Loads the builtin profile from embedded JSON.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed or fails validation.
pub fn load_builtin_profile() -> Profile {
    Profile::from_json_str(BUILTIN_PROFILE_JSON).expect("failed to parse builtin profile")
}
