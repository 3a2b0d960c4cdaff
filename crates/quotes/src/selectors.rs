// ABOUTME: Pre-compiled CSS selector cache shared by field and table extraction.
// ABOUTME: Compiles each selector string once; invalid selectors are cached as misses.

//! Selector caching for repeated document queries.
//!
//! Descriptors are plain strings so they can be loaded from JSON profiles.
//! Every extraction call looks its selectors up here instead of re-parsing
//! them. The cache never influences results: a cached selector and a freshly
//! compiled one match exactly the same nodes.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use scraper::Selector;

use crate::error::ScrapeError;

static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Selector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the result.
///
/// Returns `None` for selectors that fail to parse. A poisoned lock falls
/// back to compiling without the cache.
pub fn get_or_compile(css: &str) -> Option<Selector> {
    if let Ok(cache) = SELECTOR_CACHE.read() {
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Selector::parse(css).ok();
    if let Ok(mut cache) = SELECTOR_CACHE.write() {
        // Another thread may have inserted while we were compiling
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
        cache.insert(css.to_string(), compiled.clone());
    }
    compiled
}

/// Compiles a selector, reporting why it is invalid.
pub fn compile(css: &str) -> Result<Selector, ScrapeError> {
    if let Some(sel) = get_or_compile(css) {
        return Ok(sel);
    }
    let reason = match Selector::parse(css) {
        Err(e) => e.to_string(),
        Ok(_) => "rejected".to_string(),
    };
    Err(ScrapeError::selector(
        "Compile",
        Some(anyhow::anyhow!("`{}`: {}", css, reason)),
    ))
}

/// Precompiles a batch of selectors into the cache.
pub fn precompile_selectors<I, S>(selectors: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let Ok(mut cache) = SELECTOR_CACHE.write() else {
        return;
    };
    for css in selectors {
        let css = css.as_ref();
        if !cache.contains_key(css) {
            cache.insert(css.to_string(), Selector::parse(css).ok());
        }
    }
}
