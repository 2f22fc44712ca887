//! Psychological care finder backed by OpenStreetMap Nominatim.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{http_client, LookupTool, ToolKind};
use crate::error::Result;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Most places listed in one reply.
pub const MAX_RESULTS: usize = 10;

/// Results requested per search term.
const PER_TERM_LIMIT: usize = 5;

/// Synonyms combined with the user's location, queried in this order.
pub const SEARCH_TERMS: &[&str] = &[
    "psicólogo",
    "centro psicológico",
    "clínica psicológica",
    "hospital psiquiátrico",
    "salud mental",
];

/// Gap between requests to the public Nominatim host (usage policy: 1 req/s).
pub const PUBLIC_NOMINATIM_SPACING: Duration = Duration::from_millis(1100);

const PUBLIC_NOMINATIM_HOST: &str = "nominatim.openstreetmap.org";

/// One place-search hit.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Place {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
}

pub struct ClinicsTool {
    client: Client,
    base_url: String,
    spacing: Duration,
}

impl ClinicsTool {
    /// Requests to the public Nominatim host are spaced out; self-hosted
    /// instances are queried back to back.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let spacing = if is_public_nominatim(&base_url) {
            PUBLIC_NOMINATIM_SPACING
        } else {
            Duration::ZERO
        };
        Self { client: http_client(REQUEST_TIMEOUT), base_url, spacing }
    }

    pub fn with_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    async fn search(&self, term: &str, location: &str) -> Result<Vec<Place>> {
        let q = format!("{} {}", term, location);
        let limit = PER_TERM_LIMIT.to_string();
        let places = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", q.as_str()), ("format", "json"), ("limit", limit.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Place>>()
            .await?;
        Ok(places)
    }

    /// Query every term sequentially and merge. `None` when all terms failed.
    async fn search_all(&self, location: &str) -> Option<Vec<Place>> {
        let mut batches = Vec::with_capacity(SEARCH_TERMS.len());
        let mut failures = 0;

        for (i, term) in SEARCH_TERMS.iter().enumerate() {
            if i > 0 && !self.spacing.is_zero() {
                tokio::time::sleep(self.spacing).await;
            }
            match self.search(term, location).await {
                Ok(places) => batches.push(places),
                Err(e) => {
                    failures += 1;
                    tracing::warn!("Place search {:?} near {:?} failed: {}", term, location, e);
                }
            }
        }

        if failures == SEARCH_TERMS.len() {
            return None;
        }
        Some(merge_places(batches))
    }
}

fn is_public_nominatim(base_url: &str) -> bool {
    reqwest::Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(|h| h.eq_ignore_ascii_case(PUBLIC_NOMINATIM_HOST)))
        .unwrap_or(false)
}

/// Flatten batches, drop repeated names (first one wins) and cap the list.
pub fn merge_places(batches: Vec<Vec<Place>>) -> Vec<Place> {
    let mut seen = HashSet::new();
    batches
        .into_iter()
        .flatten()
        .filter(|p| seen.insert(p.display_name.clone()))
        .take(MAX_RESULTS)
        .collect()
}

pub fn format_places(location: &str, places: &[Place]) -> String {
    if places.is_empty() {
        return format!("No encontré centros psicológicos cerca de '{}'.", location);
    }

    places
        .iter()
        .map(|p| format!("• {} - 📍 Lat: {}, Lon: {}", p.display_name, p.lat, p.lon))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl LookupTool for ClinicsTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Clinics
    }

    async fn run(&self, query: &str) -> String {
        let location = query.trim();
        match self.search_all(location).await {
            Some(places) => {
                tracing::info!("Found {} places near {:?}", places.len(), location);
                format_places(location, &places)
            }
            None => {
                tracing::error!("Every place search near {:?} failed", location);
                "⚠️ No pude consultar centros psicológicos en este momento. Intenta más tarde."
                    .to_string()
            }
        }
    }
}
