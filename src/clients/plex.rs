use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::domain::{Candidate, MediaKind};
use crate::services::backends::MediaLibrary;

/// A library entry parsed from a Plex `MediaContainer`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlexItem {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub rating_key: Option<String>,
    pub guids: Vec<String>,
}

impl PlexItem {
    /// Matches by GUID signature first, then by case-insensitive title with
    /// an equal year.
    #[must_use]
    pub fn matches(&self, signatures: &[String], title: &str, year: Option<i32>) -> bool {
        let by_guid = self
            .guids
            .iter()
            .any(|guid| signatures.iter().any(|sig| guid.eq_ignore_ascii_case(sig)));
        if by_guid {
            return true;
        }

        let same_title = self
            .title
            .as_deref()
            .is_some_and(|t| !title.is_empty() && t.to_lowercase() == title.to_lowercase());
        same_title && year.is_some() && self.year == year
    }
}

fn attr_value(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .map(|attr| {
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            quick_xml::escape::unescape(&raw)
                .map(|s| s.into_owned())
                .unwrap_or(raw)
        })
}

fn is_entry(element: &BytesStart<'_>, kind: MediaKind) -> bool {
    let entry_type = attr_value(element, b"type");
    match element.name().as_ref() {
        b"Video" => kind == MediaKind::Movie,
        b"Directory" => kind == MediaKind::Series && entry_type.as_deref() == Some("show"),
        b"Metadata" => match kind {
            MediaKind::Movie => entry_type.as_deref() == Some("movie"),
            MediaKind::Series => entry_type.as_deref() == Some("show"),
        },
        _ => false,
    }
}

fn entry_from(element: &BytesStart<'_>) -> PlexItem {
    PlexItem {
        title: attr_value(element, b"title"),
        year: attr_value(element, b"year").and_then(|y| y.parse().ok()),
        rating_key: attr_value(element, b"ratingKey"),
        guids: Vec::new(),
    }
}

/// Parses the entries of `kind` from a Plex XML response. Malformed XML
/// yields whatever was parsed before the error.
#[must_use]
pub fn parse_media_container(xml: &str, kind: MediaKind) -> Vec<PlexItem> {
    let mut reader = Reader::from_str(xml);
    let mut items = Vec::new();
    let mut current: Option<PlexItem> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                if current.is_none() && is_entry(&element, kind) {
                    current = Some(entry_from(&element));
                } else if element.name().as_ref() == b"Guid" {
                    if let (Some(item), Some(id)) = (current.as_mut(), attr_value(&element, b"id")) {
                        item.guids.push(id);
                    }
                }
            }
            Ok(Event::Empty(element)) => {
                if current.is_none() && is_entry(&element, kind) {
                    items.push(entry_from(&element));
                } else if element.name().as_ref() == b"Guid" {
                    if let (Some(item), Some(id)) = (current.as_mut(), attr_value(&element, b"id")) {
                        item.guids.push(id);
                    }
                }
            }
            Ok(Event::End(element)) => {
                let name = element.name();
                let closes_entry = matches!(name.as_ref(), b"Video" | b"Directory" | b"Metadata");
                if closes_entry {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!(error = %e, "Failed to parse Plex response");
                break;
            }
            _ => {}
        }
    }

    items
}

/// GUID signatures a library entry may carry for this candidate.
#[must_use]
pub fn guid_signatures(kind: MediaKind, candidate: &Candidate) -> Vec<String> {
    let ids = &candidate.ids;
    let mut signatures = Vec::new();
    if let Some(tmdb) = ids.tmdb_id.filter(|id| *id > 0) {
        signatures.push(format!("tmdb://{tmdb}"));
    }
    match kind {
        MediaKind::Movie => {
            if let Some(imdb) = ids.imdb_id.as_deref().filter(|id| !id.is_empty()) {
                let imdb = imdb.strip_prefix("imdb://").unwrap_or(imdb);
                signatures.push(format!("imdb://{imdb}"));
            }
        }
        MediaKind::Series => {
            if let Some(tvdb) = ids.tvdb_id.filter(|id| *id > 0) {
                signatures.push(format!("tvdb://{tvdb}"));
            }
        }
    }
    signatures
}

/// Media library client (Plex XML API).
#[derive(Debug, Clone)]
pub struct PlexClient {
    client: Client,
    base_url: String,
    token: String,
    movies_section_id: Option<u32>,
    shows_section_id: Option<u32>,
}

impl PlexClient {
    #[must_use]
    pub fn new(
        client: Client,
        base_url: &str,
        token: &str,
        movies_section_id: Option<u32>,
        shows_section_id: Option<u32>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            movies_section_id,
            shows_section_id,
        }
    }

    fn search_url(&self, kind: MediaKind, query: &str) -> Result<Url> {
        let (section, type_code) = match kind {
            MediaKind::Movie => (self.movies_section_id, "1"),
            MediaKind::Series => (self.shows_section_id, "2"),
        };

        let mut url = match section {
            Some(id) => Url::parse(&format!("{}/library/sections/{id}/all", self.base_url))?,
            None => Url::parse(&format!("{}/search", self.base_url))?,
        };

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("X-Plex-Token", &self.token);
            if section.is_some() {
                pairs.append_pair("type", type_code);
            }
            pairs.append_pair("query", query);
        }
        Ok(url)
    }

    pub async fn search(&self, kind: MediaKind, query: &str) -> Result<Vec<PlexItem>> {
        let url = self.search_url(kind, query)?;
        let response = self
            .client
            .get(url)
            .header("Accept", "application/xml")
            .send()
            .await
            .context("Failed to connect to Plex")?
            .error_for_status()?;
        let body = response.text().await?;
        Ok(parse_media_container(&body, kind))
    }

    pub async fn is_available(&self) -> bool {
        let Ok(mut url) = Url::parse(&format!("{}/identity", self.base_url)) else {
            return false;
        };
        url.query_pairs_mut().append_pair("X-Plex-Token", &self.token);
        self.client
            .get(url)
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }
}

#[async_trait::async_trait]
impl MediaLibrary for PlexClient {
    async fn exists(&self, kind: MediaKind, candidate: &Candidate) -> Result<bool> {
        let signatures = guid_signatures(kind, candidate);

        let query = if candidate.title.is_empty() {
            match signatures.first() {
                Some(sig) => sig.rsplit('/').next().unwrap_or_default().to_string(),
                None => return Ok(false),
            }
        } else {
            candidate.title.clone()
        };

        let items = self.search(kind, &query).await?;
        Ok(items
            .iter()
            .any(|item| item.matches(&signatures, &candidate.title, candidate.year)))
    }
}
