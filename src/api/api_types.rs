//! Serde-deserializable types matching the remote API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;

use crate::error::NetworkError;

use super::types::{Category, Record, RecordDetails, StatEntry};

// ============================================================================
// List endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiListResponse {
  #[serde(default)]
  pub count: u64,
  pub next: Option<String>,
  #[serde(default)]
  pub results: Vec<ApiNamedResource>,
}

#[derive(Debug, Deserialize)]
pub struct ApiNamedResource {
  pub name: String,
  pub url: String,
}

impl ApiNamedResource {
  /// The id is the trailing path segment of the resource URL
  /// (`.../pokemon/25/` -> 25).
  pub fn id(&self) -> Option<u32> {
    self
      .url
      .trim_end_matches('/')
      .rsplit('/')
      .next()
      .and_then(|segment| segment.parse::<u32>().ok())
      .filter(|id| *id > 0)
  }

  pub fn into_basic(self) -> Result<Record, NetworkError> {
    let id = self.id().ok_or_else(|| {
      NetworkError::Decode(format!("no numeric id in resource url '{}'", self.url))
    })?;
    Ok(Record::basic(id, self.name, self.url))
  }
}

impl ApiListResponse {
  pub fn into_basic_records(self) -> Result<Vec<Record>, NetworkError> {
    self
      .results
      .into_iter()
      .map(ApiNamedResource::into_basic)
      .collect()
  }
}

// ============================================================================
// Detail endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiDetailResponse {
  pub id: u32,
  pub name: String,
  pub height: u32,
  pub weight: u32,
  #[serde(default)]
  pub types: Vec<ApiTypeSlot>,
  #[serde(default)]
  pub abilities: Vec<ApiAbilitySlot>,
  #[serde(default)]
  pub stats: Vec<ApiStatSlot>,
  pub cries: Option<ApiCries>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTypeSlot {
  pub slot: u32,
  #[serde(rename = "type")]
  pub kind: ApiNamedResource,
}

#[derive(Debug, Deserialize)]
pub struct ApiAbilitySlot {
  pub ability: ApiNamedResource,
  pub slot: u32,
}

#[derive(Debug, Deserialize)]
pub struct ApiStatSlot {
  pub base_stat: u32,
  pub effort: u32,
  pub stat: ApiNamedResource,
}

#[derive(Debug, Deserialize)]
pub struct ApiCries {
  pub latest: Option<String>,
  pub legacy: Option<String>,
}

impl ApiDetailResponse {
  /// Convert into a detailed record. `source_url` is the canonical detail URL.
  pub fn into_record(self, source_url: String) -> Record {
    let mut types = self.types;
    types.sort_by_key(|t| t.slot);
    let categories = types
      .iter()
      .filter_map(|t| Category::parse(&t.kind.name))
      .collect();

    let mut abilities = self.abilities;
    abilities.sort_by_key(|a| a.slot);

    let stats = self
      .stats
      .into_iter()
      .map(|s| StatEntry {
        name: s.stat.name,
        base_value: s.base_stat,
        effort_value: s.effort,
      })
      .collect();

    let audio_url = self.cries.and_then(|c| c.latest.or(c.legacy));

    Record {
      id: self.id,
      name: self.name,
      source_url,
      details: Some(RecordDetails {
        categories,
        height: self.height,
        weight: self.weight,
        abilities: abilities.into_iter().map(|a| a.ability.name).collect(),
        stats,
        audio_url,
      }),
    }
  }
}
