use serde::{Deserialize, Serialize};

/// Base URL for official artwork sprites, keyed by record id.
const SPRITE_BASE_URL: &str =
  "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork/";

/// A cached record. `details` is `None` for basic records decoded from a list page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  pub id: u32,
  pub name: String,
  pub source_url: String,
  pub details: Option<RecordDetails>,
}

/// Detail payload fetched from the per-item endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDetails {
  pub categories: Vec<Category>,
  /// Tenths of a metre
  pub height: u32,
  /// Tenths of a kilogram
  pub weight: u32,
  pub abilities: Vec<String>,
  pub stats: Vec<StatEntry>,
  pub audio_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
  pub name: String,
  pub base_value: u32,
  pub effort_value: u32,
}

impl Record {
  pub fn basic(id: u32, name: impl Into<String>, source_url: impl Into<String>) -> Self {
    Self {
      id,
      name: name.into(),
      source_url: source_url.into(),
      details: None,
    }
  }

  pub fn is_detailed(&self) -> bool {
    self.details.is_some()
  }

  /// Name with the first letter uppercased.
  pub fn display_name(&self) -> String {
    capitalize(&self.name)
  }

  pub fn image_url(&self) -> String {
    format!("{}{}.png", SPRITE_BASE_URL, self.id)
  }

  /// Sum of base stat values, 0 for basic records.
  pub fn total_stats(&self) -> u32 {
    self
      .details
      .as_ref()
      .map(|d| d.stats.iter().map(|s| s.base_value).sum())
      .unwrap_or(0)
  }
}

impl StatEntry {
  pub fn display_name(&self) -> String {
    match self.name.as_str() {
      "hp" => "HP".to_string(),
      "attack" => "Attack".to_string(),
      "defense" => "Defense".to_string(),
      "special-attack" => "Sp. Atk".to_string(),
      "special-defense" => "Sp. Def".to_string(),
      "speed" => "Speed".to_string(),
      other => capitalize(other),
    }
  }
}

/// Elemental category of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Normal,
  Fire,
  Water,
  Electric,
  Grass,
  Ice,
  Fighting,
  Poison,
  Ground,
  Flying,
  Psychic,
  Bug,
  Rock,
  Ghost,
  Dragon,
  Dark,
  Steel,
  Fairy,
}

impl Category {
  pub const ALL: [Category; 18] = [
    Category::Normal,
    Category::Fire,
    Category::Water,
    Category::Electric,
    Category::Grass,
    Category::Ice,
    Category::Fighting,
    Category::Poison,
    Category::Ground,
    Category::Flying,
    Category::Psychic,
    Category::Bug,
    Category::Rock,
    Category::Ghost,
    Category::Dragon,
    Category::Dark,
    Category::Steel,
    Category::Fairy,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Category::Normal => "normal",
      Category::Fire => "fire",
      Category::Water => "water",
      Category::Electric => "electric",
      Category::Grass => "grass",
      Category::Ice => "ice",
      Category::Fighting => "fighting",
      Category::Poison => "poison",
      Category::Ground => "ground",
      Category::Flying => "flying",
      Category::Psychic => "psychic",
      Category::Bug => "bug",
      Category::Rock => "rock",
      Category::Ghost => "ghost",
      Category::Dragon => "dragon",
      Category::Dark => "dark",
      Category::Steel => "steel",
      Category::Fairy => "fairy",
    }
  }

  /// Parse an API category name. Unknown names (e.g. "stellar") yield `None`.
  pub fn parse(name: &str) -> Option<Self> {
    Self::ALL.iter().copied().find(|c| c.as_str() == name)
  }
}

fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}
