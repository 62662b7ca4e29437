//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::client::RemoteSource;
use crate::api::types::{Category, Record, RecordDetails, StatEntry};
use crate::cache::{fold_name, CursorStore, RecordStore};
use crate::error::{NetworkError, StorageError};

const NAMES: [&str; 10] = [
  "bulbasaur",
  "ivysaur",
  "venusaur",
  "charmander",
  "charmeleon",
  "charizard",
  "squirtle",
  "wartortle",
  "blastoise",
  "caterpie",
];

pub fn name_for(id: u32) -> String {
  id.checked_sub(1)
    .and_then(|i| NAMES.get(i as usize))
    .map(|n| n.to_string())
    .unwrap_or_else(|| format!("record-{}", id))
}

pub fn source_url(id: u32) -> String {
  format!("https://pokeapi.test/api/v2/pokemon/{}/", id)
}

pub fn basic(id: u32) -> Record {
  Record::basic(id, name_for(id), source_url(id))
}

pub fn basic_records(ids: impl IntoIterator<Item = u32>) -> Vec<Record> {
  ids.into_iter().map(basic).collect()
}

pub fn detailed(id: u32) -> Record {
  let mut record = basic(id);
  record.details = Some(RecordDetails {
    categories: vec![Category::Grass, Category::Poison],
    height: id * 3,
    weight: id * 40,
    abilities: vec!["overgrow".to_string(), "chlorophyll".to_string()],
    stats: vec![
      StatEntry {
        name: "hp".to_string(),
        base_value: 40 + id,
        effort_value: 0,
      },
      StatEntry {
        name: "speed".to_string(),
        base_value: 45,
        effort_value: 1,
      },
    ],
    audio_url: Some(format!("https://cries.test/{}.ogg", id)),
  });
  record
}

pub fn detailed_records(ids: impl IntoIterator<Item = u32>) -> Vec<Record> {
  ids.into_iter().map(detailed).collect()
}

type PageHook = Box<dyn Fn() + Send + Sync>;

/// In-memory remote collection with injectable failures and delays.
#[derive(Default)]
pub struct FakeRemote {
  ids: Mutex<Vec<u32>>,
  fixed_page: Mutex<Option<Vec<Record>>>,
  page_failure: Mutex<Option<NetworkError>>,
  detail_failures: Mutex<HashMap<u32, NetworkError>>,
  delays: Mutex<HashMap<u32, Duration>>,
  page_hook: Mutex<Option<PageHook>>,
  pages: Mutex<Vec<(u32, u32)>>,
  detail_calls: AtomicUsize,
}

impl FakeRemote {
  pub fn with_ids(ids: impl IntoIterator<Item = u32>) -> Self {
    let fake = Self::default();
    *fake.ids.lock().unwrap() = ids.into_iter().collect();
    fake
  }

  /// Serve this page for every `fetch_page` call, regardless of offset.
  pub fn set_page(&self, page: Vec<Record>) {
    *self.fixed_page.lock().unwrap() = Some(page);
  }

  pub fn fail_page(&self, err: NetworkError) {
    *self.page_failure.lock().unwrap() = Some(err);
  }

  pub fn fail_detail(&self, id: u32, err: NetworkError) {
    self.detail_failures.lock().unwrap().insert(id, err);
  }

  pub fn set_delay(&self, id: u32, delay: Duration) {
    self.delays.lock().unwrap().insert(id, delay);
  }

  /// Run `hook` while a page fetch is in flight.
  pub fn on_fetch_page(&self, hook: impl Fn() + Send + Sync + 'static) {
    *self.page_hook.lock().unwrap() = Some(Box::new(hook));
  }

  pub fn page_calls(&self) -> usize {
    self.pages.lock().unwrap().len()
  }

  pub fn last_page_request(&self) -> Option<(u32, u32)> {
    self.pages.lock().unwrap().last().copied()
  }

  pub fn detail_calls(&self) -> usize {
    self.detail_calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl RemoteSource for FakeRemote {
  async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Vec<Record>, NetworkError> {
    self.pages.lock().unwrap().push((offset, limit));

    if let Some(hook) = self.page_hook.lock().unwrap().as_ref() {
      hook();
    }
    if let Some(err) = self.page_failure.lock().unwrap().clone() {
      return Err(err);
    }
    if let Some(page) = self.fixed_page.lock().unwrap().clone() {
      return Ok(page);
    }

    let ids = self.ids.lock().unwrap().clone();
    Ok(
      ids
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .map(basic)
        .collect(),
    )
  }

  async fn fetch_detail(&self, id: u32) -> Result<Record, NetworkError> {
    self.detail_calls.fetch_add(1, Ordering::SeqCst);

    let delay = self.delays.lock().unwrap().get(&id).copied();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }

    let failure = self.detail_failures.lock().unwrap().get(&id).cloned();
    if let Some(err) = failure {
      return Err(err);
    }

    Ok(detailed(id))
  }
}

/// Ids of a record slice, for compact assertions.
pub fn ids(records: &[Record]) -> Vec<u32> {
  records.iter().map(|r| r.id).collect()
}

/// Records keyed by id, for set-style assertions.
pub fn by_id(records: &[Record]) -> BTreeMap<u32, Record> {
  records.iter().map(|r| (r.id, r.clone())).collect()
}

/// In-memory record and cursor store with injectable failures.
pub struct MemoryStore {
  records: Mutex<BTreeMap<u32, Record>>,
  cursor: Mutex<Option<u32>>,
  initial: u32,
  save_failure: Mutex<Option<StorageError>>,
  cursor_failure: Mutex<Option<StorageError>>,
  fetch_all_calls: AtomicUsize,
  save_calls: AtomicUsize,
}

impl MemoryStore {
  pub fn new(initial: u32) -> Self {
    Self {
      records: Mutex::new(BTreeMap::new()),
      cursor: Mutex::new(None),
      initial,
      save_failure: Mutex::new(None),
      cursor_failure: Mutex::new(None),
      fetch_all_calls: AtomicUsize::new(0),
      save_calls: AtomicUsize::new(0),
    }
  }

  pub fn with_records(initial: u32, records: Vec<Record>) -> Self {
    let store = Self::new(initial);
    *store.records.lock().unwrap() = records.into_iter().map(|r| (r.id, r)).collect();
    store
  }

  pub fn fail_saves(&self, err: StorageError) {
    *self.save_failure.lock().unwrap() = Some(err);
  }

  pub fn fail_cursor_writes(&self, err: StorageError) {
    *self.cursor_failure.lock().unwrap() = Some(err);
  }

  /// Stored cursor without falling back to the initial value.
  pub fn raw_cursor(&self) -> Option<u32> {
    *self.cursor.lock().unwrap()
  }

  pub fn snapshot(&self) -> Vec<Record> {
    self.records.lock().unwrap().values().cloned().collect()
  }

  pub fn fetch_all_calls(&self) -> usize {
    self.fetch_all_calls.load(Ordering::SeqCst)
  }

  pub fn save_calls(&self) -> usize {
    self.save_calls.load(Ordering::SeqCst)
  }
}

fn matches(record: &Record, query: &str) -> bool {
  if query.parse::<u32>().ok() == Some(record.id) {
    return true;
  }
  fold_name(&record.name).contains(&fold_name(query))
}

impl RecordStore for MemoryStore {
  fn replace_all(&self, records: &[Record]) -> Result<(), StorageError> {
    self.save_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(err) = self.save_failure.lock().unwrap().clone() {
      return Err(err);
    }
    *self.records.lock().unwrap() = records.iter().map(|r| (r.id, r.clone())).collect();
    Ok(())
  }

  fn fetch_all(&self) -> Result<Vec<Record>, StorageError> {
    self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.snapshot())
  }

  fn fetch_one(&self, id: u32) -> Result<Option<Record>, StorageError> {
    Ok(self.records.lock().unwrap().get(&id).cloned())
  }

  fn search(&self, query: &str) -> Result<Vec<Record>, StorageError> {
    let query = query.trim();
    if query.is_empty() {
      return self.fetch_all();
    }
    Ok(
      self
        .snapshot()
        .into_iter()
        .filter(|r| matches(r, query))
        .collect(),
    )
  }

  fn delete_all(&self) -> Result<(), StorageError> {
    self.records.lock().unwrap().clear();
    Ok(())
  }

  fn count(&self) -> Result<usize, StorageError> {
    Ok(self.records.lock().unwrap().len())
  }
}

impl CursorStore for MemoryStore {
  fn get(&self) -> Result<u32, StorageError> {
    Ok(self.cursor.lock().unwrap().unwrap_or(self.initial))
  }

  fn set(&self, offset: u32) -> Result<(), StorageError> {
    if let Some(err) = self.cursor_failure.lock().unwrap().clone() {
      return Err(err);
    }
    *self.cursor.lock().unwrap() = Some(offset);
    Ok(())
  }

  fn initial(&self) -> u32 {
    self.initial
  }
}
