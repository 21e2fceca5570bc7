use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::model::{SearchHistoryEntry, WeatherSnapshot, local_now};

pub const WEATHER_HISTORY_FILE: &str = "weather_history.json";
pub const SEARCH_HISTORY_FILE: &str = "search_history.json";
pub const MAX_SEARCH_HISTORY: usize = 20;

/// Lowercased city -> snapshots, kept as raw JSON so unknown fields survive.
type WeatherHistory = BTreeMap<String, Vec<Value>>;

#[derive(Debug, Clone)]
pub struct LocalStore {
    history_file: PathBuf,
    search_file: PathBuf,
}

impl LocalStore {
    /// Open the store in `data_dir`, creating the directory and empty files as needed.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let store = Self {
            history_file: data_dir.join(WEATHER_HISTORY_FILE),
            search_file: data_dir.join(SEARCH_HISTORY_FILE),
        };

        if !store.history_file.exists() {
            write_json(&store.history_file, &WeatherHistory::new())?;
        }
        if !store.search_file.exists() {
            write_json(&store.search_file, &Vec::<SearchHistoryEntry>::new())?;
        }

        Ok(store)
    }

    /// Move `city` to the front of the recent searches.
    pub fn record_search(&self, city: &str) -> Result<()> {
        self.record_search_at(city, local_now())
    }

    fn record_search_at(&self, city: &str, now: NaiveDateTime) -> Result<()> {
        let mut searches = self.search_entries();
        let needle = city.to_lowercase();
        searches.retain(|s| s.city.to_lowercase() != needle);

        searches.insert(
            0,
            SearchHistoryEntry {
                city: city.to_string(),
                searched_at: now,
            },
        );
        searches.truncate(MAX_SEARCH_HISTORY);

        write_json(&self.search_file, &searches)
    }

    /// Recently searched cities, newest first.
    pub fn search_history(&self) -> Vec<String> {
        self.search_entries().into_iter().map(|s| s.city).collect()
    }

    /// Stored searches, newest first. Entries that no longer decode are skipped.
    pub fn search_entries(&self) -> Vec<SearchHistoryEntry> {
        let raw: Vec<Value> = read_json(&self.search_file);
        raw.into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!(error = %err, "dropping unreadable search history entry");
                    None
                }
            })
            .collect()
    }

    /// The history file with any city whose value is not a list dropped.
    fn read_history(&self) -> WeatherHistory {
        let raw: BTreeMap<String, Value> = read_json(&self.history_file);
        raw.into_iter()
            .filter_map(|(city, value)| match value {
                Value::Array(entries) => Some((city, entries)),
                _ => {
                    tracing::warn!(city = %city, "dropping unreadable weather history");
                    None
                }
            })
            .collect()
    }

    /// Append a snapshot for `city`, stamping it now if it has no timestamp,
    /// and drop that city's entries from before this week.
    pub fn save_weather_snapshot(&self, city: &str, snapshot: WeatherSnapshot) -> Result<()> {
        self.save_weather_snapshot_at(city, snapshot, local_now())
    }

    fn save_weather_snapshot_at(
        &self,
        city: &str,
        mut snapshot: WeatherSnapshot,
        now: NaiveDateTime,
    ) -> Result<()> {
        if snapshot.timestamp.is_none() {
            snapshot.timestamp = Some(now);
        }
        let value = serde_json::to_value(&snapshot).context("Failed to serialize weather snapshot")?;

        let mut history = self.read_history();
        let entries = history.entry(city.to_lowercase()).or_default();
        entries.push(value);
        retain_current_week(entries, now);

        write_json(&self.history_file, &history)
    }

    /// This week's snapshots for `city`, oldest first.
    pub fn weather_history(&self, city: &str) -> Vec<WeatherSnapshot> {
        self.weather_history_at(city, local_now())
    }

    fn weather_history_at(&self, city: &str, now: NaiveDateTime) -> Vec<WeatherSnapshot> {
        let mut history = self.read_history();
        let Some(mut entries) = history.remove(&city.to_lowercase()) else {
            return Vec::new();
        };
        retain_current_week(&mut entries, now);

        entries
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect()
    }

    /// Apply the week window to every tracked city.
    pub fn purge_old_data(&self) -> Result<()> {
        self.purge_old_data_at(local_now())
    }

    fn purge_old_data_at(&self, now: NaiveDateTime) -> Result<()> {
        let mut history = self.read_history();
        for entries in history.values_mut() {
            retain_current_week(entries, now);
        }
        write_json(&self.history_file, &history)
    }
}

/// Monday 00:00:00 of the week containing `now`.
pub fn start_of_week(now: NaiveDateTime) -> NaiveDateTime {
    let monday = now.date() - Duration::days(i64::from(now.weekday().num_days_from_monday()));
    monday.and_time(chrono::NaiveTime::default())
}

/// Keep entries stamped at or after the start of `now`'s week. Entries without
/// a readable `timestamp` are dropped.
fn retain_current_week(entries: &mut Vec<Value>, now: NaiveDateTime) {
    let cutoff = start_of_week(now);
    entries.retain(|entry| entry_timestamp(entry).is_some_and(|ts| ts >= cutoff));
}

fn entry_timestamp(entry: &Value) -> Option<NaiveDateTime> {
    entry.get("timestamp")?.as_str()?.parse().ok()
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "store file unreadable, using empty");
            return T::default();
        }
    };

    serde_json::from_str(&contents).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), error = %err, "store file corrupt, using empty");
        T::default()
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize store data")?;
    fs::write(path, json).with_context(|| format!("Failed to write store file: {}", path.display()))
}
