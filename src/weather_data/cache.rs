//! Process-wide cache of parsed workbooks.
//!
//! Every entry is a `tokio::sync::OnceCell` behind one map lock, so concurrent
//! first requests for the same key share a single load. A load that fails leaves
//! its cell empty and the next request tries again.

use crate::types::data_source::Variable;
use crate::types::normals::NormalsTable;
use crate::types::observation::RawObservationRow;
use crate::types::period::YearMonth;
use crate::types::register::{DailyRegister, MonthlyRegister};
use crate::types::station::StationDirectory;
use crate::weather_data::error::FetchError;
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Normal(Variable),
    Monthly(YearMonth),
    Daily(NaiveDate),
    Observations { station: String, period: YearMonth },
    Metadata,
}

/// Renders the key the way it is logged: `NORMAL_TMAX`, `MONTHLY_2024_3`,
/// `DAILY_2024-03-05`, `OBS_JULIACA_2024_3`, `METADATA`.
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Normal(variable) => write!(f, "NORMAL_{}", variable.code()),
            CacheKey::Monthly(period) => write!(f, "MONTHLY_{}_{}", period.year(), period.month()),
            CacheKey::Daily(date) => write!(f, "DAILY_{}", date.format("%Y-%m-%d")),
            CacheKey::Observations { station, period } => {
                write!(f, "OBS_{}_{}_{}", station, period.year(), period.month())
            }
            CacheKey::Metadata => write!(f, "METADATA"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CachedTable {
    Normals(Arc<NormalsTable>),
    Monthly(Arc<MonthlyRegister>),
    Daily(Arc<DailyRegister>),
    Observations(Arc<Vec<RawObservationRow>>),
    Metadata(Arc<StationDirectory>),
}

/// A value that can live in a [`DataCache`] entry.
pub trait CacheValue: Send + Sync + Sized + 'static {
    fn into_table(value: Arc<Self>) -> CachedTable;
    fn from_table(table: &CachedTable) -> Option<Arc<Self>>;
}

macro_rules! cache_value {
    ($ty:ty, $variant:ident) => {
        impl CacheValue for $ty {
            fn into_table(value: Arc<Self>) -> CachedTable {
                CachedTable::$variant(value)
            }

            fn from_table(table: &CachedTable) -> Option<Arc<Self>> {
                match table {
                    CachedTable::$variant(value) => Some(Arc::clone(value)),
                    _ => None,
                }
            }
        }
    };
}

cache_value!(NormalsTable, Normals);
cache_value!(MonthlyRegister, Monthly);
cache_value!(DailyRegister, Daily);
cache_value!(Vec<RawObservationRow>, Observations);
cache_value!(StationDirectory, Metadata);

#[derive(Default)]
pub struct DataCache {
    entries: Mutex<HashMap<CacheKey, Arc<OnceCell<CachedTable>>>>,
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn cell(&self, key: &CacheKey) -> Arc<OnceCell<CachedTable>> {
        let mut entries = self.entries.lock().await;
        match entries.entry(key.clone()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => Arc::clone(entry.insert(Arc::new(OnceCell::new()))),
        }
    }

    /// Returns the cached value for `key`, running `load` at most once across all
    /// concurrent callers when it is absent.
    pub async fn get_or_try_load<T, F, Fut>(&self, key: CacheKey, load: F) -> Result<Arc<T>, FetchError>
    where
        T: CacheValue,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let cell = self.cell(&key).await;
        let name = key.to_string();
        if cell.initialized() {
            debug!("Cache hit for {}", name);
        }
        let label = name.as_str();
        let table = cell
            .get_or_try_init(|| async move {
                info!("Cache miss for {}, loading", label);
                let value = load().await?;
                Ok::<_, FetchError>(T::into_table(Arc::new(value)))
            })
            .await?;
        T::from_table(table).ok_or(FetchError::CachedTypeMismatch(name))
    }

    /// Cached value for `key`, if loaded.
    pub async fn get<T: CacheValue>(&self, key: &CacheKey) -> Option<Arc<T>> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .and_then(|cell| cell.get())
            .and_then(T::from_table)
    }

    /// Stores a value unless the key already holds one. Returns whether it was stored.
    pub async fn insert<T: CacheValue>(&self, key: CacheKey, value: T) -> bool {
        let cell = self.cell(&key).await;
        let stored = cell.set(T::into_table(Arc::new(value))).is_ok();
        if stored {
            info!("Cached {}", key);
        }
        stored
    }

    pub async fn contains(&self, key: &CacheKey) -> bool {
        let entries = self.entries.lock().await;
        entries.get(key).is_some_and(|cell| cell.initialized())
    }

    /// Number of loaded entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}
