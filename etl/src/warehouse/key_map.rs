use std::collections::HashMap;

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::EtlResult;
use crate::warehouse::TargetTable;

/// Natural key to surrogate key mapping of a dimension, as of the time it was loaded.
///
/// Reflects a snapshot: reload it after any upsert that may have inserted natural keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMap {
    keys: HashMap<i64, i64>,
}

impl KeyMap {
    /// Reads every `(natural key, surrogate key)` pair currently stored in `T`.
    pub async fn load<T>(conn: &mut SqliteConnection) -> EtlResult<Self>
    where
        T: TargetTable,
    {
        let query = format!(
            "select {}, {} from {}",
            T::NATURAL_KEY,
            T::SURROGATE_KEY,
            T::NAME
        );

        let pairs: Vec<(i64, i64)> = sqlx::query_as(&query).fetch_all(&mut *conn).await?;

        let key_map: KeyMap = pairs.into_iter().collect();
        debug!(table = T::NAME, keys = key_map.len(), "loaded key map");

        Ok(key_map)
    }

    /// Returns the surrogate key assigned to `natural_key`, if any.
    pub fn resolve(&self, natural_key: i64) -> Option<i64> {
        self.keys.get(&natural_key).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<(i64, i64)> for KeyMap {
    fn from_iter<I: IntoIterator<Item = (i64, i64)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
