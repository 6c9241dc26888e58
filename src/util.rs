use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::btree_map::{self, BTreeMap};

/// Ordered map whose reads fall back to a fixed default for missing keys.
///
/// Reading never inserts. Writes go through [`DefaultMap::entry_mut`], which seeds
/// absent keys with a clone of the default before handing out the slot, so every
/// accumulation can be written as `*map.entry_mut(key) += delta`.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultMap<K, V> {
    inner: BTreeMap<K, V>,
    default: V,
}

impl<K: Ord, V: Clone + Default> Default for DefaultMap<K, V> {
    fn default() -> Self {
        Self::with_default(V::default())
    }
}

impl<K: Ord, V: Clone + Default> DefaultMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Ord, V: Clone> DefaultMap<K, V> {
    pub fn with_default(default: V) -> Self {
        Self {
            inner: BTreeMap::new(),
            default,
        }
    }

    pub fn get<Q>(&self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_ref(key).clone()
    }

    pub fn get_ref<Q>(&self, key: &Q) -> &V
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.get(key).unwrap_or(&self.default)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.contains_key(key)
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.inner.insert(key, value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.get_mut(key)
    }

    pub fn entry_mut(&mut self, key: K) -> &mut V {
        let default = &self.default;
        self.inner.entry(key).or_insert_with(|| default.clone())
    }

    pub fn default_value(&self) -> &V {
        &self.default
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, K, V> {
        self.inner.iter()
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, K, V> {
        self.inner.iter_mut()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, K, V> {
        self.inner.keys()
    }

    pub fn values(&self) -> btree_map::Values<'_, K, V> {
        self.inner.values()
    }
}

impl<K: Ord> DefaultMap<K, u64> {
    /// Adds `delta` to the counter at `key` and returns the new value.
    pub fn add(&mut self, key: K, delta: u64) -> u64 {
        let slot = self.entry_mut(key);
        *slot += delta;
        *slot
    }

    pub fn increment(&mut self, key: K) -> u64 {
        self.add(key, 1)
    }
}

impl<'a, K, V> IntoIterator for &'a DefaultMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = btree_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<K: Serialize, V: Serialize> Serialize for DefaultMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}

/// Sentinel used for timestamps that could not be decoded.
pub fn epoch_zero() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

pub fn from_epoch(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(epoch_zero)
}

/// Decodes a signed epoch string; anything unparsable maps to [`epoch_zero`].
pub fn parse_epoch(input: &str) -> DateTime<Utc> {
    input
        .trim()
        .parse::<i64>()
        .map(from_epoch)
        .unwrap_or_else(|_| epoch_zero())
}

pub fn hour_of_day(timestamp: &DateTime<Utc>) -> u32 {
    timestamp.hour()
}

/// Monday is 0, Sunday is 6.
pub fn day_of_week(timestamp: &DateTime<Utc>) -> u32 {
    timestamp.weekday().num_days_from_monday()
}

pub fn week_key(timestamp: &DateTime<Utc>) -> String {
    let week = timestamp.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

pub fn month_key(timestamp: &DateTime<Utc>) -> String {
    format!("{}-{:02}", timestamp.year(), timestamp.month())
}

/// `numerator / denominator`, or 0.0 when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn percentage(part: f64, whole: f64) -> f64 {
    100.0 * ratio(part, whole)
}
