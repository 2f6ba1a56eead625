//! In-memory key/value cache shared by domain, result, and provider resolution.
//!
//! Entries are bounded by an LRU capacity and optionally age out after a TTL. A lookup never
//! fails: an expired entry is dropped and reported as a miss.

use std::{
	num::NonZeroUsize,
	sync::atomic::{AtomicU64, Ordering},
	time::{Duration, Instant},
};

use lru::LruCache;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CacheStats {
	pub size: usize,
	pub hits: u64,
	pub misses: u64,
	pub hit_rate: f64,
	pub avg_lookup_micros: f64,
}

struct CacheEntry<V> {
	value: V,
	inserted_at: Instant,
	ttl: Option<Duration>,
}
impl<V> CacheEntry<V> {
	fn is_expired(&self, now: Instant) -> bool {
		self.ttl.is_some_and(|ttl| now.saturating_duration_since(self.inserted_at) >= ttl)
	}
}

pub struct ResolutionCache<V> {
	entries: Mutex<LruCache<String, CacheEntry<V>>>,
	ttl: Option<Duration>,
	hits: AtomicU64,
	misses: AtomicU64,
	lookup_nanos: AtomicU64,
}
impl<V> ResolutionCache<V>
where
	V: Clone,
{
	pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

		Self {
			entries: Mutex::new(LruCache::new(capacity)),
			ttl,
			hits: AtomicU64::new(0),
			misses: AtomicU64::new(0),
			lookup_nanos: AtomicU64::new(0),
		}
	}

	/// A zero `ttl_seconds` keeps entries until they are evicted.
	pub fn with_ttl_seconds(capacity: usize, ttl_seconds: u64) -> Self {
		let ttl = (ttl_seconds > 0).then(|| Duration::from_secs(ttl_seconds));

		Self::new(capacity, ttl)
	}

	pub fn get(&self, key: &str) -> Option<V> {
		let started = Instant::now();
		let value = self.lookup(key, true);
		let elapsed = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);

		self.lookup_nanos.fetch_add(elapsed, Ordering::Relaxed);

		if value.is_some() {
			self.hits.fetch_add(1, Ordering::Relaxed);
		} else {
			self.misses.fetch_add(1, Ordering::Relaxed);
		}

		value
	}

	/// Like [`ResolutionCache::get`] but leaves the statistics and recency order untouched.
	pub fn peek(&self, key: &str) -> Option<V> {
		self.lookup(key, false)
	}

	pub fn set(&self, key: impl Into<String>, value: V) {
		self.insert(key.into(), value, self.ttl);
	}

	pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
		self.insert(key.into(), value, Some(ttl));
	}

	pub fn invalidate(&self, key: &str) -> bool {
		self.entries.lock().pop(key).is_some()
	}

	pub fn clear(&self) {
		self.entries.lock().clear();
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn stats(&self) -> CacheStats {
		let hits = self.hits.load(Ordering::Relaxed);
		let misses = self.misses.load(Ordering::Relaxed);
		let lookups = hits + misses;
		let (hit_rate, avg_lookup_micros) = if lookups == 0 {
			(0.0, 0.0)
		} else {
			let nanos = self.lookup_nanos.load(Ordering::Relaxed) as f64;

			(hits as f64 / lookups as f64, nanos / lookups as f64 / 1_000.0)
		};

		CacheStats { size: self.len(), hits, misses, hit_rate, avg_lookup_micros }
	}

	fn lookup(&self, key: &str, promote: bool) -> Option<V> {
		let now = Instant::now();
		let mut entries = self.entries.lock();
		let found = if promote { entries.get(key) } else { entries.peek(key) };
		let outcome = found.map(|entry| (entry.is_expired(now), entry.value.clone()));

		match outcome {
			Some((false, value)) => Some(value),
			Some((true, _)) => {
				entries.pop(key);

				None
			},
			None => None,
		}
	}

	fn insert(&self, key: String, value: V, ttl: Option<Duration>) {
		let entry = CacheEntry { value, inserted_at: Instant::now(), ttl };

		self.entries.lock().put(key, entry);
	}
}
