use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::warn;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use crate::domain::cache::CacheStore;

struct Entry<T> {
	value:      T,
	expires_at: Instant,
}

impl<T> Entry<T> {
	fn new(value: T, ttl: Duration) -> Self {
		Self {
			value,
			expires_at: Instant::now() + ttl,
		}
	}

	fn live(&self) -> Option<&T> {
		(Instant::now() < self.expires_at).then_some(&self.value)
	}
}

fn key_matches(pattern: &str, key: &str) -> bool {
	match pattern.strip_suffix('*') {
		Some(prefix) => key.starts_with(prefix),
		None => key == pattern,
	}
}

/// Per-replica stand-in used whenever Redis is unreachable. Lossy across
/// replicas and across restarts.
#[derive(Default)]
struct MemoryStore {
	values: RwLock<HashMap<String, Entry<String>>>,
	hashes: RwLock<HashMap<String, Entry<HashMap<String, String>>>>,
	lists:  RwLock<HashMap<String, Entry<VecDeque<String>>>>,
}

impl MemoryStore {
	fn get(&self, key: &str) -> Option<String> {
		self.values
			.read()
			.unwrap()
			.get(key)
			.and_then(Entry::live)
			.cloned()
	}

	fn set(&self, key: &str, value: &str, ttl: Duration) {
		self.values
			.write()
			.unwrap()
			.insert(key.to_string(), Entry::new(value.to_string(), ttl));
	}

	fn del(&self, key: &str) {
		self.values.write().unwrap().remove(key);
		self.hashes.write().unwrap().remove(key);
		self.lists.write().unwrap().remove(key);
	}

	fn del_matching(&self, pattern: &str) {
		self.values
			.write()
			.unwrap()
			.retain(|key, _| !key_matches(pattern, key));
		self.hashes
			.write()
			.unwrap()
			.retain(|key, _| !key_matches(pattern, key));
		self.lists
			.write()
			.unwrap()
			.retain(|key, _| !key_matches(pattern, key));
	}

	fn hget(&self, key: &str, field: &str) -> Option<String> {
		self.hashes
			.read()
			.unwrap()
			.get(key)
			.and_then(Entry::live)
			.and_then(|hash| hash.get(field))
			.cloned()
	}

	fn hset(&self, key: &str, field: &str, value: &str, ttl: Duration) {
		let mut hashes = self.hashes.write().unwrap();
		let mut hash = match hashes.remove(key) {
			Some(entry) if entry.live().is_some() => entry.value,
			_ => HashMap::new(),
		};
		hash.insert(field.to_string(), value.to_string());
		hashes.insert(key.to_string(), Entry::new(hash, ttl));
	}

	fn lpush_capped(
		&self,
		key: &str,
		value: &str,
		cap: usize,
		ttl: Duration,
	) {
		let mut lists = self.lists.write().unwrap();
		let mut list = match lists.remove(key) {
			Some(entry) if entry.live().is_some() => entry.value,
			_ => VecDeque::new(),
		};
		list.push_front(value.to_string());
		list.truncate(cap);
		lists.insert(key.to_string(), Entry::new(list, ttl));
	}

	fn lrange(&self, key: &str, limit: usize) -> Vec<String> {
		self.lists
			.read()
			.unwrap()
			.get(key)
			.and_then(Entry::live)
			.map(|list| list.iter().take(limit).cloned().collect())
			.unwrap_or_default()
	}
}

/// Cache adapter over Redis. Every operation degrades to the per-replica
/// [`MemoryStore`] when Redis cannot be reached, logging a warning; the
/// caller never sees a cache failure.
#[derive(Clone)]
pub struct RedisCache {
	client: redis::Client,
	memory: Arc<MemoryStore>,
}

impl RedisCache {
	pub fn new(redis_url: &str) -> Result<Self, redis::RedisError> {
		Ok(Self {
			client: redis::Client::open(redis_url)?,
			memory: Arc::new(MemoryStore::default()),
		})
	}

	async fn connection(&self) -> Option<MultiplexedConnection> {
		match self.client.get_multiplexed_async_connection().await {
			Ok(con) => Some(con),
			Err(e) => {
				warn!(
					"Cache unreachable, degrading to in-memory fallback: {e}"
				);
				None
			}
		}
	}
}

#[async_trait]
impl CacheStore for RedisCache {
	async fn get(&self, key: &str) -> Option<String> {
		if let Some(mut con) = self.connection().await {
			match con.get::<_, Option<String>>(key).await {
				Ok(value) => return value,
				Err(e) => warn!("Cache GET {key} failed: {e}"),
			}
		}
		self.memory.get(key)
	}

	async fn set(&self, key: &str, value: &str, ttl: Duration) {
		if let Some(mut con) = self.connection().await {
			match con
				.set_ex::<_, _, ()>(key, value, ttl.as_secs())
				.await
			{
				Ok(()) => return,
				Err(e) => warn!("Cache SET {key} failed: {e}"),
			}
		}
		self.memory.set(key, value, ttl);
	}

	async fn del(&self, key: &str) {
		if let Some(mut con) = self.connection().await
			&& let Err(e) = con.del::<_, ()>(key).await
		{
			warn!("Cache DEL {key} failed: {e}");
		}
		self.memory.del(key);
	}

	async fn del_matching(&self, pattern: &str) {
		if let Some(mut con) = self.connection().await {
			match con.keys::<_, Vec<String>>(pattern).await {
				Ok(keys) if !keys.is_empty() => {
					if let Err(e) = con.del::<_, ()>(keys).await {
						warn!("Cache purge of {pattern} failed: {e}");
					}
				}
				Ok(_) => {}
				Err(e) => warn!("Cache KEYS {pattern} failed: {e}"),
			}
		}
		self.memory.del_matching(pattern);
	}

	async fn hget(&self, key: &str, field: &str) -> Option<String> {
		if let Some(mut con) = self.connection().await {
			match con.hget::<_, _, Option<String>>(key, field).await {
				Ok(value) => return value,
				Err(e) => warn!("Cache HGET {key}.{field} failed: {e}"),
			}
		}
		self.memory.hget(key, field)
	}

	async fn hset(&self, key: &str, field: &str, value: &str, ttl: Duration) {
		if let Some(mut con) = self.connection().await {
			let result: Result<(), _> = redis::pipe()
				.hset(key, field, value)
				.ignore()
				.expire(key, ttl.as_secs() as i64)
				.ignore()
				.query_async(&mut con)
				.await;
			match result {
				Ok(()) => return,
				Err(e) => warn!("Cache HSET {key}.{field} failed: {e}"),
			}
		}
		self.memory.hset(key, field, value, ttl);
	}

	async fn lpush_capped(
		&self,
		key: &str,
		value: &str,
		cap: usize,
		ttl: Duration,
	) {
		if let Some(mut con) = self.connection().await {
			let result: Result<(), _> = redis::pipe()
				.lpush(key, value)
				.ignore()
				.ltrim(key, 0, cap as isize - 1)
				.ignore()
				.expire(key, ttl.as_secs() as i64)
				.ignore()
				.query_async(&mut con)
				.await;
			match result {
				Ok(()) => return,
				Err(e) => warn!("Cache LPUSH {key} failed: {e}"),
			}
		}
		self.memory.lpush_capped(key, value, cap, ttl);
	}

	async fn lrange(&self, key: &str, limit: usize) -> Vec<String> {
		if let Some(mut con) = self.connection().await {
			match con
				.lrange::<_, Vec<String>>(key, 0, limit as isize - 1)
				.await
			{
				Ok(values) => return values,
				Err(e) => warn!("Cache LRANGE {key} failed: {e}"),
			}
		}
		self.memory.lrange(key, limit)
	}
}
