pub mod redis_cache;
