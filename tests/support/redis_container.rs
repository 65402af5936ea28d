use payment_relay::infrastructure::cache::redis_cache::RedisCache;
use testcontainers::GenericImage;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;

pub struct RedisTestContainer {
	pub cache:     RedisCache,
	pub url:       String,
	pub container: testcontainers::ContainerAsync<GenericImage>,
}

pub async fn setup_redis() -> RedisTestContainer {
	let container = GenericImage::new("redis", "8.0.3-alpine")
		.with_exposed_port(ContainerPort::Tcp(6379))
		.with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
		.start()
		.await
		.unwrap();

	let host_port = container.get_host_port_ipv4(6379).await.unwrap();
	let url = format!("redis://127.0.0.1:{host_port}/");
	let cache = RedisCache::new(&url).expect("Invalid Redis URL");

	RedisTestContainer {
		cache,
		url,
		container,
	}
}
