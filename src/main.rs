use std::sync::Arc;

use payment_relay::infrastructure::config::settings::Settings;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
	let settings = Arc::new(Settings::load()?);
	payment_relay::run(settings).await
}
