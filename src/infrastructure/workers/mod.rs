pub mod health_poller;
