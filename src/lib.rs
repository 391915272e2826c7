// Library for tests to access modules

pub mod config;
pub mod db;
pub mod growth_worker;
pub mod models;
pub mod ping;
pub mod placeholder;
pub mod poller;
pub mod routes;
pub mod server_repo;
pub mod stats_repo;
pub mod version;
