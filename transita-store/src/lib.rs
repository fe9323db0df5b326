pub mod app_config;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
pub mod events;
pub mod ledger_repo;
pub mod redis_repo;

pub use booking_repo::BookingRepository;
pub use catalog_repo::CatalogRepository;
pub use database::DbClient;
pub use events::EventProducer;
pub use ledger_repo::LedgerRepository;
pub use redis_repo::RedisClient;
