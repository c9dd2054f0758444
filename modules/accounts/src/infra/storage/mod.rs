pub mod entity;
pub mod schema;
pub mod sql_repo;

pub use schema::bootstrap_schema;
pub use sql_repo::SqlAccountsRepository;
