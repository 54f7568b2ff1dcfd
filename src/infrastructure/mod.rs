pub mod db;
pub mod rest_client;
pub mod seed;
pub mod sqlite_store;

pub use rest_client::RestBoardClient;
pub use sqlite_store::SqliteBoardStore;
