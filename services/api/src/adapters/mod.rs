pub mod classifier;
pub mod db;

pub use classifier::ModelApiAdapter;
pub use db::DbAdapter;
