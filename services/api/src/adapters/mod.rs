pub mod db;
pub mod notifier;
pub mod seed;

pub use db::DbAdapter;
pub use notifier::TracingNotifier;
pub use seed::{load_seed_users, seed_in_memory};
