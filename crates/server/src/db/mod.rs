pub mod pool;
pub mod progress;
pub mod users;
