pub mod pool;
pub mod lock;
pub mod whale;

pub use pool::Pool;
pub use lock::Lock;
pub use whale::{WhaleClubMessage, WhaleClubUser};
