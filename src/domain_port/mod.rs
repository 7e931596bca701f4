// store

mod session_cache;

pub use session_cache::*;

// repo

mod user_repo;

pub use user_repo::*;
