//! In-process backends selected with the `memory` settings. Also what the
//! test suites run against.

mod clock_manual;
mod session_cache_memory;
mod user_repo_memory;

pub use clock_manual::*;
pub use session_cache_memory::*;
pub use user_repo_memory::*;
