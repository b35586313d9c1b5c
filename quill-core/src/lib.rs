pub mod error;
pub mod filesystem;
pub mod host;
pub mod locks;
pub mod util;

pub use error::FsError;
pub use filesystem::{FileSystem, LocalFileSystem};
pub use host::{ProcessRegistry, TitleService};
pub use locks::{LockRegistry, NameLockRegistry};
