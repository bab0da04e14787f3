pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod pagination;
pub mod query;
pub mod session;
pub mod source;
pub mod users;

pub use config::DeskConfig;
pub use controller::{ControllerEvent, ControllerState, FetchOutcome, ListController, ListStatus};
pub use debounce::{DebounceState, Debouncer};
pub use error::{ControlError, DeskError, FetchError};
pub use pagination::{page_window, total_pages_for, ItemRange, ListResponse, ListResult, PageBody, PageLink};
pub use query::{ListQuery, ListSettings, ALL_FILTER};
pub use session::{FileSession, MemorySession, SessionContext, SessionUser, StoredSession};
pub use source::{ListSource, MutationKind};
pub use users::{AccountStatus, MutationReceipt, NewUser, Role, UserRecord, UserStats, UserUpdate};
