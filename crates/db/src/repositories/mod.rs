//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod profile_repo;
pub mod ticket_repo;
pub mod ticket_store;
pub mod user_repo;

pub use profile_repo::ProfileRepo;
pub use ticket_repo::TicketRepo;
pub use ticket_store::PgTicketStore;
pub use user_repo::UserRepo;
