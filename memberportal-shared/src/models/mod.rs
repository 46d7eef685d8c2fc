/// Portal data model
///
/// Plain value records for the five stored entities plus the shared approval
/// and role types. Persistence lives in [`crate::storage`].
///
/// # Models
///
/// - `role`: permission tiers (admin, moderator, member)
/// - `user`: accounts and their public projection
/// - `task`: assigned units of work
/// - `warning`: disciplinary notes
/// - `ban`: suspensions and read-time activity rules
/// - `support_ticket`: member support requests
/// - `approval`: moderator sign-off shared by tasks, warnings and bans

pub mod approval;
pub mod ban;
pub mod role;
pub mod support_ticket;
pub mod task;
pub mod user;
pub mod warning;

pub use approval::Approval;
pub use ban::{Ban, BanStatus, BanView, NewBan};
pub use role::Role;
pub use support_ticket::{NewSupportTicket, SupportTicket, TicketStatus, UpdateSupportTicket};
pub use task::{NewTask, Task};
pub use user::{NewUser, Preferences, PublicUser, UpdateUser, User};
pub use warning::{NewWarning, Warning};
