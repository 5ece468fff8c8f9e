pub mod session;
pub mod user;

pub use session::VisitorSession;
pub use user::CurrentUser;
