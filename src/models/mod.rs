pub mod session;
pub mod user;
pub mod verification;

pub use session::Session;
pub use user::User;
pub use verification::{ChallengePurpose, Verification};
