pub mod credential;
pub mod session;
pub mod user;
pub mod verification;

pub use credential::PostgresCredentialRepository;
pub use session::PostgresSessionRepository;
pub use user::PostgresUserRepository;
pub use verification::PostgresVerificationRepository;
