pub mod chrome;
pub mod scripted;
pub mod session;

pub use chrome::{ChromeSession, ChromeSessionFactory};
pub use scripted::{ScriptedFactory, ScriptedSession};
pub use session::{PageSession, SessionFactory};
