pub mod error;
pub mod extract;
pub mod router;
pub mod session;

pub use error::{AgentError, Result};
pub use extract::extract_turn;
pub use router::{AgentRouter, RouterOutcome};
pub use session::{AgentSession, SessionStore, TURN_HISTORY_LIMIT};
