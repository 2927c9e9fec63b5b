//! Client-side session core for the question-answering service: the session
//! state store, the backend seam, and the interaction controller that ties
//! them together.

pub mod backend;
pub mod controller;
pub mod error;
pub mod state;

pub use backend::{AnswerBackend, HttpBackend, DEFAULT_BACKEND_URL};
pub use controller::{
    AddSourceOutcome, AskMode, AskOutcome, InteractionController, PendingAsk, SessionEvent,
};
pub use error::{BackendError, Refusal};
pub use state::SessionState;
