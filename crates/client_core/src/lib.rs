//! Client side of a voice ordering session: listens to the room, turns agent
//! events into view state, and builds the view models the screens render.

pub mod connection;
pub mod dispatcher;
pub mod receipt;
pub mod session;
pub mod transcript;
pub mod views;

pub use connection::fetch_connection_details;
pub use dispatcher::{AgentEventDispatcher, DispatchOutcome, OrderNotifier, SessionState};
pub use receipt::{OrderReceipt, ReceiptView};
pub use session::{ListenerGuard, SessionError, SessionUpdate, SessionView};
pub use transcript::{ChatMessage, ChatOrigin, ChatTranscript};
pub use views::{ControlBarControls, SessionChrome, WelcomeView};
