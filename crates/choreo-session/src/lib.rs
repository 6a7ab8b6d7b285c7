//! # Choreo-Session
//!
//! Orchestrates one dance attempt: the start/countdown/play/end state
//! machine, the once-a-second feedback poller and its log, and the mounted
//! [`DanceSession`] that ties both to the overlay loop.
//!
//! ```text
//! Idle --start--> CountingDown(3) -> (2) -> (1) -> (GO) -> Playing --end--> Ended
//!                       ^                                     |              |
//!                       +----------------- start (restart) ---+--------------+
//! ```

pub mod clock;
pub mod config;
pub mod log;
pub mod machine;
pub mod poller;
pub mod state;
pub mod view;

pub use clock::SessionClock;
pub use config::SessionConfig;
pub use log::FeedbackLog;
pub use machine::SessionMachine;
pub use poller::{FeedbackDisplay, FeedbackPoller};
pub use state::{CountdownStep, SessionEvent, SessionState};
pub use view::{DanceProps, DanceSession, KeypointStatus, SessionCallbacks};
