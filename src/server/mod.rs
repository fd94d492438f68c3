pub mod polling;
pub mod supervisor;

pub use polling::PollingService;
pub use supervisor::{RestartPolicy, Supervisor, SupervisorError};
