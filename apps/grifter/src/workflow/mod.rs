// Résumé verification workflow: local upload checks, the session state machine,
// and the view snapshots it publishes.

pub mod controller;
pub mod state;
pub mod upload;

pub use controller::WorkflowController;
pub use state::{WorkflowState, WorkflowView};
pub use upload::read_upload;
