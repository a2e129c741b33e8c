//! Transfer domain entities.

pub mod descriptor;
pub mod session;
pub mod state;

pub use descriptor::TransferDescriptor;
pub use session::{Artifact, TransferSession};
pub use state::TransferState;
