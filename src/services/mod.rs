//! Business logic services layer

pub mod host_service;
pub mod remote_service;

pub use host_service::{AuthMethod, CredentialPrompt, HostService, NewHost};
pub use remote_service::{ExecMode, RemoteService};
