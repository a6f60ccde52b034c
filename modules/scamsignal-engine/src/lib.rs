pub mod community;
pub mod credentials;
pub mod dispatcher;
pub mod registry;
pub mod search;
pub mod testing;

pub use community::{default_signal, CommunityStore, FileCommunityStore, NewReport, SubmitOutcome};
pub use credentials::{Credential, CredentialFile, CredentialStore, FileCredentialStore};
pub use dispatcher::{DispatchError, Dispatcher};
pub use registry::{default_factory, AdapterFactory, ConfiguredBackend, CredentialRegistry};
pub use search::RiskAnalyzer;
