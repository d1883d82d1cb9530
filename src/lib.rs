// Library exports for the categorisation page glue

pub mod cascade;
pub mod config;
pub mod form;
pub mod loading;
pub mod page;
pub mod populator;
pub mod suggestion;

// Re-export commonly used types for tests
pub use cascade::{ApplyingFlag, CascadeReport, CascadeState, SuggestionCascadeApplier};
pub use config::CascadeConfig;
pub use form::{FieldId, FormFields, SimulatedPage};
pub use loading::{LoadingGate, LoadingIndicator};
pub use populator::{DependentOptionPopulator, EntryPoint, RefreshRegistry};
pub use suggestion::{SuggestionHandler, SuggestionRecord};
