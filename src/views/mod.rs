//! View Modules
//!
//! One module per screen. Each owns an explicit state object for its screen
//! and talks to the backend only through [`crate::api::ApiClient`].

pub mod analytics;
pub mod billing;
pub mod broadcast;
pub mod invitations;
pub mod onboarding;
pub mod sample_data;
pub mod search;
pub mod solutions;
pub mod unlocks;

pub use analytics::{AnalyticsRange, AnalyticsReport};
pub use billing::{BillingState, SeatUsage};
pub use broadcast::{segment_count, BroadcastComposer, SendButton};
pub use invitations::{parse_addresses, parse_csv, send_bulk, AddressList, BulkInviteReport};
pub use onboarding::{OnboardingWizard, WizardState, WizardStep};
pub use sample_data::SampleDataManager;
pub use search::{EventFilter, PeopleFilter};
pub use solutions::{SolutionsState, SolverRunOutcome};
pub use unlocks::{Feature, FeatureUnlocks, FEATURES};
