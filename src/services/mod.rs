pub mod backends;
pub use backends::{
    Backends, MediaLibrary, MovieAddRequest, MovieBackend, SeriesAddRequest, SeriesBackend,
    TransferBackend,
};

pub mod resolver;
pub use resolver::{CatalogResolver, DedupPolicy, HeldSets, ResolvedCandidate};

pub mod session;
pub use session::{SelectionSession, SessionId, SessionStore};

pub mod seasons;

pub mod submission;
pub use submission::{SubmissionCoordinator, SubmissionResult, SubmissionSettings};

pub mod releases;
pub use releases::{
    GrabOutcome, ReleaseCheck, ReleaseFallbackResolver, ReleaseOption, ReleasePicker,
    ReleaseTarget,
};

pub mod status;
pub use status::{StatusProbe, StatusReport, TrackState};

pub mod tracking;
pub use tracking::{Tracker, TrackingHandle, TrackingOutcome, TrackingSettings};
