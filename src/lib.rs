pub mod compare;
pub mod density;
pub mod errors;
pub mod plot;
pub mod region;
pub mod stats;
pub mod tracks;
pub mod utils;


pub use compare::{Alignment, TrackComparison};
pub use density::{CpgSites, SiteSummary, WindowAnalysis};
pub use errors::CpgScopeError;
pub use region::Region;
pub use tracks::Track;
