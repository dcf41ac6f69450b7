mod analysis_session;
mod state;

pub use analysis_session::{AnalysisReport, AnalysisSession, SessionId, SessionResults};
pub use state::SessionState;
