pub mod brute_force;
pub mod engine;
pub mod geography;
pub mod state;
pub mod work_hours;

pub use brute_force::BruteForceRule;
pub use engine::{DetectionEngine, EngineError};
pub use geography::GeographyRule;
pub use state::{FailedAttempt, RiskState};
pub use work_hours::WorkHoursRule;
