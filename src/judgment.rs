//! Judgment windows: naming how far off a hit was.
//!
//! A [`JudgmentWindowCollection`] holds the windows of one profile. Timing errors are classified
//! into the narrowest standard window containing them, and anything wider is a miss.
//!
//! ```
//! use chart_timing::judgment::JudgmentWindowCollection;
//!
//! let itg = JudgmentWindowCollection::builtin("ITG").unwrap();
//! assert_eq!(itg.classify(-30.0).name, "Excellent");
//! assert_eq!(itg.classify(500.0).name, "Miss");
//! ```

pub mod collection;
pub mod profile;
pub mod window;

pub use self::{
    collection::{JudgmentWindowCollection, MAX_BOUNDARY_MS},
    profile::{FA_PLUS_PROFILE, ITG_PROFILE, PROFILE_NAMES},
    window::{HoldRelease, HoldType, JudgmentWindow, WindowHandle, WindowKind},
};
