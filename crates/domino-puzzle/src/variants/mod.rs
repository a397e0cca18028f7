//! Puzzle variants, each a [`MoveGenerator`](crate::moves::MoveGenerator)
//! that the graph walker can drive.

mod adding;
mod capture;
mod drive;
mod ladder;
mod slide;

pub use adding::AddingRules;
pub use capture::CaptureRules;
pub use drive::DriveRules;
pub use ladder::LadderRules;
pub use slide::SlideRules;
