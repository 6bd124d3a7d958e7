mod athlete;
mod category;
mod reference;
mod training_center;

pub use athlete::{Athlete, AthleteSummary, NewAthlete};
pub use category::Category;
pub use reference::{ReferenceKind, ResolvedReferences};
pub use training_center::TrainingCenter;
