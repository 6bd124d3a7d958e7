use std::fmt;

/// The kinds of record an athlete references by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Category,
    TrainingCenter,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category => write!(f, "Category"),
            Self::TrainingCenter => write!(f, "Training center"),
        }
    }
}

/// Internal ids for a category and training center pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedReferences {
    pub category_id: i32,
    pub training_center_id: i32,
}
