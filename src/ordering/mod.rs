pub mod reconciler;

pub use reconciler::{ChangeDetection, Direction, ImageOrdering};
