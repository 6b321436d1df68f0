pub mod drag;
pub mod overlay;

pub use drag::{DragCommit, DragController, DragOperation};
pub use overlay::OptimisticOverlay;
