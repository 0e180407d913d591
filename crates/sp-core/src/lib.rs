pub mod builders;
pub mod display;
pub mod error;
pub mod resolve;
pub mod step;
pub mod story;
pub mod value;

pub use display::{DisplayCommand, RecordingSink, RenderSink};
pub use error::SceneplayError;
pub use resolve::{collect_leaf_paths, resolve, ResolveError};
pub use step::*;
pub use story::*;
pub use value::*;
