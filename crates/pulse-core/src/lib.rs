pub mod error;
pub mod labels;
pub mod render;
pub mod sample;
pub mod spec;
pub mod validate;

pub use error::{MetricError, MetricResult};
pub use labels::LabelSet;
pub use render::render_number;
pub use sample::SampleKey;
pub use spec::{MetricKind, MetricSpec};
