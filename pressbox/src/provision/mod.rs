//! WordPress provisioning pipeline and its progress reporting

pub mod fsm;
pub mod pipeline;
pub mod progress;
pub mod readiness;
pub mod steps;
pub mod stream;

pub use pipeline::{Deployment, Pipeline};
pub use progress::{NullSink, ProgressReporter, ProgressSink};
pub use stream::ChannelSink;
