pub mod model;
pub mod queue;
