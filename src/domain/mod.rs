// Domain layer - Frames, query models and service shapes
pub mod frame;
pub mod property;
pub mod query;
pub mod sitewise;
