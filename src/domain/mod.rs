// Domain layer - Telemetry models, selection state and chart geometry
pub mod catalog;
pub mod dashboard;
pub mod rolling_buffer;
pub mod selection;
pub mod sparkline;
pub mod telemetry;
pub mod viewport;
