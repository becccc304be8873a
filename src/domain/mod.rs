// Domain layer - Plain data records shared by every other layer
pub mod chart;
pub mod process;
pub mod sensor;
