pub mod crossover;
pub mod rolling;
pub mod traits;

pub use crossover::{compute_signals, StrategySeries};
pub use rolling::rolling_mean;
pub use traits::{ModelId, MovingAverageCrossover, SignalModel};
