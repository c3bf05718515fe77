pub mod config;
pub mod price;
pub mod signal;
pub mod window;

pub use config::{BacktestConfig, ConfigError, DataConfig, OptimizerConfig, StrategyConfig};
pub use price::{PriceBar, PriceError, PriceSeries};
pub use signal::CrossoverEvent;
pub use window::{SearchGrid, StepRange, WindowPair};
