use serde::{Deserialize, Serialize};

/// Discrete regime change of the crossover signal.
///
/// Used for chart annotation only, never for position sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossoverEvent {
    /// Signal went 0 -> 1.
    Buy,
    /// Signal went 1 -> 0.
    Sell,
}

impl CrossoverEvent {
    /// Map a crossover value (`signal[t] - signal[t-1]`) to an event.
    pub fn from_crossover(value: f64) -> Option<Self> {
        if value > 0.0 {
            Some(CrossoverEvent::Buy)
        } else if value < 0.0 {
            Some(CrossoverEvent::Sell)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrossoverEvent::Buy => "buy",
            CrossoverEvent::Sell => "sell",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_crossover() {
        assert_eq!(CrossoverEvent::from_crossover(1.0), Some(CrossoverEvent::Buy));
        assert_eq!(CrossoverEvent::from_crossover(-1.0), Some(CrossoverEvent::Sell));
        assert_eq!(CrossoverEvent::from_crossover(0.0), None);
        assert_eq!(CrossoverEvent::from_crossover(f64::NAN), None);
    }
}
