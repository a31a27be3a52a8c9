//! Batch sizing for the bookmark-import phase
//!
//! The initial size follows the number of bookmarks and the current memory
//! pressure; afterwards the size only ever shrinks, never below the floor.

use crate::config::ImportConfig;
use crate::monitor::PressureLevel;

/// Share of the total that goes into one batch before clamping
const BATCHES_PER_IMPORT: usize = 10;

/// Size of the first batch
pub fn initial_batch_size(total: usize, pressure: PressureLevel, config: &ImportConfig) -> usize {
    let base = match config.batch_size_override {
        Some(size) => size,
        None => total
            .div_ceil(BATCHES_PER_IMPORT)
            .clamp(config.min_batch_size, config.max_batch_size),
    };

    match pressure {
        PressureLevel::Low | PressureLevel::Normal => base,
        PressureLevel::High => shrink(base, config),
        PressureLevel::Critical => base.min(config.min_batch_size),
    }
}

/// Size of the batch after one that finished under `pressure`
pub fn next_batch_size(current: usize, pressure: PressureLevel, config: &ImportConfig) -> usize {
    match pressure {
        PressureLevel::Low | PressureLevel::Normal => current,
        PressureLevel::High => shrink(current, config),
        PressureLevel::Critical => current.min(config.min_batch_size),
    }
}

fn shrink(current: usize, config: &ImportConfig) -> usize {
    let shrunk = (current as f64 * config.shrink_factor).floor() as usize;
    shrunk.max(config.min_batch_size).min(current).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_size_follows_total() {
        let config = ImportConfig::default();
        assert_eq!(initial_batch_size(10, PressureLevel::Normal, &config), 5);
        assert_eq!(initial_batch_size(500, PressureLevel::Normal, &config), 50);
        assert_eq!(initial_batch_size(100_000, PressureLevel::Low, &config), 100);
    }

    #[test]
    fn test_initial_size_under_pressure() {
        let config = ImportConfig::default();
        assert_eq!(initial_batch_size(500, PressureLevel::High, &config), 35);
        assert_eq!(initial_batch_size(500, PressureLevel::Critical, &config), 5);
    }

    #[test]
    fn test_override_wins() {
        let config = ImportConfig {
            batch_size_override: Some(2),
            ..Default::default()
        };
        assert_eq!(initial_batch_size(1000, PressureLevel::Normal, &config), 2);
    }

    #[test]
    fn test_shrink_is_monotonic_with_floor() {
        let config = ImportConfig::default();
        let mut size = 100;
        let mut seen = vec![size];
        for _ in 0..20 {
            size = next_batch_size(size, PressureLevel::High, &config);
            seen.push(size);
        }
        assert!(seen.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(*seen.last().unwrap(), config.min_batch_size);
        assert_eq!(seen[1], 70);

        assert_eq!(next_batch_size(40, PressureLevel::Low, &config), 40);
        assert_eq!(next_batch_size(3, PressureLevel::High, &config), 3);
    }
}
