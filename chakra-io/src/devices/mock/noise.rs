//! Seeded motion errors for the simulated robot
//!
//! The classroom robots drift left on every forward command and never turn
//! by exactly the commanded angle. Both effects are drawn here from one
//! seeded generator so runs are reproducible.

use super::config::NoiseConfig;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_distr::{Distribution, Normal};

/// Motion error source
pub struct MotionNoise {
    rng: SmallRng,
    config: NoiseConfig,
}

impl MotionNoise {
    /// Seed 0 draws from entropy, anything else is reproducible
    pub fn new(seed: u64, config: NoiseConfig) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng, config }
    }

    /// Actually travelled distance for a nominal drive
    pub fn travel(&mut self, nominal: f32) -> f32 {
        nominal * (1.0 + self.sample(self.config.distance_stddev))
    }

    /// Heading change accumulated over one drive (degrees)
    pub fn drive_drift(&mut self) -> f32 {
        self.config.heading_drift_deg + self.sample(self.config.heading_stddev_deg)
    }

    /// Error added to a commanded rotation (degrees)
    pub fn turn_error(&mut self) -> f32 {
        self.sample(self.config.turn_stddev_deg)
    }

    fn sample(&mut self, stddev: f32) -> f32 {
        if stddev <= 0.0 {
            return 0.0;
        }
        match Normal::new(0.0f32, stddev) {
            Ok(normal) => normal.sample(&mut self.rng),
            Err(_) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_errors() {
        let mut a = MotionNoise::new(42, NoiseConfig::default());
        let mut b = MotionNoise::new(42, NoiseConfig::default());

        for _ in 0..50 {
            assert_eq!(a.drive_drift(), b.drive_drift());
            assert_eq!(a.turn_error(), b.turn_error());
            assert_eq!(a.travel(150.0), b.travel(150.0));
        }
    }

    #[test]
    fn test_noise_free_keeps_bias_only() {
        let config = NoiseConfig {
            heading_drift_deg: -3.5,
            ..NoiseConfig::none()
        };
        let mut noise = MotionNoise::new(7, config);
        for _ in 0..10 {
            assert_eq!(noise.drive_drift(), -3.5);
            assert_eq!(noise.turn_error(), 0.0);
            assert_eq!(noise.travel(150.0), 150.0);
        }
    }

    #[test]
    fn test_drift_mean_follows_bias() {
        let mut noise = MotionNoise::new(3, NoiseConfig::default());
        let n = 2000;
        let mean: f32 = (0..n).map(|_| noise.drive_drift()).sum::<f32>() / n as f32;
        assert!((mean + 3.5).abs() < 0.1, "mean drift {}", mean);
    }
}
