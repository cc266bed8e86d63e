// Mu-law compression: y = sgn(x) * V * ln(1 + mu*|x|/V) / ln(1 + mu).
//
// mu = 0 is the limit of the curve, y = x.

use super::AlgorithmError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuLawCompression {
    absolute_max_value: f64,
    compression_factor: f64,
    /// ln(1 + mu), or 0 when mu is 0.
    denominator: f64,
    is_valid: bool,
}

impl MuLawCompression {
    pub fn new(absolute_max_value: f64, compression_factor: f64) -> Self {
        let is_valid = absolute_max_value.is_finite()
            && absolute_max_value > 0.0
            && compression_factor.is_finite()
            && compression_factor >= 0.0;
        Self {
            absolute_max_value,
            compression_factor,
            denominator: compression_factor.ln_1p(),
            is_valid,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn absolute_max_value(&self) -> f64 {
        self.absolute_max_value
    }

    pub fn compression_factor(&self) -> f64 {
        self.compression_factor
    }

    pub fn run(&self, input: f64) -> Result<f64, AlgorithmError> {
        if !self.is_valid {
            return Err(AlgorithmError::InvalidParameters);
        }
        if input.is_nan() {
            return Err(AlgorithmError::NotANumber { index: 0 });
        }
        if self.compression_factor == 0.0 {
            return Ok(input);
        }

        let v = self.absolute_max_value;
        let magnitude = v * (self.compression_factor * input.abs() / v).ln_1p() / self.denominator;
        Ok(magnitude.copysign(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_and_origin() {
        let m = MuLawCompression::new(1.0, 255.0);
        assert!((m.run(1.0).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(m.run(0.0).unwrap(), 0.0);
    }

    #[test]
    fn odd_symmetry() {
        let m = MuLawCompression::new(1.0, 255.0);
        for x in [0.001, 0.1, 0.37, 0.5, 0.99, 2.0] {
            assert_eq!(m.run(-x).unwrap(), -m.run(x).unwrap(), "x = {x}");
        }
    }

    #[test]
    fn known_value() {
        let m = MuLawCompression::new(32768.0, 255.0);
        let y = m.run(16384.0).unwrap();
        let expected = 32768.0 * (1.0 + 255.0 * 0.5f64).ln() / 256f64.ln();
        assert!((y - expected).abs() < 1e-9);
        assert!(y > 16384.0);
    }

    #[test]
    fn zero_factor_is_passthrough() {
        let m = MuLawCompression::new(10.0, 0.0);
        assert!(m.is_valid());
        assert_eq!(m.run(-3.5).unwrap(), -3.5);
    }

    #[test]
    fn invalid_parameters() {
        assert!(!MuLawCompression::new(0.0, 255.0).is_valid());
        assert!(!MuLawCompression::new(-1.0, 255.0).is_valid());
        assert!(!MuLawCompression::new(1.0, -1.0).is_valid());
        assert!(!MuLawCompression::new(f64::INFINITY, 1.0).is_valid());
        assert_eq!(
            MuLawCompression::new(1.0, -1.0).run(0.5),
            Err(AlgorithmError::InvalidParameters)
        );
    }

    #[test]
    fn nan_input_fails() {
        let m = MuLawCompression::new(1.0, 255.0);
        assert_eq!(m.run(f64::NAN), Err(AlgorithmError::NotANumber { index: 0 }));
    }
}
