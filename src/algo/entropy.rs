// Shannon entropy: H = -sum(p * log_b(p)), with 0 * log(0) taken as 0.

use std::fmt;
use std::str::FromStr;

use super::AlgorithmError;

/// Logarithm base of the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EntropyUnit {
    /// Base 2.
    #[default]
    Bit,
    /// Base e.
    Nat,
    /// Base 10.
    Dit,
}

impl EntropyUnit {
    #[inline]
    fn log(self, x: f64) -> f64 {
        match self {
            Self::Bit => x.log2(),
            Self::Nat => x.ln(),
            Self::Dit => x.log10(),
        }
    }
}

impl fmt::Display for EntropyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bit => "bit",
            Self::Nat => "nat",
            Self::Dit => "dit",
        })
    }
}

impl FromStr for EntropyUnit {
    type Err = String;

    /// Accepts a unit name or the numeric codes 0, 1, 2.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bit" | "0" => Ok(Self::Bit),
            "nat" | "1" => Ok(Self::Nat),
            "dit" | "2" => Ok(Self::Dit),
            _ => Err(format!("unknown entropy unit '{s}' (expected bit, nat or dit)")),
        }
    }
}

/// Entropy of a fixed-length probability frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntropyCalculator {
    num_elements: usize,
    unit: EntropyUnit,
}

impl EntropyCalculator {
    pub fn new(num_elements: usize, unit: EntropyUnit) -> Self {
        Self { num_elements, unit }
    }

    pub fn is_valid(&self) -> bool {
        self.num_elements > 0
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    pub fn unit(&self) -> EntropyUnit {
        self.unit
    }

    pub fn run(&self, probability: &[f64]) -> Result<f64, AlgorithmError> {
        if !self.is_valid() {
            return Err(AlgorithmError::InvalidParameters);
        }
        if probability.len() != self.num_elements {
            return Err(AlgorithmError::LengthMismatch {
                expected: self.num_elements,
                got: probability.len(),
            });
        }

        let mut sum = 0.0;
        for (index, &p) in probability.iter().enumerate() {
            if p.is_nan() {
                return Err(AlgorithmError::NotANumber { index });
            }
            if p < 0.0 {
                return Err(AlgorithmError::NegativeProbability { index });
            }
            if p > 0.0 {
                sum -= p * self.unit.log(p);
            }
        }
        Ok(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fair_coin_is_one_bit() {
        let h = EntropyCalculator::new(2, EntropyUnit::Bit);
        assert_eq!(h.run(&[0.5, 0.5]).unwrap(), 1.0);
    }

    #[test]
    fn certain_outcome_is_zero() {
        let h = EntropyCalculator::new(2, EntropyUnit::Bit);
        assert_eq!(h.run(&[1.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn units() {
        let p = [0.25; 4];
        let nat = EntropyCalculator::new(4, EntropyUnit::Nat).run(&p).unwrap();
        assert!((nat - 4f64.ln()).abs() < 1e-12);
        let dit = EntropyCalculator::new(4, EntropyUnit::Dit).run(&p).unwrap();
        assert!((dit - 4f64.log10()).abs() < 1e-12);
        let bit = EntropyCalculator::new(4, EntropyUnit::Bit).run(&p).unwrap();
        assert!((bit - 2.0).abs() < 1e-12);
    }

    #[test]
    fn negative_probability_fails() {
        let h = EntropyCalculator::new(3, EntropyUnit::Bit);
        assert_eq!(
            h.run(&[0.5, -0.1, 0.6]),
            Err(AlgorithmError::NegativeProbability { index: 1 })
        );
        assert_eq!(
            h.run(&[0.5, f64::NAN, 0.5]),
            Err(AlgorithmError::NotANumber { index: 1 })
        );
    }

    #[test]
    fn shape_and_validity() {
        let h = EntropyCalculator::new(2, EntropyUnit::Bit);
        assert!(matches!(
            h.run(&[1.0]),
            Err(AlgorithmError::LengthMismatch { expected: 2, got: 1 })
        ));
        let empty = EntropyCalculator::new(0, EntropyUnit::Nat);
        assert!(!empty.is_valid());
        assert_eq!(empty.run(&[]), Err(AlgorithmError::InvalidParameters));
    }

    #[test]
    fn unit_parsing() {
        assert_eq!("nat".parse::<EntropyUnit>().unwrap(), EntropyUnit::Nat);
        assert_eq!("2".parse::<EntropyUnit>().unwrap(), EntropyUnit::Dit);
        assert!("bits".parse::<EntropyUnit>().is_err());
        assert_eq!(EntropyUnit::Bit.to_string(), "bit");
    }
}
