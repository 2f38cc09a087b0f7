use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Priming strategy of a deployed function, fixed for the lifetime of the
/// execution environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimingStrategy {
    #[default]
    NoPriming,
    InvokePriming,
    ManualPriming,
    ClassPriming,
}

impl PrimingStrategy {
    pub const ALL: [PrimingStrategy; 4] = [
        PrimingStrategy::NoPriming,
        PrimingStrategy::InvokePriming,
        PrimingStrategy::ManualPriming,
        PrimingStrategy::ClassPriming,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimingStrategy::NoPriming => "no-priming",
            PrimingStrategy::InvokePriming => "invoke-priming",
            PrimingStrategy::ManualPriming => "manual-priming",
            PrimingStrategy::ClassPriming => "class-priming",
        }
    }

    /// Whether this strategy registers a pre-checkpoint hook.
    pub fn primes_before_checkpoint(&self) -> bool {
        matches!(
            self,
            PrimingStrategy::InvokePriming | PrimingStrategy::ManualPriming
        )
    }

    /// Whether this strategy does work during environment initialization.
    pub fn primes_at_init(&self) -> bool {
        matches!(self, PrimingStrategy::ClassPriming)
    }
}

impl fmt::Display for PrimingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Accepts `NoPriming`, `no-priming`, `NO_PRIMING`, ... by comparing only the
// alphanumeric characters, case-insensitively.
impl FromStr for PrimingStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "nopriming" | "none" => Ok(PrimingStrategy::NoPriming),
            "invokepriming" | "invoke" => Ok(PrimingStrategy::InvokePriming),
            "manualpriming" | "manual" => Ok(PrimingStrategy::ManualPriming),
            "classpriming" | "class" => Ok(PrimingStrategy::ClassPriming),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_spellings() {
        for raw in ["NoPriming", "no-priming", "NO_PRIMING", "none"] {
            assert_eq!(raw.parse::<PrimingStrategy>().unwrap(), PrimingStrategy::NoPriming);
        }
        assert_eq!(
            "INVOKE_PRIMING".parse::<PrimingStrategy>().unwrap(),
            PrimingStrategy::InvokePriming
        );
        assert_eq!(
            "manual".parse::<PrimingStrategy>().unwrap(),
            PrimingStrategy::ManualPriming
        );
        assert_eq!(
            "Class-Priming".parse::<PrimingStrategy>().unwrap(),
            PrimingStrategy::ClassPriming
        );
    }

    #[test]
    fn display_round_trips() {
        for strategy in PrimingStrategy::ALL {
            assert_eq!(strategy.to_string().parse::<PrimingStrategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "eager".parse::<PrimingStrategy>().unwrap_err();
        assert!(matches!(err, Error::UnknownStrategy(ref s) if s == "eager"));
    }

    #[test]
    fn hook_table() {
        assert!(!PrimingStrategy::NoPriming.primes_before_checkpoint());
        assert!(!PrimingStrategy::NoPriming.primes_at_init());
        assert!(PrimingStrategy::InvokePriming.primes_before_checkpoint());
        assert!(PrimingStrategy::ManualPriming.primes_before_checkpoint());
        assert!(!PrimingStrategy::ClassPriming.primes_before_checkpoint());
        assert!(PrimingStrategy::ClassPriming.primes_at_init());
    }
}
