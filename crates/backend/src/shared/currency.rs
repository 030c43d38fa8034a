/// Presentment currency of a storefront order
///
/// Codes outside the fixed set are kept as `Other` and pass through the
/// normalizer unconverted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Currency {
    Gbp,
    Eur,
    Nok,
    Sek,
    Dkk,
    Other(String),
}

impl Currency {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "GBP" => Currency::Gbp,
            "EUR" => Currency::Eur,
            "NOK" => Currency::Nok,
            "SEK" => Currency::Sek,
            "DKK" => Currency::Dkk,
            other => Currency::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Nok => "NOK",
            Currency::Sek => "SEK",
            Currency::Dkk => "DKK",
            Currency::Other(code) => code,
        }
    }

    /// Fixed multiplier into the reporting currency (DKK)
    pub fn rate_to_reporting(&self) -> f64 {
        match self {
            Currency::Gbp => 8.66,
            Currency::Eur => 7.45,
            Currency::Nok => 0.64,
            Currency::Sek => 0.63,
            Currency::Dkk => 1.0,
            Currency::Other(_) => 1.0,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Currency::Other(_))
    }
}

/// Converts an amount in `currency` into the reporting currency
pub fn normalize(currency: &Currency, amount: f64) -> f64 {
    if !currency.is_known() {
        tracing::debug!(
            "Unrecognized currency '{}', amount taken as DKK",
            currency.code()
        );
    }
    amount * currency.rate_to_reporting()
}
