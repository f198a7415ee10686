use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
    str::FromStr,
};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("invalid currency {0:?}")]
    InvalidCurrency(String),
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),
    #[error("amount {amount} has more than {precision} digits after the decimal point")]
    TooPrecise { amount: String, precision: u32 },
    #[error("amount {0} is out of range")]
    OutOfRange(String),
}

/// Monetary amount in minor units of its currency (cents for USD).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(units: i64) -> Self {
        Money(units)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `None` when the sum doesn't fit in minor units.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    pub fn to_decimal(self, currency: Currency) -> Decimal {
        Decimal::new(self.0, currency.precision())
    }

    pub fn from_decimal(value: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        let factor = Decimal::from(10i64.pow(currency.precision()));
        let scaled = value
            .checked_mul(factor)
            .ok_or_else(|| MoneyError::OutOfRange(value.to_string()))?;
        if !scaled.fract().is_zero() {
            return Err(MoneyError::TooPrecise {
                amount: value.to_string(),
                precision: currency.precision(),
            });
        }
        scaled
            .to_i64()
            .map(Money)
            .ok_or_else(|| MoneyError::OutOfRange(value.to_string()))
    }

    /// Parses a decimal string such as `"12.50"` using the precision of `currency`.
    pub fn parse(s: &str, currency: Currency) -> Result<Self, MoneyError> {
        let value =
            Decimal::from_str(s.trim()).map_err(|_| MoneyError::InvalidAmount(s.to_string()))?;
        Self::from_decimal(value, currency)
    }

    pub fn format(self, currency: Currency) -> String {
        self.to_decimal(currency).to_string()
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    /// Digits after the decimal point.
    pub precision: u32,
}

macro_rules! currencies {
    ($(($code:literal, $name:literal, $prec:literal)),* $(,)?) => {
        static CURRENCIES: &[CurrencyInfo] = &[
            $(CurrencyInfo { code: $code, name: $name, precision: $prec }),*
        ];
    };
}

currencies![
    ("AED", "United Arab Emirates dirham", 2),
    ("AMD", "Armenian dram", 2),
    ("AUD", "Australian dollar", 2),
    ("BGN", "Bulgarian lev", 2),
    ("BHD", "Bahraini dinar", 3),
    ("BRL", "Brazilian real", 2),
    ("BYN", "Belarusian ruble", 2),
    ("CAD", "Canadian dollar", 2),
    ("CHF", "Swiss franc", 2),
    ("CLP", "Chilean peso", 0),
    ("CNY", "Chinese yuan", 2),
    ("CZK", "Czech koruna", 2),
    ("DKK", "Danish krone", 2),
    ("EUR", "Euro", 2),
    ("GBP", "British pound", 2),
    ("GEL", "Georgian lari", 2),
    ("HKD", "Hong Kong dollar", 2),
    ("HUF", "Hungarian forint", 2),
    ("ILS", "Israeli new shekel", 2),
    ("INR", "Indian rupee", 2),
    ("ISK", "Icelandic krona", 0),
    ("JPY", "Japanese yen", 0),
    ("KRW", "South Korean won", 0),
    ("KWD", "Kuwaiti dinar", 3),
    ("KZT", "Kazakhstani tenge", 2),
    ("MXN", "Mexican peso", 2),
    ("NOK", "Norwegian krone", 2),
    ("NZD", "New Zealand dollar", 2),
    ("PLN", "Polish zloty", 2),
    ("RON", "Romanian leu", 2),
    ("RSD", "Serbian dinar", 2),
    ("RUB", "Russian ruble", 2),
    ("SEK", "Swedish krona", 2),
    ("SGD", "Singapore dollar", 2),
    ("THB", "Thai baht", 2),
    ("TRY", "Turkish lira", 2),
    ("UAH", "Ukrainian hryvnia", 2),
    ("USD", "United States dollar", 2),
    ("UZS", "Uzbekistani som", 2),
    ("ZAR", "South African rand", 2),
];

/// ISO 4217 currency known to the ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(&'static CurrencyInfo);

impl Currency {
    pub fn code(self) -> &'static str {
        self.0.code
    }

    pub fn name(self) -> &'static str {
        self.0.name
    }

    pub fn precision(self) -> u32 {
        self.0.precision
    }

}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.0.code == other.0.code
    }
}

impl Eq for Currency {}

impl Hash for Currency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.code.hash(state);
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        CURRENCIES
            .iter()
            .find(|info| info.code == code)
            .map(Currency)
            .ok_or_else(|| MoneyError::InvalidCurrency(s.to_string()))
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.code().to_string()
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
