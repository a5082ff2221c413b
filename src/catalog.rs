use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogEntry {
    pub name: String,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate catalog entry {0}")]
    Duplicate(String),

    #[error("negative price for {0}")]
    NegativePrice(String),
}

/// Fixed price list, in menu order.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new<I, N>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (N, Decimal)>,
        N: Into<String>,
    {
        let mut catalog = Self {
            entries: Vec::new(),
        };
        for (name, unit_price) in entries {
            let name = name.into();
            if catalog.contains(&name) {
                return Err(CatalogError::Duplicate(name));
            }
            if unit_price.is_sign_negative() {
                return Err(CatalogError::NegativePrice(name));
            }
            catalog.entries.push(CatalogEntry { name, unit_price });
        }
        Ok(catalog)
    }

    /// The house menu served by the restaurant.
    pub fn bistro_menu() -> Self {
        let items: [(&str, i64); 12] = [
            ("Pasta", 12000),
            ("Chi-Momo", 16000),
            ("Burger", 22000),
            ("Coffee", 12000),
            ("Tea", 3000),
            ("Chowmein", 18000),
            ("Samosa", 3500),
            ("Keema Noodles", 19000),
            ("Laphing", 12000),
            ("Corn Dog", 22000),
            ("Sauces", 33000),
            ("Momo", 15000),
        ];
        Self {
            entries: items
                .into_iter()
                .map(|(name, cents)| CatalogEntry {
                    name: name.to_string(),
                    unit_price: Decimal::new(cents, 2),
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn unit_price(&self, name: &str) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.unit_price)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.unit_price(name).is_some()
    }
}

/// Round a money amount to cents, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Render `amount` as `"<label>: 1,234.50"`.
pub fn format_currency(label: &str, amount: Decimal) -> String {
    let rendered = format!("{:.2}", round_money(amount));
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (whole, cents) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{label}: {sign}{grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn house_menu_prices() {
        let catalog = Catalog::bistro_menu();
        assert_eq!(catalog.entries().len(), 12);
        assert_eq!(catalog.unit_price("Pasta"), Some(Decimal::new(12000, 2)));
        assert_eq!(catalog.unit_price("Tea"), Some(Decimal::new(3000, 2)));
        assert_eq!(catalog.unit_price("Pizza"), None);
    }

    #[test]
    fn rejects_duplicates_and_negative_prices() {
        let dup = Catalog::new([("Tea", Decimal::ONE), ("Tea", Decimal::TWO)]);
        assert_eq!(dup.unwrap_err(), CatalogError::Duplicate("Tea".into()));

        let negative = Catalog::new([("Tea", Decimal::NEGATIVE_ONE)]);
        assert_eq!(
            negative.unwrap_err(),
            CatalogError::NegativePrice("Tea".into())
        );
    }

    #[test]
    fn formats_with_thousands_separators() {
        assert_eq!(format_currency("Nrs", Decimal::new(123450, 2)), "Nrs: 1,234.50");
        assert_eq!(format_currency("Nrs", Decimal::new(27000, 2)), "Nrs: 270.00");
        assert_eq!(format_currency("Nrs", Decimal::ZERO), "Nrs: 0.00");
        assert_eq!(
            format_currency("Nrs", Decimal::new(100000000, 2)),
            "Nrs: 1,000,000.00"
        );
        assert_eq!(format_currency("Nrs", Decimal::new(-150000, 2)), "Nrs: -1,500.00");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(Decimal::new(1005, 3)), Decimal::new(101, 2));
        assert_eq!(format_currency("Nrs", Decimal::new(5, 3)), "Nrs: 0.01");
    }
}
