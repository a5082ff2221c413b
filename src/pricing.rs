use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::{
    cart::{Cart, ParseError},
    catalog::{Catalog, round_money},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub lines: BTreeMap<String, PricedLine>,
    pub total: Decimal,
}

/// Largest amount the `NUMERIC(10, 2)` money columns hold.
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_99, 2)
}

/// Price a validated cart. Fails if the cart was validated against a
/// different catalog, or with `InvalidQuantity` for the line that pushes the
/// total past [`max_amount`].
pub fn price(cart: &Cart, catalog: &Catalog) -> Result<PricedOrder, ParseError> {
    let mut lines = BTreeMap::new();
    let mut total = Decimal::ZERO;

    for (name, quantity) in cart.lines() {
        let unit_price = catalog
            .unit_price(name)
            .ok_or_else(|| ParseError::ItemNotAvailable(name.to_string()))?;
        let line_total = round_money(unit_price * Decimal::from(quantity));
        total += line_total;
        if total > max_amount() {
            return Err(ParseError::InvalidQuantity(name.to_string()));
        }
        lines.insert(
            name.to_string(),
            PricedLine {
                quantity,
                unit_price,
                line_total,
            },
        );
    }

    Ok(PricedOrder {
        lines,
        total: round_money(total),
    })
}
