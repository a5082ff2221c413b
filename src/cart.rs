//! Cart parsing.
//!
//! A submitted cart arrives in one of three shapes (per-item form fields, a
//! `name=qty,name=qty` string, or a JSON object) and is validated against the
//! [`Catalog`] into a [`Cart`]. Lines with a non-positive quantity are dropped;
//! an unknown item rejects the whole submission.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::catalog::Catalog;

/// Name of the form field carrying an encoded cart.
pub const ITEMS_FIELD: &str = "items";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid quantity for {0}")]
    InvalidQuantity(String),

    #[error("item not available: {0}")]
    ItemNotAvailable(String),

    #[error("incorrect item format")]
    IncorrectFormat,

    #[error("no items selected")]
    NoItemsSelected,
}

/// How the order form carries its cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartEncoding {
    /// One quantity field per catalog item.
    Form,
    /// A single `items` field of comma-separated `name=quantity` pairs.
    Encoded,
    /// A single `items` field holding a JSON object.
    #[default]
    Json,
}

impl FromStr for CartEncoding {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "form" => Ok(Self::Form),
            "encoded" => Ok(Self::Encoded),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown cart encoding `{other}`")),
        }
    }
}

impl fmt::Display for CartEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Form => "form",
            Self::Encoded => "encoded",
            Self::Json => "json",
        })
    }
}

/// Raw cart as submitted, before validation.
#[derive(Debug, Clone)]
pub enum CartPayload {
    Fields(HashMap<String, String>),
    Encoded(String),
    Json(String),
    Structured(Map<String, Value>),
}

impl CartPayload {
    /// Pick the cart out of a submitted order form according to `encoding`.
    pub fn from_form(encoding: CartEncoding, mut fields: HashMap<String, String>) -> Self {
        match encoding {
            CartEncoding::Form => Self::Fields(fields),
            CartEncoding::Encoded => Self::Encoded(fields.remove(ITEMS_FIELD).unwrap_or_default()),
            CartEncoding::Json => Self::Json(fields.remove(ITEMS_FIELD).unwrap_or_default()),
        }
    }
}

/// Validated selection: item name to a positive quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    lines: BTreeMap<String, i32>,
}

impl Cart {
    pub fn lines(&self) -> impl Iterator<Item = (&str, i32)> {
        self.lines.iter().map(|(name, qty)| (name.as_str(), *qty))
    }

    pub fn quantity(&self, name: &str) -> Option<i32> {
        self.lines.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `Pasta=2,Tea=1`
    pub fn to_encoded(&self) -> String {
        self.lines
            .iter()
            .map(|(name, qty)| format!("{name}={qty}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `{"Pasta":2,"Tea":1}`
    pub fn to_json(&self) -> String {
        Value::Object(
            self.lines
                .iter()
                .map(|(name, qty)| (name.clone(), Value::from(*qty)))
                .collect(),
        )
        .to_string()
    }

    /// Encode the cart for the hidden `items` field of the order form.
    /// `Form` carries one field per line instead and yields `None`.
    pub fn encode(&self, encoding: CartEncoding) -> Option<String> {
        match encoding {
            CartEncoding::Form => None,
            CartEncoding::Encoded => Some(self.to_encoded()),
            CartEncoding::Json => Some(self.to_json()),
        }
    }
}

struct CartBuilder<'a> {
    catalog: &'a Catalog,
    lines: BTreeMap<String, i32>,
}

impl<'a> CartBuilder<'a> {
    fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            lines: BTreeMap::new(),
        }
    }

    fn add(&mut self, name: &str, quantity: i32) -> Result<(), ParseError> {
        if quantity <= 0 {
            return Ok(());
        }
        if !self.catalog.contains(name) {
            return Err(ParseError::ItemNotAvailable(name.to_string()));
        }
        let slot = self.lines.entry(name.to_string()).or_insert(0);
        *slot = slot
            .checked_add(quantity)
            .ok_or_else(|| ParseError::InvalidQuantity(name.to_string()))?;
        Ok(())
    }

    fn finish(self) -> Result<Cart, ParseError> {
        if self.lines.is_empty() {
            return Err(ParseError::NoItemsSelected);
        }
        Ok(Cart { lines: self.lines })
    }
}

/// Validate a submitted cart against the catalog.
pub fn parse(payload: &CartPayload, catalog: &Catalog) -> Result<Cart, ParseError> {
    let mut cart = CartBuilder::new(catalog);

    match payload {
        CartPayload::Fields(fields) => {
            for entry in catalog.entries() {
                let raw = fields.get(&entry.name).map(|v| v.trim()).unwrap_or("");
                if raw.is_empty() {
                    continue;
                }
                cart.add(&entry.name, parse_quantity(&entry.name, raw)?)?;
            }
        }
        CartPayload::Encoded(raw) => {
            for segment in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let (name, qty) = split_pair(segment)?;
                cart.add(name, parse_quantity(name, qty)?)?;
            }
        }
        CartPayload::Json(raw) => {
            let value: Value =
                serde_json::from_str(raw).map_err(|_| ParseError::IncorrectFormat)?;
            let Value::Object(map) = value else {
                return Err(ParseError::IncorrectFormat);
            };
            add_structured(&mut cart, &map)?;
        }
        CartPayload::Structured(map) => add_structured(&mut cart, map)?,
    }

    cart.finish()
}

fn add_structured(cart: &mut CartBuilder<'_>, map: &Map<String, Value>) -> Result<(), ParseError> {
    for (name, value) in map {
        let quantity = match value {
            Value::Number(n) => n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| ParseError::InvalidQuantity(name.clone()))?,
            Value::String(s) => parse_quantity(name, s)?,
            _ => return Err(ParseError::InvalidQuantity(name.clone())),
        };
        cart.add(name, quantity)?;
    }
    Ok(())
}

fn split_pair(segment: &str) -> Result<(&str, &str), ParseError> {
    let mut parts = segment.split('=');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(qty), None) if !name.trim().is_empty() => Ok((name.trim(), qty.trim())),
        _ => Err(ParseError::IncorrectFormat),
    }
}

fn parse_quantity(name: &str, raw: &str) -> Result<i32, ParseError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ParseError::InvalidQuantity(name.to_string()))
}
