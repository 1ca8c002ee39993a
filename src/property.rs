//! # Property Data
//!
//! The listing details printed on a story: address, apartment type, area,
//! price, down payment, mortgage terms and bank.
//!
//! The three enumerations are closed. Their display labels are exhaustive
//! matches, so there is no "unknown" label to fall back to.
//!
//! ## Wire format
//!
//! ```json
//! {
//!   "propertyAddress": "ул. Ленина, 10",
//!   "propertyType": "2k",
//!   "propertyArea": 51.29,
//!   "totalCost": 5922500,
//!   "initialPayment": 1783000,
//!   "bankRate": 14.99,
//!   "monthlyPayment": 52308.56,
//!   "selectedBank": "sovkombank",
//!   "mortgageType": "basic"
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, StoryError};

/// Default amortization term in years.
pub const DEFAULT_TERM_YEARS: u32 = 30;

/// Apartment layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PropertyType {
    #[serde(rename = "1k")]
    OneRoom,
    #[default]
    #[serde(rename = "2k")]
    TwoRoom,
    #[serde(rename = "3k")]
    ThreeRoom,
    #[serde(rename = "studio")]
    Studio,
}

impl PropertyType {
    pub const ALL: [PropertyType; 4] = [
        PropertyType::OneRoom,
        PropertyType::TwoRoom,
        PropertyType::ThreeRoom,
        PropertyType::Studio,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PropertyType::OneRoom => "1k",
            PropertyType::TwoRoom => "2k",
            PropertyType::ThreeRoom => "3k",
            PropertyType::Studio => "studio",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PropertyType::OneRoom => "1К КВАРТИРА",
            PropertyType::TwoRoom => "2К КВАРТИРА",
            PropertyType::ThreeRoom => "3К КВАРТИРА",
            PropertyType::Studio => "СТУДИЯ",
        }
    }
}

/// Lending bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bank {
    #[default]
    Sovkombank,
    Sberbank,
    Vtb,
    Alfabank,
    Tinkoff,
}

impl Bank {
    pub const ALL: [Bank; 5] = [
        Bank::Sovkombank,
        Bank::Sberbank,
        Bank::Vtb,
        Bank::Alfabank,
        Bank::Tinkoff,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Bank::Sovkombank => "sovkombank",
            Bank::Sberbank => "sberbank",
            Bank::Vtb => "vtb",
            Bank::Alfabank => "alfabank",
            Bank::Tinkoff => "tinkoff",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Bank::Sovkombank => "СОВКОМБАНК",
            Bank::Sberbank => "СБЕРБАНК",
            Bank::Vtb => "ВТБ",
            Bank::Alfabank => "АЛЬФА-БАНК",
            Bank::Tinkoff => "ТИНЬКОФФ",
        }
    }
}

/// Mortgage program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MortgageProgram {
    #[default]
    Basic,
    Family,
    /// IT-sector subsidized program.
    It,
}

impl MortgageProgram {
    pub const ALL: [MortgageProgram; 3] = [
        MortgageProgram::Basic,
        MortgageProgram::Family,
        MortgageProgram::It,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MortgageProgram::Basic => "basic",
            MortgageProgram::Family => "family",
            MortgageProgram::It => "it",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MortgageProgram::Basic => "БАЗОВАЯ ИПОТЕКА",
            MortgageProgram::Family => "СЕМЕЙНАЯ ИПОТЕКА",
            MortgageProgram::It => "IT-ИПОТЕКА",
        }
    }
}

macro_rules! impl_key_parsing {
    ($ty:ident, $what:literal) => {
        impl FromStr for $ty {
            type Err = StoryError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .into_iter()
                    .find(|v| v.key() == s)
                    .ok_or_else(|| StoryError::invalid($what, format!("unknown value '{}'", s)))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }
    };
}

impl_key_parsing!(PropertyType, "propertyType");
impl_key_parsing!(Bank, "selectedBank");
impl_key_parsing!(MortgageProgram, "mortgageType");

/// Listing details for one story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyData {
    #[serde(default)]
    pub property_address: String,
    #[serde(default)]
    pub property_type: PropertyType,
    #[serde(default)]
    pub property_area: f64,
    #[serde(default)]
    pub total_cost: u64,
    #[serde(default)]
    pub initial_payment: u64,
    #[serde(default)]
    pub bank_rate: f64,
    #[serde(default)]
    pub monthly_payment: f64,
    #[serde(default)]
    pub selected_bank: Bank,
    #[serde(default)]
    pub mortgage_type: MortgageProgram,
}

impl Default for PropertyData {
    fn default() -> Self {
        Self {
            property_address: String::new(),
            property_type: PropertyType::default(),
            property_area: 0.0,
            total_cost: 0,
            initial_payment: 0,
            bank_rate: 0.0,
            monthly_payment: 0.0,
            selected_bank: Bank::default(),
            mortgage_type: MortgageProgram::default(),
        }
    }
}

impl PropertyData {
    /// Header text: the address uppercased, or a placeholder when empty.
    pub fn header_text(&self) -> String {
        if self.property_address.is_empty() {
            "АДРЕС НЕ УКАЗАН".to_string()
        } else {
            self.property_address.to_uppercase()
        }
    }

    /// Loan principal (never negative).
    pub fn loan_amount(&self) -> u64 {
        self.total_cost.saturating_sub(self.initial_payment)
    }

    /// Recompute `monthly_payment` from cost, down payment and rate.
    pub fn recalculate_payment(&mut self) {
        self.monthly_payment = calculate_monthly_payment(
            self.total_cost as f64,
            self.initial_payment as f64,
            self.bank_rate,
            DEFAULT_TERM_YEARS,
        );
    }

    /// Check the numeric fields; every violated rule is reported.
    pub fn validate(&self) -> Result<(), StoryError> {
        let errors = self.field_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StoryError::Validation(errors))
        }
    }

    pub(crate) fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if !self.property_area.is_finite() || self.property_area <= 0.0 {
            errors.push(FieldError::new("propertyArea", "must be greater than 0"));
        }
        if !self.bank_rate.is_finite() || self.bank_rate < 0.0 {
            errors.push(FieldError::new("bankRate", "must not be negative"));
        }
        if !self.monthly_payment.is_finite() || self.monthly_payment < 0.0 {
            errors.push(FieldError::new("monthlyPayment", "must not be negative"));
        }
        errors
    }
}

/// Annuity payment for a fixed-rate mortgage, rounded to kopecks.
///
/// `rate_percent` is the nominal annual rate; compounding is monthly over
/// `years * 12` payments. Returns 0 when there is nothing to finance or the
/// rate is not positive.
pub fn calculate_monthly_payment(
    total_cost: f64,
    initial_payment: f64,
    rate_percent: f64,
    years: u32,
) -> f64 {
    if total_cost <= 0.0 || initial_payment < 0.0 || rate_percent <= 0.0 || years == 0 {
        return 0.0;
    }
    let loan = total_cost - initial_payment;
    if loan <= 0.0 {
        return 0.0;
    }

    let monthly_rate = rate_percent / 100.0 / 12.0;
    let growth = (1.0 + monthly_rate).powi((years * 12) as i32);
    let payment = loan * monthly_rate * growth / (growth - 1.0);
    (payment * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_monthly_payment_reference() {
        // 4,139,500 over 360 months at 14.99% nominal
        let payment = calculate_monthly_payment(5_922_500.0, 1_783_000.0, 14.99, 30);
        assert_eq!(payment, 52_308.56);
    }

    #[test]
    fn test_monthly_payment_degenerate_inputs() {
        assert_eq!(calculate_monthly_payment(0.0, 0.0, 10.0, 30), 0.0);
        assert_eq!(calculate_monthly_payment(100.0, 100.0, 10.0, 30), 0.0);
        assert_eq!(calculate_monthly_payment(100.0, 200.0, 10.0, 30), 0.0);
        assert_eq!(calculate_monthly_payment(100.0, 0.0, 0.0, 30), 0.0);
        assert_eq!(calculate_monthly_payment(100.0, -1.0, 10.0, 30), 0.0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(PropertyType::Studio.label(), "СТУДИЯ");
        assert_eq!(Bank::Alfabank.label(), "АЛЬФА-БАНК");
        assert_eq!(MortgageProgram::It.label(), "IT-ИПОТЕКА");
    }

    #[test]
    fn test_keys_parse_back() {
        for t in PropertyType::ALL {
            assert_eq!(t.key().parse::<PropertyType>().unwrap(), t);
        }
        for b in Bank::ALL {
            assert_eq!(b.key().parse::<Bank>().unwrap(), b);
        }
        for m in MortgageProgram::ALL {
            assert_eq!(m.key().parse::<MortgageProgram>().unwrap(), m);
        }
        assert!("4k".parse::<PropertyType>().is_err());
    }

    #[test]
    fn test_wire_format() {
        let json = r#"{
            "propertyAddress": "ул. Ленина, 10",
            "propertyType": "studio",
            "propertyArea": 51.29,
            "totalCost": 5922500,
            "initialPayment": 1783000,
            "bankRate": 14.99,
            "monthlyPayment": 52308.56,
            "selectedBank": "vtb"
        }"#;
        let data: PropertyData = serde_json::from_str(json).unwrap();
        assert_eq!(data.property_type, PropertyType::Studio);
        assert_eq!(data.selected_bank, Bank::Vtb);
        assert_eq!(data.mortgage_type, MortgageProgram::Basic);
        assert_eq!(data.total_cost, 5_922_500);

        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["mortgageType"], "basic");
        assert_eq!(value["propertyType"], "studio");
    }

    #[test]
    fn test_header_text() {
        let mut data = PropertyData::default();
        assert_eq!(data.header_text(), "АДРЕС НЕ УКАЗАН");
        data.property_address = "ул. Ленина, 10".into();
        assert_eq!(data.header_text(), "УЛ. ЛЕНИНА, 10");
    }

    #[test]
    fn test_validate_reports_every_field() {
        let data = PropertyData {
            property_area: 0.0,
            bank_rate: -1.0,
            monthly_payment: f64::NAN,
            ..PropertyData::default()
        };
        match data.validate() {
            Err(StoryError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["propertyArea", "bankRate", "monthlyPayment"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_recalculate_payment() {
        let mut data = PropertyData {
            property_area: 51.29,
            total_cost: 5_922_500,
            initial_payment: 1_783_000,
            bank_rate: 14.99,
            ..PropertyData::default()
        };
        data.recalculate_payment();
        assert_eq!(data.monthly_payment, 52_308.56);
        assert_eq!(data.loan_amount(), 4_139_500);
        assert!(data.validate().is_ok());
    }
}
