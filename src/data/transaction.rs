//! Transaction data supplied by the point-of-sale application.
//!
//! These types are inputs only. Amounts are already computed by the caller;
//! the printer never prices, discounts or awards points on its own.

use chrono::NaiveDateTime;

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PaymentMethod {
    /// Cash; the only method that prints a change line.
    #[default]
    Cash,
    /// Debit or credit card.
    Card,
    /// Bank transfer.
    Transfer,
    /// QR code / e-wallet payment.
    #[cfg_attr(feature = "serde", serde(rename = "qris"))]
    QrCode,
    /// Anything the printer does not know by name.
    #[cfg_attr(feature = "serde", serde(other))]
    Other,
}

impl PaymentMethod {
    /// Check if this is a cash payment.
    pub fn is_cash(&self) -> bool {
        matches!(self, Self::Cash)
    }

    /// Label printed in front of the tendered amount.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Card => "Card",
            Self::Transfer => "Transfer",
            Self::QrCode => "QRIS",
            Self::Other => "Paid",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LineItem {
    /// Product name as shown on the receipt.
    pub name: String,
    /// Quantity sold.
    pub qty: f64,
    /// Unit price before discount.
    pub price: f64,
    /// Line total, when the application computed one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub total: Option<f64>,
    /// Per-unit discount.
    #[cfg_attr(feature = "serde", serde(default))]
    pub discount: Option<f64>,
}

impl LineItem {
    /// Create a line item without discount or explicit total.
    pub fn new(name: impl Into<String>, qty: f64, price: f64) -> Self {
        Self {
            name: name.into(),
            qty,
            price,
            total: None,
            discount: None,
        }
    }

    /// Set a per-unit discount.
    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = Some(discount);
        self
    }

    /// Per-unit discount, zero when absent.
    pub fn unit_discount(&self) -> f64 {
        self.discount.unwrap_or(0.0)
    }

    /// The line total: the explicit total if given, otherwise
    /// `qty × (price − discount)`.
    pub fn line_total(&self) -> f64 {
        self.total
            .unwrap_or_else(|| self.qty * (self.price - self.unit_discount()))
    }
}

/// A completed sale, as handed over by the checkout flow.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Transaction {
    /// Transaction number.
    pub id: String,
    /// Local date and time of the sale.
    pub date: NaiveDateTime,
    /// Name of the cashier.
    pub cashier: String,
    /// Customer name, for member sales.
    #[cfg_attr(feature = "serde", serde(default))]
    pub customer_name: Option<String>,
    /// Customer phone number.
    #[cfg_attr(feature = "serde", serde(default))]
    pub customer_phone: Option<String>,
    /// Cart lines.
    pub items: Vec<LineItem>,
    /// Sum of line totals.
    pub subtotal: f64,
    /// Transaction-level discount.
    #[cfg_attr(feature = "serde", serde(default))]
    pub discount: Option<f64>,
    /// Tax amount.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tax: Option<f64>,
    /// Service charge amount.
    #[cfg_attr(feature = "serde", serde(default))]
    pub service_charge: Option<f64>,
    /// Grand total.
    pub total: f64,
    /// How the customer paid.
    pub payment_method: PaymentMethod,
    /// Amount tendered, for any payment method.
    #[cfg_attr(feature = "serde", serde(default))]
    pub amount_paid: Option<f64>,
    /// Cash handed over; takes precedence over `amount_paid` for cash sales.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cash_amount: Option<f64>,
    /// Change returned.
    #[cfg_attr(feature = "serde", serde(default))]
    pub change: Option<f64>,
    /// Loyalty points earned with this sale.
    #[cfg_attr(feature = "serde", serde(default))]
    pub points_earned: Option<i64>,
    /// Customer's running points balance after this sale.
    #[cfg_attr(feature = "serde", serde(default))]
    pub customer_total_points: Option<i64>,
}

impl Transaction {
    /// The amount printed on the tendered line.
    ///
    /// Cash sales prefer the cash amount; everything falls back to the
    /// grand total when nothing was recorded.
    pub fn tendered(&self) -> f64 {
        let recorded = if self.payment_method.is_cash() {
            self.cash_amount.or(self.amount_paid)
        } else {
            self.amount_paid.or(self.cash_amount)
        };
        recorded.unwrap_or(self.total)
    }

    /// Check if the receipt should carry a loyalty block.
    pub fn has_loyalty(&self) -> bool {
        let named = self
            .customer_name
            .as_deref()
            .map(|n| !n.trim().is_empty())
            .unwrap_or(false);
        named
            && (self.points_earned.unwrap_or(0) != 0
                || self.customer_total_points.unwrap_or(0) != 0)
    }

    /// A fixed transaction used for test prints.
    pub fn sample() -> Self {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap_or_default();
        let items = vec![
            LineItem::new("Test Item A", 1.0, 10000.0),
            LineItem::new("Test Item B", 2.0, 5000.0),
        ];
        Self {
            id: "TEST-0001".to_string(),
            date,
            cashier: "Printer Test".to_string(),
            items,
            subtotal: 20000.0,
            total: 20000.0,
            payment_method: PaymentMethod::Cash,
            cash_amount: Some(20000.0),
            ..Default::default()
        }
    }
}
