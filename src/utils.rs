//! Utility functions for the thermal-printer-ble crate.

/// Number formatting used for amounts printed on a receipt.
///
/// No currency symbol is ever emitted; only grouping and fraction digits
/// are controlled here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyFormat {
    /// Separator inserted between groups of three integer digits.
    pub thousands_separator: char,
    /// Separator between the integer and fraction parts.
    pub decimal_separator: char,
    /// Number of fraction digits to print (0 for whole-unit currencies).
    ///
    /// Clamped to [`MAX_FRACTION_DIGITS`].
    pub fraction_digits: u8,
}

impl CurrencyFormat {
    /// Whole units grouped with dots, e.g. `1.250.000`.
    pub const DOT_GROUPED: Self = Self {
        thousands_separator: '.',
        decimal_separator: ',',
        fraction_digits: 0,
    };

    /// Two fraction digits grouped with commas, e.g. `1,250.00`.
    pub const COMMA_GROUPED: Self = Self {
        thousands_separator: ',',
        decimal_separator: '.',
        fraction_digits: 2,
    };
}

/// Most fraction digits [`format_amount`] prints. Larger settings are clamped.
pub const MAX_FRACTION_DIGITS: u8 = 9;

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::DOT_GROUPED
    }
}

/// Format an amount with thousands separators.
///
/// # Arguments
///
/// * `amount` - The value to format
/// * `format` - Grouping and fraction settings
///
/// # Example
///
/// ```
/// use thermal_printer_ble::utils::{format_amount, CurrencyFormat};
///
/// assert_eq!(format_amount(1_250_000.0, &CurrencyFormat::DOT_GROUPED), "1.250.000");
/// assert_eq!(format_amount(-1234.5, &CurrencyFormat::COMMA_GROUPED), "-1,234.50");
/// ```
pub fn format_amount(amount: f64, format: &CurrencyFormat) -> String {
    let fraction_digits = format.fraction_digits.min(MAX_FRACTION_DIGITS);
    let scale = 10u64.pow(u32::from(fraction_digits));
    let scaled = (amount.abs() * scale as f64).round() as u64;
    let integer = scaled / scale;
    let fraction = scaled % scale;

    let digits = integer.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(format.thousands_separator);
        }
        grouped.push(digit);
    }

    if fraction_digits > 0 {
        grouped.push(format.decimal_separator);
        grouped.push_str(&format!(
            "{:0width$}",
            fraction,
            width = usize::from(fraction_digits)
        ));
    }

    if amount < 0.0 && scaled != 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Replace characters the printer's ASCII code page cannot render with `?`.
///
/// Control characters are dropped entirely so user data can never smuggle
/// an ESC/POS command into the stream.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}

/// Format a quantity without a trailing `.0` for whole numbers.
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        format!("{}", quantity)
    }
}
