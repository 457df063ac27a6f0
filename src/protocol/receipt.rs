//! Receipt layout.
//!
//! Lays a [`PrintJob`] out as fixed-width text interleaved with ESC/POS
//! alignment and emphasis commands. The layout is deterministic: the same
//! job always produces the same bytes.

use crate::data::{PaperWidth, PrintJob, Transaction};
use crate::protocol::commands::{Align, CommandStream};
use crate::utils::{format_amount, format_quantity, sanitize_text, CurrencyFormat};

/// Footer printed when the store has none configured.
pub const DEFAULT_FOOTER: &str = "Thank you for your purchase!";

/// Character used for divider rules.
pub const DIVIDER_CHAR: char = '-';

/// Date format for the transaction line.
const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Fixed-width receipt layout for one paper size.
#[derive(Debug, Clone, Copy)]
pub struct ReceiptLayout {
    columns: usize,
    currency: CurrencyFormat,
}

impl ReceiptLayout {
    /// Create a layout for a paper width.
    pub fn new(paper: PaperWidth, currency: CurrencyFormat) -> Self {
        Self {
            columns: paper.columns(),
            currency,
        }
    }

    /// Characters per line.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// A full-width divider rule.
    pub fn divider(&self) -> String {
        std::iter::repeat(DIVIDER_CHAR).take(self.columns).collect()
    }

    /// Format an amount with this layout's currency settings.
    pub fn amount(&self, value: f64) -> String {
        format_amount(value, &self.currency)
    }

    /// Name on the left, total flush right.
    ///
    /// A name that would leave less than one space before the total is cut
    /// to `columns - len(total) - 1` characters, without an ellipsis. When
    /// the total leaves no room for the name at all, the name goes on its
    /// own line above the right-aligned total. Amounts are never cut.
    pub fn item_line(&self, name: &str, total: &str) -> String {
        let total_len = total.chars().count();
        let name_len = name.chars().count();

        if total_len + 1 >= self.columns {
            let total_line = format!("{:>width$}", total, width = self.columns);
            if name_len == 0 {
                return total_line;
            }
            let name: String = name.chars().take(self.columns).collect();
            return format!("{}\n{}", name, total_line);
        }

        let name: String = if name_len + 1 + total_len > self.columns {
            name.chars()
                .take(self.columns.saturating_sub(total_len + 1))
                .collect()
        } else {
            name.to_string()
        };

        let padding = self
            .columns
            .saturating_sub(name.chars().count() + total_len)
            .max(1);
        format!("{}{}{}", name, " ".repeat(padding), total)
    }

    /// Render the receipt body: everything between the drawer kick and the cut.
    ///
    /// The stream starts with `ESC @` and leaves the printer left-aligned.
    pub fn render(&self, job: PrintJob<'_>) -> CommandStream {
        let mut out = CommandStream::new();
        out.init();

        self.header(&mut out, job);
        self.transaction_info(&mut out, job.transaction);

        out.line(&self.divider());
        self.items(&mut out, job.transaction);
        out.line(&self.divider());

        self.totals(&mut out, job.transaction);
        self.loyalty(&mut out, job.transaction);
        self.footer(&mut out, job);

        out.align(Align::Left);
        out
    }

    fn header(&self, out: &mut CommandStream, job: PrintJob<'_>) {
        let store = job.store;
        out.align(Align::Center)
            .bold_line(&sanitize_text(&store.name));

        for text in [&store.address, &store.phone, &store.receipt_header]
            .into_iter()
            .flatten()
        {
            for line in text.lines().filter(|l| !l.trim().is_empty()) {
                out.line(&sanitize_text(line));
            }
        }

        out.blank().align(Align::Left);
    }

    fn transaction_info(&self, out: &mut CommandStream, tx: &Transaction) {
        out.line(&format!("Date: {}", tx.date.format(DATE_FORMAT)));
        out.line(&format!("Cashier: {}", sanitize_text(&tx.cashier)));
        out.line(&format!("No: {}", sanitize_text(&tx.id)));

        if let Some(name) = tx.customer_name.as_deref().filter(|n| !n.trim().is_empty()) {
            out.line(&format!("Customer: {}", sanitize_text(name)));
        }
        if let Some(phone) = tx.customer_phone.as_deref().filter(|p| !p.trim().is_empty()) {
            out.line(&format!("Phone: {}", sanitize_text(phone)));
        }
    }

    fn items(&self, out: &mut CommandStream, tx: &Transaction) {
        for item in &tx.items {
            let total = self.amount(item.line_total());
            out.line(&self.item_line(&sanitize_text(&item.name), &total));
            out.line(&format!(
                "{} x {}",
                format_quantity(item.qty),
                self.amount(item.price)
            ));

            let discount = item.unit_discount();
            if discount > 0.0 {
                out.line(&format!("  Disc -{}", self.amount(discount)));
            }
        }
    }

    fn totals(&self, out: &mut CommandStream, tx: &Transaction) {
        out.align(Align::Right);
        out.line(&format!("Subtotal: {}", self.amount(tx.subtotal)));

        let optional = [
            ("Discount", tx.discount, "-"),
            ("Tax", tx.tax, ""),
            ("Service", tx.service_charge, ""),
        ];
        for (label, value, sign) in optional {
            if let Some(value) = value.filter(|v| *v > 0.0) {
                out.line(&format!("{}: {}{}", label, sign, self.amount(value)));
            }
        }

        out.bold_line(&format!("TOTAL: {}", self.amount(tx.total)));
        out.line(&format!(
            "{}: {}",
            tx.payment_method.label(),
            self.amount(tx.tendered())
        ));

        if tx.payment_method.is_cash() {
            if let Some(change) = tx.change.filter(|c| *c > 0.0) {
                out.line(&format!("Change: {}", self.amount(change)));
            }
        }
        out.align(Align::Left);
    }

    fn loyalty(&self, out: &mut CommandStream, tx: &Transaction) {
        if !tx.has_loyalty() {
            return;
        }
        out.align(Align::Center);
        out.line(&self.divider());
        out.line(&format!("Points earned: +{}", tx.points_earned.unwrap_or(0)));
        out.line(&format!(
            "Total points: {}",
            tx.customer_total_points.unwrap_or(0)
        ));
        out.align(Align::Left);
    }

    fn footer(&self, out: &mut CommandStream, job: PrintJob<'_>) {
        out.align(Align::Center).blank();
        let footer = job
            .store
            .receipt_footer
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(DEFAULT_FOOTER);
        for line in footer.lines() {
            out.line(&sanitize_text(line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{LineItem, PaymentMethod, StoreConfig};
    use crate::protocol::commands::{bold, LF};
    use pretty_assertions::assert_eq;

    /// Text lines of a stream with every ESC/GS command removed.
    fn text_lines(bytes: &[u8]) -> Vec<String> {
        crate::protocol::transcript::plain_text(bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn two_item_sale() -> Transaction {
        let mut tx = Transaction::sample();
        tx.id = "TRX-42".to_string();
        tx.items = vec![
            LineItem::new("Extra Large Caramel Macchiato With Oat Milk", 3.0, 45000.0)
                .with_discount(5000.0),
            LineItem::new("Croissant", 1.0, 25000.0),
        ];
        tx.subtotal = 145000.0;
        tx.total = 145000.0;
        tx.cash_amount = Some(150000.0);
        tx.change = Some(5000.0);
        tx
    }

    #[test]
    fn test_item_line_right_aligns_total() {
        let layout = ReceiptLayout::new(PaperWidth::Narrow, CurrencyFormat::default());
        let line = layout.item_line("Croissant", "25.000");
        assert_eq!(line.len(), 32);
        assert!(line.starts_with("Croissant "));
        assert!(line.ends_with(" 25.000"));
    }

    #[test]
    fn test_item_line_truncates_long_name() {
        let layout = ReceiptLayout::new(PaperWidth::Narrow, CurrencyFormat::default());
        let line = layout.item_line("Extra Large Caramel Macchiato With Oat Milk", "120.000");
        assert_eq!(line, "Extra Large Caramel Macc 120.000");
        assert_eq!(line.len(), 32);
    }

    #[test]
    fn test_item_line_wraps_when_total_fills_line() {
        let layout = ReceiptLayout::new(PaperWidth::Narrow, CurrencyFormat::default());
        let total = "1".repeat(31);
        let line = layout.item_line("Espresso", &total);

        assert_eq!(line, format!("Espresso\n {}", total));
        assert!(line.lines().all(|l| l.chars().count() <= 32));

        let name = "N".repeat(40);
        let line = layout.item_line(&name, &"9".repeat(32));
        assert_eq!(line.lines().next(), Some("N".repeat(32).as_str()));
        assert!(line.lines().all(|l| l.chars().count() <= 32));
    }

    #[test]
    fn test_two_item_narrow_receipt() {
        let store = StoreConfig::new("Corner Cafe");
        let tx = two_item_sale();
        let layout = ReceiptLayout::new(PaperWidth::Narrow, CurrencyFormat::default());
        let bytes = layout.render(PrintJob::new(&tx, &store)).freeze();
        let lines = text_lines(&bytes);

        let divider = "-".repeat(32);
        assert_eq!(lines.iter().filter(|l| **l == divider).count(), 2);

        let first = lines.iter().position(|l| *l == divider).unwrap();
        let last = lines.iter().rposition(|l| *l == divider).unwrap();
        let body = &lines[first + 1..last];
        assert_eq!(
            body,
            &[
                "Extra Large Caramel Macc 120.000".to_string(),
                "3 x 45.000".to_string(),
                "  Disc -5.000".to_string(),
                format!("Croissant{}25.000", " ".repeat(17)),
                "1 x 25.000".to_string(),
            ]
        );

        let name = body[0].rsplit_once(' ').unwrap().0;
        assert!(name.len() <= 32 - "120.000".len() - 1);

        let mut bold_total = bold(true).to_vec();
        bold_total.extend_from_slice(b"TOTAL: 145.000");
        bold_total.push(LF);
        bold_total.extend_from_slice(&bold(false));
        assert!(bytes.windows(bold_total.len()).any(|w| w == bold_total.as_slice()));

        assert!(lines.contains(&"Change: 5.000".to_string()));
        assert!(lines.contains(&DEFAULT_FOOTER.to_string()));
    }

    #[test]
    fn test_optional_totals_only_when_positive() {
        let store = StoreConfig::new("Shop");
        let mut tx = Transaction::sample();
        tx.discount = Some(0.0);
        tx.tax = Some(1100.0);
        tx.payment_method = PaymentMethod::Card;
        tx.change = Some(500.0);
        let layout = ReceiptLayout::new(PaperWidth::Wide, CurrencyFormat::default());
        let lines = text_lines(&layout.render(PrintJob::new(&tx, &store)).freeze());

        assert!(!lines.iter().any(|l| l.starts_with("Discount")));
        assert!(lines.contains(&"Tax: 1.100".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("Service")));
        assert!(lines.contains(&"Card: 20.000".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("Change")));
    }

    #[test]
    fn test_header_footer_and_loyalty() {
        let mut store = StoreConfig::new("Corner Cafe");
        store.address = Some("Jl. Merdeka 1".to_string());
        store.phone = Some("0812".to_string());
        store.receipt_header = Some("Open daily".to_string());
        store.receipt_footer = Some("See you soon".to_string());

        let mut tx = Transaction::sample();
        tx.customer_name = Some("Budi".to_string());
        tx.points_earned = Some(20);
        tx.customer_total_points = Some(340);

        let layout = ReceiptLayout::new(PaperWidth::Narrow, CurrencyFormat::default());
        let bytes = layout.render(PrintJob::new(&tx, &store)).freeze();
        let lines = text_lines(&bytes);

        assert_eq!(
            &lines[..5],
            &["Corner Cafe", "Jl. Merdeka 1", "0812", "Open daily", ""]
        );
        assert!(lines.contains(&"Customer: Budi".to_string()));
        assert!(lines.contains(&"Points earned: +20".to_string()));
        assert!(lines.contains(&"Total points: 340".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("See you soon"));
        assert_eq!(&bytes[..2], &[0x1B, 0x40]);
    }
}
