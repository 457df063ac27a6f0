//! Store configuration printed in the receipt header and footer.

/// Paper roll width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PaperWidth {
    /// 58 mm roll, 32 characters per line.
    #[default]
    Narrow,
    /// 80 mm roll, 48 characters per line.
    Wide,
}

impl PaperWidth {
    /// Characters per line in the printer's default font.
    pub fn columns(&self) -> usize {
        match self {
            Self::Narrow => 32,
            Self::Wide => 48,
        }
    }
}

/// Store settings owned by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StoreConfig {
    /// Store name, printed bold at the top.
    pub name: String,
    /// Street address.
    #[cfg_attr(feature = "serde", serde(default))]
    pub address: Option<String>,
    /// Contact phone.
    #[cfg_attr(feature = "serde", serde(default))]
    pub phone: Option<String>,
    /// Logo as an `http(s)` URL, a `data:` URI, or a file path.
    #[cfg_attr(feature = "serde", serde(default))]
    pub logo: Option<String>,
    /// Whether the logo should be printed when one is configured.
    #[cfg_attr(feature = "serde", serde(default = "default_print_logo"))]
    pub print_logo: bool,
    /// Extra text under the store details.
    #[cfg_attr(feature = "serde", serde(default))]
    pub receipt_header: Option<String>,
    /// Custom footer; a thank-you line is printed when absent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub receipt_footer: Option<String>,
    /// Paper roll width.
    #[cfg_attr(feature = "serde", serde(default))]
    pub paper_width: PaperWidth,
}

#[cfg(feature = "serde")]
fn default_print_logo() -> bool {
    true
}

impl StoreConfig {
    /// Create a config with only a store name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            phone: None,
            logo: None,
            print_logo: true,
            receipt_header: None,
            receipt_footer: None,
            paper_width: PaperWidth::default(),
        }
    }

    /// The logo source, if one is configured and enabled.
    pub fn logo_to_print(&self) -> Option<&str> {
        if !self.print_logo {
            return None;
        }
        self.logo.as_deref().filter(|l| !l.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_columns() {
        assert_eq!(PaperWidth::Narrow.columns(), 32);
        assert_eq!(PaperWidth::Wide.columns(), 48);
    }

    #[test]
    fn test_logo_to_print() {
        let mut store = StoreConfig::new("Shop");
        assert_eq!(store.logo_to_print(), None);

        store.logo = Some("https://example.com/logo.png".to_string());
        assert_eq!(store.logo_to_print(), Some("https://example.com/logo.png"));

        store.print_logo = false;
        assert_eq!(store.logo_to_print(), None);

        store.print_logo = true;
        store.logo = Some("  ".to_string());
        assert_eq!(store.logo_to_print(), None);
    }
}
