use storefront_catalogue::Catalogue;
use storefront_config::Settings;
use storefront_offer::RangeBook;
use storefront_partner::StockBook;

/// Everything the dashboard reads and writes.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub catalogue: Catalogue,
    pub stock: StockBook,
    pub ranges: RangeBook,
    pub settings: Settings,
}

impl Store {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }
}
