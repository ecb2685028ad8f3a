use crate::core::pool::OneShot;
use crate::schema::item::ShopListing;

/// Shop stock. Each listing sells once per session.
#[derive(Debug, Clone)]
pub struct Shop {
    listings: OneShot<ShopListing>,
}

impl Shop {
    pub fn new(listings: Vec<ShopListing>) -> Self {
        Self {
            listings: OneShot::new(listings),
        }
    }

    /// Listings still for sale, in catalog order.
    pub fn available(&self) -> &[ShopListing] {
        self.listings.available()
    }

    pub fn sold(&self) -> &[ShopListing] {
        self.listings.consumed()
    }

    pub fn listing(&self, id: &str) -> Option<&ShopListing> {
        self.listings.get(id)
    }

    /// Mark a listing as sold. Returns `None` if it isn't for sale.
    pub fn mark_sold(&mut self, id: &str) -> Option<ShopListing> {
        self.listings.take(id)
    }

    pub fn reset(&mut self) {
        self.listings.reset();
    }
}
