//! # Menu Catalog
//!
//! The immutable menu: built once at startup, read everywhere, never
//! mutated at runtime. Availability is a catalog flag, not live inventory;
//! there is no stock tracking in this system.

use std::collections::BTreeSet;

use crate::error::{CoreError, CoreResult};
use crate::types::{MenuCategory, MenuItem};

/// The fixed list of menu items for a venue.
#[derive(Debug, Clone)]
pub struct MenuCatalog {
    items: Vec<MenuItem>,
}

impl MenuCatalog {
    /// Builds a catalog from a fixed item list.
    pub fn new(items: Vec<MenuItem>) -> Self {
        MenuCatalog { items }
    }

    /// All catalog entries, available or not.
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Looks up an item by id.
    pub fn get(&self, id: &str) -> Option<&MenuItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Looks up an item, requiring it to exist and be available.
    ///
    /// This is the check the order store runs before snapshotting an item
    /// onto an order.
    pub fn get_available(&self, id: &str) -> CoreResult<&MenuItem> {
        let item = self
            .get(id)
            .ok_or_else(|| CoreError::MenuItemNotFound(id.to_string()))?;
        if !item.available {
            return Err(CoreError::MenuItemUnavailable(id.to_string()));
        }
        Ok(item)
    }

    /// Items in a menu section, unavailable entries included (the UI greys
    /// them out rather than hiding them).
    pub fn by_category(&self, category: MenuCategory) -> Vec<&MenuItem> {
        self.items.iter().filter(|i| i.category == category).collect()
    }

    /// Only the currently orderable items.
    pub fn available(&self) -> Vec<&MenuItem> {
        self.items.iter().filter(|i| i.available).collect()
    }

    /// Prep minutes for an item id, if it exists.
    pub fn prep_minutes(&self, id: &str) -> Option<u32> {
        self.get(id).map(|i| i.prep_minutes)
    }

    /// A small demo menu for development and tests.
    pub fn sample() -> Self {
        fn allergens(list: &[&str]) -> BTreeSet<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        fn tags(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }

        MenuCatalog::new(vec![
            MenuItem {
                id: "bruschetta".to_string(),
                name: "Bruschetta al Pomodoro".to_string(),
                description: "Grilled bread, marinated tomatoes, basil".to_string(),
                price_cents: 650,
                category: MenuCategory::Starters,
                prep_minutes: 10,
                allergens: allergens(&["gluten"]),
                dietary_tags: tags(&["vegetarian", "vegan"]),
                available: true,
            },
            MenuItem {
                id: "burrata".to_string(),
                name: "Burrata & Heritage Tomatoes".to_string(),
                description: "Creamy burrata, basil oil, sourdough crisp".to_string(),
                price_cents: 950,
                category: MenuCategory::Starters,
                prep_minutes: 8,
                allergens: allergens(&["dairy", "gluten"]),
                dietary_tags: tags(&["vegetarian"]),
                available: true,
            },
            MenuItem {
                id: "margherita".to_string(),
                name: "Pizza Margherita".to_string(),
                description: "San Marzano tomato, fior di latte, basil".to_string(),
                price_cents: 1250,
                category: MenuCategory::Mains,
                prep_minutes: 18,
                allergens: allergens(&["gluten", "dairy"]),
                dietary_tags: tags(&["vegetarian"]),
                available: true,
            },
            MenuItem {
                id: "carbonara".to_string(),
                name: "Spaghetti Carbonara".to_string(),
                description: "Guanciale, pecorino, egg yolk".to_string(),
                price_cents: 1400,
                category: MenuCategory::Mains,
                prep_minutes: 15,
                allergens: allergens(&["gluten", "egg", "dairy"]),
                dietary_tags: Vec::new(),
                available: true,
            },
            MenuItem {
                id: "risotto-funghi".to_string(),
                name: "Risotto ai Funghi".to_string(),
                description: "Porcini, parmesan, white wine".to_string(),
                price_cents: 1600,
                category: MenuCategory::Mains,
                prep_minutes: 25,
                allergens: allergens(&["dairy"]),
                dietary_tags: tags(&["vegetarian", "gluten-free"]),
                available: true,
            },
            MenuItem {
                id: "branzino".to_string(),
                name: "Whole Roasted Branzino".to_string(),
                description: "Lemon, capers, salsa verde".to_string(),
                price_cents: 2250,
                category: MenuCategory::Mains,
                prep_minutes: 30,
                allergens: allergens(&["fish"]),
                dietary_tags: tags(&["gluten-free"]),
                // 86'd tonight - the availability flag in action
                available: false,
            },
            MenuItem {
                id: "fries".to_string(),
                name: "Rosemary Fries".to_string(),
                description: "Double-cooked, sea salt".to_string(),
                price_cents: 450,
                category: MenuCategory::Sides,
                prep_minutes: 12,
                allergens: BTreeSet::new(),
                dietary_tags: tags(&["vegan", "gluten-free"]),
                available: true,
            },
            MenuItem {
                id: "tiramisu".to_string(),
                name: "Tiramisù".to_string(),
                description: "Espresso-soaked savoiardi, mascarpone".to_string(),
                price_cents: 700,
                category: MenuCategory::Desserts,
                prep_minutes: 5,
                allergens: allergens(&["gluten", "egg", "dairy"]),
                dietary_tags: tags(&["vegetarian"]),
                available: true,
            },
            MenuItem {
                id: "house-red".to_string(),
                name: "House Red (glass)".to_string(),
                description: "Montepulciano d'Abruzzo".to_string(),
                price_cents: 550,
                category: MenuCategory::Drinks,
                prep_minutes: 2,
                allergens: allergens(&["sulphites"]),
                dietary_tags: tags(&["vegan"]),
                available: true,
            },
            MenuItem {
                id: "sparkling-water".to_string(),
                name: "Sparkling Water 750ml".to_string(),
                description: "San Pellegrino".to_string(),
                price_cents: 300,
                category: MenuCategory::Drinks,
                prep_minutes: 1,
                allergens: BTreeSet::new(),
                dietary_tags: tags(&["vegan", "gluten-free"]),
                available: true,
            },
        ])
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog_lookup() {
        let catalog = MenuCatalog::sample();
        let pizza = catalog.get("margherita").expect("sample has margherita");
        assert_eq!(pizza.price_cents, 1250);
        assert_eq!(pizza.category, MenuCategory::Mains);
        assert!(catalog.get("nonexistent").is_none());
    }

    #[test]
    fn test_get_available_rejects_86d_items() {
        let catalog = MenuCatalog::sample();
        assert!(catalog.get_available("margherita").is_ok());
        assert!(matches!(
            catalog.get_available("branzino"),
            Err(CoreError::MenuItemUnavailable(_))
        ));
        assert!(matches!(
            catalog.get_available("nonexistent"),
            Err(CoreError::MenuItemNotFound(_))
        ));
    }

    #[test]
    fn test_by_category_includes_unavailable() {
        let catalog = MenuCatalog::sample();
        let mains = catalog.by_category(MenuCategory::Mains);
        assert!(mains.iter().any(|i| i.id == "branzino"));
        assert!(catalog.available().iter().all(|i| i.available));
    }

    #[test]
    fn test_prep_minutes() {
        let catalog = MenuCatalog::sample();
        assert_eq!(catalog.prep_minutes("risotto-funghi"), Some(25));
        assert_eq!(catalog.prep_minutes("nonexistent"), None);
    }
}
