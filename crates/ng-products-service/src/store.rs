//! Product persistence.

use parking_lot::RwLock;
use shared_types::{NewProduct, PageRequest, PageResult, Product, ProductPatch};
use std::collections::BTreeMap;

/// Storage seam for the products responder.
///
/// Listing is ordered by product id; ids are assigned by the store and never
/// reused within its lifetime.
pub trait ProductStore: Send + Sync {
    fn create(&self, new: NewProduct) -> Product;

    fn list(&self, request: PageRequest) -> PageResult<Product>;

    fn find(&self, id: u64) -> Option<Product>;

    /// Applies the patch and returns the updated record, or `None` when the
    /// id is unknown.
    fn update(&self, id: u64, patch: &ProductPatch) -> Option<Product>;

    fn len(&self) -> usize;
}

struct ProductsInner {
    // BTreeMap keeps listing ordered by id without a sort on every page.
    products: BTreeMap<u64, Product>,
    next_id: u64,
}

/// Process-local product store.
pub struct InMemoryProductStore {
    inner: RwLock<ProductsInner>,
}

impl InMemoryProductStore {
    /// An empty store; ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ProductsInner {
                products: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// A store preloaded with a small demo catalog.
    #[must_use]
    pub fn seeded() -> Self {
        let store = Self::new();
        for (name, price, stock) in [
            ("Chai", 18.0, 39),
            ("Chang", 19.0, 17),
            ("Aniseed Syrup", 10.0, 13),
            ("Chef Anton's Cajun Seasoning", 22.0, 53),
            ("Grandma's Boysenberry Spread", 25.0, 120),
            ("Uncle Bob's Organic Dried Pears", 30.0, 15),
            ("Northwoods Cranberry Sauce", 40.0, 6),
            ("Mishi Kobe Niku", 97.0, 29),
        ] {
            store.create(NewProduct {
                product_name: name.to_string(),
                unit_price: price,
                units_in_stock: stock,
            });
        }
        store
    }
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductStore for InMemoryProductStore {
    fn create(&self, new: NewProduct) -> Product {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;

        let product = Product {
            product_id: id,
            product_name: new.product_name,
            unit_price: new.unit_price,
            units_in_stock: new.units_in_stock,
        };
        inner.products.insert(id, product.clone());
        product
    }

    fn list(&self, request: PageRequest) -> PageResult<Product> {
        let request = request.normalized();
        let inner = self.inner.read();
        let data: Vec<Product> = inner
            .products
            .values()
            .skip(request.offset())
            .take(request.limit as usize)
            .cloned()
            .collect();
        PageResult::new(data, inner.products.len() as u64, request)
    }

    fn find(&self, id: u64) -> Option<Product> {
        self.inner.read().products.get(&id).cloned()
    }

    fn update(&self, id: u64, patch: &ProductPatch) -> Option<Product> {
        let mut inner = self.inner.write();
        let product = inner.products.get_mut(&id)?;
        product.apply(patch);
        Some(product.clone())
    }

    fn len(&self) -> usize {
        self.inner.read().products.len()
    }
}
