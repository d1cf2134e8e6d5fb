#[cfg(test)]
mod tests {
    use crate::errors::{Error, Result};
    use crate::products::Product;
    use crate::promotions::{Promotion, PromotionType};
    use crate::sales::{
        CheckoutConfig, CheckoutError, CheckoutJob, CheckoutLine, CheckoutReceipt,
        CheckoutRequest, CheckoutStoreTrait, CheckoutUnitOfWork, LockedProduct, NewSale,
        PaymentMethod, SaleItem, SaleRepositoryTrait, SaleService, SaleServiceTrait, SaleSummary,
        SaleTransaction,
    };
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    // --- In-memory store ---
    // A single async mutex plays the role of the write lock; each job works on
    // a copy of the state that only replaces the original on success.

    #[derive(Clone, Default)]
    struct StoreState {
        customers: HashSet<String>,
        products: HashMap<String, Product>,
        promotions: HashMap<String, Vec<Promotion>>,
        sales: Vec<SaleTransaction>,
        locked: Vec<String>,
    }

    struct InMemoryUnitOfWork<'a> {
        state: &'a mut StoreState,
    }

    impl CheckoutUnitOfWork for InMemoryUnitOfWork<'_> {
        fn customer_exists(&mut self, customer_id: &str) -> Result<bool> {
            Ok(self.state.customers.contains(customer_id))
        }

        fn lock_product(&mut self, product_id: &str) -> Result<Option<LockedProduct>> {
            self.state.locked.push(product_id.to_string());
            Ok(self
                .state
                .products
                .get(product_id)
                .cloned()
                .map(|product| LockedProduct { product }))
        }

        fn set_stock(&mut self, product_id: &str, stock: i32) -> Result<()> {
            assert!(stock >= 0, "stock must never go negative");
            self.state
                .products
                .get_mut(product_id)
                .expect("stock written for unlocked product")
                .stock = stock;
            Ok(())
        }

        fn customer_promotions(&mut self, customer_id: &str) -> Result<Vec<Promotion>> {
            Ok(self
                .state
                .promotions
                .get(customer_id)
                .cloned()
                .unwrap_or_default())
        }

        fn insert_sale(&mut self, sale: NewSale) -> Result<SaleTransaction> {
            let items = sale
                .items
                .into_iter()
                .map(|i| SaleItem {
                    id: i.id,
                    sale_id: sale.id.clone(),
                    product_id: i.product_id,
                    line_no: i.line_no,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    line_total: i.line_total,
                })
                .collect();
            let committed = SaleTransaction {
                id: sale.id,
                customer_id: sale.customer_id,
                operator_id: sale.operator_id,
                gross_total: sale.gross_total,
                discount_amount: sale.discount_amount,
                net_total: sale.net_total,
                payment_method: sale.payment_method,
                notes: sale.notes,
                created_at: sale.created_at,
                items,
            };
            self.state.sales.push(committed.clone());
            Ok(committed)
        }
    }

    #[derive(Default)]
    struct InMemoryStore {
        state: Arc<Mutex<StoreState>>,
    }

    impl InMemoryStore {
        async fn add_customer(&self, id: &str) {
            self.state.lock().await.customers.insert(id.to_string());
        }

        async fn add_product(&self, id: &str, price: Decimal, stock: i32) {
            self.state.lock().await.products.insert(
                id.to_string(),
                Product {
                    id: id.to_string(),
                    sku: format!("SKU-{}", id),
                    name: format!("Product {}", id),
                    price,
                    stock,
                    category: None,
                    unit: "pcs".to_string(),
                },
            );
        }

        async fn set_price(&self, id: &str, price: Decimal) {
            self.state
                .lock()
                .await
                .products
                .get_mut(id)
                .unwrap()
                .price = price;
        }

        async fn attach_promotion(&self, customer_id: &str, promotion_type: PromotionType, value: Decimal) {
            let promotion = Promotion {
                id: format!("promo-{}", customer_id),
                segment_id: "seg-vip".to_string(),
                promotion_type,
                promotion_value: value,
                description: None,
                is_active: true,
                created_at: NaiveDateTime::default(),
                updated_at: NaiveDateTime::default(),
            };
            self.state
                .lock()
                .await
                .promotions
                .entry(customer_id.to_string())
                .or_default()
                .push(promotion);
        }

        async fn stock(&self, id: &str) -> i32 {
            self.state.lock().await.products[id].stock
        }

        async fn sale_count(&self) -> usize {
            self.state.lock().await.sales.len()
        }

        async fn locked_order(&self) -> Vec<String> {
            self.state.lock().await.locked.clone()
        }
    }

    #[async_trait]
    impl CheckoutStoreTrait for InMemoryStore {
        async fn run_checkout(
            &self,
            lock_wait: Duration,
            job: CheckoutJob,
        ) -> Result<CheckoutReceipt> {
            let mut guard = tokio::time::timeout(lock_wait, self.state.lock())
                .await
                .map_err(|_| Error::ConcurrencyConflict("write lock wait exceeded".to_string()))?;
            let mut working = guard.clone();
            working.locked.clear();
            let result = job(&mut InMemoryUnitOfWork {
                state: &mut working,
            });
            if result.is_ok() {
                *guard = working;
            } else {
                // Rolled back; keep only the lock trace for assertions.
                guard.locked = working.locked;
            }
            result
        }
    }

    impl SaleRepositoryTrait for InMemoryStore {
        fn get_by_id(&self, _sale_id: &str) -> Result<SaleTransaction> {
            unimplemented!()
        }

        fn list_by_customer(&self, _customer_id: &str) -> Result<Vec<SaleTransaction>> {
            unimplemented!()
        }

        fn load_sale_summaries(&self) -> Result<Vec<SaleSummary>> {
            unimplemented!()
        }
    }

    fn service(store: Arc<InMemoryStore>) -> SaleService {
        SaleService::new(store.clone(), store, CheckoutConfig::default())
    }

    fn request(customer_id: &str, lines: &[(&str, i32)]) -> CheckoutRequest {
        CheckoutRequest {
            customer_id: customer_id.to_string(),
            items: lines
                .iter()
                .map(|(product_id, quantity)| CheckoutLine {
                    product_id: product_id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
            payment_method: Some("cash".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_vip_percentage_promotion_applied() {
        let store = Arc::new(InMemoryStore::default());
        store.add_customer("vip").await;
        store.add_product("p1", dec!(50), 10).await;
        store.attach_promotion("vip", PromotionType::Percentage, dec!(10)).await;

        let receipt = service(store.clone())
            .checkout(request("vip", &[("p1", 4)]), "cashier-1")
            .await
            .unwrap();

        assert_eq!(receipt.gross_total, dec!(200));
        assert_eq!(receipt.discount_applied, dec!(20));
        assert_eq!(receipt.net_total, dec!(180));
        assert_eq!(receipt.segment_id.as_deref(), Some("seg-vip"));
        assert_eq!(store.stock("p1").await, 6);
        assert_eq!(store.sale_count().await, 1);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_everything_untouched() {
        let store = Arc::new(InMemoryStore::default());
        store.add_customer("c1").await;
        store.add_product("p1", dec!(10), 3).await;

        let err = service(store.clone())
            .checkout(request("c1", &[("p1", 5)]), "cashier-1")
            .await
            .unwrap_err();

        match err {
            Error::Checkout(CheckoutError::InsufficientStock {
                requested,
                available,
                product_name,
                ..
            }) => {
                assert_eq!(requested, 5);
                assert_eq!(available, 3);
                assert_eq!(product_name, "Product p1");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.stock("p1").await, 3);
        assert_eq!(store.sale_count().await, 0);
    }

    #[tokio::test]
    async fn test_new_customer_pays_gross() {
        let store = Arc::new(InMemoryStore::default());
        store.add_customer("fresh").await;
        store.add_product("p1", dec!(12.50), 10).await;

        let receipt = service(store)
            .checkout(request("fresh", &[("p1", 2)]), "cashier-1")
            .await
            .unwrap();

        assert_eq!(receipt.discount_applied, Decimal::ZERO);
        assert_eq!(receipt.net_total, receipt.gross_total);
        assert_eq!(receipt.gross_total, dec!(25.00));
    }

    #[tokio::test]
    async fn test_failure_on_later_line_rolls_back_earlier_decrements() {
        let store = Arc::new(InMemoryStore::default());
        store.add_customer("c1").await;
        store.add_product("a", dec!(5), 10).await;
        store.add_product("b", dec!(5), 1).await;

        let err = service(store.clone())
            .checkout(request("c1", &[("a", 2), ("b", 2)]), "cashier-1")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Checkout(CheckoutError::InsufficientStock { .. })
        ));
        assert_eq!(store.stock("a").await, 10);
        assert_eq!(store.stock("b").await, 1);
    }

    #[tokio::test]
    async fn test_unknown_product_and_customer() {
        let store = Arc::new(InMemoryStore::default());
        store.add_customer("c1").await;
        let svc = service(store.clone());

        let err = svc
            .checkout(request("c1", &[("ghost", 1)]), "cashier-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Checkout(CheckoutError::ProductNotFound { .. })
        ));

        let err = svc
            .checkout(request("nobody", &[("ghost", 1)]), "cashier-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Checkout(CheckoutError::CustomerNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_products_locked_in_ascending_id_order() {
        let store = Arc::new(InMemoryStore::default());
        store.add_customer("c1").await;
        store.add_product("p2", dec!(1), 10).await;
        store.add_product("p1", dec!(1), 10).await;
        store.add_product("p3", dec!(1), 10).await;

        service(store.clone())
            .checkout(request("c1", &[("p3", 1), ("p1", 1), ("p2", 1), ("p1", 1)]), "op")
            .await
            .unwrap();

        assert_eq!(store.locked_order().await, vec!["p1", "p2", "p3"]);
        assert_eq!(store.stock("p1").await, 8);
    }

    #[tokio::test]
    async fn test_duplicate_lines_validated_against_total_quantity() {
        let store = Arc::new(InMemoryStore::default());
        store.add_customer("c1").await;
        store.add_product("p1", dec!(1), 3).await;

        let err = service(store.clone())
            .checkout(request("c1", &[("p1", 2), ("p1", 2)]), "op")
            .await
            .unwrap_err();

        match err {
            Error::Checkout(CheckoutError::InsufficientStock { requested, .. }) => {
                assert_eq!(requested, 4)
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.stock("p1").await, 3);
    }

    #[tokio::test]
    async fn test_items_snapshot_price_at_time_of_sale() {
        let store = Arc::new(InMemoryStore::default());
        store.add_customer("c1").await;
        store.add_product("p1", dec!(7.25), 10).await;
        let svc = service(store.clone());

        let first = svc.checkout(request("c1", &[("p1", 2)]), "op").await.unwrap();
        store.set_price("p1", dec!(9.00)).await;
        let second = svc.checkout(request("c1", &[("p1", 2)]), "op").await.unwrap();

        assert_eq!(first.items[0].unit_price, dec!(7.25));
        assert_eq!(first.items[0].line_total, dec!(14.50));
        assert_eq!(second.items[0].unit_price, dec!(9.00));
        for item in first.items.iter().chain(second.items.iter()) {
            assert_eq!(item.line_total, item.unit_price * Decimal::from(item.quantity));
        }
    }

    #[tokio::test]
    async fn test_fixed_discount_never_exceeds_gross() {
        let store = Arc::new(InMemoryStore::default());
        store.add_customer("c1").await;
        store.add_product("p1", dec!(3), 10).await;
        store.attach_promotion("c1", PromotionType::Fixed, dec!(100)).await;

        let receipt = service(store)
            .checkout(request("c1", &[("p1", 2)]), "op")
            .await
            .unwrap();

        assert_eq!(receipt.discount_applied, dec!(6));
        assert_eq!(receipt.net_total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_invalid_requests_rejected_before_store() {
        let store = Arc::new(InMemoryStore::default());
        let svc = service(store.clone());

        let err = svc.checkout(request("c1", &[]), "op").await.unwrap_err();
        assert!(matches!(err, Error::Checkout(CheckoutError::EmptyCart)));

        let err = svc
            .checkout(request("c1", &[("p1", 0)]), "op")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Checkout(CheckoutError::InvalidQuantity { .. })
        ));

        let mut bad_payment = request("c1", &[("p1", 1)]);
        bad_payment.payment_method = Some("barter".to_string());
        let err = svc.checkout(bad_payment, "op").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Checkout(CheckoutError::UnknownPaymentMethod(_))
        ));

        assert!(store.locked_order().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_payment_method_defaults_to_cash() {
        let store = Arc::new(InMemoryStore::default());
        store.add_customer("c1").await;
        store.add_product("p1", dec!(1), 1).await;

        let mut req = request("c1", &[("p1", 1)]);
        req.payment_method = None;
        service(store.clone()).checkout(req, "op").await.unwrap();

        let state = store.state.lock().await;
        assert_eq!(state.sales[0].payment_method, PaymentMethod::Cash);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_oversell() {
        let store = Arc::new(InMemoryStore::default());
        store.add_product("p1", dec!(10), 3).await;
        for i in 0..10 {
            store.add_customer(&format!("c{}", i)).await;
        }
        let svc = Arc::new(service(store.clone()));

        let mut handles = Vec::new();
        for i in 0..10 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.checkout(request(&format!("c{}", i), &[("p1", 1)]), "op")
                    .await
            }));
        }

        let mut successes = 0;
        let mut stock_failures = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(Error::Checkout(CheckoutError::InsufficientStock { .. })) => {
                    stock_failures += 1
                }
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(successes, 3);
        assert_eq!(stock_failures, 7);
        assert_eq!(store.stock("p1").await, 0);
        assert_eq!(store.sale_count().await, 3);
    }

    #[tokio::test]
    async fn test_lock_wait_exceeded_is_retryable_conflict() {
        let store = Arc::new(InMemoryStore::default());
        store.add_customer("c1").await;
        store.add_product("p1", dec!(1), 5).await;
        let svc = SaleService::new(
            store.clone(),
            store.clone(),
            CheckoutConfig {
                lock_wait_timeout: Duration::from_millis(20),
            },
        );

        let held = store.state.lock().await;
        let err = svc
            .checkout(request("c1", &[("p1", 1)]), "op")
            .await
            .unwrap_err();
        drop(held);

        assert!(matches!(err, Error::ConcurrencyConflict(_)));
        assert!(err.is_retryable());
        assert_eq!(store.stock("p1").await, 5);
    }
}
