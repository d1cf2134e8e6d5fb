use thiserror::Error;

/// Reasons a checkout aborts. Every variant leaves stock and sales untouched.
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: i32 },

    #[error("Customer {customer_id} not found")]
    CustomerNotFound { customer_id: String },

    #[error("Product {product_id} not found")]
    ProductNotFound { product_id: String },

    #[error("Insufficient stock for {product_name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        product_name: String,
        requested: i64,
        available: i32,
    },

    #[error("Unknown payment method '{0}'")]
    UnknownPaymentMethod(String),
}
