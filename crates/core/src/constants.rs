/// Decimal places used for every monetary amount.
pub const MONEY_DECIMAL_PRECISION: u32 = 2;

/// Name of the reserved segment holding customers with no transactions.
pub const NEW_CUSTOMER_SEGMENT_NAME: &str = "New Customer";

/// Color of the reserved segment.
pub const NEW_CUSTOMER_SEGMENT_COLOR: &str = "#17a2b8";

/// Description of the reserved segment.
pub const NEW_CUSTOMER_SEGMENT_DESCRIPTION: &str = "Customers with no recorded transactions yet.";

/// Default segment names by cluster rank (0 = highest average spend).
pub const DEFAULT_SEGMENT_NAMES: [&str; 4] = ["VIP", "Frequent Buyer", "Occasional Shopper", "At Risk"];

/// Default segment colors by cluster rank.
pub const DEFAULT_SEGMENT_COLORS: [&str; 4] = ["#28a745", "#007bff", "#ffc107", "#6c757d"];

/// Color for ranks beyond the default table.
pub const FALLBACK_SEGMENT_COLOR: &str = "#6c757d";

/// Default number of clusters requested from the engine.
pub const DEFAULT_CLUSTER_COUNT: usize = 3;

/// Fixed seed so repeated runs over the same data produce the same clusters.
pub const DEFAULT_KMEANS_SEED: u64 = 42;

