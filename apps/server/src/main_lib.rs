use std::sync::Arc;

use crate::config::Config;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use retailpos_core::{
    promotions::{PromotionService, PromotionServiceTrait},
    sales::{CheckoutConfig, SaleService, SaleServiceTrait},
    segmentation::{SegmentationConfig, SegmentationService, SegmentationServiceTrait},
};
use retailpos_storage_sqlite::{
    customers::CustomerRepository,
    db::{self, write_actor},
    promotions::PromotionRepository,
    sales::SaleRepository,
    segmentation::SegmentationRepository,
};

pub struct AppState {
    pub sale_service: Arc<dyn SaleServiceTrait + Send + Sync>,
    pub segmentation_service: Arc<dyn SegmentationServiceTrait + Send + Sync>,
    pub promotion_service: Arc<dyn PromotionServiceTrait + Send + Sync>,
    pub default_operator_id: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("RP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // `init` also forwards `log` records from the library crates.
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let customer_repository = Arc::new(CustomerRepository::new(pool.clone(), writer.clone()));
    let promotion_repository = Arc::new(PromotionRepository::new(pool.clone(), writer.clone()));
    let sale_repository = Arc::new(SaleRepository::new(pool.clone(), writer.clone()));
    let segmentation_repository =
        Arc::new(SegmentationRepository::new(pool.clone(), writer.clone()));

    let sale_service = Arc::new(SaleService::new(
        sale_repository.clone(),
        sale_repository.clone(),
        CheckoutConfig {
            lock_wait_timeout: config.lock_wait,
        },
    ));

    let segmentation_config = SegmentationConfig {
        default_clusters: config.default_clusters,
        random_seed: config.kmeans_seed,
        recency_reference: config.recency_reference,
        ..SegmentationConfig::default()
    };
    let segmentation_service = Arc::new(SegmentationService::new(
        segmentation_repository,
        sale_repository,
        segmentation_config,
    ));

    let promotion_service = Arc::new(PromotionService::new(
        promotion_repository,
        customer_repository,
    ));

    Ok(Arc::new(AppState {
        sale_service,
        segmentation_service,
        promotion_service,
        default_operator_id: config.default_operator_id.clone(),
    }))
}
