use async_trait::async_trait;
use diesel::dsl::{count_star, exists, not};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use retailpos_core::errors::Error;
use retailpos_core::promotions::Promotion;
use retailpos_core::segmentation::{
    reconcile_segments, reserved_segment_definition, AppliedSegment, AppliedSegmentation,
    CustomerSegment, MembershipBatch, RunStatus, SegmentAction, SegmentStats,
    SegmentationError, SegmentationRepositoryTrait, SegmentationRun,
};
use retailpos_core::utils::time_utils::now_utc;
use retailpos_core::Result;

use super::model::{CustomerSegmentDB, MembershipDB, SegmentationRunDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::promotions::PromotionDB;
use crate::schema::{
    customer_segment_memberships, customer_segments, customers, promotions, sales,
    segmentation_runs,
};
use crate::utils::chunk_rows_for_sqlite;

pub struct SegmentationRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SegmentationRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        SegmentationRepository { pool, writer }
    }
}

fn active_run(conn: &mut SqliteConnection) -> Result<Option<SegmentationRunDB>> {
    Ok(segmentation_runs::table
        .filter(segmentation_runs::status.eq(RunStatus::Running.as_str()))
        .order(segmentation_runs::started_at.asc())
        .select(SegmentationRunDB::as_select())
        .first(conn)
        .optional()
        .map_err(StorageError::from)?)
}

fn run_conflict(run: SegmentationRunDB) -> Error {
    SegmentationError::RunConflict {
        run_id: run.id,
        started_at: run.started_at,
    }
    .into()
}

fn insert_segment(
    conn: &mut SqliteConnection,
    name: &str,
    color: &str,
    description: &str,
    is_reserved: bool,
) -> Result<CustomerSegmentDB> {
    let now = now_utc();
    let row = CustomerSegmentDB {
        id: Uuid::new_v4().to_string(),
        segment_name: name.to_string(),
        description: Some(description.to_string()),
        color: color.to_string(),
        is_reserved,
        created_at: now,
        updated_at: now,
    };
    Ok(diesel::insert_into(customer_segments::table)
        .values(&row)
        .returning(CustomerSegmentDB::as_returning())
        .get_result(conn)
        .map_err(StorageError::from)?)
}

/// Applies one reconcile action and returns the segment it resolved to.
fn apply_action(
    conn: &mut SqliteConnection,
    action: &SegmentAction,
) -> Result<CustomerSegmentDB> {
    let now = now_utc();
    let row = match action {
        SegmentAction::Reuse {
            segment_id,
            description,
            ..
        } => diesel::update(customer_segments::table.find(segment_id))
            .set((
                customer_segments::description.eq(Some(description.as_str())),
                customer_segments::updated_at.eq(now),
            ))
            .returning(CustomerSegmentDB::as_returning())
            .get_result(conn)
            .map_err(StorageError::from)?,
        SegmentAction::Rename {
            segment_id,
            name,
            color,
            description,
            ..
        } => diesel::update(customer_segments::table.find(segment_id))
            .set((
                customer_segments::segment_name.eq(name.as_str()),
                customer_segments::color.eq(color.as_str()),
                customer_segments::description.eq(Some(description.as_str())),
                customer_segments::updated_at.eq(now),
            ))
            .returning(CustomerSegmentDB::as_returning())
            .get_result(conn)
            .map_err(StorageError::from)?,
        SegmentAction::Create {
            name,
            color,
            description,
            ..
        } => insert_segment(conn, name, color, description, false)?,
    };
    Ok(row)
}

fn insert_memberships(conn: &mut SqliteConnection, rows: &[MembershipDB]) -> Result<()> {
    for chunk in chunk_rows_for_sqlite(rows, 5) {
        diesel::insert_into(customer_segment_memberships::table)
            .values(chunk)
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(())
}

fn membership_rows(
    customer_ids: &[String],
    segment_id: &str,
    run_id: &str,
    assigned_at: chrono::NaiveDateTime,
) -> Vec<MembershipDB> {
    customer_ids
        .iter()
        .map(|customer_id| MembershipDB {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.clone(),
            segment_id: segment_id.to_string(),
            run_id: Some(run_id.to_string()),
            assigned_at,
        })
        .collect()
}

#[async_trait]
impl SegmentationRepositoryTrait for SegmentationRepository {
    async fn begin_run(
        &self,
        requested_clusters: usize,
        stale_after: Duration,
    ) -> Result<SegmentationRun> {
        let stale_after = chrono::Duration::from_std(stale_after)
            .map_err(|e| Error::Unexpected(format!("Invalid stale-run threshold: {}", e)))?;
        let requested_clusters = i32::try_from(requested_clusters).map_err(|_| {
            Error::from(SegmentationError::InvalidClusterCount(requested_clusters))
        })?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SegmentationRun> {
                let now = now_utc();
                let abandoned = diesel::update(
                    segmentation_runs::table
                        .filter(segmentation_runs::status.eq(RunStatus::Running.as_str()))
                        .filter(segmentation_runs::started_at.lt(now - stale_after)),
                )
                .set((
                    segmentation_runs::status.eq(RunStatus::Failed.as_str()),
                    segmentation_runs::error.eq(Some("abandoned: exceeded stale-run threshold")),
                    segmentation_runs::finished_at.eq(Some(now)),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                if abandoned > 0 {
                    warn!("Marked {} abandoned segmentation run(s) as failed", abandoned);
                }

                if let Some(active) = active_run(conn)? {
                    return Err(run_conflict(active));
                }

                let row = SegmentationRunDB {
                    id: Uuid::new_v4().to_string(),
                    status: RunStatus::Running.as_str().to_string(),
                    requested_clusters,
                    effective_clusters: None,
                    customers_analyzed: 0,
                    unsegmented_customers: 0,
                    silhouette_score: None,
                    error: None,
                    started_at: now,
                    finished_at: None,
                };
                let saved = diesel::insert_into(segmentation_runs::table)
                    .values(&row)
                    .returning(SegmentationRunDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(SegmentationRun::try_from(saved)?)
            })
            .await
    }

    async fn replace_memberships(&self, batch: MembershipBatch) -> Result<AppliedSegmentation> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<AppliedSegmentation> {
                let own = segmentation_runs::table
                    .find(&batch.run_id)
                    .select(SegmentationRunDB::as_select())
                    .first(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| {
                        Error::NotFound(format!("Segmentation run {}", batch.run_id))
                    })?;
                if own.status != RunStatus::Running.as_str() {
                    // The lock was taken over after this run went stale.
                    return Err(run_conflict(active_run(conn)?.unwrap_or(own)));
                }

                diesel::delete(customer_segment_memberships::table)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let existing: Vec<CustomerSegment> = customer_segments::table
                    .order((customer_segments::created_at.asc(), customer_segments::id.asc()))
                    .select(CustomerSegmentDB::as_select())
                    .load(conn)
                    .map_err(StorageError::from)?
                    .into_iter()
                    .map(CustomerSegment::from)
                    .collect();

                let plan = reconcile_segments(&existing, &batch.definitions, batch.naming);
                let empty = Vec::new();
                let mut segments = Vec::with_capacity(plan.actions.len());
                for action in &plan.actions {
                    let segment = apply_action(conn, action)?;
                    let members = batch
                        .members_by_rank
                        .get(action.rank())
                        .unwrap_or(&empty);
                    insert_memberships(
                        conn,
                        &membership_rows(members, &segment.id, &batch.run_id, batch.assigned_at),
                    )?;
                    segments.push(AppliedSegment {
                        rank: action.rank(),
                        segment_id: segment.id,
                        segment_name: segment.segment_name,
                        color: segment.color,
                        description: segment.description.unwrap_or_default(),
                        customers: members.len(),
                        action: action.label().to_string(),
                    });
                }

                // A customer whose first sale committed after the batch was
                // computed has no rank yet; leave them out until the next run.
                let unsegmented: Vec<String> = customers::table
                    .filter(not(exists(
                        customer_segment_memberships::table
                            .filter(customer_segment_memberships::customer_id.eq(customers::id)),
                    )))
                    .filter(not(exists(
                        sales::table.filter(sales::customer_id.eq(customers::id)),
                    )))
                    .order(customers::id.asc())
                    .select(customers::id)
                    .load(conn)
                    .map_err(StorageError::from)?;

                let mut reserved_segment_id = None;
                if !unsegmented.is_empty() {
                    let reserved = customer_segments::table
                        .filter(customer_segments::is_reserved.eq(true))
                        .select(CustomerSegmentDB::as_select())
                        .first(conn)
                        .optional()
                        .map_err(StorageError::from)?;
                    let reserved = match reserved {
                        Some(segment) => segment,
                        None => {
                            let definition = reserved_segment_definition();
                            insert_segment(
                                conn,
                                &definition.name,
                                &definition.color,
                                &definition.description,
                                true,
                            )?
                        }
                    };
                    insert_memberships(
                        conn,
                        &membership_rows(
                            &unsegmented,
                            &reserved.id,
                            &batch.run_id,
                            batch.assigned_at,
                        ),
                    )?;
                    reserved_segment_id = Some(reserved.id);
                }

                diesel::update(segmentation_runs::table.find(&batch.run_id))
                    .set((
                        segmentation_runs::status.eq(RunStatus::Completed.as_str()),
                        segmentation_runs::effective_clusters
                            .eq(Some(batch.effective_clusters as i32)),
                        segmentation_runs::customers_analyzed.eq(batch.customers_analyzed as i32),
                        segmentation_runs::unsegmented_customers.eq(unsegmented.len() as i32),
                        segmentation_runs::silhouette_score.eq(batch.silhouette_score),
                        segmentation_runs::finished_at.eq(Some(now_utc())),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                info!(
                    "Segmentation run {} applied: {} segment(s), {} customer(s) in the reserved segment",
                    batch.run_id,
                    segments.len(),
                    unsegmented.len()
                );

                Ok(AppliedSegmentation {
                    segments,
                    reserved_segment_id,
                    unsegmented_customers: unsegmented.len(),
                })
            })
            .await
    }

    async fn fail_run(&self, run_id: &str, error: &str) -> Result<()> {
        let run_id = run_id.to_string();
        let error = error.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(
                    segmentation_runs::table
                        .find(&run_id)
                        .filter(segmentation_runs::status.eq(RunStatus::Running.as_str())),
                )
                .set((
                    segmentation_runs::status.eq(RunStatus::Failed.as_str()),
                    segmentation_runs::error.eq(Some(error)),
                    segmentation_runs::finished_at.eq(Some(now_utc())),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn list_segments(&self) -> Result<Vec<CustomerSegment>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(customer_segments::table
            .order((customer_segments::created_at.asc(), customer_segments::id.asc()))
            .select(CustomerSegmentDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(CustomerSegment::from)
            .collect())
    }

    fn list_segment_stats(&self) -> Result<Vec<SegmentStats>> {
        let mut conn = get_connection(&self.pool)?;
        let segments = customer_segments::table
            .order((
                customer_segments::is_reserved.asc(),
                customer_segments::created_at.asc(),
                customer_segments::id.asc(),
            ))
            .select(CustomerSegmentDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;

        let counts: HashMap<String, i64> = customer_segment_memberships::table
            .group_by(customer_segment_memberships::segment_id)
            .select((customer_segment_memberships::segment_id, count_star()))
            .load::<(String, i64)>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .collect();

        let mut promotions_by_segment: HashMap<String, Promotion> = promotions::table
            .select(PromotionDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(|row| Promotion::try_from(row).map(|p| (p.segment_id.clone(), p)))
            .collect::<std::result::Result<_, StorageError>>()?;

        Ok(segments
            .into_iter()
            .map(|segment| SegmentStats {
                member_count: counts.get(&segment.id).copied().unwrap_or(0),
                promotion: promotions_by_segment.remove(&segment.id),
                segment_id: segment.id,
                segment_name: segment.segment_name,
                description: segment.description,
                color: segment.color,
                is_reserved: segment.is_reserved,
            })
            .collect())
    }

    fn list_runs(&self, limit: i64) -> Result<Vec<SegmentationRun>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = segmentation_runs::table
            .order((
                segmentation_runs::started_at.desc(),
                segmentation_runs::id.desc(),
            ))
            .limit(limit.max(0))
            .select(SegmentationRunDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| SegmentationRun::try_from(row).map_err(Error::from))
            .collect()
    }
}
