//! Sowing schedule service: the store, the upsert/reconciliation path, and
//! the progress tracker
//!
//! One schedule exists per 5-day sowing window, enforced by a partial
//! unique index on (window_start, window_end) for sowing-derived rows.
//! Reconciliation re-derives a window's group/variety tree from current
//! booking data and replaces it while carrying forward each variety's
//! manually tracked `completed` counter. Concurrent reconciliations are
//! last-writer-wins: each pass reads a consistent snapshot, recomputes, and
//! writes the whole tree in one transaction, so the result is idempotent
//! given unchanged bookings.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::aggregation::{aggregate_lines, merge_preserving_progress, SowingLine};
use shared::models::{BookingContribution, Schedule, ScheduleGroup, ScheduleStatus, ScheduleVariety};
use shared::validation::validate_completed;
use shared::window::{resolve_window, windows_spanning, SowingWindow};

use super::catalog::CatalogService;

/// Schedule service: store access, reconciliation, progress tracking
#[derive(Clone)]
pub struct ScheduleService {
    db: PgPool,
}

/// Read-path shape for one schedule, with resolved farmer names and the
/// derived `remaining` field (never stored)
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleView {
    pub id: Uuid,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub groups: Vec<GroupView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub group_id: Uuid,
    pub group_name: String,
    pub varieties: Vec<VarietyView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VarietyView {
    pub variety_id: Uuid,
    pub variety_name: String,
    pub total: Decimal,
    pub completed: Decimal,
    pub remaining: Decimal,
    pub bookings: Vec<ContributionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributionView {
    pub booking_id: Uuid,
    pub farmer_id: Option<Uuid>,
    pub farmer_name: Option<String>,
    pub farmer_reg_no: Option<String>,
    pub quantity: Decimal,
}

/// Updated variety entry returned by the progress tracker
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VarietyProgress {
    pub id: Uuid,
    pub variety_ref: Option<Uuid>,
    pub variety_name: String,
    pub total: Decimal,
    pub completed: Decimal,
}

impl ScheduleService {
    /// Create a new ScheduleService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Store
    // ========================================================================

    /// Idempotent upsert of the schedule row for a window.
    ///
    /// The insert targets the partial unique index on
    /// (window_start, window_end) WHERE sowing_derived, so concurrent calls
    /// for the same window resolve to the same row. New rows start as
    /// `pending`.
    pub async fn find_or_create_window(&self, window: &SowingWindow) -> AppResult<Schedule> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            INSERT INTO schedules (id, name, window_start, window_end, status, sowing_derived)
            VALUES ($1, $2, $3, $4, 'pending', TRUE)
            ON CONFLICT (window_start, window_end) WHERE sowing_derived
            DO UPDATE SET updated_at = NOW()
            RETURNING id, name, window_start, window_end, status, sowing_derived,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(window.label())
        .bind(window.start_at())
        .bind(window.end_at())
        .fetch_one(&self.db)
        .await?;

        Ok(row.into_schedule(Vec::new()))
    }

    /// Atomically replace a schedule's group/variety/contribution tree.
    ///
    /// The stored tree is loaded first and merged with the new one so each
    /// surviving variety keeps its `completed` counter and entry id. The
    /// delete + reinsert runs in one transaction; readers never see a
    /// half-written tree.
    pub async fn replace_groups(
        &self,
        schedule_id: Uuid,
        new_groups: Vec<ScheduleGroup>,
    ) -> AppResult<Vec<ScheduleGroup>> {
        let old_groups = self.load_groups(schedule_id).await?;
        let merged = merge_preserving_progress(&old_groups, new_groups);

        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM schedule_groups WHERE schedule_id = $1")
            .bind(schedule_id)
            .execute(&mut *tx)
            .await?;

        for (group_pos, group) in merged.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO schedule_groups (id, schedule_id, group_ref, group_name, position)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(group.id)
            .bind(schedule_id)
            .bind(group.group_ref)
            .bind(&group.group_name)
            .bind(group_pos as i32)
            .execute(&mut *tx)
            .await?;

            for (variety_pos, variety) in group.varieties.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO schedule_varieties
                        (id, group_entry_id, variety_ref, variety_name, total, completed, position)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(variety.id)
                .bind(group.id)
                .bind(variety.variety_ref)
                .bind(&variety.variety_name)
                .bind(variety.total)
                .bind(variety.completed)
                .bind(variety_pos as i32)
                .execute(&mut *tx)
                .await?;

                for (contribution_pos, contribution) in variety.bookings.iter().enumerate() {
                    sqlx::query(
                        r#"
                        INSERT INTO schedule_contributions
                            (id, variety_entry_id, booking_id, farmer_id, farmer_reg_no,
                             quantity, booking_date, plot, position)
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                        "#,
                    )
                    .bind(Uuid::new_v4())
                    .bind(variety.id)
                    .bind(contribution.booking_id)
                    .bind(contribution.farmer_id)
                    .bind(&contribution.farmer_reg_no)
                    .bind(contribution.quantity)
                    .bind(contribution.booking_date)
                    .bind(&contribution.plot)
                    .bind(contribution_pos as i32)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        sqlx::query("UPDATE schedules SET updated_at = NOW() WHERE id = $1")
            .bind(schedule_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(merged)
    }

    /// Load a schedule's nested tree, in stored position order
    pub async fn load_groups(&self, schedule_id: Uuid) -> AppResult<Vec<ScheduleGroup>> {
        let group_rows = sqlx::query_as::<_, GroupEntryRow>(
            r#"
            SELECT id, group_ref, group_name
            FROM schedule_groups
            WHERE schedule_id = $1
            ORDER BY position
            "#,
        )
        .bind(schedule_id)
        .fetch_all(&self.db)
        .await?;

        let variety_rows = sqlx::query_as::<_, VarietyEntryRow>(
            r#"
            SELECT sv.id, sv.group_entry_id, sv.variety_ref, sv.variety_name,
                   sv.total, sv.completed
            FROM schedule_varieties sv
            JOIN schedule_groups sg ON sg.id = sv.group_entry_id
            WHERE sg.schedule_id = $1
            ORDER BY sv.position
            "#,
        )
        .bind(schedule_id)
        .fetch_all(&self.db)
        .await?;

        let contribution_rows = sqlx::query_as::<_, ContributionRow>(
            r#"
            SELECT sc.variety_entry_id, sc.booking_id, sc.farmer_id, sc.farmer_reg_no,
                   sc.quantity, sc.booking_date, sc.plot
            FROM schedule_contributions sc
            JOIN schedule_varieties sv ON sv.id = sc.variety_entry_id
            JOIN schedule_groups sg ON sg.id = sv.group_entry_id
            WHERE sg.schedule_id = $1
            ORDER BY sc.position
            "#,
        )
        .bind(schedule_id)
        .fetch_all(&self.db)
        .await?;

        let mut groups: Vec<ScheduleGroup> = group_rows
            .into_iter()
            .map(|row| ScheduleGroup {
                id: row.id,
                group_ref: row.group_ref,
                group_name: row.group_name,
                varieties: Vec::new(),
            })
            .collect();

        let mut varieties_by_group: HashMap<Uuid, Vec<ScheduleVariety>> = HashMap::new();
        let mut contributions_by_variety: HashMap<Uuid, Vec<BookingContribution>> = HashMap::new();

        for row in contribution_rows {
            contributions_by_variety
                .entry(row.variety_entry_id)
                .or_default()
                .push(BookingContribution {
                    booking_id: row.booking_id,
                    farmer_id: row.farmer_id,
                    farmer_reg_no: row.farmer_reg_no,
                    quantity: row.quantity,
                    booking_date: row.booking_date,
                    plot: row.plot,
                });
        }

        for row in variety_rows {
            let bookings = contributions_by_variety.remove(&row.id).unwrap_or_default();
            varieties_by_group
                .entry(row.group_entry_id)
                .or_default()
                .push(ScheduleVariety {
                    id: row.id,
                    variety_ref: row.variety_ref,
                    variety_name: row.variety_name,
                    total: row.total,
                    completed: row.completed,
                    bookings,
                });
        }

        for group in &mut groups {
            group.varieties = varieties_by_group.remove(&group.id).unwrap_or_default();
        }

        Ok(groups)
    }

    /// Live schedules as of an instant: every current-generation sowing
    /// schedule plus any legacy row whose window has not yet closed.
    ///
    /// Legacy and current-generation rows may coexist for the same window;
    /// the result is de-duplicated by (window_start, window_end), preferring
    /// the sowing-derived row. This is a defensive shim: the partial unique
    /// index prevents new duplicates.
    pub async fn find_live_schedules(&self, as_of: DateTime<Utc>) -> AppResult<Vec<Schedule>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT id, name, window_start, window_end, status, sowing_derived,
                   created_at, updated_at
            FROM schedules
            WHERE sowing_derived OR window_end >= $1
            ORDER BY window_start, sowing_derived DESC
            "#,
        )
        .bind(as_of)
        .fetch_all(&self.db)
        .await?;

        let mut schedules = Vec::with_capacity(rows.len());
        for row in rows {
            let groups = self.load_groups(row.id).await?;
            schedules.push(row.into_schedule(groups));
        }

        Ok(dedup_windows(schedules))
    }

    /// Single schedule with its tree
    pub async fn get_schedule(&self, schedule_id: Uuid) -> AppResult<Schedule> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT id, name, window_start, window_end, status, sowing_derived,
                   created_at, updated_at
            FROM schedules
            WHERE id = $1
            "#,
        )
        .bind(schedule_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule".to_string()))?;

        let groups = self.load_groups(row.id).await?;
        Ok(row.into_schedule(groups))
    }

    // ========================================================================
    // Reconciliation
    // ========================================================================

    /// Re-derive every sowing schedule from current booking data.
    ///
    /// The span covers both booking sowing dates and existing sowing-derived
    /// windows, so schedules whose bookings were all deleted are emptied
    /// rather than left stale. Administrative trigger; idempotent and safe
    /// to re-run at any time.
    pub async fn reconcile_all(&self) -> AppResult<Vec<Schedule>> {
        let span = sqlx::query_as::<_, (Option<NaiveDate>, Option<NaiveDate>)>(
            r#"
            SELECT MIN(d), MAX(d) FROM (
                SELECT sowing_date AS d FROM bookings
                UNION ALL
                SELECT window_start::date FROM schedules WHERE sowing_derived
                UNION ALL
                SELECT window_end::date FROM schedules WHERE sowing_derived
            ) AS span
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let (Some(from), Some(to)) = span else {
            return Ok(Vec::new());
        };

        let mut schedules = Vec::new();
        for window in windows_spanning(from, to) {
            if let Some(schedule) = self.reconcile_window(&window).await? {
                schedules.push(schedule);
            }
        }
        Ok(schedules)
    }

    /// Reconcile one window: fetch its bookings, aggregate, upsert the
    /// schedule row, and replace the tree (progress preserved).
    ///
    /// Returns None when the window has no bookings and no existing
    /// schedule; an existing schedule whose bookings vanished is emptied.
    pub async fn reconcile_window(&self, window: &SowingWindow) -> AppResult<Option<Schedule>> {
        let rows = self.fetch_window_lines(window).await?;
        let lines = self.resolve_lines(rows).await?;
        let aggregated = aggregate_lines(&lines);

        let existing = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM schedules
            WHERE window_start = $1 AND window_end = $2 AND sowing_derived
            "#,
        )
        .bind(window.start_at())
        .bind(window.end_at())
        .fetch_optional(&self.db)
        .await?;

        if aggregated.is_empty() && existing.is_none() {
            return Ok(None);
        }

        let schedule = self.find_or_create_window(window).await?;
        let groups = self.replace_groups(schedule.id, aggregated).await?;

        tracing::debug!(
            schedule_id = %schedule.id,
            window_start = %window.start_date,
            groups = groups.len(),
            "reconciled sowing window"
        );

        Ok(Some(Schedule { groups, ..schedule }))
    }

    /// Reconcile the window(s) affected by a booking mutation. Called by
    /// booking lifecycle hooks with the old and new sowing dates; duplicate
    /// windows are reconciled once.
    pub async fn reconcile_for_dates(&self, sowing_dates: &[NaiveDate]) -> AppResult<()> {
        let mut windows: Vec<SowingWindow> = Vec::new();
        for date in sowing_dates {
            let window = resolve_window(*date);
            if !windows.contains(&window) {
                windows.push(window);
            }
        }
        for window in &windows {
            self.reconcile_window(window).await?;
        }
        Ok(())
    }

    // ========================================================================
    // Progress tracking
    // ========================================================================

    /// Set a variety's `completed` counter to an absolute value.
    ///
    /// Group and variety resolve by entry row id or catalog reference, the
    /// same identity rule the merge uses. The value is deliberately not
    /// clamped to the variety total. Later reconciliations keep it.
    pub async fn set_completed(
        &self,
        schedule_id: Uuid,
        group_id: Uuid,
        variety_id: Uuid,
        completed: Decimal,
    ) -> AppResult<VarietyProgress> {
        validate_completed(completed).map_err(|msg| AppError::Validation {
            field: "completed".to_string(),
            message: msg.to_string(),
        })?;

        let schedule_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM schedules WHERE id = $1)")
                .bind(schedule_id)
                .fetch_one(&self.db)
                .await?;
        if !schedule_exists {
            return Err(AppError::NotFound("Schedule".to_string()));
        }

        let group_entry_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM schedule_groups
            WHERE schedule_id = $1 AND (id = $2 OR group_ref = $2)
            "#,
        )
        .bind(schedule_id)
        .bind(group_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule group".to_string()))?;

        let variety_entry_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM schedule_varieties
            WHERE group_entry_id = $1 AND (id = $2 OR variety_ref = $2)
            "#,
        )
        .bind(group_entry_id)
        .bind(variety_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule variety".to_string()))?;

        let progress = sqlx::query_as::<_, VarietyProgress>(
            r#"
            UPDATE schedule_varieties
            SET completed = $1
            WHERE id = $2
            RETURNING id, variety_ref, variety_name, total, completed
            "#,
        )
        .bind(completed)
        .bind(variety_entry_id)
        .fetch_one(&self.db)
        .await?;

        Ok(progress)
    }

    /// Manual administrative status transition; there is no automatic
    /// pending -> ongoing -> completed logic.
    pub async fn set_status(&self, schedule_id: Uuid, status: &str) -> AppResult<Schedule> {
        let status = ScheduleStatus::parse(status).ok_or_else(|| AppError::Validation {
            field: "status".to_string(),
            message: "Status must be one of: pending, ongoing, completed".to_string(),
        })?;

        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            UPDATE schedules
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, name, window_start, window_end, status, sowing_derived,
                      created_at, updated_at
            "#,
        )
        .bind(status.as_str())
        .bind(schedule_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule".to_string()))?;

        let groups = self.load_groups(row.id).await?;
        Ok(row.into_schedule(groups))
    }

    // ========================================================================
    // Read shaping
    // ========================================================================

    /// Live schedules shaped for display, with farmer names resolved and
    /// `remaining` derived per variety
    pub async fn live_schedule_views(&self, as_of: DateTime<Utc>) -> AppResult<Vec<ScheduleView>> {
        let schedules = self.find_live_schedules(as_of).await?;
        let farmer_names = self.farmer_names_for(&schedules).await?;
        Ok(schedules
            .into_iter()
            .map(|schedule| shape_view(schedule, &farmer_names))
            .collect())
    }

    /// One schedule shaped for display
    pub async fn schedule_view(&self, schedule_id: Uuid) -> AppResult<ScheduleView> {
        let schedule = self.get_schedule(schedule_id).await?;
        let farmer_names = self.farmer_names_for(std::slice::from_ref(&schedule)).await?;
        Ok(shape_view(schedule, &farmer_names))
    }

    async fn farmer_names_for(
        &self,
        schedules: &[Schedule],
    ) -> AppResult<HashMap<Uuid, String>> {
        let farmer_ids: Vec<Uuid> = schedules
            .iter()
            .flat_map(|s| &s.groups)
            .flat_map(|g| &g.varieties)
            .flat_map(|v| &v.bookings)
            .filter_map(|c| c.farmer_id)
            .collect();

        if farmer_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM farmers WHERE id = ANY($1)",
        )
        .bind(&farmer_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().collect())
    }

    // ========================================================================
    // Line fetching and catalog resolution
    // ========================================================================

    async fn fetch_window_lines(&self, window: &SowingWindow) -> AppResult<Vec<BookingLineRow>> {
        let rows = sqlx::query_as::<_, BookingLineRow>(
            r#"
            SELECT bv.booking_id, b.farmer_id, f.registration_code AS farmer_reg_no,
                   b.booking_date, b.plot,
                   bv.crop_group_ref, bv.crop_group_name, cg.name AS catalog_group_name,
                   bv.variety_ref, bv.variety_name, bv.quantity
            FROM booking_varieties bv
            JOIN bookings b ON b.id = bv.booking_id
            JOIN farmers f ON f.id = b.farmer_id
            LEFT JOIN crop_groups cg ON cg.id = bv.crop_group_ref
            WHERE b.sowing_date BETWEEN $1 AND $2
            ORDER BY b.created_at, b.id, bv.position
            "#,
        )
        .bind(window.start_date)
        .bind(window.end_date)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Resolve fetched lines against the catalog, vivifying groups and
    /// varieties by name where needed.
    ///
    /// A line with no group reference and no group name cannot be placed
    /// and is skipped with a warning; partial aggregation is preferred over
    /// failing the whole pass. A variety whose vivification fails stays
    /// name-only.
    async fn resolve_lines(&self, rows: Vec<BookingLineRow>) -> AppResult<Vec<SowingLine>> {
        let catalog = CatalogService::new(self.db.clone());
        let mut lines = Vec::with_capacity(rows.len());

        for row in rows {
            let (group_ref, group_name) = if let Some(group_ref) = row.crop_group_ref {
                let name = row
                    .catalog_group_name
                    .or(row.crop_group_name)
                    .unwrap_or_else(|| "Ungrouped".to_string());
                (group_ref, name)
            } else if let Some(name) = row
                .crop_group_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
            {
                let group = catalog.find_or_create_group(name).await?;
                (group.id, group.name)
            } else {
                tracing::warn!(
                    booking_id = %row.booking_id,
                    variety = %row.variety_name,
                    "variety-line has no resolvable crop group, skipping"
                );
                continue;
            };

            let variety_ref = match row.variety_ref {
                Some(variety_ref) => Some(variety_ref),
                None => match catalog
                    .find_or_create_variety(group_ref, &row.variety_name)
                    .await
                {
                    Ok(variety) => Some(variety.id),
                    Err(err) => {
                        tracing::warn!(
                            booking_id = %row.booking_id,
                            variety = %row.variety_name,
                            error = %err,
                            "could not vivify variety, keeping name-only entry"
                        );
                        None
                    }
                },
            };

            lines.push(SowingLine {
                booking_id: row.booking_id,
                farmer_id: Some(row.farmer_id),
                farmer_reg_no: Some(row.farmer_reg_no),
                booking_date: Some(row.booking_date),
                plot: row.plot,
                group_ref,
                group_name,
                variety_ref,
                variety_name: row.variety_name,
                quantity: row.quantity,
            });
        }

        Ok(lines)
    }
}

/// De-duplicate schedules by (window_start, window_end), preferring the
/// sowing-derived row when a legacy duplicate exists for the same window
fn dedup_windows(schedules: Vec<Schedule>) -> Vec<Schedule> {
    let mut deduped: Vec<Schedule> = Vec::with_capacity(schedules.len());
    for schedule in schedules {
        match deduped.iter_mut().find(|s| {
            s.window_start == schedule.window_start && s.window_end == schedule.window_end
        }) {
            Some(existing) => {
                if schedule.sowing_derived && !existing.sowing_derived {
                    *existing = schedule;
                }
            }
            None => deduped.push(schedule),
        }
    }
    deduped
}

/// Shape one schedule for display
fn shape_view(schedule: Schedule, farmer_names: &HashMap<Uuid, String>) -> ScheduleView {
    ScheduleView {
        id: schedule.id,
        name: schedule.name,
        start_date: schedule.window_start,
        end_date: schedule.window_end,
        status: schedule.status,
        groups: schedule
            .groups
            .into_iter()
            .map(|group| GroupView {
                group_id: group.id,
                group_name: group.group_name,
                varieties: group
                    .varieties
                    .into_iter()
                    .map(|variety| {
                        let remaining = variety.remaining();
                        VarietyView {
                            variety_id: variety.id,
                            variety_name: variety.variety_name,
                            total: variety.total,
                            completed: variety.completed,
                            remaining,
                            bookings: variety
                                .bookings
                                .into_iter()
                                .map(|contribution| ContributionView {
                                    booking_id: contribution.booking_id,
                                    farmer_name: contribution
                                        .farmer_id
                                        .and_then(|id| farmer_names.get(&id).cloned()),
                                    farmer_id: contribution.farmer_id,
                                    farmer_reg_no: contribution.farmer_reg_no,
                                    quantity: contribution.quantity,
                                })
                                .collect(),
                        }
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ScheduleRow {
    id: Uuid,
    name: String,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    status: String,
    sowing_derived: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ScheduleRow {
    fn into_schedule(self, groups: Vec<ScheduleGroup>) -> Schedule {
        Schedule {
            id: self.id,
            name: self.name,
            window_start: self.window_start,
            window_end: self.window_end,
            // the CHECK constraint guarantees a parseable value
            status: ScheduleStatus::parse(&self.status).unwrap_or_default(),
            sowing_derived: self.sowing_derived,
            created_at: self.created_at,
            updated_at: self.updated_at,
            groups,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GroupEntryRow {
    id: Uuid,
    group_ref: Uuid,
    group_name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct VarietyEntryRow {
    id: Uuid,
    group_entry_id: Uuid,
    variety_ref: Option<Uuid>,
    variety_name: String,
    total: Decimal,
    completed: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct ContributionRow {
    variety_entry_id: Uuid,
    booking_id: Uuid,
    farmer_id: Option<Uuid>,
    farmer_reg_no: Option<String>,
    quantity: Decimal,
    booking_date: Option<NaiveDate>,
    plot: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct BookingLineRow {
    booking_id: Uuid,
    farmer_id: Uuid,
    farmer_reg_no: String,
    booking_date: NaiveDate,
    plot: Option<String>,
    crop_group_ref: Option<Uuid>,
    crop_group_name: Option<String>,
    catalog_group_name: Option<String>,
    variety_ref: Option<Uuid>,
    variety_name: String,
    quantity: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn instant(value: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    fn schedule(start: &str, end: &str, sowing_derived: bool) -> Schedule {
        let window_start = instant(start);
        let window_end = instant(end);
        Schedule {
            id: Uuid::new_v4(),
            name: "Sowing".to_string(),
            window_start,
            window_end,
            status: ScheduleStatus::Pending,
            sowing_derived,
            created_at: window_start,
            updated_at: window_start,
            groups: vec![],
        }
    }

    #[test]
    fn test_dedup_prefers_sowing_derived_row() {
        let legacy = schedule("2024-06-01 00:00:00", "2024-06-05 23:59:59", false);
        let current = schedule("2024-06-01 00:00:00", "2024-06-05 23:59:59", true);
        let current_id = current.id;

        let deduped = dedup_windows(vec![legacy, current]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].id, current_id);
        assert!(deduped[0].sowing_derived);
    }

    #[test]
    fn test_dedup_keeps_first_among_equals() {
        let first = schedule("2024-06-01 00:00:00", "2024-06-05 23:59:59", true);
        let second = schedule("2024-06-01 00:00:00", "2024-06-05 23:59:59", true);
        let first_id = first.id;

        let deduped = dedup_windows(vec![first, second]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].id, first_id);
    }

    #[test]
    fn test_dedup_keeps_distinct_windows() {
        let a = schedule("2024-06-01 00:00:00", "2024-06-05 23:59:59", true);
        let b = schedule("2024-06-06 00:00:00", "2024-06-10 23:59:59", true);
        assert_eq!(dedup_windows(vec![a, b]).len(), 2);
    }

    #[test]
    fn test_shape_view_derives_remaining_and_names() {
        let farmer_id = Uuid::new_v4();
        let mut s = schedule("2024-06-01 00:00:00", "2024-06-05 23:59:59", true);
        s.groups = vec![ScheduleGroup {
            id: Uuid::new_v4(),
            group_ref: Uuid::new_v4(),
            group_name: "Vegetables".to_string(),
            varieties: vec![ScheduleVariety {
                id: Uuid::new_v4(),
                variety_ref: None,
                variety_name: "Tomato Hybrid".to_string(),
                total: Decimal::from(200),
                completed: Decimal::from(150),
                bookings: vec![BookingContribution {
                    booking_id: Uuid::new_v4(),
                    farmer_id: Some(farmer_id),
                    farmer_reg_no: Some("FRM-0001".to_string()),
                    quantity: Decimal::from(200),
                    booking_date: None,
                    plot: None,
                }],
            }],
        }];

        let names: HashMap<Uuid, String> =
            [(farmer_id, "Kamala Devi".to_string())].into_iter().collect();
        let view = shape_view(s, &names);

        let variety = &view.groups[0].varieties[0];
        assert_eq!(variety.remaining, Decimal::from(50));
        assert_eq!(
            variety.bookings[0].farmer_name.as_deref(),
            Some("Kamala Devi")
        );
    }
}
