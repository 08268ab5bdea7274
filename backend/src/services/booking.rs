//! Crop booking service and the schedule lifecycle hooks
//!
//! Every mutation that can move quantities between sowing windows (create,
//! update, delete) triggers reconciliation of the affected window(s) after
//! the booking write commits. The hook is fire-and-forget-but-logged: a
//! reconciliation failure never rolls back or fails the booking operation,
//! since the schedule is a derived side-effect of the booking record.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::VarietyLine;
use shared::validation::{validate_quantity, validate_rate, validate_variety_name};

use super::catalog::CatalogService;
use super::schedule::ScheduleService;

/// Booking service for crop bookings and their variety-lines
#[derive(Clone)]
pub struct BookingService {
    db: PgPool,
}

/// Input for one variety-line on a booking
#[derive(Debug, Deserialize)]
pub struct BookingLineInput {
    pub variety_name: String,
    pub variety_ref: Option<Uuid>,
    pub crop_group_ref: Option<Uuid>,
    pub crop_group_name: Option<String>,
    pub quantity: Decimal,
    pub rate_per_unit: Decimal,
}

/// Input for creating a booking
#[derive(Debug, Deserialize)]
pub struct CreateBookingInput {
    pub farmer_id: Uuid,
    /// Defaults to today when omitted
    pub booking_date: Option<NaiveDate>,
    pub sowing_date: NaiveDate,
    pub plot: Option<String>,
    pub notes: Option<String>,
    pub varieties: Vec<BookingLineInput>,
}

/// Input for updating a booking
#[derive(Debug, Deserialize)]
pub struct UpdateBookingInput {
    pub booking_date: Option<NaiveDate>,
    pub sowing_date: Option<NaiveDate>,
    pub plot: Option<String>,
    pub notes: Option<String>,
    /// When present, replaces all variety-lines
    pub varieties: Option<Vec<BookingLineInput>>,
}

/// Booking with resolved farmer fields, for API responses
#[derive(Debug, Clone, Serialize)]
pub struct BookingWithFarmer {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub farmer_name: String,
    pub farmer_reg_no: String,
    pub booking_date: NaiveDate,
    pub sowing_date: NaiveDate,
    pub plot: Option<String>,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub varieties: Vec<VarietyLine>,
}

/// A validated, catalog-resolved line ready for insertion
struct ResolvedLine {
    variety_name: String,
    variety_ref: Option<Uuid>,
    crop_group_ref: Option<Uuid>,
    crop_group_name: Option<String>,
    quantity: Decimal,
    rate_per_unit: Decimal,
    line_total: Decimal,
}

impl BookingService {
    /// Create a new BookingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all bookings, newest first
    pub async fn list_bookings(&self) -> AppResult<Vec<BookingWithFarmer>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT b.id, b.farmer_id, f.name AS farmer_name,
                   f.registration_code AS farmer_reg_no,
                   b.booking_date, b.sowing_date, b.plot, b.total_amount, b.notes,
                   b.created_at, b.updated_at
            FROM bookings b
            JOIN farmers f ON f.id = b.farmer_id
            ORDER BY b.created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let booking_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let lines = self.fetch_lines(&booking_ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let varieties = lines
                    .iter()
                    .filter(|l| l.booking_id == row.id)
                    .cloned()
                    .collect();
                row.into_booking(varieties)
            })
            .collect())
    }

    /// Get a booking by id
    pub async fn get_booking(&self, booking_id: Uuid) -> AppResult<BookingWithFarmer> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT b.id, b.farmer_id, f.name AS farmer_name,
                   f.registration_code AS farmer_reg_no,
                   b.booking_date, b.sowing_date, b.plot, b.total_amount, b.notes,
                   b.created_at, b.updated_at
            FROM bookings b
            JOIN farmers f ON f.id = b.farmer_id
            WHERE b.id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking".to_string()))?;

        let lines = self.fetch_lines(&[booking_id]).await?;
        Ok(row.into_booking(lines))
    }

    /// Create a booking and trigger reconciliation of its sowing window
    pub async fn create_booking(&self, input: CreateBookingInput) -> AppResult<BookingWithFarmer> {
        let farmer_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM farmers WHERE id = $1)")
                .bind(input.farmer_id)
                .fetch_one(&self.db)
                .await?;
        if !farmer_exists {
            return Err(AppError::NotFound("Farmer".to_string()));
        }

        let resolved = self.resolve_input_lines(&input.varieties).await?;
        let total_amount: Decimal = resolved.iter().map(|l| l.line_total).sum();
        let booking_date = input
            .booking_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let booking_id = Uuid::new_v4();
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bookings (id, farmer_id, booking_date, sowing_date, plot,
                                  total_amount, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(booking_id)
        .bind(input.farmer_id)
        .bind(booking_date)
        .bind(input.sowing_date)
        .bind(&input.plot)
        .bind(total_amount)
        .bind(&input.notes)
        .execute(&mut *tx)
        .await?;

        insert_lines(&mut tx, booking_id, &resolved).await?;
        tx.commit().await?;

        self.run_schedule_hook(&[input.sowing_date]).await;

        self.get_booking(booking_id).await
    }

    /// Update a booking; reconciles both the old and the new window when
    /// the sowing date moves
    pub async fn update_booking(
        &self,
        booking_id: Uuid,
        input: UpdateBookingInput,
    ) -> AppResult<BookingWithFarmer> {
        let existing = sqlx::query_as::<_, (NaiveDate, NaiveDate, Option<String>, Option<String>, Decimal)>(
            "SELECT booking_date, sowing_date, plot, notes, total_amount FROM bookings WHERE id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking".to_string()))?;

        let (old_booking_date, old_sowing_date, old_plot, old_notes, old_total) = existing;

        let booking_date = input.booking_date.unwrap_or(old_booking_date);
        let sowing_date = input.sowing_date.unwrap_or(old_sowing_date);
        let plot = input.plot.or(old_plot);
        let notes = input.notes.or(old_notes);

        let resolved = match &input.varieties {
            Some(lines) => Some(self.resolve_input_lines(lines).await?),
            None => None,
        };
        let total_amount = resolved
            .as_ref()
            .map(|lines| lines.iter().map(|l| l.line_total).sum())
            .unwrap_or(old_total);

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE bookings
            SET booking_date = $1, sowing_date = $2, plot = $3, notes = $4,
                total_amount = $5, updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(booking_date)
        .bind(sowing_date)
        .bind(&plot)
        .bind(&notes)
        .bind(total_amount)
        .bind(booking_id)
        .execute(&mut *tx)
        .await?;

        if let Some(resolved) = &resolved {
            sqlx::query("DELETE FROM booking_varieties WHERE booking_id = $1")
                .bind(booking_id)
                .execute(&mut *tx)
                .await?;
            insert_lines(&mut tx, booking_id, resolved).await?;
        }

        tx.commit().await?;

        self.run_schedule_hook(&[old_sowing_date, sowing_date]).await;

        self.get_booking(booking_id).await
    }

    /// Delete a booking; reconciling its window removes the booking's
    /// contributions and recomputes the affected variety totals
    pub async fn delete_booking(&self, booking_id: Uuid) -> AppResult<()> {
        let sowing_date =
            sqlx::query_scalar::<_, NaiveDate>("SELECT sowing_date FROM bookings WHERE id = $1")
                .bind(booking_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Booking".to_string()))?;

        // Variety-lines go with it via ON DELETE CASCADE
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking_id)
            .execute(&self.db)
            .await?;

        self.run_schedule_hook(&[sowing_date]).await;

        Ok(())
    }

    /// Run the schedule reconciliation hook for the given sowing dates.
    ///
    /// Failures are logged, never propagated: the booking write has already
    /// committed and must not appear to fail because a derived schedule
    /// could not be refreshed. A manual re-aggregation repairs any gap.
    async fn run_schedule_hook(&self, sowing_dates: &[NaiveDate]) {
        let schedules = ScheduleService::new(self.db.clone());
        if let Err(err) = schedules.reconcile_for_dates(sowing_dates).await {
            tracing::error!(
                error = %err,
                dates = ?sowing_dates,
                "schedule reconciliation hook failed; booking write was kept"
            );
        }
    }

    /// Validate input lines and resolve catalog references, vivifying
    /// groups/varieties named by free text
    async fn resolve_input_lines(
        &self,
        lines: &[BookingLineInput],
    ) -> AppResult<Vec<ResolvedLine>> {
        if lines.is_empty() {
            return Err(AppError::Validation {
                field: "varieties".to_string(),
                message: "A booking needs at least one variety-line".to_string(),
            });
        }

        let catalog = CatalogService::new(self.db.clone());
        let mut resolved = Vec::with_capacity(lines.len());

        for line in lines {
            validate_variety_name(&line.variety_name).map_err(|msg| AppError::Validation {
                field: "variety_name".to_string(),
                message: msg.to_string(),
            })?;
            validate_quantity(line.quantity).map_err(|msg| AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
            })?;
            validate_rate(line.rate_per_unit).map_err(|msg| AppError::Validation {
                field: "rate_per_unit".to_string(),
                message: msg.to_string(),
            })?;

            let (crop_group_ref, crop_group_name) = match (line.crop_group_ref, &line.crop_group_name) {
                (Some(group_ref), name) => (Some(group_ref), name.clone()),
                (None, Some(name)) if !name.trim().is_empty() => {
                    let group = catalog.find_or_create_group(name).await?;
                    (Some(group.id), Some(group.name))
                }
                // Group-less lines are stored but skipped by aggregation
                (None, name) => (None, name.clone()),
            };

            let variety_ref = match (line.variety_ref, crop_group_ref) {
                (Some(variety_ref), _) => Some(variety_ref),
                (None, Some(group_ref)) => {
                    let variety = catalog
                        .find_or_create_variety(group_ref, &line.variety_name)
                        .await?;
                    Some(variety.id)
                }
                (None, None) => None,
            };

            resolved.push(ResolvedLine {
                variety_name: line.variety_name.trim().to_string(),
                variety_ref,
                crop_group_ref,
                crop_group_name,
                quantity: line.quantity,
                rate_per_unit: line.rate_per_unit,
                line_total: VarietyLine::compute_line_total(line.quantity, line.rate_per_unit),
            });
        }

        Ok(resolved)
    }

    async fn fetch_lines(&self, booking_ids: &[Uuid]) -> AppResult<Vec<VarietyLine>> {
        if booking_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, LineRow>(
            r#"
            SELECT id, booking_id, variety_name, variety_ref, crop_group_ref,
                   crop_group_name, quantity, rate_per_unit, line_total, position
            FROM booking_varieties
            WHERE booking_id = ANY($1)
            ORDER BY booking_id, position
            "#,
        )
        .bind(booking_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(VarietyLine::from).collect())
    }
}

async fn insert_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    booking_id: Uuid,
    lines: &[ResolvedLine],
) -> AppResult<()> {
    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO booking_varieties
                (id, booking_id, variety_name, variety_ref, crop_group_ref,
                 crop_group_name, quantity, rate_per_unit, line_total, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking_id)
        .bind(&line.variety_name)
        .bind(line.variety_ref)
        .bind(line.crop_group_ref)
        .bind(&line.crop_group_name)
        .bind(line.quantity)
        .bind(line.rate_per_unit)
        .bind(line.line_total)
        .bind(position as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    farmer_id: Uuid,
    farmer_name: String,
    farmer_reg_no: String,
    booking_date: NaiveDate,
    sowing_date: NaiveDate,
    plot: Option<String>,
    total_amount: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self, varieties: Vec<VarietyLine>) -> BookingWithFarmer {
        BookingWithFarmer {
            id: self.id,
            farmer_id: self.farmer_id,
            farmer_name: self.farmer_name,
            farmer_reg_no: self.farmer_reg_no,
            booking_date: self.booking_date,
            sowing_date: self.sowing_date,
            plot: self.plot,
            total_amount: self.total_amount,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
            varieties,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct LineRow {
    id: Uuid,
    booking_id: Uuid,
    variety_name: String,
    variety_ref: Option<Uuid>,
    crop_group_ref: Option<Uuid>,
    crop_group_name: Option<String>,
    quantity: Decimal,
    rate_per_unit: Decimal,
    line_total: Decimal,
    position: i32,
}

impl From<LineRow> for VarietyLine {
    fn from(row: LineRow) -> Self {
        Self {
            id: row.id,
            booking_id: row.booking_id,
            variety_name: row.variety_name,
            variety_ref: row.variety_ref,
            crop_group_ref: row.crop_group_ref,
            crop_group_name: row.crop_group_name,
            quantity: row.quantity,
            rate_per_unit: row.rate_per_unit,
            line_total: row.line_total,
            position: row.position,
        }
    }
}
