//! Booking aggregation and the progress-preserving merge
//!
//! `aggregate_lines` folds resolved booking variety-lines into the nested
//! group -> variety -> contribution tree stored on a schedule. A variety's
//! `total` is a derived value: it is recomputed from contributions on every
//! pass and never hand-edited.
//!
//! `merge_preserving_progress` carries each surviving variety's manually
//! tracked `completed` counter (and stable entry ids) across
//! re-aggregation, matching entries by group reference and variety
//! reference-or-name. This matching is the most error-prone part of the
//! engine: a failed match silently resets progress to zero, so it lives
//! here as an explicit pure function with its own test surface.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{BookingContribution, ScheduleGroup, ScheduleVariety};

/// One resolved booking variety-line, ready for aggregation.
///
/// Lines reach this type only after catalog resolution: the crop group is
/// known. A line whose group cannot be resolved is skipped upstream.
#[derive(Debug, Clone)]
pub struct SowingLine {
    pub booking_id: Uuid,
    pub farmer_id: Option<Uuid>,
    pub farmer_reg_no: Option<String>,
    pub booking_date: Option<NaiveDate>,
    pub plot: Option<String>,
    pub group_ref: Uuid,
    pub group_name: String,
    pub variety_ref: Option<Uuid>,
    pub variety_name: String,
    /// Zero-quantity lines are included: they keep their catalog entry,
    /// append a contribution of 0, and add 0 to the total.
    pub quantity: Decimal,
}

/// Variety identity within a group: catalog reference when both sides carry
/// one, display name otherwise. A name-only entry therefore still matches
/// once a catalog reference is attached, as long as the name is unchanged.
pub fn same_variety(a_ref: Option<Uuid>, a_name: &str, b_ref: Option<Uuid>, b_name: &str) -> bool {
    match (a_ref, b_ref) {
        (Some(a), Some(b)) => a == b,
        _ => a_name == b_name,
    }
}

/// Aggregate resolved lines into schedule groups.
///
/// Contribution order follows input order (callers fetch bookings in
/// creation order); groups and varieties are sorted by display name so the
/// output is deterministic regardless of how lines arrive.
pub fn aggregate_lines(lines: &[SowingLine]) -> Vec<ScheduleGroup> {
    let mut groups: Vec<ScheduleGroup> = Vec::new();

    for line in lines {
        let group_idx = match groups.iter().position(|g| g.group_ref == line.group_ref) {
            Some(idx) => idx,
            None => {
                groups.push(ScheduleGroup {
                    id: Uuid::new_v4(),
                    group_ref: line.group_ref,
                    group_name: line.group_name.clone(),
                    varieties: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[group_idx];

        let variety_idx = match group.varieties.iter().position(|v| {
            same_variety(
                v.variety_ref,
                &v.variety_name,
                line.variety_ref,
                &line.variety_name,
            )
        }) {
            Some(idx) => idx,
            None => {
                group.varieties.push(ScheduleVariety {
                    id: Uuid::new_v4(),
                    variety_ref: line.variety_ref,
                    variety_name: line.variety_name.clone(),
                    total: Decimal::ZERO,
                    completed: Decimal::ZERO,
                    bookings: Vec::new(),
                });
                group.varieties.len() - 1
            }
        };
        let variety = &mut group.varieties[variety_idx];

        // Upgrade a name-only entry once a later line carries the reference
        if variety.variety_ref.is_none() {
            variety.variety_ref = line.variety_ref;
        }

        variety.total += line.quantity;
        variety.bookings.push(BookingContribution {
            booking_id: line.booking_id,
            farmer_id: line.farmer_id,
            farmer_reg_no: line.farmer_reg_no.clone(),
            quantity: line.quantity,
            booking_date: line.booking_date,
            plot: line.plot.clone(),
        });
    }

    groups.sort_by(|a, b| a.group_name.cmp(&b.group_name));
    for group in &mut groups {
        group
            .varieties
            .sort_by(|a, b| a.variety_name.cmp(&b.variety_name));
    }
    groups
}

/// Merge a freshly aggregated tree over the stored one, carrying forward
/// each surviving variety's `completed` counter and the stored entry ids.
///
/// Matching is by `group_ref`, then variety reference-or-name. An entry
/// with no match in the old tree starts at completed = 0. A variety whose
/// name and catalog reference both changed between passes will not match
/// and loses its progress; that is the accepted failure mode of
/// identity-based matching.
pub fn merge_preserving_progress(
    old_groups: &[ScheduleGroup],
    mut new_groups: Vec<ScheduleGroup>,
) -> Vec<ScheduleGroup> {
    for group in &mut new_groups {
        let Some(old_group) = old_groups.iter().find(|g| g.group_ref == group.group_ref) else {
            continue;
        };
        group.id = old_group.id;
        for variety in &mut group.varieties {
            if let Some(old_variety) = old_group.varieties.iter().find(|v| {
                same_variety(
                    v.variety_ref,
                    &v.variety_name,
                    variety.variety_ref,
                    &variety.variety_name,
                )
            }) {
                variety.id = old_variety.id;
                variety.completed = old_variety.completed;
            }
        }
    }
    new_groups
}
