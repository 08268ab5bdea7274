//! Aggregation and progress-preservation tests for the sowing-schedule
//! kernel
//!
//! Covers:
//! - Sum invariant: variety total == sum of its contribution quantities
//! - Idempotence: re-aggregating unchanged bookings yields an identical tree
//! - Completed preservation across re-aggregation with changed totals
//! - Deletion removes a booking's contribution and recomputes the total
//! - The end-to-end kernel scenario (booking -> window -> tree -> progress)

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::aggregation::{aggregate_lines, merge_preserving_progress, SowingLine};
use shared::models::ScheduleGroup;
use shared::window::resolve_window;

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Stable ids so shrunken cases stay readable
fn pool_uuid(tag: u128, n: u128) -> Uuid {
    Uuid::from_u128(tag << 64 | (n + 1))
}

fn make_line(index: usize, group: u8, variety: u8, quantity: u32) -> SowingLine {
    SowingLine {
        booking_id: pool_uuid(1, index as u128),
        farmer_id: Some(pool_uuid(2, index as u128)),
        farmer_reg_no: Some(format!("FRM-{:04}", index)),
        booking_date: None,
        plot: None,
        group_ref: pool_uuid(3, group as u128),
        group_name: format!("Group {}", group),
        variety_ref: None,
        variety_name: format!("Variety {}", variety),
        quantity: Decimal::from(quantity),
    }
}

/// Generate up to 20 lines drawn from small group/variety pools
fn lines_strategy() -> impl Strategy<Value = Vec<SowingLine>> {
    prop::collection::vec((0..3u8, 0..4u8, 0..500u32), 0..20).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(index, (group, variety, quantity))| make_line(index, group, variety, quantity))
            .collect()
    })
}

fn total_of(groups: &[ScheduleGroup]) -> Decimal {
    groups
        .iter()
        .flat_map(|g| &g.varieties)
        .map(|v| v.total)
        .sum()
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Every variety total equals the sum of its contribution quantities,
    /// and every input line lands in exactly one contribution
    #[test]
    fn test_totals_equal_contribution_sums(lines in lines_strategy()) {
        let groups = aggregate_lines(&lines);

        for group in &groups {
            for variety in &group.varieties {
                let contributed: Decimal =
                    variety.bookings.iter().map(|c| c.quantity).sum();
                prop_assert_eq!(variety.total, contributed);
            }
        }

        let contribution_count: usize = groups
            .iter()
            .flat_map(|g| &g.varieties)
            .map(|v| v.bookings.len())
            .sum();
        prop_assert_eq!(contribution_count, lines.len());

        let input_total: Decimal = lines.iter().map(|l| l.quantity).sum();
        prop_assert_eq!(total_of(&groups), input_total);
    }

    /// Aggregation order of summation does not matter: reversing the input
    /// changes nothing but contribution order within each variety
    #[test]
    fn test_totals_commutative(lines in lines_strategy()) {
        let forward = aggregate_lines(&lines);
        let mut reversed_input = lines.clone();
        reversed_input.reverse();
        let reversed = aggregate_lines(&reversed_input);

        prop_assert_eq!(forward.len(), reversed.len());
        prop_assert_eq!(total_of(&forward), total_of(&reversed));
        for (a, b) in forward.iter().zip(reversed.iter()) {
            prop_assert_eq!(&a.group_name, &b.group_name);
            prop_assert_eq!(a.varieties.len(), b.varieties.len());
            for (va, vb) in a.varieties.iter().zip(b.varieties.iter()) {
                prop_assert_eq!(va.total, vb.total);
            }
        }
    }

    /// Re-aggregating unchanged bookings and merging over the stored tree
    /// reproduces that tree exactly (same ids, totals, contributions,
    /// completed values)
    #[test]
    fn test_reaggregation_is_idempotent(lines in lines_strategy()) {
        let stored = merge_preserving_progress(&[], aggregate_lines(&lines));
        let again = merge_preserving_progress(&stored, aggregate_lines(&lines));
        prop_assert_eq!(again, stored);
    }

    /// A manually set completed counter survives re-aggregation even when
    /// new bookings change the variety's total
    #[test]
    fn test_completed_preserved_across_total_changes(
        lines in lines_strategy(),
        completed in 0..1000u32,
        extra_quantity in 1..500u32,
    ) {
        prop_assume!(!lines.is_empty());

        let mut stored = merge_preserving_progress(&[], aggregate_lines(&lines));
        let completed = Decimal::from(completed);
        stored[0].varieties[0].completed = completed;
        let tracked_ref = stored[0].varieties[0].variety_ref;
        let tracked_name = stored[0].varieties[0].variety_name.clone();
        let tracked_group = stored[0].group_ref;

        // a new booking lands in the same variety
        let mut more = lines.clone();
        let mut extra = make_line(lines.len(), 0, 0, extra_quantity);
        extra.group_ref = tracked_group;
        extra.group_name = stored[0].group_name.clone();
        extra.variety_ref = tracked_ref;
        extra.variety_name = tracked_name.clone();
        more.push(extra);

        let merged = merge_preserving_progress(&stored, aggregate_lines(&more));
        let variety = merged
            .iter()
            .find(|g| g.group_ref == tracked_group)
            .and_then(|g| g.varieties.iter().find(|v| v.variety_name == tracked_name))
            .expect("tracked variety survives re-aggregation");

        prop_assert_eq!(variety.completed, completed);
        prop_assert!(variety.total > Decimal::ZERO);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn test_deleting_a_booking_removes_its_contribution() {
    let group_ref = Uuid::new_v4();
    let lines = vec![
        make_line(0, 0, 0, 50),
        make_line(1, 0, 0, 50),
        make_line(2, 0, 0, 50),
    ];
    let lines: Vec<SowingLine> = lines
        .into_iter()
        .map(|mut l| {
            l.group_ref = group_ref;
            l.variety_name = "Chilli Long".to_string();
            l
        })
        .collect();
    let deleted_booking = lines[1].booking_id;

    let stored = merge_preserving_progress(&[], aggregate_lines(&lines));
    assert_eq!(stored[0].varieties[0].total, Decimal::from(150));

    // booking deleted upstream; its window gets reconciled
    let remaining: Vec<SowingLine> = lines
        .iter()
        .filter(|l| l.booking_id != deleted_booking)
        .cloned()
        .collect();
    let merged = merge_preserving_progress(&stored, aggregate_lines(&remaining));

    let variety = &merged[0].varieties[0];
    assert_eq!(variety.total, Decimal::from(100));
    assert_eq!(variety.bookings.len(), 2);
    assert!(variety
        .bookings
        .iter()
        .all(|c| c.booking_id != deleted_booking));
}

#[test]
fn test_zero_quantity_line_kept_with_zero_contribution() {
    let mut line = make_line(0, 0, 0, 0);
    line.variety_name = "Okra".to_string();
    let groups = aggregate_lines(&[line]);

    assert_eq!(groups.len(), 1);
    let variety = &groups[0].varieties[0];
    assert_eq!(variety.total, Decimal::ZERO);
    assert_eq!(variety.bookings.len(), 1);
    assert_eq!(variety.bookings[0].quantity, Decimal::ZERO);
}

/// The full kernel scenario: one booking, one window, one tree, progress
/// set and preserved through re-aggregation
#[test]
fn test_end_to_end_kernel_scenario() {
    let sowing_date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    let window = resolve_window(sowing_date);
    assert_eq!(window.start_at().to_rfc3339(), "2024-06-01T00:00:00+00:00");
    assert_eq!(window.end_at().to_rfc3339(), "2024-06-05T23:59:59.999+00:00");

    let booking_id = Uuid::new_v4();
    let group_ref = Uuid::new_v4();
    let line = SowingLine {
        booking_id,
        farmer_id: Some(Uuid::new_v4()),
        farmer_reg_no: Some("FRM-0042".to_string()),
        booking_date: Some(sowing_date),
        plot: None,
        group_ref,
        group_name: "Vegetables".to_string(),
        variety_ref: None,
        variety_name: "Tomato Hybrid".to_string(),
        quantity: Decimal::from(200),
    };

    // first reconciliation of the window
    let mut stored = merge_preserving_progress(&[], aggregate_lines(&[line.clone()]));
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].group_name, "Vegetables");
    let variety = &stored[0].varieties[0];
    assert_eq!(variety.variety_name, "Tomato Hybrid");
    assert_eq!(variety.total, Decimal::from(200));
    assert_eq!(variety.completed, Decimal::ZERO);
    assert_eq!(variety.bookings.len(), 1);
    assert_eq!(variety.bookings[0].booking_id, booking_id);
    assert_eq!(variety.bookings[0].quantity, Decimal::from(200));

    // progress tracker sets completed = 150
    stored[0].varieties[0].completed = Decimal::from(150);

    // full re-aggregation must leave progress alone
    let merged = merge_preserving_progress(&stored, aggregate_lines(&[line]));
    let variety = &merged[0].varieties[0];
    assert_eq!(variety.completed, Decimal::from(150));
    assert_eq!(variety.total, Decimal::from(200));
}
