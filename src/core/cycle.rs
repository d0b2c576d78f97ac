//! Cycle lifecycle management.
//!
//! A cycle is one rotation period for a group: it fixes the weekly amount,
//! the monthly savings target, and the beneficiaries-per-meeting quota. At
//! most one cycle per group is active at any time; starting a new cycle
//! atomically ends the previous one. Ending a cycle (either way) materializes
//! a monthly savings bucket for every calendar month the cycle spanned, so
//! history never has missing months.

use crate::{
    entities::{Beneficiary, Cycle, Group, Meeting, beneficiary, cycle, meeting},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, Set, TransactionTrait, prelude::*};

/// Aggregated view over one cycle's meetings and payouts.
#[derive(Debug)]
pub struct CycleStats {
    /// Sum of every meeting's collected total.
    pub total_collected: i64,
    /// Sum of every payout made in the cycle.
    pub total_distributed: i64,
    /// How many meetings the cycle has held.
    pub meeting_count: u64,
    /// Active members who have not yet received a payout this cycle.
    pub eligible_member_count: u64,
}

/// Starts a new cycle for a group, ending any currently-active cycle first.
///
/// Both steps run in one transaction, so exactly one active cycle per group
/// holds after this call. The ended cycle gets its missing monthly buckets
/// materialized, same as an explicit end.
///
/// # Errors
///
/// Returns an error if:
/// - The weekly amount or monthly target is not positive
/// - The quota is below one
/// - The group does not exist
pub async fn start_new_cycle(
    db: &DatabaseConnection,
    group_id: i64,
    weekly_amount: i64,
    monthly_target: i64,
    total_members: i32,
    start_date: DateTimeUtc,
    beneficiaries_per_meeting: i32,
) -> Result<cycle::Model> {
    if weekly_amount <= 0 {
        return Err(Error::InvalidAmount {
            amount: weekly_amount,
        });
    }
    if monthly_target <= 0 {
        return Err(Error::InvalidAmount {
            amount: monthly_target,
        });
    }
    if beneficiaries_per_meeting < 1 {
        return Err(Error::validation(
            "At least one beneficiary per meeting is required",
        ));
    }

    let group = Group::find_by_id(group_id).one(db).await?;
    if group.is_none() {
        return Err(Error::GroupNotFound { id: group_id });
    }

    let txn = db.begin().await?;
    let now = Utc::now();

    let active_cycles = Cycle::find()
        .filter(cycle::Column::GroupId.eq(group_id))
        .filter(cycle::Column::IsActive.eq(true))
        .all(&txn)
        .await?;
    for active in active_cycles {
        end_cycle_in_txn(&txn, active, now).await?;
    }

    let new_cycle = cycle::ActiveModel {
        group_id: Set(group_id),
        start_date: Set(start_date),
        end_date: Set(None),
        is_active: Set(true),
        weekly_amount: Set(weekly_amount),
        monthly_target: Set(monthly_target),
        beneficiaries_per_meeting: Set(beneficiaries_per_meeting),
        total_members: Set(total_members),
        total_saved: Set(0),
        updated_at: Set(now),
        synced: Set(false),
        ..Default::default()
    };
    let created = new_cycle.insert(&txn).await?;

    txn.commit().await?;

    Ok(created)
}

/// Ends a cycle by explicit action.
///
/// # Errors
///
/// Fails if the cycle does not exist or has already ended.
pub async fn end_current_cycle(db: &DatabaseConnection, cycle_id: i64) -> Result<cycle::Model> {
    let cycle = Cycle::find_by_id(cycle_id)
        .one(db)
        .await?
        .ok_or(Error::CycleNotFound { id: cycle_id })?;
    if !cycle.is_active {
        return Err(Error::validation(format!(
            "Cycle {cycle_id} has already ended"
        )));
    }

    let txn = db.begin().await?;
    let ended = end_cycle_in_txn(&txn, cycle, Utc::now()).await?;
    txn.commit().await?;

    Ok(ended)
}

/// Seals a cycle inside an open transaction.
///
/// Every calendar month from the cycle's start through `now` gets a savings
/// bucket if it does not have one, then the end date is stamped and the
/// active flag cleared.
async fn end_cycle_in_txn<C: ConnectionTrait>(
    conn: &C,
    cycle: cycle::Model,
    now: DateTimeUtc,
) -> Result<cycle::Model> {
    for key in crate::core::savings::month_keys_between(cycle.start_date, now) {
        crate::core::savings::ensure_month_exists(
            conn,
            cycle.id,
            cycle.group_id,
            &key,
            cycle.monthly_target,
        )
        .await?;
    }

    let mut active: cycle::ActiveModel = cycle.into();
    active.is_active = Set(false);
    active.end_date = Set(Some(now));
    active.updated_at = Set(now);
    active.synced = Set(false);
    active.update(conn).await.map_err(Into::into)
}

/// Finds the group's active cycle, if one exists.
pub async fn get_active_cycle(
    db: &DatabaseConnection,
    group_id: i64,
) -> Result<Option<cycle::Model>> {
    Cycle::find()
        .filter(cycle::Column::GroupId.eq(group_id))
        .filter(cycle::Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Moves a cycle's running total by a delta, atomically.
///
/// Uses a single SQL UPDATE (`total_saved = total_saved + delta`) instead of
/// read-modify-write so concurrent recordings cannot lose updates. The row is
/// re-stamped for sync in the same statement.
///
/// # Arguments
/// * `db` - Database connection or transaction
/// * `cycle_id` - ID of the cycle to update
/// * `delta` - Amount to add (negative to subtract)
///
/// # Returns
/// The updated cycle model
pub async fn adjust_cycle_total_atomic<C>(
    db: &C,
    cycle_id: i64,
    delta: i64,
) -> Result<cycle::Model>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    let _cycle = Cycle::find_by_id(cycle_id)
        .one(db)
        .await?
        .ok_or(Error::CycleNotFound { id: cycle_id })?;

    Cycle::update_many()
        .col_expr(
            cycle::Column::TotalSaved,
            Expr::col(cycle::Column::TotalSaved).add(delta),
        )
        .col_expr(cycle::Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(cycle::Column::Synced, Expr::value(false))
        .filter(cycle::Column::Id.eq(cycle_id))
        .exec(db)
        .await?;

    Cycle::find_by_id(cycle_id)
        .one(db)
        .await?
        .ok_or(Error::CycleNotFound { id: cycle_id })
}

/// Aggregates a cycle's collection, distribution, and eligibility numbers.
///
/// # Errors
///
/// Fails if the cycle does not exist.
pub async fn get_cycle_stats(db: &DatabaseConnection, cycle_id: i64) -> Result<CycleStats> {
    let cycle = Cycle::find_by_id(cycle_id)
        .one(db)
        .await?
        .ok_or(Error::CycleNotFound { id: cycle_id })?;

    let meetings = Meeting::find()
        .filter(meeting::Column::CycleId.eq(cycle.id))
        .all(db)
        .await?;
    let total_collected: i64 = meetings.iter().map(|m| m.total_collected).sum();

    let payouts = Beneficiary::find()
        .filter(beneficiary::Column::CycleId.eq(cycle.id))
        .all(db)
        .await?;
    let total_distributed: i64 = payouts.iter().map(|b| b.amount_received).sum();

    let eligible =
        crate::core::beneficiary::get_eligible_members_for_cycle(db, cycle.id).await?;

    Ok(CycleStats {
        total_collected,
        total_distributed,
        meeting_count: meetings.len() as u64,
        eligible_member_count: eligible.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{beneficiary as rotation, meeting as ledger, savings};
    use crate::test_utils::*;
    use chrono::Months;
    use sea_orm::PaginatorTrait;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_start_new_cycle_validations() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db).await?;
        let now = Utc::now();

        let bad_weekly = start_new_cycle(&db, group.id, 0, 500, 5, now, 2).await;
        assert!(matches!(bad_weekly.unwrap_err(), Error::InvalidAmount { amount: 0 }));

        let bad_target = start_new_cycle(&db, group.id, 200, -5, 5, now, 2).await;
        assert!(matches!(bad_target.unwrap_err(), Error::InvalidAmount { amount: -5 }));

        let bad_quota = start_new_cycle(&db, group.id, 200, 500, 5, now, 0).await;
        assert!(matches!(bad_quota.unwrap_err(), Error::Validation { .. }));

        let no_group = start_new_cycle(&db, 9999, 200, 500, 5, now, 2).await;
        assert!(matches!(no_group.unwrap_err(), Error::GroupNotFound { id: 9999 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_start_new_cycle_ends_previous() -> Result<()> {
        let (db, group, first) = setup_with_cycle().await?;
        assert!(first.is_active);

        let second = start_new_cycle(&db, group.id, 300, 600, 8, Utc::now(), 3).await?;
        assert!(second.is_active);
        assert_eq!(second.total_saved, 0);

        let first = Cycle::find_by_id(first.id).one(&db).await?.unwrap();
        assert!(!first.is_active);
        assert!(first.end_date.is_some());

        let active = get_active_cycle(&db, group.id).await?.unwrap();
        assert_eq!(active.id, second.id);

        let active_count = Cycle::find()
            .filter(cycle::Column::GroupId.eq(group.id))
            .filter(cycle::Column::IsActive.eq(true))
            .count(&db)
            .await?;
        assert_eq!(active_count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_end_current_cycle() -> Result<()> {
        let (db, group, cycle) = setup_with_cycle().await?;

        let missing = end_current_cycle(&db, 9999).await;
        assert!(matches!(missing.unwrap_err(), Error::CycleNotFound { id: 9999 }));

        let ended = end_current_cycle(&db, cycle.id).await?;
        assert!(!ended.is_active);
        assert!(ended.end_date.is_some());
        assert!(!ended.synced);
        assert!(get_active_cycle(&db, group.id).await?.is_none());

        let twice = end_current_cycle(&db, cycle.id).await;
        assert!(matches!(twice.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_end_cycle_materializes_missing_months() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db).await?;
        let member = create_test_member(&db, group.id, "Achieng", "0700000001").await?;

        let start = Utc::now().checked_sub_months(Months::new(2)).unwrap();
        let cycle = start_new_cycle(&db, group.id, 200, 500, 1, start, 2).await?;

        let keys = savings::month_keys_between(start, Utc::now());
        assert_eq!(keys.len(), 3);

        // Put money in the middle month only, then seal the cycle.
        savings::record_monthly_savings(&db, cycle.id, &keys[1], member.id, 100, "admin".into())
            .await?;
        end_current_cycle(&db, cycle.id).await?;

        for key in &keys {
            let bucket = savings::get_monthly_saving(&db, cycle.id, key).await?;
            assert!(bucket.is_some(), "missing bucket for {key}");
        }
        let middle = savings::get_monthly_saving(&db, cycle.id, &keys[1]).await?.unwrap();
        assert_eq!(middle.actual_amount, 100);

        let buckets = crate::entities::MonthlySaving::find().count(&db).await?;
        assert_eq!(buckets, keys.len() as u64);

        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_cycle_total_atomic() -> Result<()> {
        let (db, _group, cycle) = setup_with_cycle().await?;

        let missing = adjust_cycle_total_atomic(&db, 9999, 100).await;
        assert!(matches!(missing.unwrap_err(), Error::CycleNotFound { id: 9999 }));

        let up = adjust_cycle_total_atomic(&db, cycle.id, 500).await?;
        assert_eq!(up.total_saved, 500);
        assert!(!up.synced);

        let down = adjust_cycle_total_atomic(&db, cycle.id, -200).await?;
        assert_eq!(down.total_saved, 300);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_cycle_stats() -> Result<()> {
        let (db, _group, cycle, members) = setup_with_roster(4).await?;

        let missing = get_cycle_stats(&db, 9999).await;
        assert!(matches!(missing.unwrap_err(), Error::CycleNotFound { id: 9999 }));

        let first = create_test_meeting(&db, cycle.id).await?;
        let all_paid: HashMap<i64, bool> =
            members.iter().map(|m| (m.id, true)).collect();
        ledger::record_contributions(&db, first.id, &all_paid).await?;
        rotation::select_beneficiaries(&db, first.id, &[members[0].id, members[1].id]).await?;

        let second = create_test_meeting(&db, cycle.id).await?;
        let two_paid: HashMap<i64, bool> = members
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id, i < 2))
            .collect();
        ledger::record_contributions(&db, second.id, &two_paid).await?;

        let stats = get_cycle_stats(&db, cycle.id).await?;
        assert_eq!(stats.total_collected, 1200);
        assert_eq!(stats.total_distributed, 400);
        assert_eq!(stats.meeting_count, 2);
        assert_eq!(stats.eligible_member_count, 2);

        Ok(())
    }
}
