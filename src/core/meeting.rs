//! Weekly meeting and contribution ledger.
//!
//! This module handles meeting creation, contribution recording, and meeting
//! status reads. Contribution recording is a full-set replacement: the caller
//! supplies the complete member-to-paid map and the ledger is made consistent
//! with it in a single transaction, so re-recording a meeting is idempotent.
//! The owning cycle's running total moves by the recording's delta in the
//! same transaction.

use crate::{
    entities::{Beneficiary, Contribution, Cycle, Meeting, beneficiary, contribution, meeting},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;

/// Read-only snapshot of one meeting's recording progress.
#[derive(Debug)]
pub struct MeetingStatus {
    /// Weekly amount times the group's current active member count.
    pub expected_total: i64,
    /// Sum of the meeting's contribution rows.
    pub total_collected: i64,
    /// How many members have a contribution row.
    pub contributor_count: u64,
    /// Active members in the group right now.
    pub active_members: u64,
    /// Whether every active member has a contribution row.
    pub fully_recorded: bool,
    /// Whether any beneficiaries have been selected.
    pub beneficiaries_selected: bool,
    /// How many beneficiaries are selected.
    pub beneficiary_count: u64,
    /// The cycle's beneficiaries-per-meeting quota.
    pub beneficiaries_required: i32,
}

/// Creates a weekly meeting with a zero collected total.
///
/// Several meetings may share a date; the ledger deliberately performs no
/// date-uniqueness validation.
///
/// # Errors
///
/// Returns an error if the cycle does not exist or has already ended.
pub async fn create_weekly_meeting(
    db: &DatabaseConnection,
    cycle_id: i64,
    date: Date,
    recorded_by: Option<String>,
) -> Result<meeting::Model> {
    let cycle = Cycle::find_by_id(cycle_id)
        .one(db)
        .await?
        .ok_or(Error::CycleNotFound { id: cycle_id })?;
    if !cycle.is_active {
        return Err(Error::validation(
            "Cannot create a meeting in an ended cycle",
        ));
    }

    let now = Utc::now();
    let new_meeting = meeting::ActiveModel {
        cycle_id: Set(cycle.id),
        group_id: Set(cycle.group_id),
        date: Set(date),
        total_collected: Set(0),
        recorded_by: Set(recorded_by),
        updated_at: Set(now),
        synced: Set(false),
        ..Default::default()
    };
    new_meeting.insert(db).await.map_err(Into::into)
}

/// Replaces a meeting's contribution set from a member-to-paid map.
///
/// Within one transaction: deletes all existing contribution rows for the
/// meeting, inserts one row (amount = the cycle's weekly amount) per `true`
/// entry, persists the meeting total as paid-count times weekly amount, and
/// moves the owning cycle's running total by the delta. A contribution is
/// flagged late when it is recorded after the meeting's calendar day.
///
/// # Errors
///
/// Fails, leaving prior state intact, if the meeting or its cycle cannot be
/// found.
pub async fn record_contributions(
    db: &DatabaseConnection,
    meeting_id: i64,
    contributions: &HashMap<i64, bool>,
) -> Result<meeting::Model> {
    let txn = db.begin().await?;

    let meeting = Meeting::find_by_id(meeting_id)
        .one(&txn)
        .await?
        .ok_or(Error::MeetingNotFound { id: meeting_id })?;
    let cycle = Cycle::find_by_id(meeting.cycle_id)
        .one(&txn)
        .await?
        .ok_or(Error::CycleNotFound {
            id: meeting.cycle_id,
        })?;

    Contribution::delete_many()
        .filter(contribution::Column::MeetingId.eq(meeting.id))
        .exec(&txn)
        .await?;

    let now = Utc::now();
    let is_late = now.date_naive() > meeting.date;

    // Sorted so the inserted rows land in a stable order.
    let mut paying: Vec<i64> = contributions
        .iter()
        .filter(|(_, paid)| **paid)
        .map(|(member_id, _)| *member_id)
        .collect();
    paying.sort_unstable();

    for member_id in &paying {
        let row = contribution::ActiveModel {
            meeting_id: Set(meeting.id),
            member_id: Set(*member_id),
            amount: Set(cycle.weekly_amount),
            contributed_at: Set(now),
            is_late: Set(is_late),
            updated_at: Set(now),
            synced: Set(false),
            ..Default::default()
        };
        row.insert(&txn).await?;
    }

    let new_total = paying.len() as i64 * cycle.weekly_amount;
    let delta = new_total - meeting.total_collected;

    let mut updated: meeting::ActiveModel = meeting.into();
    updated.total_collected = Set(new_total);
    updated.updated_at = Set(now);
    updated.synced = Set(false);
    let meeting = updated.update(&txn).await?;

    if delta != 0 {
        crate::core::cycle::adjust_cycle_total_atomic(&txn, cycle.id, delta).await?;
    }

    txn.commit().await?;

    Ok(meeting)
}

/// Computes a meeting's recording progress for display.
///
/// This is a read-only projection; whether a meeting with missing
/// contributions or no beneficiaries may be "closed" is the caller's policy,
/// not the ledger's.
pub async fn get_meeting_status(
    db: &DatabaseConnection,
    meeting_id: i64,
) -> Result<MeetingStatus> {
    let meeting = Meeting::find_by_id(meeting_id)
        .one(db)
        .await?
        .ok_or(Error::MeetingNotFound { id: meeting_id })?;
    let cycle = Cycle::find_by_id(meeting.cycle_id)
        .one(db)
        .await?
        .ok_or(Error::CycleNotFound {
            id: meeting.cycle_id,
        })?;

    let active_members = crate::core::member::count_active_members(db, meeting.group_id).await?;
    let contributor_count = Contribution::find()
        .filter(contribution::Column::MeetingId.eq(meeting.id))
        .count(db)
        .await?;
    let beneficiary_count = Beneficiary::find()
        .filter(beneficiary::Column::MeetingId.eq(meeting.id))
        .count(db)
        .await?;

    Ok(MeetingStatus {
        expected_total: cycle.weekly_amount * active_members as i64,
        total_collected: meeting.total_collected,
        contributor_count,
        active_members,
        fully_recorded: contributor_count == active_members,
        beneficiaries_selected: beneficiary_count > 0,
        beneficiary_count,
        beneficiaries_required: cycle.beneficiaries_per_meeting,
    })
}

/// Lists a cycle's meetings in date order.
pub async fn get_meetings_for_cycle(
    db: &DatabaseConnection,
    cycle_id: i64,
) -> Result<Vec<meeting::Model>> {
    Meeting::find()
        .filter(meeting::Column::CycleId.eq(cycle_id))
        .order_by_asc(meeting::Column::Date)
        .order_by_asc(meeting::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a meeting along with its contributions and beneficiary rows.
///
/// The store has no foreign-key cascade, so children are deleted first. The
/// owning cycle's running total is reduced by whatever the meeting had
/// collected, in the same transaction.
pub async fn delete_meeting(db: &DatabaseConnection, meeting_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let meeting = Meeting::find_by_id(meeting_id)
        .one(&txn)
        .await?
        .ok_or(Error::MeetingNotFound { id: meeting_id })?;

    Contribution::delete_many()
        .filter(contribution::Column::MeetingId.eq(meeting.id))
        .exec(&txn)
        .await?;
    Beneficiary::delete_many()
        .filter(beneficiary::Column::MeetingId.eq(meeting.id))
        .exec(&txn)
        .await?;

    if meeting.total_collected != 0 {
        crate::core::cycle::adjust_cycle_total_atomic(
            &txn,
            meeting.cycle_id,
            -meeting.total_collected,
        )
        .await?;
    }

    Meeting::delete_by_id(meeting.id).exec(&txn).await?;

    txn.commit().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Days;

    fn paid_map(ids: &[i64]) -> HashMap<i64, bool> {
        ids.iter().map(|&id| (id, true)).collect()
    }

    #[tokio::test]
    async fn test_create_weekly_meeting() -> Result<()> {
        let (db, group, cycle) = setup_with_cycle().await?;

        let missing = create_weekly_meeting(&db, 9999, Utc::now().date_naive(), None).await;
        assert!(matches!(missing.unwrap_err(), Error::CycleNotFound { id: 9999 }));

        let meeting = create_test_meeting(&db, cycle.id).await?;
        assert_eq!(meeting.total_collected, 0);
        assert_eq!(meeting.group_id, group.id);
        assert_eq!(meeting.recorded_by.as_deref(), Some("admin"));

        // Two meetings on the same day are allowed.
        let again = create_test_meeting(&db, cycle.id).await?;
        assert_eq!(again.date, meeting.date);

        crate::core::cycle::end_current_cycle(&db, cycle.id).await?;
        let ended = create_weekly_meeting(&db, cycle.id, Utc::now().date_naive(), None).await;
        assert!(matches!(ended.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_record_contributions_totals() -> Result<()> {
        let (db, _group, cycle, members) = setup_with_roster(3).await?;
        let meeting = create_test_meeting(&db, cycle.id).await?;

        let mut map = paid_map(&[members[0].id, members[1].id]);
        map.insert(members[2].id, false);
        let meeting = record_contributions(&db, meeting.id, &map).await?;

        // 2 payers at the 200 weekly amount.
        assert_eq!(meeting.total_collected, 400);
        assert!(!meeting.synced);

        let rows = Contribution::find()
            .filter(contribution::Column::MeetingId.eq(meeting.id))
            .all(&db)
            .await?;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.amount == 200 && !r.is_late));

        let cycle = Cycle::find_by_id(cycle.id).one(&db).await?.unwrap();
        assert_eq!(cycle.total_saved, 400);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_contributions_replaces_prior_set() -> Result<()> {
        let (db, _group, cycle, members) = setup_with_roster(3).await?;
        let meeting = create_test_meeting(&db, cycle.id).await?;

        record_contributions(&db, meeting.id, &paid_map(&[members[0].id, members[1].id]))
            .await?;
        let narrowed = record_contributions(&db, meeting.id, &paid_map(&[members[2].id])).await?;
        assert_eq!(narrowed.total_collected, 200);

        let rows = Contribution::find()
            .filter(contribution::Column::MeetingId.eq(meeting.id))
            .all(&db)
            .await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].member_id, members[2].id);

        // The cycle total tracks the replacement, not the sum of recordings.
        let cycle = Cycle::find_by_id(cycle.id).one(&db).await?.unwrap();
        assert_eq!(cycle.total_saved, 200);

        // Recording the same map twice changes nothing.
        let repeated = record_contributions(&db, meeting.id, &paid_map(&[members[2].id])).await?;
        assert_eq!(repeated.total_collected, 200);
        let rows = Contribution::find()
            .filter(contribution::Column::MeetingId.eq(meeting.id))
            .all(&db)
            .await?;
        assert_eq!(rows.len(), 1);
        let cycle = Cycle::find_by_id(cycle.id).one(&db).await?.unwrap();
        assert_eq!(cycle.total_saved, 200);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_contributions_missing_meeting() -> Result<()> {
        let (db, _group, _cycle) = setup_with_cycle().await?;

        let result = record_contributions(&db, 9999, &HashMap::new()).await;
        assert!(matches!(result.unwrap_err(), Error::MeetingNotFound { id: 9999 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_contributions_recorded_after_meeting_day_are_late() -> Result<()> {
        let (db, _group, cycle, members) = setup_with_roster(2).await?;

        let yesterday = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap();
        let meeting = create_weekly_meeting(&db, cycle.id, yesterday, None).await?;
        record_contributions(&db, meeting.id, &paid_map(&[members[0].id])).await?;

        let rows = Contribution::find()
            .filter(contribution::Column::MeetingId.eq(meeting.id))
            .all(&db)
            .await?;
        assert!(rows[0].is_late);

        Ok(())
    }

    #[tokio::test]
    async fn test_meeting_status() -> Result<()> {
        let (db, _group, cycle, members) = setup_with_roster(3).await?;
        let meeting = create_test_meeting(&db, cycle.id).await?;

        let status = get_meeting_status(&db, meeting.id).await?;
        assert_eq!(status.expected_total, 600);
        assert_eq!(status.total_collected, 0);
        assert_eq!(status.active_members, 3);
        assert!(!status.fully_recorded);
        assert!(!status.beneficiaries_selected);
        assert_eq!(status.beneficiaries_required, 2);

        record_contributions(
            &db,
            meeting.id,
            &paid_map(&[members[0].id, members[1].id, members[2].id]),
        )
        .await?;

        let status = get_meeting_status(&db, meeting.id).await?;
        assert_eq!(status.total_collected, 600);
        assert_eq!(status.contributor_count, 3);
        assert!(status.fully_recorded);

        Ok(())
    }

    #[tokio::test]
    async fn test_meetings_for_cycle_ordered_by_date() -> Result<()> {
        let (db, _group, cycle) = setup_with_cycle().await?;

        let today = Utc::now().date_naive();
        let last_week = today.checked_sub_days(Days::new(7)).unwrap();
        create_weekly_meeting(&db, cycle.id, today, None).await?;
        create_weekly_meeting(&db, cycle.id, last_week, None).await?;

        let meetings = get_meetings_for_cycle(&db, cycle.id).await?;
        assert_eq!(meetings.len(), 2);
        assert_eq!(meetings[0].date, last_week);
        assert_eq!(meetings[1].date, today);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_meeting_cascades_and_restores_total() -> Result<()> {
        let (db, _group, cycle, members) = setup_with_roster(2).await?;
        let meeting = create_test_meeting(&db, cycle.id).await?;
        record_contributions(&db, meeting.id, &paid_map(&[members[0].id, members[1].id]))
            .await?;

        delete_meeting(&db, meeting.id).await?;

        assert!(Meeting::find_by_id(meeting.id).one(&db).await?.is_none());
        let orphans = Contribution::find()
            .filter(contribution::Column::MeetingId.eq(meeting.id))
            .count(&db)
            .await?;
        assert_eq!(orphans, 0);

        let cycle = Cycle::find_by_id(cycle.id).one(&db).await?.unwrap();
        assert_eq!(cycle.total_saved, 0);

        let missing = delete_meeting(&db, meeting.id).await;
        assert!(matches!(missing.unwrap_err(), Error::MeetingNotFound { .. }));

        Ok(())
    }
}
