//! Beneficiary rotation engine.
//!
//! The core rule of a rotating-savings group lives here: a member may
//! receive a payout at most once per cycle. Eligibility queries apply the
//! rule for callers building selection lists, and the write path re-checks
//! it defensively so no caller can corrupt a rotation by handing in ids it
//! never sourced from the eligibility query. A meeting's selection is
//! replaced wholesale (delete-then-insert) every time it is confirmed.

use crate::{
    entities::{Beneficiary, Cycle, Meeting, Member, beneficiary, member},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashSet;

/// Lists the active members who have not yet received a payout in the cycle.
///
/// This is the binding rotation rule: one payout per member per cycle.
/// Results keep the roster's name ordering.
pub async fn get_eligible_members_for_cycle(
    db: &DatabaseConnection,
    cycle_id: i64,
) -> Result<Vec<member::Model>> {
    let cycle = Cycle::find_by_id(cycle_id)
        .one(db)
        .await?
        .ok_or(Error::CycleNotFound { id: cycle_id })?;

    let benefited: HashSet<i64> = Beneficiary::find()
        .filter(beneficiary::Column::CycleId.eq(cycle.id))
        .all(db)
        .await?
        .into_iter()
        .map(|b| b.member_id)
        .collect();

    let members = crate::core::member::get_active_members(db, cycle.group_id).await?;
    Ok(members
        .into_iter()
        .filter(|m| !benefited.contains(&m.id))
        .collect())
}

/// Lists the active members without a payout at this particular meeting.
///
/// Narrower than the cycle-wide rule; used when re-opening one meeting's
/// selection for editing.
pub async fn get_eligible_members_for_meeting(
    db: &DatabaseConnection,
    meeting_id: i64,
) -> Result<Vec<member::Model>> {
    let meeting = Meeting::find_by_id(meeting_id)
        .one(db)
        .await?
        .ok_or(Error::MeetingNotFound { id: meeting_id })?;

    let selected: HashSet<i64> = Beneficiary::find()
        .filter(beneficiary::Column::MeetingId.eq(meeting.id))
        .all(db)
        .await?
        .into_iter()
        .map(|b| b.member_id)
        .collect();

    let members = crate::core::member::get_active_members(db, meeting.group_id).await?;
    Ok(members
        .into_iter()
        .filter(|m| !selected.contains(&m.id))
        .collect())
}

/// Replaces a meeting's beneficiary selection.
///
/// Each selected member receives the cycle's weekly amount; payment order is
/// the 1-based position in the supplied list, nothing fancier. An empty list
/// clears the selection. The whole replacement is one transaction, so a
/// failed call leaves the previous selection untouched.
///
/// Every supplied id is re-validated at write time: it must be an active
/// member of the meeting's group, appear only once in the list, and have no
/// payout at any *other* meeting of the cycle (rows at this meeting are
/// about to be replaced, so they do not disqualify).
///
/// # Errors
///
/// Returns an error if:
/// - The meeting or its cycle does not exist
/// - More ids are supplied than the cycle's beneficiaries-per-meeting quota
/// - An id is duplicated, unknown, inactive, or outside the group
/// - A member already received a payout elsewhere in the cycle
pub async fn select_beneficiaries(
    db: &DatabaseConnection,
    meeting_id: i64,
    beneficiary_ids: &[i64],
) -> Result<Vec<beneficiary::Model>> {
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

    if beneficiary_ids.len() > cycle.beneficiaries_per_meeting as usize {
        return Err(Error::TooManyBeneficiaries {
            selected: beneficiary_ids.len(),
            quota: cycle.beneficiaries_per_meeting,
        });
    }

    let mut seen = HashSet::new();
    for &id in beneficiary_ids {
        if !seen.insert(id) {
            return Err(Error::validation(format!(
                "Member {id} appears more than once in the selection"
            )));
        }
    }

    let active_ids: HashSet<i64> =
        crate::core::member::get_active_members(&txn, cycle.group_id)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();
    let benefited_elsewhere: HashSet<i64> = Beneficiary::find()
        .filter(beneficiary::Column::CycleId.eq(cycle.id))
        .filter(beneficiary::Column::MeetingId.ne(meeting.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|b| b.member_id)
        .collect();

    for &id in beneficiary_ids {
        if !active_ids.contains(&id) {
            let exists = Member::find_by_id(id).one(&txn).await?.is_some();
            if exists {
                return Err(Error::validation(format!(
                    "Member {id} is not an active member of this group"
                )));
            }
            return Err(Error::MemberNotFound { id });
        }
        if benefited_elsewhere.contains(&id) {
            return Err(Error::AlreadyBeneficiary { member_id: id });
        }
    }

    Beneficiary::delete_many()
        .filter(beneficiary::Column::MeetingId.eq(meeting.id))
        .exec(&txn)
        .await?;

    let now = Utc::now();
    let mut inserted = Vec::with_capacity(beneficiary_ids.len());
    for (index, &member_id) in beneficiary_ids.iter().enumerate() {
        let row = beneficiary::ActiveModel {
            meeting_id: Set(meeting.id),
            cycle_id: Set(cycle.id),
            member_id: Set(member_id),
            amount_received: Set(cycle.weekly_amount),
            payment_order: Set(index as i32 + 1),
            awarded_at: Set(now),
            updated_at: Set(now),
            synced: Set(false),
            ..Default::default()
        };
        inserted.push(row.insert(&txn).await?);
    }

    txn.commit().await?;

    Ok(inserted)
}

/// Lists a meeting's payouts in payment order.
pub async fn get_beneficiaries_for_meeting(
    db: &DatabaseConnection,
    meeting_id: i64,
) -> Result<Vec<beneficiary::Model>> {
    Beneficiary::find()
        .filter(beneficiary::Column::MeetingId.eq(meeting_id))
        .order_by_asc(beneficiary::Column::PaymentOrder)
        .all(db)
        .await
        .map_err(Into::into)
}
