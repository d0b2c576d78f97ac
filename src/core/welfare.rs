//! Welfare subsystem.
//!
//! Welfare collections run beside the cycle machinery and follow looser
//! rules: contribution amounts are caller-chosen rather than fixed, and
//! beneficiary selection has no quota and no once-per-cycle exclusivity. The
//! pot is split evenly across the selected members with integer division;
//! the remainder stays undistributed on purpose.

use crate::{
    entities::{
        Group, Member, WelfareBeneficiary, WelfareContribution, WelfareMeeting, member,
        welfare_beneficiary, welfare_contribution, welfare_meeting,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::{HashMap, HashSet};

/// Creates a welfare meeting with a zero collected total.
pub async fn create_welfare_meeting(
    db: &DatabaseConnection,
    group_id: i64,
    date: Date,
    recorded_by: Option<String>,
) -> Result<welfare_meeting::Model> {
    let group = Group::find_by_id(group_id).one(db).await?;
    if group.is_none() {
        return Err(Error::GroupNotFound { id: group_id });
    }

    let now = Utc::now();
    let new_meeting = welfare_meeting::ActiveModel {
        group_id: Set(group_id),
        date: Set(date),
        total_collected: Set(0),
        contributor_names: Set(String::new()),
        recorded_by: Set(recorded_by),
        updated_at: Set(now),
        synced: Set(false),
        ..Default::default()
    };
    new_meeting.insert(db).await.map_err(Into::into)
}

/// Replaces a welfare meeting's contribution set from a member-to-amount map.
///
/// Same full-replacement pattern as the weekly ledger, but each amount is
/// caller-chosen. Entries with a zero or negative amount are skipped rather
/// than rejected: they mean "did not contribute". The meeting row gets the
/// new total and a comma-joined list of contributor names, ordered by name,
/// for list screens.
///
/// # Errors
///
/// Fails if the meeting does not exist or a contributing member is unknown
/// or belongs to a different group.
pub async fn record_welfare_contributions(
    db: &DatabaseConnection,
    meeting_id: i64,
    contributions: &HashMap<i64, i64>,
) -> Result<welfare_meeting::Model> {
    let txn = db.begin().await?;

    let meeting = WelfareMeeting::find_by_id(meeting_id)
        .one(&txn)
        .await?
        .ok_or(Error::WelfareMeetingNotFound { id: meeting_id })?;

    let mut paying: Vec<(i64, i64)> = contributions
        .iter()
        .filter(|(_, amount)| **amount > 0)
        .map(|(member_id, amount)| (*member_id, *amount))
        .collect();
    paying.sort_unstable();

    // Contributor rows always carry a display name, so every paying id must
    // resolve to a member of this group.
    let ids: Vec<i64> = paying.iter().map(|(id, _)| *id).collect();
    let members: HashMap<i64, member::Model> = Member::find()
        .filter(member::Column::Id.is_in(ids.clone()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    for id in &ids {
        match members.get(id) {
            None => return Err(Error::MemberNotFound { id: *id }),
            Some(m) if m.group_id != meeting.group_id => {
                return Err(Error::validation(format!(
                    "Member {} does not belong to this group",
                    m.name
                )));
            }
            Some(_) => {}
        }
    }

    WelfareContribution::delete_many()
        .filter(welfare_contribution::Column::MeetingId.eq(meeting.id))
        .exec(&txn)
        .await?;

    let now = Utc::now();
    for (member_id, amount) in &paying {
        let row = welfare_contribution::ActiveModel {
            meeting_id: Set(meeting.id),
            member_id: Set(*member_id),
            amount: Set(*amount),
            contributed_at: Set(now),
            updated_at: Set(now),
            synced: Set(false),
            ..Default::default()
        };
        row.insert(&txn).await?;
    }

    let total: i64 = paying.iter().map(|(_, amount)| amount).sum();
    let mut names: Vec<&str> = ids
        .iter()
        .filter_map(|id| members.get(id).map(|m| m.name.as_str()))
        .collect();
    names.sort_unstable();

    let mut updated: welfare_meeting::ActiveModel = meeting.into();
    updated.total_collected = Set(total);
    updated.contributor_names = Set(names.join(", "));
    updated.updated_at = Set(now);
    updated.synced = Set(false);
    let meeting = updated.update(&txn).await?;

    txn.commit().await?;

    Ok(meeting)
}

/// Replaces a welfare meeting's beneficiary selection.
///
/// Every selected member receives an equal share of the pot:
/// floor(total collected / beneficiary count). Whatever integer division
/// leaves over is deliberately not distributed. There is no quota and no
/// cross-meeting exclusivity; the same member may benefit at any number of
/// welfare meetings.
///
/// # Errors
///
/// Returns an error if the meeting does not exist, an id is duplicated, or
/// an id is not an active member of the meeting's group.
pub async fn select_welfare_beneficiaries(
    db: &DatabaseConnection,
    meeting_id: i64,
    beneficiary_ids: &[i64],
) -> Result<Vec<welfare_beneficiary::Model>> {
    let txn = db.begin().await?;

    let meeting = WelfareMeeting::find_by_id(meeting_id)
        .one(&txn)
        .await?
        .ok_or(Error::WelfareMeetingNotFound { id: meeting_id })?;

    let mut seen = HashSet::new();
    for &id in beneficiary_ids {
        if !seen.insert(id) {
            return Err(Error::validation(format!(
                "Member {id} appears more than once in the selection"
            )));
        }
    }

    let active_ids: HashSet<i64> =
        crate::core::member::get_active_members(&txn, meeting.group_id)
            .await?
            .into_iter()
            .map(|m| m.id)
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
    }

    WelfareBeneficiary::delete_many()
        .filter(welfare_beneficiary::Column::MeetingId.eq(meeting.id))
        .exec(&txn)
        .await?;

    let share = meeting.total_collected / std::cmp::max(1, beneficiary_ids.len() as i64);
    let now = Utc::now();
    let mut inserted = Vec::with_capacity(beneficiary_ids.len());
    for (index, &member_id) in beneficiary_ids.iter().enumerate() {
        let row = welfare_beneficiary::ActiveModel {
            meeting_id: Set(meeting.id),
            member_id: Set(member_id),
            amount_received: Set(share),
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

/// Lists a welfare meeting's payouts in payment order.
pub async fn get_welfare_beneficiaries(
    db: &DatabaseConnection,
    meeting_id: i64,
) -> Result<Vec<welfare_beneficiary::Model>> {
    WelfareBeneficiary::find()
        .filter(welfare_beneficiary::Column::MeetingId.eq(meeting_id))
        .order_by_asc(welfare_beneficiary::Column::PaymentOrder)
        .all(db)
        .await
        .map_err(Into::into)
}
