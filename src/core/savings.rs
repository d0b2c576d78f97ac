//! Monthly savings tracking and rollover.
//!
//! Savings are organized into per-month buckets keyed by a `"MM/yyyy"`
//! string. Each member deposit is an entry against the current bucket; the
//! bucket's `actual_amount` is recomputed from its entries inside the same
//! transaction as the insert, so the stored total can never drift from the
//! entry rows. When a bucket reaches its target the next calendar month's
//! bucket is opened immediately.

use crate::{
    entities::{
        Cycle, Member, MonthlySaving, MonthlySavingEntry, monthly_saving, monthly_saving_entry,
    },
    errors::{Error, Result},
};
use chrono::{Datelike, Utc};
use sea_orm::{ConnectionTrait, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;

/// Outcome of recording one savings entry.
#[derive(Debug)]
pub struct SavingsOutcome {
    /// The bucket after the entry was applied.
    pub saving: monthly_saving::Model,
    /// The entry that was inserted.
    pub entry: monthly_saving_entry::Model,
    /// Whether this entry pushed the bucket to its target and opened the
    /// next month's bucket.
    pub rolled_over: bool,
}

/// Progress of one month's savings bucket against its targets.
#[derive(Debug)]
pub struct SavingsProgress {
    /// Month key of the bucket.
    pub month_year: String,
    /// Per-member target stored on the bucket.
    pub member_target: i64,
    /// Per-member target multiplied by the current active member count.
    pub group_target: i64,
    /// Sum of all entries in the bucket.
    pub total_saved: i64,
    /// Active members in the group right now.
    pub active_members: u64,
    /// Members whose own entries sum to at least the per-member target.
    pub members_met_target: u64,
}

/// Parses a `"MM/yyyy"` month key into (month, year).
///
/// The key is strict: the month part must be two digits in 01-12 and the
/// year part four digits, so the same calendar month can never appear under
/// two different keys.
pub fn parse_month_year(month_year: &str) -> Result<(u32, i32)> {
    let invalid = || {
        Error::validation(format!(
            "Invalid month key '{month_year}', expected MM/yyyy"
        ))
    };

    let (month_part, year_part) = month_year.split_once('/').ok_or_else(invalid)?;
    if month_part.len() != 2 || year_part.len() != 4 {
        return Err(invalid());
    }

    let month: u32 = month_part.parse().map_err(|_| invalid())?;
    let year: i32 = year_part.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }

    Ok((month, year))
}

/// Formats (month, year) as a `"MM/yyyy"` key.
#[must_use]
pub fn format_month_year(month: u32, year: i32) -> String {
    format!("{month:02}/{year}")
}

/// Returns the key of the calendar month after the given one.
pub fn next_month_key(month_year: &str) -> Result<String> {
    let (month, year) = parse_month_year(month_year)?;
    if month == 12 {
        Ok(format_month_year(1, year + 1))
    } else {
        Ok(format_month_year(month + 1, year))
    }
}

/// Lists every month key from `start`'s month through `end`'s month,
/// inclusive. Empty when `end` falls in a month before `start`.
#[must_use]
pub fn month_keys_between(start: DateTimeUtc, end: DateTimeUtc) -> Vec<String> {
    let mut year = start.year();
    let mut month = start.month();
    let end_at = (end.year(), end.month());

    let mut keys = Vec::new();
    while (year, month) <= end_at {
        keys.push(format_month_year(month, year));
        if month == 12 {
            month = 1;
            year += 1;
        } else {
            month += 1;
        }
    }
    keys
}

/// Returns the bucket for (cycle, month), creating it with a zero actual
/// amount if it does not exist yet.
///
/// Generic over the connection so cycle termination can materialize missing
/// months inside its own transaction.
pub async fn ensure_month_exists<C: ConnectionTrait>(
    conn: &C,
    cycle_id: i64,
    group_id: i64,
    month_year: &str,
    target_amount: i64,
) -> Result<monthly_saving::Model> {
    parse_month_year(month_year)?;

    let existing = MonthlySaving::find()
        .filter(monthly_saving::Column::CycleId.eq(cycle_id))
        .filter(monthly_saving::Column::MonthYear.eq(month_year))
        .one(conn)
        .await?;
    if let Some(bucket) = existing {
        return Ok(bucket);
    }

    let now = Utc::now();
    let bucket = monthly_saving::ActiveModel {
        cycle_id: Set(cycle_id),
        group_id: Set(group_id),
        month_year: Set(month_year.to_string()),
        target_amount: Set(target_amount),
        actual_amount: Set(0),
        updated_at: Set(now),
        synced: Set(false),
        ..Default::default()
    };
    bucket.insert(conn).await.map_err(Into::into)
}

/// Finds the bucket for (cycle, month) without creating it.
pub async fn get_monthly_saving(
    db: &DatabaseConnection,
    cycle_id: i64,
    month_year: &str,
) -> Result<Option<monthly_saving::Model>> {
    MonthlySaving::find()
        .filter(monthly_saving::Column::CycleId.eq(cycle_id))
        .filter(monthly_saving::Column::MonthYear.eq(month_year))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Records one member deposit against a month's savings bucket.
///
/// Runs in a single transaction: the bucket is created if missing, the
/// entry inserted, and the bucket total recomputed from its entries. If the
/// new total meets the bucket's target, the next calendar month's bucket is
/// opened so the group immediately sees its new goal.
///
/// # Errors
///
/// Returns an error if:
/// - The amount is not positive
/// - The month key is not valid `"MM/yyyy"`
/// - The cycle or member does not exist
/// - The member belongs to a different group than the cycle
pub async fn record_monthly_savings(
    db: &DatabaseConnection,
    cycle_id: i64,
    month_year: &str,
    member_id: i64,
    amount: i64,
    recorded_by: String,
) -> Result<SavingsOutcome> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }
    parse_month_year(month_year)?;

    let cycle = Cycle::find_by_id(cycle_id)
        .one(db)
        .await?
        .ok_or(Error::CycleNotFound { id: cycle_id })?;
    let member = Member::find_by_id(member_id)
        .one(db)
        .await?
        .ok_or(Error::MemberNotFound { id: member_id })?;
    if member.group_id != cycle.group_id {
        return Err(Error::validation(format!(
            "Member {} does not belong to the cycle's group",
            member.name
        )));
    }

    let txn = db.begin().await?;

    let saving =
        ensure_month_exists(&txn, cycle.id, cycle.group_id, month_year, cycle.monthly_target)
            .await?;

    let now = Utc::now();
    let entry = monthly_saving_entry::ActiveModel {
        saving_id: Set(saving.id),
        member_id: Set(member_id),
        amount: Set(amount),
        entry_date: Set(now),
        recorded_by: Set(recorded_by),
        updated_at: Set(now),
        synced: Set(false),
        ..Default::default()
    };
    let entry = entry.insert(&txn).await?;

    // Recompute the total from the entry rows, once, so the denormalized
    // amount and the entries can never disagree.
    let entries = MonthlySavingEntry::find()
        .filter(monthly_saving_entry::Column::SavingId.eq(saving.id))
        .all(&txn)
        .await?;
    let new_total: i64 = entries.iter().map(|e| e.amount).sum();

    let mut bucket: monthly_saving::ActiveModel = saving.into();
    bucket.actual_amount = Set(new_total);
    bucket.updated_at = Set(now);
    bucket.synced = Set(false);
    let saving = bucket.update(&txn).await?;

    let mut rolled_over = false;
    if new_total >= saving.target_amount {
        let next_key = next_month_key(month_year)?;
        let next_exists = MonthlySaving::find()
            .filter(monthly_saving::Column::CycleId.eq(cycle.id))
            .filter(monthly_saving::Column::MonthYear.eq(next_key.clone()))
            .one(&txn)
            .await?
            .is_some();
        if !next_exists {
            ensure_month_exists(&txn, cycle.id, cycle.group_id, &next_key, cycle.monthly_target)
                .await?;
            rolled_over = true;
        }
    }

    txn.commit().await?;

    Ok(SavingsOutcome {
        saving,
        entry,
        rolled_over,
    })
}

/// Computes a month's savings progress for display.
///
/// # Errors
///
/// Fails with a typed not-found error if the bucket does not exist.
pub async fn get_monthly_savings_progress(
    db: &DatabaseConnection,
    cycle_id: i64,
    month_year: &str,
) -> Result<SavingsProgress> {
    let saving = get_monthly_saving(db, cycle_id, month_year)
        .await?
        .ok_or_else(|| Error::SavingNotFound {
            cycle_id,
            month_year: month_year.to_string(),
        })?;

    let active_members = super::member::count_active_members(db, saving.group_id).await?;

    let entries = MonthlySavingEntry::find()
        .filter(monthly_saving_entry::Column::SavingId.eq(saving.id))
        .all(db)
        .await?;
    let mut per_member: HashMap<i64, i64> = HashMap::new();
    for entry in &entries {
        *per_member.entry(entry.member_id).or_insert(0) += entry.amount;
    }
    let members_met_target = per_member
        .values()
        .filter(|&&total| total >= saving.target_amount)
        .count() as u64;

    Ok(SavingsProgress {
        month_year: saving.month_year,
        member_target: saving.target_amount,
        group_target: saving.target_amount * active_members as i64,
        total_saved: saving.actual_amount,
        active_members,
        members_met_target,
    })
}
