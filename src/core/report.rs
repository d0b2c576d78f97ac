//! Report generation business logic.
//!
//! Builds structured summaries of a cycle's activity for display. Functions
//! here are read-only aggregations; the formatting helpers return plain
//! strings so callers can log them or print them as they like.

use crate::{
    core::cycle::CycleStats,
    entities::{Beneficiary, Cycle, Group, beneficiary, cycle, group},
    errors::{Error, Result},
};
use sea_orm::prelude::*;
use std::collections::HashMap;

/// One meeting's line in a cycle report.
#[derive(Debug)]
pub struct MeetingLine {
    /// Calendar day the meeting was held.
    pub date: Date,
    /// What the meeting collected.
    pub total_collected: i64,
    /// How many beneficiaries were paid at the meeting.
    pub beneficiary_count: u64,
}

/// A full cycle summary: the cycle, its group, aggregate stats, and one
/// line per meeting in date order.
#[derive(Debug)]
pub struct CycleReport {
    /// The cycle being reported on.
    pub cycle: cycle::Model,
    /// The group that owns the cycle.
    pub group: group::Model,
    /// Aggregates over the cycle's meetings and payouts.
    pub stats: CycleStats,
    /// Per-meeting lines, ordered by date.
    pub meetings: Vec<MeetingLine>,
}

/// Generates a cycle report.
///
/// # Errors
///
/// Fails if the cycle, or the group it points at, does not exist.
pub async fn generate_cycle_report(
    db: &DatabaseConnection,
    cycle_id: i64,
) -> Result<CycleReport> {
    let cycle = Cycle::find_by_id(cycle_id)
        .one(db)
        .await?
        .ok_or(Error::CycleNotFound { id: cycle_id })?;
    let group = Group::find_by_id(cycle.group_id)
        .one(db)
        .await?
        .ok_or(Error::GroupNotFound { id: cycle.group_id })?;

    let stats = crate::core::cycle::get_cycle_stats(db, cycle_id).await?;
    let meetings = crate::core::meeting::get_meetings_for_cycle(db, cycle_id).await?;

    // One query for all of the cycle's payouts, bucketed per meeting.
    let mut payout_counts: HashMap<i64, u64> = HashMap::new();
    let payouts = Beneficiary::find()
        .filter(beneficiary::Column::CycleId.eq(cycle.id))
        .all(db)
        .await?;
    for payout in &payouts {
        *payout_counts.entry(payout.meeting_id).or_insert(0) += 1;
    }

    let meetings = meetings
        .into_iter()
        .map(|m| MeetingLine {
            date: m.date,
            total_collected: m.total_collected,
            beneficiary_count: payout_counts.get(&m.id).copied().unwrap_or(0),
        })
        .collect();

    Ok(CycleReport {
        cycle,
        group,
        stats,
        meetings,
    })
}

/// Formats a cycle report into a human-readable summary string.
/// This is useful for logging or displaying a cycle's standing.
#[must_use]
pub fn format_cycle_report(report: &CycleReport) -> String {
    use std::fmt::Write;

    let status = if report.cycle.is_active {
        "active"
    } else {
        "ended"
    };
    let mut summary = format!(
        "Cycle Report - {} - started {} ({status})\n",
        report.group.name,
        report.cycle.start_date.format("%d %B %Y")
    );

    // write! is infallible when writing to String, so unwrap is safe
    write!(
        summary,
        "  Collected: {} | Distributed: {} | Meetings: {} | Still eligible: {}\n\n",
        report.stats.total_collected,
        report.stats.total_distributed,
        report.stats.meeting_count,
        report.stats.eligible_member_count
    )
    .unwrap();

    for line in &report.meetings {
        writeln!(
            summary,
            "  {} - collected {} | beneficiaries {}",
            line.date.format("%Y-%m-%d"),
            line.total_collected,
            line.beneficiary_count
        )
        .unwrap();
    }

    summary
}
