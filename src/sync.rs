//! Local half of the remote synchronization contract.
//!
//! Every domain row carries `updated_at` and `synced`; core mutations stamp
//! the time and reset the flag. A sync pass serializes the dirty rows to JSON
//! documents, pushes them one collection at a time, marks them synced, and
//! records when it finished. On the way back, member documents are applied
//! with last-write-wins on `updated_at` since the roster is the one thing
//! another device may legitimately edit. The transport itself lives outside
//! this crate; [`RemoteStore`] is the seam, and tests drive the pass with an
//! in-memory double.

use crate::entities::{
    Beneficiary, Contribution, Cycle, Group, Meeting, Member, MonthlySaving, MonthlySavingEntry,
    WelfareBeneficiary, WelfareContribution, WelfareMeeting, beneficiary, contribution, cycle,
    group, meeting, member, monthly_saving, monthly_saving_entry, welfare_beneficiary,
    welfare_contribution, welfare_meeting,
};
use crate::errors::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, Set, TransactionTrait, prelude::*};
use serde_json::Value;
use tracing::{info, warn};

/// `app_state` key holding the completion time of the last successful pass.
const LAST_SYNC_KEY: &str = "last_sync_time";

/// `app_state` key holding the user id recorded entries are attributed to.
const SESSION_USER_KEY: &str = "session_user_id";

/// Seam to the remote document store.
///
/// One collection per entity family, named after the local table. Documents
/// are loosely typed JSON in both directions; the remote side may be edited
/// by other devices, so nothing read back is trusted to be well-formed.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Uploads a batch of documents into the named collection.
    async fn push(&self, collection: &str, documents: Vec<Value>) -> Result<()>;

    /// Fetches documents from the named collection, optionally limited to
    /// those changed after `since`.
    async fn pull(&self, collection: &str, since: Option<DateTimeUtc>) -> Result<Vec<Value>>;
}

/// Dirty rows of one entity family, serialized and ready to upload.
#[derive(Debug)]
pub struct CollectionBatch {
    /// Remote collection name (matches the local table name)
    pub collection: &'static str,
    /// Documents awaiting upload
    pub documents: Vec<Value>,
}

/// Everything the local store currently wants to push.
#[derive(Debug, Default)]
pub struct SyncBatch {
    /// Non-empty collections, in parent-before-child order
    pub collections: Vec<CollectionBatch>,
}

impl SyncBatch {
    /// Total number of documents across all collections.
    #[must_use]
    pub fn total_documents(&self) -> usize {
        self.collections.iter().map(|c| c.documents.len()).sum()
    }

    /// True when there is nothing to push.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Documents pushed to the remote store
    pub pushed: usize,
    /// Pulled documents applied to the local store
    pub applied: usize,
    /// Pulled documents ignored (stale, malformed, or unresolvable)
    pub skipped: usize,
    /// When the pass finished; also recorded under the last-sync key
    pub completed_at: DateTimeUtc,
}

/// Collects every unsynced row, serialized to its remote document shape.
///
/// Collections are ordered parents before children so a remote store that
/// applies them in sequence never sees a dangling reference.
pub async fn collect_unsynced<C>(conn: &C) -> Result<SyncBatch>
where
    C: ConnectionTrait,
{
    let mut collections = Vec::new();

    let groups = Group::find()
        .filter(group::Column::Synced.eq(false))
        .all(conn)
        .await?;
    if !groups.is_empty() {
        collections.push(CollectionBatch {
            collection: "groups",
            documents: to_documents(&groups)?,
        });
    }

    let members = Member::find()
        .filter(member::Column::Synced.eq(false))
        .all(conn)
        .await?;
    if !members.is_empty() {
        collections.push(CollectionBatch {
            collection: "members",
            documents: to_documents(&members)?,
        });
    }

    let cycles = Cycle::find()
        .filter(cycle::Column::Synced.eq(false))
        .all(conn)
        .await?;
    if !cycles.is_empty() {
        collections.push(CollectionBatch {
            collection: "cycles",
            documents: to_documents(&cycles)?,
        });
    }

    let meetings = Meeting::find()
        .filter(meeting::Column::Synced.eq(false))
        .all(conn)
        .await?;
    if !meetings.is_empty() {
        collections.push(CollectionBatch {
            collection: "weekly_meetings",
            documents: to_documents(&meetings)?,
        });
    }

    let contributions = Contribution::find()
        .filter(contribution::Column::Synced.eq(false))
        .all(conn)
        .await?;
    if !contributions.is_empty() {
        collections.push(CollectionBatch {
            collection: "member_contributions",
            documents: to_documents(&contributions)?,
        });
    }

    let beneficiaries = Beneficiary::find()
        .filter(beneficiary::Column::Synced.eq(false))
        .all(conn)
        .await?;
    if !beneficiaries.is_empty() {
        collections.push(CollectionBatch {
            collection: "beneficiaries",
            documents: to_documents(&beneficiaries)?,
        });
    }

    let savings = MonthlySaving::find()
        .filter(monthly_saving::Column::Synced.eq(false))
        .all(conn)
        .await?;
    if !savings.is_empty() {
        collections.push(CollectionBatch {
            collection: "monthly_savings",
            documents: to_documents(&savings)?,
        });
    }

    let entries = MonthlySavingEntry::find()
        .filter(monthly_saving_entry::Column::Synced.eq(false))
        .all(conn)
        .await?;
    if !entries.is_empty() {
        collections.push(CollectionBatch {
            collection: "monthly_saving_entries",
            documents: to_documents(&entries)?,
        });
    }

    let welfare_meetings = WelfareMeeting::find()
        .filter(welfare_meeting::Column::Synced.eq(false))
        .all(conn)
        .await?;
    if !welfare_meetings.is_empty() {
        collections.push(CollectionBatch {
            collection: "welfare_meetings",
            documents: to_documents(&welfare_meetings)?,
        });
    }

    let welfare_contributions = WelfareContribution::find()
        .filter(welfare_contribution::Column::Synced.eq(false))
        .all(conn)
        .await?;
    if !welfare_contributions.is_empty() {
        collections.push(CollectionBatch {
            collection: "member_welfare_contributions",
            documents: to_documents(&welfare_contributions)?,
        });
    }

    let welfare_beneficiaries = WelfareBeneficiary::find()
        .filter(welfare_beneficiary::Column::Synced.eq(false))
        .all(conn)
        .await?;
    if !welfare_beneficiaries.is_empty() {
        collections.push(CollectionBatch {
            collection: "welfare_beneficiaries",
            documents: to_documents(&welfare_beneficiaries)?,
        });
    }

    Ok(SyncBatch { collections })
}

/// Runs one full sync pass against the remote store.
///
/// Pushes every unsynced row, marks the rows synced, pulls member documents
/// changed since the previous pass and applies the ones that are newer than
/// their local counterpart, then records the completion time. The whole pass
/// runs in a single transaction, so a failed push leaves the rows dirty for
/// the next attempt.
pub async fn run_sync_pass<R>(db: &DatabaseConnection, remote: &R) -> Result<SyncReport>
where
    R: RemoteStore,
{
    let txn = db.begin().await?;

    let batch = collect_unsynced(&txn).await?;
    let pushed = batch.total_documents();
    for collection in batch.collections {
        remote
            .push(collection.collection, collection.documents)
            .await?;
    }
    mark_all_synced(&txn).await?;

    let since = last_sync_time(&txn).await?;
    let documents = remote.pull("members", since).await?;
    let (applied, skipped) = apply_member_documents(&txn, &documents).await?;

    let completed_at = Utc::now();
    crate::core::state::set_value(&txn, LAST_SYNC_KEY, &completed_at.to_rfc3339()).await?;

    txn.commit().await?;

    info!(
        "Sync pass finished: {} pushed, {} applied, {} skipped",
        pushed, applied, skipped
    );

    Ok(SyncReport {
        pushed,
        applied,
        skipped,
        completed_at,
    })
}

/// Reads the completion time of the last successful sync pass, if any.
pub async fn last_sync_time<C>(conn: &C) -> Result<Option<DateTimeUtc>>
where
    C: ConnectionTrait,
{
    let stored = crate::core::state::get_value(conn, LAST_SYNC_KEY).await?;
    Ok(stored
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc)))
}

/// Reads the user id recorded entries are attributed to, if one is set.
pub async fn session_user<C>(conn: &C) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    crate::core::state::get_value(conn, SESSION_USER_KEY).await
}

/// Stores the user id recorded entries are attributed to.
pub async fn set_session_user<C>(conn: &C, user_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    crate::core::state::set_value(conn, SESSION_USER_KEY, user_id).await
}

fn to_documents<M>(rows: &[M]) -> Result<Vec<Value>>
where
    M: serde::Serialize,
{
    rows.iter()
        .map(|row| serde_json::to_value(row).map_err(Into::into))
        .collect()
}

/// Flips `synced` on every dirty row without touching `updated_at`, so the
/// stamp keeps reflecting the last domain change.
async fn mark_all_synced<C>(conn: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    Group::update_many()
        .col_expr(group::Column::Synced, Expr::value(true))
        .filter(group::Column::Synced.eq(false))
        .exec(conn)
        .await?;
    Member::update_many()
        .col_expr(member::Column::Synced, Expr::value(true))
        .filter(member::Column::Synced.eq(false))
        .exec(conn)
        .await?;
    Cycle::update_many()
        .col_expr(cycle::Column::Synced, Expr::value(true))
        .filter(cycle::Column::Synced.eq(false))
        .exec(conn)
        .await?;
    Meeting::update_many()
        .col_expr(meeting::Column::Synced, Expr::value(true))
        .filter(meeting::Column::Synced.eq(false))
        .exec(conn)
        .await?;
    Contribution::update_many()
        .col_expr(contribution::Column::Synced, Expr::value(true))
        .filter(contribution::Column::Synced.eq(false))
        .exec(conn)
        .await?;
    Beneficiary::update_many()
        .col_expr(beneficiary::Column::Synced, Expr::value(true))
        .filter(beneficiary::Column::Synced.eq(false))
        .exec(conn)
        .await?;
    MonthlySaving::update_many()
        .col_expr(monthly_saving::Column::Synced, Expr::value(true))
        .filter(monthly_saving::Column::Synced.eq(false))
        .exec(conn)
        .await?;
    MonthlySavingEntry::update_many()
        .col_expr(monthly_saving_entry::Column::Synced, Expr::value(true))
        .filter(monthly_saving_entry::Column::Synced.eq(false))
        .exec(conn)
        .await?;
    WelfareMeeting::update_many()
        .col_expr(welfare_meeting::Column::Synced, Expr::value(true))
        .filter(welfare_meeting::Column::Synced.eq(false))
        .exec(conn)
        .await?;
    WelfareContribution::update_many()
        .col_expr(welfare_contribution::Column::Synced, Expr::value(true))
        .filter(welfare_contribution::Column::Synced.eq(false))
        .exec(conn)
        .await?;
    WelfareBeneficiary::update_many()
        .col_expr(welfare_beneficiary::Column::Synced, Expr::value(true))
        .filter(welfare_beneficiary::Column::Synced.eq(false))
        .exec(conn)
        .await?;

    Ok(())
}

/// Applies pulled member documents to the local roster.
///
/// A document must carry a usable `id` and `updated_at` to be considered at
/// all; it is then applied only when strictly newer than the local row.
/// Unknown members are inserted, provided their group exists locally. Other
/// fields fall back to the local (or default) value when missing or
/// mistyped. Returns `(applied, skipped)`.
async fn apply_member_documents<C>(conn: &C, documents: &[Value]) -> Result<(usize, usize)>
where
    C: ConnectionTrait,
{
    let mut applied = 0usize;
    let mut skipped = 0usize;

    for doc in documents {
        let Some(member_id) = doc_i64(doc, "id") else {
            warn!("Skipping member document without a usable id");
            skipped += 1;
            continue;
        };
        let Some(remote_updated) = doc_time(doc, "updated_at") else {
            warn!("Skipping member document {} without a usable updated_at", member_id);
            skipped += 1;
            continue;
        };

        match Member::find_by_id(member_id).one(conn).await? {
            Some(local) if local.updated_at >= remote_updated => {
                skipped += 1;
            }
            Some(local) => {
                let name = doc_string(doc, "name").unwrap_or_else(|| local.name.clone());
                let phone_number =
                    doc_string(doc, "phone_number").unwrap_or_else(|| local.phone_number.clone());
                let is_active = doc_bool(doc, "is_active").unwrap_or(local.is_active);

                let mut active: member::ActiveModel = local.into();
                active.name = Set(name);
                active.phone_number = Set(phone_number);
                active.is_active = Set(is_active);
                active.updated_at = Set(remote_updated);
                active.synced = Set(true);
                active.update(conn).await?;
                applied += 1;
            }
            None => {
                let Some(group_id) = doc_i64(doc, "group_id") else {
                    warn!("Skipping new member document {} without a group id", member_id);
                    skipped += 1;
                    continue;
                };
                if Group::find_by_id(group_id).one(conn).await?.is_none() {
                    warn!(
                        "Skipping member document {} referencing unknown group {}",
                        member_id, group_id
                    );
                    skipped += 1;
                    continue;
                }

                let new_member = member::ActiveModel {
                    id: Set(member_id),
                    group_id: Set(group_id),
                    name: Set(doc_string(doc, "name").unwrap_or_default()),
                    phone_number: Set(doc_string(doc, "phone_number").unwrap_or_default()),
                    is_active: Set(doc_bool(doc, "is_active").unwrap_or(true)),
                    joined_at: Set(doc_time(doc, "joined_at").unwrap_or(remote_updated)),
                    updated_at: Set(remote_updated),
                    synced: Set(true),
                };
                new_member.insert(conn).await?;
                applied += 1;
            }
        }
    }

    Ok((applied, skipped))
}

fn doc_i64(doc: &Value, field: &str) -> Option<i64> {
    doc.get(field).and_then(Value::as_i64)
}

fn doc_string(doc: &Value, field: &str) -> Option<String> {
    doc.get(field).and_then(Value::as_str).map(str::to_string)
}

fn doc_bool(doc: &Value, field: &str) -> Option<bool> {
    doc.get(field).and_then(Value::as_bool)
}

fn doc_time(doc: &Value, field: &str) -> Option<DateTimeUtc> {
    doc.get(field)
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory stand-in for the remote document store.
    #[derive(Default)]
    struct InMemoryRemote {
        pushed: Mutex<HashMap<String, Vec<Value>>>,
        pull_results: Mutex<HashMap<String, Vec<Value>>>,
    }

    impl InMemoryRemote {
        fn pushed_count(&self, collection: &str) -> usize {
            self.pushed
                .lock()
                .unwrap()
                .get(collection)
                .map_or(0, Vec::len)
        }

        fn stage_pull(&self, collection: &str, documents: Vec<Value>) {
            self.pull_results
                .lock()
                .unwrap()
                .insert(collection.to_string(), documents);
        }
    }

    impl RemoteStore for InMemoryRemote {
        async fn push(&self, collection: &str, documents: Vec<Value>) -> Result<()> {
            self.pushed
                .lock()
                .unwrap()
                .entry(collection.to_string())
                .or_default()
                .extend(documents);
            Ok(())
        }

        async fn pull(&self, collection: &str, _since: Option<DateTimeUtc>) -> Result<Vec<Value>> {
            Ok(self
                .pull_results
                .lock()
                .unwrap()
                .get(collection)
                .cloned()
                .unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn test_sync_pass_pushes_unsynced_rows() -> Result<()> {
        let (db, _group, _cycle, _members) = setup_with_roster(2).await?;
        let remote = InMemoryRemote::default();

        // One group, two members, one cycle start out dirty.
        let report = run_sync_pass(&db, &remote).await?;
        assert_eq!(report.pushed, 4);
        assert_eq!(remote.pushed_count("groups"), 1);
        assert_eq!(remote.pushed_count("members"), 2);
        assert_eq!(remote.pushed_count("cycles"), 1);

        let batch = collect_unsynced(&db).await?;
        assert!(batch.is_empty());
        assert!(last_sync_time(&db).await?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_sync_pass_is_incremental() -> Result<()> {
        let (db, _group, _cycle, members) = setup_with_roster(2).await?;
        let remote = InMemoryRemote::default();

        run_sync_pass(&db, &remote).await?;

        // Only the row touched after the first pass goes out again.
        crate::core::member::set_member_active(&db, members[0].id, false).await?;
        let report = run_sync_pass(&db, &remote).await?;
        assert_eq!(report.pushed, 1);
        assert_eq!(remote.pushed_count("members"), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_sync_report_timestamp_round_trips() -> Result<()> {
        let db = setup_test_db().await?;
        let remote = InMemoryRemote::default();

        let report = run_sync_pass(&db, &remote).await?;
        assert_eq!(report.pushed, 0);
        assert_eq!(last_sync_time(&db).await?, Some(report.completed_at));

        Ok(())
    }

    #[tokio::test]
    async fn test_pull_applies_newer_member_document() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db).await?;
        let member = create_test_member(&db, group.id, "Achieng", "0700000001").await?;
        let remote = InMemoryRemote::default();

        let mut doc = serde_json::to_value(&member)?;
        doc["name"] = json!("Achieng Odhiambo");
        doc["updated_at"] = json!((member.updated_at + chrono::Duration::hours(1)).to_rfc3339());
        remote.stage_pull("members", vec![doc]);

        let report = run_sync_pass(&db, &remote).await?;
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 0);

        let updated = crate::core::member::get_member_by_id(&db, member.id)
            .await?
            .unwrap();
        assert_eq!(updated.name, "Achieng Odhiambo");
        assert!(updated.synced);

        Ok(())
    }

    #[tokio::test]
    async fn test_pull_skips_stale_and_malformed_documents() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db).await?;
        let member = create_test_member(&db, group.id, "Achieng", "0700000001").await?;
        let remote = InMemoryRemote::default();

        let mut stale = serde_json::to_value(&member)?;
        stale["name"] = json!("Should Not Apply");
        stale["updated_at"] = json!((member.updated_at - chrono::Duration::hours(1)).to_rfc3339());

        let no_id = json!({ "name": "Ghost", "updated_at": Utc::now().to_rfc3339() });
        let unknown_group = json!({
            "id": 999,
            "group_id": 12_345,
            "name": "Orphan",
            "updated_at": Utc::now().to_rfc3339(),
        });

        remote.stage_pull("members", vec![stale, no_id, unknown_group]);

        let report = run_sync_pass(&db, &remote).await?;
        assert_eq!(report.applied, 0);
        assert_eq!(report.skipped, 3);

        let unchanged = crate::core::member::get_member_by_id(&db, member.id)
            .await?
            .unwrap();
        assert_eq!(unchanged.name, "Achieng");
        assert!(
            crate::core::member::get_member_by_id(&db, 999)
                .await?
                .is_none()
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_pull_inserts_unknown_member() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db).await?;
        let remote = InMemoryRemote::default();

        let doc = json!({
            "id": 500,
            "group_id": group.id,
            "name": "Brian Mwangi",
            "phone_number": "0700000042",
            "is_active": true,
            "updated_at": Utc::now().to_rfc3339(),
        });
        remote.stage_pull("members", vec![doc]);

        let report = run_sync_pass(&db, &remote).await?;
        assert_eq!(report.applied, 1);

        let inserted = crate::core::member::get_member_by_id(&db, 500)
            .await?
            .unwrap();
        assert_eq!(inserted.name, "Brian Mwangi");
        assert_eq!(inserted.phone_number, "0700000042");
        assert!(inserted.synced);

        // A row that arrived from the remote store is not pushed back.
        let batch = collect_unsynced(&db).await?;
        assert!(batch.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_session_user_round_trips() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(session_user(&db).await?.is_none());
        set_session_user(&db, "treasurer-1").await?;
        assert_eq!(session_user(&db).await?.as_deref(), Some("treasurer-1"));

        Ok(())
    }
}
