//! Member roster management.
//!
//! Members belong to exactly one group. Deactivation is soft: an inactive
//! member keeps their contribution and payout history but drops out of
//! eligibility and contribution recording.

use crate::{
    entities::{Group, Member, member},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, PaginatorTrait, QueryOrder, Set, prelude::*};

/// Registers a new member in a group.
///
/// The phone number must be unique within the group; a duplicate is
/// rejected rather than silently merged.
pub async fn register_member(
    db: &DatabaseConnection,
    group_id: i64,
    name: String,
    phone_number: String,
) -> Result<member::Model> {
    if name.trim().is_empty() {
        return Err(Error::validation("Member name cannot be empty"));
    }
    if phone_number.trim().is_empty() {
        return Err(Error::validation("Member phone number cannot be empty"));
    }

    let group = Group::find_by_id(group_id).one(db).await?;
    if group.is_none() {
        return Err(Error::GroupNotFound { id: group_id });
    }

    let phone = phone_number.trim().to_string();
    let existing = Member::find()
        .filter(member::Column::GroupId.eq(group_id))
        .filter(member::Column::PhoneNumber.eq(phone.clone()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::validation(format!(
            "A member with phone number {phone} already exists in this group"
        )));
    }

    let now = Utc::now();
    let new_member = member::ActiveModel {
        group_id: Set(group_id),
        name: Set(name.trim().to_string()),
        phone_number: Set(phone),
        is_active: Set(true),
        joined_at: Set(now),
        updated_at: Set(now),
        synced: Set(false),
        ..Default::default()
    };

    new_member.insert(db).await.map_err(Into::into)
}

/// Finds a member by their unique ID.
pub async fn get_member_by_id(
    db: &DatabaseConnection,
    member_id: i64,
) -> Result<Option<member::Model>> {
    Member::find_by_id(member_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the active members of a group, ordered by name.
///
/// Generic over the connection so it can run inside transactions.
pub async fn get_active_members<C: ConnectionTrait>(
    conn: &C,
    group_id: i64,
) -> Result<Vec<member::Model>> {
    Member::find()
        .filter(member::Column::GroupId.eq(group_id))
        .filter(member::Column::IsActive.eq(true))
        .order_by_asc(member::Column::Name)
        .all(conn)
        .await
        .map_err(Into::into)
}

/// Counts the active members of a group.
pub async fn count_active_members<C: ConnectionTrait>(conn: &C, group_id: i64) -> Result<u64> {
    Member::find()
        .filter(member::Column::GroupId.eq(group_id))
        .filter(member::Column::IsActive.eq(true))
        .count(conn)
        .await
        .map_err(Into::into)
}

/// Activates or deactivates a member.
///
/// A no-op flip (setting the flag to its current value) still stamps
/// `updated_at` and marks the row for sync.
pub async fn set_member_active(
    db: &DatabaseConnection,
    member_id: i64,
    is_active: bool,
) -> Result<member::Model> {
    let member = Member::find_by_id(member_id)
        .one(db)
        .await?
        .ok_or(Error::MemberNotFound { id: member_id })?;

    let mut active: member::ActiveModel = member.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(Utc::now());
    active.synced = Set(false);

    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_register_member_validations() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db).await?;

        let empty_name = register_member(&db, group.id, "  ".into(), "0700111222".into()).await;
        assert!(matches!(empty_name.unwrap_err(), Error::Validation { .. }));

        let empty_phone = register_member(&db, group.id, "Achieng".into(), "".into()).await;
        assert!(matches!(empty_phone.unwrap_err(), Error::Validation { .. }));

        let no_group = register_member(&db, 9999, "Achieng".into(), "0700111222".into()).await;
        assert!(matches!(no_group.unwrap_err(), Error::GroupNotFound { id: 9999 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_register_member_rejects_duplicate_phone() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db).await?;

        register_member(&db, group.id, "Achieng".into(), "0700111222".into()).await?;
        let duplicate =
            register_member(&db, group.id, "Baraka".into(), "0700111222".into()).await;
        assert!(matches!(duplicate.unwrap_err(), Error::Validation { .. }));

        // The same phone number in a different group is fine.
        let other = create_test_group(&db).await?;
        let ok = register_member(&db, other.id, "Baraka".into(), "0700111222".into()).await?;
        assert_eq!(ok.group_id, other.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_active_members_ordering_and_count() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db).await?;

        register_member(&db, group.id, "Chebet".into(), "0700000003".into()).await?;
        register_member(&db, group.id, "Achieng".into(), "0700000001".into()).await?;
        let baraka = register_member(&db, group.id, "Baraka".into(), "0700000002".into()).await?;

        let active = get_active_members(&db, group.id).await?;
        assert_eq!(active.len(), 3);
        let names: Vec<&str> = active.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Achieng", "Baraka", "Chebet"]);

        set_member_active(&db, baraka.id, false).await?;
        let active = get_active_members(&db, group.id).await?;
        assert_eq!(active.len(), 2);
        assert_eq!(count_active_members(&db, group.id).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_set_member_active_marks_dirty() -> Result<()> {
        let db = setup_test_db().await?;
        let group = create_test_group(&db).await?;
        let member =
            register_member(&db, group.id, "Achieng".into(), "0700000001".into()).await?;

        let missing = set_member_active(&db, 9999, false).await;
        assert!(matches!(missing.unwrap_err(), Error::MemberNotFound { id: 9999 }));

        let deactivated = set_member_active(&db, member.id, false).await?;
        assert!(!deactivated.is_active);
        assert!(!deactivated.synced);

        let reactivated = set_member_active(&db, member.id, true).await?;
        assert!(reactivated.is_active);

        Ok(())
    }
}
