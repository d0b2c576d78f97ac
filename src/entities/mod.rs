//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod app_state;
pub mod beneficiary;
pub mod contribution;
pub mod cycle;
pub mod group;
pub mod meeting;
pub mod member;
pub mod monthly_saving;
pub mod monthly_saving_entry;
pub mod welfare_beneficiary;
pub mod welfare_contribution;
pub mod welfare_meeting;

// Re-export specific types to avoid conflicts
pub use app_state::{Column as AppStateColumn, Entity as AppState, Model as AppStateModel};
pub use beneficiary::{
    Column as BeneficiaryColumn, Entity as Beneficiary, Model as BeneficiaryModel,
};
pub use contribution::{
    Column as ContributionColumn, Entity as Contribution, Model as ContributionModel,
};
pub use cycle::{Column as CycleColumn, Entity as Cycle, Model as CycleModel};
pub use group::{Column as GroupColumn, Entity as Group, Model as GroupModel};
pub use meeting::{Column as MeetingColumn, Entity as Meeting, Model as MeetingModel};
pub use member::{Column as MemberColumn, Entity as Member, Model as MemberModel};
pub use monthly_saving::{
    Column as MonthlySavingColumn, Entity as MonthlySaving, Model as MonthlySavingModel,
};
pub use monthly_saving_entry::{
    Column as MonthlySavingEntryColumn, Entity as MonthlySavingEntry,
    Model as MonthlySavingEntryModel,
};
pub use welfare_beneficiary::{
    Column as WelfareBeneficiaryColumn, Entity as WelfareBeneficiary,
    Model as WelfareBeneficiaryModel,
};
pub use welfare_contribution::{
    Column as WelfareContributionColumn, Entity as WelfareContribution,
    Model as WelfareContributionModel,
};
pub use welfare_meeting::{
    Column as WelfareMeetingColumn, Entity as WelfareMeeting, Model as WelfareMeetingModel,
};
