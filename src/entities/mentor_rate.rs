//! Mentor rate entity - The hourly rate a mentor advertises for future bookings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Mentor rate database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mentor_rates")]
pub struct Model {
    /// Opaque identifier of the mentor
    #[sea_orm(primary_key, auto_increment = false)]
    pub mentor_id: String,
    /// Hourly rate in minor units
    pub hourly_rate: i64,
    /// When the rate was last changed
    pub updated_at: DateTimeUtc,
}

/// `MentorRate` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
