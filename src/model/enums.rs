use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::SmallInt;
use diesel::{AsExpression, FromSqlRow};
use serde_repr::Serialize_repr;
use strum::FromRepr;
use thiserror::Error;

// These enums are encoded in the database as integers, so the
// discriminants must never change. New variants get new values.

#[derive(Debug, Error)]
#[error("{0} is not a valid {1}")]
pub struct DeserializeEnumError(i16, &'static str);

/// Moderation state of a comment.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    FromRepr,
    AsExpression,
    FromSqlRow,
    Serialize_repr,
)]
#[diesel(sql_type = SmallInt)]
#[repr(i16)]
pub enum CommentStatus {
    PendingReview = 1,
    Approved = 2,
    FreeReview = 3,
    Rejected = 4,
    Deleted = 5,
}

impl CommentStatus {
    /// Statuses that are shown in comment listings. Deleted comments are left out.
    pub const LISTED: [Self; 4] = [Self::Approved, Self::FreeReview, Self::PendingReview, Self::Rejected];

    /// Text shown in place of the comment content while it is not publicly visible.
    pub fn placeholder(self) -> Option<&'static str> {
        match self {
            Self::PendingReview => Some("This comment is awaiting moderation"),
            Self::Rejected => Some("This comment violates the community guidelines"),
            Self::Approved | Self::FreeReview | Self::Deleted => None,
        }
    }

    pub fn is_published(self) -> bool {
        matches!(self, Self::Approved | Self::FreeReview)
    }
}

/// Kind of role a user holds. Only default roles grant comment authorities.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromRepr, AsExpression, FromSqlRow)]
#[diesel(sql_type = SmallInt)]
#[repr(i16)]
pub enum RoleType {
    Default = 1,
    Custom = 2,
}

macro_rules! small_int_sql {
    ($enum:ident) => {
        impl ToSql<SmallInt, Pg> for $enum
        where
            i16: ToSql<SmallInt, Pg>,
        {
            fn to_sql(&self, out: &mut Output<Pg>) -> serialize::Result {
                let value = *self as i16;
                <i16 as ToSql<SmallInt, Pg>>::to_sql(&value, &mut out.reborrow())
            }
        }

        impl FromSql<SmallInt, Pg> for $enum
        where
            i16: FromSql<SmallInt, Pg>,
        {
            fn from_sql(bytes: <Pg as diesel::backend::Backend>::RawValue<'_>) -> deserialize::Result<Self> {
                let database_value = i16::from_sql(bytes)?;
                $enum::from_repr(database_value)
                    .ok_or_else(|| DeserializeEnumError(database_value, stringify!($enum)).into())
            }
        }
    };
}

small_int_sql!(CommentStatus);
small_int_sql!(RoleType);
