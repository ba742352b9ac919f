use crate::model::enums::RoleType;
use crate::schema::{user, user_role};
use crate::string::{self, SmallString};
use crate::time::DateTime;
use diesel::pg::Pg;
use diesel::prelude::*;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = user)]
#[diesel(primary_key(uid))]
#[diesel(check_for_backend(Pg))]
pub struct User {
    pub uid: i64,
    pub username: SmallString,
    pub nickname: SmallString,
    pub avatar: String,
    pub sex: i16,
    pub introduction: String,
    pub ban_dt: Option<DateTime>,
    pub user_role_ids: String,
    pub create_date: DateTime,
}

impl User {
    /// Returns the time the user's posting ban ends, if it is still in effect at `now`.
    pub fn banned_until(&self, now: DateTime) -> Option<DateTime> {
        self.ban_dt.filter(|&ban_end| now < ban_end)
    }

    pub fn role_ids(&self) -> impl Iterator<Item = &str> {
        string::split_ids(&self.user_role_ids)
    }
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = user_role)]
#[diesel(primary_key(user_role_id))]
#[diesel(check_for_backend(Pg))]
pub struct UserRole {
    pub user_role_id: SmallString,
    pub user_role_name: SmallString,
    pub user_role_type: RoleType,
    pub user_authority_ids: String,
}

impl UserRole {
    pub fn authority_ids(&self) -> impl Iterator<Item = &str> {
        string::split_ids(&self.user_authority_ids)
    }
}
