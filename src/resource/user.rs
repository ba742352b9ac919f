use crate::model::user::User;
use crate::string::SmallString;
use crate::time::DateTime;
use serde::Serialize;
use utoipa::ToSchema;

/// Public profile of a user, as shown next to their comments.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MicroUser {
    uid: i64,
    avatar: String,
    #[schema(value_type = String)]
    nickname: SmallString,
    sex: i16,
    introduction: String,
}

impl MicroUser {
    pub fn new(user: &User) -> Self {
        Self {
            uid: user.uid,
            avatar: user.avatar.clone(),
            nickname: user.nickname.clone(),
            sex: user.sex,
            introduction: user.introduction.clone(),
        }
    }
}

/// Every column of a user.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    uid: i64,
    #[schema(value_type = String)]
    username: SmallString,
    #[schema(value_type = String)]
    nickname: SmallString,
    avatar: String,
    sex: i16,
    introduction: String,
    #[schema(value_type = Option<String>, format = DateTime)]
    ban_dt: Option<DateTime>,
    user_role_ids: String,
    #[schema(value_type = String, format = DateTime)]
    create_date: DateTime,
}

impl UserInfo {
    pub fn new(user: User) -> Self {
        Self {
            uid: user.uid,
            username: user.username,
            nickname: user.nickname,
            avatar: user.avatar,
            sex: user.sex,
            introduction: user.introduction,
            ban_dt: user.ban_dt,
            user_role_ids: user.user_role_ids,
            create_date: user.create_date,
        }
    }
}

/// A user attached to a comment, either as a public profile or in full.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum UserRef {
    Micro(MicroUser),
    Full(UserInfo),
}
