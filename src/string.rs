use compact_str::CompactString;
use diesel::AsExpression;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub struct SmallString(CompactString);

impl SmallString {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(CompactString::new(text))
    }
}

impl Deref for SmallString {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ToSql<Text, Pg> for SmallString {
    fn to_sql<'a>(&'a self, out: &mut Output<'a, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.0.as_str(), out)
    }
}

impl<T> FromSql<T, Pg> for SmallString
where
    String: deserialize::FromSql<T, Pg>,
{
    fn from_sql(value: PgValue<'_>) -> deserialize::Result<Self> {
        CompactString::from_utf8(value.as_bytes()).map(Self).map_err(Box::from)
    }
}

/// Escapes user-supplied text so that it can't be interpreted as markup by clients.
/// Plain text passes through unchanged.
pub fn escape_markup(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Splits a comma-joined id list, skipping blank entries.
pub fn split_ids(joined: &str) -> impl Iterator<Item = &str> {
    joined.split(',').map(str::trim).filter(|id| !id.is_empty())
}
