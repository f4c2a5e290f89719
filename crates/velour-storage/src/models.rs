use crate::schema::snapshot_slots;

use diesel::prelude::*;

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = snapshot_slots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SlotRow {
  pub slot: String,
  pub payload: String,
  pub byte_len: i64,
  pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = snapshot_slots)]
pub struct NewSlotRow<'a> {
  pub slot: &'a str,
  pub payload: &'a str,
  pub byte_len: i64,
  pub updated_at: String,
}
