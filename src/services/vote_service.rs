use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::{tables, DataStore, Filter};

/// A votable resource: the content table carrying the `score` column and the
/// vote table keyed by (user, target).
pub struct VoteTarget {
    pub target_table: &'static str,
    pub votes_table: &'static str,
    pub fk_column: &'static str,
    pub id: Uuid,
}

impl VoteTarget {
    pub fn post(id: Uuid) -> Self {
        Self {
            target_table: tables::POSTS,
            votes_table: tables::POST_VOTES,
            fk_column: "post_id",
            id,
        }
    }

    pub fn comment(id: Uuid) -> Self {
        Self {
            target_table: tables::COMMENTS,
            votes_table: tables::COMMENT_VOTES,
            fk_column: "comment_id",
            id,
        }
    }
}

/// Apply one user's vote and recompute the target's score.
///
/// Value 0 retracts the vote (the row is deleted, never stored as zero);
/// otherwise the vote row is upserted on its composite key. The score is then
/// recomputed as the sum over all vote rows and written back. The two writes
/// are not atomic: concurrent voters on the same target may each sum a
/// vote-set missing the other's insert and the last aggregate write wins.
/// Score is advisory ranking data and converges once votes settle.
pub async fn cast_vote(
    store: &dyn DataStore,
    target: &VoteTarget,
    user_id: Uuid,
    value: i32,
) -> Result<i32, ApiError> {
    let target_filter = Filter::new().eq("id", target.id.to_string());
    if store
        .select_one(target.target_table, &target_filter)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("Vote target not found"));
    }

    let key = Filter::new()
        .eq("user_id", user_id.to_string())
        .eq(target.fk_column, target.id.to_string());

    if value == 0 {
        store.delete(target.votes_table, &key).await?;
    } else {
        let mut row = Map::new();
        row.insert("user_id".to_string(), json!(user_id));
        row.insert(target.fk_column.to_string(), json!(target.id));
        row.insert("value".to_string(), json!(value));
        store
            .upsert(
                target.votes_table,
                Value::Object(row),
                &["user_id", target.fk_column],
            )
            .await?;
    }

    let vote_filter = Filter::new().eq(target.fk_column, target.id.to_string());
    let rows = store.select(target.votes_table, &vote_filter, None).await?;
    let score = tally(&rows);

    store
        .update(target.target_table, &target_filter, json!({ "score": score }))
        .await?;

    Ok(score)
}

/// Sum vote rows into the stored score column, saturating at the column's
/// i32 bounds rather than wrapping.
fn tally(rows: &[Value]) -> i32 {
    rows.iter()
        .filter_map(|row| row.get("value").and_then(Value::as_i64))
        .fold(0i64, i64::saturating_add)
        .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
