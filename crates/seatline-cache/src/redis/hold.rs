//! Redis hold store using Lua scripts for atomicity.
//!
//! Layout (before prefixing):
//! - `holds:{trip_id}`: hash of hold id to JSON record; the key itself
//!   expires with its longest-lived hold
//! - `holds:trips`: set of trip ids that may still have a hold hash
//!
//! Suitable for multi-instance deployments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use seatline_core::result::AppResult;
use seatline_core::types::{HoldId, TripId, UserId};
use seatline_entity::hold::TemporaryHold;

use super::client::{RedisClient, cache_err};
use crate::hold::{HoldInsert, HoldStore};
use crate::keys;

/// Atomic overlap check and insert.
///
/// KEYS[1] = trip hold hash
/// KEYS[2] = trip index set
/// ARGV[1] = now (ms)
/// ARGV[2] = hold id
/// ARGV[3] = record JSON
/// ARGV[4] = expires_at (ms)
/// ARGV[5] = trip id
/// ARGV[6..] = requested seats
///
/// Returns the conflicting seats; an empty array means the hold was stored.
const INSERT_SCRIPT: &str = r#"
    local hash = KEYS[1]
    local now = tonumber(ARGV[1])
    local requested = {}
    for i = 6, #ARGV do
        requested[tonumber(ARGV[i])] = true
    end

    local conflicts = {}
    local entries = redis.call('HGETALL', hash)
    for i = 1, #entries, 2 do
        local record = cjson.decode(entries[i + 1])
        if tonumber(record.expires_at_ms) <= now then
            redis.call('HDEL', hash, entries[i])
        else
            for _, seat in ipairs(record.seats) do
                if requested[tonumber(seat)] then
                    table.insert(conflicts, seat)
                end
            end
        end
    end

    if #conflicts > 0 then
        return conflicts
    end

    redis.call('HSET', hash, ARGV[2], ARGV[3])
    local wanted = tonumber(ARGV[4]) - now
    if redis.call('PTTL', hash) < wanted then
        redis.call('PEXPIRE', hash, wanted)
    end
    redis.call('SADD', KEYS[2], ARGV[5])
    return {}
"#;

/// Owner-checked removal.
///
/// KEYS[1] = trip hold hash
/// ARGV[1] = hold id
/// ARGV[2] = user id
/// ARGV[3] = now (ms)
///
/// Returns the record JSON when a live hold owned by the user was removed.
const RELEASE_SCRIPT: &str = r#"
    local raw = redis.call('HGET', KEYS[1], ARGV[1])
    if not raw then
        return false
    end
    local record = cjson.decode(raw)
    if record.user_id ~= ARGV[2] then
        return false
    end
    redis.call('HDEL', KEYS[1], ARGV[1])
    if tonumber(record.expires_at_ms) <= tonumber(ARGV[3]) then
        return false
    end
    return raw
"#;

/// Drop expired holds from one trip hash.
///
/// KEYS[1] = trip hold hash
/// KEYS[2] = trip index set
/// ARGV[1] = now (ms)
/// ARGV[2] = trip id
///
/// Returns the number of holds removed.
const PURGE_SCRIPT: &str = r#"
    local hash = KEYS[1]
    local now = tonumber(ARGV[1])
    local removed = 0
    local entries = redis.call('HGETALL', hash)
    for i = 1, #entries, 2 do
        local record = cjson.decode(entries[i + 1])
        if tonumber(record.expires_at_ms) <= now then
            redis.call('HDEL', hash, entries[i])
            removed = removed + 1
        end
    end
    if redis.call('HLEN', hash) == 0 then
        redis.call('SREM', KEYS[2], ARGV[2])
    end
    return removed
"#;

/// Stored form of a hold: the typed record plus a millisecond expiry the
/// scripts can compare without parsing timestamps.
#[derive(Debug, Serialize, Deserialize)]
struct HoldRecord {
    #[serde(flatten)]
    hold: TemporaryHold,
    expires_at_ms: i64,
}

impl HoldRecord {
    fn encode(hold: &TemporaryHold) -> AppResult<String> {
        let record = HoldRecord {
            hold: hold.clone(),
            expires_at_ms: hold.expires_at.timestamp_millis(),
        };
        Ok(serde_json::to_string(&record)?)
    }

    fn decode(raw: &str) -> AppResult<TemporaryHold> {
        let record: HoldRecord = serde_json::from_str(raw)?;
        Ok(record.hold)
    }
}

/// Redis-based hold store for multi-instance deployments.
#[derive(Debug, Clone)]
pub struct RedisHoldStore {
    client: RedisClient,
}

impl RedisHoldStore {
    /// Create a hold store on an existing client.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    fn hash_key(&self, trip_id: TripId) -> String {
        self.client.prefixed_key(&keys::trip_holds(trip_id))
    }

    fn index_key(&self) -> String {
        self.client.prefixed_key(&keys::hold_trip_index())
    }
}

#[async_trait]
impl HoldStore for RedisHoldStore {
    async fn try_insert(&self, hold: &TemporaryHold, now: DateTime<Utc>) -> AppResult<HoldInsert> {
        let record = HoldRecord::encode(hold)?;
        let mut conn = self.client.conn();

        let script = redis::Script::new(INSERT_SCRIPT);
        let mut invocation = script.prepare_invoke();
        invocation
            .key(self.hash_key(hold.trip_id))
            .key(self.index_key())
            .arg(now.timestamp_millis())
            .arg(hold.id.to_string())
            .arg(record)
            .arg(hold.expires_at.timestamp_millis())
            .arg(hold.trip_id.to_string());
        for seat in &hold.seats {
            invocation.arg(*seat);
        }

        let conflicts: Vec<i32> = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(|e| cache_err("Redis hold insert failed", e))?;

        if conflicts.is_empty() {
            debug!(trip_id = %hold.trip_id, hold_id = %hold.id, "Hold stored in Redis");
            Ok(HoldInsert::Inserted)
        } else {
            let mut seats = conflicts;
            seats.sort_unstable();
            seats.dedup();
            Ok(HoldInsert::Conflict(seats))
        }
    }

    async fn active_holds(
        &self,
        trip_id: TripId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<TemporaryHold>> {
        let key = self.hash_key(trip_id);
        let mut conn = self.client.conn();
        let raw: Vec<(String, String)> = redis::cmd("HGETALL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_err("Redis HGETALL failed", e))?;

        let mut live = Vec::with_capacity(raw.len());
        let mut expired = Vec::new();
        for (field, value) in raw {
            match HoldRecord::decode(&value) {
                Ok(hold) if !hold.is_expired(now) => live.push(hold),
                Ok(_) => expired.push(field),
                Err(e) => {
                    warn!(
                        trip_id = %trip_id,
                        hold_id = %field,
                        error = %e,
                        "Dropping unreadable hold record"
                    );
                    expired.push(field);
                }
            }
        }

        if !expired.is_empty() {
            let _: i64 = redis::cmd("HDEL")
                .arg(&key)
                .arg(&expired)
                .query_async(&mut conn)
                .await
                .map_err(|e| cache_err("Redis HDEL failed", e))?;
        }

        Ok(live)
    }

    async fn release(
        &self,
        trip_id: TripId,
        hold_id: HoldId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<TemporaryHold>> {
        let mut conn = self.client.conn();
        let script = redis::Script::new(RELEASE_SCRIPT);
        let removed: Option<String> = script
            .key(self.hash_key(trip_id))
            .arg(hold_id.to_string())
            .arg(user_id.to_string())
            .arg(now.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| cache_err("Redis hold release failed", e))?;

        removed.as_deref().map(HoldRecord::decode).transpose()
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut conn = self.client.conn();
        let index = self.index_key();
        let trips: Vec<String> = redis::cmd("SMEMBERS")
            .arg(&index)
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_err("Redis SMEMBERS failed", e))?;

        let script = redis::Script::new(PURGE_SCRIPT);
        let mut purged = 0u64;
        for member in trips {
            let Some(trip_id) = indexed_trip(&member) else {
                warn!(member = %member, "Skipping malformed hold index entry");
                continue;
            };
            let removed: u64 = script
                .key(self.hash_key(trip_id))
                .key(&index)
                .arg(now.timestamp_millis())
                .arg(&member)
                .invoke_async(&mut conn)
                .await
                .map_err(|e| cache_err("Redis hold purge failed", e))?;
            purged += removed;
        }
        Ok(purged)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_err("Redis PING failed", e))?;
        Ok(pong == "PONG")
    }
}

/// Trip id stored as a member of the hold index set.
fn indexed_trip(member: &str) -> Option<TripId> {
    member.parse().ok()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_record_carries_millisecond_expiry() {
        let now = Utc::now();
        let hold = TemporaryHold::new(
            TripId::new(),
            UserId::new(),
            vec![3, 1],
            now,
            Duration::minutes(10),
        );
        let raw = HoldRecord::encode(&hold).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["expires_at_ms"], hold.expires_at.timestamp_millis());
        assert_eq!(value["seats"], serde_json::json!([1, 3]));
        assert_eq!(value["user_id"], hold.user_id.to_string());
        assert_eq!(HoldRecord::decode(&raw).unwrap(), hold);
    }

    #[test]
    fn test_index_member_maps_to_hold_hash() {
        let trip_id = TripId::new();
        let member = trip_id.to_string();
        assert_eq!(indexed_trip(&member), Some(trip_id));
        assert_eq!(keys::trip_holds(trip_id), format!("holds:{member}"));
        assert_eq!(indexed_trip("holds:trips"), None);
    }
}
