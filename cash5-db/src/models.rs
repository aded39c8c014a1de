use std::fmt;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Numbers are drawn from 1..=POOL_SIZE.
pub const POOL_SIZE: u8 = 45;
/// Numbers drawn per game.
pub const PICK_COUNT: usize = 5;
/// C(45, 5)
pub const TOTAL_COMBINATIONS: u64 = 1_221_759;

/// One draw as returned by the upstream API and stored in the archive.
///
/// Field names follow the upstream camelCase JSON so archives written by
/// earlier versions of the tool load unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub game_name: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    /// Epoch milliseconds.
    pub draw_time: i64,
    #[serde(default)]
    pub estimated_jackpot: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub jackpot: i64,
    /// Manually corrected 5/5 payout in cents.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub actual_payout: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<DrawResult>,
    #[serde(
        default,
        deserialize_with = "non_empty_tiers",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub prize_tiers: Vec<PrizeTier>,
    #[serde(
        default,
        deserialize_with = "non_empty_prizes",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub prizes: Vec<Prize>,
    #[serde(rename = "winningNumbers", default, skip_serializing_if = "Option::is_none")]
    pub raw_winning_numbers: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub primary: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_empty")]
    pub primary_reveal_order: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub draw_type: String,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub winners: i32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub payout: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub prize_amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeTier {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tier: String,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub winners: i32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub prize_amount: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "match", default, skip_serializing_if = "String::is_empty")]
    pub match_label: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub prize: i64,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub share_count: i32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub share_amount: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prize_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub draw_type: String,
}

impl PrizeTier {
    pub fn is_empty(&self) -> bool {
        self.tier.is_empty()
            && self.winners == 0
            && self.prize_amount == 0
            && self.name.is_empty()
            && self.share_count == 0
            && self.share_amount == 0
    }

    pub fn has_winners(&self) -> bool {
        self.winners > 0 || self.share_count > 0
    }

    pub fn is_jackpot_tier(&self) -> bool {
        self.tier == "1"
            || self.match_label == "5"
            || self.match_label == "5/5"
            || self.description == "5/5"
            || self.name == "5/5"
            || self.id == "1"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prize {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub level: String,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub winners: i32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub amount: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Prize {
    pub fn is_empty(&self) -> bool {
        self.level.is_empty() && self.winners == 0 && self.amount == 0
    }
}

impl DrawRecord {
    /// First five primary numbers of the first result, in reveal order.
    pub fn primary_numbers(&self) -> Result<[u8; PICK_COUNT]> {
        let result = self
            .results
            .first()
            .with_context(|| format!("Draw {} has no results", self.id))?;
        if result.primary.len() < PICK_COUNT {
            bail!(
                "Draw {} has {} primary numbers, expected {}",
                self.id,
                result.primary.len(),
                PICK_COUNT
            );
        }
        let mut numbers = [0u8; PICK_COUNT];
        for (slot, raw) in numbers.iter_mut().zip(&result.primary) {
            *slot = raw
                .trim()
                .parse::<u8>()
                .with_context(|| format!("Draw {}: cannot parse number '{}'", self.id, raw))?;
        }
        Ok(numbers)
    }

    /// Validated, sorted winning combination.
    pub fn combo(&self) -> Result<Combo> {
        let numbers = self.primary_numbers()?;
        Combo::new(numbers).with_context(|| format!("Draw {} has invalid numbers", self.id))
    }

    /// 5/5 payout in cents, 0 when nobody matched all five.
    pub fn payout_cents(&self) -> i64 {
        if self.actual_payout > 0 {
            return self.actual_payout;
        }
        for tier in &self.prize_tiers {
            if tier.has_winners() && tier.is_jackpot_tier() {
                if tier.share_amount > 0 {
                    return tier.share_amount;
                }
                if tier.prize_amount > 0 {
                    return tier.prize_amount;
                }
            }
        }
        0
    }

    pub fn drawn_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.draw_time)
    }

    /// Calendar date of the draw in the local time zone.
    pub fn local_date(&self) -> Option<NaiveDate> {
        self.drawn_at().map(|t| t.with_timezone(&Local).date_naive())
    }
}

/// A sorted set of five distinct numbers in 1..=45.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combo([u8; PICK_COUNT]);

impl Combo {
    pub fn new(mut numbers: [u8; PICK_COUNT]) -> Result<Self> {
        validate_numbers(&numbers)?;
        numbers.sort_unstable();
        Ok(Combo(numbers))
    }

    /// Wraps numbers already known to be sorted, distinct and in range.
    pub fn from_sorted_unchecked(numbers: [u8; PICK_COUNT]) -> Self {
        debug_assert!(validate_numbers(&numbers).is_ok());
        debug_assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        Combo(numbers)
    }

    pub fn from_slice(numbers: &[u8]) -> Result<Self> {
        let array: [u8; PICK_COUNT] = numbers
            .try_into()
            .with_context(|| format!("Expected {} numbers, got {}", PICK_COUNT, numbers.len()))?;
        Self::new(array)
    }

    pub fn numbers(&self) -> &[u8; PICK_COUNT] {
        &self.0
    }

    pub fn contains(&self, n: u8) -> bool {
        self.0.binary_search(&n).is_ok()
    }

    /// Count of numbers shared with `other`.
    pub fn matches(&self, other: &Combo) -> usize {
        self.0.iter().filter(|n| other.contains(**n)).count()
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|n| format!("{:02}", n)).collect();
        write!(f, "{}", parts.join("-"))
    }
}

pub fn validate_numbers(numbers: &[u8]) -> Result<()> {
    if numbers.len() != PICK_COUNT {
        bail!("Expected {} numbers, got {}", PICK_COUNT, numbers.len());
    }
    for &n in numbers {
        if n < 1 || n > POOL_SIZE {
            bail!("Number {} out of range (1-{})", n, POOL_SIZE);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Duplicate number: {}", numbers[i]);
            }
        }
    }
    Ok(())
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty_tiers<'de, D>(deserializer: D) -> Result<Vec<PrizeTier>, D::Error>
where
    D: Deserializer<'de>,
{
    let tiers: Vec<PrizeTier> = null_as_empty(deserializer)?;
    Ok(tiers.into_iter().filter(|t| !t.is_empty()).collect())
}

fn non_empty_prizes<'de, D>(deserializer: D) -> Result<Vec<Prize>, D::Error>
where
    D: Deserializer<'de>,
{
    let prizes: Vec<Prize> = null_as_empty(deserializer)?;
    Ok(prizes.into_iter().filter(|p| !p.is_empty()).collect())
}

/// Minimal closed Cash 5 record carrying `numbers` as its primary result.
pub fn make_test_draw(id: &str, draw_time: i64, numbers: [u8; PICK_COUNT]) -> DrawRecord {
    DrawRecord {
        game_name: "Cash 5".to_string(),
        id: id.to_string(),
        status: "CLOSED".to_string(),
        draw_time,
        results: vec![DrawResult {
            primary: numbers.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPSTREAM_JSON: &str = r#"{
        "gameName": "Cash 5",
        "id": "abc-123",
        "status": "CLOSED",
        "drawTime": 1706842800000,
        "estimatedJackpot": 57500000,
        "results": [{"primary": ["12", "03", "44", "27", "8"], "drawType": "BASE"}],
        "prizeTiers": [
            {"tier": "", "winners": 0},
            {"id": "1", "name": "5/5", "shareCount": 1, "shareAmount": 61234500}
        ],
        "prizes": null
    }"#;

    #[test]
    fn test_validate_numbers_ok() {
        assert!(validate_numbers(&[1, 2, 3, 4, 5]).is_ok());
        assert!(validate_numbers(&[45, 44, 43, 42, 41]).is_ok());
    }

    #[test]
    fn test_validate_numbers_out_of_range() {
        assert!(validate_numbers(&[0, 2, 3, 4, 5]).is_err());
        assert!(validate_numbers(&[1, 2, 3, 4, 46]).is_err());
    }

    #[test]
    fn test_validate_numbers_duplicate_and_length() {
        assert!(validate_numbers(&[1, 1, 3, 4, 5]).is_err());
        assert!(validate_numbers(&[1, 2, 3, 4]).is_err());
    }

    #[test]
    fn test_combo_sorts_and_displays() {
        let combo = Combo::new([44, 3, 27, 12, 8]).unwrap();
        assert_eq!(combo.numbers(), &[3, 8, 12, 27, 44]);
        assert_eq!(combo.to_string(), "03-08-12-27-44");
        assert!(combo.contains(27));
        assert!(!combo.contains(28));
    }

    #[test]
    fn test_combo_matches() {
        let a = Combo::new([1, 2, 3, 4, 5]).unwrap();
        let b = Combo::new([1, 2, 3, 4, 6]).unwrap();
        assert_eq!(a.matches(&b), 4);
        assert_eq!(a.matches(&a), 5);
    }

    #[test]
    fn test_decode_upstream_record() {
        let draw: DrawRecord = serde_json::from_str(UPSTREAM_JSON).unwrap();
        assert_eq!(draw.id, "abc-123");
        assert_eq!(draw.prize_tiers.len(), 1, "empty tier should be dropped");
        assert!(draw.prizes.is_empty());
        assert_eq!(draw.primary_numbers().unwrap(), [12, 3, 44, 27, 8]);
        assert_eq!(draw.combo().unwrap().numbers(), &[3, 8, 12, 27, 44]);
        assert_eq!(draw.payout_cents(), 61234500);
    }

    #[test]
    fn test_actual_payout_takes_precedence() {
        let mut draw: DrawRecord = serde_json::from_str(UPSTREAM_JSON).unwrap();
        draw.actual_payout = 100;
        assert_eq!(draw.payout_cents(), 100);
    }

    #[test]
    fn test_payout_zero_without_winners() {
        let draw = make_test_draw("1", 0, [1, 2, 3, 4, 5]);
        assert_eq!(draw.payout_cents(), 0);
    }

    #[test]
    fn test_malformed_numbers_rejected() {
        let mut draw = make_test_draw("1", 0, [1, 2, 3, 4, 5]);
        draw.results[0].primary[2] = "x".to_string();
        assert!(draw.combo().is_err());

        let mut short = make_test_draw("2", 0, [1, 2, 3, 4, 5]);
        short.results[0].primary.truncate(3);
        assert!(short.combo().is_err());

        let mut dup = make_test_draw("3", 0, [1, 2, 3, 4, 5]);
        dup.results[0].primary[1] = "1".to_string();
        assert!(dup.combo().is_err());

        let none = DrawRecord {
            id: "4".to_string(),
            ..Default::default()
        };
        assert!(none.combo().is_err());
    }

    #[test]
    fn test_serde_roundtrip_keeps_fields() {
        let draw: DrawRecord = serde_json::from_str(UPSTREAM_JSON).unwrap();
        let json = serde_json::to_string_pretty(&draw).unwrap();
        let restored: DrawRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, draw);
        assert!(json.contains("\"drawTime\""));
    }
}
