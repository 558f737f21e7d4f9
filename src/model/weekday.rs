//! Weekday set stored as a 7-bit mask.
//!
//! The mask replaces a serialized weekday list: membership becomes a native
//! query predicate (`weekdays & bit != 0`) and there is no parse failure
//! path on read.

use serde::{Deserialize, Serialize};
use sqlx::database::HasArguments;
use sqlx::encode::IsNull;
use sqlx::mysql::{MySql, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Decode, Encode, Type};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
];

/// Non-empty set of weekdays on which an assignment is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0x7f)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & day.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn days(self) -> Vec<Weekday> {
        ALL_DAYS.iter().copied().filter(|d| self.contains(*d)).collect()
    }
}

impl TryFrom<Vec<Weekday>> for WeekdaySet {
    type Error = String;

    fn try_from(days: Vec<Weekday>) -> Result<Self, Self::Error> {
        if days.is_empty() {
            return Err("at least one weekday is required".to_string());
        }
        Ok(Self(days.iter().fold(0u8, |acc, d| acc | d.bit())))
    }
}

impl From<WeekdaySet> for Vec<Weekday> {
    fn from(set: WeekdaySet) -> Self {
        set.days()
    }
}

impl Type<MySql> for WeekdaySet {
    fn type_info() -> MySqlTypeInfo {
        <u8 as Type<MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        <u8 as Type<MySql>>::compatible(ty)
    }
}

impl<'r> Decode<'r, MySql> for WeekdaySet {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(WeekdaySet::from_bits(<u8 as Decode<'r, MySql>>::decode(value)?))
    }
}

impl<'q> Encode<'q, MySql> for WeekdaySet {
    fn encode_by_ref(&self, buf: &mut <MySql as HasArguments<'q>>::ArgumentBuffer) -> IsNull {
        <u8 as Encode<'q, MySql>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_follows_the_mask() {
        let set = WeekdaySet::try_from(vec![Weekday::Monday, Weekday::Friday]).unwrap();
        assert!(set.contains(Weekday::Monday));
        assert!(set.contains(Weekday::Friday));
        assert!(!set.contains(Weekday::Sunday));
        assert_eq!(set.days(), vec![Weekday::Monday, Weekday::Friday]);
    }

    #[test]
    fn empty_set_is_rejected() {
        assert!(WeekdaySet::try_from(Vec::new()).is_err());
    }

    #[test]
    fn duplicate_days_collapse() {
        let set = WeekdaySet::try_from(vec![Weekday::Tuesday, Weekday::Tuesday]).unwrap();
        assert_eq!(set.days(), vec![Weekday::Tuesday]);
    }

    #[test]
    fn high_bit_is_masked_off() {
        assert!(WeekdaySet::from_bits(0xff).contains(Weekday::Sunday));
        assert_eq!(WeekdaySet::from_bits(0x80).bits(), 0);
    }

    #[test]
    fn wire_names_are_lowercase() {
        let set = WeekdaySet::try_from(vec![Weekday::Wednesday]).unwrap();
        assert_eq!(serde_json::to_string(&set).unwrap(), "[\"wednesday\"]");
        let parsed: WeekdaySet = serde_json::from_str("[\"saturday\",\"sunday\"]").unwrap();
        assert!(parsed.contains(Weekday::Saturday));
    }

    #[test]
    fn maps_chrono_weekdays() {
        assert_eq!(Weekday::from_chrono(chrono::Weekday::Mon), Weekday::Monday);
        assert_eq!(Weekday::from_chrono(chrono::Weekday::Sun), Weekday::Sunday);
    }
}
