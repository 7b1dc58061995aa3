use core::any::TypeId;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat};
use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use super::registered;
use crate::converter::expect_value;
use crate::{Error, SerializationHelper, TypeConverter};

/// Converts `chrono` date-times, dates and times.
///
/// | type | wire | tag |
/// |---|---|---|
/// | `DateTime<FixedOffset>` | RFC 3339 text, or seconds with `dateAsTimeStamp` | 0 or 1 |
/// | `NaiveDate` | `YYYY-MM-DD` | 10010 |
/// | `NaiveTime` | `HH:MM:SS.mmm` | 10011 |
///
/// Dates and times can also be read from a full date-time string.
pub struct DateTimeConverter;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Chrono {
    DateTime,
    Date,
    Time,
}

fn classify(ty: TypeId) -> Option<Chrono> {
    if ty == TypeId::of::<DateTime<FixedOffset>>() {
        Some(Chrono::DateTime)
    } else if ty == TypeId::of::<NaiveDate>() {
        Some(Chrono::Date)
    } else if ty == TypeId::of::<NaiveTime>() {
        Some(Chrono::Time)
    } else {
        None
    }
}

fn parse_date_time(text: &str) -> Result<DateTime<FixedOffset>, Error> {
    DateTime::parse_from_rfc3339(text)
        .map_err(|err| Error::deserialization(format!("Invalid date-time string {text:?}: {err}")))
}

fn from_time_stamp(secs: i64) -> Result<DateTime<FixedOffset>, Error> {
    DateTime::from_timestamp(secs, 0)
        .map(|utc| utc.fixed_offset())
        .ok_or_else(|| Error::deserialization(format!("Unix timestamp {secs} is out of range")))
}

impl DateTimeConverter {
    fn read(&self, chrono: Chrono, value: &WireValue) -> Result<Box<dyn Reflect>, Error> {
        let full = value.tag() == Some(Tag::DATE_TIME_STRING);
        match (chrono, value.untagged()) {
            (Chrono::DateTime, WireValue::Integer(secs)) => Ok(Box::new(from_time_stamp(*secs)?)),
            (Chrono::DateTime, WireValue::String(text)) => Ok(Box::new(parse_date_time(text)?)),
            (Chrono::Date, WireValue::String(text)) if full => {
                Ok(Box::new(parse_date_time(text)?.date_naive()))
            }
            (Chrono::Date, WireValue::String(text)) => text
                .parse::<NaiveDate>()
                .map(|date| Box::new(date) as Box<dyn Reflect>)
                .map_err(|err| Error::deserialization(format!("Invalid date string {text:?}: {err}"))),
            (Chrono::Time, WireValue::String(text)) if full => {
                Ok(Box::new(parse_date_time(text)?.time()))
            }
            (Chrono::Time, WireValue::String(text)) => text
                .parse::<NaiveTime>()
                .map(|time| Box::new(time) as Box<dyn Reflect>)
                .map_err(|err| Error::deserialization(format!("Invalid time string {text:?}: {err}"))),
            (_, other) => Err(Error::deserialization(format!(
                "Cannot read a date or time from a {} value",
                other.kind()
            ))),
        }
    }
}

impl TypeConverter for DateTimeConverter {
    fn name(&self) -> &'static str {
        "DateTimeConverter"
    }

    fn can_convert(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> bool {
        classify(ty).is_some()
    }

    fn allowed_tags(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        let own = match classify(ty) {
            Some(Chrono::DateTime) => Tag::UNIX_TIME,
            Some(Chrono::Date) => Tag::DATE,
            Some(Chrono::Time) => Tag::TIME,
            None => return Vec::new(),
        };
        vec![None, Some(Tag::DATE_TIME_STRING), Some(own)]
    }

    fn allowed_kinds(
        &self,
        ty: TypeId,
        tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        match tag {
            Some(Tag::UNIX_TIME) => vec![WireKind::Integer],
            None if classify(ty) == Some(Chrono::DateTime) => {
                vec![WireKind::String, WireKind::Integer]
            }
            _ => vec![WireKind::String],
        }
    }

    fn guess_type(
        &self,
        tag: Option<Tag>,
        kind: WireKind,
        helper: &dyn SerializationHelper,
    ) -> Option<TypeId> {
        let ty = match (tag?, kind) {
            (Tag::DATE_TIME_STRING, WireKind::String) | (Tag::UNIX_TIME, WireKind::Integer) => {
                TypeId::of::<DateTime<FixedOffset>>()
            }
            (Tag::DATE, WireKind::String) => TypeId::of::<NaiveDate>(),
            (Tag::TIME, WireKind::String) => TypeId::of::<NaiveTime>(),
            _ => return None,
        };
        registered(helper, ty)
    }

    fn serialize(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        match classify(ty) {
            Some(Chrono::DateTime) => {
                let date_time = expect_value::<DateTime<FixedOffset>>(value)?;
                if helper.config().date_as_time_stamp {
                    Ok(WireValue::tagged(Tag::UNIX_TIME, date_time.timestamp()))
                } else {
                    let text = date_time.to_rfc3339_opts(SecondsFormat::Millis, true);
                    Ok(WireValue::tagged(Tag::DATE_TIME_STRING, text))
                }
            }
            Some(Chrono::Date) => {
                let date = expect_value::<NaiveDate>(value)?;
                Ok(WireValue::tagged(Tag::DATE, date.format("%Y-%m-%d").to_string()))
            }
            Some(Chrono::Time) => {
                let time = expect_value::<NaiveTime>(value)?;
                Ok(WireValue::tagged(Tag::TIME, time.format("%H:%M:%S%.3f").to_string()))
            }
            None => Err(Error::serialization(format!(
                "{} is not a date or time type",
                helper.type_name(ty)
            ))),
        }
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let chrono = classify(ty).ok_or_else(|| {
            Error::deserialization(format!("{} is not a date or time type", helper.type_name(ty)))
        })?;
        self.read(chrono, value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Dynamic;
    use crate::testing::*;

    fn sample() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-01T12:30:00.250+02:00").unwrap()
    }

    #[test]
    fn date_times_as_text() {
        let serializer = serializer().build();
        let wire = serializer.serialize(&sample()).unwrap();
        assert_eq!(
            wire,
            WireValue::tagged(Tag::DATE_TIME_STRING, "2024-03-01T12:30:00.250+02:00")
        );
        assert_eq!(serializer.deserialize::<DateTime<FixedOffset>>(&wire).unwrap(), sample());

        let utc = DateTime::from_timestamp(0, 0).unwrap().fixed_offset();
        assert_eq!(serializer.to_json(&utc).unwrap(), json!("1970-01-01T00:00:00.000Z"));
    }

    #[test]
    fn date_times_as_time_stamps() {
        let serializer = serializer_with(|b| b.date_as_time_stamp(true));
        let value = DateTime::parse_from_rfc3339("2024-03-01T12:30:00+02:00").unwrap();
        let wire = serializer.serialize(&value).unwrap();
        assert_eq!(wire, WireValue::tagged(Tag::UNIX_TIME, 1_709_289_000));
        assert_eq!(serializer.deserialize::<DateTime<FixedOffset>>(&wire).unwrap(), value);
        assert_eq!(
            serializer
                .from_json::<DateTime<FixedOffset>>(&json!(1_709_289_000))
                .unwrap(),
            value
        );
    }

    #[test]
    fn dates_and_times() {
        let serializer = serializer().build();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let time = NaiveTime::from_hms_milli_opt(12, 30, 5, 7).unwrap();
        assert_eq!(
            serializer.serialize(&date).unwrap(),
            WireValue::tagged(Tag::DATE, "2024-03-01")
        );
        assert_eq!(serializer.to_json(&time).unwrap(), json!("12:30:05.007"));
        assert_eq!(serializer.from_json::<NaiveTime>(&json!("12:30:05.007")).unwrap(), time);
        assert_eq!(
            serializer.from_json::<NaiveTime>(&json!("12:30:05")).unwrap(),
            NaiveTime::from_hms_opt(12, 30, 5).unwrap()
        );

        let full = WireValue::tagged(Tag::DATE_TIME_STRING, "2024-03-01T12:30:00.250+02:00");
        assert_eq!(serializer.deserialize::<NaiveDate>(&full).unwrap(), date);
        assert_eq!(
            serializer.deserialize::<NaiveTime>(&full).unwrap(),
            NaiveTime::from_hms_milli_opt(12, 30, 0, 250).unwrap()
        );
    }

    #[test]
    fn invalid_text() {
        let serializer = serializer().build();
        let err = serializer.from_json::<NaiveDate>(&json!("March 1st")).unwrap_err();
        assert!(err.message().starts_with("Invalid date string \"March 1st\""));
        assert!(
            serializer
                .deserialize::<NaiveDate>(&WireValue::tagged(Tag::TIME, "12:00:00"))
                .is_err()
        );
    }

    #[test]
    fn guessed_from_tags() {
        let serializer = serializer().build();
        let value: Dynamic = serializer
            .deserialize(&WireValue::tagged(Tag::DATE, "2000-01-02"))
            .unwrap();
        assert_eq!(
            value.downcast_ref::<NaiveDate>(),
            NaiveDate::from_ymd_opt(2000, 1, 2).as_ref()
        );
    }
}
