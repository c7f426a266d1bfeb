//! Bit packed timestamp.
//!
//! ```text
//! date block, 4 bytes little endian
//!
//!  31            13 12     9 8      4 3     1  0
//! +----------------+--------+--------+-------+---+
//! |      year      | month-1|  day-1 |  dow  | t |
//! +----------------+--------+--------+-------+---+
//!
//! time block, 6 bytes little endian, present when `t` is set
//!
//!  47    43 42    37 36    31 30                1  0
//! +--------+--------+--------+-------------------+---+
//! |  hour  | minute | second |    nanosecond     | r |
//! +--------+--------+--------+-------------------+---+
//! ```
use bytes::{BufMut, Bytes};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::{ext::BytesExt, protocol::ColumnType, row::DecodeError};

/// Encoded size of the date block.
pub const DATE_LEN: usize = 4;

/// Encoded size of the time block.
pub const TIME_LEN: usize = 6;

/// Timestamp fields exactly as packed on the wire, not validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawTimestamp {
    pub year: u32,
    pub month: u8,
    pub day: u8,
    /// Days since sunday, decoded but never used to build a date.
    pub day_of_week: u8,
    pub has_time: bool,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanosecond: u32,
}

impl RawTimestamp {
    /// Unpack a timestamp, consuming the date block and the time block if flagged.
    pub fn decode(buf: &mut Bytes) -> Result<RawTimestamp, DecodeError> {
        let truncated = || DecodeError::Truncated(ColumnType::Timestamp);
        let d = buf.try_get_array::<DATE_LEN>().ok_or_else(truncated)?;

        let mut ts = RawTimestamp {
            has_time: d[0] & 1 == 1,
            day_of_week: (d[0] >> 1) & 0x07,
            day: (d[0] >> 4) + ((d[1] & 0x01) << 4) + 1,
            month: ((d[1] & 0x1e) >> 1) + 1,
            year: (d[1] >> 5) as u32 | (d[2] as u32) << 3 | (d[3] as u32) << 11,
            ..Default::default()
        };

        if ts.has_time {
            let t = buf.try_get_array::<TIME_LEN>().ok_or_else(truncated)?;
            ts.nanosecond = (t[0] >> 1) as u32
                | (t[1] as u32) << 7
                | (t[2] as u32) << 15
                | ((t[3] & 0x7f) as u32) << 23;
            ts.second = (t[3] >> 7) | (t[4] & 0x1f) << 1;
            ts.minute = (t[4] >> 5) | (t[5] & 0x07) << 3;
            ts.hour = t[5] >> 3;
        }

        Ok(ts)
    }

    /// Pack a timestamp, the time block is written only when `has_time` is set.
    pub fn encode(&self, buf: &mut impl BufMut) {
        let date = self.has_time as u32
            | (self.day_of_week as u32 & 0x07) << 1
            | (self.day.wrapping_sub(1) as u32 & 0x1f) << 4
            | (self.month.wrapping_sub(1) as u32 & 0x0f) << 9
            | self.year << 13;
        buf.put_u32_le(date);

        if self.has_time {
            let time = (self.nanosecond as u64 & 0x3fff_ffff) << 1
                | (self.second as u64 & 0x3f) << 31
                | (self.minute as u64 & 0x3f) << 37
                | (self.hour as u64 & 0x1f) << 43;
            buf.put_uint_le(time, TIME_LEN);
        }
    }

    /// Build a calendar date time, midnight when there is no time part.
    pub fn to_primitive(&self) -> Result<PrimitiveDateTime, DecodeError> {
        let year = i32::try_from(self.year).unwrap_or(i32::MAX);
        let date = Date::from_calendar_date(year, Month::try_from(self.month)?, self.day)?;
        let time = match self.has_time {
            true => Time::from_hms_nano(self.hour, self.minute, self.second, self.nanosecond)?,
            false => Time::MIDNIGHT,
        };
        Ok(PrimitiveDateTime::new(date, time))
    }

    /// Build a date time in the local time zone, with the offset in force on that date.
    ///
    /// Falls back to UTC when the local offset cannot be determined.
    pub fn to_local(&self) -> Result<OffsetDateTime, DecodeError> {
        let primitive = self.to_primitive()?;
        let offset = offset_on(primitive, |at| UtcOffset::local_offset_at(at).ok())
            .unwrap_or(UtcOffset::UTC);
        Ok(primitive.assume_offset(offset))
    }
}

/// Resolve the offset of a wall clock time given the zone rule `offset_at`.
///
/// The first lookup reads the wall time as UTC, the second runs at the instant that guess
/// gives, so wall times within a few hours of a transition still get the right offset.
fn offset_on<F>(wall: PrimitiveDateTime, offset_at: F) -> Option<UtcOffset>
where
    F: Fn(OffsetDateTime) -> Option<UtcOffset>,
{
    let guess = offset_at(wall.assume_utc())?;
    Some(offset_at(wall.assume_offset(guess)).unwrap_or(guess))
}

impl From<PrimitiveDateTime> for RawTimestamp {
    fn from(value: PrimitiveDateTime) -> Self {
        let time = value.time();
        Self {
            year: value.year().max(0) as u32,
            month: value.month() as u8,
            day: value.day(),
            day_of_week: value.weekday().number_days_from_sunday(),
            has_time: time != Time::MIDNIGHT,
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
            nanosecond: time.nanosecond(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bytes::BytesMut;
    use time::macros::datetime;

    fn round_trip(value: PrimitiveDateTime) -> (RawTimestamp, PrimitiveDateTime, usize) {
        let raw = RawTimestamp::from(value);
        let mut buf = BytesMut::new();
        raw.encode(&mut buf);
        let len = buf.len();
        let decoded = RawTimestamp::decode(&mut buf.freeze()).unwrap();
        (decoded, decoded.to_primitive().unwrap(), len)
    }

    #[test]
    fn fixed_vector() {
        let mut wire = Bytes::from_static(&[201, 3, 253, 0, 42, 154, 183, 14, 175, 109]);
        let ts = RawTimestamp::decode(&mut wire).unwrap();
        assert!(wire.is_empty());
        assert_eq!(
            ts,
            RawTimestamp {
                year: 2024,
                month: 2,
                day: 29,
                day_of_week: 4,
                has_time: true,
                hour: 13,
                minute: 45,
                second: 30,
                nanosecond: 123_456_789,
            }
        );

        let mut buf = BytesMut::new();
        ts.encode(&mut buf);
        assert_eq!(&buf[..], &[201, 3, 253, 0, 42, 154, 183, 14, 175, 109]);
    }

    #[test]
    fn date_without_time() {
        let (raw, value, len) = round_trip(datetime!(1999-12-31 0:00));
        assert!(!raw.has_time);
        assert_eq!(len, DATE_LEN);
        assert_eq!(value, datetime!(1999-12-31 0:00));
    }

    #[test]
    fn full_time_part() {
        let (raw, value, len) = round_trip(datetime!(2021-07-04 23:59:58.000_000_001));
        assert!(raw.has_time);
        assert_eq!(len, DATE_LEN + TIME_LEN);
        assert_eq!(value, datetime!(2021-07-04 23:59:58.000_000_001));
    }

    #[test]
    fn leap_year() {
        let (_, value, _) = round_trip(datetime!(2000-02-29 12:00:00.5));
        assert_eq!((value.year(), value.month(), value.day()), (2000, Month::February, 29));
        assert_eq!(value.nanosecond(), 500_000_000);
    }

    #[test]
    fn reserved_bit_is_ignored() {
        let mut with_bit = Bytes::from_static(&[201, 3, 253, 0, 43, 154, 183, 14, 175, 109]);
        let ts = RawTimestamp::decode(&mut with_bit).unwrap();
        assert_eq!(ts.nanosecond, 123_456_789);
    }

    #[test]
    fn truncated() {
        let mut wire = Bytes::from_static(&[201, 3, 253, 0, 42]);
        let err = RawTimestamp::decode(&mut wire).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated(ColumnType::Timestamp)));
    }

    /// New York in 2024, DST from 03-10 07:00 UTC to 11-03 06:00 UTC.
    fn new_york(at: OffsetDateTime) -> Option<UtcOffset> {
        let start = datetime!(2024-03-10 7:00 UTC);
        let end = datetime!(2024-11-03 6:00 UTC);
        let hours = match (start..end).contains(&at) {
            true => -4,
            false => -5,
        };
        UtcOffset::from_hms(hours, 0, 0).ok()
    }

    #[test]
    fn offset_of_stored_date() {
        let winter = offset_on(datetime!(2024-01-15 12:00), new_york).unwrap();
        assert_eq!(winter.whole_hours(), -5);

        let summer = offset_on(datetime!(2024-07-04 12:00), new_york).unwrap();
        assert_eq!(summer.whole_hours(), -4);
    }

    #[test]
    fn offset_near_transition() {
        // 03:30 EDT is 07:30 UTC, while reading it as UTC lands before the transition
        let spring = offset_on(datetime!(2024-03-10 3:30), new_york).unwrap();
        assert_eq!(spring.whole_hours(), -4);

        // 02:30 EST is 07:30 UTC, read as EDT it is 06:30 UTC, already past the transition
        let autumn = offset_on(datetime!(2024-11-03 2:30), new_york).unwrap();
        assert_eq!(autumn.whole_hours(), -5);
    }

    #[test]
    fn offset_lookup_failure() {
        assert!(offset_on(datetime!(2024-01-15 12:00), |_| None).is_none());

        let raw = RawTimestamp::from(datetime!(2024-01-15 12:00));
        let local = raw.to_local().unwrap();
        assert_eq!(local.date(), time::macros::date!(2024-01-15));
        assert_eq!(local.hour(), 12);
    }

    #[test]
    fn invalid_date() {
        let raw = RawTimestamp { year: 2023, month: 2, day: 29, ..Default::default() };
        assert!(matches!(raw.to_primitive(), Err(DecodeError::InvalidTimestamp(_))));
    }
}
