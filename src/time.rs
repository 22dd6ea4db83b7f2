//! Time stamp codecs (CP16/CP24/CP32/CP56Time2a) and BinaryCounterReading.
//!
//! All multi-byte quantities are little-endian. The CP56 <-> Unix-ms
//! conversion reproduces the portable `my_mktime` algorithm from
//! `cpXXtime2a.c` exactly so that round-trips of arbitrary valid timestamps
//! (1970..2105) succeed without depending on the host's local timezone.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{IecError, IecResult};

/// 2-byte elapsed-time-in-milliseconds counter (CP16Time2a).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cp16Time2a {
    pub elapsed_ms: u16,
}

impl Cp16Time2a {
    pub const SIZE: usize = 2;

    pub fn from_buffer(buf: &[u8]) -> IecResult<Self> {
        if buf.len() < Self::SIZE {
            return Err(IecError::FrameTooShort {
                expected: Self::SIZE,
                actual: buf.len(),
            });
        }
        Ok(Self {
            elapsed_ms: u16::from_le_bytes([buf[0], buf[1]]),
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.elapsed_ms.to_le_bytes());
    }
}

/// 3-byte milliseconds + minute (+IV/SB) timestamp (CP24Time2a).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cp24Time2a {
    pub millisecond: u16,
    pub minute: u8,
    pub invalid: bool,
    pub substituted: bool,
}

impl Cp24Time2a {
    pub const SIZE: usize = 3;

    pub fn from_buffer(buf: &[u8]) -> IecResult<Self> {
        if buf.len() < Self::SIZE {
            return Err(IecError::FrameTooShort {
                expected: Self::SIZE,
                actual: buf.len(),
            });
        }
        let ms = u16::from_le_bytes([buf[0], buf[1]]);
        Ok(Self {
            millisecond: ms,
            minute: buf[2] & 0x3f,
            substituted: (buf[2] & 0x40) != 0,
            invalid: (buf[2] & 0x80) != 0,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        let ms = self.millisecond.to_le_bytes();
        out.push(ms[0]);
        out.push(ms[1]);
        let mut byte2 = self.minute & 0x3f;
        if self.substituted {
            byte2 |= 0x40;
        }
        if self.invalid {
            byte2 |= 0x80;
        }
        out.push(byte2);
    }
}

/// 4-byte CP24 + hour (+SU) timestamp (CP32Time2a).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cp32Time2a {
    pub millisecond: u16,
    pub minute: u8,
    pub invalid: bool,
    pub substituted: bool,
    pub hour: u8,
    pub summer_time: bool,
}

impl Cp32Time2a {
    pub const SIZE: usize = 4;

    pub fn from_buffer(buf: &[u8]) -> IecResult<Self> {
        if buf.len() < Self::SIZE {
            return Err(IecError::FrameTooShort {
                expected: Self::SIZE,
                actual: buf.len(),
            });
        }
        let cp24 = Cp24Time2a::from_buffer(&buf[0..3])?;
        Ok(Self {
            millisecond: cp24.millisecond,
            minute: cp24.minute,
            invalid: cp24.invalid,
            substituted: cp24.substituted,
            hour: buf[3] & 0x1f,
            summer_time: (buf[3] & 0x80) != 0,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        let cp24 = Cp24Time2a {
            millisecond: self.millisecond,
            minute: self.minute,
            invalid: self.invalid,
            substituted: self.substituted,
        };
        cp24.encode(out);
        let mut byte3 = self.hour & 0x1f;
        if self.summer_time {
            byte3 |= 0x80;
        }
        out.push(byte3);
    }
}

/// 7-byte full calendar timestamp (CP56Time2a): CP32 plus day-of-month,
/// day-of-week, month and a 2-digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cp56Time2a {
    pub millisecond: u16,
    pub minute: u8,
    pub invalid: bool,
    pub substituted: bool,
    pub hour: u8,
    pub summer_time: bool,
    pub day_of_month: u8,
    /// 0 means "not present".
    pub day_of_week: u8,
    pub month: u8,
    /// Two-digit year, 0..99.
    pub year: u8,
}

impl Cp56Time2a {
    pub const SIZE: usize = 7;

    pub fn from_buffer(buf: &[u8]) -> IecResult<Self> {
        if buf.len() < Self::SIZE {
            return Err(IecError::FrameTooShort {
                expected: Self::SIZE,
                actual: buf.len(),
            });
        }
        let cp32 = Cp32Time2a::from_buffer(&buf[0..4])?;
        Ok(Self {
            millisecond: cp32.millisecond,
            minute: cp32.minute,
            invalid: cp32.invalid,
            substituted: cp32.substituted,
            hour: cp32.hour,
            summer_time: cp32.summer_time,
            day_of_month: buf[4] & 0x1f,
            day_of_week: (buf[4] & 0xe0) >> 5,
            month: buf[5] & 0x0f,
            year: buf[6] & 0x7f,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        let cp32 = Cp32Time2a {
            millisecond: self.millisecond,
            minute: self.minute,
            invalid: self.invalid,
            substituted: self.substituted,
            hour: self.hour,
            summer_time: self.summer_time,
        };
        cp32.encode(out);
        out.push((self.day_of_month & 0x1f) | ((self.day_of_week & 0x07) << 5));
        out.push(self.month & 0x0f);
        out.push(self.year & 0x7f);
    }

    /// Build from a Unix millisecond timestamp (UTC, no local timezone
    /// dependency). The `year` field is packed mod 100, so only
    /// 2000-01-01..2099-12-31 round-trips through `to_unix_ms`; timestamps
    /// outside that window encode without error but decode to the wrong
    /// century.
    pub fn from_unix_ms(timestamp_ms: u64) -> Self {
        let seconds = timestamp_ms / 1000;
        let ms_part = (timestamp_ms % 1000) as u16;

        let dt = Utc.timestamp_opt(seconds as i64, 0).single().unwrap_or_else(|| {
            Utc.timestamp_opt(0, 0).single().expect("epoch is representable")
        });

        let mut seconds_field = Cp24Time2a {
            millisecond: 0,
            minute: dt.minute() as u8,
            invalid: false,
            substituted: false,
        };
        // pack seconds+ms the way setMillisecond/setSecond do: ms field holds
        // the full sub-minute millisecond count (sec*1000 + ms).
        let combined_ms = (dt.second() as u32) * 1000 + ms_part as u32;
        seconds_field.millisecond = combined_ms as u16;

        Self {
            millisecond: seconds_field.millisecond,
            minute: dt.minute() as u8,
            invalid: false,
            substituted: false,
            hour: dt.hour() as u8,
            summer_time: false,
            day_of_month: dt.day() as u8,
            day_of_week: 0,
            month: dt.month() as u8,
            year: (dt.year() % 100) as u8,
        }
    }

    /// Convert to a Unix millisecond timestamp using the `my_mktime`
    /// algorithm: seconds since 1970-01-01T00:00:00Z, computed without
    /// relying on the host timezone. The CP56 year field only carries the
    /// last two digits, and is decoded against a fixed 2000s century base
    /// (`tm_year = year + 100`, matching lib60870-C), so this is only
    /// correct for years 2000..2099.
    pub fn to_unix_ms(&self) -> u64 {
        let second = (self.millisecond / 1000) as i64;
        let ms = (self.millisecond % 1000) as u64;

        // struct tm convention: tm_year = year - 1900, tm_mon = month - 1.
        let tm_year: i64 = self.year as i64 + 100; // year field is mod-100, CP56 years are 20xx
        let tm_mon: i64 = self.month as i64 - 1;
        let tm_mday: i64 = self.day_of_month as i64;
        let tm_hour: i64 = self.hour as i64;
        let tm_min: i64 = self.minute as i64;

        let (m, y) = if tm_mon < 2 {
            (tm_mon + 12, tm_year - 1)
        } else {
            (tm_mon, tm_year)
        };

        let seconds_since_epoch: i64 = (((y - 69) * 365 + y / 4 - y / 100 * 3 / 4
            + (m + 2) * 153 / 5
            - 446
            + tm_mday)
            * 24
            + tm_hour)
            * 60
            + tm_min;
        let seconds_since_epoch = seconds_since_epoch * 60 + second;

        (seconds_since_epoch as u64) * 1000 + ms
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.to_unix_ms() as i64).single()
    }
}

/// BinaryCounterReading: signed 32-bit LE counter value plus a 5-bit
/// sequence number and CY/CA/IV flags, packed into 5 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BinaryCounterReading {
    pub value: i32,
    pub sequence: u8,
    /// Counter adjusted (overflowed/wrapped) since last reading.
    pub carry: bool,
    /// Counter was adjusted locally.
    pub counter_adjusted: bool,
    pub invalid: bool,
}

impl BinaryCounterReading {
    pub const SIZE: usize = 5;

    pub fn from_buffer(buf: &[u8]) -> IecResult<Self> {
        if buf.len() < Self::SIZE {
            return Err(IecError::FrameTooShort {
                expected: Self::SIZE,
                actual: buf.len(),
            });
        }
        let value = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let flags = buf[4];
        Ok(Self {
            value,
            sequence: flags & 0x1f,
            carry: (flags & 0x20) != 0,
            counter_adjusted: (flags & 0x40) != 0,
            invalid: (flags & 0x80) != 0,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.value.to_le_bytes());
        let mut flags = self.sequence & 0x1f;
        if self.carry {
            flags |= 0x20;
        }
        if self.counter_adjusted {
            flags |= 0x40;
        }
        if self.invalid {
            flags |= 0x80;
        }
        out.push(flags);
    }
}

/// A normalized value in [-1, 32767/32768], stored on the wire as a signed
/// 16-bit little-endian integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizedValue(pub i16);

impl NormalizedValue {
    /// Convert a float in [-1, 1] to the scaled i16 using round-half-away-
    /// from-zero, clamped to [-32768, 32767].
    pub fn from_f64(value: f64) -> Self {
        let scaled = value * 32768.0;
        let rounded = if scaled >= 0.0 {
            (scaled + 0.5).floor()
        } else {
            (scaled - 0.5).ceil()
        };
        let clamped = rounded.clamp(-32768.0, 32767.0);
        Self(clamped as i16)
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 32768.0
    }

    pub fn raw(&self) -> i16 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cp16_roundtrip() {
        let t = Cp16Time2a { elapsed_ms: 12345 };
        let mut buf = Vec::new();
        t.encode(&mut buf);
        assert_eq!(Cp16Time2a::from_buffer(&buf).unwrap(), t);
    }

    #[test]
    fn cp24_roundtrip() {
        let t = Cp24Time2a {
            millisecond: 59999,
            minute: 45,
            invalid: false,
            substituted: true,
        };
        let mut buf = Vec::new();
        t.encode(&mut buf);
        assert_eq!(Cp24Time2a::from_buffer(&buf).unwrap(), t);
    }

    #[test]
    fn cp32_roundtrip() {
        let t = Cp32Time2a {
            millisecond: 500,
            minute: 1,
            invalid: true,
            substituted: false,
            hour: 23,
            summer_time: true,
        };
        let mut buf = Vec::new();
        t.encode(&mut buf);
        assert_eq!(Cp32Time2a::from_buffer(&buf).unwrap(), t);
    }

    #[test]
    fn cp56_roundtrip_bytes() {
        let t = Cp56Time2a {
            millisecond: 1234,
            minute: 30,
            invalid: false,
            substituted: false,
            hour: 12,
            summer_time: false,
            day_of_month: 15,
            day_of_week: 3,
            month: 6,
            year: 26,
        };
        let mut buf = Vec::new();
        t.encode(&mut buf);
        assert_eq!(buf.len(), Cp56Time2a::SIZE);
        assert_eq!(Cp56Time2a::from_buffer(&buf).unwrap(), t);
    }

    #[test]
    fn cp56_unix_ms_roundtrip() {
        // The year field only carries two digits against a fixed 2000s
        // century base, so the test vectors must stay within 2000..2099.
        for ts in [
            946_684_800_000u64, // 2000-01-01T00:00:00Z
            946_684_801_000,    // 2000-01-01T00:00:01Z
            1_700_000_000_000,  // 2023-11-14T22:13:20Z
            1_900_000_000_000,  // 2030-03-18T03:33:20Z
            4_000_000_000_000,  // 2096-09-26T17:46:40Z
        ] {
            let cp56 = Cp56Time2a::from_unix_ms(ts);
            let back = cp56.to_unix_ms();
            assert_eq!(back, ts, "roundtrip failed for {ts}");
        }
    }

    #[test]
    fn cp56_known_timestamp() {
        // 2023-11-14T22:13:20Z
        let cp56 = Cp56Time2a::from_unix_ms(1_700_000_000_000);
        assert_eq!(cp56.to_unix_ms(), 1_700_000_000_000);
    }

    #[test]
    fn binary_counter_reading_roundtrip() {
        let bcr = BinaryCounterReading {
            value: -12345,
            sequence: 17,
            carry: true,
            counter_adjusted: false,
            invalid: false,
        };
        let mut buf = Vec::new();
        bcr.encode(&mut buf);
        assert_eq!(buf.len(), BinaryCounterReading::SIZE);
        assert_eq!(BinaryCounterReading::from_buffer(&buf).unwrap(), bcr);
    }

    #[test]
    fn normalized_value_round_trip_property() {
        // spec Testable Property 2: scaled(normalized(x)) = round(x * 32768)
        for i in -10..=10 {
            let x = i as f64 / 10.0;
            let nv = NormalizedValue::from_f64(x);
            let expected = if x >= 0.0 {
                ((x * 32768.0) + 0.5).floor()
            } else {
                ((x * 32768.0) - 0.5).ceil()
            };
            assert_eq!(nv.raw() as f64, expected.clamp(-32768.0, 32767.0));
        }
    }

    #[test]
    fn normalized_value_clamps() {
        assert_eq!(NormalizedValue::from_f64(2.0).raw(), 32767);
        assert_eq!(NormalizedValue::from_f64(-2.0).raw(), -32768);
    }
}
