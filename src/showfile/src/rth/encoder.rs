use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::varint::{VarInt, MAX_VARINT_LEN64};
use crate::error::{Result, ShowFileError};
use crate::rth::plan::{RthAction, RthPlan, RthPlanEntry};
use crate::rth::points::PointTable;
use crate::rth::{quantize, ACTION_REPEAT, FLAG_POST_DELAY, FLAG_PRE_DELAY, MAX_POINTS};

/// RthPlanEncoder turns an RTH plan into the payload of an RTH_PLAN block:
///
/// | scale(1B) | point count(2B) | points(4B each) | entry count(2B) | entries |
///
/// Each point is a pair of i16 values holding millimeters divided by the scale.
/// Each entry starts with a flags byte (action code in the high nibble, delay
/// bits in the low nibble) and a varint time delta, followed by the optional
/// point index, duration, post-delay and pre-delay bytes.
pub struct RthPlanEncoder {
    scale: u8,
}

impl RthPlanEncoder {
    pub fn new(scale: u8) -> Self {
        Self { scale }
    }

    /// for_plan creates an encoder with the smallest scale that fits the plan.
    pub fn for_plan(plan: &RthPlan) -> Result<Self> {
        plan.propose_scaling_factor().map(Self::new)
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn encode(&self, plan: &RthPlan) -> Result<Bytes> {
        if self.scale == 0 {
            return Err(ShowFileError::InvalidScale(self.scale));
        }

        for entry in plan {
            validate_entry(entry)?;
        }

        let table = plan.point_table();
        if table.len() > MAX_POINTS {
            return Err(ShowFileError::TooManyPoints(table.len()));
        }
        if plan.len() > u16::MAX as usize {
            return Err(ShowFileError::TooManyEntries(plan.len()));
        }

        let mut buf = BytesMut::with_capacity(5 + table.len() * 4 + plan.len() * 5);
        buf.put_u8(self.scale);

        buf.put_u16_le(table.len() as u16);
        for &(x, y) in table.iter() {
            buf.put_i16_le(self.quantize(x)?);
            buf.put_i16_le(self.quantize(y)?);
        }

        buf.put_u16_le(plan.len() as u16);
        let mut previous: Option<&RthPlanEntry> = None;
        for entry in plan {
            encode_entry(&mut buf, &table, entry, previous)?;
            previous = Some(entry);
        }

        Ok(buf.freeze())
    }

    fn quantize(&self, value: f64) -> Result<i16> {
        quantize(value, self.scale).ok_or_else(|| {
            ShowFileError::NumericOverflow(format!(
                "coordinate {} cannot be represented with scale {}",
                value, self.scale
            ))
        })
    }
}

/// encode_rth_plan encodes the plan with the given scale, or with the proposed
/// scaling factor of the plan when no scale is given.
pub fn encode_rth_plan(plan: &RthPlan, scale: Option<u8>) -> Result<Bytes> {
    let encoder = match scale {
        Some(scale) => RthPlanEncoder::new(scale),
        None => RthPlanEncoder::for_plan(plan)?,
    };
    encoder.encode(plan)
}

fn validate_entry(entry: &RthPlanEntry) -> Result<()> {
    if entry.action() != RthAction::GoToKeepingAltitudeAndLand {
        return Ok(());
    }

    if entry.target().is_none() {
        return Err(ShowFileError::IncompleteEntry {
            time: entry.time(),
            field: "target",
        });
    }

    match entry.duration() {
        None => Err(ShowFileError::IncompleteEntry {
            time: entry.time(),
            field: "duration",
        }),
        Some(duration) if duration < 0 => Err(ShowFileError::NegativeDuration(duration)),
        Some(_) => Ok(()),
    }
}

fn encode_entry(
    buf: &mut BytesMut,
    table: &PointTable,
    entry: &RthPlanEntry,
    previous: Option<&RthPlanEntry>,
) -> Result<()> {
    let previous_time = previous.map(|p| p.time()).unwrap_or_default();
    if entry.time() < previous_time {
        return Err(ShowFileError::NonMonotonicTime {
            previous: previous_time,
            current: entry.time(),
        });
    }
    let delta = entry.time().checked_sub(previous_time).ok_or_else(|| {
        ShowFileError::overflow("time delta", format!("{} - {}", entry.time(), previous_time))
    })?;

    let repeat = previous
        .map(|p| p.action() == entry.action() && p.effective_target() == entry.effective_target())
        .unwrap_or(false);

    let code = if repeat {
        ACTION_REPEAT
    } else {
        entry.action().code()
    };
    let mut flags = code << 4;
    if entry.post_delay() != 0 {
        flags |= FLAG_POST_DELAY;
    }
    if entry.pre_delay() != 0 {
        flags |= FLAG_PRE_DELAY;
    }
    buf.put_u8(flags);

    let mut delta_buf = [0_u8; MAX_VARINT_LEN64];
    let n = (delta as u64).encode_var(&mut delta_buf);
    buf.put_slice(&delta_buf[..n]);

    if let Some(target) = entry.effective_target() {
        if !repeat {
            let index = table.index_of(target).ok_or_else(|| {
                ShowFileError::Malformed(format!("target {:?} missing from point table", target))
            })?;
            buf.put_u8(byte_field("point index", index as i64)?);
        }
        buf.put_u8(byte_field("duration", entry.duration().unwrap_or_default())?);
    }

    if flags & FLAG_POST_DELAY != 0 {
        buf.put_u8(byte_field("post-delay", entry.post_delay())?);
    }
    if flags & FLAG_PRE_DELAY != 0 {
        buf.put_u8(byte_field("pre-delay", entry.pre_delay())?);
    }

    Ok(())
}

fn byte_field(what: &str, value: i64) -> Result<u8> {
    u8::try_from(value).map_err(|_| ShowFileError::overflow(what, value))
}

#[cfg(test)]
mod tests {
    use crate::error::ShowFileError;
    use crate::rth::decoder::decode_rth_plan;
    use crate::rth::encoder::{encode_rth_plan, RthPlanEncoder};
    use crate::rth::plan::{RthAction, RthPlan, RthPlanEntry};
    use crate::rth::testdata::{sample_plan, ENCODED_RTH_PLAN_WITH_PROPOSED_SCALING_FACTOR};

    const ENCODED_RTH_PLAN_WITH_SCALING_FACTOR_10: &[u8] = &[
        0x0a, //
        0x02, 0x00, //
        0xb8, 0x0b, 0xa0, 0x0f, //
        0x60, 0xf0, 0x48, 0xf4, //
        0x06, 0x00, //
        0x10, 0x00, //
        0x21, 0x0f, 0x00, 0x32, 0x05, //
        0x22, 0x1e, 0x01, 0x32, 0x02, //
        0x20, 0x14, 0x00, 0x1e, //
        0x00, 0x0f, 0x14, //
        0x10, 0x19,
    ];

    #[test]
    fn test_encoding_basic_plan() {
        let data = RthPlanEncoder::new(10).encode(&sample_plan()).unwrap();
        assert_eq!(&data[..], ENCODED_RTH_PLAN_WITH_SCALING_FACTOR_10);
    }

    #[test]
    fn test_encoding_basic_plan_default_scaling_factor() {
        let plan = sample_plan();
        let encoder = RthPlanEncoder::new(plan.propose_scaling_factor().unwrap());
        let data = encoder.encode(&plan).unwrap();
        assert_eq!(&data[..], ENCODED_RTH_PLAN_WITH_PROPOSED_SCALING_FACTOR);

        let data = encode_rth_plan(&plan, None).unwrap();
        assert_eq!(&data[..], ENCODED_RTH_PLAN_WITH_PROPOSED_SCALING_FACTOR);
    }

    #[test]
    fn test_encoding_basic_plan_with_invalid_scale() {
        let err = RthPlanEncoder::new(1).encode(&sample_plan()).unwrap_err();
        assert!(matches!(err, ShowFileError::NumericOverflow(_)));

        let err = RthPlanEncoder::new(0).encode(&sample_plan()).unwrap_err();
        assert!(matches!(err, ShowFileError::InvalidScale(0)));
    }

    #[test]
    fn test_encoding_plan_with_negative_step_duration() {
        let mut plan = RthPlan::new();
        plan.add_entry(RthPlanEntry::go_to(15, (30.0, 40.0), -50).with_post_delay(5));

        let encoder = RthPlanEncoder::for_plan(&plan).unwrap();
        let err = encoder.encode(&plan).unwrap_err();
        assert_eq!(err.to_string(), "negative duration: -50");
    }

    #[test]
    fn test_encoding_too_large_plan() {
        let mut plan = RthPlan::new();
        plan.add_entry(RthPlanEntry::land(0));
        plan.add_entry(RthPlanEntry::go_to(15, (30000.0, 40000.0), 50).with_post_delay(5));

        assert!(matches!(
            encode_rth_plan(&plan, None),
            Err(ShowFileError::NoFeasibleScale)
        ));
    }

    #[test]
    fn test_encoding_incomplete_entries() {
        let mut plan = RthPlan::new();
        plan.add_entry(RthPlanEntry::new(
            3,
            RthAction::GoToKeepingAltitudeAndLand,
            None,
            Some(10),
        ));
        assert!(matches!(
            encode_rth_plan(&plan, Some(1)),
            Err(ShowFileError::IncompleteEntry {
                time: 3,
                field: "target"
            })
        ));

        let mut plan = RthPlan::new();
        plan.add_entry(RthPlanEntry::new(
            3,
            RthAction::GoToKeepingAltitudeAndLand,
            Some((1.0, 1.0)),
            None,
        ));
        assert!(matches!(
            encode_rth_plan(&plan, Some(1)),
            Err(ShowFileError::IncompleteEntry {
                field: "duration",
                ..
            })
        ));
    }

    #[test]
    fn test_encoding_byte_fields_out_of_range() {
        let plan: RthPlan = [RthPlanEntry::go_to(0, (1.0, 1.0), 256)].into_iter().collect();
        assert!(matches!(
            encode_rth_plan(&plan, Some(1)),
            Err(ShowFileError::NumericOverflow(_))
        ));

        let plan: RthPlan = [RthPlanEntry::land(0).with_pre_delay(-1)].into_iter().collect();
        assert!(matches!(
            encode_rth_plan(&plan, Some(1)),
            Err(ShowFileError::NumericOverflow(_))
        ));

        let plan: RthPlan = [RthPlanEntry::land(0).with_post_delay(300)]
            .into_iter()
            .collect();
        assert!(matches!(
            encode_rth_plan(&plan, Some(1)),
            Err(ShowFileError::NumericOverflow(_))
        ));
    }

    #[test]
    fn test_encoding_time_going_backwards() {
        let plan: RthPlan = [RthPlanEntry::land(10), RthPlanEntry::land(5)]
            .into_iter()
            .collect();
        assert!(matches!(
            encode_rth_plan(&plan, Some(1)),
            Err(ShowFileError::NonMonotonicTime {
                previous: 10,
                current: 5
            })
        ));

        let plan: RthPlan = [RthPlanEntry::land(-1)].into_iter().collect();
        assert!(matches!(
            encode_rth_plan(&plan, Some(1)),
            Err(ShowFileError::NonMonotonicTime { .. })
        ));
    }

    #[test]
    fn test_encoding_time_delta_out_of_range() {
        let plan: RthPlan = [RthPlanEntry::land(5), RthPlanEntry::land(i64::MIN)]
            .into_iter()
            .collect();
        assert!(matches!(
            encode_rth_plan(&plan, Some(1)),
            Err(ShowFileError::NonMonotonicTime {
                previous: 5,
                current: i64::MIN
            })
        ));

        let plan: RthPlan = [RthPlanEntry::land(0), RthPlanEntry::land(i64::MAX)]
            .into_iter()
            .collect();
        let data = encode_rth_plan(&plan, Some(1)).unwrap();
        assert_eq!(decode_rth_plan(&data).unwrap(), plan);
    }

    #[test]
    fn test_encoding_long_gap_uses_multi_byte_delta() {
        let plan: RthPlan = [RthPlanEntry::land(0), RthPlanEntry::land(300)]
            .into_iter()
            .collect();
        let data = encode_rth_plan(&plan, Some(1)).unwrap();
        assert_eq!(
            &data[..],
            &[0x01, 0x00, 0x00, 0x02, 0x00, 0x10, 0x00, 0x00, 0xac, 0x02]
        );
    }

    #[test]
    fn test_encoding_first_entry_delta_from_show_start() {
        let plan: RthPlan = [RthPlanEntry::go_to(15, (30.0, 40.0), 50).with_post_delay(5)]
            .into_iter()
            .collect();
        let data = encode_rth_plan(&plan, Some(2)).unwrap();
        assert_eq!(
            &data[..],
            &[
                0x02, 0x01, 0x00, 0x98, 0x3a, 0x20, 0x4e, 0x01, 0x00, 0x21, 0x0f, 0x00, 0x32,
                0x05
            ]
        );
    }

    #[test]
    fn test_encoding_too_many_points() {
        let plan: RthPlan = (0..257)
            .map(|i| RthPlanEntry::go_to(i, (i as f64 / 10.0, 0.0), 1))
            .collect();
        assert!(matches!(
            encode_rth_plan(&plan, None),
            Err(ShowFileError::TooManyPoints(257))
        ));

        let plan: RthPlan = (0..256)
            .map(|i| RthPlanEntry::go_to(i, (i as f64 / 10.0, 0.0), 1))
            .collect();
        assert!(encode_rth_plan(&plan, None).is_ok());
    }
}
