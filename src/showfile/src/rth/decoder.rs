use bytes::Buf;

use crate::codec::varint::VarInt;
use crate::error::{Result, ShowFileError};
use crate::rth::plan::{RthAction, RthPlan, RthPlanEntry};
use crate::rth::{dequantize, ACTION_REPEAT, FLAG_POST_DELAY, FLAG_PRE_DELAY, FLAG_RESERVED};

/// RthPlanDecoder reads the payload of an RTH_PLAN block back into a plan.
/// Coordinates come back as multiples of the quantization step.
pub struct RthPlanDecoder<'a> {
    b: &'a [u8],
}

impl<'a> RthPlanDecoder<'a> {
    pub fn new(b: &'a [u8]) -> Self {
        Self { b }
    }

    pub fn decode(mut self) -> Result<RthPlan> {
        let scale = self.read_u8("scaling factor")?;
        if scale == 0 {
            return Err(ShowFileError::InvalidScale(scale));
        }

        let point_count = self.read_u16("point count")? as usize;
        self.ensure(point_count * 4, "point table")?;
        let points: Vec<(f64, f64)> = (0..point_count)
            .map(|_| {
                let x = dequantize(self.b.get_i16_le(), scale);
                let y = dequantize(self.b.get_i16_le(), scale);
                (x, y)
            })
            .collect();

        let entry_count = self.read_u16("entry count")? as usize;
        let mut plan = RthPlan::new();
        let mut previous: Option<RthPlanEntry> = None;
        for _ in 0..entry_count {
            let entry = self.decode_entry(&points, previous.as_ref())?;
            plan.add_entry(entry.clone());
            previous = Some(entry);
        }

        if self.b.has_remaining() {
            return Err(ShowFileError::Malformed(format!(
                "{} trailing bytes after RTH plan",
                self.b.remaining()
            )));
        }

        Ok(plan)
    }

    fn decode_entry(
        &mut self,
        points: &[(f64, f64)],
        previous: Option<&RthPlanEntry>,
    ) -> Result<RthPlanEntry> {
        let flags = self.read_u8("entry flags")?;
        if flags & FLAG_RESERVED != 0 {
            return Err(ShowFileError::InvalidFlags(flags));
        }

        let delta = self.read_varint("time delta")?;
        let previous_time = previous.map(|p| p.time()).unwrap_or_default();
        let time = i64::try_from(delta)
            .ok()
            .and_then(|d| previous_time.checked_add(d))
            .ok_or_else(|| ShowFileError::overflow("time delta", delta))?;

        let code = flags >> 4;
        let (action, target) = if code == ACTION_REPEAT {
            let previous = previous.ok_or_else(|| {
                ShowFileError::Malformed("first RTH plan entry repeats a previous one".to_string())
            })?;
            (previous.action(), previous.effective_target())
        } else {
            let action = RthAction::from_code(code)?;
            let target = if action.has_target() {
                let index = self.read_u8("point index")? as usize;
                let point = points.get(index).copied();
                Some(point.ok_or(ShowFileError::InvalidPointIndex {
                    index,
                    count: points.len(),
                })?)
            } else {
                None
            };
            (action, target)
        };

        let duration = if action.has_target() {
            Some(self.read_u8("duration")? as i64)
        } else {
            None
        };

        let mut entry = RthPlanEntry::new(time, action, target, duration);
        if flags & FLAG_POST_DELAY != 0 {
            entry = entry.with_post_delay(self.read_u8("post-delay")? as i64);
        }
        if flags & FLAG_PRE_DELAY != 0 {
            entry = entry.with_pre_delay(self.read_u8("pre-delay")? as i64);
        }

        Ok(entry)
    }

    fn ensure(&self, n: usize, what: &'static str) -> Result<()> {
        if self.b.remaining() < n {
            return Err(ShowFileError::truncated(
                what,
                n as u64,
                self.b.remaining() as u64,
            ));
        }
        Ok(())
    }

    fn read_u8(&mut self, what: &'static str) -> Result<u8> {
        self.ensure(1, what)?;
        Ok(self.b.get_u8())
    }

    fn read_u16(&mut self, what: &'static str) -> Result<u16> {
        self.ensure(2, what)?;
        Ok(self.b.get_u16_le())
    }

    fn read_varint(&mut self, what: &'static str) -> Result<u64> {
        match u64::decode_var(self.b) {
            Some((v, n)) => {
                self.b.advance(n);
                Ok(v)
            }
            None => Err(ShowFileError::truncated(
                what,
                self.b.remaining() as u64 + 1,
                self.b.remaining() as u64,
            )),
        }
    }
}

pub fn decode_rth_plan(b: &[u8]) -> Result<RthPlan> {
    RthPlanDecoder::new(b).decode()
}
