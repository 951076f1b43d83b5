use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, ShowFileError};
use crate::rth::points::PointTable;
use crate::rth::{fits_scale, MAX_SCALE};

/// RthAction is what a drone does when a return-to-home is triggered during
/// the time slot of a plan entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RthAction {
    /// Land at the current position.
    Land,
    /// Fly to the target at the current altitude, then land there.
    GoToKeepingAltitudeAndLand,
}

impl RthAction {
    /// code returns the value stored in the high nibble of an encoded entry.
    pub fn code(&self) -> u8 {
        match self {
            RthAction::Land => 1,
            RthAction::GoToKeepingAltitudeAndLand => 2,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(RthAction::Land),
            2 => Ok(RthAction::GoToKeepingAltitudeAndLand),
            _ => Err(ShowFileError::UnknownAction(format!("code {}", code))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RthAction::Land => "land",
            RthAction::GoToKeepingAltitudeAndLand => "goToKeepingAltitudeAndLand",
        }
    }

    pub fn has_target(&self) -> bool {
        matches!(self, RthAction::GoToKeepingAltitudeAndLand)
    }
}

impl Display for RthAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RthAction {
    type Err = ShowFileError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "land" => Ok(RthAction::Land),
            "goToKeepingAltitudeAndLand" => Ok(RthAction::GoToKeepingAltitudeAndLand),
            _ => Err(ShowFileError::UnknownAction(s.to_string())),
        }
    }
}

impl Serialize for RthAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for RthAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// RthPlanEntry is a single step of an RTH plan. Times, durations and delays
/// are in seconds, targets in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RthPlanEntry {
    /// start of the time slot, relative to the start of the show
    time: i64,
    action: RthAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<i64>,
    #[serde(default)]
    pre_delay: i64,
    #[serde(default)]
    post_delay: i64,
}

impl RthPlanEntry {
    pub fn new(
        time: i64,
        action: RthAction,
        target: Option<(f64, f64)>,
        duration: Option<i64>,
    ) -> Self {
        Self {
            time,
            action,
            target,
            duration,
            pre_delay: 0,
            post_delay: 0,
        }
    }

    pub fn land(time: i64) -> Self {
        Self::new(time, RthAction::Land, None, None)
    }

    pub fn go_to(time: i64, target: (f64, f64), duration: i64) -> Self {
        Self::new(
            time,
            RthAction::GoToKeepingAltitudeAndLand,
            Some(target),
            Some(duration),
        )
    }

    pub fn with_pre_delay(mut self, pre_delay: i64) -> Self {
        self.pre_delay = pre_delay;
        self
    }

    pub fn with_post_delay(mut self, post_delay: i64) -> Self {
        self.post_delay = post_delay;
        self
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn action(&self) -> RthAction {
        self.action
    }

    pub fn target(&self) -> Option<(f64, f64)> {
        self.target
    }

    /// effective_target returns the target the action actually uses; LAND
    /// entries have none even if one was supplied.
    pub fn effective_target(&self) -> Option<(f64, f64)> {
        if self.action.has_target() {
            self.target
        } else {
            None
        }
    }

    pub fn duration(&self) -> Option<i64> {
        self.duration
    }

    pub fn pre_delay(&self) -> i64 {
        self.pre_delay
    }

    pub fn post_delay(&self) -> i64 {
        self.post_delay
    }
}

impl Display for RthPlanEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "t={} {}", self.time, self.action)?;
        if let Some((x, y)) = self.effective_target() {
            write!(f, " to ({:.3}, {:.3})", x, y)?;
        }
        if let Some(duration) = self.duration.filter(|_| self.action.has_target()) {
            write!(f, " in {}s", duration)?;
        }
        if self.pre_delay != 0 {
            write!(f, " pre_delay={}s", self.pre_delay)?;
        }
        if self.post_delay != 0 {
            write!(f, " post_delay={}s", self.post_delay)?;
        }
        Ok(())
    }
}

/// RthPlan is the return-to-home timeline of a single drone. Entries are kept
/// in insertion order, which is also their playback order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RthPlan {
    #[serde(default)]
    entries: Vec<RthPlanEntry>,
}

impl RthPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, entry: RthPlanEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RthPlanEntry] {
        self.entries.as_slice()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RthPlanEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// point_table returns the distinct targets of the plan in first-use order.
    pub fn point_table(&self) -> PointTable {
        PointTable::from_plan(self)
    }

    /// propose_scaling_factor returns the smallest scale for which every target
    /// coordinate, in millimeters divided by the scale, fits in an i16.
    pub fn propose_scaling_factor(&self) -> Result<u8> {
        let table = self.point_table();
        (1..=MAX_SCALE)
            .find(|scale| {
                table
                    .iter()
                    .all(|&(x, y)| fits_scale(x, *scale) && fits_scale(y, *scale))
            })
            .ok_or(ShowFileError::NoFeasibleScale)
    }
}

impl<'a> IntoIterator for &'a RthPlan {
    type Item = &'a RthPlanEntry;
    type IntoIter = std::slice::Iter<'a, RthPlanEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<RthPlanEntry> for RthPlan {
    fn from_iter<T: IntoIterator<Item = RthPlanEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ShowFileError;
    use crate::rth::plan::{RthAction, RthPlan, RthPlanEntry};

    #[test]
    fn test_action_names() {
        assert_eq!("land".parse::<RthAction>().unwrap(), RthAction::Land);
        assert_eq!(
            "goToKeepingAltitudeAndLand".parse::<RthAction>().unwrap(),
            RthAction::GoToKeepingAltitudeAndLand
        );

        let err = "no-such-action".parse::<RthAction>().unwrap_err();
        assert_eq!(err.to_string(), "unknown RTH action: no-such-action");

        assert!(matches!(
            RthAction::from_code(7),
            Err(ShowFileError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_propose_scaling_factor() {
        let mut plan = RthPlan::new();
        assert_eq!(plan.propose_scaling_factor().unwrap(), 1);

        plan.add_entry(RthPlanEntry::land(0));
        plan.add_entry(RthPlanEntry::go_to(15, (30.0, 40.0), 50));
        plan.add_entry(RthPlanEntry::go_to(45, (-40.0, -30.0), 50));
        assert_eq!(plan.propose_scaling_factor().unwrap(), 2);

        // 32.767 m is the largest coordinate representable at scale 1
        let plan: RthPlan = [RthPlanEntry::go_to(0, (32.767, -32.768), 1)]
            .into_iter()
            .collect();
        assert_eq!(plan.propose_scaling_factor().unwrap(), 1);

        let plan: RthPlan = [RthPlanEntry::go_to(0, (32.768, 0.0), 1)]
            .into_iter()
            .collect();
        assert_eq!(plan.propose_scaling_factor().unwrap(), 2);
    }

    #[test]
    fn test_propose_scaling_factor_boundary() {
        // 255 * 32767 mm is the largest reachable magnitude
        let plan: RthPlan = [RthPlanEntry::go_to(0, (8355.585, 0.0), 1)]
            .into_iter()
            .collect();
        assert_eq!(plan.propose_scaling_factor().unwrap(), 255);

        let plan: RthPlan = [
            RthPlanEntry::land(0),
            RthPlanEntry::go_to(15, (30000.0, 40000.0), 50).with_post_delay(5),
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            plan.propose_scaling_factor(),
            Err(ShowFileError::NoFeasibleScale)
        ));
    }

    #[test]
    fn test_land_target_is_ignored() {
        let entry = RthPlanEntry::new(5, RthAction::Land, Some((1e9, 1e9)), None);
        assert_eq!(entry.effective_target(), None);

        let plan: RthPlan = [entry].into_iter().collect();
        assert!(plan.point_table().is_empty());
        assert_eq!(plan.propose_scaling_factor().unwrap(), 1);
    }

    #[test]
    fn test_plan_json() {
        let plan: RthPlan = serde_json::from_str(
            r#"{"entries": [
                {"time": 0, "action": "land"},
                {"time": 15, "action": "goToKeepingAltitudeAndLand",
                 "target": [30, 40], "duration": 50, "postDelay": 5}
            ]}"#,
        )
        .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.entries()[0], RthPlanEntry::land(0));
        assert_eq!(
            plan.entries()[1],
            RthPlanEntry::go_to(15, (30.0, 40.0), 50).with_post_delay(5)
        );

        let json = serde_json::to_string(&plan).unwrap();
        let back: RthPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);

        let err = serde_json::from_str::<RthPlan>(
            r#"{"entries": [{"time": 15, "action": "no-such-action"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown RTH action: no-such-action"));
    }

    #[test]
    fn test_entry_display() {
        let entry = RthPlanEntry::go_to(45, (-40.0, -30.0), 50).with_pre_delay(2);
        assert_eq!(
            entry.to_string(),
            "t=45 goToKeepingAltitudeAndLand to (-40.000, -30.000) in 50s pre_delay=2s"
        );
        assert_eq!(RthPlanEntry::land(105).to_string(), "t=105 land");
    }
}
