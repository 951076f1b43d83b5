use crate::rth::plan::{RthPlan, RthPlanEntry};

pub(crate) const ENCODED_RTH_PLAN_WITH_PROPOSED_SCALING_FACTOR: &[u8] = &[
    // scaling factor
    0x02, //
    // number of points
    0x02, 0x00, //
    // point 1: (30, 40)
    0x98, 0x3a, 0x20, 0x4e, //
    // point 2: (-40, -30)
    0xe0, 0xb1, 0x68, 0xc5, //
    // number of entries
    0x06, 0x00, //
    // time=0, land
    0x10, 0x00, //
    // +15s, go to (30, 40) in 50s, post-delay=5
    0x21, 0x0f, 0x00, 0x32, 0x05, //
    // +30s, go to (-40, -30) in 50s, pre-delay=2
    0x22, 0x1e, 0x01, 0x32, 0x02, //
    // +20s, go to (30, 40) in 30s
    0x20, 0x14, 0x00, 0x1e, //
    // +15s, same as previous but in 20s
    0x00, 0x0f, 0x14, //
    // +25s, land
    0x10, 0x19,
];

pub(crate) fn sample_plan() -> RthPlan {
    let mut plan = RthPlan::new();
    plan.add_entry(RthPlanEntry::land(0));
    plan.add_entry(RthPlanEntry::go_to(15, (30.0, 40.0), 50).with_post_delay(5));
    plan.add_entry(RthPlanEntry::go_to(45, (-40.0, -30.0), 50).with_pre_delay(2));
    plan.add_entry(RthPlanEntry::go_to(65, (30.0, 40.0), 30));
    plan.add_entry(RthPlanEntry::go_to(80, (30.0, 40.0), 20));
    plan.add_entry(RthPlanEntry::land(105));
    plan
}
