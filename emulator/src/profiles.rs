//! Built-in scenarios selectable with `--profile`.

use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Profile {
    ColdStart,
    WarmRestart,
    LongSleep,
    SensorFault,
    FirstBoot,
}

impl Profile {
    pub const ALL: [Profile; 5] = [
        Profile::ColdStart,
        Profile::WarmRestart,
        Profile::LongSleep,
        Profile::SensorFault,
        Profile::FirstBoot,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Profile::ColdStart => "cold-start",
            Profile::WarmRestart => "warm-restart",
            Profile::LongSleep => "long-sleep",
            Profile::SensorFault => "sensor-fault",
            Profile::FirstBoot => "first-boot",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|profile| profile.tag().eq_ignore_ascii_case(tag))
            .ok_or_else(|| format!("Unknown profile `{tag}`"))
    }

    pub fn script(self) -> &'static str {
        match self {
            Profile::ColdStart => COLD_START,
            Profile::WarmRestart => WARM_RESTART,
            Profile::LongSleep => LONG_SLEEP,
            Profile::SensorFault => SENSOR_FAULT,
            Profile::FirstBoot => FIRST_BOOT,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

const COLD_START: &str = "\
# Engine cranked shortly after the last run while the block cools.
power-on
sample 24.0 40
wake external after 100s
sample 25.0 40
sample 22.0 42
sample 18.0 45
sample 17.0 47
";

const WARM_RESTART: &str = "\
# Restart inside the 5 min .. 6 h window: the engine is still warm enough.
power-on
wake external after 600s
sample 19.5 50
sample 19.0 50
";

const LONG_SLEEP: &str = "\
# Parked overnight.
power-on
wake external after 25000s
sample 15.0 70
sample 14.5 71
";

const SENSOR_FAULT: &str = "\
# The sensor drops out mid-episode; later steps are never reached.
power-on
wake external after 60s
sample 23.0 40
fail
sample 18.0 45
";

const FIRST_BOOT: &str = "\
# Fresh install on a cold morning.
power-on
sample 25.0 35
sample 18.5 38
";
