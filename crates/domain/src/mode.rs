//! Enumerated feature values carried in payloads as small integers.

use serde::{Deserialize, Serialize};

/// An integer in a payload did not map to a known variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{value} is not a valid {kind}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: i64,
}

macro_rules! int_enum {
    ($(#[doc = $doc:expr])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub enum $name {
            $($variant),+
        }

        impl TryFrom<i64> for $name {
            type Error = UnknownVariant;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other,
                    }),
                }
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => $value,)+
                }
            }
        }
    };
}

int_enum!(
    /// Humidifier spray mode.
    SprayMode {
        Off = 0,
        Continuous = 1,
        Intermittent = 2,
    }
);

int_enum!(
    /// Oil diffuser spray mode.
    DiffuserSprayMode {
        Light = 0,
        Strong = 1,
        Off = 2,
    }
);

int_enum!(
    /// Connection status of a device or sub-device.
    OnlineStatus {
        Unknown = -1,
        NotOnline = 0,
        Online = 1,
        Offline = 2,
        Upgrading = 3,
    }
);

int_enum!(
    /// Operating mode of a thermostatic valve.
    ThermostatMode {
        Custom = 0,
        Comfort = 1,
        Economy = 2,
        Auto = 3,
        Away = 4,
    }
);

impl OnlineStatus {
    /// Lenient conversion used for sub-device reports, where unknown codes
    /// are folded into [`OnlineStatus::Unknown`].
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        Self::try_from(code).unwrap_or(Self::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_spray_mode_from_code() {
        assert_eq!(SprayMode::try_from(2), Ok(SprayMode::Intermittent));
    }

    #[test]
    fn should_reject_unknown_code() {
        let err = DiffuserSprayMode::try_from(9).unwrap_err();
        assert_eq!(err.to_string(), "9 is not a valid DiffuserSprayMode");
    }

    #[test]
    fn should_serialize_as_integer() {
        let json = serde_json::to_string(&ThermostatMode::Economy).unwrap();
        assert_eq!(json, "2");
        let back: ThermostatMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ThermostatMode::Economy);
    }

    #[test]
    fn should_fold_unknown_online_code() {
        assert_eq!(OnlineStatus::from_code(42), OnlineStatus::Unknown);
        assert_eq!(OnlineStatus::from_code(1), OnlineStatus::Online);
    }
}
