use serde::{Deserialize, Serialize};
use std::fmt;

/// Quarter-turn rotation of the device relative to its natural orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum DeviceRotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl DeviceRotation {
    pub const ALL: [DeviceRotation; 4] = [
        DeviceRotation::Rotation0,
        DeviceRotation::Rotation90,
        DeviceRotation::Rotation180,
        DeviceRotation::Rotation270,
    ];

    /// Get rotation angle in degrees
    pub fn degrees(&self) -> u16 {
        match self {
            DeviceRotation::Rotation0 => 0,
            DeviceRotation::Rotation90 => 90,
            DeviceRotation::Rotation180 => 180,
            DeviceRotation::Rotation270 => 270,
        }
    }

    /// Parse an exact quarter-turn angle
    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(DeviceRotation::Rotation0),
            90 => Some(DeviceRotation::Rotation90),
            180 => Some(DeviceRotation::Rotation180),
            270 => Some(DeviceRotation::Rotation270),
            _ => None,
        }
    }

    pub fn from_quarter_turns(turns: u32) -> Self {
        Self::ALL[(turns % 4) as usize]
    }

    /// The rotation one quarter turn clockwise from this one
    pub fn next_clockwise(&self) -> Self {
        Self::from_quarter_turns(self.degrees() as u32 / 90 + 1)
    }
}

impl TryFrom<u16> for DeviceRotation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        Self::from_degrees(degrees)
            .ok_or_else(|| format!("rotation must be 0, 90, 180 or 270 (got {})", degrees))
    }
}

impl From<DeviceRotation> for u16 {
    fn from(rotation: DeviceRotation) -> Self {
        rotation.degrees()
    }
}

impl fmt::Display for DeviceRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Direction a camera sensor faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    Front,
    #[default]
    Back,
}

/// Fixed properties of a camera sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraInfo {
    pub facing: CameraFacing,
    /// Clockwise angle between the sensor and the device natural orientation
    pub mount_angle: u16,
}

impl CameraInfo {
    pub fn new(facing: CameraFacing, mount_angle: u16) -> Self {
        Self {
            facing,
            mount_angle,
        }
    }
}

/// Rotation in degrees to apply so preview and stills appear upright.
///
/// Front-facing sensors are mirrored, so the combined angle is inverted.
pub fn display_orientation(info: &CameraInfo, rotation: DeviceRotation) -> u16 {
    let mount = info.mount_angle % 360;
    let degrees = rotation.degrees();

    match info.facing {
        CameraFacing::Front => {
            let combined = (mount + degrees) % 360;
            (360 - combined) % 360
        }
        CameraFacing::Back => (mount + 360 - degrees) % 360,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_facing_examples() {
        let info = CameraInfo::new(CameraFacing::Back, 90);
        assert_eq!(display_orientation(&info, DeviceRotation::Rotation0), 90);
        assert_eq!(display_orientation(&info, DeviceRotation::Rotation90), 0);
        assert_eq!(display_orientation(&info, DeviceRotation::Rotation180), 270);
        assert_eq!(display_orientation(&info, DeviceRotation::Rotation270), 180);
    }

    #[test]
    fn test_front_facing_mirror_compensation() {
        let info = CameraInfo::new(CameraFacing::Front, 270);
        assert_eq!(display_orientation(&info, DeviceRotation::Rotation90), 0);
        assert_eq!(display_orientation(&info, DeviceRotation::Rotation0), 90);
    }

    #[test]
    fn test_all_combinations_match_formulas() {
        for mount in [0u16, 90, 180, 270] {
            for rotation in DeviceRotation::ALL {
                let r = rotation.degrees();

                let back =
                    display_orientation(&CameraInfo::new(CameraFacing::Back, mount), rotation);
                assert!(back < 360);
                assert_eq!(back, (mount + 360 - r) % 360);

                let front =
                    display_orientation(&CameraInfo::new(CameraFacing::Front, mount), rotation);
                assert!(front < 360);
                assert_eq!(front, (360 - (mount + r) % 360) % 360);
                assert_eq!(front % 90, 0);
            }
        }
    }

    #[test]
    fn test_rotation_helpers() {
        assert_eq!(DeviceRotation::from_degrees(180), Some(DeviceRotation::Rotation180));
        assert_eq!(DeviceRotation::from_degrees(45), None);
        assert_eq!(DeviceRotation::from_quarter_turns(5), DeviceRotation::Rotation90);
        assert_eq!(
            DeviceRotation::Rotation270.next_clockwise(),
            DeviceRotation::Rotation0
        );
        assert!(DeviceRotation::try_from(360u16).is_err());
    }
}
