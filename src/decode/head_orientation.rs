/// Head orientation angles in radians, derived from a bone rotation
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeadOrientation {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl HeadOrientation {
    /// Derives the angles from a scalar-last quaternion `[x, y, z, w]`.
    ///
    /// The sign conventions and axis assignment match what downstream face rigs expect, they are
    ///  not the textbook Tait-Bryan decomposition.
    pub fn from_quaternion(rotation: [f64; 4]) -> HeadOrientation {
        let [qx, qy, qz, qw] = rotation;

        let roll = -f64::atan2(2.0 * (qx*qy + qw*qz), qw*qw + qx*qx - qy*qy - qz*qz);
        let pitch = f64::atan2(2.0 * (qy*qz + qw*qx), qw*qw - qx*qx - qy*qy + qz*qz);
        // rounding pushes the argument slightly outside [-1, 1] for rotations close to +-90 degrees
        let yaw = -f64::asin((-2.0 * (qx*qz - qw*qy)).clamp(-1.0, 1.0));

        HeadOrientation { roll, pitch, yaw }
    }
}
