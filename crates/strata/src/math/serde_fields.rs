//! Field-named serde adapters for glam types.
//!
//! glam's own serde support writes vectors as bare sequences (`[1.0, 2.0,
//! 3.0]`). Persisted scene data uses named fields instead, so files stay
//! readable and tolerate reordering. Use with `#[serde(with = ...)]`:
//!
//! ```
//! # use serde::{Deserialize, Serialize};
//! # use strata::math::{serde_fields, Quat, Vec3};
//! #[derive(Serialize, Deserialize)]
//! struct Pose {
//!     #[serde(with = "serde_fields::vec3")]
//!     position: Vec3,
//!     #[serde(with = "serde_fields::quat")]
//!     rotation: Quat,
//! }
//! ```

/// `Vec3` as `{ "x", "y", "z" }`.
pub mod vec3 {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Fields {
        x: f32,
        y: f32,
        z: f32,
    }

    pub fn serialize<S: Serializer>(v: &Vec3, serializer: S) -> Result<S::Ok, S::Error> {
        Fields {
            x: v.x,
            y: v.y,
            z: v.z,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec3, D::Error> {
        let Fields { x, y, z } = Fields::deserialize(deserializer)?;
        Ok(Vec3::new(x, y, z))
    }
}

/// `Quat` as `{ "x", "y", "z", "w" }`. Deserialized quaternions are
/// normalized; a zero quaternion becomes the identity.
pub mod quat {
    use glam::Quat;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Fields {
        x: f32,
        y: f32,
        z: f32,
        w: f32,
    }

    pub fn serialize<S: Serializer>(q: &Quat, serializer: S) -> Result<S::Ok, S::Error> {
        Fields {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Quat, D::Error> {
        let Fields { x, y, z, w } = Fields::deserialize(deserializer)?;
        let q = Quat::from_xyzw(x, y, z, w);
        Ok(if q.length_squared() > f32::EPSILON {
            q.normalize()
        } else {
            Quat::IDENTITY
        })
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Probe {
        #[serde(with = "super::vec3")]
        v: Vec3,
        #[serde(with = "super::quat")]
        q: Quat,
    }

    #[test]
    fn writes_field_names_in_order() {
        let probe = Probe {
            v: Vec3::new(1.0, 2.0, 3.0),
            q: Quat::IDENTITY,
        };
        let json = serde_json::to_string(&probe).unwrap();
        assert_eq!(
            json,
            r#"{"v":{"x":1.0,"y":2.0,"z":3.0},"q":{"x":0.0,"y":0.0,"z":0.0,"w":1.0}}"#
        );
    }

    #[test]
    fn reads_fields_in_any_order() {
        let probe: Probe = serde_json::from_str(
            r#"{"q":{"w":1.0,"z":0.0,"y":0.0,"x":0.0},"v":{"z":3.0,"x":1.0,"y":2.0}}"#,
        )
        .unwrap();
        assert_eq!(probe.v, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(probe.q, Quat::IDENTITY);
    }

    #[test]
    fn unnormalized_quaternion_is_normalized() {
        let probe: Probe = serde_json::from_str(
            r#"{"v":{"x":0,"y":0,"z":0},"q":{"x":0.0,"y":0.0,"z":0.0,"w":2.0}}"#,
        )
        .unwrap();
        assert_eq!(probe.q, Quat::IDENTITY);

        let zero: Probe = serde_json::from_str(
            r#"{"v":{"x":0,"y":0,"z":0},"q":{"x":0.0,"y":0.0,"z":0.0,"w":0.0}}"#,
        )
        .unwrap();
        assert_eq!(zero.q, Quat::IDENTITY);
    }

    #[test]
    fn missing_field_is_an_error() {
        let result: Result<Probe, _> =
            serde_json::from_str(r#"{"v":{"x":0,"y":0},"q":{"x":0,"y":0,"z":0,"w":1}}"#);
        assert!(result.is_err());
    }
}
