//! Serde adapters that keep non-finite `f32` values intact.
//!
//! JSON has no NaN or infinity, and `serde_json` writes them as `null`.
//! Finite values stay plain numbers; the rest are written as the strings
//! `"NaN"`, `"inf"` and `"-inf"`.

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};

const NAN: &str = "NaN";
const INF: &str = "inf";
const NEG_INF: &str = "-inf";

#[derive(Clone, Copy)]
struct Real(f32);

impl Serialize for Real {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if value.is_finite() {
            serializer.serialize_f32(value)
        } else if value.is_nan() {
            serializer.serialize_str(NAN)
        } else if value.is_sign_positive() {
            serializer.serialize_str(INF)
        } else {
            serializer.serialize_str(NEG_INF)
        }
    }
}

impl<'de> Deserialize<'de> for Real {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = Real;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a number, \"NaN\", \"inf\" or \"-inf\"")
            }

            fn visit_f64<E>(self, v: f64) -> Result<Real, E> {
                Ok(Real(v as f32))
            }
            fn visit_i64<E>(self, v: i64) -> Result<Real, E> {
                Ok(Real(v as f32))
            }
            fn visit_u64<E>(self, v: u64) -> Result<Real, E> {
                Ok(Real(v as f32))
            }
            fn visit_str<E>(self, s: &str) -> Result<Real, E>
            where
                E: de::Error,
            {
                match s {
                    NAN => Ok(Real(f32::NAN)),
                    INF => Ok(Real(f32::INFINITY)),
                    NEG_INF => Ok(Real(f32::NEG_INFINITY)),
                    other => Err(E::custom(format!("not a float: {other:?}"))),
                }
            }
        }

        deserializer.deserialize_any(V)
    }
}

/// For `f32` fields.
pub(crate) mod scalar {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        Real(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        Real::deserialize(deserializer).map(|real| real.0)
    }
}

/// For `Vec<f32>` fields.
pub(crate) mod vec {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|&value| Real(value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = Vec<f32>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a sequence of floats")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<f32>, A::Error> {
                let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(Real(value)) = seq.next_element()? {
                    values.push(value);
                }
                Ok(values)
            }
        }

        deserializer.deserialize_seq(V)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "super::scalar")]
        reward: f32,
        #[serde(with = "super::vec")]
        obs: Vec<f32>,
    }

    #[test]
    fn test_non_finite_values_survive_json() {
        let sample = Sample {
            reward: f32::NEG_INFINITY,
            obs: vec![1.5, f32::NAN, f32::INFINITY],
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"reward":"-inf","obs":[1.5,"NaN","inf"]}"#);

        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back.reward, f32::NEG_INFINITY);
        assert_eq!(back.obs[0], 1.5);
        assert!(back.obs[1].is_nan());
        assert_eq!(back.obs[2], f32::INFINITY);
    }

    #[test]
    fn test_integers_and_garbage() {
        let back: Sample = serde_json::from_str(r#"{"reward":-2,"obs":[3]}"#).unwrap();
        assert_eq!((back.reward, back.obs), (-2.0, vec![3.0]));

        assert!(serde_json::from_str::<Sample>(r#"{"reward":"huge","obs":[]}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"reward":null,"obs":[]}"#).is_err());
    }
}
