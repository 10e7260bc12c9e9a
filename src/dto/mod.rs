//! Wire payloads of the tournament API.
//!
//! The serde structs mirror the JSON exactly, nullable and omittable fields
//! included. Everything the type system cannot promise (side letters, call
//! spellings, positive numbers, pair ranges) is enforced by the fallible
//! conversions into model types, which name the offending field the way the
//! failure logs expect.

pub(crate) mod movement;
pub(crate) mod tournament;
