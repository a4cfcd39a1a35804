// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth) → Protected (bearer auth) → Elevated (bearer auth + stored role)

pub mod elevated;
pub mod protected;
pub mod public;
