//! Simulation systems organized by domain.
//!
//! - `ai`: monster perception, state machine and movement plans
//! - `combat`: attack formulas, damage, status effects and reaping
//! - `effects`: timed party-wide utility effects
//! - `encounter`: NPC-triggered monster groups and their shared rewards
//! - `experience`: experience awards and level thresholds
//! - `projectile`: arrows, magic bolts and melee slash visuals
//! - `spells`: spell resolution and casting costs

pub mod ai;
pub mod combat;
pub mod effects;
pub mod encounter;
pub mod experience;
pub mod projectile;
pub mod spells;
