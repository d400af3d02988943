//! Combat formula constants.

/// Luck points per +1% critical chance
pub const CRIT_LUCK_DIVISOR: i32 = 5;
/// Accuracy points per +1% hit chance
pub const HIT_ACCURACY_DIVISOR: i32 = 5;
/// Hit chance every attack starts from before weapon and accuracy bonuses (percent)
pub const BASE_HIT_CHANCE: i32 = 70;
/// Hit chance is clamped to this range (percent)
pub const MIN_HIT_CHANCE: i32 = 5;
pub const MAX_HIT_CHANCE: i32 = 95;
/// Critical hits multiply damage by this factor
pub const CRIT_DAMAGE_MULTIPLIER: i32 = 2;

/// Primary scaling stat points per +1 weapon damage
pub const PRIMARY_STAT_DIVISOR: i32 = 4;
/// Secondary scaling stat points per +1 weapon damage
pub const SECONDARY_STAT_DIVISOR: i32 = 8;

/// Intellect points per +1 projectile spell damage
pub const SPELL_INTELLECT_DIVISOR: i32 = 4;
/// Personality points per +1 heal
pub const HEAL_PERSONALITY_DIVISOR: i32 = 4;

/// Base damage added per weapon mastery rank above Novice
pub const WEAPON_MASTERY_DAMAGE_PER_RANK: i32 = 2;
/// Armor class added per armor mastery rank above Novice
pub const ARMOR_MASTERY_AC_PER_RANK: i32 = 1;
/// Spell magnitude added per magic mastery rank above Novice
pub const MAGIC_MASTERY_MAGNITUDE_PER_RANK: i32 = 5;

/// Endurance points per +1 armor class in the damage reduction formula
pub const AC_SCALING_DIVISOR: i32 = 5;
/// Luck points per +1% perfect dodge chance
pub const DODGE_LUCK_DIVISOR: i32 = 4;

/// Unarmed melee damage
pub const UNARMED_DAMAGE: i32 = 2;
/// Reach of a melee swing (tiles)
pub const MELEE_RANGE_TILES: f32 = 1.6;
/// Half-angle of the melee swing cone (radians)
pub const MELEE_HALF_ANGLE: f32 = std::f32::consts::FRAC_PI_4;

/// Frames between poison damage ticks
pub const POISON_TICK_FRAMES: u32 = 60;
/// Damage per poison tick
pub const POISON_DAMAGE: i32 = 2;
