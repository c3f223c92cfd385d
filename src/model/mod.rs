#[macro_use]
mod macros;

pub mod body;
pub mod community;
pub mod genotype;
pub mod history;
pub mod person;
pub mod personality;
pub mod polycule;
pub mod probability;
pub mod sexuality;
pub mod skills;

pub use body::{Body, BodyRegion, LossReport, PartCondition, ScarSite, Side};
pub use community::{Community, Gender, SettlementKind, Status, Traditions, YearContext, YearRecord};
pub use genotype::Genotype;
pub use history::{History, Record};
pub use person::{EventTag, LifeEvent, Person};
pub use personality::{Personality, Trait};
pub use polycule::{Pair, Polycule};
pub use probability::ProbabilityTable;
pub use sexuality::Sexuality;
pub use skills::SkillSet;

use rand::Rng;
use rand::RngCore;
use rand_distr::Normal;

/// Draw from `Normal(mean, sd)`. Parameters are compile-time constants at
/// every call site, so construction cannot fail.
pub(crate) fn gaussian(rng: &mut dyn RngCore, mean: f64, sd: f64) -> f64 {
    let dist = Normal::new(mean, sd).expect("normal parameters must be finite with sd > 0");
    rng.sample(dist)
}
