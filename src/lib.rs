pub mod flush;
pub mod id;
pub mod model;
pub mod sim;

pub use id::IdGenerator;
pub use model::{
    Body, Community, EventTag, Gender, Genotype, History, LifeEvent, Pair, Person, Personality,
    Polycule, ProbabilityTable, Sexuality, SkillSet, Status, Traditions, Trait, YearRecord,
};
pub use sim::{RunConfig, found, run};
