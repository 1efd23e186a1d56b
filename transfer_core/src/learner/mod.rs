//! Active-learning selection policies
//!
//! Every policy owns one resident's data and its labelled / unlabelled
//! [`Partition`], and implements [`SelectionPolicy`]:
//!
//! - [`RandomPolicy`]: uniform over the unlabelled pool
//! - [`UncertaintyPolicy`]: closest to (or, reversed, furthest from) `p = 0.5`
//! - [`VoiPolicy`]: expected risk reduction net of query cost
//! - [`EvidencePolicy`]: model-evidence ratio on an uncertainty shortlist
//!
//! Hypothetical labels are evaluated on [`Hypothesis`] snapshots; no policy
//! changes its partition except through [`SelectionPolicy::update_model`].

pub mod error;
pub mod evidence;
pub mod hypothesis;
pub mod partition;
pub mod policy;
pub mod random;
pub mod risk;
pub mod uncertainty;
pub mod voi;

pub use error::{ActiveError, ActiveResult};
pub use evidence::{EvidencePolicy, EvidenceRatios};
pub use hypothesis::{retrain_or_prior, Hypothesis};
pub use partition::Partition;
pub use policy::{select_best, ActiveState, Objective, Selection, SelectionPolicy};
pub use random::RandomPolicy;
pub use risk::{QueryCosts, RiskMatrix, RiskObjective};
pub use uncertainty::UncertaintyPolicy;
pub use voi::{CandidateEstimate, VoiPolicy};
