/*!
Skiing movement.

- config:     immutable per-actor tuning
- state:      tick input and the observable velocity/facing state
- integrator: per-tick velocity update (slope, friction, steering, speed cap, impulses)

The integrator never touches position. Callers feed it the terrain surface under the actor
and a grounded flag, then move the actor by the returned velocity.
*/

pub mod config;
pub mod integrator;
pub mod state;

pub use config::SkiingConfig;
pub use integrator::SkiingIntegrator;
pub use state::{SkiInput, SkiingState};
