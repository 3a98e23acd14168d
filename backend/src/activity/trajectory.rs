//! Built-in activities and the trajectory builder
//!
//! A [`Trajectory`] is an ordered list of seize / timeout / release steps that
//! is linked, back to front, into a chain of [`NextStep`] objects.
//!
//! # Example
//!
//! ```rust
//! use queue_simulator_core_rs::activity::{NextStep, Trajectory};
//!
//! // Take a teller, spend 4 time units, give the teller back.
//! // Customers that find the queue full go to the ATM instead.
//! let atm = Trajectory::new().timeout_fixed(1.0);
//! let chain = Trajectory::new()
//!     .seize_or("teller", 1, atm)
//!     .timeout_fixed(4.0)
//!     .release("teller", 1)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(chain.name(), "Seize");
//! ```

use super::{ActivityContext, NextStep, Transition};
use crate::arrivals::{validate_delay, NextDelay};
use crate::distributions::Fixed;
use crate::models::RequestStatus;
use crate::orchestrator::SimulationError;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// What a seize does when the resource rejects the request
#[derive(Debug, Clone)]
enum OnReject {
    /// Leave the system unfinished
    Leave,

    /// Continue on an alternative chain (`None` = empty chain, finish)
    Branch(Option<Rc<dyn NextStep>>),
}

struct SeizeStep {
    resource: String,
    amount: u32,
    on_reject: OnReject,
    next: Option<Rc<dyn NextStep>>,
}

impl NextStep for SeizeStep {
    fn name(&self) -> &str {
        "Seize"
    }

    fn execute(&self, ctx: &mut ActivityContext<'_>) -> Result<Transition, SimulationError> {
        let transition = match ctx.seize(&self.resource, self.amount)? {
            RequestStatus::Success => Transition::proceed(self.next.clone()),
            RequestStatus::Enqueued => Transition::Park {
                next: self.next.clone(),
            },
            RequestStatus::Rejected => match &self.on_reject {
                OnReject::Leave => Transition::Leave,
                OnReject::Branch(branch) => Transition::proceed(branch.clone()),
            },
        };
        Ok(transition)
    }

    fn reset(&self) {
        if let OnReject::Branch(Some(branch)) = &self.on_reject {
            branch.reset();
        }
        if let Some(next) = &self.next {
            next.reset();
        }
    }
}

struct ReleaseStep {
    resource: String,
    amount: u32,
    next: Option<Rc<dyn NextStep>>,
}

impl NextStep for ReleaseStep {
    fn name(&self) -> &str {
        "Release"
    }

    fn execute(&self, ctx: &mut ActivityContext<'_>) -> Result<Transition, SimulationError> {
        ctx.release(&self.resource, self.amount)?;
        Ok(Transition::proceed(self.next.clone()))
    }

    fn reset(&self) {
        if let Some(next) = &self.next {
            next.reset();
        }
    }
}

struct TimeoutStep {
    /// Interior mutability: drawing advances the distribution
    delay: RefCell<Box<dyn NextDelay>>,
    next: Option<Rc<dyn NextStep>>,
}

impl NextStep for TimeoutStep {
    fn name(&self) -> &str {
        "Timeout"
    }

    fn execute(&self, _ctx: &mut ActivityContext<'_>) -> Result<Transition, SimulationError> {
        let delay = self.delay.borrow_mut().next_delay().ok_or_else(|| {
            SimulationError::DistributionExhausted(self.name().to_string())
        })?;
        let delay = validate_delay(self.name(), delay)?;

        Ok(Transition::Advance {
            delay,
            next: self.next.clone(),
        })
    }

    fn reset(&self) {
        self.delay.borrow_mut().reset();
        if let Some(next) = &self.next {
            next.reset();
        }
    }
}

enum StepSpec {
    Seize {
        resource: String,
        amount: u32,
        on_reject: Option<Trajectory>,
    },
    Release {
        resource: String,
        amount: u32,
    },
    Timeout(Box<dyn NextDelay>),
}

/// Builder for a chain of built-in activities
#[derive(Default)]
pub struct Trajectory {
    steps: Vec<StepSpec>,
}

impl fmt::Debug for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .steps
            .iter()
            .map(|step| match step {
                StepSpec::Seize { .. } => "Seize",
                StepSpec::Release { .. } => "Release",
                StepSpec::Timeout(_) => "Timeout",
            })
            .collect();
        f.debug_struct("Trajectory").field("steps", &names).finish()
    }
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seize `amount` units; a rejected arrival leaves the system
    pub fn seize(mut self, resource: &str, amount: u32) -> Self {
        self.steps.push(StepSpec::Seize {
            resource: resource.to_string(),
            amount,
            on_reject: None,
        });
        self
    }

    /// Seize `amount` units; a rejected arrival continues on `on_reject`
    ///
    /// An empty `on_reject` trajectory finishes the arrival right away.
    pub fn seize_or(mut self, resource: &str, amount: u32, on_reject: Trajectory) -> Self {
        self.steps.push(StepSpec::Seize {
            resource: resource.to_string(),
            amount,
            on_reject: Some(on_reject),
        });
        self
    }

    /// Release `amount` held units
    pub fn release(mut self, resource: &str, amount: u32) -> Self {
        self.steps.push(StepSpec::Release {
            resource: resource.to_string(),
            amount,
        });
        self
    }

    /// Spend a delay drawn from `delay`
    pub fn timeout(mut self, delay: impl NextDelay + 'static) -> Self {
        self.steps.push(StepSpec::Timeout(Box::new(delay)));
        self
    }

    /// Spend a boxed delay capability
    pub fn timeout_boxed(mut self, delay: Box<dyn NextDelay>) -> Self {
        self.steps.push(StepSpec::Timeout(delay));
        self
    }

    /// Spend exactly `delay`
    pub fn timeout_fixed(self, delay: f64) -> Self {
        self.timeout(Fixed::new(delay))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Link the steps into a chain and return its entry point
    ///
    /// # Errors
    /// `InvalidConfig` for an empty trajectory (there is nothing to enter).
    pub fn build(self) -> Result<Rc<dyn NextStep>, SimulationError> {
        self.link()?.ok_or_else(|| {
            SimulationError::InvalidConfig("trajectory has no activities".to_string())
        })
    }

    fn link(self) -> Result<Option<Rc<dyn NextStep>>, SimulationError> {
        let mut next: Option<Rc<dyn NextStep>> = None;

        for spec in self.steps.into_iter().rev() {
            let step: Rc<dyn NextStep> = match spec {
                StepSpec::Seize {
                    resource,
                    amount,
                    on_reject,
                } => {
                    let on_reject = match on_reject {
                        Some(branch) => OnReject::Branch(branch.link()?),
                        None => OnReject::Leave,
                    };
                    Rc::new(SeizeStep {
                        resource,
                        amount,
                        on_reject,
                        next: next.take(),
                    })
                }
                StepSpec::Release { resource, amount } => Rc::new(ReleaseStep {
                    resource,
                    amount,
                    next: next.take(),
                }),
                StepSpec::Timeout(delay) => Rc::new(TimeoutStep {
                    delay: RefCell::new(delay),
                    next: next.take(),
                }),
            };
            next = Some(step);
        }

        Ok(next)
    }
}
