//! JSON scripts: a list of calls and describes run in order.
//!
//! ```json
//! {
//!   "addr": 4,
//!   "script": [
//!     { "message_type": "call", "procedure": "enable", "arguments": [] },
//!     { "message_type": "call", "to_call": "mot1/go", "args": [1000, 700, 0] },
//!     { "message_type": "describe", "topic": "" },
//!     ["mot1/pos", []]
//!   ]
//! }
//! ```
//!
//! Steps may also be written as `[procedure, arguments]` pairs. Unknown
//! keys (such as an explicit `message` id) are ignored; the controller
//! assigns ids itself.

use std::path::Path;

use headlink_itmp::Value;
use headlink_transport::Link;
use serde::Deserialize;
use tracing::info;

use crate::controller::{DeviceController, PROC_MOTOR_GO};
use crate::error::{DeviceError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// Device address for every step. `None` keeps the controller's.
    pub address: Option<u8>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Call {
        procedure: String,
        arguments: Vec<Value>,
    },
    Describe {
        topic: String,
    },
}

/// What one step produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub index: usize,
    pub step: Step,
    /// RESULT or DESCRIPTION payload. `None` for a move that was skipped
    /// because the motor was already at its target.
    pub reply: Option<Vec<Value>>,
}

#[derive(Deserialize)]
struct RawScript {
    #[serde(default)]
    addr: Option<u8>,
    script: Vec<RawStep>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStep {
    Tagged(TaggedStep),
    Pair(String, Vec<serde_json::Value>),
}

#[derive(Deserialize)]
#[serde(tag = "message_type", rename_all = "lowercase")]
enum TaggedStep {
    Call {
        #[serde(alias = "to_call")]
        procedure: String,
        #[serde(default, alias = "args")]
        arguments: Vec<serde_json::Value>,
    },
    Describe {
        #[serde(default)]
        topic: String,
    },
}

impl From<RawStep> for Step {
    fn from(raw: RawStep) -> Self {
        let convert = |args: Vec<serde_json::Value>| -> Vec<Value> {
            args.into_iter().map(Value::from).collect()
        };
        match raw {
            RawStep::Tagged(TaggedStep::Call {
                procedure,
                arguments,
            })
            | RawStep::Pair(procedure, arguments) => Step::Call {
                procedure,
                arguments: convert(arguments),
            },
            RawStep::Tagged(TaggedStep::Describe { topic }) => Step::Describe { topic },
        }
    }
}

impl Step {
    /// `(target, velocity, acceleration)` when this is a well-formed
    /// `mot1/go` call.
    pub fn as_move(&self) -> Option<(i64, i64, i64)> {
        match self {
            Step::Call {
                procedure,
                arguments,
            } if procedure == PROC_MOTOR_GO => match arguments.as_slice() {
                [target, velocity, accel] => {
                    Some((target.as_i64()?, velocity.as_i64()?, accel.as_i64()?))
                }
                _ => None,
            },
            _ => None,
        }
    }
}

impl Script {
    /// Parse a script from JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawScript = serde_json::from_str(text)?;
        let steps: Vec<Step> = raw.script.into_iter().map(Step::from).collect();
        if let Some(index) = steps
            .iter()
            .position(|step| matches!(step, Step::Call { procedure, .. } if procedure.is_empty()))
        {
            return Err(DeviceError::Script(format!(
                "step {index}: empty procedure name"
            )));
        }
        Ok(Self {
            address: raw.addr,
            steps,
        })
    }

    /// Read and parse a script file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| DeviceError::Script(format!("{}: {err}", path.display())))?;
        Self::parse(&text)
    }

    /// Run every step in order, stopping at the first error.
    ///
    /// A `mot1/go` call with three integer arguments goes through
    /// [`DeviceController::move_motor`], so the script waits for the move.
    pub fn run<L: Link>(&self, controller: &mut DeviceController<L>) -> Result<Vec<StepOutcome>> {
        if let Some(address) = self.address {
            controller.set_address(address);
        }

        let mut outcomes = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            info!(index, step = ?step, "running script step");
            let reply = match (step, step.as_move()) {
                (_, Some((target, velocity, accel))) => {
                    controller.move_motor(target, velocity, accel)?
                }
                (
                    Step::Call {
                        procedure,
                        arguments,
                    },
                    None,
                ) => Some(controller.call(procedure, arguments.clone())?),
                (Step::Describe { topic }, None) => Some(controller.describe(topic)?),
            };
            outcomes.push(StepOutcome {
                index,
                step: step.clone(),
                reply,
            });
        }
        Ok(outcomes)
    }
}

impl std::str::FromStr for Script {
    type Err = DeviceError;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}
