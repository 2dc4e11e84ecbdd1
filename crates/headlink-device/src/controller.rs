use std::time::Duration;

use headlink_itmp::{parse_capabilities, Capability, Message, MessageType, Value};
use headlink_transport::Link;
use tracing::{debug, warn};

use crate::client::ProtocolClient;
use crate::config::ControllerConfig;
use crate::error::{DeviceError, Result};
use crate::events::{DeviceEvent, EventSink, RpcState, TracingSink};
use crate::motion::move_duration;

pub const PROC_ENABLE: &str = "enable";
pub const PROC_ADC: &str = "adc/p";
pub const PROC_MOTOR_POSITION: &str = "mot1/pos";
pub const PROC_MOTOR_SENSOR: &str = "mot1/sensor";
pub const PROC_MOTOR_GO: &str = "mot1/go";
pub const PROC_GPIO: &str = "gpio";

/// GPIO bank that drives the two valves.
const VALVE_BANK: i64 = 12;

/// A `mot1/go` that has been sent but whose reply has not been read.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "the move reply must be read with wait_and_fetch_result"]
pub struct PendingMove {
    pub id: u64,
    pub target: i64,
    /// Expected travel time including the settle margin.
    pub duration: Duration,
}

/// High-level operations on the head device.
///
/// Owns the link exclusively, allocates request ids, and tracks the last
/// commanded motor position so that move timing can be computed.
pub struct DeviceController<L> {
    client: ProtocolClient<L>,
    config: ControllerConfig,
    next_id: u64,
    position: i64,
    sink: Box<dyn EventSink + Send>,
}

impl<L: Link> DeviceController<L> {
    pub fn new(link: L) -> Self {
        Self::with_config(link, ControllerConfig::default())
    }

    pub fn with_config(link: L, config: ControllerConfig) -> Self {
        Self {
            client: ProtocolClient::new(link),
            config,
            next_id: 1,
            position: 0,
            sink: Box::new(TracingSink),
        }
    }

    /// Replace the event sink.
    pub fn with_sink(mut self, sink: impl EventSink + Send + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn address(&self) -> u8 {
        self.config.address
    }

    pub fn set_address(&mut self, address: u8) {
        self.config.address = address;
    }

    /// Last known motor position in steps. Starts at 0.
    pub fn current_position(&self) -> i64 {
        self.position
    }

    /// Override the tracked position, e.g. after homing by other means.
    pub fn set_current_position(&mut self, position: i64) {
        self.position = position;
    }

    pub fn state(&self) -> RpcState {
        self.client.state()
    }

    /// Call `procedure` and return the RESULT payload.
    pub fn call(&mut self, procedure: &str, arguments: Vec<Value>) -> Result<Vec<Value>> {
        let id = self.allocate_id();
        let reply = self.exchange(&Message::call(id, procedure, arguments))?;
        expect_result(id, reply)
    }

    /// Describe `topic`; an empty topic lists everything the device offers.
    pub fn describe(&mut self, topic: &str) -> Result<Vec<Value>> {
        let id = self.allocate_id();
        let reply = self.exchange(&Message::describe(id, topic))?;
        match reply {
            Message::Description {
                id: actual,
                description,
            } => {
                check_id(id, actual)?;
                Ok(description)
            }
            Message::Error {
                id: actual,
                code,
                reason,
            } => {
                check_id(id, actual)?;
                Err(DeviceError::Remote { code, reason })
            }
            other => Err(DeviceError::UnexpectedResponse {
                expected: MessageType::Description,
                actual: other.kind(),
            }),
        }
    }

    /// The full capability listing.
    pub fn capabilities(&mut self) -> Result<Vec<Capability>> {
        let description = self.describe("")?;
        Ok(parse_capabilities(&description))
    }

    /// Fail unless the device lists `procedure`.
    pub fn ensure_procedure(&mut self, procedure: &str) -> Result<Capability> {
        self.capabilities()?
            .into_iter()
            .find(|cap| cap.path == procedure)
            .ok_or_else(|| DeviceError::UnknownProcedure(procedure.to_string()))
    }

    pub fn enable(&mut self) -> Result<Vec<Value>> {
        self.call(PROC_ENABLE, Vec::new())
    }

    pub fn read_adc(&mut self) -> Result<Vec<Value>> {
        self.call(PROC_ADC, Vec::new())
    }

    pub fn read_motor_position(&mut self) -> Result<Vec<Value>> {
        self.call(PROC_MOTOR_POSITION, Vec::new())
    }

    pub fn read_motor_sensor(&mut self) -> Result<Vec<Value>> {
        self.call(PROC_MOTOR_SENSOR, Vec::new())
    }

    /// Set PWM channel `channel` (procedure `pwm<channel>`).
    pub fn set_pwm(&mut self, channel: u8, value: i64) -> Result<Vec<Value>> {
        self.call(&format!("pwm{channel}"), vec![Value::Integer(value)])
    }

    /// Open or close the two valves. Each flag is one output bit.
    pub fn set_valves(&mut self, valve1: bool, valve2: bool) -> Result<Vec<Value>> {
        let bits = (i64::from(valve1) * 2 + i64::from(valve2)) * 4;
        self.call(
            PROC_GPIO,
            vec![Value::Integer(VALVE_BANK), Value::Integer(bits)],
        )
    }

    /// Move the motor to `target` and block until the move should be done.
    ///
    /// Returns `Ok(None)` without touching the link when the motor is
    /// already at `target`. Once the move's RESULT has arrived the call
    /// succeeds; a failing position query afterwards is only reported
    /// through the event sink.
    pub fn move_motor(
        &mut self,
        target: i64,
        max_velocity: i64,
        acceleration: i64,
    ) -> Result<Option<Vec<Value>>> {
        match self.begin_move(target, max_velocity, acceleration)? {
            Some(pending) => self.wait_and_fetch_result(pending).map(Some),
            None => Ok(None),
        }
    }

    /// Validate, time and send a `mot1/go` without reading its reply.
    pub fn begin_move(
        &mut self,
        target: i64,
        max_velocity: i64,
        acceleration: i64,
    ) -> Result<Option<PendingMove>> {
        if max_velocity <= 0 {
            return Err(DeviceError::InvalidArgument(format!(
                "max velocity must be positive, got {max_velocity}"
            )));
        }
        if acceleration < 0 {
            return Err(DeviceError::InvalidArgument(format!(
                "acceleration must not be negative, got {acceleration}"
            )));
        }

        let delta = target.abs_diff(self.position);
        if delta == 0 {
            self.sink.record(&DeviceEvent::MoveSkipped { target });
            return Ok(None);
        }

        let travel = move_duration(
            delta,
            max_velocity.unsigned_abs(),
            acceleration.unsigned_abs(),
        );
        let duration = travel.saturating_add(self.config.settle_margin);

        let id = self.allocate_id();
        let request = Message::call(
            id,
            PROC_MOTOR_GO,
            vec![
                Value::Integer(target),
                Value::Integer(max_velocity),
                Value::Integer(acceleration),
            ],
        );
        self.send(&request)?;
        self.sink.record(&DeviceEvent::MoveScheduled {
            target,
            velocity: max_velocity,
            acceleration,
            duration,
        });

        Ok(Some(PendingMove {
            id,
            target,
            duration,
        }))
    }

    /// Sleep out the move, then read its reply and update the position.
    ///
    /// The reply is read no earlier than `pending.duration` after this call.
    pub fn wait_and_fetch_result(&mut self, pending: PendingMove) -> Result<Vec<Value>> {
        debug!(id = pending.id, duration = ?pending.duration, "waiting for move");
        std::thread::sleep(pending.duration);

        let reply = self.receive(pending.id)?;
        let result = expect_result(pending.id, reply)?;

        self.position = pending.target;
        self.sink.record(&DeviceEvent::PositionUpdated {
            position: pending.target,
            confirmed: false,
        });

        if self.config.requery_position {
            if let Err(err) = self.refresh_position() {
                warn!(
                    error = %err,
                    position = self.position,
                    "position query after move failed, keeping commanded position"
                );
                self.sink.record(&DeviceEvent::PositionQueryFailed {
                    position: self.position,
                    reason: err.to_string(),
                });
            }
        }
        Ok(result)
    }

    /// Ask the device where the motor is and adopt the answer.
    ///
    /// A reply that does not start with an integer leaves the tracked
    /// position unchanged.
    pub fn refresh_position(&mut self) -> Result<i64> {
        let reply = self.read_motor_position()?;
        match reply.first().and_then(Value::as_i64) {
            Some(position) => {
                self.position = position;
                self.sink.record(&DeviceEvent::PositionUpdated {
                    position,
                    confirmed: true,
                });
            }
            None => warn!(
                reply = ?reply,
                position = self.position,
                "unexpected position reply, keeping commanded position"
            ),
        }
        Ok(self.position)
    }

    /// Close the link. Later calls fail with a closed-transport error.
    pub fn close(&mut self) {
        self.client.close();
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }

    pub fn client_mut(&mut self) -> &mut ProtocolClient<L> {
        &mut self.client
    }

    pub fn into_inner(self) -> L {
        self.client.into_inner()
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn exchange(&mut self, request: &Message) -> Result<Message> {
        self.send(request)?;
        self.receive(request.id())
    }

    fn send(&mut self, request: &Message) -> Result<()> {
        let address = self.config.address;
        match self.client.send(request, address) {
            Ok(frame_len) => {
                self.sink.record(&DeviceEvent::RequestSent {
                    address,
                    id: request.id(),
                    kind: request.kind(),
                    frame_len,
                });
                Ok(())
            }
            Err(err) => {
                self.record_failure(request.id(), &err);
                Err(err)
            }
        }
    }

    fn receive(&mut self, id: u64) -> Result<Message> {
        match self.client.receive(self.config.response_timeout) {
            Ok(reply) => {
                self.sink.record(&DeviceEvent::ResponseReceived {
                    address: self.config.address,
                    id: reply.id(),
                    kind: reply.kind(),
                });
                Ok(reply)
            }
            Err(err) => {
                self.record_failure(id, &err);
                Err(err)
            }
        }
    }

    fn record_failure(&self, id: u64, err: &DeviceError) {
        self.sink.record(&DeviceEvent::RequestFailed {
            id,
            state: self.client.state(),
            reason: err.to_string(),
        });
    }
}

impl<L> std::fmt::Debug for DeviceController<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceController")
            .field("config", &self.config)
            .field("next_id", &self.next_id)
            .field("position", &self.position)
            .finish()
    }
}

fn check_id(expected: u64, actual: u64) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DeviceError::IdMismatch { expected, actual })
    }
}

fn expect_result(id: u64, reply: Message) -> Result<Vec<Value>> {
    match reply {
        Message::Result { id: actual, result } => {
            check_id(id, actual)?;
            Ok(result)
        }
        Message::Error {
            id: actual,
            code,
            reason,
        } => {
            check_id(id, actual)?;
            Err(DeviceError::Remote { code, reason })
        }
        other => Err(DeviceError::UnexpectedResponse {
            expected: MessageType::Result,
            actual: other.kind(),
        }),
    }
}
