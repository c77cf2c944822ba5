//! Transport client (§4.G): submit a program, reassemble its chunked
//! reply, and surface a single result or error.

use mdio_asm::Program;
use mdio_vm::{BusRegistry, MdioBus, ReplyPart};
use tracing::debug;

use crate::error::ClientError;

/// Submits a program for one bus and returns its reply, already
/// reassembled from whatever multi-part framing the underlying
/// transport used.
///
/// A real deployment implements this against a netlink socket; tests and
/// this crate's own examples use [`LoopbackTransport`], the in-process
/// stand-in sanctioned for target implementations that can't carry a
/// literal kernel transport.
pub trait Transport {
    /// Run `program` against `bus_id`, with an optional timeout override.
    fn xfer(
        &mut self,
        bus_id: &str,
        program: &Program,
        timeout_ms: Option<u16>,
    ) -> Result<Vec<ReplyPart>, ClientError>;
}

/// An in-process transport that drives [`mdio_vm::handle_request`]
/// directly against a registry of simulated buses.
pub struct LoopbackTransport<B> {
    registry: BusRegistry<B>,
    chunk_capacity: usize,
}

impl<B: MdioBus> LoopbackTransport<B> {
    /// Wrap a bus registry; `chunk_capacity` controls how many emitted
    /// words land in each `DATA` part before the chunker flushes.
    pub fn new(registry: BusRegistry<B>, chunk_capacity: usize) -> Self {
        Self {
            registry,
            chunk_capacity,
        }
    }
}

impl<B: MdioBus> Transport for LoopbackTransport<B> {
    fn xfer(
        &mut self,
        bus_id: &str,
        program: &Program,
        timeout_ms: Option<u16>,
    ) -> Result<Vec<ReplyPart>, ClientError> {
        mdio_vm::handle_request(
            &self.registry,
            bus_id,
            &program.encode(),
            timeout_ms,
            self.chunk_capacity,
        )
        .map_err(|err| ClientError::Transport(err.to_string()))
    }
}

/// A thin client bound to one bus, reassembling replies into a single
/// `Result`.
pub struct Client<T> {
    transport: T,
    bus_id: String,
    timeout_ms: Option<u16>,
}

impl<T: Transport> Client<T> {
    /// Bind a client to `bus_id`, using the transport's default timeout
    /// unless [`Client::with_timeout`] overrides it.
    pub fn new(transport: T, bus_id: impl Into<String>) -> Self {
        Self {
            transport,
            bus_id: bus_id.into(),
            timeout_ms: None,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout_ms: u16) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Run `program` and collect the concatenated `EMIT` stream.
    ///
    /// An `ERROR` part fails the whole call with [`ClientError::Device`]
    /// even if some `DATA` parts arrived first — a partial reply is not
    /// a usable one (§7).
    pub fn run(&mut self, program: &Program) -> Result<Vec<u32>, ClientError> {
        let parts = self.transport.xfer(&self.bus_id, program, self.timeout_ms)?;
        debug!(bus = %self.bus_id, parts = parts.len(), "reply reassembled");

        let mut data = Vec::new();
        let mut error = None;
        let mut done = false;

        for part in parts {
            match part {
                ReplyPart::Data(values) => data.extend(values),
                ReplyPart::Error(errno) => error = Some(errno),
                ReplyPart::Done => done = true,
            }
        }

        if let Some(errno) = error {
            return Err(ClientError::Device(errno));
        }
        if !done {
            return Err(ClientError::Truncated);
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder;
    use mdio_vm::{DeviceAddress, SimulatedBus};

    fn client_with_bus() -> (Client<LoopbackTransport<SimulatedBus>>, DeviceAddress) {
        let mut registry: BusRegistry<SimulatedBus> = BusRegistry::new();
        registry.register("fixed-0", SimulatedBus::new());
        let client = Client::new(LoopbackTransport::new(registry, 32), "fixed-0");
        (client, DeviceAddress::Clause22 { phyad: 1 })
    }

    #[test]
    fn raw_read_round_trips_through_the_loopback_transport() {
        let (mut client, device) = client_with_bus();
        client
            .run(&builder::raw_write(device, 4, 0xbeef))
            .unwrap();
        let values = client.run(&builder::raw_read(device, 4)).unwrap();
        assert_eq!(values, vec![0xbeef]);
    }

    #[test]
    fn unknown_bus_surfaces_as_a_transport_error() {
        let registry: BusRegistry<SimulatedBus> = BusRegistry::new();
        let mut client = Client::new(LoopbackTransport::new(registry, 32), "missing");
        let device = DeviceAddress::Clause22 { phyad: 0 };
        let err = client.run(&builder::raw_read(device, 0)).unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[test]
    fn device_abort_surfaces_as_a_device_error() {
        let (mut client, _device) = client_with_bus();
        // a single instruction jumping to a negative PC
        let program = Program::from_instructions(vec![mdio_asm::Instruction::new(
            mdio_asm::Opcode::Jeq,
            mdio_asm::Arg::new(mdio_asm::ArgMode::Imm, 0),
            mdio_asm::Arg::new(mdio_asm::ArgMode::Imm, 0),
            mdio_asm::Arg::new(mdio_asm::ArgMode::Imm, (-2i16) as u16),
        )]);
        let err = client.run(&program).unwrap_err();
        assert!(matches!(err, ClientError::Device(_)));
    }
}
