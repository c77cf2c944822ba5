//! End-to-end scenarios driving the simulated transport through the
//! client API, with the literal register values a reviewer would check
//! by hand.

use mdio_asm::{Arg, ArgMode, Instruction, Opcode, Program};
use mdio_client::{Client, LoopbackTransport};
use mdio_vm::{BusRegistry, DeviceAddress, SimulatedBus};

fn imm(value: u16) -> Arg {
    Arg::new(ArgMode::Imm, value)
}

fn reg(index: u16) -> Arg {
    Arg::new(ArgMode::Reg, index)
}

fn none() -> Arg {
    Arg::new(ArgMode::None, 0)
}

fn client_over(registry: BusRegistry<SimulatedBus>) -> Client<LoopbackTransport<SimulatedBus>> {
    Client::new(LoopbackTransport::new(registry, 64), "fixed-0")
}

#[test]
fn scenario_1_raw_read_of_bmsr_on_phy_3() {
    let mut registry = BusRegistry::new();
    let mut bus = SimulatedBus::new();
    let phy3 = DeviceAddress::Clause22 { phyad: 3 };
    bus.set(phy3, 1, 0x796d); // BMSR: link up, autoneg complete
    registry.register("fixed-0", bus);
    let mut client = client_over(registry);

    let program = Program::from_instructions(vec![
        Instruction::new(Opcode::Read, imm(3), imm(1), reg(0)),
        Instruction::new(Opcode::Emit, reg(0), none(), none()),
    ]);

    let data = client.run(&program).unwrap();
    assert_eq!(data, vec![0x796d]);
}

#[test]
fn scenario_2_masked_write_sets_bmcr_reset_preserving_other_bits() {
    let mut registry = BusRegistry::new();
    let mut bus = SimulatedBus::new();
    let phy1 = DeviceAddress::Clause22 { phyad: 1 };
    bus.set(phy1, 0, 0x1140); // BMCR with autoneg-enable and other bits set
    registry.register("fixed-0", bus);
    let mut client = client_over(registry);

    let program = Program::from_instructions(vec![
        Instruction::new(Opcode::Read, imm(1), imm(0), reg(0)),
        Instruction::new(Opcode::And, reg(0), imm(0x7fff), reg(0)),
        Instruction::new(Opcode::Or, reg(0), imm(0x8000), reg(0)),
        Instruction::new(Opcode::Write, imm(1), imm(0), reg(0)),
    ]);

    let data = client.run(&program).unwrap();
    assert!(data.is_empty());

    let readback = Program::from_instructions(vec![
        Instruction::new(Opcode::Read, imm(1), imm(0), reg(0)),
        Instruction::new(Opcode::Emit, reg(0), none(), none()),
    ]);
    let data = client.run(&readback).unwrap();
    assert_eq!(data, vec![0x9140]);
    assert_eq!(data[0] & 0x8000, 0x8000);
}

#[test]
fn scenario_3_status_scan_across_all_32_c22_addresses() {
    let mut registry = BusRegistry::new();
    let mut bus = SimulatedBus::new();
    // PHYs 0 and 5 present, everything else absent (reads as 0xffff).
    for (phyad, id_hi, id_lo, status) in [(0u8, 0x0022u16, 0x1611u16, 0x7949u16), (5, 0x0141, 0x0e30, 0x796d)] {
        let dev = DeviceAddress::Clause22 { phyad };
        bus.set(dev, 2, id_hi);
        bus.set(dev, 3, id_lo);
        bus.set(dev, 1, status);
    }
    registry.register("fixed-0", bus);
    let mut client = client_over(registry);

    // R1 = device counter; loop body reads regs 1,2,3 and emits each;
    // increments R1; JNE back to top while R1 != 32.
    let loop_start = 1usize; // after the initial R1 = 0
    let insns = vec![
        Instruction::new(Opcode::Add, imm(0), imm(0), reg(1)),
        Instruction::new(Opcode::Read, reg(1), imm(1), reg(0)),
        Instruction::new(Opcode::Emit, reg(0), none(), none()),
        Instruction::new(Opcode::Read, reg(1), imm(2), reg(0)),
        Instruction::new(Opcode::Emit, reg(0), none(), none()),
        Instruction::new(Opcode::Read, reg(1), imm(3), reg(0)),
        Instruction::new(Opcode::Emit, reg(0), none(), none()),
        Instruction::new(Opcode::Add, reg(1), imm(1), reg(1)),
    ];
    let jne_index = insns.len();
    let mut insns = insns;
    let displacement = (loop_start as i64 - jne_index as i64 - 1) as i16 as u16;
    insns.push(Instruction::new(Opcode::Jne, reg(1), imm(32), imm(displacement)));

    let program = Program::from_instructions(insns);
    let data = client.run(&program).unwrap();

    assert_eq!(data.len(), 96);
    let devices_with_real_ids: Vec<_> = data
        .chunks_exact(3)
        .enumerate()
        .filter(|(_, triple)| !(triple[1] == 0xffff && triple[2] == 0xffff))
        .map(|(phyad, triple)| (phyad, triple[1]))
        .collect();
    assert_eq!(devices_with_real_ids.len(), 2);
    assert_eq!(devices_with_real_ids[0].0, 0);
    assert_eq!(devices_with_real_ids[1].0, 5);
}

#[test]
fn scenario_4_timeout_aborts_with_no_data() {
    let mut registry = BusRegistry::new();
    registry.register("fixed-0", SimulatedBus::new());
    let mut client = client_over(registry).with_timeout(10);

    let program = Program::from_instructions(vec![Instruction::new(
        Opcode::Jeq,
        imm(0),
        imm(0),
        imm((-1i16) as u16),
    )]);

    let err = client.run(&program).unwrap_err();
    assert_eq!(err, mdio_client::ClientError::Device(mdio_vm::Abort::Timeout.errno()));
}

#[test]
fn scenario_5_validator_rejects_a_bad_argument_mode() {
    let mut registry = BusRegistry::new();
    registry.register("fixed-0", SimulatedBus::new());
    let mut client = client_over(registry);

    // READ's arg2 (the destination) must be a register; IMM is illegal.
    let program = Program::from_instructions(vec![Instruction::new(
        Opcode::Read,
        imm(3),
        imm(1),
        imm(0),
    )]);

    let err = client.run(&program).unwrap_err();
    match err {
        mdio_client::ClientError::Transport(message) => {
            assert!(message.contains("Argument 2 invalid"), "got: {message}");
        }
        other => panic!("expected a transport-side validation error, got {other:?}"),
    }
}

#[test]
fn scenario_6_indirect_multi_chip_switch_read() {
    let program = mdio_client::builder::mv6_read(4, 0x1b, 0x01);
    let mut registry = BusRegistry::new();
    let mut bus = SimulatedBus::new();
    let sw = DeviceAddress::Clause22 { phyad: 4 };
    bus.set(sw, 0, 0); // CMD register idle
    bus.set(sw, 1, 0xcafe); // DATA register holds the indirect result
    registry.register("fixed-0", bus);
    let mut client = client_over(registry);

    let result = client.run(&program).unwrap();
    assert_eq!(result, vec![0xcafe]);
}
