use super::Vm;
use crate::{
    compiler,
    definitions::program as framing,
    error::{ProcessError, StackError},
    opcode::{read_instruction, Opcode},
    operand::{MemoryType, RegisterType},
    program::{self, Program},
};

/// will compile the source and run it through the loader
pub(super) fn build_program(source: &str) -> Program {
    let output = compiler::compile(source).expect("demo source has to compile");
    Program::new("test", output.binary).expect("compiled binary has to verify")
}

/// will setup a machine with the given source and input bytes
pub(super) fn setup_vm(source: &str, inputs: &[u8]) -> Vm {
    let mut vm = Vm::new(build_program(source));
    vm.set_inputs(inputs);
    vm
}

/// frames a hand written instruction body the way the compiler does,
/// to exercise paths the compiler refuses to emit
fn frame(body: &[u8]) -> Program {
    let size = (framing::HEADER_SIZE + body.len()) as u16;
    let mut data = size.to_be_bytes().to_vec();
    data.extend_from_slice(body);
    let sum = program::checksum(&data);
    data.extend_from_slice(&sum.to_be_bytes());
    Program::new("crafted", data).expect("crafted binary has to verify")
}

#[test]
fn test_accumulator_resets_every_scan() {
    let mut vm = setup_vm("LD IX0.0\nNOT", &[0]);
    vm.scan().unwrap();
    assert!(vm.accumulator());

    // a second scan starts from zero again, not from the last result
    vm.scan().unwrap();
    assert!(vm.accumulator());
}

#[test]
fn test_step_walks_one_cycle() {
    let mut vm = setup_vm("LD IX0.0\nST QX0.0", &[1]);

    assert_eq!(vm.step(), Ok(false));
    assert!(vm.accumulator());
    assert_eq!(vm.outputs()[0], 0);

    assert_eq!(vm.step(), Ok(true));
    assert_eq!(vm.outputs()[0], 1);

    // the next step begins a fresh cycle
    vm.set_inputs(&[0]);
    assert_eq!(vm.step(), Ok(false));
    assert!(!vm.accumulator());
}

mod scenarios {
    use super::*;

    #[test]
    /// §1: plain combinational rung
    fn test_and_or_ladder() {
        let mut vm = setup_vm(
            "LD IX0.0\nAND IX0.1\nANDN IX0.2\nOR IX0.3\nST QX0.0",
            &[0b0000_1111],
        );
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 0b0000_0001);
    }

    #[test]
    /// §2: the group keeps the zero accumulator in front of it
    fn test_group_with_zero_head() {
        let mut vm = setup_vm(
            "LD IX0.0\nAND( IX0.3\nOR IX0.4\n)\nST QX0.0",
            &[0b0001_0000],
        );
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 0b0000_0000);
    }

    #[test]
    /// §3: a float constant moves bit exact into the memory area
    fn test_float_move() {
        let mut vm = setup_vm("LD KX1\nMOV KR3.14 MR0", &[]);
        vm.scan().unwrap();
        assert_eq!(&vm.memories()[..4], &3.14f32.to_bits().to_be_bytes());
    }

    #[test]
    /// §4: on delay fires once the ticks reach the preset
    fn test_ton_after_ticks() {
        let mut vm = setup_vm("LD IX0.0\nTON K0 IX0.0 KW10 K1 QX0.1 MW2", &[1]);

        // first scan latches the timer at tick 0
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0] & 0b10, 0);

        vm.tick(10);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0] & 0b10, 0b10);
        assert_eq!(crate::memory::get_word(vm.memories(), 2), 10);
    }

    #[test]
    /// §5: three rising edges reach the preset
    fn test_ctu_three_edges() {
        let mut vm = setup_vm("LD IX0.0\nCTU K0 IX0.0 KW3 IX0.1 QX0.2 MW4", &[]);

        for &input in &[0, 1, 0, 1, 0, 1u8] {
            vm.set_inputs(&[input]);
            vm.scan().unwrap();
        }

        assert_eq!(crate::memory::get_word(vm.memories(), 4), 3);
        assert_eq!(vm.outputs()[0] & 0b100, 0b100);
    }

    #[test]
    /// §6: a truncated artifact never reaches the machine
    fn test_truncated_binary_is_rejected() {
        let mut data = vec![0x00, 0x14];
        data.resize(18, 0);
        assert!(Vm::load("broken", data).is_err());
    }
}

mod logic {
    use super::*;

    /// runs the two input program for every input combination and
    /// collects the accumulator results
    fn truth_table(source: &str) -> Vec<bool> {
        let mut results = Vec::new();
        for inputs in 0..4u8 {
            let mut vm = setup_vm(source, &[inputs]);
            vm.scan().unwrap();
            results.push(vm.accumulator());
        }
        results
    }

    #[test]
    fn test_and_law() {
        // inputs enumerate as b0 = a, b1 = b
        assert_eq!(
            truth_table("LD IX0.0\nAND IX0.1"),
            vec![false, false, false, true]
        );
        assert_eq!(
            truth_table("LD IX0.0\nANDN IX0.1"),
            vec![false, true, false, false]
        );
    }

    #[test]
    fn test_or_law() {
        assert_eq!(
            truth_table("LD IX0.0\nOR IX0.1"),
            vec![false, true, true, true]
        );
        assert_eq!(
            truth_table("LD IX0.0\nORN IX0.1"),
            vec![true, true, false, true]
        );
    }

    #[test]
    fn test_xor_law() {
        assert_eq!(
            truth_table("LD IX0.0\nXOR IX0.1"),
            vec![false, true, true, false]
        );
        assert_eq!(
            truth_table("LD IX0.0\nXORN IX0.1"),
            vec![true, false, false, true]
        );
    }

    #[test]
    fn test_not_is_involutive() {
        assert_eq!(truth_table("LD IX0.0\nNOT\nNOT"), vec![false, true, false, true]);
    }

    #[test]
    fn test_set_reset() {
        let mut vm = setup_vm("LD IX0.0\nS QX0.0\nLD IX0.1\nR QX0.0", &[0b01]);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 1);

        // the set output latches until the reset rung fires
        vm.set_inputs(&[0b00]);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 1);

        vm.set_inputs(&[0b10]);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 0);
    }

    #[test]
    fn test_store_negated() {
        let mut vm = setup_vm("LD IX0.0\nSTN QX0.0", &[0]);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 1);
    }
}

mod groups {
    use super::*;

    /// evaluates `a AND (b OR (c AND d))` for every input nibble
    #[test]
    fn test_nested_groups_match_algebra() {
        let source = "LD IX0.0\nAND( IX0.1\nOR( IX0.2\nAND IX0.3\n)\n)\nST QX0.0";
        for inputs in 0..16u8 {
            let a = inputs & 1 != 0;
            let b = inputs & 2 != 0;
            let c = inputs & 4 != 0;
            let d = inputs & 8 != 0;

            let mut vm = setup_vm(source, &[inputs]);
            vm.scan().unwrap();
            let expected = a && (b || (c && d));
            assert_eq!(vm.outputs()[0] != 0, expected, "inputs {:#06b}", inputs);
        }
    }

    #[test]
    fn test_group_negated_combinator() {
        // ANDN( applies its negation to the whole group result
        let source = "LD IX0.0\nANDN( IX0.1\nOR IX0.2\n)\nST QX0.0";
        let mut vm = setup_vm(source, &[0b001]);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 1);

        let mut vm = setup_vm(source, &[0b101]);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 0);
    }

    #[test]
    fn test_stack_overflow_is_fatal() {
        // one more opening than the stack holds
        let mut source = String::from("LD IX0.0\n");
        for _ in 0..crate::definitions::stack::SIZE + 1 {
            source.push_str("AND( IX0.0\n");
        }
        let mut vm = setup_vm(&source, &[1]);
        assert_eq!(vm.scan(), Err(ProcessError::Stack(StackError::Full)));
    }

    #[test]
    fn test_unmatched_close_is_fatal() {
        let mut vm = setup_vm("LD IX0.0\n)", &[1]);
        assert_eq!(vm.scan(), Err(ProcessError::Stack(StackError::Empty)));
    }
}

mod arithmetic {
    use super::*;

    fn run_memories(source: &str) -> Vm {
        let mut vm = setup_vm(source, &[]);
        vm.scan().unwrap();
        vm
    }

    #[test]
    fn test_word_arithmetic() {
        let vm = run_memories("LD KX1\nADD KW40 KW2 MW0\nSUB KW40 KW2 MW2\nMUL KW40 KW2 MW4\nDIV KW40 KW2 MW6\nMOD KW40 KW3 MW8");
        assert_eq!(crate::memory::get_word(vm.memories(), 0), 42);
        assert_eq!(crate::memory::get_word(vm.memories(), 2), 38);
        assert_eq!(crate::memory::get_word(vm.memories(), 4), 80);
        assert_eq!(crate::memory::get_word(vm.memories(), 6), 20);
        assert_eq!(crate::memory::get_word(vm.memories(), 8), 1);
    }

    #[test]
    fn test_arithmetic_wraps_in_destination_width() {
        let vm = run_memories("LD KX1\nADD KB127 KB1 MB0");
        assert_eq!(crate::memory::get_byte(vm.memories(), 0), i8::MIN);
    }

    #[test]
    fn test_bit_destination_takes_low_bit() {
        let vm = run_memories("LD KX1\nADD KW2 KW3 MX0.4");
        assert_eq!(vm.memories()[0], 0b0001_0000);
    }

    #[test]
    fn test_float_arithmetic() {
        let vm = run_memories("LD KX1\nADD KR1.5 KR2.25 MR0\nDIV KR1.0 KR0.0 MR4");
        assert_eq!(crate::memory::get_float(vm.memories(), 0), 3.75);
        // IEEE division by zero yields an infinity, not an error
        assert_eq!(crate::memory::get_float(vm.memories(), 4), f32::INFINITY);
    }

    #[test]
    fn test_division_by_zero_halts_the_scan() {
        let mut vm = setup_vm("LD KX1\nMOV KW7 MW0\nDIV KW10 KW0 MW2\nMOV KW9 MW4", &[]);
        let result = vm.scan();
        assert!(matches!(
            result,
            Err(ProcessError::DivisionByZero { .. })
        ));

        // completed writes stay, the write after the fault never ran
        assert_eq!(crate::memory::get_word(vm.memories(), 0), 7);
        assert_eq!(crate::memory::get_word(vm.memories(), 4), 0);
    }

    #[test]
    fn test_modulo_by_zero_halts_the_scan() {
        let mut vm = setup_vm("LD KX1\nMOD KW10 KW0 MW0", &[]);
        assert!(matches!(
            vm.scan(),
            Err(ProcessError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_gated_by_accumulator() {
        let mut vm = setup_vm("LD KX0\nADD KW1 KW1 MW0\nMOV KW5 MW2", &[]);
        vm.scan().unwrap();
        assert_eq!(crate::memory::get_word(vm.memories(), 0), 0);
        assert_eq!(crate::memory::get_word(vm.memories(), 2), 0);
    }
}

mod compares {
    use super::*;

    fn accumulator_after(source: &str) -> bool {
        let mut vm = setup_vm(source, &[]);
        vm.scan().unwrap();
        vm.accumulator()
    }

    #[test]
    fn test_integer_compares() {
        assert!(accumulator_after("LD KX1\nGT KW2 KW1"));
        assert!(!accumulator_after("LD KX1\nGT KW1 KW2"));
        assert!(accumulator_after("LD KX1\nGE KW2 KW2"));
        assert!(accumulator_after("LD KX1\nEQ KW2 KW2"));
        assert!(accumulator_after("LD KX1\nNE KW2 KW1"));
        assert!(accumulator_after("LD KX1\nLT KW-3 KW1"));
        assert!(accumulator_after("LD KX1\nLE KW1 KW1"));
    }

    #[test]
    fn test_signed_compare_across_widths() {
        // the byte -1 sign extends before it meets the word
        assert!(accumulator_after("LD KX1\nLT KB-1 KW1"));
    }

    #[test]
    fn test_nan_compares() {
        // every ordered predicate on a NaN is false
        assert!(!accumulator_after("LD KX1\nGT KRNaN KR1.0"));
        assert!(!accumulator_after("LD KX1\nGE KRNaN KR1.0"));
        assert!(!accumulator_after("LD KX1\nEQ KRNaN KRNaN"));
        assert!(!accumulator_after("LD KX1\nLT KRNaN KR1.0"));
        assert!(!accumulator_after("LD KX1\nLE KRNaN KR1.0"));
        // NE is the one predicate a NaN satisfies
        assert!(accumulator_after("LD KX1\nNE KRNaN KRNaN"));
    }
}

mod blocks {
    use super::*;

    #[test]
    fn test_tof_holds_output() {
        let mut vm = setup_vm("LD IX0.0\nTOF K0 IX0.0 KW5 K1 QX0.0 MW0", &[1]);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 1);

        // input falls, the delay latches at the tick of this scan
        vm.set_inputs(&[0]);
        vm.tick(3);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 1);

        vm.tick(2);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 1);

        vm.tick(3);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 0);
    }

    #[test]
    fn test_tp_pulse_length() {
        let mut vm = setup_vm("LD IX0.0\nTP K0 IX0.0 KW5 K1 QX0.0 MW0", &[1]);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 1);

        vm.tick(5);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 0);

        // the held input does not restart the pulse
        vm.tick(5);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 0);
    }

    #[test]
    fn test_ctu_saturates() {
        let mut vm = setup_vm("LD IX0.0\nCTU K0 IX0.0 KW2 IX0.1 QX0.0 MW0", &[]);
        for &input in &[0, 1, 0, 1, 0, 1, 0, 1u8] {
            vm.set_inputs(&[input]);
            vm.scan().unwrap();
        }
        // four edges, the value stays at the preset
        assert_eq!(crate::memory::get_word(vm.memories(), 0), 2);
        assert_eq!(vm.outputs()[0], 1);

        // reset clears value and output
        vm.set_inputs(&[0b10]);
        vm.scan().unwrap();
        assert_eq!(crate::memory::get_word(vm.memories(), 0), 0);
        assert_eq!(vm.outputs()[0], 0);
    }

    #[test]
    fn test_ctd_counts_down() {
        let source = "LD IX0.0\nCTD K0 IX0.0 KW2 IX0.1 QX0.0 MW0";
        let mut vm = setup_vm(source, &[0b10]);
        // load the preset
        vm.scan().unwrap();
        assert_eq!(crate::memory::get_word(vm.memories(), 0), 2);

        for &input in &[0, 1, 0, 1u8] {
            vm.set_inputs(&[input]);
            vm.scan().unwrap();
        }
        assert_eq!(crate::memory::get_word(vm.memories(), 0), 0);
        assert_eq!(vm.outputs()[0], 1);
    }

    #[test]
    fn test_rising_trigger_fires_exactly_once() {
        let mut vm = setup_vm("LD IX0.0\nR_TRIGGER K0 IX0.0 QX0.0", &[]);
        let mut outputs = Vec::new();
        for &input in &[1, 1, 0, 1u8] {
            vm.set_inputs(&[input]);
            vm.scan().unwrap();
            outputs.push(vm.outputs()[0]);
        }
        assert_eq!(outputs, vec![1, 0, 0, 1]);
    }

    #[test]
    fn test_falling_trigger() {
        let mut vm = setup_vm("LD IX0.0\nF_TRIGGER K0 IX0.0 QX0.0", &[1]);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 0);

        vm.set_inputs(&[0]);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 1);

        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 0);
    }

    #[test]
    fn test_block_index_checked_at_runtime() {
        // the index comes out of memory, so only the executor sees it
        let mut vm = setup_vm("LD KX1\nTON MB0 IX0.0 KW5 K1 QX0.0 MW2", &[]);
        vm.image_mut().memories[0] = 10;
        assert_eq!(
            vm.scan(),
            Err(ProcessError::BlockIndex {
                block: "timer",
                index: 10
            })
        );
    }
}

mod crafted {
    use super::*;

    #[test]
    /// a wide store decodes fine and executes as a no-op
    fn test_wide_store_is_a_no_op() {
        // LD KX1; ST QB0
        let program = frame(&[0x00, 0b000_11_000, 0x01, 0x02, 0b001_01_000, 0x00, 0x00]);
        let mut vm = Vm::new(program);
        vm.scan().unwrap();
        assert_eq!(vm.outputs()[0], 0);
        assert!(vm.accumulator());
    }

    #[test]
    /// an address that spills over its area stops the scan
    fn test_out_of_range_operand_is_fatal() {
        // LD IW9, the word would cross the end of the input area
        let program = frame(&[0x00, 0b010_00_000, 0x00, 0x09]);
        let mut vm = Vm::new(program);
        assert_eq!(
            vm.scan(),
            Err(ProcessError::AddressOutOfRange {
                register: RegisterType::I,
                address: 9
            })
        );
    }

    #[test]
    /// an unknown opcode value stops the scan at decode time
    fn test_invalid_opcode_is_fatal() {
        let program = frame(&[39]);
        let mut vm = Vm::new(program);
        assert!(matches!(
            vm.scan(),
            Err(ProcessError::Decode(crate::DecodeError::InvalidOpcode(39)))
        ));
    }
}

mod round_trip {
    use super::*;

    #[test]
    /// decode(encode(parse(S))) matches parse(S) modulo the K operand
    /// address rewriting
    fn test_compile_decode_round_trip() {
        let source =
            "LD IX0.0\nMOV KW300 MW4\nAND( IX0.3\n)\nTON K1 IX0.1 KW10 K2 QX0.1 MW2\nST QX0.0";
        let program = build_program(source);
        let image = program.image();

        let expected = [
            Opcode::Ld,
            Opcode::Mov,
            Opcode::AndOpen,
            Opcode::Close,
            Opcode::Ton,
            Opcode::St,
        ];

        let mut decoded = Vec::new();
        let mut position = framing::HEADER_SIZE;
        while position < image.len() {
            let (instruction, next) = read_instruction(image, position).unwrap();
            // the invariant of the decoder: the next position is the
            // current one plus the encoded instruction size
            assert!(next > position);
            decoded.push(instruction);
            position = next;
        }
        assert_eq!(position, image.len());

        let opcodes: Vec<_> = decoded.iter().map(|i| i.opcode).collect();
        assert_eq!(opcodes, expected);

        // spot check the location operand fields
        let ld = decoded[0].operands[0];
        assert_eq!(
            (ld.memory, ld.register, ld.address, ld.bit),
            (MemoryType::X, RegisterType::I, 0, 0)
        );

        // the constant operand aliases its immediate in the image
        let constant = decoded[1].operands[0];
        assert_eq!(constant.register, RegisterType::K);
        assert_eq!(constant.memory, MemoryType::W);
        assert_eq!(
            crate::memory::get_word(image, constant.address as usize),
            300
        );
    }
}
