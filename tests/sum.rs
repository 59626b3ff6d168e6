use std::fs;

use hvm::{
    bytecode::Program,
    compiler::assemble_with_logger,
    emulator::{Emulator, StreamIo, TestIo},
};

fn compile_program() -> (Program, u16) {
    let source = include_str!("sum.asm");

    let assembly = assemble_with_logger(source, None)
        .expect("could not assemble the source code");

    let sum = assembly.symbol_table.address("SUM")
        .expect("SUM is not declared");

    (assembly.program, sum)
}

#[test]
fn test_sum_symbols() {
    let assembly = assemble_with_logger(include_str!("sum.asm"), None).unwrap();
    let table = &assembly.symbol_table;

    assert_eq!(table.len(), 4);
    assert_eq!(table.address("LOOP"), Some(0x100));
    assert_eq!(table.address("DONE"), Some(0x107));
    assert_eq!(table.address("ACCUM"), Some(0x10B));
    assert_eq!(table.address("SUM"), Some(0x110));
    assert_eq!(assembly.program.payload.len(), 17);
}

#[test]
fn test_sum_emulate_program() {
    let (program, sum) = compile_program();

    let cases = vec![
        (vec![1, 2, 3, 4, 0], vec![1 + 2 + 3 + 4]),
        (vec![0], vec![0]),
        (vec![0x7F, 0x01, 0x00], vec![0x80]),
        (vec![0xFF, 0x05, 0x00], vec![0x04]),
    ];

    for (input, output) in cases {
        let mut emulator = Emulator::new();
        emulator.load_program(&program);

        let mut io = TestIo::with_input(input);
        emulator.run(program.start, &mut io).unwrap();

        assert_eq!(io.output(), &output[..]);
        assert_eq!(emulator.memory[sum], output[0]);
        assert!(emulator.context.call_stack.is_empty());
        assert!(!emulator.error());
    }
}

#[test]
fn test_sum_device_streams() {
    let (program, _) = compile_program();

    let mut emulator = Emulator::new();
    emulator.load_program(&program);

    let mut io = StreamIo::new("01 02\n03 00 ".as_bytes(), Vec::new());
    emulator.run(program.start, &mut io).unwrap();

    let (_, output) = io.into_inner();
    assert_eq!(String::from_utf8(output).unwrap(), "06 ");
}

#[test]
fn test_sum_device_files() {
    let (program, _) = compile_program();

    let dir = std::env::temp_dir().join(format!("hvm-sum-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let input = dir.join("input.txt");
    let output = dir.join("output.txt");
    fs::write(&input, "0A 0B\n0C 00\n").unwrap();

    let mut emulator = Emulator::new();
    emulator.load_program(&program);

    let io = StreamIo::files(&input, &output).unwrap();
    emulator.run(program.start, io).unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "21 ");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_sum_input_exhausted() {
    let (program, _) = compile_program();

    let mut emulator = Emulator::new();
    emulator.load_program(&program);

    let mut io = TestIo::with_input(vec![1, 2]);
    assert!(emulator.run(program.start, &mut io).is_err());

    assert!(emulator.error());
    assert!(io.output().is_empty());
    assert_eq!(emulator.context.pc, 0);
}
