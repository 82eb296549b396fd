use criterion::{black_box, criterion_group, criterion_main, Criterion};

use plc::{compiler, program::Program, resources, vm::Vm};

/// will setup the default configured machine
fn get_default_vm(name: &str) -> Vm {
    let source = resources::source(name).expect("the demo has to exist");
    let output = compiler::compile(source).expect("the demo has to compile");
    let program = Program::new(name, output.binary).expect("the demo has to verify");
    Vm::new(program)
}

pub fn scan_bench(c: &mut Criterion) {
    let mut vm = get_default_vm("MATH");
    c.bench_function("scan_bench", |b| {
        b.iter(|| {
            vm.scan().expect("the demo scan has to pass");
            black_box(vm.outputs());
        });
    });
}

pub fn timer_scan_bench(c: &mut Criterion) {
    let mut vm = get_default_vm("BLINKER");
    vm.set_inputs(&[1]);
    c.bench_function("timer_scan_bench", |b| {
        b.iter(|| {
            vm.tick(1);
            vm.scan().expect("the demo scan has to pass");
            black_box(vm.outputs());
        });
    });
}

criterion_group!(benches, scan_bench, timer_scan_bench);
criterion_main!(benches);
