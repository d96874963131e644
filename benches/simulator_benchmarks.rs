use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vmips_rust::isa::UnitType;
use vmips_rust::memory::Memory;
use vmips_rust::{Assembler, EngineConfig, PipelineEngine};

fn default_config(memory_size: usize) -> EngineConfig {
    EngineConfig::new(memory_size)
        .with_rob_size(16)
        .with_int_stations(4)
        .with_add_stations(4)
        .with_mult_stations(2)
        .with_load_stations(4)
        .init_exec_unit(UnitType::Integer, 1, 2)
        .init_exec_unit(UnitType::Memory, 2, 2)
        .init_exec_unit(UnitType::Adder, 2, 1)
        .init_exec_unit(UnitType::Multiplier, 4, 1)
        .init_exec_unit(UnitType::Divider, 8, 1)
}

fn straight_line_program() -> String {
    let mut source = String::new();
    source.push_str("ADDI R1, R0, 10\nADDI R2, R0, 20\n");
    source.push_str("LW R3, 0(R0)\nLW R4, 4(R0)\nADD R5, R3, R4\nSW R5, 8(R0)\n");
    source.push_str("EOP\n");
    source
}

fn loop_program() -> String {
    let mut source = String::new();
    source.push_str("ADDI R1, R0, 200\n");
    source.push_str("loop: ADDI R1, R1, -1\nBNEZ R1, loop\nEOP\n");
    source
}

fn pipeline_engine_benchmark(c: &mut Criterion) {
    let program = Assembler::new().assemble(&straight_line_program()).unwrap();

    c.bench_function("pipeline_engine_straight_line", |b| {
        b.iter(|| {
            let mut engine = PipelineEngine::new(default_config(8192)).unwrap();
            engine.memory.write_word_init(0, 10).unwrap();
            engine.memory.write_word_init(4, 20).unwrap();
            engine.load_program(program.clone(), 0);
            engine.run(0);
            black_box(engine.get_int_register(5));
        });
    });
}

fn pipeline_engine_loop_benchmark(c: &mut Criterion) {
    let program = Assembler::new().assemble(&loop_program()).unwrap();

    c.bench_function("pipeline_engine_branch_loop", |b| {
        b.iter(|| {
            let mut engine = PipelineEngine::new(default_config(4096)).unwrap();
            engine.load_program(program.clone(), 0);
            engine.run(0);
            black_box(engine.stats().cycles);
        });
    });
}

fn memory_access_benchmark(c: &mut Criterion) {
    c.bench_function("memory_read_write", |b| {
        let mut memory = Memory::new(65536);

        b.iter(|| {
            for i in 0..1000u32 {
                memory.write_word_init(i * 4, i).unwrap();
                black_box(memory.read_word(i * 4));
            }
        });
    });
}

criterion_group!(
    benches,
    pipeline_engine_benchmark,
    pipeline_engine_loop_benchmark,
    memory_access_benchmark
);
criterion_main!(benches);
