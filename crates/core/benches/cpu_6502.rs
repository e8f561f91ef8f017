use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fami_core::cpu_6502::{ArrayMemory, Cpu6502};

/// Tight loop touching immediate, zero page, indexed and RMW forms.
const LOOP: &[u8] = &[
    0xA9, 0x42, // LDA #$42
    0x85, 0x10, // STA $10
    0xA2, 0x10, // LDX #$10
    0xBD, 0xF8, 0x80, // LDA $80F8,X (page cross)
    0xE6, 0x10, // INC $10
    0x69, 0x01, // ADC #$01
    0xC7, 0x10, // DCP $10
    0xCA, // DEX
    0xD0, 0xF4, // BNE -12
    0x4C, 0x00, 0x80, // JMP $8000
];

fn loaded_cpu() -> Cpu6502<ArrayMemory> {
    let mut mem = ArrayMemory::new();
    mem.load_program(0x8000, LOOP);
    let mut cpu = Cpu6502::new(mem);
    cpu.reset();
    cpu
}

fn bench_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_6502_steps");
    for count in [10u32, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut cpu = loaded_cpu();
            b.iter(|| {
                for _ in 0..count {
                    black_box(cpu.step());
                }
            });
        });
    }
    group.finish();
}

fn bench_reset(c: &mut Criterion) {
    c.bench_function("cpu_6502_reset", |b| {
        let mut cpu = loaded_cpu();
        b.iter(|| black_box(cpu.reset()));
    });
}

criterion_group!(benches, bench_steps, bench_reset);
criterion_main!(benches);
