use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tf_ascii::Converter;
use tf_ascii::mapper::map_with_ramp;
use tf_ascii::sampler::Sampler;
use tf_core::charset::Ramp;
use tf_core::config::Parameters;
use tf_core::frame::{FrameBuffer, LuminanceGrid};

fn noise_frame(width: u32, height: u32) -> FrameBuffer {
    let mut fb = FrameBuffer::new(width, height);
    let mut seed = 0x1234_5678_u32;
    for byte in &mut fb.data {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        *byte = (seed >> 24) as u8;
    }
    fb
}

fn bench_convert(c: &mut Criterion) {
    let hd = noise_frame(1280, 720);
    let params = Parameters::default();
    let mut converter = Converter::new();
    c.bench_function("convert_720p_w100", |b| {
        b.iter(|| converter.convert(black_box(&hd), black_box(&params)));
    });

    let wide = Parameters::new(200, true, Ramp::default());
    c.bench_function("convert_720p_w200_invert", |b| {
        b.iter(|| converter.convert(black_box(&hd), black_box(&wide)));
    });

    let mut sampler = Sampler::new();
    let mut grid = LuminanceGrid::new(0, 0);
    c.bench_function("sample_720p_w100", |b| {
        b.iter(|| sampler.sample_into(black_box(&hd), 100, &mut grid));
    });

    let ramp = Ramp::default();
    let lum = LuminanceGrid::uniform(200, 56, 131.0);
    c.bench_function("map_200x56", |b| {
        b.iter(|| map_with_ramp(black_box(&lum), &ramp, false));
    });
}

criterion_group!(benches, bench_convert);
criterion_main!(benches);
