//! Benchmarks for the encode/parse hot path: FT 1.2 framing and ASDU
//! encoding for a typical measured-value report.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rust_iec60870::asdu::Asdu;
use rust_iec60870::common::{ApplicationLayerParameters, CauseOfTransmission};
use rust_iec60870::information_object::{InformationObject, MeasuredScaledInfo, TypeId};

fn build_measured_asdu(count: u32) -> Asdu {
    let mut asdu = Asdu::new(TypeId::MMeNb1, CauseOfTransmission::Periodic, 1);
    for i in 0..count {
        asdu.add_information_object(InformationObject::MeasuredScaled(MeasuredScaledInfo {
            ioa: 1000 + i,
            value: (i % 2000) as i16,
            quality: Default::default(),
        }))
        .expect("measured-scaled payload matches the ASDU's own type");
    }
    asdu
}

fn bench_asdu_encode(c: &mut Criterion) {
    let params = ApplicationLayerParameters::default();
    let mut group = c.benchmark_group("asdu_encode");
    for count in [1u32, 10, 100] {
        let asdu = build_measured_asdu(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &asdu, |b, asdu| {
            b.iter(|| black_box(asdu.encode(&params).unwrap()));
        });
    }
    group.finish();
}

fn bench_asdu_parse(c: &mut Criterion) {
    let params = ApplicationLayerParameters::default();
    let mut group = c.benchmark_group("asdu_parse");
    for count in [1u32, 10, 100] {
        let bytes = build_measured_asdu(count).encode(&params).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(count), &bytes, |b, bytes| {
            b.iter(|| black_box(Asdu::parse(bytes, &params).unwrap()));
        });
    }
    group.finish();
}

fn bench_ft12_roundtrip(c: &mut Criterion) {
    use rust_iec60870::ft12::{ControlField, Ft12Frame, LinkAddressSize};

    let frame = Ft12Frame::VariableLength {
        control: ControlField::primary(3, false, true),
        address: 1,
        user_data: vec![0x64; 64],
    };
    let encoded = frame.encode(LinkAddressSize::OneOctet);

    c.bench_function("ft12_parse", |b| {
        b.iter(|| black_box(Ft12Frame::parse(&encoded, LinkAddressSize::OneOctet).unwrap()));
    });
}

criterion_group!(benches, bench_asdu_encode, bench_asdu_parse, bench_ft12_roundtrip);
criterion_main!(benches);
